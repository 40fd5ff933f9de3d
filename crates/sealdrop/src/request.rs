//! Request flow: file requests, alias lookups and uploads.
//!
//! ```text
//! owner: request_file ──> alias ──(out of band)──> uploader
//! uploader: get_alias_info(alias), upload_file(file_id, ...)
//! ```
//!
//! Aliases are never logged.

use std::path::Path;

use sealdrop_core::{Change, Clock, FileId, FilePayload, FileState, Identity};
use sealdrop_store::Store;

use crate::api::{
    AliasInfo, GetAliasInfoError, GetAliasInfoResponse, UploadFileAtomicRequest, UploadFileError,
    UploadFileRequest, UploadFileResponse,
};
use crate::error::Result;
use crate::exchange::Exchange;

/// Known extensions and their MIME types.
const FILE_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("zip", "application/zip"),
    ("json", "application/json"),
    ("csv", "text/csv"),
];

/// MIME type for `name` from its extension, or `default` if unknown.
pub fn infer_file_type(name: &str, default: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .and_then(|ext| {
            FILE_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(default)
        .to_string()
}

impl<S: Store, C: Clock> Exchange<S, C> {
    /// Open a new pending file slot owned by the caller.
    ///
    /// Returns the alias to hand to whoever should upload the content.
    pub async fn request_file(&self, caller: &Identity, file_name: &str) -> Result<String> {
        let mut ledger = self.lock().await;

        let file_id = ledger.files().allocate_id()?;
        let alias = self.alias_generator().generate_unused(ledger.aliases());

        self.commit(
            &mut ledger,
            Change::FileRequested {
                file_id,
                file_name: file_name.to_string(),
                owner: caller.clone(),
                alias: alias.clone(),
                requested_at: self.now(),
            },
        )
        .await?;

        tracing::info!(caller = %caller, file_id, "file requested");
        Ok(alias)
    }

    /// Who is asking for a file, and under which name.
    ///
    /// Unknown and consumed aliases both report `not_found`, as does an alias
    /// whose owner has not set a profile.
    pub async fn get_alias_info(&self, alias: &str) -> GetAliasInfoResponse {
        let ledger = self.lock().await;

        let record = ledger
            .aliases()
            .get(alias)
            .and_then(|file_id| ledger.files().get(file_id))
            .ok_or(GetAliasInfoError::NotFound)?;

        let user = ledger.users().get(&record.owner).ok_or_else(|| {
            tracing::debug!(file_id = record.file_id, "alias owner has no profile");
            GetAliasInfoError::NotFound
        })?;

        Ok(AliasInfo {
            file_id: record.file_id,
            file_name: record.file_name.clone(),
            user: user.clone(),
        })
    }

    /// Upload content for a pending file. Consumes the file's alias.
    ///
    /// Anyone may upload; holding the alias is the credential.
    pub async fn upload_file(
        &self,
        caller: &Identity,
        request: UploadFileRequest,
    ) -> Result<UploadFileResponse> {
        let mut ledger = self.lock().await;
        let file_id = request.file_id;

        let outcome = match ledger.files().get(file_id).map(|r| &r.state) {
            None => Err(UploadFileError::NotRequested),
            Some(FileState::Uploaded { .. }) => Err(UploadFileError::AlreadyUploaded),
            Some(FileState::Pending { alias, .. })
                if ledger.aliases().get(alias) != Some(file_id) =>
            {
                Err(UploadFileError::NotRequested)
            }
            Some(FileState::Pending { .. }) => Ok(()),
        };
        if let Err(reason) = outcome {
            tracing::debug!(caller = %caller, file_id, ?reason, "upload refused");
            return Ok(Err(reason));
        }

        self.commit(
            &mut ledger,
            Change::FileUploaded {
                file_id,
                uploaded_at: self.now(),
                payload: FilePayload {
                    contents: request.file_content,
                    file_type: request.file_type,
                    owner_key: request.owner_key,
                },
            },
        )
        .await?;

        tracing::info!(caller = %caller, file_id, "file uploaded");
        Ok(Ok(()))
    }

    /// Create a file owned by the caller directly in the uploaded state.
    pub async fn upload_file_atomic(
        &self,
        caller: &Identity,
        request: UploadFileAtomicRequest,
    ) -> Result<FileId> {
        let mut ledger = self.lock().await;

        let file_id = ledger.files().allocate_id()?;
        let file_type = infer_file_type(&request.name, &self.config().default_file_type);

        self.commit(
            &mut ledger,
            Change::FileCreated {
                file_id,
                file_name: request.name,
                owner: caller.clone(),
                uploaded_at: self.now(),
                payload: FilePayload {
                    contents: request.content,
                    file_type,
                    owner_key: request.owner_key,
                },
            },
        )
        .await?;

        tracing::info!(caller = %caller, file_id, "file uploaded atomically");
        Ok(file_id)
    }
}
