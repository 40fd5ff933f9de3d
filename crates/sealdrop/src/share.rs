//! Share flow: downloads, grants and file listings.

use sealdrop_core::{Clock, FileId, FileRecord, Identity, Ledger, WrappedKey};
use sealdrop_perms::{AccessControl, ReadAccess, ShareGrant};
use sealdrop_store::Store;

use crate::api::{FileData, FileDownloadResponse, FileSharingResponse, PublicFileMetadata};
use crate::error::Result;
use crate::exchange::Exchange;

/// Metadata of `record` with its recipients resolved to profiles.
fn metadata(ledger: &Ledger, record: &FileRecord) -> PublicFileMetadata {
    PublicFileMetadata {
        file_id: record.file_id,
        file_name: record.file_name.clone(),
        file_status: record.status(),
        shared_with: record
            .shared_with
            .keys()
            .filter_map(|recipient| ledger.users().get(recipient).cloned())
            .collect(),
    }
}

impl<S: Store, C: Clock> Exchange<S, C> {
    /// Download a file with the key wrapped for the caller.
    pub async fn download_file(&self, caller: &Identity, file_id: FileId) -> FileDownloadResponse {
        let ledger = self.lock().await;

        match AccessControl::new(&ledger).check_read(caller, file_id) {
            ReadAccess::NotFound => FileDownloadResponse::NotFoundFile,
            ReadAccess::NotUploaded => FileDownloadResponse::NotUploadedFile,
            ReadAccess::Denied => {
                tracing::debug!(caller = %caller, file_id, "download refused");
                FileDownloadResponse::PermissionError
            }
            ReadAccess::Granted { payload, key } => FileDownloadResponse::FoundFile(FileData {
                contents: payload.contents.clone(),
                file_type: payload.file_type.clone(),
                owner_key: key.to_vec(),
            }),
        }
    }

    /// Give `target` access to one of the caller's files.
    ///
    /// `wrapped_key` is the file's content key wrapped for `target`; sharing
    /// again with the same target replaces it. Every refusal is reported as
    /// `permission_error`.
    pub async fn share_file(
        &self,
        caller: &Identity,
        target: &Identity,
        file_id: FileId,
        wrapped_key: WrappedKey,
    ) -> Result<FileSharingResponse> {
        let mut ledger = self.lock().await;

        if let Err(cause) = AccessControl::new(&ledger).authorize_share(caller, file_id, target) {
            tracing::debug!(caller = %caller, file_id, %cause, "share refused");
            return Ok(FileSharingResponse::PermissionError);
        }

        let grant = ShareGrant::new(target.clone(), file_id, wrapped_key);
        self.commit(&mut ledger, grant.into_change(caller.clone())).await?;

        tracing::info!(caller = %caller, target = %target, file_id, "file shared");
        Ok(FileSharingResponse::Ok)
    }

    /// Files other owners have shared with the caller.
    pub async fn get_shared_files(&self, caller: &Identity) -> Vec<PublicFileMetadata> {
        let ledger = self.lock().await;
        ledger
            .files()
            .shared_with(caller)
            .map(|record| metadata(&ledger, record))
            .collect()
    }

    /// The caller's files that are still waiting for an upload.
    pub async fn get_requests(&self, caller: &Identity) -> Vec<PublicFileMetadata> {
        let ledger = self.lock().await;
        ledger
            .files()
            .owned_by(caller)
            .filter(|record| record.is_pending())
            .map(|record| metadata(&ledger, record))
            .collect()
    }

    /// Every file the caller owns, pending or uploaded.
    pub async fn get_owned_files(&self, caller: &Identity) -> Vec<PublicFileMetadata> {
        let ledger = self.lock().await;
        ledger
            .files()
            .owned_by(caller)
            .map(|record| metadata(&ledger, record))
            .collect()
    }
}
