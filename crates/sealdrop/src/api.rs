//! Request and response types of the exchange calls.
//!
//! Field names and variant tags match the deployed interface. Outcomes a
//! caller is expected to handle are variants here, never errors.
//! `std::result::Result` is used where the interface itself has an
//! `Ok`/`Err` shape; serde encodes it with those same tags.

use serde::{Deserialize, Serialize};

use sealdrop_core::{FileId, FileStatus, Identity, User, WrappedKey};

/// Response of `who_am_i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhoAmIResponse {
    #[serde(rename = "known_user")]
    KnownUser {
        first_name: String,
        last_name: String,
    },
    #[serde(rename = "unknown_user")]
    UnknownUser,
}

/// One entry of `get_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub public_key: Vec<u8>,
    /// The user's identity.
    pub ic_principal: Identity,
    pub first_name: String,
    pub last_name: String,
}

impl UserData {
    pub fn new(identity: Identity, user: &User) -> Self {
        Self {
            public_key: user.public_key.clone(),
            ic_principal: identity,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Response of `get_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GetUsersResponse {
    #[serde(rename = "permission_error")]
    PermissionError,
    #[serde(rename = "users")]
    Users(Vec<UserData>),
}

/// What an alias holder learns about the pending file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasInfo {
    pub file_id: FileId,
    pub file_name: String,
    /// Profile of the file's owner.
    pub user: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GetAliasInfoError {
    #[serde(rename = "not_found")]
    NotFound,
}

pub type GetAliasInfoResponse = std::result::Result<AliasInfo, GetAliasInfoError>;

/// Content for a previously requested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFileRequest {
    pub file_id: FileId,
    pub file_content: Vec<u8>,
    pub file_type: String,
    /// Content key wrapped for the owner.
    pub owner_key: WrappedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFileError {
    #[serde(rename = "not_requested")]
    NotRequested,
    #[serde(rename = "already_uploaded")]
    AlreadyUploaded,
}

pub type UploadFileResponse = std::result::Result<(), UploadFileError>;

/// A file created and uploaded by its owner in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadFileAtomicRequest {
    pub name: String,
    pub owner_key: WrappedKey,
    pub content: Vec<u8>,
}

/// Downloaded content plus the key wrapped for the downloader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    pub contents: Vec<u8>,
    pub file_type: String,
    pub owner_key: WrappedKey,
}

/// Response of `download_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileDownloadResponse {
    #[serde(rename = "not_found_file")]
    NotFoundFile,
    #[serde(rename = "not_uploaded_file")]
    NotUploadedFile,
    #[serde(rename = "permission_error")]
    PermissionError,
    #[serde(rename = "found_file")]
    FoundFile(FileData),
}

/// Response of `share_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSharingResponse {
    #[serde(rename = "permission_error")]
    PermissionError,
    #[serde(rename = "ok")]
    Ok,
}

/// File metadata as listed by `get_requests`, `get_shared_files` and
/// `get_owned_files`. Never carries content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicFileMetadata {
    pub file_id: FileId,
    pub file_name: String,
    pub file_status: FileStatus,
    /// Profiles of everyone the file is shared with.
    pub shared_with: Vec<User>,
}
