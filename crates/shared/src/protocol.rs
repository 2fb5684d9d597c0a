use serde::{Deserialize, Serialize};

use crate::{
    domain::{ActionKind, UserId},
    error::WorkspaceError,
};

/// One entry of a metadata listing as returned by the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadataRecord {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl FileMetadataRecord {
    pub fn new(filename: impl Into<String>, category: Option<&str>) -> Self {
        Self {
            filename: filename.into(),
            category: category.map(str::to_string),
        }
    }
}

/// Parses the JSON array payload of `list_user_metadata` / `list_shared_metadata`.
pub fn parse_metadata_listing(payload: &str) -> Result<Vec<FileMetadataRecord>, WorkspaceError> {
    serde_json::from_str(payload.trim())
        .map_err(|err| WorkspaceError::MalformedMetadata(err.to_string()))
}

/// Named operations understood by the command execution layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum RemoteOperation {
    ListUserMetadata {
        user_id: UserId,
    },
    ListSharedMetadata {
        user_id: UserId,
    },
    ProcessFile {
        file_path: String,
        user_id: UserId,
    },
    SummarizeFile {
        user_id: UserId,
        filename: String,
    },
    RedactFile {
        user_id: UserId,
        filename: String,
    },
    DownloadFile {
        user_id: UserId,
        filename: String,
    },
    DownloadSharedFile {
        user_id: UserId,
        filename: String,
    },
    DeleteUserFile {
        user_id: UserId,
        filename: String,
    },
    DeleteSharedFile {
        user_id: UserId,
        filename: String,
    },
    ShareFile {
        user_id: UserId,
        filename: String,
        recipient_email: String,
    },
}

impl RemoteOperation {
    pub fn name(&self) -> &'static str {
        match self {
            RemoteOperation::ListUserMetadata { .. } => "list_user_metadata",
            RemoteOperation::ListSharedMetadata { .. } => "list_shared_metadata",
            RemoteOperation::ProcessFile { .. } => "process_file",
            RemoteOperation::SummarizeFile { .. } => "summarize_file",
            RemoteOperation::RedactFile { .. } => "redact_file",
            RemoteOperation::DownloadFile { .. } => "download_file",
            RemoteOperation::DownloadSharedFile { .. } => "download_shared_file",
            RemoteOperation::DeleteUserFile { .. } => "delete_user_file",
            RemoteOperation::DeleteSharedFile { .. } => "delete_shared_file",
            RemoteOperation::ShareFile { .. } => "share_file",
        }
    }

    pub fn user_id(&self) -> &UserId {
        match self {
            RemoteOperation::ListUserMetadata { user_id }
            | RemoteOperation::ListSharedMetadata { user_id }
            | RemoteOperation::ProcessFile { user_id, .. }
            | RemoteOperation::SummarizeFile { user_id, .. }
            | RemoteOperation::RedactFile { user_id, .. }
            | RemoteOperation::DownloadFile { user_id, .. }
            | RemoteOperation::DownloadSharedFile { user_id, .. }
            | RemoteOperation::DeleteUserFile { user_id, .. }
            | RemoteOperation::DeleteSharedFile { user_id, .. }
            | RemoteOperation::ShareFile { user_id, .. } => user_id,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            RemoteOperation::SummarizeFile { filename, .. }
            | RemoteOperation::RedactFile { filename, .. }
            | RemoteOperation::DownloadFile { filename, .. }
            | RemoteOperation::DownloadSharedFile { filename, .. }
            | RemoteOperation::DeleteUserFile { filename, .. }
            | RemoteOperation::DeleteSharedFile { filename, .. }
            | RemoteOperation::ShareFile { filename, .. } => Some(filename),
            RemoteOperation::ListUserMetadata { .. }
            | RemoteOperation::ListSharedMetadata { .. }
            | RemoteOperation::ProcessFile { .. } => None,
        }
    }

    /// Rejects operations with empty required parameters before they leave the process.
    pub fn validate(&self) -> Result<(), WorkspaceError> {
        if self.user_id().is_empty() {
            return Err(WorkspaceError::Validation("user_id cannot be empty".into()));
        }
        if let Some(filename) = self.filename() {
            if filename.trim().is_empty() {
                return Err(WorkspaceError::Validation("filename cannot be empty".into()));
            }
        }
        match self {
            RemoteOperation::ProcessFile { file_path, .. } if file_path.trim().is_empty() => Err(
                WorkspaceError::Validation("file_path cannot be empty".into()),
            ),
            RemoteOperation::ShareFile {
                recipient_email, ..
            } if recipient_email.trim().is_empty() => Err(WorkspaceError::Validation(
                "recipient_email cannot be empty".into(),
            )),
            _ => Ok(()),
        }
    }
}

/// Optional structured reply of `share_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareReceipt {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: String,
}

impl ShareReceipt {
    pub fn parse(payload: &str) -> Option<Self> {
        serde_json::from_str(payload.trim()).ok()
    }
}

/// Completed action reported back to the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub filename: String,
    pub kind: ActionKind,
    pub message: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
