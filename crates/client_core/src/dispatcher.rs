//! Per-file remote actions: planning, in-flight tracking and the optimistic index mutation.

use std::{path::Path, sync::Arc};

use shared::{
    domain::{ActionKind, ListingSource, Section, Session},
    error::WorkspaceError,
    protocol::{parse_metadata_listing, ActionReport, RemoteOperation, ShareReceipt},
};
use tracing::{debug, info, warn};

use crate::{
    executor::{is_uploadable, CommandExecutor},
    index::CategoryIndex,
    navigation::{Modal, NavigationState},
    pending::PendingActionSet,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    Download,
    Delete,
    Redact,
    Share { recipient_email: String },
    Summarize,
}

impl FileAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            FileAction::Download => ActionKind::Download,
            FileAction::Delete => ActionKind::Delete,
            FileAction::Redact => ActionKind::Redact,
            FileAction::Share { .. } => ActionKind::Share,
            FileAction::Summarize => ActionKind::Summarize,
        }
    }
}

/// What a successful action does to the local index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMutation {
    Unchanged,
    RemoveFile,
    RemoveFileAndExitDrillDown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPlan {
    pub operation: RemoteOperation,
    pub mutation: IndexMutation,
    pub error_prefix: &'static str,
}

/// Maps an action in a listing context onto its remote operation. Pure; nothing is issued.
pub fn plan_action(
    session: &Session,
    source: ListingSource,
    filename: &str,
    action: &FileAction,
) -> Result<ActionPlan, WorkspaceError> {
    let user_id = session.user_id.clone();
    let filename = filename.to_string();

    let plan = match (source, action) {
        (ListingSource::Own, FileAction::Download) => ActionPlan {
            operation: RemoteOperation::DownloadFile { user_id, filename },
            mutation: IndexMutation::Unchanged,
            error_prefix: "Download failed",
        },
        (ListingSource::Shared, FileAction::Download) => ActionPlan {
            operation: RemoteOperation::DownloadSharedFile { user_id, filename },
            mutation: IndexMutation::Unchanged,
            error_prefix: "Download failed",
        },
        (ListingSource::Own, FileAction::Delete) => ActionPlan {
            operation: RemoteOperation::DeleteUserFile { user_id, filename },
            mutation: IndexMutation::RemoveFile,
            error_prefix: "Delete failed",
        },
        (ListingSource::Shared, FileAction::Delete) => ActionPlan {
            operation: RemoteOperation::DeleteSharedFile { user_id, filename },
            mutation: IndexMutation::RemoveFile,
            error_prefix: "Delete failed",
        },
        (ListingSource::Own, FileAction::Redact) => ActionPlan {
            operation: RemoteOperation::RedactFile { user_id, filename },
            mutation: IndexMutation::RemoveFileAndExitDrillDown,
            error_prefix: "Redaction failed",
        },
        (ListingSource::Own, FileAction::Share { recipient_email }) => {
            let recipient_email = recipient_email.trim();
            if recipient_email.is_empty() {
                return Err(WorkspaceError::Validation(
                    "Please enter a recipient email".into(),
                ));
            }
            ActionPlan {
                operation: RemoteOperation::ShareFile {
                    user_id,
                    filename,
                    recipient_email: recipient_email.to_string(),
                },
                mutation: IndexMutation::Unchanged,
                error_prefix: "Share failed",
            }
        }
        (ListingSource::Own, FileAction::Summarize) => ActionPlan {
            operation: RemoteOperation::SummarizeFile { user_id, filename },
            mutation: IndexMutation::Unchanged,
            error_prefix: "Summary generation failed",
        },
        (ListingSource::Shared, action) => {
            return Err(WorkspaceError::ActionNotAvailable {
                section: Section::Shared,
                kind: action.kind(),
            })
        }
    };
    Ok(plan)
}

/// Result of a successful action, applied to the view that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub filename: String,
    pub kind: ActionKind,
    pub mutation: IndexMutation,
    pub payload: String,
    pub message: String,
}

impl ActionOutcome {
    pub fn apply(&self, index: &mut CategoryIndex, navigation: &mut NavigationState) {
        match self.mutation {
            IndexMutation::Unchanged => {}
            IndexMutation::RemoveFile => {
                index.remove_file(&self.filename);
            }
            IndexMutation::RemoveFileAndExitDrillDown => {
                index.remove_file(&self.filename);
                navigation.exit_drill_down();
            }
        }

        match self.kind {
            ActionKind::Share | ActionKind::Delete => {
                if navigation
                    .modal()
                    .is_some_and(|modal| modal.filename() == self.filename)
                {
                    navigation.dismiss_modal();
                }
            }
            ActionKind::Summarize => {
                navigation.dismiss_modal();
                let summary = Modal::Summary {
                    filename: self.filename.clone(),
                    summary: self.payload.trim().to_string(),
                };
                if let Err(err) = navigation.open_modal(summary) {
                    debug!(filename = %self.filename, error = %err, "summary not shown; file list closed");
                }
            }
            _ => {}
        }
    }

    pub fn report(&self) -> ActionReport {
        ActionReport {
            filename: self.filename.clone(),
            kind: self.kind,
            message: self.message.clone(),
        }
    }
}

pub struct ActionDispatcher {
    executor: Arc<dyn CommandExecutor>,
    pending: PendingActionSet,
}

impl ActionDispatcher {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            pending: PendingActionSet::new(),
        }
    }

    pub fn pending(&self) -> &PendingActionSet {
        &self.pending
    }

    /// Fetches the listing for `source` and builds a fresh index from it.
    pub async fn load_index(
        &self,
        session: Option<&Session>,
        source: ListingSource,
    ) -> Result<CategoryIndex, WorkspaceError> {
        let session = require_verified(session)?;
        let operation = match source {
            ListingSource::Own => RemoteOperation::ListUserMetadata {
                user_id: session.user_id.clone(),
            },
            ListingSource::Shared => RemoteOperation::ListSharedMetadata {
                user_id: session.user_id.clone(),
            },
        };

        debug!(operation = operation.name(), user_id = %session.user_id, "requesting listing");
        let payload = self.executor.execute(&operation).await.map_err(|err| {
            warn!(operation = operation.name(), error = %err, "listing failed");
            WorkspaceError::remote("Failed to list metadata", err.to_string())
        })?;
        let records = parse_metadata_listing(&payload)?;
        let index = CategoryIndex::build(&records, source.default_category());
        info!(
            operation = operation.name(),
            categories = index.category_count(),
            files = index.file_count(),
            "listing loaded"
        );
        Ok(index)
    }

    /// Issues `action` on `filename` from `section`. The index is not touched here;
    /// callers apply the returned outcome to the view that is still current.
    pub async fn dispatch(
        &self,
        session: Option<&Session>,
        section: Section,
        filename: &str,
        action: FileAction,
    ) -> Result<ActionOutcome, WorkspaceError> {
        let session = require_verified(session)?;
        let kind = action.kind();
        let source = match section.listing() {
            Some(source) if section.allows(kind) => source,
            _ => return Err(WorkspaceError::ActionNotAvailable { section, kind }),
        };
        let plan = plan_action(session, source, filename, &action)?;
        let _guard = self.pending.try_begin(filename, kind)?;

        let operation = plan.operation.name();
        debug!(operation, filename, "issuing file action");
        let payload = self.executor.execute(&plan.operation).await.map_err(|err| {
            warn!(operation, filename, error = %err, "file action failed");
            WorkspaceError::remote(plan.error_prefix, err.to_string())
        })?;

        let message = success_message(&plan, filename, &payload)?;
        info!(operation, filename, "file action succeeded");
        Ok(ActionOutcome {
            filename: filename.to_string(),
            kind,
            mutation: plan.mutation,
            payload,
            message,
        })
    }

    /// Sends a local file to `process_file`. Only pdf and image files are accepted.
    pub async fn upload(
        &self,
        session: Option<&Session>,
        file_path: &str,
    ) -> Result<ActionReport, WorkspaceError> {
        let session = require_verified(session)?;
        let file_path = file_path.trim();
        if file_path.is_empty() {
            return Err(WorkspaceError::Validation("Please select a file first".into()));
        }
        let path = Path::new(file_path);
        if !is_uploadable(path) {
            return Err(WorkspaceError::Validation(
                "Please upload a PDF or an image (png, jpg, jpeg)".into(),
            ));
        }
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());

        let _guard = self.pending.try_begin(file_path, ActionKind::Upload)?;
        let operation = RemoteOperation::ProcessFile {
            file_path: file_path.to_string(),
            user_id: session.user_id.clone(),
        };
        debug!(operation = operation.name(), file_path, "uploading file");
        self.executor.execute(&operation).await.map_err(|err| {
            warn!(operation = operation.name(), file_path, error = %err, "upload failed");
            WorkspaceError::remote("Upload failed", err.to_string())
        })?;

        info!(operation = operation.name(), filename = %filename, "upload succeeded");
        Ok(ActionReport {
            message: format!("Uploaded {filename}"),
            filename,
            kind: ActionKind::Upload,
        })
    }
}

fn require_verified(session: Option<&Session>) -> Result<&Session, WorkspaceError> {
    let session = session.ok_or(WorkspaceError::SessionMissing)?;
    if session.user_id.is_empty() {
        return Err(WorkspaceError::SessionMissing);
    }
    if !session.email_verified {
        return Err(WorkspaceError::EmailNotVerified);
    }
    Ok(session)
}

fn success_message(
    plan: &ActionPlan,
    filename: &str,
    payload: &str,
) -> Result<String, WorkspaceError> {
    let message = match &plan.operation {
        RemoteOperation::DownloadFile { .. } | RemoteOperation::DownloadSharedFile { .. } => {
            match payload.trim() {
                "" => format!("Downloaded {filename}"),
                text => text.to_string(),
            }
        }
        RemoteOperation::DeleteUserFile { .. } | RemoteOperation::DeleteSharedFile { .. } => {
            format!("Deleted {filename}")
        }
        RemoteOperation::RedactFile { .. } => "File redacted successfully!".to_string(),
        RemoteOperation::ShareFile {
            recipient_email, ..
        } => match ShareReceipt::parse(payload) {
            Some(receipt) if !receipt.success => {
                let reason = if receipt.message.is_empty() {
                    receipt.details
                } else {
                    receipt.message
                };
                return Err(WorkspaceError::remote(plan.error_prefix, reason));
            }
            Some(receipt) if !receipt.message.is_empty() => receipt.message,
            _ => format!("File shared successfully with {recipient_email}"),
        },
        RemoteOperation::SummarizeFile { .. } => format!("Summary ready for {filename}"),
        RemoteOperation::ListUserMetadata { .. }
        | RemoteOperation::ListSharedMetadata { .. }
        | RemoteOperation::ProcessFile { .. } => String::new(),
    };
    Ok(message)
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
