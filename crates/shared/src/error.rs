use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ActionKind, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Auth,
    SessionMissing,
    EmailNotVerified,
    RemoteOperation,
    MalformedMetadata,
    Validation,
    Busy,
    NotAvailable,
    Navigation,
    VerificationExpired,
}

/// How a front-end is expected to surface an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPresentation {
    /// Next to the credential form; session state unchanged.
    Inline,
    /// Replaces the section body until the user navigates away.
    Blocking,
    /// Transient toast; the triggering control is re-enabled.
    Notification,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("{0}")]
    Auth(String),
    #[error("User not authenticated")]
    SessionMissing,
    #[error("email address has not been verified yet")]
    EmailNotVerified,
    #[error("{context}: {message}")]
    RemoteOperation { context: String, message: String },
    #[error("malformed metadata listing: {0}")]
    MalformedMetadata(String),
    #[error("{0}")]
    Validation(String),
    #[error("{kind} already in progress for {filename}")]
    ActionInFlight { filename: String, kind: ActionKind },
    #[error("{kind} is not available in the {section} section")]
    ActionNotAvailable { section: Section, kind: ActionKind },
    #[error("{0}")]
    Navigation(String),
    #[error("email verification not confirmed after {attempts} checks")]
    VerificationExpired { attempts: u32 },
}

impl WorkspaceError {
    pub fn remote(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteOperation {
            context: context.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            WorkspaceError::Auth(_) => ErrorCode::Auth,
            WorkspaceError::SessionMissing => ErrorCode::SessionMissing,
            WorkspaceError::EmailNotVerified => ErrorCode::EmailNotVerified,
            WorkspaceError::RemoteOperation { .. } => ErrorCode::RemoteOperation,
            WorkspaceError::MalformedMetadata(_) => ErrorCode::MalformedMetadata,
            WorkspaceError::Validation(_) => ErrorCode::Validation,
            WorkspaceError::ActionInFlight { .. } => ErrorCode::Busy,
            WorkspaceError::ActionNotAvailable { .. } => ErrorCode::NotAvailable,
            WorkspaceError::Navigation(_) => ErrorCode::Navigation,
            WorkspaceError::VerificationExpired { .. } => ErrorCode::VerificationExpired,
        }
    }

    pub fn presentation(&self) -> ErrorPresentation {
        match self.code() {
            ErrorCode::Auth | ErrorCode::VerificationExpired => ErrorPresentation::Inline,
            ErrorCode::SessionMissing | ErrorCode::MalformedMetadata => {
                ErrorPresentation::Blocking
            }
            _ => ErrorPresentation::Notification,
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.presentation() == ErrorPresentation::Blocking
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
