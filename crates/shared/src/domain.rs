use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! text_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

text_newtype!(UserId);
text_newtype!(SessionToken);

/// Default bucket label for records without a category in the user's own listing.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Default bucket label for records without a category in the shared listing.
pub const SHARED: &str = "Shared";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Home,
    Upload,
    Browse,
    Redact,
    Summarize,
    Shared,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Home,
        Section::Upload,
        Section::Browse,
        Section::Redact,
        Section::Summarize,
        Section::Shared,
    ];

    /// Listing that backs the section's category index, if it has one.
    pub fn listing(self) -> Option<ListingSource> {
        match self {
            Section::Browse | Section::Redact | Section::Summarize => Some(ListingSource::Own),
            Section::Shared => Some(ListingSource::Shared),
            Section::Home | Section::Upload => None,
        }
    }

    pub fn is_file_bearing(self) -> bool {
        self.listing().is_some()
    }

    pub fn allows(self, kind: ActionKind) -> bool {
        matches!(
            (self, kind),
            (Section::Browse, ActionKind::Download)
                | (Section::Browse, ActionKind::Share)
                | (Section::Browse, ActionKind::Delete)
                | (Section::Redact, ActionKind::Redact)
                | (Section::Summarize, ActionKind::Summarize)
                | (Section::Shared, ActionKind::Download)
                | (Section::Shared, ActionKind::Delete)
                | (Section::Upload, ActionKind::Upload)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Upload => "upload",
            Section::Browse => "browse",
            Section::Redact => "redact",
            Section::Summarize => "summarize",
            Section::Shared => "shared",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Own,
    Shared,
}

impl ListingSource {
    pub fn default_category(self) -> &'static str {
        match self {
            ListingSource::Own => UNCATEGORIZED,
            ListingSource::Shared => SHARED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Download,
    Delete,
    Redact,
    Share,
    Summarize,
    Upload,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Download => "download",
            ActionKind::Delete => "delete",
            ActionKind::Redact => "redact",
            ActionKind::Share => "share",
            ActionKind::Summarize => "summarize",
            ActionKind::Upload => "upload",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authenticated identity handed explicitly to every component that talks to the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub token: SessionToken,
    pub email_verified: bool,
}

impl Session {
    pub fn new(user_id: UserId, token: SessionToken, email_verified: bool) -> Self {
        Self {
            user_id,
            token,
            email_verified,
        }
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
