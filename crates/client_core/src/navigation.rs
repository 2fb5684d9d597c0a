//! Section selector plus the per-section drill-down and modal state.

use shared::{domain::Section, error::WorkspaceError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrillDown {
    CategoryGrid,
    FileList { category: String },
}

/// Transient per-file dialog. Only ever open on top of a `FileList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Share { filename: String, recipient: String },
    ConfirmDelete { filename: String },
    Summary { filename: String, summary: String },
}

impl Modal {
    pub fn filename(&self) -> &str {
        match self {
            Modal::Share { filename, .. }
            | Modal::ConfirmDelete { filename }
            | Modal::Summary { filename, .. } => filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("the {0} section has no categories")]
    NotFileBearing(Section),
    #[error("no category is open")]
    NotInFileList,
    #[error("return to the category grid before opening another category")]
    AlreadyInFileList,
    #[error("close the open dialog first")]
    ModalOpen,
    #[error("no share dialog is open")]
    NoShareDialog,
}

impl From<NavigationError> for WorkspaceError {
    fn from(value: NavigationError) -> Self {
        WorkspaceError::Navigation(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    section: Section,
    drill_down: DrillDown,
    modal: Option<Modal>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationState {
    pub fn new() -> Self {
        Self {
            section: Section::Home,
            drill_down: DrillDown::CategoryGrid,
            modal: None,
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn drill_down(&self) -> &DrillDown {
        &self.drill_down
    }

    pub fn open_category(&self) -> Option<&str> {
        match &self.drill_down {
            DrillDown::FileList { category } => Some(category),
            DrillDown::CategoryGrid => None,
        }
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Switches section. Drill-down and any modal never survive a switch, even to the same section.
    pub fn select_section(&mut self, section: Section) {
        self.section = section;
        self.drill_down = DrillDown::CategoryGrid;
        self.modal = None;
    }

    pub fn enter_category(&mut self, category: impl Into<String>) -> Result<(), NavigationError> {
        if !self.section.is_file_bearing() {
            return Err(NavigationError::NotFileBearing(self.section));
        }
        if matches!(self.drill_down, DrillDown::FileList { .. }) {
            return Err(NavigationError::AlreadyInFileList);
        }
        self.drill_down = DrillDown::FileList {
            category: category.into(),
        };
        Ok(())
    }

    /// `FileList -> CategoryGrid`, discarding any open modal.
    pub fn back(&mut self) -> Result<(), NavigationError> {
        if !matches!(self.drill_down, DrillDown::FileList { .. }) {
            return Err(NavigationError::NotInFileList);
        }
        self.exit_drill_down();
        Ok(())
    }

    pub fn exit_drill_down(&mut self) {
        self.drill_down = DrillDown::CategoryGrid;
        self.modal = None;
    }

    pub fn open_modal(&mut self, modal: Modal) -> Result<(), NavigationError> {
        if !matches!(self.drill_down, DrillDown::FileList { .. }) {
            return Err(NavigationError::NotInFileList);
        }
        if self.modal.is_some() {
            return Err(NavigationError::ModalOpen);
        }
        self.modal = Some(modal);
        Ok(())
    }

    /// Closes the modal; the file list underneath stays open.
    pub fn dismiss_modal(&mut self) -> Option<Modal> {
        self.modal.take()
    }

    pub fn set_share_recipient(&mut self, value: &str) -> Result<(), NavigationError> {
        match &mut self.modal {
            Some(Modal::Share { recipient, .. }) => {
                *recipient = value.to_string();
                Ok(())
            }
            _ => Err(NavigationError::NoShareDialog),
        }
    }
}

#[cfg(test)]
#[path = "tests/navigation_tests.rs"]
mod tests;
