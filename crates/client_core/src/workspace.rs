//! Composes the session manager, the navigation state and the dispatcher into one controller.

use std::sync::{Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{ActionKind, Section, Session, UserId},
    error::WorkspaceError,
    protocol::ActionReport,
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    dispatcher::{ActionDispatcher, FileAction},
    index::CategoryIndex,
    navigation::{Modal, NavigationError, NavigationState},
    session::{
        wait_for_verification, SessionManager, VerificationPending, VerificationPoller,
        VerificationState,
    },
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(WorkspaceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    SessionChanged(Option<UserId>),
    SectionLoaded {
        section: Section,
        categories: usize,
        files: usize,
    },
    ActionCompleted(ActionReport),
    Notice(String),
    Error(WorkspaceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
    pub pending: Vec<ActionKind>,
}

/// Owned copy of everything a front-end needs to draw the current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub user_id: Option<UserId>,
    pub email_verified: bool,
    pub verification: Option<VerificationState>,
    pub section: Section,
    pub load: LoadState,
    pub categories: Vec<(String, usize)>,
    pub open_category: Option<String>,
    pub files: Vec<FileEntry>,
    pub modal: Option<Modal>,
}

#[derive(Debug)]
struct SectionView {
    epoch: u64,
    load: LoadState,
    index: CategoryIndex,
}

#[derive(Debug)]
struct WorkspaceState {
    session: Option<Session>,
    navigation: NavigationState,
    view: SectionView,
}

impl WorkspaceState {
    fn reset(&mut self, session: Option<Session>) {
        self.session = session;
        self.navigation = NavigationState::new();
        self.view.epoch += 1;
        self.view.load = LoadState::Idle;
        self.view.index = CategoryIndex::default();
    }
}

pub struct Workspace {
    sessions: SessionManager,
    dispatcher: ActionDispatcher,
    state: Mutex<WorkspaceState>,
    verification: Mutex<Option<VerificationPoller>>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl Workspace {
    pub fn new(sessions: SessionManager, dispatcher: ActionDispatcher) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sessions,
            dispatcher,
            state: Mutex::new(WorkspaceState {
                session: None,
                navigation: NavigationState::new(),
                view: SectionView {
                    epoch: 0,
                    load: LoadState::Idle,
                    index: CategoryIndex::default(),
                },
            }),
            verification: Mutex::new(None),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.events.subscribe()
    }

    fn state(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poller(&self) -> MutexGuard<'_, Option<VerificationPoller>> {
        self.verification
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: WorkspaceEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn fail(&self, err: WorkspaceError) -> WorkspaceError {
        self.emit(WorkspaceEvent::Error(err.clone()));
        err
    }

    fn start_session(&self, session: Session) {
        let user_id = session.user_id.clone();
        self.state().reset(Some(session));
        self.emit(WorkspaceEvent::SessionChanged(Some(user_id)));
    }

    /// Signs in with the session a finished poller acquired, if nobody has picked it up yet.
    fn adopt_verified_session(&self) {
        let verified = {
            let mut poller = self.poller();
            let state = poller.as_ref().map(VerificationPoller::state);
            match state {
                Some(VerificationState::Verified(session)) => {
                    poller.take();
                    session
                }
                _ => return,
            }
        };
        info!(user_id = %verified.user_id, "email verified; signing in");
        self.start_session(verified);
    }

    pub fn session(&self) -> Option<Session> {
        self.adopt_verified_session();
        self.state().session.clone()
    }

    /// Picks up a session persisted by an earlier run and lands on home.
    pub async fn restore(&self) -> Option<Session> {
        self.cancel_verification().await;
        let session = self.sessions.restore().await?;
        info!(user_id = %session.user_id, "restored persisted session");
        self.start_session(session.clone());
        Some(session)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, WorkspaceError> {
        self.cancel_verification().await;
        let session = self
            .sessions
            .login(email, password)
            .await
            .map_err(|err| self.fail(err))?;
        self.start_session(session.clone());
        Ok(session)
    }

    /// Creates the identity and starts polling for its verification.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
    ) -> Result<VerificationPending, WorkspaceError> {
        let pending = self
            .sessions
            .signup(email, password)
            .await
            .map_err(|err| self.fail(err))?;
        let poller = self.sessions.start_verification().await;
        *self.poller() = poller;
        self.emit(WorkspaceEvent::Notice(format!(
            "Verification email sent to {}",
            pending.email
        )));
        Ok(pending)
    }

    pub fn verification_state(&self) -> Option<VerificationState> {
        self.adopt_verified_session();
        self.poller().as_ref().map(VerificationPoller::state)
    }

    /// Resolves when the running poller finishes. On success the new session lands on home.
    pub async fn await_verification(&self) -> Result<Session, WorkspaceError> {
        let state = self
            .poller()
            .as_ref()
            .map(VerificationPoller::subscribe)
            .ok_or_else(|| WorkspaceError::Auth("no verification in progress".into()))?;

        let result = wait_for_verification(state).await;
        let still_running = self.poller().take().is_some();
        match result {
            Ok(session) => {
                if still_running {
                    self.start_session(session.clone());
                }
                Ok(session)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub async fn resend_verification(&self) -> Result<(), WorkspaceError> {
        self.sessions
            .resend_verification()
            .await
            .map_err(|err| self.fail(err))?;
        self.emit(WorkspaceEvent::Notice("Verification email resent".into()));
        Ok(())
    }

    /// "Back to login": stops the poller and forgets the pending identity.
    pub async fn cancel_verification(&self) {
        if let Some(poller) = self.poller().take() {
            poller.cancel();
        }
        self.sessions.cancel_verification().await;
    }

    pub async fn logout(&self) {
        self.cancel_verification().await;
        self.sessions.logout().await;
        self.state().reset(None);
        self.emit(WorkspaceEvent::SessionChanged(None));
    }

    /// Switches section and, for file-bearing sections, rebuilds the index from a fresh listing.
    pub async fn select_section(&self, section: Section) -> Result<(), WorkspaceError> {
        let (epoch, session, source) = {
            let mut state = self.state();
            state.navigation.select_section(section);
            state.view.epoch += 1;
            state.view.index = CategoryIndex::default();
            let source = section.listing();
            state.view.load = if source.is_some() {
                LoadState::Loading
            } else {
                LoadState::Idle
            };
            (state.view.epoch, state.session.clone(), source)
        };
        debug!(section = %section, epoch, "entered section");

        let Some(source) = source else {
            return Ok(());
        };
        let result = self.dispatcher.load_index(session.as_ref(), source).await;

        let mut state = self.state();
        if state.view.epoch != epoch {
            debug!(section = %section, epoch, "ignoring listing for a section that was left");
            return Ok(());
        }
        match result {
            Ok(index) => {
                let (categories, files) = (index.category_count(), index.file_count());
                state.view.index = index;
                state.view.load = LoadState::Ready;
                drop(state);
                self.emit(WorkspaceEvent::SectionLoaded {
                    section,
                    categories,
                    files,
                });
                Ok(())
            }
            Err(err) => {
                warn!(section = %section, error = %err, "section failed to load");
                state.view.load = LoadState::Failed(err.clone());
                drop(state);
                Err(self.fail(err))
            }
        }
    }

    pub async fn reload_section(&self) -> Result<(), WorkspaceError> {
        let section = self.state().navigation.section();
        self.select_section(section).await
    }

    pub fn enter_category(&self, category: &str) -> Result<(), WorkspaceError> {
        let mut state = self.state();
        if !state.view.index.contains_category(category) {
            return Err(self.fail(WorkspaceError::Navigation(format!(
                "unknown category {category}"
            ))));
        }
        state
            .navigation
            .enter_category(category)
            .map_err(|err| self.fail(err.into()))
    }

    pub fn back(&self) -> Result<(), WorkspaceError> {
        self.state()
            .navigation
            .back()
            .map_err(|err| self.fail(err.into()))
    }

    /// Opens a dialog for a file of the open category after checking the section offers `kind`.
    fn open_file_modal(&self, kind: ActionKind, modal: Modal) -> Result<(), WorkspaceError> {
        let mut state = self.state();
        let section = state.navigation.section();
        let opened = if section.allows(kind) {
            ensure_in_open_category(&state, modal.filename()).and_then(|()| {
                state
                    .navigation
                    .open_modal(modal)
                    .map_err(WorkspaceError::from)
            })
        } else {
            Err(WorkspaceError::ActionNotAvailable { section, kind })
        };
        opened.map_err(|err| self.fail(err))
    }

    pub fn request_delete(&self, filename: &str) -> Result<(), WorkspaceError> {
        self.open_file_modal(
            ActionKind::Delete,
            Modal::ConfirmDelete {
                filename: filename.to_string(),
            },
        )
    }

    pub async fn confirm_delete(&self) -> Result<ActionReport, WorkspaceError> {
        let filename = {
            let mut state = self.state();
            let filename = match state.navigation.modal() {
                Some(Modal::ConfirmDelete { filename }) => filename.clone(),
                _ => {
                    return Err(self.fail(WorkspaceError::Navigation(
                        "no delete is awaiting confirmation".into(),
                    )))
                }
            };
            state.navigation.dismiss_modal();
            filename
        };
        self.perform(&filename, FileAction::Delete).await
    }

    pub fn open_share(&self, filename: &str) -> Result<(), WorkspaceError> {
        self.open_file_modal(
            ActionKind::Share,
            Modal::Share {
                filename: filename.to_string(),
                recipient: String::new(),
            },
        )
    }

    pub fn set_share_recipient(&self, recipient: &str) -> Result<(), WorkspaceError> {
        self.state()
            .navigation
            .set_share_recipient(recipient)
            .map_err(|err| self.fail(err.into()))
    }

    /// Shares with the recipient typed into the open dialog; the dialog stays open on failure.
    pub async fn submit_share(&self) -> Result<ActionReport, WorkspaceError> {
        let (filename, recipient) = match self.state().navigation.modal() {
            Some(Modal::Share {
                filename,
                recipient,
            }) => (filename.clone(), recipient.clone()),
            _ => {
                return Err(self.fail(WorkspaceError::Navigation(
                    "no share dialog is open".into(),
                )))
            }
        };
        self.perform(
            &filename,
            FileAction::Share {
                recipient_email: recipient,
            },
        )
        .await
    }

    pub fn cancel_modal(&self) {
        self.state().navigation.dismiss_modal();
    }

    pub fn dismiss_summary(&self) -> Result<(), WorkspaceError> {
        let mut state = self.state();
        if !matches!(state.navigation.modal(), Some(Modal::Summary { .. })) {
            return Err(self.fail(WorkspaceError::Navigation(
                "no summary is shown".into(),
            )));
        }
        state.navigation.dismiss_modal();
        Ok(())
    }

    /// Runs `action` on a file of the open category and applies the outcome if the view is unchanged.
    pub async fn perform(
        &self,
        filename: &str,
        action: FileAction,
    ) -> Result<ActionReport, WorkspaceError> {
        let (epoch, section, session) = {
            let state = self.state();
            ensure_in_open_category(&state, filename).map_err(|err| self.fail(err))?;
            (
                state.view.epoch,
                state.navigation.section(),
                state.session.clone(),
            )
        };

        let outcome = self
            .dispatcher
            .dispatch(session.as_ref(), section, filename, action)
            .await
            .map_err(|err| self.fail(err))?;

        {
            let mut state = self.state();
            if state.view.epoch == epoch {
                let WorkspaceState {
                    navigation, view, ..
                } = &mut *state;
                outcome.apply(&mut view.index, navigation);
            } else {
                debug!(filename, kind = %outcome.kind, "section changed; skipping local update");
            }
        }

        let report = outcome.report();
        self.emit(WorkspaceEvent::Notice(report.message.clone()));
        self.emit(WorkspaceEvent::ActionCompleted(report.clone()));
        Ok(report)
    }

    pub async fn upload(&self, file_path: &str) -> Result<ActionReport, WorkspaceError> {
        let (section, session) = {
            let state = self.state();
            (state.navigation.section(), state.session.clone())
        };
        if !section.allows(ActionKind::Upload) {
            return Err(self.fail(WorkspaceError::ActionNotAvailable {
                section,
                kind: ActionKind::Upload,
            }));
        }
        let report = self
            .dispatcher
            .upload(session.as_ref(), file_path)
            .await
            .map_err(|err| self.fail(err))?;
        self.emit(WorkspaceEvent::Notice(report.message.clone()));
        self.emit(WorkspaceEvent::ActionCompleted(report.clone()));
        Ok(report)
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        self.adopt_verified_session();
        let verification = self.verification_state();
        let state = self.state();
        let pending = self.dispatcher.pending();
        let open_category = state.navigation.open_category().map(str::to_string);
        let files = open_category
            .as_deref()
            .map(|category| {
                state
                    .view
                    .index
                    .files(category)
                    .iter()
                    .map(|filename| FileEntry {
                        filename: filename.clone(),
                        pending: pending.pending_kinds(filename),
                    })
                    .collect()
            })
            .unwrap_or_default();

        WorkspaceSnapshot {
            user_id: state.session.as_ref().map(|s| s.user_id.clone()),
            email_verified: state.session.as_ref().is_some_and(|s| s.email_verified),
            verification,
            section: state.navigation.section(),
            load: state.view.load.clone(),
            categories: state
                .view
                .index
                .categories()
                .map(|(category, count)| (category.to_string(), count))
                .collect(),
            open_category,
            files,
            modal: state.navigation.modal().cloned(),
        }
    }
}

/// File actions start from a file list; the file must belong to the category shown.
fn ensure_in_open_category(state: &WorkspaceState, filename: &str) -> Result<(), WorkspaceError> {
    let category = state
        .navigation
        .open_category()
        .ok_or(NavigationError::NotInFileList)?;
    if !state.view.index.files(category).iter().any(|f| f == filename) {
        return Err(WorkspaceError::Navigation(format!(
            "{filename} is not in {category}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
