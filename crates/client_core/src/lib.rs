//! Client workspace controller: session lifecycle, category index, navigation and file actions.

pub mod dispatcher;
pub mod executor;
pub mod identity;
pub mod index;
pub mod navigation;
pub mod pending;
pub mod session;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use dispatcher::{ActionDispatcher, ActionOutcome, FileAction, IndexMutation};
pub use executor::{CommandExecutor, MissingCommandExecutor, ScriptCommandExecutor};
pub use identity::{IdentityProvider, MissingIdentityProvider, RestIdentityProvider};
pub use index::CategoryIndex;
pub use navigation::{DrillDown, Modal, NavigationState};
pub use pending::PendingActionSet;
pub use session::{SessionManager, VerificationPolicy, VerificationState};
pub use workspace::{LoadState, Workspace, WorkspaceEvent, WorkspaceSnapshot};
