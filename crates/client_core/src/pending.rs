use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use shared::{domain::ActionKind, error::WorkspaceError};
use tracing::warn;

type PendingKey = (String, ActionKind);

/// In-flight (filename, action kind) pairs. At most one operation per pair.
#[derive(Clone, Default)]
pub struct PendingActionSet {
    inner: Arc<Mutex<HashSet<PendingKey>>>,
}

impl PendingActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashSet<PendingKey>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the pair; the claim is released when the returned guard drops.
    pub fn try_begin(&self, filename: &str, kind: ActionKind) -> Result<PendingGuard, WorkspaceError> {
        let key = (filename.to_string(), kind);
        if !self.entries().insert(key.clone()) {
            warn!(filename, kind = %kind, "rejected duplicate submission while action in flight");
            return Err(WorkspaceError::ActionInFlight {
                filename: key.0,
                kind,
            });
        }
        Ok(PendingGuard {
            set: self.clone(),
            key: Some(key),
        })
    }

    pub fn is_pending(&self, filename: &str, kind: ActionKind) -> bool {
        self.entries().contains(&(filename.to_string(), kind))
    }

    pub fn pending_kinds(&self, filename: &str) -> Vec<ActionKind> {
        self.entries()
            .iter()
            .filter(|(f, _)| f == filename)
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[must_use = "dropping the guard releases the pending slot immediately"]
pub struct PendingGuard {
    set: PendingActionSet,
    key: Option<PendingKey>,
}

impl PendingGuard {
    pub fn filename(&self) -> &str {
        self.key.as_ref().map(|(f, _)| f.as_str()).unwrap_or_default()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.set.entries().remove(&key);
        }
    }
}

#[cfg(test)]
#[path = "tests/pending_tests.rs"]
mod tests;
