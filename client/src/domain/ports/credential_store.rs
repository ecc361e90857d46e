//! Driven port for persisting the current credential.
//!
//! The in-memory store is the default; a keychain- or file-backed store can
//! replace it without touching the dispatcher.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::Credentials;

/// Storage for the current `{token, username, user_id}` triple.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Read the stored credentials, if any.
    fn load(&self) -> Option<Credentials>;

    /// Replace the stored credentials.
    fn store(&self, credentials: Credentials);

    /// Forget the stored credentials.
    fn clear(&self);
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    slot: Mutex<Option<Credentials>>,
}

impl InMemoryCredentialStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with credentials, e.g. restored from disk.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            slot: Mutex::new(Some(credentials)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Credentials>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn load(&self) -> Option<Credentials> {
        self.slot().clone()
    }

    fn store(&self, credentials: Credentials) {
        *self.slot() = Some(credentials);
    }

    fn clear(&self) {
        *self.slot() = None;
    }
}
