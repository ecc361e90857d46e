//! Current credential and identity.
//!
//! A [`Session`] is an explicit context object handed to the dispatcher, not
//! process-wide state. Reads are public; the three mutators are crate-private
//! so only the post-processor (login) and [`crate::Dispatcher::logout`] can
//! write to it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use zeroize::Zeroizing;

use super::ports::{CredentialStore, InMemoryCredentialStore};

/// Token plus the identity it was issued for.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: Zeroizing<String>,
    username: Option<String>,
    user_id: Option<String>,
}

impl Credentials {
    /// Build credentials.
    pub fn new(token: impl Into<String>, username: Option<String>, user_id: Option<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            username,
            user_id,
        }
    }

    /// Bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// Username the token belongs to.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// User identifier the token belongs to.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// `Authorization` header value. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHeader(Zeroizing<String>);

impl AuthHeader {
    pub(crate) fn bearer(token: &str) -> Self {
        Self(Zeroizing::new(format!("Bearer {token}")))
    }

    /// Header value to place on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthHeader(<redacted>)")
    }
}

#[derive(Debug, Default)]
struct ProfileState {
    profile_complete: bool,
    cached_profile: Option<Value>,
}

/// Credential holder plus derived identity state.
pub struct Session {
    credentials: Arc<dyn CredentialStore>,
    profile: Mutex<ProfileState>,
}

impl Session {
    /// Session backed by the given credential store.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials,
            profile: Mutex::new(ProfileState::default()),
        }
    }

    /// Session backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCredentialStore::new()))
    }

    /// Whether a non-empty token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credentials
            .load()
            .is_some_and(|credentials| !credentials.token().is_empty())
    }

    /// Bearer header for the current token.
    #[must_use]
    pub fn auth_header(&self) -> Option<AuthHeader> {
        self.credentials
            .load()
            .filter(|credentials| !credentials.token().is_empty())
            .map(|credentials| AuthHeader::bearer(credentials.token()))
    }

    /// Current credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.credentials.load()
    }

    /// Signed-in username.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.credentials
            .load()
            .and_then(|credentials| credentials.username)
    }

    /// Signed-in user identifier.
    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.credentials
            .load()
            .and_then(|credentials| credentials.user_id)
    }

    /// Whether the last profile fetch reported a complete profile.
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        self.profile_state().profile_complete
    }

    /// Raw payload of the last own-profile fetch.
    #[must_use]
    pub fn cached_profile(&self) -> Option<Value> {
        self.profile_state().cached_profile.clone()
    }

    pub(crate) fn set_token(&self, credentials: Credentials) {
        self.credentials.store(credentials);
    }

    pub(crate) fn record_profile(&self, profile_complete: bool, profile: Value) {
        let mut state = self.profile_state();
        state.profile_complete = profile_complete;
        state.cached_profile = Some(profile);
    }

    pub(crate) fn clear(&self) {
        self.credentials.clear();
        *self.profile_state() = ProfileState::default();
    }

    fn profile_state(&self) -> MutexGuard<'_, ProfileState> {
        self.profile.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("username", &self.username())
            .field("profile_complete", &self.profile_complete())
            .finish_non_exhaustive()
    }
}
