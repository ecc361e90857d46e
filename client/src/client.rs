//! Client facade wiring the dispatcher and every domain cache together.

use std::sync::Arc;
use std::time::Duration;

use mockable::{Clock, DefaultClock};
use thiserror::Error;
use tracing::info;

use crate::cache::{
    ApplicationsCache, AssignmentsCache, CategoriesCache, ConversationsCache, JobsCache,
    ProfilesCache, RefreshThrottle,
};
use crate::config::ClientSettings;
use crate::domain::models::Identity;
use crate::domain::operations::{CreateSession, LoginRequest};
use crate::domain::ports::{CredentialStore, InMemoryCredentialStore, Transport};
use crate::domain::{ApiError, Dispatcher, EndpointRegistry, RegistryError, Session};
use crate::outbound::http::ReqwestTransport;

const DEFAULT_FOCUS_REFRESH: Duration = Duration::from_secs(30);

/// Errors raised while assembling a [`MarketplaceClient`].
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// Two endpoint tables declared the same operation key.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// The configured base URL did not parse.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// No transport was supplied to the builder.
    #[error("a transport is required")]
    MissingTransport,
}

/// Step-by-step construction of a [`MarketplaceClient`].
///
/// Only the transport is mandatory; everything else has a production
/// default.
#[derive(Default)]
pub struct ClientBuilder {
    transport: Option<Arc<dyn Transport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
    clock: Option<Arc<dyn Clock>>,
    registry: Option<EndpointRegistry>,
    focus_refresh: Option<Duration>,
}

impl ClientBuilder {
    /// Start from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport every request goes through.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Credential storage; defaults to process memory.
    #[must_use]
    pub fn credential_store(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Time source for refresh throttling.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the standard endpoint registry.
    #[must_use]
    pub fn registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Minimum spacing between focus-triggered refreshes.
    #[must_use]
    pub const fn focus_refresh_interval(mut self, interval: Duration) -> Self {
        self.focus_refresh = Some(interval);
        self
    }

    /// Assemble the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientBuildError::MissingTransport`] when no transport was
    /// set, or [`ClientBuildError::Registry`] when the standard tables
    /// conflict.
    pub fn build(self) -> Result<MarketplaceClient, ClientBuildError> {
        let transport = self.transport.ok_or(ClientBuildError::MissingTransport)?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => EndpointRegistry::standard()?,
        };
        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(InMemoryCredentialStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(DefaultClock));
        let interval = self.focus_refresh.unwrap_or(DEFAULT_FOCUS_REFRESH);

        let dispatcher = Dispatcher::new(
            Arc::new(registry),
            transport,
            Arc::new(Session::new(credentials)),
        );
        let jobs_focus = Arc::new(RefreshThrottle::new(Arc::clone(&clock), interval));
        let conversations_focus = Arc::new(RefreshThrottle::new(clock, interval));

        let assignments = AssignmentsCache::new(dispatcher.clone());
        let conversations = ConversationsCache::new(dispatcher.clone(), conversations_focus);
        let applications = ApplicationsCache::new(
            dispatcher.clone(),
            assignments.intake(),
            conversations.eviction(),
        );

        Ok(MarketplaceClient {
            jobs: JobsCache::new(dispatcher.clone(), jobs_focus),
            profiles: ProfilesCache::new(dispatcher.clone()),
            categories: CategoriesCache::new(dispatcher.clone()),
            applications,
            assignments,
            conversations,
            dispatcher,
        })
    }
}

/// Entry point for applications: one dispatcher, one session, and a cache
/// per business domain.
#[derive(Debug, Clone)]
pub struct MarketplaceClient {
    dispatcher: Dispatcher,
    jobs: JobsCache,
    applications: ApplicationsCache,
    assignments: AssignmentsCache,
    conversations: ConversationsCache,
    profiles: ProfilesCache,
    categories: CategoriesCache,
}

impl MarketplaceClient {
    /// Builder for custom wiring.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client talking to the API described by `settings` over reqwest.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientBuildError`] when the base URL is malformed or the
    /// HTTP client cannot be built.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let transport = ReqwestTransport::with_user_agent(
            settings.base_url()?,
            settings.request_timeout(),
            settings.user_agent(),
        )?;
        Self::builder()
            .transport(Arc::new(transport))
            .focus_refresh_interval(settings.focus_refresh_interval())
            .build()
    }

    /// Dispatcher shared by every cache.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Current session.
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        self.dispatcher.session()
    }

    /// Jobs cache.
    #[must_use]
    pub const fn jobs(&self) -> &JobsCache {
        &self.jobs
    }

    /// Applications cache.
    #[must_use]
    pub const fn applications(&self) -> &ApplicationsCache {
        &self.applications
    }

    /// Assignments cache.
    #[must_use]
    pub const fn assignments(&self) -> &AssignmentsCache {
        &self.assignments
    }

    /// Conversations cache.
    #[must_use]
    pub const fn conversations(&self) -> &ConversationsCache {
        &self.conversations
    }

    /// Profiles cache.
    #[must_use]
    pub const fn profiles(&self) -> &ProfilesCache {
        &self.profiles
    }

    /// Categories cache.
    #[must_use]
    pub const fn categories(&self) -> &CategoriesCache {
        &self.categories
    }

    /// Whether a credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    /// Sign in and store the issued credential in the session.
    ///
    /// # Errors
    ///
    /// Returns the dispatcher's [`ApiError`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity, ApiError> {
        self.dispatcher
            .call::<CreateSession>(LoginRequest::new(username, password))
            .await
    }

    /// Forget the credential and everything cached for the signed-in user.
    ///
    /// Categories are public and stay cached. Calls still outstanding
    /// finish for the callers already waiting on them, but their results
    /// are not stored and later callers never join them.
    pub fn logout(&self) {
        self.dispatcher.logout();
        self.jobs.reset();
        self.applications.reset();
        self.assignments.reset();
        self.conversations.reset();
        self.profiles.reset();
        info!("user caches cleared");
    }
}

#[cfg(test)]
mod tests {
    //! Wiring tests for the facade.

    use super::*;
    use crate::domain::models::ApplicationStatus;
    use crate::domain::HttpMethod;
    use crate::test_support::RecordingTransport;
    use serde_json::json;

    fn client_over(transport: RecordingTransport) -> MarketplaceClient {
        MarketplaceClient::builder()
            .transport(Arc::new(transport))
            .build()
            .expect("client builds")
    }

    #[test]
    fn building_without_transport_fails() {
        let err = ClientBuilder::new().build().expect_err("missing transport");
        assert!(matches!(err, ClientBuildError::MissingTransport));
    }

    #[tokio::test]
    async fn login_then_logout_clears_user_state() {
        let transport = RecordingTransport::new()
            .respond_json(
                HttpMethod::Post,
                "/auth/login",
                200,
                json!({"token": "T", "user": {"_id": "u1", "username": "ada"}}),
            )
            .respond_json(
                HttpMethod::Get,
                "/applications/mine",
                200,
                json!([{"_id": "a1", "jobId": "j1", "status": "pending"}]),
            );
        let client = client_over(transport);

        let identity = client.login("ada", "pw").await.expect("login");
        assert_eq!(identity.username.as_deref(), Some("ada"));
        assert!(client.is_authenticated());

        client.applications().fetch(false).await.expect("applications");
        assert_eq!(client.applications().pending().len(), 1);
        assert_eq!(
            client.applications().snapshot().first().map(|a| a.status),
            Some(ApplicationStatus::Pending)
        );

        client.logout();
        assert!(!client.is_authenticated());
        assert!(client.applications().snapshot().is_empty());
    }

    #[tokio::test]
    async fn categories_survive_logout() {
        let transport = RecordingTransport::new().respond_json(
            HttpMethod::Get,
            "/categories",
            200,
            json!([{"_id": "c1", "name": "Plumbing"}]),
        );
        let client = client_over(transport);

        client.categories().fetch(false).await.expect("categories");
        client.logout();

        assert_eq!(client.categories().snapshot().len(), 1);
    }
}
