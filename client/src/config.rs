//! Client configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 300;
const DEFAULT_FOCUS_REFRESH_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("marketplace-client/", env!("CARGO_PKG_VERSION"));

/// Settings controlling how the client reaches the marketplace API.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct ClientSettings {
    /// API base URL, including any path prefix such as `/api/v1`.
    pub base_url: Option<String>,
    /// Fixed per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// `User-Agent` header override.
    pub user_agent: Option<String>,
    /// Minimum spacing between passive refreshes, in seconds.
    pub focus_refresh_interval_secs: Option<u64>,
}

impl ClientSettings {
    /// Return the configured base URL, falling back to the local default.
    ///
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when the configured value is not a URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
    }

    /// Request timeout clamped to a sane window.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Return the configured user agent, falling back to the crate's own.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Minimum interval between focus-triggered refreshes.
    #[must_use]
    pub fn focus_refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.focus_refresh_interval_secs
                .unwrap_or(DEFAULT_FOCUS_REFRESH_SECS),
        )
    }
}
