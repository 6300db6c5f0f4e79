//! Client configuration

use serde::{Deserialize, Serialize};

/// Default root of the ERP REST API
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/";

/// How concurrent authorization failures share token refreshes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Requests failing with the same stale token wait for a single refresh
    #[default]
    Coalesce,
    /// Every failing request calls the refresh endpoint itself
    PerRequest,
}

/// Connection and endpoint settings for [`super::ApiClient`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root URL every resource path is resolved against
    pub base_url: String,

    /// Token refresh endpoint, relative to `base_url` or absolute
    pub refresh_path: String,

    /// Token obtain (login) endpoint, relative to `base_url` or absolute
    pub token_path: String,

    /// Login page hosts send the user to once the session is invalidated
    pub login_path: String,

    /// Transport timeout in seconds; ignored on wasm32
    pub timeout_secs: Option<u64>,

    pub user_agent: String,

    pub refresh_policy: RefreshPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: "token/refresh/".to_string(),
            token_path: "token/".to_string(),
            login_path: "/login".to_string(),
            timeout_secs: None,
            user_agent: concat!("erp-client/", env!("CARGO_PKG_VERSION")).to_string(),
            refresh_policy: RefreshPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Resolve `path` against the base URL
    ///
    /// Absolute `http(s)://` URLs are returned unchanged. Leading and
    /// trailing slashes on either side collapse to exactly one separator.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
