//! Client configuration: base URL, API key, status policy.

use amp_types::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/v1";

/// What to do with a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Decode and return the body whatever the status (a warning is logged).
    #[default]
    Passthrough,
    /// Return `ClientError::Status` without decoding the body.
    Strict,
}

/// Immutable client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub status_policy: StatusPolicy,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("status_policy", &self.status_policy)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            status_policy: StatusPolicy::default(),
        }
    }

    pub fn with_status_policy(mut self, status_policy: StatusPolicy) -> Self {
        self.status_policy = status_policy;
        self
    }

    /// Reads `AMP_BASE_URL`, `AMP_API_KEY` (required) and `AMP_STRICT_STATUS`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup("AMP_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = lookup("AMP_API_KEY")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ClientError::Config("AMP_API_KEY is not set".to_string()))?;
        let status_policy = match lookup("AMP_STRICT_STATUS") {
            Some(v) if is_truthy(&v) => StatusPolicy::Strict,
            _ => StatusPolicy::Passthrough,
        };
        Ok(Self {
            base_url,
            api_key,
            status_policy,
        })
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}
