use std::path::PathBuf;

use url::Url;

use crate::error::AppError;

/// Backend used when `RSVP_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Directory for persisted client state when `RSVP_STATE_DIR` is unset.
pub const DEFAULT_STATE_DIR: &str = ".rsvp";

/// Client configuration: where the API lives and where the session is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without trailing slash
    pub api_url: String,
    pub state_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(api_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        })
    }

    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    /// Read configuration from environment variables.
    ///
    /// - `RSVP_API_URL` (optional, defaults to `http://localhost:8000/api`)
    /// - `RSVP_STATE_DIR` (optional, defaults to `.rsvp`)
    ///
    /// Empty values count as unset.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("RSVP_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let state_dir = non_empty("RSVP_STATE_DIR").unwrap_or_else(|| DEFAULT_STATE_DIR.to_string());

        Ok(Self::new(&api_url)?.with_state_dir(state_dir))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

/// Validate an http(s) base URL and strip trailing slashes.
fn normalize_api_url(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let parsed = Url::parse(raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid RSVP_API_URL '{raw}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::ConfigError(format!(
                "RSVP_API_URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(AppError::ConfigError(format!(
            "RSVP_API_URL '{raw}' must not carry a query or fragment"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
