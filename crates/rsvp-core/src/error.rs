use thiserror::Error;

/// Application-wide error types for the RSVP client.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request could not be built or completed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error (no response received).
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Backend answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Persistent token storage could not be read or written.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No route table entry matches the requested path.
    #[error("No route matches path '{0}'")]
    RouteNotFound(String),

    /// A navigation guard refused the transition.
    #[error("Navigation to '{path}' denied: {reason}")]
    NavigationDenied { path: String, reason: String },

    /// Guards kept redirecting without settling on a route.
    #[error("Too many redirects while navigating to '{0}'")]
    RedirectLoop(String),

    /// A page could not be constructed on first visit.
    #[error("Failed to load page '{route}': {message}")]
    PageLoadError { route: String, message: String },

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// HTTP status reported by the backend, if this error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AppError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the backend rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status_code(), Some(401 | 403))
    }
}
