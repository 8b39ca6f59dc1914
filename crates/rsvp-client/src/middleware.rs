//! Request descriptors and the middleware chain applied before dispatch.
//!
//! Every API call is first described as a [`RequestDescriptor`]. The client
//! then hands the descriptor to each [`RequestMiddleware`] in order, and only
//! afterwards turns it into a real HTTP request.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use rsvp_core::error::AppError;
use rsvp_core::session::TOKEN_KEY;
use rsvp_core::traits::Storage;

/// Everything needed to send one request, relative to the API base URL.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Unencoded path segments, e.g. `["events", "wedding"]`
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Slash-joined path, e.g. `/admin/rsvps/42`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path())
    }
}

/// Mutates an outgoing request before it is sent.
pub trait RequestMiddleware: Send + Sync {
    fn handle(&self, request: &mut RequestDescriptor) -> Result<(), AppError>;
}

/// Marks every request as carrying JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonContentType;

impl RequestMiddleware for JsonContentType {
    fn handle(&self, request: &mut RequestDescriptor) -> Result<(), AppError> {
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(())
    }
}

/// Attaches `Authorization: Bearer <token>` from the persisted admin token.
///
/// The token is re-read from storage on every request; the auth store is the
/// only writer. Without a token the request goes out unauthenticated.
#[derive(Clone)]
pub struct BearerAuth {
    storage: Arc<dyn Storage>,
}

impl BearerAuth {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl RequestMiddleware for BearerAuth {
    fn handle(&self, request: &mut RequestDescriptor) -> Result<(), AppError> {
        let Some(token) = self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AppError::HttpError("Stored admin token is not a valid header value".into()))?;
        value.set_sensitive(true);

        // insert() replaces, so the header is present exactly once.
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

impl fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}
