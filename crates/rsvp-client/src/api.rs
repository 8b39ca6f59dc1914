use std::sync::Arc;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use rsvp_core::config::ClientConfig;
use rsvp_core::error::AppError;
use rsvp_core::models::{
    AdminToken, Event, EventStats, ExportFile, Registry, RsvpListEntry, RsvpRecord,
};
use rsvp_core::traits::Storage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::middleware::{BearerAuth, JsonContentType, RequestDescriptor, RequestMiddleware};

const USER_AGENT: &str = "rsvp-client/0.1";

/// HTTP client for the wedding RSVP backend.
///
/// One shared `reqwest::Client` bound to the configured base URL. Each
/// request passes through the middleware chain (JSON content type, then the
/// bearer token) before it is sent. No retries, no caching: every failure is
/// returned to the caller as an [`AppError`].
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    middleware: Vec<Arc<dyn RequestMiddleware>>,
}

impl ApiClient {
    /// Build a client reading the admin token from `storage`.
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid API URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::ConfigError(format!(
                "API URL cannot be a base: {base_url}"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            middleware: vec![
                Arc::new(JsonContentType),
                Arc::new(BearerAuth::new(storage)),
            ],
        })
    }

    /// Append a middleware; it runs after the built-in ones.
    pub fn with_middleware(mut self, middleware: impl RequestMiddleware + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    // ---- Events ----

    pub async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        self.fetch_json(endpoints::list_events()).await
    }

    pub async fn get_event(&self, slug: &str) -> Result<Event, AppError> {
        self.fetch_json(endpoints::get_event(slug)).await
    }

    // ---- RSVP ----

    /// Submit an RSVP. The payload is passed through as-is; the backend
    /// validates it.
    pub async fn submit_rsvp<T: Serialize + ?Sized>(
        &self,
        payload: &T,
    ) -> Result<RsvpRecord, AppError> {
        self.fetch_json(endpoints::submit_rsvp(serde_json::to_value(payload)?))
            .await
    }

    // ---- Registry ----

    pub async fn get_registry(&self) -> Result<Registry, AppError> {
        self.fetch_json(endpoints::get_registry()).await
    }

    // ---- Admin ----

    /// Exchange the admin password for a bearer token.
    ///
    /// Does not store the token; hand it to the auth store.
    pub async fn admin_login(&self, password: &str) -> Result<AdminToken, AppError> {
        self.fetch_json(endpoints::admin_login(password)).await
    }

    /// All RSVPs, or only those for `event_slug`.
    pub async fn get_admin_rsvps(
        &self,
        event_slug: Option<&str>,
    ) -> Result<Vec<RsvpListEntry>, AppError> {
        self.fetch_json(endpoints::admin_rsvps(event_slug)).await
    }

    pub async fn get_admin_stats(&self) -> Result<Vec<EventStats>, AppError> {
        self.fetch_json(endpoints::admin_stats()).await
    }

    pub async fn delete_rsvp(&self, rsvp_id: i64) -> Result<(), AppError> {
        self.send(endpoints::delete_rsvp(rsvp_id)).await?;
        Ok(())
    }

    /// Download the RSVP export (CSV), optionally for a single event.
    pub async fn export_rsvps(&self, event_slug: Option<&str>) -> Result<ExportFile, AppError> {
        let response = self.send(endpoints::export_rsvps(event_slug)).await?;

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_disposition_filename);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read export body: {e}")))?;

        Ok(ExportFile {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        })
    }

    // ---- Plumbing ----

    /// Run `request` through the middleware chain without sending it.
    pub fn prepare(&self, mut request: RequestDescriptor) -> Result<RequestDescriptor, AppError> {
        for middleware in &self.middleware {
            middleware.handle(&mut request)?;
        }
        Ok(request)
    }

    /// Absolute URL for a prepared request.
    pub fn url_for(&self, request: &RequestDescriptor) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(&request.segments);
        }

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        url
    }

    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestDescriptor) -> Result<T, AppError> {
        let response = self.send(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to read response body: {e}")))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send a request and turn any non-2xx status into [`AppError::ApiError`].
    async fn send(&self, request: RequestDescriptor) -> Result<Response, AppError> {
        let request = self.prepare(request)?;
        let url = self.url_for(&request);

        tracing::debug!(method = %request.method, %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(request.headers);
        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else if e.is_timeout() {
                AppError::NetworkError(format!("Request timed out: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, status = status_code, "Failed to read error body");
                String::new()
            });
            let message = error_message(status_code, &body);

            tracing::warn!(status = status_code, %url, "Request failed");

            return Err(AppError::ApiError {
                status: status_code,
                message,
            });
        }

        Ok(response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

/// Request descriptors for every backend endpoint, before middleware.
pub mod endpoints {
    use reqwest::Method;

    use crate::middleware::RequestDescriptor;

    pub fn list_events() -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, ["events"])
    }

    pub fn get_event(slug: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, ["events", slug])
    }

    pub fn submit_rsvp(payload: serde_json::Value) -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, ["rsvp"]).with_body(payload)
    }

    pub fn get_registry() -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, ["registry"])
    }

    pub fn admin_login(password: &str) -> RequestDescriptor {
        RequestDescriptor::new(Method::POST, ["admin", "login"])
            .with_body(serde_json::json!({ "password": password }))
    }

    /// `None` or an empty slug sends no `event_slug` parameter.
    pub fn admin_rsvps(event_slug: Option<&str>) -> RequestDescriptor {
        with_event_filter(RequestDescriptor::new(Method::GET, ["admin", "rsvps"]), event_slug)
    }

    pub fn admin_stats() -> RequestDescriptor {
        RequestDescriptor::new(Method::GET, ["admin", "stats"])
    }

    pub fn delete_rsvp(rsvp_id: i64) -> RequestDescriptor {
        let id = rsvp_id.to_string();
        RequestDescriptor::new(Method::DELETE, ["admin", "rsvps", id.as_str()])
    }

    pub fn export_rsvps(event_slug: Option<&str>) -> RequestDescriptor {
        with_event_filter(
            RequestDescriptor::new(Method::GET, ["admin", "rsvps", "export"]),
            event_slug,
        )
    }

    fn with_event_filter(request: RequestDescriptor, event_slug: Option<&str>) -> RequestDescriptor {
        match event_slug.filter(|s| !s.is_empty()) {
            Some(slug) => request.with_query("event_slug", slug),
            None => request,
        }
    }
}

/// FastAPI-style error body: `{"detail": "..."}` or a list of validation errors.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn error_message(status_code: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.is_empty() => format!("HTTP {status_code}"),
        Err(_) => format!("HTTP {status_code}: {body}"),
    }
}

/// Extract `filename` from a `Content-Disposition` header value.
fn parse_content_disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
