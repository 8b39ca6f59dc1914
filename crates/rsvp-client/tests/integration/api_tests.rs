use rsvp_core::error::AppError;
use rsvp_core::models::NewRsvp;
use rsvp_core::session::TOKEN_KEY;
use serde_json::json;

use rsvp_client::ApiClient;
use rsvp_core::config::ClientConfig;
use rsvp_core::traits::{MemoryStorage, Storage};

use crate::integration::common::{ADMIN_PASSWORD, ISSUED_TOKEN, spawn_backend};

#[tokio::test]
async fn list_events_without_token_sends_no_authorization() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let events = client.list_events().await.unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].slug, "engagement");

    let req = backend.last_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/api/events");
    assert!(req.authorization.is_empty());
    assert_eq!(req.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn get_event_by_slug() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let event = client.get_event("wedding").await.unwrap();

    assert_eq!(event.name, "Wedding");
    assert_eq!(backend.last_request().path, "/api/events/wedding");
}

#[tokio::test]
async fn unknown_event_surfaces_backend_detail() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let err = client.get_event("honeymoon").await.unwrap_err();

    match err {
        AppError::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Event not found");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_rsvp_passes_payload_verbatim() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let payload = NewRsvp {
        event_slug: "wedding".into(),
        name: "John Doe".into(),
        email: "john@example.com".into(),
        attending: true,
    };
    let record = client.submit_rsvp(&payload).await.unwrap();

    assert_eq!(record.name, "John Doe");
    assert_eq!(record.event.slug, "wedding");

    let req = backend.last_request();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/api/rsvp");
    assert_eq!(
        req.body,
        json!({
            "event_slug": "wedding",
            "name": "John Doe",
            "email": "john@example.com",
            "attending": true,
        })
    );
}

#[tokio::test]
async fn submit_rsvp_accepts_arbitrary_json() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let payload = json!({
        "event_slug": "engagement",
        "name": "Jane Roe",
        "email": "jane@example.com",
        "attending": false,
        "plus_one": "Sam",
    });
    client.submit_rsvp(&payload).await.unwrap();

    assert_eq!(backend.last_request().body, payload);
}

#[tokio::test]
async fn backend_validation_errors_are_propagated() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let err = client
        .submit_rsvp(&json!({"event_slug": "wedding", "name": "No Email"}))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(422));
    assert!(err.to_string().contains("field required"));
}

#[tokio::test]
async fn get_registry() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let registry = client.get_registry().await.unwrap();

    assert_eq!(registry.registry_url, "https://example.com/registry");
    assert_eq!(backend.last_request().path, "/api/registry");
}

#[tokio::test]
async fn login_then_delete_carries_bearer_token() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();

    let token = client.admin_login(ADMIN_PASSWORD).await.unwrap();
    let login = backend.last_request();
    assert_eq!(login.path, "/api/admin/login");
    assert_eq!(login.body, json!({"password": "secret"}));

    store.set_token(Some(&token.access_token)).unwrap();
    assert!(store.is_authenticated());
    assert_eq!(
        store.storage().get(TOKEN_KEY).unwrap().as_deref(),
        Some(ISSUED_TOKEN)
    );

    client.delete_rsvp(42).await.unwrap();

    let req = backend.last_request();
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, "/api/admin/rsvps/42");
    assert_eq!(req.authorization, vec![format!("Bearer {ISSUED_TOKEN}")]);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();

    let err = client.admin_login("guess").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Incorrect password"));
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn admin_rsvps_filter_controls_query() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    let all = client.get_admin_rsvps(None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(backend.last_request().query, None);

    let filtered = client.get_admin_rsvps(Some("wedding")).await.unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, 42);
    assert_eq!(
        backend.last_request().query.as_deref(),
        Some("event_slug=wedding")
    );

    client.get_admin_rsvps(Some("summer-2024")).await.unwrap();
    assert_eq!(
        backend.last_request().query.as_deref(),
        Some("event_slug=summer-2024")
    );
}

#[tokio::test]
async fn admin_endpoints_go_out_unauthenticated_without_token() {
    let backend = spawn_backend().await;
    let (_store, client) = backend.session();

    let err = client.get_admin_stats().await.unwrap_err();

    assert!(err.is_unauthorized());
    let req = backend.last_request();
    assert_eq!(req.path, "/api/admin/stats");
    assert!(req.authorization.is_empty());
}

#[tokio::test]
async fn logout_stops_sending_token() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    client.get_admin_stats().await.unwrap();
    assert_eq!(backend.last_request().authorization.len(), 1);

    store.logout().unwrap();
    assert!(client.get_admin_stats().await.is_err());
    assert!(backend.last_request().authorization.is_empty());
}

#[tokio::test]
async fn stats_are_decoded() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    let stats = client.get_admin_stats().await.unwrap();

    assert_eq!(stats.len(), 2);
    let wedding = stats.iter().find(|s| s.event_slug == "wedding").unwrap();
    assert_eq!(wedding.attending, 1);
    assert_eq!(wedding.not_attending, 0);
}

#[tokio::test]
async fn export_returns_file_with_server_filename() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    let all = client.export_rsvps(None).await.unwrap();
    assert_eq!(all.filename.as_deref(), Some("rsvps_all.csv"));
    assert_eq!(all.content_type.as_deref(), Some("text/csv"));
    assert!(all.bytes.starts_with(b"Event,Name,Email,Attending,Submitted At"));
    let req = backend.last_request();
    assert_eq!(req.path, "/api/admin/rsvps/export");
    assert_eq!(req.query, None);

    let wedding = client.export_rsvps(Some("wedding")).await.unwrap();
    assert_eq!(wedding.filename.as_deref(), Some("rsvps_wedding.csv"));
    assert_eq!(
        backend.last_request().query.as_deref(),
        Some("event_slug=wedding")
    );
}

#[tokio::test]
async fn delete_missing_rsvp_fails() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    let err = client.delete_rsvp(999).await.unwrap_err();

    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let backend = spawn_backend().await;
    let (store, client) = backend.session();
    store.set_token(Some(ISSUED_TOKEN)).unwrap();

    let (events, stats, missing) = tokio::join!(
        client.list_events(),
        client.get_admin_stats(),
        client.get_event("nope"),
    );

    assert!(events.is_ok());
    assert!(stats.is_ok());
    assert!(missing.is_err());
    assert_eq!(backend.requests().len(), 3);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    // Bind and immediately release a port so nothing is listening on it.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::new(&format!("http://{addr}/api")).unwrap();
    let client = ApiClient::new(&config, std::sync::Arc::new(MemoryStorage::new())).unwrap();

    let err = client.list_events().await.unwrap_err();

    assert!(matches!(err, AppError::NetworkError(_)), "got {err:?}");
}

#[tokio::test]
async fn truncated_error_body_falls_back_to_status() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // Promise 100 bytes, send 4, then hang up.
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\n{\"de")
            .await
            .unwrap();
    });

    let config = ClientConfig::new(&format!("http://{addr}/api")).unwrap();
    let client = ApiClient::new(&config, std::sync::Arc::new(MemoryStorage::new())).unwrap();

    match client.list_events().await.unwrap_err() {
        AppError::ApiError { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "HTTP 500");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}
