//! Test utilities and fixtures for Prepress integration tests

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use axum::routing::{get, post};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// Re-export the main library crate
pub use prepress::config::RateLimitConfig;
pub use prepress::db::{AppState, init_db, queries};
pub use prepress::error::msg;
pub use prepress::handlers::{
    choose_customer_type, pay_later, pay_now, show_confirmation, show_payment, show_select_type,
    show_upload, submit_upload,
};
pub use prepress::hooks::{HookClient, HookEndpoints};
pub use prepress::models::*;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a session that has already chosen a customer type
pub fn create_typed_session(
    conn: &Connection,
    id: &str,
    customer_type: CustomerType,
    design_attached: bool,
) -> CheckoutSession {
    queries::ensure_session(conn, id, design_attached).expect("Failed to create test session");
    queries::set_customer_type(conn, id, customer_type).expect("Failed to set customer type");
    queries::get_session(conn, id)
        .expect("Failed to re-read test session")
        .expect("Test session missing after creation")
}

/// Build the three hook endpoints off a common base URL, mirroring how
/// the config layer derives them.
pub fn hooks_at(base: &str) -> HookEndpoints {
    HookEndpoints {
        file_upload_url: format!("{}/webhook/file-upload", base),
        payment_link_url: format!("{}/webhook/get-stripe-url", base),
        pay_later_url: format!("{}/webhook/pay-later", base),
    }
}

/// Hook endpoints that refuse every connection immediately (port 9 is
/// unassigned on loopback), for exercising degraded paths.
pub fn unroutable_hooks() -> HookEndpoints {
    hooks_at("http://127.0.0.1:9")
}

/// Create an AppState for testing with an in-memory database.
///
/// The database uses a uniquely named shared-cache URI so every pooled
/// connection sees the same data; the pool holds the memory alive for
/// the duration of the test.
pub fn create_test_app_state_with_hooks(endpoints: HookEndpoints) -> AppState {
    let db_uri = format!(
        "file:prepress_test_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().as_simple()
    );
    let manager = SqliteConnectionManager::file(db_uri);
    let pool = Pool::builder().max_size(4).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        hooks: Arc::new(HookClient::new(endpoints)),
        base_url: "http://localhost:3000".to_string(),
        processor_base_url: "https://pay.test".to_string(),
        max_file_bytes: 50 * 1024 * 1024,
        session_ttl_secs: 24 * 60 * 60,
    }
}

/// Test state wired to hooks that are never reachable. Fine for every
/// flow that does not leave the funnel.
pub fn create_test_app_state() -> AppState {
    create_test_app_state_with_hooks(unroutable_hooks())
}

/// Create a Router with the whole funnel (without rate limiting for tests)
pub fn funnel_app(state: AppState) -> Router {
    Router::new()
        .route("/{session_id}", get(show_select_type))
        .route("/{session_id}/customer-type", post(choose_customer_type))
        .route("/{session_id}/upload", get(show_upload).post(submit_upload))
        .route("/{session_id}/payment", get(show_payment))
        .route("/{session_id}/payment/pay-now", post(pay_now))
        .route("/{session_id}/payment/pay-later", post(pay_later))
        .route("/{session_id}/confirmation", get(show_confirmation))
        .with_state(state)
}

/// Serve the real funnel router, rate limiting included, on an ephemeral
/// loopback port and return its base URL.
///
/// The limiter tiers key on the peer IP, which only exists on a real
/// connection, so this cannot go through `oneshot`.
pub async fn spawn_rate_limited_app(state: AppState) -> String {
    let app = prepress::handlers::router(RateLimitConfig {
        strict_rpm: 10,
        standard_rpm: 30,
        relaxed_rpm: 60,
    })
    .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind app server");
    let addr = listener.local_addr().expect("Failed to read app server address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .await
        .expect("App server failed");
    });
    format!("http://{}", addr)
}

/// Serve a fake hook backend on an ephemeral loopback port and return
/// its base URL.
pub async fn spawn_hook_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind hook server");
    let addr = listener.local_addr().expect("Failed to read hook server address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Hook server failed");
    });
    format!("http://{}", addr)
}

/// Fake hook backend where every webhook succeeds: uploads and payment
/// link requests yield `payment_url`, pay-later yields `order_id`.
///
/// The payment link route answers with the `stripe_url` spelling to
/// cover the alternate field name.
pub fn happy_hooks(payment_url: &str, order_id: &str) -> Router {
    let upload_url = payment_url.to_string();
    let link_url = payment_url.to_string();
    let order = order_id.to_string();

    Router::new()
        .route(
            "/webhook/file-upload",
            post(move || {
                let url = upload_url.clone();
                async move { axum::Json(json!({"success": true, "payment_url": url})) }
            }),
        )
        .route(
            "/webhook/get-stripe-url",
            post(move || {
                let url = link_url.clone();
                async move { axum::Json(json!({"success": true, "stripe_url": url})) }
            }),
        )
        .route(
            "/webhook/pay-later",
            post(move || {
                let id = order.clone();
                async move { axum::Json(json!({"success": true, "order_id": id})) }
            }),
        )
}

/// Like [`happy_hooks`], but the upload webhook also records each
/// request body it receives into `store`.
pub fn recording_hooks(payment_url: &str, store: Arc<Mutex<Vec<Value>>>) -> Router {
    let upload_url = payment_url.to_string();
    let link_url = payment_url.to_string();

    Router::new()
        .route(
            "/webhook/file-upload",
            post(move |axum::Json(body): axum::Json<Value>| {
                let url = upload_url.clone();
                let store = store.clone();
                async move {
                    store.lock().unwrap().push(body);
                    axum::Json(json!({"success": true, "payment_url": url}))
                }
            }),
        )
        .route(
            "/webhook/get-stripe-url",
            post(move || {
                let url = link_url.clone();
                async move { axum::Json(json!({"success": true, "stripe_url": url})) }
            }),
        )
        .route(
            "/webhook/pay-later",
            post(|| async { axum::Json(json!({"success": true, "order_id": "ORD-REC"})) }),
        )
}

/// Fake hook backend where every webhook reports failure with the given
/// reason, in each hook's own error field.
pub fn refusing_hooks(reason: &str) -> Router {
    let upload_reason = reason.to_string();
    let link_reason = reason.to_string();
    let later_reason = reason.to_string();

    Router::new()
        .route(
            "/webhook/file-upload",
            post(move || {
                let message = upload_reason.clone();
                async move { axum::Json(json!({"success": false, "message": message})) }
            }),
        )
        .route(
            "/webhook/get-stripe-url",
            post(move || {
                let error = link_reason.clone();
                async move { axum::Json(json!({"success": false, "error": error})) }
            }),
        )
        .route(
            "/webhook/pay-later",
            post(move || {
                let error = later_reason.clone();
                async move { axum::Json(json!({"success": false, "error": error})) }
            }),
        )
}

/// Fake hook backend whose pay-later webhook rejects the customer's
/// email; the other hooks succeed.
pub fn email_not_found_hooks() -> Router {
    Router::new()
        .route(
            "/webhook/file-upload",
            post(|| async { axum::Json(json!({"success": true, "payment_url": "https://pay.test/x"})) }),
        )
        .route(
            "/webhook/get-stripe-url",
            post(|| async { axum::Json(json!({"success": true, "url": "https://pay.test/x"})) }),
        )
        .route(
            "/webhook/pay-later",
            post(|| async { axum::Json(json!({"success": false, "error": "Email not found"})) }),
        )
}

pub const MULTIPART_BOUNDARY: &str = "prepress-test-boundary";

/// Build a multipart/form-data body carrying the given files under the
/// `files` field. Returns the content-type header value and the body.
pub fn multipart_body(files: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                name
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    let header = format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY);
    (header, body)
}

pub async fn send_get(app: &Router, path: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(app: &Router, path: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_empty_post(app: &Router, path: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn send_multipart(app: &Router, path: &str, files: &[(&str, &str, &[u8])]) -> Response {
    let (content_type, body) = multipart_body(files);
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// POST a multipart form that carries a plain text field but no files,
/// the shape a submit without any picked files produces.
pub async fn send_multipart_without_files(app: &Router, path: &str) -> Response {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nno attachments\r\n--{b}--\r\n",
        b = MULTIPART_BOUNDARY
    );
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(path)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// Read the response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body was not valid JSON")
}

/// The Location header of a redirect response.
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .expect("Location header was not valid UTF-8")
}
