#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use vows_api::auth::jwt::{generate_access_token, JwtConfig};
use vows_api::config::{ServerConfig, WebhookConfig};
use vows_api::routes;
use vows_api::state::AppState;
use vows_core::guest::{GuestUnitRecord, IdentityRecord};
use vows_core::status::GuestSide;
use vows_core::webhook::{compute_signature, SIGNATURE_HEADER};
use vows_db::memory::MemoryStore;
use vows_engine::stores::EngineStores;
use vows_engine::Engine;
use vows_provider::RecordingProvider;

pub const WEBHOOK_SECRET: &str = "api-test-app-secret";
pub const VERIFY_TOKEN: &str = "api-test-verify-token";
pub const WEDDING_ID: &str = "w1";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        dispatch_concurrency: 1,
        rsvp_session_ttl_hours: 72,
        jwt: JwtConfig {
            secret: "api-test-jwt-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        webhook: WebhookConfig {
            app_secret: WEBHOOK_SECRET.to_string(),
            verify_token: VERIFY_TOKEN.to_string(),
        },
    }
}

/// The router plus handles on its in-memory backends.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<RecordingProvider>,
}

impl TestApp {
    /// A fresh clone of the router for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers over an
/// in-memory store and a recording provider.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(provider: RecordingProvider) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(provider);

    let engine = Engine::new(
        EngineStores::from_shared(store.clone()),
        provider.clone(),
        config.engine_config(),
    );

    let state = AppState {
        engine: Arc::new(engine),
        config: Arc::new(config),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .merge(routes::health::router())
        .merge(routes::webhooks::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state);

    TestApp {
        router,
        store,
        provider,
    }
}

/// Access token for `user_id` with `role`, scoped to `wedding_id`.
pub fn token_for(user_id: &str, wedding_id: &str, role: &str) -> String {
    generate_access_token(user_id, wedding_id, role, &test_config().jwt).unwrap()
}

/// A guest unit for wedding seeding with its own delivery phone.
pub fn unit(id: &str, side: GuestSide, phone: &str) -> GuestUnitRecord {
    GuestUnitRecord {
        id: id.to_string(),
        display_name: format!("Unit {id}"),
        side,
        is_active: true,
        is_inviteable: true,
        delivery_identity: Some(IdentityRecord {
            phone_e164: phone.to_string(),
            is_active: true,
            is_inviteable: true,
        }),
        tag_ids: Vec::new(),
        members: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a raw webhook body, signed with `secret` when given.
pub async fn post_webhook(app: Router, body: &[u8], secret: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/webhooks/whatsapp")
        .header(CONTENT_TYPE, "application/json");
    if let Some(secret) = secret {
        builder = builder.header(SIGNATURE_HEADER, compute_signature(secret, body));
    }
    let request = builder.body(Body::from(body.to_vec())).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Webhook payloads
// ---------------------------------------------------------------------------

fn envelope(value: serde_json::Value) -> Vec<u8> {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{ "changes": [{ "value": value }] }],
    })
    .to_string()
    .into_bytes()
}

pub fn status_payload(id: &str, status: &str, timestamp: i64) -> Vec<u8> {
    envelope(serde_json::json!({
        "statuses": [{ "id": id, "status": status, "timestamp": timestamp.to_string() }],
    }))
}

pub fn text_payload(from: &str, id: &str, context_id: &str, text: &str) -> Vec<u8> {
    envelope(serde_json::json!({
        "messages": [{
            "from": from,
            "id": id,
            "type": "text",
            "text": { "body": text },
            "context": { "id": context_id },
        }],
    }))
}
