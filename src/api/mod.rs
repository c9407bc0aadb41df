//! REST API server for meetnotes.
//!
//! Provides HTTP endpoints for:
//! - Payment webhooks and checkout
//! - Entitlement checks
//! - Audio uploads and their processing state
//! - Preferences and summaries (proxied to the backend)

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::{extract::DefaultBodyLimit, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;

use crate::backend::BackendApi;
use crate::billing::{CheckoutClient, WebhookHandler};
use crate::db::Database;
use crate::entitlement::EntitlementGate;
use crate::subscription::SubscriptionQuery;
use crate::upload::UploadFlow;

/// Everything the handlers reach for. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub webhooks: WebhookHandler,
    pub checkout: Arc<CheckoutClient>,
    pub query: SubscriptionQuery,
    pub gate: EntitlementGate,
    pub uploads: UploadFlow,
    pub backend: Arc<dyn BackendApi>,
    pub db: Database,
}

/// Build the full router. `max_upload_bytes` caps request bodies.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let api = Router::new()
        .merge(routes::webhooks::router())
        .merge(routes::checkout::router())
        .merge(routes::entitlement::router())
        .merge(routes::uploads::router())
        .merge(routes::proxy::router());

    Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .nest("/api", api)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(max_upload_bytes)))
}

pub struct ApiServer {
    bind: String,
    max_upload_bytes: usize,
    state: AppState,
}

impl ApiServer {
    pub fn new(bind: &str, max_upload_mb: usize, state: AppState) -> Self {
        Self {
            bind: bind.to_string(),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = router(self.state, self.max_upload_bytes);

        let listener = tokio::net::TcpListener::bind(&self.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind))?;

        info!("API server listening on http://{}", self.bind);
        info!("Endpoints:");
        info!("  GET  /                            - Service info");
        info!("  GET  /version                     - Get version info");
        info!("  POST /api/webhooks/stripe         - Payment provider events");
        info!("  POST /api/create-checkout-session - Start a subscription checkout");
        info!("  GET  /api/entitlement             - Can the caller summarize?");
        info!("  POST /api/uploads                 - Upload audio for processing");
        info!("  GET  /api/uploads                 - List uploads");
        info!("  GET  /api/uploads/:id             - Get one upload");
        info!("  GET  /api/preferences             - Get summary preferences");
        info!("  POST /api/preferences             - Save summary preferences");
        info!("  GET  /api/summaries               - List summaries");
        info!("  DELETE /api/summaries/:id         - Delete a summary");
        info!("  POST /api/refine-summary          - Refine a summary by chat");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "meetnotes",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "meetnotes"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::FakeBackend;
    use crate::billing::signature_header;
    use crate::entitlement::LookupFailurePolicy;
    use crate::subscription::testing::StaticIdentity;
    use crate::subscription::{SqliteSubscriptionStore, SubscriptionStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    const SECRET: &str = "whsec_router";

    struct Harness {
        app: Router,
        store: SqliteSubscriptionStore,
        backend: Arc<FakeBackend>,
    }

    fn harness() -> Harness {
        let db = Database::in_memory().unwrap();
        let store = SqliteSubscriptionStore::new(db.clone());
        let backend = Arc::new(FakeBackend::default());
        let query = SubscriptionQuery::new(
            Arc::new(StaticIdentity::with("tok", "u1")),
            Arc::new(store.clone()),
        );
        let gate = EntitlementGate::new(
            query.clone(),
            backend.clone(),
            1,
            LookupFailurePolicy::Degrade,
        );
        let state = AppState {
            webhooks: WebhookHandler::new(Arc::new(store.clone()), SECRET, 300, 30),
            checkout: Arc::new(CheckoutClient::new(
                reqwest::Client::new(),
                "http://127.0.0.1:9",
                "sk_test",
                None,
                "http://localhost:3000",
            )),
            query,
            gate: gate.clone(),
            uploads: UploadFlow::new(backend.clone(), gate, db.clone()),
            backend: backend.clone(),
            db,
        };
        Harness {
            app: router(state, 1024 * 1024),
            store,
            backend,
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn checkout_event(user_id: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "created": chrono::Utc::now().timestamp(),
            "data": {"object": {
                "id": "cs_1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": {"user_id": user_id}
            }}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_root_status() {
        let h = harness();
        let response = h
            .app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "meetnotes");
    }

    #[tokio::test]
    async fn test_webhook_accepts_signed_event() {
        let h = harness();
        let payload = checkout_event("u1");
        let header = signature_header(&payload, SECRET, chrono::Utc::now().timestamp());

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhooks/stripe")
                    .header("stripe-signature", header)
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"received": true}));
        assert!(h.store.get_by_user("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let h = harness();
        let payload = checkout_event("u1");

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/webhooks/stripe")
                    .header("stripe-signature", "t=1,v1=00")
                    .body(Body::from(payload))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({"error": "Invalid signature"}));
        assert!(h.store.get_by_user("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entitlement_requires_bearer() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/entitlement")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"], "Missing Bearer token");
    }

    #[tokio::test]
    async fn test_entitlement_for_free_user() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/entitlement")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"canGenerate": true, "summariesCount": 0, "isSubscribed": false})
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_non_audio() {
        let h = harness();
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\nhello\r\n--{b}--\r\n",
            b = boundary
        );

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads")
                    .header("authorization", "Bearer tok")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Please upload an audio file");
    }

    #[tokio::test]
    async fn test_upload_audio_then_list() {
        let h = harness();
        let boundary = "XBOUNDARYX";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"standup.mp3\"\r\n\
             Content-Type: audio/mpeg\r\n\r\nID3fakeaudio\r\n--{b}--\r\n",
            b = boundary
        );

        let response = h
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads")
                    .header("authorization", "Bearer tok")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={}", boundary),
                    )
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let outcome = body_json(response).await;
        assert_eq!(outcome["phase"], "done");
        assert!(outcome["summary"]["summary_id"].is_string());

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/uploads")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let uploads = body_json(response).await;
        assert_eq!(uploads[0]["file_name"], "standup.mp3");
        assert_eq!(uploads[0]["progress"], 100);
    }

    #[tokio::test]
    async fn test_delete_missing_summary_is_not_found() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/summaries/nope")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(h.backend.summaries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_without_price_configured() {
        let h = harness();
        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/create-checkout-session")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "No subscription price configured"
        );
    }
}
