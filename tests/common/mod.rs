use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use fcp_ledger::{
    config::AppConfig,
    db::{self, DbConfig},
    repositories::{WorkEntryRepository, WorkEntryStore},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up the application backed by an in-memory
/// SQLite database. The business calendar runs on UTC so dates in tests
/// read literally.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.utc_offset_minutes = 0;
        cfg.cors_allow_any_origin = true;

        let pool = db::establish_connection_with_config(&DbConfig::single_connection(
            cfg.database_url.clone(),
        ))
        .await
        .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let store: Arc<dyn WorkEntryStore> = Arc::new(WorkEntryRepository::new(Arc::new(pool)));
        let state = AppState::new(cfg, store).expect("valid test config");
        let access_log = slog::Logger::root(slog::Discard, slog::o!());
        let router = fcp_ledger::app_router(state.clone(), access_log);

        Self { router, state }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Creates an entry for a possibly new customer and returns the stored
    /// record.
    #[allow(dead_code)]
    pub async fn add_entry(&self, mut body: Value) -> Value {
        body["addUser"] = Value::Bool(true);
        let (status, json) = self.post("/api/v1/work-entries", body).await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {json}");
        json["work"].clone()
    }
}
