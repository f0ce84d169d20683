use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration as ChronoDuration;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use bazaar_api::{
    app_router,
    auth::{create_token, UserRole},
    config::AppConfig,
    db,
    events::{process_events, EventSender, LogNotifier},
    handlers::AppServices,
    services::PriceFeed,
    AppState,
};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Harness spinning up the full application state over a throwaway SQLite
/// database, one file per test.
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    db_path: PathBuf,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_path = std::env::temp_dir().join(format!("bazaar_test_{}.db", Uuid::new_v4()));
        let cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
        );

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(process_events(event_rx, Arc::new(LogNotifier)));

        let services = AppServices::new(
            db.clone(),
            Arc::new(event_sender.clone()),
            Duration::from_secs(5),
        )
        .expect("failed to build services");

        let state = Arc::new(AppState {
            db,
            config: cfg,
            event_sender,
            services,
        });

        Self {
            router: app_router(state.clone()),
            state,
            db_path,
            _event_task: event_task,
        }
    }

    pub fn token_for(&self, user_id: Uuid, role: UserRole) -> String {
        create_token(TEST_SECRET, user_id, role, ChronoDuration::hours(1))
            .expect("token should encode")
    }

    /// Drive the router with a JSON request; returns status and parsed body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .expect("request should build"),
            None => builder.body(Body::empty()).expect("request should build"),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };

        (status, value)
    }

    /// Parses and applies a YAML feed through the import service.
    pub async fn import_feed(&self, yaml: &str, vendor: Option<Uuid>) -> Uuid {
        let feed: PriceFeed = bazaar_api::services::import::parse_feed(yaml)
            .expect("test feed should parse");
        self.state
            .services
            .importer
            .import(feed, vendor)
            .await
            .expect("test feed should import")
            .shop_id
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

/// Two-good feed for the canonical test shop.
pub const SHOP1_FEED: &str = r#"
shop: Shop1
categories:
  - id: 1
    name: Phones
  - id: 2
    name: Accessories
goods:
  - id: 100
    category: 1
    name: Phone A
    model: a/64gb
    quantity: 10
    price: 500
    price_rrc: 550
    parameters:
      "Color": "black"
      "Memory (GB)": 64
  - id: 200
    category: 2
    name: Case B
    model: b
    quantity: 25
    price: 20
    price_rrc: 25
    parameters:
      "Color": "red"
"#;
