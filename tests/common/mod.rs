use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::MockServer;

use farmsense_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::user,
    notifications::{Notifier, RecordingNotifier},
    AppState,
};

pub const TEST_SECRET: &str = "farmsense_integration_signing_secret_7c1e9a";

/// Status and decoded JSON body of a routed request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Application backed by a throwaway SQLite file, a recording notifier and a
/// mock generative-language server.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub notifier: RecordingNotifier,
    pub ai: MockServer,
    auth: AuthService,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let notifier = RecordingNotifier::new();
        Self::with_notifier(notifier.clone(), Arc::new(notifier)).await
    }

    /// Same as [`TestApp::new`] but delivering through `delivery`; `recorder`
    /// is still exposed for assertions.
    pub async fn with_notifier(recorder: RecordingNotifier, delivery: Arc<dyn Notifier>) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("farmsense_test.db");
        let ai = MockServer::start().await;

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_000,
            "test".to_string(),
        );
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.ai_base_url = ai.uri();
        cfg.ai_api_key = Some("test-key".to_string());
        cfg.ai_retry_backoff_ms = 0;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let auth = AuthService::new(AuthConfig::from(&cfg));
        let state = AppState::new(Arc::new(pool), cfg, delivery).expect("build app state");
        let router = farmsense_api::build_router(state.clone()).expect("build router");

        Self {
            router,
            state,
            notifier: recorder,
            ai,
            auth,
            _dir: dir,
        }
    }

    /// Inserts a user and returns a bearer token for it.
    pub async fn user(&self, username: &str) -> String {
        let created = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@farm.test")),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("insert user");
        self.auth
            .issue_token(created.id, &created.username)
            .expect("issue token")
    }

    /// A user owning a fresh farm; returns the token and farm id.
    pub async fn owner(&self, username: &str, farm_name: &str) -> (String, i64) {
        let token = self.user(username).await;
        let res = self
            .post(
                "/api/farms",
                json!({ "name": farm_name, "location": "Nakuru, Kenya" }),
                &token,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create farm: {}", res.body);
        let farm_id = res.body["id"].as_i64().expect("farm id");
        (token, farm_id)
    }

    /// A labourer whose join request for `farm_id` is pending.
    pub async fn pending_labourer(&self, username: &str, farm_id: i64) -> (String, i64) {
        let token = self.user(username).await;
        let res = self.request(Method::POST, "/api/labourers", None, Some(&token)).await;
        assert_eq!(res.status, StatusCode::CREATED, "create labourer: {}", res.body);
        let labourer_id = res.body["id"].as_i64().expect("labourer id");

        let res = self
            .request(
                Method::POST,
                &format!("/api/labourers/{farm_id}/join-farm"),
                None,
                Some(&token),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "join farm: {}", res.body);
        (token, labourer_id)
    }

    /// A labourer approved by the owner holding `owner_token`.
    pub async fn approved_labourer(&self, username: &str, farm_id: i64, owner_token: &str) -> String {
        let (token, labourer_id) = self.pending_labourer(username, farm_id).await;
        let res = self
            .request(
                Method::POST,
                &format!("/api/labourers/{labourer_id}/approve"),
                None,
                Some(owner_token),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "approve labourer: {}", res.body);
        token
    }

    /// Registers a cow on the owner's farm and returns its id.
    pub async fn livestock(&self, owner_token: &str, tag_id: &str) -> i64 {
        let res = self
            .post(
                "/api/livestock",
                json!({
                    "tag_id": tag_id,
                    "species": "Cattle",
                    "breed": "Holstein Friesian",
                    "date_of_birth": "2021-03-15",
                    "gender": "F",
                    "health_status": "healthy",
                    "current_weight_kg": 450
                }),
                owner_token,
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create livestock: {}", res.body);
        res.body["id"].as_i64().expect("livestock id")
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, None, Some(token)).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: &str) -> TestResponse {
        self.request(Method::POST, uri, Some(body), Some(token)).await
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body bytes");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }
}

/// Wire shape of a successful `generateContent` answer.
#[allow(dead_code)]
pub fn candidate(text: &str) -> Value {
    json!({
        "candidates": [
            { "content": { "parts": [ { "text": text } ] } }
        ]
    })
}
