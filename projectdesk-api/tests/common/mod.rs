/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (skipped when `DATABASE_URL` is unset)
/// - Test users with a role, logged in through `/login`
/// - Request helpers driving the router in process

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use projectdesk_api::app::{build_router, AppState};
use projectdesk_api::config::Config;
use projectdesk_shared::auth::authorization::PermissionCache;
use projectdesk_shared::auth::password::hash_password;
use projectdesk_shared::db::migrations::run_migrations;
use projectdesk_shared::db::pool::connect;
use projectdesk_shared::models::role::{Role, API_GUARD};
use projectdesk_shared::models::user::{CreateUser, User};
use rand::Rng;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
}

/// A user created for a test, with a token from `/login`
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Connects, migrates and builds the app
    ///
    /// Returns None when `DATABASE_URL` is not set.
    pub async fn new() -> Option<Self> {
        let config = Config::from_lookup(|key| std::env::var(key).ok()).ok()?;

        let db = connect(&config.database.url, 5)
            .await
            .expect("Failed to create pool");
        run_migrations(&db).await.expect("Migrations failed");

        let permissions = PermissionCache::load(&db).await.expect("Failed to load permissions");
        let app = build_router(AppState::new(db.clone(), config, permissions));

        Some(TestContext { db, app })
    }

    /// Creates a user holding `role` and logs them in
    pub async fn user_with_role(&self, role: &str) -> TestUser {
        let user = User::create(
            &self.db,
            CreateUser {
                name: "Test User".to_string(),
                email: format!("{}@example.com", unique(role)),
                password_hash: hash_password(TEST_PASSWORD).unwrap(),
                country: None,
                age: None,
            },
        )
        .await
        .unwrap();

        assert!(Role::assign_to_user(&self.db, user.id, role, API_GUARD).await.unwrap());

        let token = self.login(&user.email).await;
        TestUser { user, token }
    }

    /// Logs in with the test password and returns the token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string());
        self.request_raw(method, uri, token, body).await
    }

    /// Sends a request with a raw body, sent as `application/json`
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Creates a project through the API and returns its id
    pub async fn create_project(&self, status: &str) -> i64 {
        let (code, body) = self
            .post(
                "/project",
                None,
                serde_json::json!({ "name": unique("project"), "status": status }),
            )
            .await;
        assert_eq!(code, StatusCode::CREATED, "{}", body);

        body["data"]["id"].as_i64().unwrap()
    }
}

/// Value with a random suffix so tests can share one database
pub fn unique(prefix: &str) -> String {
    let n: u32 = rand::thread_rng().gen();
    format!("{prefix}-{n:08x}")
}
