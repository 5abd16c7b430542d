//! Common test utilities for API tests
//!
//! Builds the real router over an in-memory store with three seeded users
//! (Alice the Manager, Tess the TeamLeader, Bob the Contributor), each with
//! a live session token.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use taskdesk_api::app::{build_router, AppState};
use taskdesk_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskdesk_shared::auth::jwt::{create_token, Claims};
use taskdesk_shared::auth::password::hash_password;
use taskdesk_shared::models::user::{NewUser, Role};
use taskdesk_shared::store::{MemoryStore, Store};
use tower::Service;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "Launch#2025";

/// A seeded account and its bearer token
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub token: String,
}

pub struct TestContext {
    pub app: Router,
    pub store: Arc<dyn Store>,
    pub alice: TestUser,
    pub tess: TestUser,
    pub bob: TestUser,
}

/// Argon2 is slow in debug builds; hash the shared password once
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).expect("hash test password"))
        .clone()
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            session_ttl_hours: 12,
        },
        bootstrap: None,
    }
}

impl TestContext {
    pub async fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        let alice = seed_user(&store, "Alice", "alice@example.com", Role::Manager).await;
        let tess = seed_user(&store, "Tess", "tess@example.com", Role::TeamLeader).await;
        let bob = seed_user(&store, "Bob", "bob@example.com", Role::Contributor).await;

        let state = AppState::new(store.clone(), test_config());

        Self {
            app: build_router(state),
            store,
            alice,
            tess,
            bob,
        }
    }

    /// Sends a request through the router and decodes the JSON body
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(&user.token), None).await
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(&user.token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(&user.token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(&user.token), None).await
    }

    /// Creates a project as `owner` and returns its ID
    pub async fn create_project(&self, owner: &TestUser, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/v1/projects",
                owner,
                serde_json::json!({ "name": name, "description": format!("{} description", name) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    /// Creates a task as `creator` and returns its ID
    pub async fn create_task(
        &self,
        creator: &TestUser,
        project_id: i64,
        assignee: &TestUser,
        title: &str,
        priority: &str,
    ) -> i64 {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/tasks", project_id),
                creator,
                serde_json::json!({
                    "assigned_to_id": assignee.id,
                    "title": title,
                    "description": format!("{} details", title),
                    "due_date": "2030-01-15T09:00:00Z",
                    "priority": priority,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}

async fn seed_user(store: &Arc<dyn Store>, first: &str, email: &str, role: Role) -> TestUser {
    let user = store
        .create_user(NewUser {
            first_name: first.to_string(),
            last_name: "Example".to_string(),
            email: email.to_string(),
            password_hash: password_hash(),
            role,
        })
        .await
        .unwrap();

    let expires_at = Utc::now() + chrono::Duration::hours(1);
    let session = store.create_session(user.id, expires_at).await.unwrap();
    let token = create_token(&Claims::new(user.id, session.id, expires_at), JWT_SECRET).unwrap();

    TestUser {
        id: user.id,
        email: user.email,
        token,
    }
}
