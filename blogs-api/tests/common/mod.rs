#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use blogs_api::config::AppConfig;
use blogs_api::storage::MemoryStorage;
use blogs_api::{build_router, AppState};

pub const SECRET: &str = "integration-secret";

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
}

pub struct TestUser {
    pub id: Uuid,
    pub access_token: String,
    pub refresh_token: String,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        port: 0,
        database_url: "memory:".into(),
        jwt_secret: SECRET.into(),
        access_token_ttl_secs: 3600,
        refresh_token_ttl_secs: 60 * 24 * 3600,
        storage_timeout_ms: 5000,
        db_pool_size: 1,
    }
}

pub fn app() -> TestApp {
    let storage = Arc::new(MemoryStorage::new());
    let state = Arc::new(AppState {
        storage: storage.clone(),
        config: test_config(),
        metrics: None,
    });
    TestApp {
        router: build_router(state),
        storage,
    }
}

impl TestApp {
    pub async fn send(
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
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn register(&self, username: &str) -> Uuid {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "hunter22",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn login(&self, username: &str) -> TestUser {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({
                    "email": format!("{username}@example.com"),
                    "password": "hunter22",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        TestUser {
            id: body["data"]["user"]["id"].as_str().unwrap().parse().unwrap(),
            access_token: body["data"]["tokens"]["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["data"]["tokens"]["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn signed_up(&self, username: &str) -> TestUser {
        self.register(username).await;
        self.login(username).await
    }
}
