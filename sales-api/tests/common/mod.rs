#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sales_api::config::Config;
use sales_api::domain::services::auth_service::Authenticator;
use sales_api::infrastructure::database::{memory::MemoryStore, schema, Store};
use sales_api::server::{self, AppState};
use sales_api::shutdown::Shutdown;

pub use sales_api::infrastructure::database::schema::{
    SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD, SEED_USER_EMAIL, SEED_USER_PASSWORD,
};

const PRIVATE_PEM: &[u8] = include_bytes!("../fixtures/private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("../fixtures/public.pem");

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
}

/// State over a seeded in-memory store and the fixture key pair.
pub async fn test_state(config: Config) -> Arc<AppState> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    schema::seed(store.clone(), Utc::now()).await.unwrap();

    state_with_store(config, store)
}

/// State over any store, unseeded.
pub fn state_with_store(config: Config, store: Arc<dyn Store>) -> Arc<AppState> {
    let authenticator = Authenticator::from_pem(PRIVATE_PEM, PUBLIC_PEM, "1", "RS256").unwrap();

    Arc::new(AppState::new(config, store, authenticator, Shutdown::new()).unwrap())
}

pub async fn spawn_app() -> TestApp {
    let state = test_state(Config::defaults().unwrap()).await;
    TestApp {
        app: server::create_app(state.clone()),
        state,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        send(&self.app, request).await
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
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

        self.send(request).await
    }

    /// Fetches a token through the Basic-auth endpoint.
    pub async fn token(&self, email: &str, password: &str) -> String {
        let response = self.send(basic_token_request(email, password)).await;
        assert_eq!(response.status, StatusCode::OK, "token request failed: {}", response.body);

        response.body["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token(SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD).await
    }

    pub async fn user_token(&self) -> String {
        self.token(SEED_USER_EMAIL, SEED_USER_PASSWORD).await
    }
}

pub fn basic_token_request(email: &str, password: &str) -> Request<Body> {
    let mut request = Request::get("/v1/users/token").body(Body::empty()).unwrap();
    request
        .headers_mut()
        .typed_insert(Authorization::basic(email, password));
    request
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };

    TestResponse { status, headers, body }
}
