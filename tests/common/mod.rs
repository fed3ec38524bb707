#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use polls::config::ServerConfig;
use polls::models::{Choice, NewChoice, NewQuestion, Question};
use polls::poll;
use polls::routes::build_app_router;
use polls::state::AppState;
use polls::store::{MemoryStore, PollStore};

/// Build the full application router over the given store with test defaults.
pub fn build_test_app(store: Arc<dyn PollStore>) -> Router {
    build_test_app_with(store, ServerConfig::default())
}

pub fn build_test_app_with(store: Arc<dyn PollStore>, config: ServerConfig) -> Router {
    build_app_router(AppState::new(store, config)).expect("test config is valid")
}

pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub async fn create_question(
    store: &MemoryStore,
    text: &str,
    pub_date: DateTime<Utc>,
) -> Question {
    poll::create_question(
        store,
        NewQuestion {
            question_text: text.to_string(),
            pub_date,
        },
    )
    .await
    .unwrap()
}

pub async fn create_choice(store: &MemoryStore, question: &Question, text: &str) -> Choice {
    poll::add_choice(
        store,
        question.id,
        NewChoice {
            choice_text: text.to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a form-encoded body, e.g. `"choice=3"` or `""`.
pub async fn post_form(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with no body and no content type.
pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
