// src/routes.rs
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::error::ConfigError;
use crate::handlers;
use crate::models::DbId;
use crate::state::AppState;

/// Location of the results view for a question; the vote endpoint redirects here.
pub fn results_path(question_id: DbId) -> String {
    format!("/polls/{question_id}/results")
}

/// Poll routes mounted at `/polls`.
///
/// ```text
/// GET  /                 -> list_questions
/// GET  /{id}             -> question_detail
/// GET  /{id}/results     -> question_results
/// POST /{id}/vote        -> vote
/// ```
pub fn polls_router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_questions))
        .route("/{id}", get(handlers::question_detail))
        .route("/{id}/results", get(handlers::question_results))
        .route("/{id}/vote", post(handlers::vote))
}

/// Build the full application router with its middleware stack. Shared by the
/// binary and the integration tests.
pub fn build_app_router(state: AppState) -> Result<Router, ConfigError> {
    let cors = build_cors_layer(&state.config)?;
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let request_id_header = HeaderName::from_static("x-request-id");

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/polls", polls_router())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
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

    Ok(router)
}

fn build_cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| ConfigError::Invalid {
                    key: "CORS_ORIGINS",
                    value: origin.clone(),
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600)))
}
