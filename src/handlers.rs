// src/handlers.rs
//! HTTP adapters over the poll operations. Each handler reads the clock once
//! and passes `now` down.

use axum::extract::rejection::FormRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{Choice, DbId, Question, Timestamp, VoteForm};
use crate::poll::{self, QuestionDetail, VoteOutcome};
use crate::response::DataResponse;
use crate::routes::results_path;
use crate::state::AppState;

/// Shown on the index page when nothing is published yet.
pub const NO_QUESTIONS_MESSAGE: &str = "No questions.";

/// Question id taken from the `{id}` path segment.
///
/// A segment that is not an integer names no question, so it is a 404 rather
/// than a 400.
#[derive(Debug, Clone, Copy)]
pub struct QuestionId(pub DbId);

impl<S: Send + Sync> FromRequestParts<S> for QuestionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<DbId>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(QuestionId(id)),
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Unparseable question id");
                Err(AppError::NotFound(format!(
                    "No question at {}",
                    parts.uri.path()
                )))
            }
        }
    }
}

/// A question as rendered to clients, with its recency flag evaluated at
/// request time.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: DbId,
    pub question_text: String,
    pub pub_date: Timestamp,
    pub was_published_recently: bool,
}

impl QuestionView {
    fn new(question: Question, now: Timestamp) -> Self {
        let was_published_recently = question.was_published_recently(now);
        Self {
            id: question.id,
            question_text: question.question_text,
            pub_date: question.pub_date,
            was_published_recently,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexPage {
    pub latest_question_list: Vec<QuestionView>,
    pub empty_message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct DetailPage {
    pub question: QuestionView,
    pub choices: Vec<Choice>,
    pub error_message: Option<String>,
}

impl DetailPage {
    fn new(detail: QuestionDetail, error_message: Option<String>, now: Timestamp) -> Self {
        Self {
            question: QuestionView::new(detail.question, now),
            choices: detail.choices,
            error_message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsPage {
    pub question: QuestionView,
    pub choices: Vec<Choice>,
    pub total_votes: i64,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage_healthy: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage_healthy = state.store.health_check().await.is_ok();
    let status = if storage_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        storage_healthy,
    })
}

/// GET /polls
pub async fn list_questions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let questions = poll::list_published_questions(
        state.store.as_ref(),
        now,
        state.config.latest_questions_limit,
    )
    .await?;

    let empty_message = questions.is_empty().then_some(NO_QUESTIONS_MESSAGE);
    let latest_question_list = questions
        .into_iter()
        .map(|q| QuestionView::new(q, now))
        .collect();

    Ok(Json(DataResponse {
        data: IndexPage {
            latest_question_list,
            empty_message,
        },
    }))
}

/// GET /polls/{id}
///
/// 404 for questions that do not exist or are not yet published.
pub async fn question_detail(
    State(state): State<AppState>,
    QuestionId(question_id): QuestionId,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let detail = poll::get_question_detail(state.store.as_ref(), question_id, now).await?;

    Ok(Json(DataResponse {
        data: DetailPage::new(detail, None, now),
    }))
}

/// GET /polls/{id}/results
pub async fn question_results(
    State(state): State<AppState>,
    QuestionId(question_id): QuestionId,
) -> AppResult<impl IntoResponse> {
    let now = Utc::now();
    let results = poll::get_results(
        state.store.as_ref(),
        state.config.visibility,
        question_id,
        now,
    )
    .await?;

    Ok(Json(DataResponse {
        data: ResultsPage {
            question: QuestionView::new(results.question, now),
            choices: results.choices,
            total_votes: results.total_votes,
        },
    }))
}

/// POST /polls/{id}/vote
///
/// Redirects to the results view on success. A missing or unknown `choice`
/// re-presents the detail payload with an error message. A body that is not
/// a urlencoded form counts as no choice, so the question lookup still decides
/// between 404 and the re-render.
pub async fn vote(
    State(state): State<AppState>,
    QuestionId(question_id): QuestionId,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> AppResult<Response> {
    let now = Utc::now();
    let form = match form {
        Ok(Form(pairs)) => VoteForm::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(question_id, error = %rejection, "Vote body is not a form");
            VoteForm::default()
        }
    };
    let outcome = poll::cast_vote(
        state.store.as_ref(),
        state.config.visibility,
        question_id,
        form.choice_id(),
        now,
    )
    .await?;

    let response = match outcome {
        VoteOutcome::Counted { .. } => Redirect::to(&results_path(question_id)).into_response(),
        VoteOutcome::Rejected { detail, error } => Json(DataResponse {
            data: DetailPage::new(detail, Some(error.to_string()), now),
        })
        .into_response(),
    };

    Ok(response)
}
