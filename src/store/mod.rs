// src/store/mod.rs
//! Storage boundary for questions and choices.
//!
//! The domain layer in [`crate::poll`] only talks to [`PollStore`]; the
//! binary picks [`PgStore`] when a database is configured and falls back to
//! [`MemoryStore`] otherwise.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::models::{Choice, DbId, NewChoice, NewQuestion, Question, Timestamp};

#[async_trait]
pub trait PollStore: Send + Sync {
    /// Questions with `pub_date <= now`, newest first, at most `limit` rows.
    /// Equal `pub_date`s are ordered by descending id.
    async fn list_published(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Question>, sqlx::Error>;

    /// Unguarded lookup by id; ignores `pub_date`.
    async fn find_question(&self, id: DbId) -> Result<Option<Question>, sqlx::Error>;

    /// All choices owned by a question, in creation order.
    async fn choices_for(&self, question_id: DbId) -> Result<Vec<Choice>, sqlx::Error>;

    /// Atomically add one vote to `choice_id` if it belongs to `question_id`.
    ///
    /// Returns the updated choice, or `None` (with nothing written) when the
    /// question owns no such choice.
    async fn increment_vote(
        &self,
        question_id: DbId,
        choice_id: DbId,
    ) -> Result<Option<Choice>, sqlx::Error>;

    async fn insert_question(&self, input: &NewQuestion) -> Result<Question, sqlx::Error>;

    /// Returns `None` if the owning question does not exist.
    async fn insert_choice(
        &self,
        question_id: DbId,
        input: &NewChoice,
    ) -> Result<Option<Choice>, sqlx::Error>;

    /// Delete a question and, by cascade, all of its choices.
    async fn delete_question(&self, id: DbId) -> Result<bool, sqlx::Error>;

    /// Cheap liveness probe used by `/health`.
    async fn health_check(&self) -> Result<(), sqlx::Error>;
}
