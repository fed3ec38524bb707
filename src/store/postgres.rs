// src/store/postgres.rs
use async_trait::async_trait;
use sqlx::PgPool;

use super::PollStore;
use crate::models::{Choice, DbId, NewChoice, NewQuestion, Question, Timestamp};

const QUESTION_COLUMNS: &str = "id, question_text, pub_date";

const CHOICE_COLUMNS: &str = "id, question_id, choice_text, votes";

/// [`PollStore`] backed by PostgreSQL through a shared sqlx pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn list_published(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE pub_date <= $1 \
             ORDER BY pub_date DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    async fn find_question(&self, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn choices_for(&self, question_id: DbId) -> Result<Vec<Choice>, sqlx::Error> {
        let query = format!(
            "SELECT {CHOICE_COLUMNS} FROM choices WHERE question_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, Choice>(&query)
            .bind(question_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn increment_vote(
        &self,
        question_id: DbId,
        choice_id: DbId,
    ) -> Result<Option<Choice>, sqlx::Error> {
        // Single statement: the row lock serializes concurrent voters, so no
        // increment is lost.
        let query = format!(
            "UPDATE choices SET votes = votes + 1 \
             WHERE id = $1 AND question_id = $2 \
             RETURNING {CHOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Choice>(&query)
            .bind(choice_id)
            .bind(question_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn insert_question(&self, input: &NewQuestion) -> Result<Question, sqlx::Error> {
        let query = format!(
            "INSERT INTO questions (question_text, pub_date) \
             VALUES ($1, $2) \
             RETURNING {QUESTION_COLUMNS}"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(&input.question_text)
            .bind(input.pub_date)
            .fetch_one(&self.pool)
            .await
    }

    async fn insert_choice(
        &self,
        question_id: DbId,
        input: &NewChoice,
    ) -> Result<Option<Choice>, sqlx::Error> {
        // INSERT ... SELECT yields no row when the parent is missing instead of
        // tripping the foreign key.
        let query = format!(
            "INSERT INTO choices (question_id, choice_text) \
             SELECT id, $2 FROM questions WHERE id = $1 \
             RETURNING {CHOICE_COLUMNS}"
        );
        sqlx::query_as::<_, Choice>(&query)
            .bind(question_id)
            .bind(&input.choice_text)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_question(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        crate::db::health_check(&self.pool).await
    }
}
