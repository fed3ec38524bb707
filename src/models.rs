// src/models.rs
//! Row types for the `questions` and `choices` tables plus creation DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// All primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// A row from the `questions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: DbId,
    pub question_text: String,
    pub pub_date: Timestamp,
}

/// A row from the `choices` table. Owned by exactly one [`Question`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: DbId,
    pub question_id: DbId,
    pub choice_text: String,
    pub votes: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewQuestion {
    #[validate(length(min = 1, max = 200))]
    pub question_text: String,
    pub pub_date: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewChoice {
    #[validate(length(min = 1, max = 200))]
    pub choice_text: String,
}

/// Form body posted to the vote endpoint.
///
/// `choice` stays a raw string so that a missing and a malformed value are
/// handled the same way by the vote operation.
#[derive(Debug, Default)]
pub struct VoteForm {
    pub choice: Option<String>,
}

impl VoteForm {
    /// Build from decoded `key=value` pairs. A repeated `choice` keeps the
    /// last value; unrelated fields are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let choice = pairs
            .into_iter()
            .filter(|(key, _)| key == "choice")
            .map(|(_, value)| value)
            .last();
        Self { choice }
    }

    /// The submitted choice id, if one was present and numeric.
    pub fn choice_id(&self) -> Option<DbId> {
        self.choice.as_deref().and_then(|raw| raw.trim().parse().ok())
    }
}
