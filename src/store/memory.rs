// src/store/memory.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::PollStore;
use crate::models::{Choice, DbId, NewChoice, NewQuestion, Question, Timestamp};

#[derive(Default)]
struct Tables {
    questions: BTreeMap<DbId, Question>,
    choices: BTreeMap<DbId, Choice>,
    next_question_id: DbId,
    next_choice_id: DbId,
}

/// In-process [`PollStore`]. Every mutation runs under one write lock, which
/// makes the vote increment atomic with respect to other voters.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn list_published(
        &self,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let tables = self.tables.read().await;
        let mut published: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.pub_date <= now)
            .cloned()
            .collect();
        published.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
        published.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(published)
    }

    async fn find_question(&self, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        Ok(self.tables.read().await.questions.get(&id).cloned())
    }

    async fn choices_for(&self, question_id: DbId) -> Result<Vec<Choice>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .values()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn increment_vote(
        &self,
        question_id: DbId,
        choice_id: DbId,
    ) -> Result<Option<Choice>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        let Some(choice) = tables
            .choices
            .get_mut(&choice_id)
            .filter(|c| c.question_id == question_id)
        else {
            return Ok(None);
        };
        // Same failure PostgreSQL reports for an INTEGER column at its limit.
        choice.votes = choice.votes.checked_add(1).ok_or_else(|| {
            sqlx::Error::Protocol("integer out of range for choices.votes".to_string())
        })?;
        Ok(Some(choice.clone()))
    }

    async fn insert_question(&self, input: &NewQuestion) -> Result<Question, sqlx::Error> {
        let mut tables = self.tables.write().await;
        tables.next_question_id += 1;
        let question = Question {
            id: tables.next_question_id,
            question_text: input.question_text.clone(),
            pub_date: input.pub_date,
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn insert_choice(
        &self,
        question_id: DbId,
        input: &NewChoice,
    ) -> Result<Option<Choice>, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if !tables.questions.contains_key(&question_id) {
            return Ok(None);
        }
        tables.next_choice_id += 1;
        let choice = Choice {
            id: tables.next_choice_id,
            question_id,
            choice_text: input.choice_text.clone(),
            votes: 0,
        };
        tables.choices.insert(choice.id, choice.clone());
        Ok(Some(choice))
    }

    async fn delete_question(&self, id: DbId) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.write().await;
        if tables.questions.remove(&id).is_none() {
            return Ok(false);
        }
        tables.choices.retain(|_, c| c.question_id != id);
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
