// src/poll.rs
//! Poll domain logic: publication rules, the visibility policy and the vote
//! operation.
//!
//! Every time-sensitive function takes `now` from the caller; nothing in this
//! module reads the clock.

use chrono::Duration;
use serde::Serialize;
use validator::Validate;

use crate::error::{PollError, VoteError};
use crate::models::{Choice, DbId, NewChoice, NewQuestion, Question, Timestamp};
use crate::store::PollStore;

/// Number of questions shown on the index page.
pub const DEFAULT_LATEST_LIMIT: i64 = 5;

impl Question {
    /// A question is visible to end users once its `pub_date` has passed.
    pub fn is_published(&self, now: Timestamp) -> bool {
        self.pub_date <= now
    }

    /// True iff `now - 1 day < pub_date <= now`.
    pub fn was_published_recently(&self, now: Timestamp) -> bool {
        now - Duration::days(1) < self.pub_date && self.pub_date <= now
    }
}

/// Decides which lookups hide questions whose `pub_date` is still ahead.
///
/// The detail lookup is always gated. Results and votes are ungated by
/// default, so an unpublished question can be voted on and its tallies read
/// by id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityPolicy {
    pub results_require_published: bool,
    pub votes_require_published: bool,
}

impl VisibilityPolicy {
    pub fn results_visible(&self, question: &Question, now: Timestamp) -> bool {
        !self.results_require_published || question.is_published(now)
    }

    pub fn votes_open(&self, question: &Question, now: Timestamp) -> bool {
        !self.votes_require_published || question.is_published(now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub question: Question,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResults {
    pub question: Question,
    pub choices: Vec<Choice>,
    pub total_votes: i64,
}

#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// The vote was stored; the caller should redirect to the results view.
    Counted { choice: Choice },
    /// Nothing was written; the caller should re-present the question.
    Rejected {
        detail: QuestionDetail,
        error: VoteError,
    },
}

/// Latest published questions, newest first.
pub async fn list_published_questions(
    store: &dyn PollStore,
    now: Timestamp,
    limit: i64,
) -> Result<Vec<Question>, PollError> {
    Ok(store.list_published(now, limit.max(0)).await?)
}

async fn find_question(store: &dyn PollStore, id: DbId) -> Result<Question, PollError> {
    store
        .find_question(id)
        .await?
        .ok_or(PollError::question_not_found(id))
}

/// Look up a published question. Unpublished and missing questions are both
/// reported as `NotFound`.
pub async fn get_visible_question(
    store: &dyn PollStore,
    id: DbId,
    now: Timestamp,
) -> Result<Question, PollError> {
    let question = find_question(store, id).await?;
    if !question.is_published(now) {
        return Err(PollError::question_not_found(id));
    }
    Ok(question)
}

/// Detail view payload: a published question and its choices.
pub async fn get_question_detail(
    store: &dyn PollStore,
    id: DbId,
    now: Timestamp,
) -> Result<QuestionDetail, PollError> {
    let question = get_visible_question(store, id, now).await?;
    let choices = store.choices_for(question.id).await?;
    Ok(QuestionDetail { question, choices })
}

pub async fn get_results(
    store: &dyn PollStore,
    policy: VisibilityPolicy,
    id: DbId,
    now: Timestamp,
) -> Result<QuestionResults, PollError> {
    let question = find_question(store, id).await?;
    if !policy.results_visible(&question, now) {
        return Err(PollError::question_not_found(id));
    }
    let choices = store.choices_for(question.id).await?;
    let total_votes = choices.iter().map(|c| i64::from(c.votes)).sum();
    Ok(QuestionResults {
        question,
        choices,
        total_votes,
    })
}

/// Add one vote to `choice_id` of question `question_id`.
///
/// A missing question is a hard `NotFound`. A missing choice id, or one the
/// question does not own, yields [`VoteOutcome::Rejected`] with the question
/// context and no mutation.
pub async fn cast_vote(
    store: &dyn PollStore,
    policy: VisibilityPolicy,
    question_id: DbId,
    choice_id: Option<DbId>,
    now: Timestamp,
) -> Result<VoteOutcome, PollError> {
    let question = find_question(store, question_id).await?;
    if !policy.votes_open(&question, now) {
        return Err(PollError::question_not_found(question_id));
    }

    let counted = match choice_id {
        Some(choice_id) => store.increment_vote(question.id, choice_id).await?,
        None => None,
    };

    match counted {
        Some(choice) => {
            tracing::info!(question_id, choice_id = choice.id, votes = choice.votes, "Vote recorded");
            Ok(VoteOutcome::Counted { choice })
        }
        None => {
            tracing::debug!(question_id, ?choice_id, "Vote rejected: no matching choice");
            let choices = store.choices_for(question.id).await?;
            Ok(VoteOutcome::Rejected {
                detail: QuestionDetail { question, choices },
                error: VoteError::NoChoiceSelected,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Administrative operations
// ---------------------------------------------------------------------------

pub async fn create_question(
    store: &dyn PollStore,
    input: NewQuestion,
) -> Result<Question, PollError> {
    input.validate()?;
    let question = store.insert_question(&input).await?;
    tracing::info!(question_id = question.id, "Question created");
    Ok(question)
}

pub async fn add_choice(
    store: &dyn PollStore,
    question_id: DbId,
    input: NewChoice,
) -> Result<Choice, PollError> {
    input.validate()?;
    store
        .insert_choice(question_id, &input)
        .await?
        .ok_or(PollError::question_not_found(question_id))
}

/// Remove a question together with all of its choices.
pub async fn delete_question(store: &dyn PollStore, id: DbId) -> Result<(), PollError> {
    if !store.delete_question(id).await? {
        return Err(PollError::question_not_found(id));
    }
    tracing::info!(question_id = id, "Question deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;
    use crate::store::MemoryStore;

    fn question_at(pub_date: Timestamp) -> Question {
        Question {
            id: 1,
            question_text: "?".to_string(),
            pub_date,
        }
    }

    async fn seed(store: &MemoryStore, pub_date: Timestamp) -> (Question, Choice, Choice) {
        let question = create_question(
            store,
            NewQuestion {
                question_text: "Favourite colour?".to_string(),
                pub_date,
            },
        )
        .await
        .unwrap();
        let red = add_choice(store, question.id, NewChoice { choice_text: "Red".into() })
            .await
            .unwrap();
        let blue = add_choice(store, question.id, NewChoice { choice_text: "Blue".into() })
            .await
            .unwrap();
        (question, red, blue)
    }

    // --- recency ---

    #[test]
    fn future_question_is_not_recent() {
        let now = Utc::now();
        assert!(!question_at(now + Duration::days(30)).was_published_recently(now));
    }

    #[test]
    fn question_older_than_a_day_is_not_recent() {
        let now = Utc::now();
        let old = question_at(now - Duration::days(1) - Duration::seconds(1));
        assert!(!old.was_published_recently(now));
    }

    #[test]
    fn exactly_one_day_old_is_not_recent() {
        let now = Utc::now();
        assert!(!question_at(now - Duration::days(1)).was_published_recently(now));
    }

    #[test]
    fn question_within_the_last_day_is_recent() {
        let now = Utc::now();
        let recent = now - Duration::hours(23) - Duration::minutes(59) - Duration::seconds(59);
        assert!(question_at(recent).was_published_recently(now));
        assert!(question_at(now).was_published_recently(now));
    }

    #[test]
    fn published_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(question_at(now).is_published(now));
        assert!(!question_at(now + Duration::seconds(1)).is_published(now));
    }

    // --- lookups ---

    #[tokio::test]
    async fn detail_hides_unpublished_questions() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (future, _, _) = seed(&store, now + Duration::days(5)).await;

        assert_matches!(
            get_visible_question(&store, future.id, now).await,
            Err(PollError::NotFound { entity: "Question", .. })
        );
    }

    #[tokio::test]
    async fn detail_includes_choices() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, red, blue) = seed(&store, now - Duration::days(1)).await;

        let detail = get_question_detail(&store, question.id, now).await.unwrap();
        assert_eq!(detail.question, question);
        assert_eq!(detail.choices, vec![red, blue]);
    }

    #[tokio::test]
    async fn results_follow_the_policy() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (future, _, _) = seed(&store, now + Duration::days(1)).await;

        assert!(get_results(&store, VisibilityPolicy::default(), future.id, now)
            .await
            .is_ok());

        let gated = VisibilityPolicy {
            results_require_published: true,
            ..Default::default()
        };
        assert_matches!(
            get_results(&store, gated, future.id, now).await,
            Err(PollError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn list_limit_is_never_negative() {
        let store = MemoryStore::new();
        let now = Utc::now();
        seed(&store, now - Duration::hours(1)).await;

        assert!(list_published_questions(&store, now, -3).await.unwrap().is_empty());
    }

    // --- voting ---

    #[tokio::test]
    async fn vote_increments_only_the_selected_choice() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, red, blue) = seed(&store, now).await;

        let outcome = cast_vote(&store, VisibilityPolicy::default(), question.id, Some(red.id), now)
            .await
            .unwrap();
        assert_matches!(outcome, VoteOutcome::Counted { choice } if choice.id == red.id && choice.votes == 1);

        let results = get_results(&store, VisibilityPolicy::default(), question.id, now)
            .await
            .unwrap();
        let blue_after = results.choices.iter().find(|c| c.id == blue.id).unwrap();
        assert_eq!(blue_after.votes, 0);
        assert_eq!(results.total_votes, 1);
    }

    #[tokio::test]
    async fn vote_without_choice_is_rejected_without_mutation() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (question, _, _) = seed(&store, now).await;

        let outcome = cast_vote(&store, VisibilityPolicy::default(), question.id, None, now)
            .await
            .unwrap();
        assert_matches!(
            outcome,
            VoteOutcome::Rejected { ref detail, error: VoteError::NoChoiceSelected }
                if detail.question.id == question.id
        );

        let results = get_results(&store, VisibilityPolicy::default(), question.id, now)
            .await
            .unwrap();
        assert_eq!(results.total_votes, 0);
    }

    #[tokio::test]
    async fn vote_for_another_questions_choice_is_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (first, _, _) = seed(&store, now).await;
        let (_, foreign, _) = seed(&store, now).await;

        let outcome = cast_vote(&store, VisibilityPolicy::default(), first.id, Some(foreign.id), now)
            .await
            .unwrap();
        assert_matches!(outcome, VoteOutcome::Rejected { .. });
    }

    #[tokio::test]
    async fn vote_on_missing_question_is_not_found() {
        let store = MemoryStore::new();
        assert_matches!(
            cast_vote(&store, VisibilityPolicy::default(), 404, Some(1), Utc::now()).await,
            Err(PollError::NotFound { id: 404, .. })
        );
    }

    #[tokio::test]
    async fn vote_on_unpublished_question_depends_on_policy() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (future, red, _) = seed(&store, now + Duration::days(30)).await;

        let open = cast_vote(&store, VisibilityPolicy::default(), future.id, Some(red.id), now)
            .await
            .unwrap();
        assert_matches!(open, VoteOutcome::Counted { .. });

        let gated = VisibilityPolicy {
            votes_require_published: true,
            ..Default::default()
        };
        assert_matches!(
            cast_vote(&store, gated, future.id, Some(red.id), now).await,
            Err(PollError::NotFound { .. })
        );
    }

    // --- administration ---

    #[tokio::test]
    async fn overlong_question_text_is_rejected() {
        let store = MemoryStore::new();
        let result = create_question(
            &store,
            NewQuestion {
                question_text: "x".repeat(201),
                pub_date: Utc::now(),
            },
        )
        .await;
        assert_matches!(result, Err(PollError::Validation(_)));
    }

    #[tokio::test]
    async fn deleting_a_question_removes_its_choices() {
        let store = MemoryStore::new();
        let (question, _, _) = seed(&store, Utc::now()).await;

        delete_question(&store, question.id).await.unwrap();
        assert!(store.choices_for(question.id).await.unwrap().is_empty());
        assert_matches!(
            delete_question(&store, question.id).await,
            Err(PollError::NotFound { .. })
        );
    }
}
