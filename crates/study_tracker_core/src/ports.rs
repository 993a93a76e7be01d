//! crates/study_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    Doubt, DoubtAnswer, DoubtFilter, StudySession, StudySuggestions, StudySummary, Task, User,
    UserStats,
};
use crate::stats::StatsUpdate;
use async_trait::async_trait;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by the engine and all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Malformed or missing input. `field` names the offending request field.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The user's active slot is already taken, or a write kept losing races.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The requested lifecycle transition is not in the transition table.
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// An AI gateway failed. Recommendations recover with a fallback; doubts
    /// are kept without a tutor answer.
    #[error("Gateway error: {0}")]
    Gateway(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PortError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Result of a compare-and-swap write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The stored version moved on since the row was read; nothing was written.
    Stale,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User>;

    // --- Study Sessions ---

    /// Persists a freshly started session. Must fail with `PortError::Conflict`
    /// if the user already has an active or paused session; the check and the
    /// insert are one atomic step.
    async fn insert_study_session(&self, session: &StudySession) -> PortResult<()>;

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession>;

    async fn get_open_study_session(&self, user_id: Uuid) -> PortResult<Option<StudySession>>;

    /// Most recently created first.
    async fn list_study_sessions_by_user(&self, user_id: Uuid) -> PortResult<Vec<StudySession>>;

    /// Writes `session` if the stored row is still at `expected_version`, and in
    /// the same transaction folds `stats` into the owner's statistics row.
    async fn save_study_session(
        &self,
        session: &StudySession,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome>;

    // --- Task Ledger ---
    async fn insert_task(&self, task: &Task) -> PortResult<()>;

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task>;

    /// Most recently created first.
    async fn list_tasks_by_user(&self, user_id: Uuid) -> PortResult<Vec<Task>>;

    /// Same contract as [`DatabaseService::save_study_session`].
    async fn save_task(
        &self,
        task: &Task,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome>;

    /// Removes the task permanently. Statistics are left untouched.
    async fn delete_task(&self, task_id: Uuid) -> PortResult<()>;

    // --- Statistics ---

    /// Returns the user's statistics row, inserting an all-zero row if absent.
    async fn get_or_create_user_stats(&self, user_id: Uuid) -> PortResult<UserStats>;

    // --- Doubt Board ---
    async fn insert_doubt(&self, doubt: &Doubt) -> PortResult<()>;

    async fn get_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt>;

    /// Doubts matching `filter`, most recently created first.
    async fn list_doubts(&self, filter: &DoubtFilter) -> PortResult<Vec<Doubt>>;

    /// Writes the doubt's `status` and `ai_answer` if the stored row is still at
    /// `expected_version`; upvotes are never overwritten. With `accepted`, the
    /// same transaction marks that answer accepted and folds the update into
    /// the statistics of the answer's author.
    async fn save_doubt(
        &self,
        doubt: &Doubt,
        expected_version: i64,
        accepted: Option<(&DoubtAnswer, &StatsUpdate)>,
    ) -> PortResult<WriteOutcome>;

    /// Adds one upvote atomically and returns the updated doubt.
    async fn upvote_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt>;

    /// Fails with `NotFound` if the doubt does not exist.
    async fn insert_doubt_answer(&self, answer: &DoubtAnswer) -> PortResult<()>;

    async fn get_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer>;

    /// Most upvoted first; newest first among equals.
    async fn list_doubt_answers(&self, doubt_id: Uuid) -> PortResult<Vec<DoubtAnswer>>;

    async fn upvote_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer>;
}

#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Produces study suggestions from a bounded summary of the user's history.
    async fn summarize(&self, summary: &StudySummary) -> PortResult<StudySuggestions>;
}

#[async_trait]
pub trait TutorService: Send + Sync {
    /// Drafts an explanatory answer to a doubt.
    async fn answer_doubt(&self, doubt: &Doubt) -> PortResult<String>;
}
