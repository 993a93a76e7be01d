//! crates/study_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum number of tasks forwarded to the recommendation gateway.
pub const MAX_SUMMARY_TASKS: usize = 50;
/// Maximum number of (most recent) sessions forwarded to the recommendation gateway.
pub const MAX_SUMMARY_SESSIONS: usize = 10;

/// Returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// Represents a user - created implicitly the first time an id is referenced.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Study Sessions
//=========================================================================================

/// The closed set of persisted session states.
///
/// A session that has not been started yet only exists as a [`NewStudySession`],
/// so there is no `Planned` variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    /// Whether the session occupies the user's single active slot.
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Active | SessionStatus::Paused)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(UnknownVariant::new("session status", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    Pomodoro,
    Custom,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Pomodoro => "pomodoro",
            SessionType::Custom => "custom",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pomodoro" => Ok(SessionType::Pomodoro),
            "custom" => Ok(SessionType::Custom),
            other => Err(UnknownVariant::new("session type", other)),
        }
    }
}

/// One bounded interval of focused study.
///
/// Focused time is kept in seconds; `last_resumed_at` marks the start of the
/// running segment and is only set while the session is `Active`.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub topic: Option<String>,
    pub status: SessionStatus,
    pub session_type: SessionType,
    pub planned_duration: u32,
    pub accumulated_seconds: i64,
    pub cycle_count: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_resumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
}

impl StudySession {
    /// Flushed focused time in whole minutes (rounded down).
    pub fn accumulated_minutes(&self) -> u32 {
        (self.accumulated_seconds.max(0) / 60) as u32
    }

    /// Focused time including the segment that is still running at `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let running = match (self.status, self.last_resumed_at) {
            (SessionStatus::Active, Some(resumed_at)) => (now - resumed_at).num_seconds().max(0),
            _ => 0,
        };
        self.accumulated_seconds + running
    }
}

/// A session the user wants to start. This is the `Planned` state: nothing
/// is persisted until the engine accepts it.
#[derive(Debug, Clone)]
pub struct NewStudySession {
    pub user_id: Uuid,
    pub subject: String,
    pub topic: Option<String>,
    pub planned_duration: u32,
    pub session_type: SessionType,
}

/// Editable descriptive fields of a non-terminal session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub planned_duration: Option<u32>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.topic.is_none() && self.planned_duration.is_none()
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::High => "high",
            TaskPriority::Medium => "medium",
            TaskPriority::Low => "low",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            other => Err(UnknownVariant::new("task priority", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(UnknownVariant::new("task status", other)),
        }
    }
}

/// A unit of work the user plans to do.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<u32>,
}

/// Partial update of a task. `None` leaves the field untouched; for the
/// optional fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub subject: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub estimated_duration: Option<Option<u32>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

//=========================================================================================
// Doubt Board
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DoubtStatus {
    #[default]
    Open,
    /// Someone has answered, but the asker has not accepted an answer yet.
    InProgress,
    Solved,
}

impl DoubtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoubtStatus::Open => "open",
            DoubtStatus::InProgress => "in_progress",
            DoubtStatus::Solved => "solved",
        }
    }
}

impl fmt::Display for DoubtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoubtStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(DoubtStatus::Open),
            "in_progress" => Ok(DoubtStatus::InProgress),
            "solved" => Ok(DoubtStatus::Solved),
            other => Err(UnknownVariant::new("doubt status", other)),
        }
    }
}

/// A question posted to the doubt board.
#[derive(Debug, Clone, PartialEq)]
pub struct Doubt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub tags: Vec<String>,
    pub status: DoubtStatus,
    pub upvotes: u32,
    /// Hides the asker from readers of the board.
    pub is_anonymous: bool,
    /// The AI tutor's draft answer, when one was requested and produced.
    pub ai_answer: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Guards `status` and `ai_answer`. Upvotes are counted separately.
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct NewDoubt {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub tags: Vec<String>,
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoubtAnswer {
    pub id: Uuid,
    pub doubt_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub upvotes: u32,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDoubtAnswer {
    pub doubt_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

/// Narrows a board listing. Every set field must match.
#[derive(Debug, Clone, Default)]
pub struct DoubtFilter {
    pub subject: Option<String>,
    pub status: Option<DoubtStatus>,
    /// Case-insensitive substring of the title or the description.
    pub search: Option<String>,
}

impl DoubtFilter {
    pub fn matches(&self, doubt: &Doubt) -> bool {
        if self.subject.as_ref().is_some_and(|s| *s != doubt.subject) {
            return false;
        }
        if self.status.is_some_and(|s| s != doubt.status) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                let needle = needle.to_lowercase();
                doubt.title.to_lowercase().contains(&needle)
                    || doubt.description.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

//=========================================================================================
// Derived Statistics
//=========================================================================================

/// The per-user rollup. Only the statistics aggregator writes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub user_id: Uuid,
    /// Minutes.
    pub total_study_time: u32,
    pub tasks_completed: u32,
    pub sessions_completed: u32,
    pub doubts_solved: u32,
    pub points_earned: u32,
    pub current_streak: u32,
    pub productivity_score: u8,
    pub last_active_date: Option<NaiveDate>,
    /// The calendar day the `today_*` counters refer to.
    pub activity_date: Option<NaiveDate>,
    pub today_study_minutes: u32,
    pub today_tasks_completed: u32,
    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// The all-zero row created on first access.
    pub fn empty(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            total_study_time: 0,
            tasks_completed: 0,
            sessions_completed: 0,
            doubts_solved: 0,
            points_earned: 0,
            current_streak: 0,
            productivity_score: 0,
            last_active_date: None,
            activity_date: None,
            today_study_minutes: 0,
            today_tasks_completed: 0,
            updated_at: now,
        }
    }
}

//=========================================================================================
// Recommendations
//=========================================================================================

#[derive(Debug, Clone)]
pub struct TaskSummary {
    pub title: String,
    pub subject: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub subject: String,
    pub minutes: u32,
    pub status: SessionStatus,
    pub session_type: SessionType,
}

/// The bounded view of a user's history that is handed to the recommendation gateway.
#[derive(Debug, Clone, Default)]
pub struct StudySummary {
    pub tasks: Vec<TaskSummary>,
    pub sessions: Vec<SessionSummary>,
}

impl StudySummary {
    /// Builds a summary from histories ordered most recent first.
    pub fn from_history(tasks: &[Task], sessions: &[StudySession]) -> Self {
        let tasks = tasks
            .iter()
            .take(MAX_SUMMARY_TASKS)
            .map(|t| TaskSummary {
                title: t.title.clone(),
                subject: t.subject.clone(),
                priority: t.priority,
                status: t.status,
                due_date: t.due_date,
            })
            .collect();
        let sessions = sessions
            .iter()
            .take(MAX_SUMMARY_SESSIONS)
            .map(|s| SessionSummary {
                subject: s.subject.clone(),
                minutes: s.accumulated_minutes(),
                status: s.status,
                session_type: s.session_type,
            })
            .collect();
        Self { tasks, sessions }
    }
}

/// Suggestions returned by the recommendation gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySuggestions {
    pub recommendations: Vec<String>,
    pub priority_suggestions: Vec<String>,
    pub schedule_optimization: Vec<String>,
}

impl StudySuggestions {
    /// The generic advice served whenever the gateway is unavailable or misbehaves.
    pub fn fallback() -> Self {
        Self {
            recommendations: vec![
                "Focus on completing high-priority tasks first".to_string(),
                "Take regular breaks between study sessions".to_string(),
                "Review completed topics weekly".to_string(),
            ],
            priority_suggestions: vec![
                "Complete overdue assignments".to_string(),
                "Prepare for upcoming deadlines".to_string(),
            ],
            schedule_optimization: vec![
                "Use Pomodoro technique for better focus".to_string(),
                "Study difficult subjects when most alert".to_string(),
            ],
        }
    }

    /// Replaces every empty list with the matching fallback list.
    pub fn or_fallback(self) -> Self {
        let fallback = Self::fallback();
        Self {
            recommendations: non_empty_or(self.recommendations, fallback.recommendations),
            priority_suggestions: non_empty_or(
                self.priority_suggestions,
                fallback.priority_suggestions,
            ),
            schedule_optimization: non_empty_or(
                self.schedule_optimization,
                fallback.schedule_optimization,
            ),
        }
    }
}

fn non_empty_or(items: Vec<String>, fallback: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        fallback
    } else {
        items
    }
}
