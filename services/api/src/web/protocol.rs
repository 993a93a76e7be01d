//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API
//! server, and their conversions to and from the core domain types.
//!
//! All field names are camelCase on the wire. Enumerations travel as their
//! lowercase string forms and are parsed here so that an unknown value is
//! reported as a validation error naming the offending field.

use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use study_tracker_core::{
    domain::UnknownVariant, Doubt, DoubtAnswer, DoubtFilter, NewDoubt, NewDoubtAnswer,
    NewStudySession, NewTask, PortError, SessionAction, SessionPatch, SessionStatus,
    StudySession, StudySuggestions, Task, TaskPatch, UserStats,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Parses a wire enumeration, naming `field` if the value is unknown.
fn parse_variant<T>(field: &str, raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.trim()
        .to_lowercase()
        .parse::<T>()
        .map_err(|e| PortError::validation(field, e.to_string()).into())
}

fn parse_optional<T>(field: &str, raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = UnknownVariant>,
{
    raw.map(|value| parse_variant(field, value)).transpose()
}

/// Tells an explicit `null` (`Some(None)`) apart from an absent field (`None`).
/// Pair with `#[serde(default)]`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Study Sessions
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user_id: Uuid,
    pub subject: String,
    pub topic: Option<String>,
    /// Planned length in minutes.
    pub planned_duration: u32,
    /// `pomodoro` or `custom`.
    pub session_type: String,
}

impl StartSessionRequest {
    pub fn into_domain(self) -> Result<NewStudySession, ApiError> {
        Ok(NewStudySession {
            user_id: self.user_id,
            subject: self.subject,
            topic: self.topic,
            planned_duration: self.planned_duration,
            session_type: parse_variant("sessionType", &self.session_type)?,
        })
    }
}

/// A `PATCH` on a session is either a lifecycle command or a field edit, never both.
#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    /// One of `pause`, `resume`, `complete`, `stop`, `record_cycle`.
    pub action: Option<String>,
    /// Legacy form of `action`: the status the client wants the session to reach.
    pub status: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub planned_duration: Option<u32>,
}

/// What a session `PATCH` asks for.
#[derive(Debug, PartialEq)]
pub enum SessionUpdate {
    Transition(SessionAction),
    Edit(SessionPatch),
}

impl UpdateSessionRequest {
    pub fn into_update(self) -> Result<SessionUpdate, ApiError> {
        let action = match (self.action.as_deref(), self.status.as_deref()) {
            (Some(_), Some(_)) => {
                return Err(PortError::validation(
                    "action",
                    "send either 'action' or 'status', not both",
                )
                .into())
            }
            (Some(action), None) => Some(action.trim().to_lowercase().parse::<SessionAction>()?),
            (None, Some(status)) => Some(action_for_status(parse_variant("status", status)?)?),
            (None, None) => None,
        };

        let patch = SessionPatch {
            subject: self.subject,
            topic: self.topic,
            planned_duration: self.planned_duration,
        };

        match action {
            Some(_) if !patch.is_empty() => Err(PortError::validation(
                "action",
                "a lifecycle action cannot be combined with field changes",
            )
            .into()),
            Some(action) => Ok(SessionUpdate::Transition(action)),
            None if patch.is_empty() => {
                Err(PortError::validation("body", "nothing to update").into())
            }
            None => Ok(SessionUpdate::Edit(patch)),
        }
    }
}

fn action_for_status(status: SessionStatus) -> Result<SessionAction, ApiError> {
    match status {
        SessionStatus::Paused => Ok(SessionAction::Pause),
        SessionStatus::Active => Ok(SessionAction::Resume),
        SessionStatus::Completed => Ok(SessionAction::Complete),
        SessionStatus::Abandoned => Ok(SessionAction::Stop),
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub topic: Option<String>,
    pub status: String,
    pub session_type: String,
    pub planned_duration: u32,
    /// Whole minutes of focused time banked so far.
    pub accumulated_duration: u32,
    /// Focused time including the running segment, in seconds.
    pub elapsed_seconds: i64,
    pub cycle_count: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SessionResponse {
    pub fn new(session: StudySession, now: DateTime<Utc>) -> Self {
        Self {
            accumulated_duration: session.accumulated_minutes(),
            elapsed_seconds: session.elapsed_seconds(now),
            id: session.id,
            user_id: session.user_id,
            subject: session.subject,
            topic: session.topic,
            status: session.status.as_str().to_string(),
            session_type: session.session_type.as_str().to_string(),
            planned_duration: session.planned_duration,
            cycle_count: session.cycle_count,
            start_time: session.start_time,
            end_time: session.end_time,
            created_at: session.created_at,
        }
    }
}

//=========================================================================================
// Tasks
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    /// `high`, `medium` or `low`; defaults to `medium`.
    pub priority: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    /// Estimated effort in minutes.
    pub estimated_duration: Option<u32>,
}

impl CreateTaskRequest {
    pub fn into_domain(self) -> Result<NewTask, ApiError> {
        Ok(NewTask {
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            priority: parse_optional("priority", self.priority.as_deref())?.unwrap_or_default(),
            due_date: self.due_date,
            estimated_duration: self.estimated_duration,
        })
    }
}

#[derive(Deserialize, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub subject: Option<String>,
    pub priority: Option<String>,
    /// `pending` or `completed`.
    pub status: Option<String>,
    /// `null` clears the due date.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// `null` clears the estimate.
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<u32>)]
    pub estimated_duration: Option<Option<u32>>,
}

impl UpdateTaskRequest {
    pub fn into_patch(self) -> Result<TaskPatch, ApiError> {
        let patch = TaskPatch {
            priority: parse_optional("priority", self.priority.as_deref())?,
            status: parse_optional("status", self.status.as_deref())?,
            title: self.title,
            description: self.description,
            subject: self.subject,
            due_date: self.due_date,
            estimated_duration: self.estimated_duration,
        };
        if patch.is_empty() {
            return Err(PortError::validation("body", "nothing to update").into());
        }
        Ok(patch)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub subject: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_duration: Option<u32>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            subject: task.subject,
            priority: task.priority.as_str().to_string(),
            status: task.status.as_str().to_string(),
            due_date: task.due_date,
            estimated_duration: task.estimated_duration,
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }
}

//=========================================================================================
// Doubt Board
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDoubtRequest {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    /// Ask the AI tutor for a draft answer. The doubt is posted even if the tutor fails.
    #[serde(default)]
    pub generate_ai_answer: bool,
}

impl PostDoubtRequest {
    /// The doubt to post and whether the tutor should be asked.
    pub fn into_domain(self) -> (NewDoubt, bool) {
        let new = NewDoubt {
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            tags: self.tags,
            is_anonymous: self.is_anonymous,
        };
        (new, self.generate_ai_answer)
    }
}

/// Board filters. Blank values are ignored.
#[derive(Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct DoubtQuery {
    /// Exact subject.
    pub subject: Option<String>,
    /// `open`, `in_progress` or `solved`.
    pub status: Option<String>,
    /// Case-insensitive text searched in titles and descriptions.
    pub search: Option<String>,
}

impl DoubtQuery {
    pub fn into_filter(self) -> Result<DoubtFilter, ApiError> {
        let status = non_blank(self.status);
        Ok(DoubtFilter {
            subject: non_blank(self.subject),
            status: parse_optional("status", status.as_deref())?,
            search: non_blank(self.search),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostAnswerRequest {
    pub user_id: Uuid,
    pub content: String,
}

impl PostAnswerRequest {
    pub fn into_domain(self, doubt_id: Uuid) -> NewDoubtAnswer {
        NewDoubtAnswer {
            doubt_id,
            user_id: self.user_id,
            content: self.content,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoubtResponse {
    pub id: Uuid,
    /// `null` for anonymous doubts.
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub tags: Vec<String>,
    pub status: String,
    pub upvotes: u32,
    pub is_anonymous: bool,
    pub has_ai_answer: bool,
    pub ai_answer: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Doubt> for DoubtResponse {
    fn from(doubt: Doubt) -> Self {
        Self {
            id: doubt.id,
            user_id: (!doubt.is_anonymous).then_some(doubt.user_id),
            title: doubt.title,
            description: doubt.description,
            subject: doubt.subject,
            tags: doubt.tags,
            status: doubt.status.as_str().to_string(),
            upvotes: doubt.upvotes,
            is_anonymous: doubt.is_anonymous,
            has_ai_answer: doubt.ai_answer.is_some(),
            ai_answer: doubt.ai_answer,
            created_at: doubt.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoubtAnswerResponse {
    pub id: Uuid,
    pub doubt_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub upvotes: u32,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<DoubtAnswer> for DoubtAnswerResponse {
    fn from(answer: DoubtAnswer) -> Self {
        Self {
            id: answer.id,
            doubt_id: answer.doubt_id,
            user_id: answer.user_id,
            content: answer.content,
            upvotes: answer.upvotes,
            is_accepted: answer.is_accepted,
            created_at: answer.created_at,
        }
    }
}

//=========================================================================================
// Statistics & Recommendations
//=========================================================================================

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub user_id: Uuid,
    /// Minutes.
    pub total_study_time: u32,
    pub tasks_completed: u32,
    pub sessions_completed: u32,
    pub doubts_solved: u32,
    pub points_earned: u32,
    pub current_streak: u32,
    pub productivity_score: u8,
    pub last_active_date: Option<String>,
    pub today_study_minutes: u32,
    pub today_tasks_completed: u32,
    pub updated_at: DateTime<Utc>,
}

impl From<UserStats> for StatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            user_id: stats.user_id,
            total_study_time: stats.total_study_time,
            tasks_completed: stats.tasks_completed,
            sessions_completed: stats.sessions_completed,
            doubts_solved: stats.doubts_solved,
            points_earned: stats.points_earned,
            current_streak: stats.current_streak,
            productivity_score: stats.productivity_score,
            last_active_date: stats.last_active_date.map(|d| d.format("%Y-%m-%d").to_string()),
            today_study_minutes: stats.today_study_minutes,
            today_tasks_completed: stats.today_tasks_completed,
            updated_at: stats.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionsResponse {
    pub recommendations: Vec<String>,
    pub priority_suggestions: Vec<String>,
    pub schedule_optimization: Vec<String>,
}

impl From<StudySuggestions> for SuggestionsResponse {
    fn from(s: StudySuggestions) -> Self {
        Self {
            recommendations: s.recommendations,
            priority_suggestions: s.priority_suggestions,
            schedule_optimization: s.schedule_optimization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: &str) -> Result<SessionUpdate, ApiError> {
        serde_json::from_str::<UpdateSessionRequest>(json)
            .unwrap()
            .into_update()
    }

    fn field_of(err: ApiError) -> String {
        match err {
            ApiError::Port(PortError::Validation { field, .. }) => field,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn action_and_legacy_status_map_to_the_same_command() {
        assert_eq!(
            update(r#"{"action":"pause"}"#).unwrap(),
            SessionUpdate::Transition(SessionAction::Pause)
        );
        assert_eq!(
            update(r#"{"status":"paused"}"#).unwrap(),
            SessionUpdate::Transition(SessionAction::Pause)
        );
        assert_eq!(
            update(r#"{"status":"abandoned"}"#).unwrap(),
            SessionUpdate::Transition(SessionAction::Stop)
        );
        assert_eq!(
            update(r#"{"action":"record_cycle"}"#).unwrap(),
            SessionUpdate::Transition(SessionAction::RecordCycle)
        );
    }

    #[test]
    fn field_edits_become_a_patch() {
        match update(r#"{"subject":"Physics","plannedDuration":45}"#).unwrap() {
            SessionUpdate::Edit(patch) => {
                assert_eq!(patch.subject.as_deref(), Some("Physics"));
                assert_eq!(patch.planned_duration, Some(45));
            }
            other => panic!("expected an edit, got {other:?}"),
        }
    }

    #[test]
    fn mixed_or_empty_bodies_are_rejected() {
        assert_eq!(field_of(update(r#"{"action":"pause","subject":"x"}"#).unwrap_err()), "action");
        assert_eq!(field_of(update(r#"{"action":"pause","status":"paused"}"#).unwrap_err()), "action");
        assert_eq!(field_of(update("{}").unwrap_err()), "body");
        assert_eq!(field_of(update(r#"{"status":"sleeping"}"#).unwrap_err()), "status");
        assert_eq!(field_of(update(r#"{"action":"jump"}"#).unwrap_err()), "action");
    }

    #[test]
    fn unknown_enumerations_name_their_field() {
        let request: StartSessionRequest = serde_json::from_str(
            r#"{"userId":"7d3f1c1e-5a55-4e55-9a8e-0c5b2f1d9a10","subject":"Math","plannedDuration":25,"sessionType":"marathon"}"#,
        )
        .unwrap();
        assert_eq!(field_of(request.into_domain().unwrap_err()), "sessionType");

        let patch = UpdateTaskRequest {
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert_eq!(field_of(patch.into_patch().unwrap_err()), "priority");
    }

    fn task_patch(json: &str) -> Result<TaskPatch, ApiError> {
        serde_json::from_str::<UpdateTaskRequest>(json)
            .unwrap()
            .into_patch()
    }

    #[test]
    fn task_patch_tells_null_from_absent() {
        let patch = task_patch(r#"{"dueDate":null,"estimatedDuration":null}"#).unwrap();
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.estimated_duration, Some(None));
        assert_eq!(patch.description, None);

        let patch = task_patch(r#"{"dueDate":"2026-03-09T17:00:00Z","estimatedDuration":30}"#).unwrap();
        assert!(matches!(patch.due_date, Some(Some(_))));
        assert_eq!(patch.estimated_duration, Some(Some(30)));
    }

    #[test]
    fn empty_task_patch_is_rejected_like_an_empty_session_patch() {
        assert_eq!(field_of(task_patch("{}").unwrap_err()), "body");
        assert_eq!(field_of(update("{}").unwrap_err()), "body");
    }

    #[test]
    fn doubt_query_ignores_blanks_and_checks_status() {
        let filter = DoubtQuery {
            subject: Some("  ".to_string()),
            status: Some("In_Progress".to_string()),
            search: Some(" orbit ".to_string()),
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.subject, None);
        assert_eq!(filter.status, Some(study_tracker_core::DoubtStatus::InProgress));
        assert_eq!(filter.search.as_deref(), Some("orbit"));

        let bad = DoubtQuery {
            status: Some("closed".to_string()),
            ..Default::default()
        };
        assert_eq!(field_of(bad.into_filter().unwrap_err()), "status");
    }

    #[test]
    fn anonymous_doubts_hide_their_author() {
        let request: PostDoubtRequest = serde_json::from_str(
            r#"{"userId":"7d3f1c1e-5a55-4e55-9a8e-0c5b2f1d9a10","title":"t","description":"d","subject":"s","isAnonymous":true}"#,
        )
        .unwrap();
        let (new, ask_tutor) = request.into_domain();
        assert!(!ask_tutor);
        let doubt = study_tracker_core::board::post(new, Utc::now()).unwrap();
        let response = DoubtResponse::from(doubt);
        assert_eq!(response.user_id, None);
        assert!(!response.has_ai_answer);
    }

    #[test]
    fn task_priority_defaults_to_medium() {
        let request: CreateTaskRequest = serde_json::from_str(
            r#"{"userId":"7d3f1c1e-5a55-4e55-9a8e-0c5b2f1d9a10","title":"Read ch. 4","subject":"History"}"#,
        )
        .unwrap();
        let task = request.into_domain().unwrap();
        assert_eq!(task.priority, study_tracker_core::TaskPriority::Medium);
    }
}
