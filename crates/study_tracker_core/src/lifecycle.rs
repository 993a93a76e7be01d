//! crates/study_tracker_core/src/lifecycle.rs
//!
//! The study session state machine. Every status change goes through
//! [`next_status`]; anything not in that table is rejected.

use crate::domain::{NewStudySession, SessionPatch, SessionStatus, StudySession};
use crate::ports::{PortError, PortResult};
use crate::stats::StatsEvent;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Upper bound for a planned session, in minutes.
pub const MAX_PLANNED_DURATION: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Pause,
    Resume,
    Complete,
    /// Abandon the session.
    Stop,
    RecordCycle,
}

impl SessionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionAction::Pause => "pause",
            SessionAction::Resume => "resume",
            SessionAction::Complete => "complete",
            SessionAction::Stop => "stop",
            SessionAction::RecordCycle => "record_cycle",
        }
    }
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionAction {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" => Ok(SessionAction::Pause),
            "resume" => Ok(SessionAction::Resume),
            "complete" => Ok(SessionAction::Complete),
            "stop" | "abandon" => Ok(SessionAction::Stop),
            "record_cycle" => Ok(SessionAction::RecordCycle),
            other => Err(PortError::validation(
                "action",
                format!("unknown session action '{}'", other),
            )),
        }
    }
}

/// The transition table.
pub fn next_status(from: SessionStatus, action: SessionAction) -> Option<SessionStatus> {
    use SessionAction::*;
    use SessionStatus::*;

    match (from, action) {
        (Active, Pause) => Some(Paused),
        (Paused, Resume) => Some(Active),
        (Active | Paused, Complete) => Some(Completed),
        (Active | Paused, Stop) => Some(Abandoned),
        (Active, RecordCycle) => Some(Active),
        _ => None,
    }
}

/// A validated transition: the session as it must be written, plus the
/// statistics event it produces (only terminal transitions produce one).
#[derive(Debug, Clone)]
pub struct Transition {
    pub session: StudySession,
    pub event: Option<StatsEvent>,
}

/// Validates a start request and builds the `Active` session.
pub fn start(new: NewStudySession, now: DateTime<Utc>) -> PortResult<StudySession> {
    let subject = required_text("subject", &new.subject)?;
    validate_planned_duration(new.planned_duration)?;

    Ok(StudySession {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        subject,
        topic: optional_text(new.topic),
        status: SessionStatus::Active,
        session_type: new.session_type,
        planned_duration: new.planned_duration,
        accumulated_seconds: 0,
        cycle_count: 0,
        start_time: now,
        end_time: None,
        last_resumed_at: Some(now),
        created_at: now,
        version: 0,
    })
}

/// Applies `action` to `session` at `now`.
pub fn apply(
    session: &StudySession,
    action: SessionAction,
    now: DateTime<Utc>,
) -> PortResult<Transition> {
    let target = next_status(session.status, action).ok_or_else(|| {
        PortError::InvalidState(format!(
            "cannot {} session {} while it is {}",
            action, session.id, session.status
        ))
    })?;

    let mut next = session.clone();
    let mut event = None;

    match action {
        SessionAction::Pause => flush(&mut next, now),
        SessionAction::Resume => next.last_resumed_at = Some(now),
        SessionAction::Complete => {
            flush(&mut next, now);
            next.end_time = Some(now);
            event = Some(StatsEvent::SessionCompleted {
                minutes: next.accumulated_minutes(),
                session_type: next.session_type,
            });
        }
        SessionAction::Stop => {
            flush(&mut next, now);
            next.end_time = Some(now);
            event = Some(StatsEvent::SessionAbandoned {
                minutes: next.accumulated_minutes(),
            });
        }
        SessionAction::RecordCycle => next.cycle_count = next.cycle_count.saturating_add(1),
    }

    next.status = target;
    next.version += 1;
    Ok(Transition {
        session: next,
        event,
    })
}

/// Applies a descriptive field update. Terminal sessions are historical records
/// and cannot be edited.
pub fn apply_patch(session: &StudySession, patch: &SessionPatch) -> PortResult<StudySession> {
    if !session.status.is_open() {
        return Err(PortError::InvalidState(format!(
            "session {} is {} and can no longer be edited",
            session.id, session.status
        )));
    }

    let mut next = session.clone();
    if let Some(subject) = &patch.subject {
        next.subject = required_text("subject", subject)?;
    }
    if let Some(topic) = &patch.topic {
        next.topic = optional_text(Some(topic.clone()));
    }
    if let Some(planned) = patch.planned_duration {
        validate_planned_duration(planned)?;
        next.planned_duration = planned;
    }
    next.version += 1;
    Ok(next)
}

/// Moves the running segment into `accumulated_seconds`.
fn flush(session: &mut StudySession, now: DateTime<Utc>) {
    if let Some(resumed_at) = session.last_resumed_at.take() {
        if session.status == SessionStatus::Active {
            session.accumulated_seconds += (now - resumed_at).num_seconds().max(0);
        }
    }
}

fn validate_planned_duration(minutes: u32) -> PortResult<()> {
    if minutes == 0 || minutes > MAX_PLANNED_DURATION {
        return Err(PortError::validation(
            "plannedDuration",
            format!("must be between 1 and {} minutes", MAX_PLANNED_DURATION),
        ));
    }
    Ok(())
}

pub(crate) fn required_text(field: &str, value: &str) -> PortResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PortError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
