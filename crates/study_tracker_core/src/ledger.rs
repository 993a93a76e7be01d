//! crates/study_tracker_core/src/ledger.rs
//!
//! Pure task ledger rules: creation, partial patches and the completion toggle.

use crate::domain::{NewTask, Task, TaskPatch, TaskStatus};
use crate::lifecycle::{optional_text, required_text};
use crate::ports::{PortError, PortResult};
use crate::stats::StatsEvent;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Validates a creation request and builds a pending task.
pub fn create(new: NewTask, now: DateTime<Utc>) -> PortResult<Task> {
    let title = required_text("title", &new.title)?;
    let subject = required_text("subject", &new.subject)?;
    if let Some(minutes) = new.estimated_duration {
        validate_estimate(minutes)?;
    }

    Ok(Task {
        id: Uuid::new_v4(),
        user_id: new.user_id,
        title,
        description: optional_text(new.description),
        subject,
        priority: new.priority,
        status: TaskStatus::Pending,
        due_date: new.due_date,
        estimated_duration: new.estimated_duration,
        completed_at: None,
        created_at: now,
        version: 0,
    })
}

/// Applies `patch` to `task`.
///
/// Returns `None` when the patch changes nothing, e.g. completing a task that
/// is already completed. Otherwise returns the new task and, when the patch
/// moved it from pending to completed, the `TaskCompleted` event.
pub fn apply_patch(
    task: &Task,
    patch: &TaskPatch,
    now: DateTime<Utc>,
) -> PortResult<Option<(Task, Option<StatsEvent>)>> {
    let mut next = task.clone();

    if let Some(title) = &patch.title {
        next.title = required_text("title", title)?;
    }
    if let Some(description) = &patch.description {
        next.description = optional_text(description.clone());
    }
    if let Some(subject) = &patch.subject {
        next.subject = required_text("subject", subject)?;
    }
    if let Some(priority) = patch.priority {
        next.priority = priority;
    }
    if let Some(due_date) = patch.due_date {
        next.due_date = due_date;
    }
    if let Some(estimate) = patch.estimated_duration {
        if let Some(minutes) = estimate {
            validate_estimate(minutes)?;
        }
        next.estimated_duration = estimate;
    }

    let mut event = None;
    match (task.status, patch.status) {
        (TaskStatus::Pending, Some(TaskStatus::Completed)) => {
            next.status = TaskStatus::Completed;
            next.completed_at = Some(now);
            event = Some(StatsEvent::TaskCompleted);
        }
        (TaskStatus::Completed, Some(TaskStatus::Pending)) => {
            next.status = TaskStatus::Pending;
            next.completed_at = None;
        }
        _ => {}
    }

    if next == *task {
        return Ok(None);
    }
    next.version += 1;
    Ok(Some((next, event)))
}

pub fn complete(task: &Task, now: DateTime<Utc>) -> PortResult<Option<(Task, Option<StatsEvent>)>> {
    apply_patch(task, &status_patch(TaskStatus::Completed), now)
}

pub fn reopen(task: &Task, now: DateTime<Utc>) -> PortResult<Option<(Task, Option<StatsEvent>)>> {
    apply_patch(task, &status_patch(TaskStatus::Pending), now)
}

fn status_patch(status: TaskStatus) -> TaskPatch {
    TaskPatch {
        status: Some(status),
        ..TaskPatch::default()
    }
}

fn validate_estimate(minutes: u32) -> PortResult<()> {
    if minutes == 0 {
        return Err(PortError::validation(
            "estimatedDuration",
            "must be at least one minute",
        ));
    }
    Ok(())
}
