//! crates/study_tracker_core/src/tracker.rs
//!
//! The `StudyTracker` engine. It owns no state of its own: every operation
//! reads through the `DatabaseService` port, runs the pure lifecycle/ledger
//! rules and writes back with a version check, retrying when a concurrent
//! writer got there first.

use crate::board;
use crate::clock::Clock;
use crate::domain::{
    Doubt, DoubtAnswer, DoubtFilter, NewDoubt, NewDoubtAnswer, NewStudySession, NewTask,
    SessionPatch, StudySession, StudySummary, Task, TaskPatch, UserStats,
};
use crate::ledger;
use crate::lifecycle::{self, SessionAction};
use crate::ports::{DatabaseService, PortError, PortResult, TutorService, WriteOutcome};
use crate::stats::{ScoringPolicy, StatsEvent, StatsUpdate};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How many times a write is re-validated after losing a race before giving up.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

pub struct StudyTracker {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    policy: ScoringPolicy,
}

impl StudyTracker {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, policy: ScoringPolicy) -> Self {
        Self { db, clock, policy }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    //=====================================================================================
    // Session Lifecycle
    //=====================================================================================

    /// Starts a session. Fails with `Conflict` if the user already has one open.
    pub async fn start_session(&self, new: NewStudySession) -> PortResult<StudySession> {
        let session = lifecycle::start(new, self.clock.now())?;
        self.db.get_or_create_user(session.user_id).await?;
        self.db.insert_study_session(&session).await?;
        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            session_type = %session.session_type,
            "Study session started"
        );
        Ok(session)
    }

    pub async fn pause_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.transition_session(session_id, SessionAction::Pause).await
    }

    pub async fn resume_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.transition_session(session_id, SessionAction::Resume).await
    }

    pub async fn complete_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.transition_session(session_id, SessionAction::Complete).await
    }

    /// Abandons the session. Its partial time still counts as study time.
    pub async fn stop_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.transition_session(session_id, SessionAction::Stop).await
    }

    pub async fn record_cycle(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.transition_session(session_id, SessionAction::RecordCycle).await
    }

    pub async fn transition_session(
        &self,
        session_id: Uuid,
        action: SessionAction,
    ) -> PortResult<StudySession> {
        let session = self
            .mutate_session(session_id, |current, now| {
                let transition = lifecycle::apply(current, action, now)?;
                Ok((transition.session, transition.event))
            })
            .await?;
        info!(
            session_id = %session.id,
            action = %action,
            status = %session.status,
            accumulated_minutes = session.accumulated_minutes(),
            "Study session transitioned"
        );
        Ok(session)
    }

    pub async fn update_session(
        &self,
        session_id: Uuid,
        patch: SessionPatch,
    ) -> PortResult<StudySession> {
        self.mutate_session(session_id, |current, _| {
            Ok((lifecycle::apply_patch(current, &patch)?, None))
        })
        .await
    }

    pub async fn get_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.db.get_study_session(session_id).await
    }

    pub async fn list_sessions(&self, user_id: Uuid) -> PortResult<Vec<StudySession>> {
        self.db.list_study_sessions_by_user(user_id).await
    }

    /// The user's active or paused session, if any.
    pub async fn active_session(&self, user_id: Uuid) -> PortResult<Option<StudySession>> {
        self.db.get_open_study_session(user_id).await
    }

    async fn mutate_session<F>(&self, session_id: Uuid, change: F) -> PortResult<StudySession>
    where
        F: Fn(&StudySession, DateTime<Utc>) -> PortResult<(StudySession, Option<StatsEvent>)>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.db.get_study_session(session_id).await?;
            let now = self.clock.now();
            let (next, event) = change(&current, now)?;
            let update = event.map(|e| StatsUpdate::new(e, now, self.policy));

            match self
                .db
                .save_study_session(&next, current.version, update.as_ref())
                .await?
            {
                WriteOutcome::Applied => return Ok(next),
                WriteOutcome::Stale => {
                    debug!(%session_id, attempt, "Stale session write, re-reading");
                }
            }
        }
        Err(PortError::Conflict(format!(
            "session {} is being modified concurrently",
            session_id
        )))
    }

    //=====================================================================================
    // Task Ledger
    //=====================================================================================

    pub async fn create_task(&self, new: NewTask) -> PortResult<Task> {
        let task = ledger::create(new, self.clock.now())?;
        self.db.get_or_create_user(task.user_id).await?;
        self.db.insert_task(&task).await?;
        info!(task_id = %task.id, user_id = %task.user_id, "Task created");
        Ok(task)
    }

    pub async fn get_task(&self, task_id: Uuid) -> PortResult<Task> {
        self.db.get_task(task_id).await
    }

    /// Most recently created first.
    pub async fn list_tasks(&self, user_id: Uuid) -> PortResult<Vec<Task>> {
        self.db.list_tasks_by_user(user_id).await
    }

    pub async fn update_task(&self, task_id: Uuid, patch: TaskPatch) -> PortResult<Task> {
        self.mutate_task(task_id, |current, now| ledger::apply_patch(current, &patch, now))
            .await
    }

    /// Idempotent: completing a completed task returns it unchanged.
    pub async fn complete_task(&self, task_id: Uuid) -> PortResult<Task> {
        self.mutate_task(task_id, ledger::complete).await
    }

    pub async fn reopen_task(&self, task_id: Uuid) -> PortResult<Task> {
        self.mutate_task(task_id, ledger::reopen).await
    }

    /// Deletes the task. `tasksCompleted` keeps whatever it already counted.
    pub async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        self.db.delete_task(task_id).await?;
        info!(%task_id, "Task deleted");
        Ok(())
    }

    async fn mutate_task<F>(&self, task_id: Uuid, change: F) -> PortResult<Task>
    where
        F: Fn(&Task, DateTime<Utc>) -> PortResult<Option<(Task, Option<StatsEvent>)>>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.db.get_task(task_id).await?;
            let now = self.clock.now();
            let Some((next, event)) = change(&current, now)? else {
                return Ok(current);
            };
            let update = event.map(|e| StatsUpdate::new(e, now, self.policy));

            match self
                .db
                .save_task(&next, current.version, update.as_ref())
                .await?
            {
                WriteOutcome::Applied => {
                    if event.is_some() {
                        info!(%task_id, user_id = %next.user_id, "Task completed");
                    }
                    return Ok(next);
                }
                WriteOutcome::Stale => {
                    debug!(%task_id, attempt, "Stale task write, re-reading");
                }
            }
        }
        Err(PortError::Conflict(format!(
            "task {} is being modified concurrently",
            task_id
        )))
    }

    //=====================================================================================
    // Doubt Board
    //=====================================================================================

    /// Posts a doubt. With a `tutor`, asks it for a draft answer once the doubt
    /// is stored; if that fails the doubt is returned without one.
    pub async fn post_doubt(
        &self,
        new: NewDoubt,
        tutor: Option<&dyn TutorService>,
    ) -> PortResult<Doubt> {
        let doubt = board::post(new, self.clock.now())?;
        self.db.get_or_create_user(doubt.user_id).await?;
        self.db.insert_doubt(&doubt).await?;
        info!(
            doubt_id = %doubt.id,
            user_id = %doubt.user_id,
            subject = %doubt.subject,
            "Doubt posted"
        );

        let Some(tutor) = tutor else {
            return Ok(doubt);
        };
        let draft = match tutor.answer_doubt(&doubt).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(doubt_id = %doubt.id, error = %e, "Tutor answer unavailable");
                return Ok(doubt);
            }
        };
        match self
            .mutate_doubt(doubt.id, |current| board::attach_ai_answer(current, &draft))
            .await
        {
            Ok(drafted) => Ok(drafted),
            Err(e) => {
                warn!(doubt_id = %doubt.id, error = %e, "Failed to store tutor answer");
                Ok(doubt)
            }
        }
    }

    pub async fn get_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        self.db.get_doubt(doubt_id).await
    }

    /// Most recently posted first.
    pub async fn list_doubts(&self, filter: &DoubtFilter) -> PortResult<Vec<Doubt>> {
        self.db.list_doubts(filter).await
    }

    pub async fn upvote_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        self.db.upvote_doubt(doubt_id).await
    }

    pub async fn answer_doubt(&self, new: NewDoubtAnswer) -> PortResult<DoubtAnswer> {
        let doubt = self.db.get_doubt(new.doubt_id).await?;
        let answer = board::answer(&doubt, new, self.clock.now())?;
        self.db.get_or_create_user(answer.user_id).await?;
        self.db.insert_doubt_answer(&answer).await?;
        self.mutate_doubt(doubt.id, board::mark_answered).await?;
        info!(
            answer_id = %answer.id,
            doubt_id = %doubt.id,
            user_id = %answer.user_id,
            "Doubt answered"
        );
        Ok(answer)
    }

    /// Most upvoted first. `NotFound` for an unknown doubt.
    pub async fn list_answers(&self, doubt_id: Uuid) -> PortResult<Vec<DoubtAnswer>> {
        self.db.get_doubt(doubt_id).await?;
        self.db.list_doubt_answers(doubt_id).await
    }

    pub async fn upvote_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        self.db.upvote_doubt_answer(answer_id).await
    }

    /// Accepts the answer, solves its doubt and credits the answer's author
    /// with `DoubtSolved`. Accepting the accepted answer again is a no-op.
    pub async fn accept_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let answer = self.db.get_doubt_answer(answer_id).await?;
            let doubt = self.db.get_doubt(answer.doubt_id).await?;
            let Some((solved, accepted)) = board::accept(&doubt, &answer)? else {
                return Ok(answer);
            };
            let update = StatsUpdate::new(StatsEvent::DoubtSolved, self.clock.now(), self.policy);

            match self
                .db
                .save_doubt(&solved, doubt.version, Some((&accepted, &update)))
                .await?
            {
                WriteOutcome::Applied => {
                    info!(
                        %answer_id,
                        doubt_id = %solved.id,
                        user_id = %accepted.user_id,
                        "Doubt solved"
                    );
                    return Ok(accepted);
                }
                WriteOutcome::Stale => {
                    debug!(%answer_id, attempt, "Stale doubt write, re-reading");
                }
            }
        }
        Err(PortError::Conflict(format!(
            "answer {} is being accepted concurrently",
            answer_id
        )))
    }

    async fn mutate_doubt<F>(&self, doubt_id: Uuid, change: F) -> PortResult<Doubt>
    where
        F: Fn(&Doubt) -> Option<Doubt>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let current = self.db.get_doubt(doubt_id).await?;
            let Some(next) = change(&current) else {
                return Ok(current);
            };
            match self.db.save_doubt(&next, current.version, None).await? {
                WriteOutcome::Applied => return Ok(next),
                WriteOutcome::Stale => {
                    debug!(%doubt_id, attempt, "Stale doubt write, re-reading");
                }
            }
        }
        Err(PortError::Conflict(format!(
            "doubt {} is being modified concurrently",
            doubt_id
        )))
    }

    //=====================================================================================
    // Statistics & Summaries
    //=====================================================================================

    /// Returns the user's statistics, creating the all-zero row on first access.
    pub async fn stats(&self, user_id: Uuid) -> PortResult<UserStats> {
        self.db.get_or_create_user(user_id).await?;
        self.db.get_or_create_user_stats(user_id).await
    }

    /// The bounded history handed to the recommendation gateway.
    pub async fn study_summary(&self, user_id: Uuid) -> PortResult<StudySummary> {
        let (tasks, sessions) = futures::try_join!(
            self.db.list_tasks_by_user(user_id),
            self.db.list_study_sessions_by_user(user_id),
        )?;
        Ok(StudySummary::from_history(&tasks, &sessions))
    }
}
