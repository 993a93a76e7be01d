//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. A single
//! `parking_lot` mutex guards all tables, so every port call is one atomic
//! step: the active-slot check, the version check and the statistics fold all
//! happen under the lock.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use study_tracker_core::domain::{
    Doubt, DoubtAnswer, DoubtFilter, StudySession, Task, TaskStatus, User, UserStats,
};
use study_tracker_core::ports::{DatabaseService, PortError, PortResult, WriteOutcome};
use study_tracker_core::stats::StatsUpdate;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    /// Kept in insertion order; listings sort on `created_at` with insertion as tie-break.
    sessions: Vec<StudySession>,
    tasks: Vec<Task>,
    stats: HashMap<Uuid, UserStats>,
    doubts: Vec<Doubt>,
    answers: Vec<DoubtAnswer>,
}

impl Tables {
    fn stats_entry(&mut self, user_id: Uuid) -> &mut UserStats {
        self.stats
            .entry(user_id)
            .or_insert_with(|| UserStats::empty(user_id, Utc::now()))
    }

    fn pending_tasks(&self, user_id: Uuid) -> u32 {
        self.tasks
            .iter()
            .filter(|t| t.user_id == user_id && t.status == TaskStatus::Pending)
            .count() as u32
    }

    fn fold_stats(&mut self, user_id: Uuid, update: Option<&StatsUpdate>) {
        if let Some(update) = update {
            let pending = self.pending_tasks(user_id);
            update.apply_to(self.stats_entry(user_id), pending);
        }
    }
}

#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock()
    }
}

fn newest_first<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.reverse();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        let mut tables = self.lock();
        let user = tables.users.entry(user_id).or_insert_with(|| User {
            user_id,
            created_at: Utc::now(),
        });
        Ok(user.clone())
    }

    async fn insert_study_session(&self, session: &StudySession) -> PortResult<()> {
        let mut tables = self.lock();
        if let Some(open) = tables
            .sessions
            .iter()
            .find(|s| s.user_id == session.user_id && s.status.is_open())
        {
            return Err(PortError::Conflict(format!(
                "user {} already has an open session ({})",
                session.user_id, open.id
            )));
        }
        tables.sessions.push(session.clone());
        Ok(())
    }

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session_id)))
    }

    async fn get_open_study_session(&self, user_id: Uuid) -> PortResult<Option<StudySession>> {
        Ok(self
            .lock()
            .sessions
            .iter()
            .find(|s| s.user_id == user_id && s.status.is_open())
            .cloned())
    }

    async fn list_study_sessions_by_user(&self, user_id: Uuid) -> PortResult<Vec<StudySession>> {
        let rows: Vec<StudySession> = self
            .lock()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |s| s.created_at))
    }

    async fn save_study_session(
        &self,
        session: &StudySession,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome> {
        let mut tables = self.lock();
        let stored = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == session.id)
            .ok_or_else(|| PortError::NotFound(format!("Study session {} not found", session.id)))?;
        if stored.version != expected_version {
            return Ok(WriteOutcome::Stale);
        }
        *stored = session.clone();
        tables.fold_stats(session.user_id, stats);
        Ok(WriteOutcome::Applied)
    }

    async fn insert_task(&self, task: &Task) -> PortResult<()> {
        self.lock().tasks.push(task.clone());
        Ok(())
    }

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task> {
        self.lock()
            .tasks
            .iter()
            .find(|t| t.id == task_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task_id)))
    }

    async fn list_tasks_by_user(&self, user_id: Uuid) -> PortResult<Vec<Task>> {
        let rows: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |t| t.created_at))
    }

    async fn save_task(
        &self,
        task: &Task,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome> {
        let mut tables = self.lock();
        let stored = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| PortError::NotFound(format!("Task {} not found", task.id)))?;
        if stored.version != expected_version {
            return Ok(WriteOutcome::Stale);
        }
        *stored = task.clone();
        tables.fold_stats(task.user_id, stats);
        Ok(WriteOutcome::Applied)
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        let mut tables = self.lock();
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != task_id);
        if tables.tasks.len() == before {
            return Err(PortError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(())
    }

    async fn get_or_create_user_stats(&self, user_id: Uuid) -> PortResult<UserStats> {
        Ok(self.lock().stats_entry(user_id).clone())
    }

    async fn insert_doubt(&self, doubt: &Doubt) -> PortResult<()> {
        self.lock().doubts.push(doubt.clone());
        Ok(())
    }

    async fn get_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        self.lock()
            .doubts
            .iter()
            .find(|d| d.id == doubt_id)
            .cloned()
            .ok_or_else(|| doubt_not_found(doubt_id))
    }

    async fn list_doubts(&self, filter: &DoubtFilter) -> PortResult<Vec<Doubt>> {
        let rows: Vec<Doubt> = self
            .lock()
            .doubts
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        Ok(newest_first(rows, |d| d.created_at))
    }

    async fn save_doubt(
        &self,
        doubt: &Doubt,
        expected_version: i64,
        accepted: Option<(&DoubtAnswer, &StatsUpdate)>,
    ) -> PortResult<WriteOutcome> {
        let mut tables = self.lock();
        let accepted_at = match accepted {
            Some((answer, _)) => Some(
                tables
                    .answers
                    .iter()
                    .position(|a| a.id == answer.id)
                    .ok_or_else(|| answer_not_found(answer.id))?,
            ),
            None => None,
        };
        let stored = tables
            .doubts
            .iter_mut()
            .find(|d| d.id == doubt.id)
            .ok_or_else(|| doubt_not_found(doubt.id))?;
        if stored.version != expected_version {
            return Ok(WriteOutcome::Stale);
        }
        stored.status = doubt.status;
        stored.ai_answer = doubt.ai_answer.clone();
        stored.version = doubt.version;

        if let (Some(index), Some((answer, update))) = (accepted_at, accepted) {
            tables.answers[index].is_accepted = true;
            tables.fold_stats(answer.user_id, Some(update));
        }
        Ok(WriteOutcome::Applied)
    }

    async fn upvote_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        let mut tables = self.lock();
        let stored = tables
            .doubts
            .iter_mut()
            .find(|d| d.id == doubt_id)
            .ok_or_else(|| doubt_not_found(doubt_id))?;
        stored.upvotes = stored.upvotes.saturating_add(1);
        Ok(stored.clone())
    }

    async fn insert_doubt_answer(&self, answer: &DoubtAnswer) -> PortResult<()> {
        let mut tables = self.lock();
        if !tables.doubts.iter().any(|d| d.id == answer.doubt_id) {
            return Err(doubt_not_found(answer.doubt_id));
        }
        tables.answers.push(answer.clone());
        Ok(())
    }

    async fn get_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        self.lock()
            .answers
            .iter()
            .find(|a| a.id == answer_id)
            .cloned()
            .ok_or_else(|| answer_not_found(answer_id))
    }

    async fn list_doubt_answers(&self, doubt_id: Uuid) -> PortResult<Vec<DoubtAnswer>> {
        let rows: Vec<DoubtAnswer> = self
            .lock()
            .answers
            .iter()
            .filter(|a| a.doubt_id == doubt_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| (a.upvotes, a.created_at)))
    }

    async fn upvote_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        let mut tables = self.lock();
        let stored = tables
            .answers
            .iter_mut()
            .find(|a| a.id == answer_id)
            .ok_or_else(|| answer_not_found(answer_id))?;
        stored.upvotes = stored.upvotes.saturating_add(1);
        Ok(stored.clone())
    }
}

fn doubt_not_found(doubt_id: Uuid) -> PortError {
    PortError::NotFound(format!("Doubt {} not found", doubt_id))
}

fn answer_not_found(answer_id: Uuid) -> PortError {
    PortError::NotFound(format!("Doubt answer {} not found", answer_id))
}
