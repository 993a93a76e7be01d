//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Atomicity comes from the database: the partial unique index
//! `study_sessions_one_open_per_user` guards the active slot, session and task
//! writes are compare-and-swap on `version`, and the statistics row is locked
//! with `FOR UPDATE` inside the same transaction as the write that feeds it.
//! Upvotes are single `UPDATE ... SET upvotes = upvotes + 1` statements.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use study_tracker_core::domain::{
    Doubt, DoubtAnswer, DoubtFilter, StudySession, Task, UnknownVariant, User, UserStats,
};
use study_tracker_core::ports::{DatabaseService, PortError, PortResult, WriteOutcome};
use study_tracker_core::stats::StatsUpdate;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// SQL
//=========================================================================================

const SESSION_COLUMNS: &str = "id, user_id, subject, topic, status, session_type, \
    planned_duration, accumulated_seconds, cycle_count, start_time, end_time, \
    last_resumed_at, created_at, version";

const TASK_COLUMNS: &str = "id, user_id, title, description, subject, priority, status, \
    due_date, estimated_duration, completed_at, created_at, version";

const STATS_COLUMNS: &str = "user_id, total_study_time, tasks_completed, sessions_completed, \
    doubts_solved, points_earned, current_streak, productivity_score, last_active_date, \
    activity_date, today_study_minutes, today_tasks_completed, updated_at";

const DOUBT_COLUMNS: &str = "id, user_id, title, description, subject, tags, status, upvotes, \
    is_anonymous, ai_answer, created_at, version";

const ANSWER_COLUMNS: &str = "id, doubt_id, user_id, content, upvotes, is_accepted, created_at";

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    subject: String,
    topic: Option<String>,
    status: String,
    session_type: String,
    planned_duration: i32,
    accumulated_seconds: i64,
    cycle_count: i32,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    last_resumed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    version: i64,
}
impl StudySessionRecord {
    fn to_domain(self) -> PortResult<StudySession> {
        Ok(StudySession {
            id: self.id,
            user_id: self.user_id,
            subject: self.subject,
            topic: self.topic,
            status: self.status.parse().map_err(corrupt_row)?,
            session_type: self.session_type.parse().map_err(corrupt_row)?,
            planned_duration: to_u32(self.planned_duration),
            accumulated_seconds: self.accumulated_seconds,
            cycle_count: to_u32(self.cycle_count),
            start_time: self.start_time,
            end_time: self.end_time,
            last_resumed_at: self.last_resumed_at,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    subject: String,
    priority: String,
    status: String,
    due_date: Option<DateTime<Utc>>,
    estimated_duration: Option<i32>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    version: i64,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<Task> {
        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            priority: self.priority.parse().map_err(corrupt_row)?,
            status: self.status.parse().map_err(corrupt_row)?,
            due_date: self.due_date,
            estimated_duration: self.estimated_duration.map(to_u32),
            completed_at: self.completed_at,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

#[derive(FromRow)]
struct UserStatsRecord {
    user_id: Uuid,
    total_study_time: i32,
    tasks_completed: i32,
    sessions_completed: i32,
    doubts_solved: i32,
    points_earned: i32,
    current_streak: i32,
    productivity_score: i32,
    last_active_date: Option<NaiveDate>,
    activity_date: Option<NaiveDate>,
    today_study_minutes: i32,
    today_tasks_completed: i32,
    updated_at: DateTime<Utc>,
}
impl UserStatsRecord {
    fn to_domain(self) -> UserStats {
        UserStats {
            user_id: self.user_id,
            total_study_time: to_u32(self.total_study_time),
            tasks_completed: to_u32(self.tasks_completed),
            sessions_completed: to_u32(self.sessions_completed),
            doubts_solved: to_u32(self.doubts_solved),
            points_earned: to_u32(self.points_earned),
            current_streak: to_u32(self.current_streak),
            productivity_score: self.productivity_score.clamp(0, 100) as u8,
            last_active_date: self.last_active_date,
            activity_date: self.activity_date,
            today_study_minutes: to_u32(self.today_study_minutes),
            today_tasks_completed: to_u32(self.today_tasks_completed),
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct DoubtRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    subject: String,
    tags: Vec<String>,
    status: String,
    upvotes: i32,
    is_anonymous: bool,
    ai_answer: Option<String>,
    created_at: DateTime<Utc>,
    version: i64,
}
impl DoubtRecord {
    fn to_domain(self) -> PortResult<Doubt> {
        Ok(Doubt {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            tags: self.tags,
            status: self.status.parse().map_err(corrupt_row)?,
            upvotes: to_u32(self.upvotes),
            is_anonymous: self.is_anonymous,
            ai_answer: self.ai_answer,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

#[derive(FromRow)]
struct DoubtAnswerRecord {
    id: Uuid,
    doubt_id: Uuid,
    user_id: Uuid,
    content: String,
    upvotes: i32,
    is_accepted: bool,
    created_at: DateTime<Utc>,
}
impl DoubtAnswerRecord {
    fn to_domain(self) -> DoubtAnswer {
        DoubtAnswer {
            id: self.id,
            doubt_id: self.doubt_id,
            user_id: self.user_id,
            content: self.content,
            upvotes: to_u32(self.upvotes),
            is_accepted: self.is_accepted,
            created_at: self.created_at,
        }
    }
}

/// `%needle%` for `ILIKE`, with the pattern metacharacters escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn to_u32(value: i32) -> u32 {
    value.max(0) as u32
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn corrupt_row(e: UnknownVariant) -> PortError {
    PortError::Unexpected(format!("Corrupt row: {}", e))
}

fn db_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(what: &str, id: Uuid) -> impl FnOnce(sqlx::Error) -> PortError + '_ {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{} {} not found", what, id)),
        _ => db_error(e),
    }
}

//=========================================================================================
// Transaction Helpers
//=========================================================================================

impl DbAdapter {
    /// Folds `update` into the user's statistics row. Must run inside the
    /// transaction that wrote the triggering session or task.
    async fn fold_stats(
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        update: &StatsUpdate,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;

        let record = sqlx::query_as::<_, UserStatsRecord>(&format!(
            "SELECT {} FROM user_stats WHERE user_id = $1 FOR UPDATE",
            STATS_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)?;

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = 'pending'",
        )
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)?;

        let mut stats = record.to_domain();
        update.apply_to(&mut stats, u32::try_from(pending).unwrap_or(u32::MAX));

        sqlx::query(
            "UPDATE user_stats SET total_study_time = $2, tasks_completed = $3, \
             sessions_completed = $4, points_earned = $5, current_streak = $6, \
             productivity_score = $7, last_active_date = $8, activity_date = $9, \
             today_study_minutes = $10, today_tasks_completed = $11, updated_at = $12, \
             doubts_solved = $13 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(to_i32(stats.total_study_time))
        .bind(to_i32(stats.tasks_completed))
        .bind(to_i32(stats.sessions_completed))
        .bind(to_i32(stats.points_earned))
        .bind(to_i32(stats.current_streak))
        .bind(i32::from(stats.productivity_score))
        .bind(stats.last_active_date)
        .bind(stats.activity_date)
        .bind(to_i32(stats.today_study_minutes))
        .bind(to_i32(stats.today_tasks_completed))
        .bind(stats.updated_at)
        .bind(to_i32(stats.doubts_solved))
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    /// Distinguishes a lost compare-and-swap from a missing row.
    async fn stale_or_missing(
        tx: &mut Transaction<'_, Postgres>,
        table: &str,
        what: &str,
        id: Uuid,
    ) -> PortResult<WriteOutcome> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            table
        ))
        .bind(id)
        .fetch_one(&mut **tx)
        .await
        .map_err(db_error)?;
        if exists {
            Ok(WriteOutcome::Stale)
        } else {
            Err(PortError::NotFound(format!("{} {} not found", what, id)))
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query("INSERT INTO users (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("User", user_id))?;

        Ok(record.to_domain())
    }

    async fn insert_study_session(&self, session: &StudySession) -> PortResult<()> {
        let result = sqlx::query(&format!(
            "INSERT INTO study_sessions ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            SESSION_COLUMNS
        ))
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.subject)
        .bind(&session.topic)
        .bind(session.status.as_str())
        .bind(session.session_type.as_str())
        .bind(to_i32(session.planned_duration))
        .bind(session.accumulated_seconds)
        .bind(to_i32(session.cycle_count))
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.last_resumed_at)
        .bind(session.created_at)
        .bind(session.version)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(PortError::Conflict(
                format!("user {} already has an open session", session.user_id),
            )),
            Err(e) => Err(db_error(e)),
        }
    }

    async fn get_study_session(&self, session_id: Uuid) -> PortResult<StudySession> {
        sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Study session", session_id))?
        .to_domain()
    }

    async fn get_open_study_session(&self, user_id: Uuid) -> PortResult<Option<StudySession>> {
        sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE user_id = $1 AND status IN ('active', 'paused')",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .map(StudySessionRecord::to_domain)
        .transpose()
    }

    async fn list_study_sessions_by_user(&self, user_id: Uuid) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(&format!(
            "SELECT {} FROM study_sessions WHERE user_id = $1 ORDER BY created_at DESC",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_study_session(
        &self,
        session: &StudySession,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            "UPDATE study_sessions SET subject = $3, topic = $4, status = $5, \
             planned_duration = $6, accumulated_seconds = $7, cycle_count = $8, \
             end_time = $9, last_resumed_at = $10, version = $11 \
             WHERE id = $1 AND version = $2",
        )
        .bind(session.id)
        .bind(expected_version)
        .bind(&session.subject)
        .bind(&session.topic)
        .bind(session.status.as_str())
        .bind(to_i32(session.planned_duration))
        .bind(session.accumulated_seconds)
        .bind(to_i32(session.cycle_count))
        .bind(session.end_time)
        .bind(session.last_resumed_at)
        .bind(session.version)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Self::stale_or_missing(&mut tx, "study_sessions", "Study session", session.id)
                .await;
        }
        if let Some(update) = stats {
            Self::fold_stats(&mut tx, session.user_id, update).await?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(WriteOutcome::Applied)
    }

    async fn insert_task(&self, task: &Task) -> PortResult<()> {
        sqlx::query(&format!(
            "INSERT INTO tasks ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            TASK_COLUMNS
        ))
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.subject)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.estimated_duration.map(to_i32))
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.version)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_task(&self, task_id: Uuid) -> PortResult<Task> {
        sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Task", task_id))?
        .to_domain()
    }

    async fn list_tasks_by_user(&self, user_id: Uuid) -> PortResult<Vec<Task>> {
        let records = sqlx::query_as::<_, TaskRecord>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_task(
        &self,
        task: &Task,
        expected_version: i64,
        stats: Option<&StatsUpdate>,
    ) -> PortResult<WriteOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            "UPDATE tasks SET title = $3, description = $4, subject = $5, priority = $6, \
             status = $7, due_date = $8, estimated_duration = $9, completed_at = $10, \
             version = $11 WHERE id = $1 AND version = $2",
        )
        .bind(task.id)
        .bind(expected_version)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.subject)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.estimated_duration.map(to_i32))
        .bind(task.completed_at)
        .bind(task.version)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Self::stale_or_missing(&mut tx, "tasks", "Task", task.id).await;
        }
        if let Some(update) = stats {
            Self::fold_stats(&mut tx, task.user_id, update).await?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(WriteOutcome::Applied)
    }

    async fn delete_task(&self, task_id: Uuid) -> PortResult<()> {
        let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if deleted.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(())
    }

    async fn get_or_create_user_stats(&self, user_id: Uuid) -> PortResult<UserStats> {
        sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        let record = sqlx::query_as::<_, UserStatsRecord>(&format!(
            "SELECT {} FROM user_stats WHERE user_id = $1",
            STATS_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Statistics for user", user_id))?;

        Ok(record.to_domain())
    }

    async fn insert_doubt(&self, doubt: &Doubt) -> PortResult<()> {
        sqlx::query(&format!(
            "INSERT INTO doubts ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            DOUBT_COLUMNS
        ))
        .bind(doubt.id)
        .bind(doubt.user_id)
        .bind(&doubt.title)
        .bind(&doubt.description)
        .bind(&doubt.subject)
        .bind(&doubt.tags)
        .bind(doubt.status.as_str())
        .bind(to_i32(doubt.upvotes))
        .bind(doubt.is_anonymous)
        .bind(&doubt.ai_answer)
        .bind(doubt.created_at)
        .bind(doubt.version)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        sqlx::query_as::<_, DoubtRecord>(&format!(
            "SELECT {} FROM doubts WHERE id = $1",
            DOUBT_COLUMNS
        ))
        .bind(doubt_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Doubt", doubt_id))?
        .to_domain()
    }

    async fn list_doubts(&self, filter: &DoubtFilter) -> PortResult<Vec<Doubt>> {
        let records = sqlx::query_as::<_, DoubtRecord>(&format!(
            "SELECT {} FROM doubts \
             WHERE ($1::TEXT IS NULL OR subject = $1) \
               AND ($2::TEXT IS NULL OR status = $2) \
               AND ($3::TEXT IS NULL OR title ILIKE $3 OR description ILIKE $3) \
             ORDER BY created_at DESC",
            DOUBT_COLUMNS
        ))
        .bind(&filter.subject)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.search.as_deref().map(like_pattern))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn save_doubt(
        &self,
        doubt: &Doubt,
        expected_version: i64,
        accepted: Option<(&DoubtAnswer, &StatsUpdate)>,
    ) -> PortResult<WriteOutcome> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let updated = sqlx::query(
            "UPDATE doubts SET status = $3, ai_answer = $4, version = $5 \
             WHERE id = $1 AND version = $2",
        )
        .bind(doubt.id)
        .bind(expected_version)
        .bind(doubt.status.as_str())
        .bind(&doubt.ai_answer)
        .bind(doubt.version)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        if updated.rows_affected() == 0 {
            return Self::stale_or_missing(&mut tx, "doubts", "Doubt", doubt.id).await;
        }
        if let Some((answer, update)) = accepted {
            let marked = sqlx::query(
                "UPDATE doubt_answers SET is_accepted = TRUE WHERE id = $1 AND doubt_id = $2",
            )
            .bind(answer.id)
            .bind(doubt.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
            if marked.rows_affected() == 0 {
                return Err(PortError::NotFound(format!(
                    "Doubt answer {} not found",
                    answer.id
                )));
            }
            Self::fold_stats(&mut tx, answer.user_id, update).await?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(WriteOutcome::Applied)
    }

    async fn upvote_doubt(&self, doubt_id: Uuid) -> PortResult<Doubt> {
        sqlx::query_as::<_, DoubtRecord>(&format!(
            "UPDATE doubts SET upvotes = upvotes + 1 WHERE id = $1 RETURNING {}",
            DOUBT_COLUMNS
        ))
        .bind(doubt_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Doubt", doubt_id))?
        .to_domain()
    }

    async fn insert_doubt_answer(&self, answer: &DoubtAnswer) -> PortResult<()> {
        let result = sqlx::query(&format!(
            "INSERT INTO doubt_answers ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            ANSWER_COLUMNS
        ))
        .bind(answer.id)
        .bind(answer.doubt_id)
        .bind(answer.user_id)
        .bind(&answer.content)
        .bind(to_i32(answer.upvotes))
        .bind(answer.is_accepted)
        .bind(answer.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(
                PortError::NotFound(format!("Doubt {} not found", answer.doubt_id)),
            ),
            Err(e) => Err(db_error(e)),
        }
    }

    async fn get_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        let record = sqlx::query_as::<_, DoubtAnswerRecord>(&format!(
            "SELECT {} FROM doubt_answers WHERE id = $1",
            ANSWER_COLUMNS
        ))
        .bind(answer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Doubt answer", answer_id))?;

        Ok(record.to_domain())
    }

    async fn list_doubt_answers(&self, doubt_id: Uuid) -> PortResult<Vec<DoubtAnswer>> {
        let records = sqlx::query_as::<_, DoubtAnswerRecord>(&format!(
            "SELECT {} FROM doubt_answers WHERE doubt_id = $1 \
             ORDER BY upvotes DESC, created_at DESC",
            ANSWER_COLUMNS
        ))
        .bind(doubt_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(records.into_iter().map(DoubtAnswerRecord::to_domain).collect())
    }

    async fn upvote_doubt_answer(&self, answer_id: Uuid) -> PortResult<DoubtAnswer> {
        let record = sqlx::query_as::<_, DoubtAnswerRecord>(&format!(
            "UPDATE doubt_answers SET upvotes = upvotes + 1 WHERE id = $1 RETURNING {}",
            ANSWER_COLUMNS
        ))
        .bind(answer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found("Doubt answer", answer_id))?;

        Ok(record.to_domain())
    }
}
