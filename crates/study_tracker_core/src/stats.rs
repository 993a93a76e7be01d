//! crates/study_tracker_core/src/stats.rs
//!
//! The statistics aggregator. A pure fold of qualifying events into a
//! [`UserStats`] row; adapters call [`StatsUpdate::apply_to`] inside the same
//! transaction that persists the event.

use crate::domain::{SessionType, UserStats};
use chrono::{DateTime, Utc};

pub const DEFAULT_POMODORO_MULTIPLIER: u32 = 2;
pub const DEFAULT_TASK_BONUS: u32 = 10;
/// Points for the author of an answer the asker accepted.
pub const DEFAULT_DOUBT_BONUS: u32 = 15;
/// Share (in score points) of the time component of the productivity score.
pub const DEFAULT_TIME_WEIGHT: u32 = 60;
/// Share (in score points) of the task-completion component.
pub const DEFAULT_COMPLETION_WEIGHT: u32 = 40;
/// Study minutes per day at which the time component saturates.
pub const DEFAULT_TIME_CAP_MINUTES: u32 = 240;

pub const MAX_PRODUCTIVITY_SCORE: u8 = 100;

/// The scoring knobs. Loaded from configuration, defaults above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringPolicy {
    /// Points per completed minute for pomodoro sessions; custom sessions earn 1.
    pub pomodoro_multiplier: u32,
    pub task_bonus: u32,
    pub doubt_bonus: u32,
    pub time_weight: u32,
    pub completion_weight: u32,
    pub time_cap_minutes: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            pomodoro_multiplier: DEFAULT_POMODORO_MULTIPLIER,
            task_bonus: DEFAULT_TASK_BONUS,
            doubt_bonus: DEFAULT_DOUBT_BONUS,
            time_weight: DEFAULT_TIME_WEIGHT,
            completion_weight: DEFAULT_COMPLETION_WEIGHT,
            time_cap_minutes: DEFAULT_TIME_CAP_MINUTES,
        }
    }
}

impl ScoringPolicy {
    /// Points for a completed session: one per whole minute, multiplied for pomodoros.
    pub fn session_points(&self, minutes: u32, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Pomodoro => minutes.saturating_mul(self.pomodoro_multiplier),
            SessionType::Custom => minutes,
        }
    }

    /// `min(100, round(time_weight * time_ratio + completion_weight * completion_ratio))`
    /// where `time_ratio` is today's minutes over the cap (clamped to 1) and
    /// `completion_ratio` is tasks done today over tasks done today plus tasks
    /// still pending.
    pub fn productivity_score(&self, today_minutes: u32, done_today: u32, pending: u32) -> u8 {
        let time_ratio = if self.time_cap_minutes == 0 {
            0.0
        } else {
            f64::from(today_minutes.min(self.time_cap_minutes)) / f64::from(self.time_cap_minutes)
        };
        let planned = u64::from(done_today) + u64::from(pending);
        let completion_ratio = if planned == 0 {
            0.0
        } else {
            done_today as f64 / planned as f64
        };

        let raw = f64::from(self.time_weight) * time_ratio
            + f64::from(self.completion_weight) * completion_ratio;
        raw.round().min(f64::from(MAX_PRODUCTIVITY_SCORE)) as u8
    }
}

/// Something that moves a user's statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    SessionCompleted {
        minutes: u32,
        session_type: SessionType,
    },
    /// Partial time still counts toward study time, but earns no completion
    /// credit and no points.
    SessionAbandoned { minutes: u32 },
    TaskCompleted,
    /// Credited to the author of the accepted answer. Not a study activity:
    /// it leaves the streak, the daily counters and the productivity score alone.
    DoubtSolved,
}

impl StatsEvent {
    /// Whether the event counts as study activity for the day.
    pub fn is_qualifying(&self) -> bool {
        !matches!(self, StatsEvent::DoubtSolved)
    }
}

/// An event stamped with the moment it happened and the policy to score it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsUpdate {
    pub event: StatsEvent,
    pub at: DateTime<Utc>,
    pub policy: ScoringPolicy,
}

impl StatsUpdate {
    pub fn new(event: StatsEvent, at: DateTime<Utc>, policy: ScoringPolicy) -> Self {
        Self { event, at, policy }
    }

    /// Folds the event into `stats`. `pending_tasks` is the owner's number of
    /// pending tasks after the triggering write.
    pub fn apply_to(&self, stats: &mut UserStats, pending_tasks: u32) {
        let today = self.at.date_naive();
        let qualifying = self.event.is_qualifying();

        if qualifying && stats.activity_date != Some(today) {
            stats.activity_date = Some(today);
            stats.today_study_minutes = 0;
            stats.today_tasks_completed = 0;
        }

        match self.event {
            StatsEvent::SessionCompleted {
                minutes,
                session_type,
            } => {
                stats.total_study_time = stats.total_study_time.saturating_add(minutes);
                stats.today_study_minutes = stats.today_study_minutes.saturating_add(minutes);
                stats.sessions_completed = stats.sessions_completed.saturating_add(1);
                stats.points_earned = stats
                    .points_earned
                    .saturating_add(self.policy.session_points(minutes, session_type));
            }
            StatsEvent::SessionAbandoned { minutes } => {
                stats.total_study_time = stats.total_study_time.saturating_add(minutes);
                stats.today_study_minutes = stats.today_study_minutes.saturating_add(minutes);
            }
            StatsEvent::TaskCompleted => {
                stats.tasks_completed = stats.tasks_completed.saturating_add(1);
                stats.today_tasks_completed = stats.today_tasks_completed.saturating_add(1);
                stats.points_earned = stats.points_earned.saturating_add(self.policy.task_bonus);
            }
            StatsEvent::DoubtSolved => {
                stats.doubts_solved = stats.doubts_solved.saturating_add(1);
                stats.points_earned = stats.points_earned.saturating_add(self.policy.doubt_bonus);
            }
        }

        if qualifying {
            stats.current_streak = match stats.last_active_date {
                Some(last) if last == today => stats.current_streak.max(1),
                Some(last) if last.succ_opt() == Some(today) => {
                    stats.current_streak.saturating_add(1)
                }
                _ => 1,
            };
            stats.last_active_date = Some(today);

            stats.productivity_score = self.policy.productivity_score(
                stats.today_study_minutes,
                stats.today_tasks_completed,
                pending_tasks,
            );
        }
        stats.updated_at = self.at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap() + Duration::days(n)
    }

    fn apply(stats: &mut UserStats, event: StatsEvent, at: DateTime<Utc>, pending: u32) {
        StatsUpdate::new(event, at, ScoringPolicy::default()).apply_to(stats, pending);
    }

    #[test]
    fn pomodoro_completion_awards_double_points() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(
            &mut stats,
            StatsEvent::SessionCompleted {
                minutes: 25,
                session_type: SessionType::Pomodoro,
            },
            day(0),
            0,
        );

        assert_eq!(stats.total_study_time, 25);
        assert_eq!(stats.points_earned, 50);
        assert_eq!(stats.sessions_completed, 1);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.last_active_date, Some(day(0).date_naive()));
    }

    #[test]
    fn abandoned_session_adds_time_without_credit() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::SessionAbandoned { minutes: 10 }, day(0), 0);

        assert_eq!(stats.total_study_time, 10);
        assert_eq!(stats.sessions_completed, 0);
        assert_eq!(stats.points_earned, 0);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn task_completion_adds_fixed_bonus() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::TaskCompleted, day(0), 3);

        assert_eq!(stats.tasks_completed, 1);
        assert_eq!(stats.points_earned, DEFAULT_TASK_BONUS);
    }

    #[test]
    fn solved_doubt_earns_points_but_no_streak() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::TaskCompleted, day(0), 1);
        let score = stats.productivity_score;

        apply(&mut stats, StatsEvent::DoubtSolved, day(2), 1);
        assert_eq!(stats.doubts_solved, 1);
        assert_eq!(stats.points_earned, DEFAULT_TASK_BONUS + DEFAULT_DOUBT_BONUS);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.last_active_date, Some(day(0).date_naive()));
        assert_eq!(stats.today_tasks_completed, 1);
        assert_eq!(stats.productivity_score, score);
        assert_eq!(stats.updated_at, day(2));
    }

    #[test]
    fn streak_advances_once_per_consecutive_day() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::TaskCompleted, day(0), 0);
        apply(&mut stats, StatsEvent::TaskCompleted, day(0) + Duration::hours(3), 0);
        assert_eq!(stats.current_streak, 1);

        apply(&mut stats, StatsEvent::TaskCompleted, day(1), 0);
        assert_eq!(stats.current_streak, 2);
        apply(&mut stats, StatsEvent::TaskCompleted, day(2), 0);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn streak_resets_after_a_gap() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::TaskCompleted, day(0), 0);
        apply(&mut stats, StatsEvent::TaskCompleted, day(1), 0);
        apply(&mut stats, StatsEvent::TaskCompleted, day(3), 0);

        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.last_active_date, Some(day(3).date_naive()));
    }

    #[test]
    fn daily_counters_roll_over() {
        let mut stats = UserStats::empty(Uuid::new_v4(), day(0));
        apply(&mut stats, StatsEvent::SessionAbandoned { minutes: 120 }, day(0), 0);
        assert_eq!(stats.today_study_minutes, 120);

        apply(&mut stats, StatsEvent::SessionAbandoned { minutes: 30 }, day(1), 0);
        assert_eq!(stats.today_study_minutes, 30);
        assert_eq!(stats.total_study_time, 150);
    }

    #[test]
    fn productivity_score_blends_time_and_completion() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.productivity_score(0, 0, 0), 0);
        // 120/240 of the time share plus 1/2 of the completion share.
        assert_eq!(policy.productivity_score(120, 1, 1), 50);
        assert_eq!(policy.productivity_score(240, 4, 0), 100);
        // Time beyond the cap does not push the score further.
        assert_eq!(policy.productivity_score(600, 0, 0), 60);
        // 25/240 * 60 = 6.25
        assert_eq!(policy.productivity_score(25, 0, 0), 6);
    }

    #[test]
    fn productivity_score_is_clamped() {
        let policy = ScoringPolicy {
            time_weight: 90,
            completion_weight: 90,
            ..ScoringPolicy::default()
        };
        assert_eq!(policy.productivity_score(240, 1, 0), MAX_PRODUCTIVITY_SCORE);
    }
}
