//! Engine scenarios driven over the in-memory store with a manual clock.

use api_lib::adapters::InMemoryDb;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use study_tracker_core::{
    domain::MAX_SUMMARY_SESSIONS, stats::DEFAULT_DOUBT_BONUS, Doubt, DoubtStatus, ManualClock,
    NewDoubt, NewDoubtAnswer, NewStudySession, NewTask, PortError, PortResult, ScoringPolicy,
    SessionPatch, SessionStatus, SessionType, StudyTracker, TaskPatch, TaskPriority, TaskStatus,
    TutorService,
};
use uuid::Uuid;

struct Harness {
    tracker: Arc<StudyTracker>,
    clock: Arc<ManualClock>,
    user_id: Uuid,
}

fn start_of_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::new(start_of_day()));
    let tracker = Arc::new(StudyTracker::new(
        Arc::new(InMemoryDb::new()),
        clock.clone(),
        ScoringPolicy::default(),
    ));
    Harness {
        tracker,
        clock,
        user_id: Uuid::new_v4(),
    }
}

fn new_session(user_id: Uuid, session_type: SessionType) -> NewStudySession {
    NewStudySession {
        user_id,
        subject: "Mathematics".to_string(),
        topic: Some("Integrals".to_string()),
        planned_duration: 25,
        session_type,
    }
}

fn new_task(user_id: Uuid, title: &str) -> NewTask {
    NewTask {
        user_id,
        title: title.to_string(),
        description: None,
        subject: "Chemistry".to_string(),
        priority: TaskPriority::High,
        due_date: None,
        estimated_duration: Some(30),
    }
}

//=========================================================================================
// Session lifecycle
//=========================================================================================

#[tokio::test]
async fn completed_pomodoro_earns_double_points_and_starts_a_streak() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Pomodoro))
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.accumulated_minutes(), 0);

    h.clock.advance(Duration::minutes(25));
    let done = h.tracker.complete_session(session.id).await.unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.accumulated_minutes(), 25);
    assert_eq!(done.end_time, Some(start_of_day() + Duration::minutes(25)));

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 25);
    assert_eq!(stats.points_earned, 50);
    assert_eq!(stats.sessions_completed, 1);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.last_active_date, Some(start_of_day().date_naive()));
}

#[tokio::test]
async fn abandoned_session_counts_time_but_not_completion() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(10));
    let stopped = h.tracker.stop_session(session.id).await.unwrap();
    assert_eq!(stopped.status, SessionStatus::Abandoned);
    assert_eq!(stopped.accumulated_minutes(), 10);

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 10);
    assert_eq!(stats.sessions_completed, 0);
    assert_eq!(stats.points_earned, 0);
}

#[tokio::test]
async fn paused_time_is_not_counted() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(10));
    h.tracker.pause_session(session.id).await.unwrap();
    h.clock.advance(Duration::minutes(30));
    h.tracker.resume_session(session.id).await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let done = h.tracker.complete_session(session.id).await.unwrap();

    assert_eq!(done.accumulated_minutes(), 15);
    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 15);
    assert_eq!(stats.points_earned, 15);
}

#[tokio::test]
async fn transitions_are_strict() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Pomodoro))
        .await
        .unwrap();

    assert!(matches!(
        h.tracker.resume_session(session.id).await,
        Err(PortError::InvalidState(_))
    ));
    h.tracker.pause_session(session.id).await.unwrap();
    assert!(matches!(
        h.tracker.pause_session(session.id).await,
        Err(PortError::InvalidState(_))
    ));
    assert!(matches!(
        h.tracker.record_cycle(session.id).await,
        Err(PortError::InvalidState(_))
    ));

    // Completing straight from paused is allowed.
    h.tracker.complete_session(session.id).await.unwrap();
    for result in [
        h.tracker.complete_session(session.id).await,
        h.tracker.stop_session(session.id).await,
        h.tracker.pause_session(session.id).await,
        h.tracker.resume_session(session.id).await,
    ] {
        assert!(matches!(result, Err(PortError::InvalidState(_))));
    }
}

#[tokio::test]
async fn terminal_sessions_do_not_double_count() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(20));
    h.tracker.stop_session(session.id).await.unwrap();
    let _ = h.tracker.complete_session(session.id).await;

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 20);
    assert_eq!(stats.sessions_completed, 0);
}

#[tokio::test]
async fn second_open_session_is_a_conflict_until_the_first_ends() {
    let h = harness();
    let first = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.tracker.pause_session(first.id).await.unwrap();

    let err = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Conflict(_)));

    h.tracker.stop_session(first.id).await.unwrap();
    assert!(h.tracker.active_session(h.user_id).await.unwrap().is_none());

    let second = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    let active = h.tracker.active_session(h.user_id).await.unwrap().unwrap();
    assert_eq!(active.id, second.id);
}

#[tokio::test]
async fn other_users_do_not_share_the_active_slot() {
    let h = harness();
    h.tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.tracker
        .start_session(new_session(Uuid::new_v4(), SessionType::Custom))
        .await
        .unwrap();
}

#[tokio::test]
async fn cycles_are_recorded_only_while_active() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Pomodoro))
        .await
        .unwrap();
    h.tracker.record_cycle(session.id).await.unwrap();
    let session = h.tracker.record_cycle(session.id).await.unwrap();
    assert_eq!(session.cycle_count, 2);
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn field_edits_are_refused_once_terminal() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();

    let edited = h
        .tracker
        .update_session(
            session.id,
            SessionPatch {
                subject: Some("Physics".to_string()),
                planned_duration: Some(50),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.subject, "Physics");
    assert_eq!(edited.planned_duration, 50);

    h.tracker.complete_session(session.id).await.unwrap();
    let err = h
        .tracker
        .update_session(
            session.id,
            SessionPatch {
                topic: Some("Optics".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidState(_)));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = harness();
    assert!(matches!(
        h.tracker.pause_session(Uuid::new_v4()).await,
        Err(PortError::NotFound(_))
    ));
}

//=========================================================================================
// Task ledger
//=========================================================================================

#[tokio::test]
async fn completing_a_task_twice_is_idempotent() {
    let h = harness();
    let task = h.tracker.create_task(new_task(h.user_id, "Lab report")).await.unwrap();

    let first = h.tracker.complete_task(task.id).await.unwrap();
    let second = h.tracker.complete_task(task.id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(second.status, TaskStatus::Completed);

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.points_earned, 10);
}

#[tokio::test]
async fn tasks_are_listed_newest_first() {
    let h = harness();
    let older = h.tracker.create_task(new_task(h.user_id, "Older")).await.unwrap();
    h.clock.advance(Duration::seconds(1));
    let newer = h.tracker.create_task(new_task(h.user_id, "Newer")).await.unwrap();

    let listed: Vec<Uuid> = h
        .tracker
        .list_tasks(h.user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(listed, vec![newer.id, older.id]);
}

#[tokio::test]
async fn deleting_a_completed_task_keeps_its_credit() {
    let h = harness();
    let task = h.tracker.create_task(new_task(h.user_id, "Flashcards")).await.unwrap();
    h.tracker.complete_task(task.id).await.unwrap();

    h.tracker.delete_task(task.id).await.unwrap();
    assert!(h.tracker.list_tasks(h.user_id).await.unwrap().is_empty());
    assert!(matches!(
        h.tracker.get_task(task.id).await,
        Err(PortError::NotFound(_))
    ));
    assert!(matches!(
        h.tracker.delete_task(task.id).await,
        Err(PortError::NotFound(_))
    ));

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.tasks_completed, 1);
}

#[tokio::test]
async fn reopened_tasks_count_again_when_recompleted() {
    let h = harness();
    let task = h.tracker.create_task(new_task(h.user_id, "Essay")).await.unwrap();
    h.tracker.complete_task(task.id).await.unwrap();
    let reopened = h.tracker.reopen_task(task.id).await.unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert_eq!(reopened.completed_at, None);

    h.tracker
        .update_task(
            task.id,
            TaskPatch {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().tasks_completed, 2);
}

#[tokio::test]
async fn task_patch_edits_fields_without_touching_stats() {
    let h = harness();
    let task = h.tracker.create_task(new_task(h.user_id, "Revise")).await.unwrap();
    let patched = h
        .tracker
        .update_task(
            task.id,
            TaskPatch {
                title: Some("Revise chapter 3".to_string()),
                priority: Some(TaskPriority::Low),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.title, "Revise chapter 3");
    assert_eq!(patched.priority, TaskPriority::Low);
    assert_eq!(patched.status, TaskStatus::Pending);
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().tasks_completed, 0);
}

//=========================================================================================
// Statistics
//=========================================================================================

#[tokio::test]
async fn first_read_creates_zeroed_stats() {
    let h = harness();
    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 0);
    assert_eq!(stats.points_earned, 0);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(stats.productivity_score, 0);
    assert_eq!(stats.last_active_date, None);
}

#[tokio::test]
async fn streak_follows_consecutive_days() {
    let h = harness();
    for title in ["day one", "day one again"] {
        let task = h.tracker.create_task(new_task(h.user_id, title)).await.unwrap();
        h.tracker.complete_task(task.id).await.unwrap();
    }
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().current_streak, 1);

    h.clock.advance(Duration::days(1));
    let task = h.tracker.create_task(new_task(h.user_id, "day two")).await.unwrap();
    h.tracker.complete_task(task.id).await.unwrap();
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().current_streak, 2);

    h.clock.advance(Duration::days(3));
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(5));
    h.tracker.complete_session(session.id).await.unwrap();
    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.today_study_minutes, 5);
    assert_eq!(stats.today_tasks_completed, 0);
}

#[tokio::test]
async fn productivity_score_reflects_today() {
    let h = harness();
    let done = h.tracker.create_task(new_task(h.user_id, "done")).await.unwrap();
    h.tracker.create_task(new_task(h.user_id, "pending")).await.unwrap();
    h.tracker.complete_task(done.id).await.unwrap();

    // No study time yet, half of the tasks done: 40 * 1/2.
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().productivity_score, 20);

    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(240));
    h.tracker.complete_session(session.id).await.unwrap();
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().productivity_score, 80);
}

#[tokio::test]
async fn study_summary_is_bounded() {
    let h = harness();
    for _ in 0..(MAX_SUMMARY_SESSIONS + 2) {
        let session = h
            .tracker
            .start_session(new_session(h.user_id, SessionType::Pomodoro))
            .await
            .unwrap();
        h.clock.advance(Duration::minutes(1));
        h.tracker.complete_session(session.id).await.unwrap();
    }
    h.tracker.create_task(new_task(h.user_id, "summarised")).await.unwrap();

    let summary = h.tracker.study_summary(h.user_id).await.unwrap();
    assert_eq!(summary.sessions.len(), MAX_SUMMARY_SESSIONS);
    assert_eq!(summary.tasks.len(), 1);
    assert_eq!(summary.tasks[0].title, "summarised");
}

//=========================================================================================
// Concurrency
//=========================================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_leave_exactly_one_open_session() {
    let h = harness();
    let attempts = (0..16).map(|_| {
        let tracker = h.tracker.clone();
        let user_id = h.user_id;
        tokio::spawn(async move {
            tracker
                .start_session(new_session(user_id, SessionType::Custom))
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let started = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(PortError::Conflict(_))))
        .count();
    assert_eq!(started, 1);
    assert_eq!(conflicts, results.len() - 1);
    assert_eq!(h.tracker.list_sessions(h.user_id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_cycles_are_never_lost() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Pomodoro))
        .await
        .unwrap();

    let attempts = (0..12).map(|_| {
        let tracker = h.tracker.clone();
        tokio::spawn(async move { tracker.record_cycle(session.id).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let applied = results.iter().filter(|r| r.is_ok()).count() as u32;
    assert!(results
        .iter()
        .all(|r| r.is_ok() || matches!(r, Err(PortError::Conflict(_)))));
    let stored = h.tracker.get_session(session.id).await.unwrap();
    assert_eq!(stored.cycle_count, applied);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_racing_cycles_both_land() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Pomodoro))
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.record_cycle(session.id).await }
        }),
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.record_cycle(session.id).await }
        }),
    );
    first.unwrap().unwrap();
    second.unwrap().unwrap();

    let stored = h.tracker.get_session(session.id).await.unwrap();
    assert_eq!(stored.cycle_count, 2);
    assert_eq!(stored.version, session.version + 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_pauses_yield_one_success() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    h.clock.advance(Duration::minutes(5));

    let attempts = (0..8).map(|_| {
        let tracker = h.tracker.clone();
        tokio::spawn(async move { tracker.pause_session(session.id).await })
    });
    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let paused = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(PortError::InvalidState(_))))
        .count();
    assert_eq!(paused, 1);
    assert_eq!(refused, 7);

    let stored = h.tracker.get_session(session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Paused);
    assert_eq!(stored.accumulated_seconds, 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_session_and_task_completions_both_reach_stats() {
    let h = harness();
    let session = h
        .tracker
        .start_session(new_session(h.user_id, SessionType::Custom))
        .await
        .unwrap();
    let task = h.tracker.create_task(new_task(h.user_id, "race")).await.unwrap();
    h.clock.advance(Duration::minutes(30));

    let (session_result, task_result) = tokio::join!(
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.complete_session(session.id).await }
        }),
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.complete_task(task.id).await }
        }),
    );
    session_result.unwrap().unwrap();
    task_result.unwrap().unwrap();

    let stats = h.tracker.stats(h.user_id).await.unwrap();
    assert_eq!(stats.total_study_time, 30);
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.points_earned, 30 + 10);
}

//=========================================================================================
// Doubt board
//=========================================================================================

fn new_doubt(user_id: Uuid) -> NewDoubt {
    NewDoubt {
        user_id,
        title: "Le Chatelier's principle".to_string(),
        description: "Why does adding heat shift an endothermic equilibrium?".to_string(),
        subject: "Chemistry".to_string(),
        tags: vec!["equilibrium".to_string()],
        is_anonymous: false,
    }
}

fn reply(doubt_id: Uuid, user_id: Uuid) -> NewDoubtAnswer {
    NewDoubtAnswer {
        doubt_id,
        user_id,
        content: "Treat heat as a reactant.".to_string(),
    }
}

#[tokio::test]
async fn accepted_answer_credits_its_author_once() {
    let h = harness();
    let helper = Uuid::new_v4();
    let doubt = h.tracker.post_doubt(new_doubt(h.user_id), None).await.unwrap();
    let answer = h.tracker.answer_doubt(reply(doubt.id, helper)).await.unwrap();
    assert_eq!(
        h.tracker.get_doubt(doubt.id).await.unwrap().status,
        DoubtStatus::InProgress
    );

    h.tracker.accept_answer(answer.id).await.unwrap();
    h.tracker.accept_answer(answer.id).await.unwrap();

    assert_eq!(h.tracker.get_doubt(doubt.id).await.unwrap().status, DoubtStatus::Solved);
    let stats = h.tracker.stats(helper).await.unwrap();
    assert_eq!(stats.doubts_solved, 1);
    assert_eq!(stats.points_earned, DEFAULT_DOUBT_BONUS);
    assert_eq!(stats.current_streak, 0);
    assert_eq!(h.tracker.stats(h.user_id).await.unwrap().doubts_solved, 0);
}

#[tokio::test]
async fn upvotes_survive_status_changes() {
    let h = harness();
    let doubt = h.tracker.post_doubt(new_doubt(h.user_id), None).await.unwrap();
    h.tracker.upvote_doubt(doubt.id).await.unwrap();
    h.tracker.upvote_doubt(doubt.id).await.unwrap();
    h.tracker
        .answer_doubt(reply(doubt.id, Uuid::new_v4()))
        .await
        .unwrap();

    let stored = h.tracker.get_doubt(doubt.id).await.unwrap();
    assert_eq!(stored.upvotes, 2);
    assert_eq!(stored.status, DoubtStatus::InProgress);
}

struct FailingTutor;

#[async_trait]
impl TutorService for FailingTutor {
    async fn answer_doubt(&self, _doubt: &Doubt) -> PortResult<String> {
        Err(PortError::Gateway("model overloaded".to_string()))
    }
}

struct EchoTutor;

#[async_trait]
impl TutorService for EchoTutor {
    async fn answer_doubt(&self, doubt: &Doubt) -> PortResult<String> {
        Ok(format!("  Think about {}.  ", doubt.title))
    }
}

#[tokio::test]
async fn tutor_failure_keeps_the_doubt_without_a_draft() {
    let h = harness();
    let doubt = h
        .tracker
        .post_doubt(new_doubt(h.user_id), Some(&FailingTutor))
        .await
        .unwrap();
    assert_eq!(doubt.ai_answer, None);
    assert_eq!(h.tracker.get_doubt(doubt.id).await.unwrap().version, 0);

    let drafted = h
        .tracker
        .post_doubt(new_doubt(h.user_id), Some(&EchoTutor))
        .await
        .unwrap();
    assert_eq!(
        drafted.ai_answer.as_deref(),
        Some("Think about Le Chatelier's principle.")
    );
    assert_eq!(h.tracker.get_doubt(drafted.id).await.unwrap(), drafted);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_accepts_of_one_answer_count_once() {
    let h = harness();
    let helper = Uuid::new_v4();
    let doubt = h.tracker.post_doubt(new_doubt(h.user_id), None).await.unwrap();
    let answer = h.tracker.answer_doubt(reply(doubt.id, helper)).await.unwrap();

    let attempts = (0..6).map(|_| {
        let tracker = h.tracker.clone();
        tokio::spawn(async move { tracker.accept_answer(answer.id).await })
    });
    for joined in futures::future::join_all(attempts).await {
        assert!(joined.unwrap().unwrap().is_accepted);
    }
    assert_eq!(h.tracker.stats(helper).await.unwrap().doubts_solved, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_accepts_of_rival_answers_pick_one() {
    let h = harness();
    let doubt = h.tracker.post_doubt(new_doubt(h.user_id), None).await.unwrap();
    let first = h
        .tracker
        .answer_doubt(reply(doubt.id, Uuid::new_v4()))
        .await
        .unwrap();
    let second = h
        .tracker
        .answer_doubt(reply(doubt.id, Uuid::new_v4()))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.accept_answer(first.id).await }
        }),
        tokio::spawn({
            let tracker = h.tracker.clone();
            async move { tracker.accept_answer(second.id).await }
        }),
    );
    let results = [a.unwrap(), b.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(PortError::InvalidState(_)))));

    let answers = h.tracker.list_answers(doubt.id).await.unwrap();
    assert_eq!(answers.iter().filter(|a| a.is_accepted).count(), 1);
}
