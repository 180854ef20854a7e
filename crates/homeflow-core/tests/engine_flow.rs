//! End-to-end engine behavior over the in-memory backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use homeflow_core::calendar::offset_from_minutes;
use homeflow_core::store::memory::ops;
use homeflow_core::{
    Barrier, CompleteTask, CoreError, CustomTaskDraft, CustomTaskPatch, EffortLevel, EngineSettings,
    FixedSequence, ImpactLevel, Intention, MemoryStore, Mood, RecommendationEngine, Room, RoomPriority,
    StoreError, Stores, Task, TaskCategory, TimeOfDay, UserState,
};

const USER: &str = "alice";

fn now() -> DateTime<Utc> {
    // Wednesday
    Utc.with_ymd_and_hms(2024, 6, 12, 9, 30, 0).unwrap()
}

fn catalog() -> Vec<Task> {
    vec![
        Task::new("make_bed", "Make the bed", TaskCategory::Organizing, 2, EffortLevel::Micro, ImpactLevel::High)
            .in_room("bedroom")
            .micro(),
        Task::new("dishes", "Wash the dishes", TaskCategory::Cleaning, 10, EffortLevel::Low, ImpactLevel::High)
            .in_room("kitchen"),
        Task::new("closet", "Organize closet", TaskCategory::Organizing, 15, EffortLevel::Medium, ImpactLevel::High)
            .in_room("bedroom")
            .with_decisions()
            .with_movement(),
        Task::new("towels", "Straighten towels", TaskCategory::Organizing, 2, EffortLevel::Micro, ImpactLevel::Low)
            .in_room("bathroom")
            .micro(),
    ]
}

fn engine_with(store: Arc<MemoryStore>) -> RecommendationEngine {
    let settings = EngineSettings::default().with_offset(offset_from_minutes(0));
    RecommendationEngine::new(Stores::from_backend(store), settings)
        .with_random(Box::new(FixedSequence::new(vec![1])))
}

fn setup() -> (Arc<MemoryStore>, RecommendationEngine) {
    let store = Arc::new(MemoryStore::with_catalog(catalog()));
    let engine = engine_with(store.clone());
    (store, engine)
}

async fn do_task(engine: &RecommendationEngine, task: &str, at: DateTime<Utc>, before: Mood, after: Mood, minutes: u32) {
    let log = engine.start_task(USER, task, before, None, at).await.unwrap();
    engine
        .complete_task(
            USER,
            CompleteTask {
                log_id: log.id,
                mood_after: after,
                actual_minutes: Some(minutes),
            },
            at + Duration::minutes(minutes as i64),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn overwhelmed_gets_only_micro_tasks_with_bonus() {
    let (_, engine) = setup();
    let rec = engine
        .recommend(USER, &UserState::new(Intention::Overwhelmed), now())
        .await
        .unwrap();

    assert_eq!(rec.strategy.name, "micro_activation");
    let ids: Vec<_> = rec.tasks.iter().map(|s| s.task.id.as_str()).collect();
    assert_eq!(ids, vec!["make_bed", "towels"]);
    assert!(rec.tasks[0]
        .terms
        .iter()
        .any(|t| t.name == "overwhelmed_micro" && t.points == 15.0));
}

#[tokio::test]
async fn room_priority_reorders_candidates() {
    let (_, engine) = setup();
    engine
        .upsert_room(&Room::new(USER, "bathroom", RoomPriority::High))
        .await
        .unwrap();

    let rec = engine
        .recommend(USER, &UserState::new(Intention::Overwhelmed), now())
        .await
        .unwrap();
    // towels: 15 + 20 = 35 beats make_bed: 15 + 15 = 30
    assert_eq!(rec.tasks[0].task.id, "towels");
}

#[tokio::test]
async fn empty_candidates_is_not_an_error() {
    let (_, engine) = setup();
    let anxious = UserState::new(Intention::HardToStart).with_barrier(Barrier::Anxiety);
    let rec = engine.recommend(USER, &anxious, now()).await.unwrap();
    assert!(rec.tasks.is_empty());
}

#[tokio::test]
async fn completion_updates_points_streak_and_progress() {
    let (_, engine) = setup();
    let yesterday = now() - Duration::days(1);
    do_task(&engine, "make_bed", yesterday, Mood::Neutral, Mood::Good, 2).await;

    let log = engine
        .start_task(USER, "dishes", Mood::Bad, Some(Intention::HaveEnergy), now())
        .await
        .unwrap();
    let outcome = engine
        .complete_task(
            USER,
            CompleteTask {
                log_id: log.id.clone(),
                mood_after: Mood::Good,
                actual_minutes: Some(8),
            },
            now() + Duration::minutes(8),
        )
        .await
        .unwrap();

    assert_eq!(outcome.points, 27);
    assert_eq!(outcome.mood_delta, 2);
    assert_eq!(outcome.current_streak, 2);
    assert_eq!(outcome.longest_streak, 2);
    assert_eq!(outcome.total_tasks_completed, 2);

    let progress = engine.progress(USER).await.unwrap();
    assert_eq!(progress.high_impact_tasks[0].task_id, "dishes");
    assert_eq!(progress.last_activity, Some(now() + Duration::minutes(8)));

    assert_eq!(engine.completed_today(USER, now()).await.unwrap(), 1);
    assert!(engine.has_completed_today(USER, now()).await.unwrap());

    let weekly = engine.weekly_progress(USER, now()).await.unwrap();
    assert_eq!(weekly.weekly_points, outcome.weekly_points);
    assert!(weekly.weekly_points >= 27);
}

#[tokio::test]
async fn third_morning_success_sets_best_time() {
    let (_, engine) = setup();
    for day in 0..2 {
        do_task(&engine, "make_bed", now() - Duration::days(day + 1), Mood::Neutral, Mood::Neutral, 2).await;
    }
    assert_eq!(engine.patterns(USER).await.unwrap().best_time_of_day, None);

    do_task(&engine, "towels", now(), Mood::Bad, Mood::Good, 2).await;
    let patterns = engine.patterns(USER).await.unwrap();
    assert_eq!(patterns.best_time_of_day, Some(TimeOfDay::Morning));
    assert_eq!(patterns.task_durations, vec![2, 2, 2]);
}

#[tokio::test]
async fn unknown_or_foreign_log_is_not_found() {
    let (_, engine) = setup();
    let missing = engine
        .complete_task(
            USER,
            CompleteTask {
                log_id: "nope".into(),
                mood_after: Mood::Good,
                actual_minutes: None,
            },
            now(),
        )
        .await
        .unwrap_err();
    assert_eq!(missing.to_string(), "activity log not found: nope");

    let bobs = engine.start_task("bob", "dishes", Mood::Bad, None, now()).await.unwrap();
    let foreign = engine
        .complete_task(
            USER,
            CompleteTask {
                log_id: bobs.id,
                mood_after: Mood::Good,
                actual_minutes: None,
            },
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(foreign, CoreError::ActivityLogNotFound(_)));
}

#[tokio::test]
async fn closing_twice_is_rejected() {
    let (_, engine) = setup();
    let log = engine.start_task(USER, "dishes", Mood::Bad, None, now()).await.unwrap();
    let request = CompleteTask {
        log_id: log.id,
        mood_after: Mood::Good,
        actual_minutes: Some(5),
    };
    engine.complete_task(USER, request.clone(), now()).await.unwrap();
    let err = engine.complete_task(USER, request, now()).await.unwrap_err();
    assert!(matches!(err, CoreError::LogAlreadyCompleted(_)));
    assert_eq!(engine.progress(USER).await.unwrap().total_tasks_completed, 1);
}

#[tokio::test]
async fn unknown_task_cannot_be_started() {
    let (_, engine) = setup();
    let err = engine
        .start_task(USER, "ghost", Mood::Bad, None, now())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::TaskNotFound(_)));
}

fn close(log_id: &str) -> CompleteTask {
    CompleteTask {
        log_id: log_id.to_string(),
        mood_after: Mood::Good,
        actual_minutes: Some(8),
    }
}

#[tokio::test]
async fn pattern_store_failure_credits_nothing_and_can_be_retried() {
    let (store, engine) = setup();
    let log = engine.start_task(USER, "dishes", Mood::Bad, None, now()).await.unwrap();
    store.fail_on(ops::PATTERNS_REPLACE);

    let err = engine.complete_task(USER, close(&log.id), now()).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));

    store.clear_failures();
    let progress = engine.progress(USER).await.unwrap();
    assert_eq!(progress.total_tasks_completed, 0);
    assert!(progress.high_impact_tasks.is_empty());
    assert_eq!(engine.weekly_progress(USER, now()).await.unwrap().weekly_points, 0);
    assert_eq!(engine.current_streak(USER, now()).await.unwrap(), 0);
    assert_eq!(engine.completed_today(USER, now()).await.unwrap(), 0);

    let outcome = engine.complete_task(USER, close(&log.id), now()).await.unwrap();
    assert_eq!(outcome.points, 27);
    assert_eq!(outcome.total_tasks_completed, 1);
    assert_eq!(outcome.weekly_points, 27);
    assert_eq!(engine.weekly_progress(USER, now()).await.unwrap().weekly_points, 27);
    assert_eq!(engine.patterns(USER).await.unwrap().total_points_earned, 27);
}

#[tokio::test]
async fn progress_failure_retry_does_not_learn_twice() {
    let (store, engine) = setup();
    let log = engine.start_task(USER, "dishes", Mood::Bad, None, now()).await.unwrap();
    store.fail_on(ops::PROGRESS_UPDATE);

    let err = engine.complete_task(USER, close(&log.id), now()).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));
    assert_eq!(engine.completed_today(USER, now()).await.unwrap(), 0);

    store.clear_failures();
    let outcome = engine.complete_task(USER, close(&log.id), now()).await.unwrap();
    assert_eq!(outcome.total_tasks_completed, 1);

    let patterns = engine.patterns(USER).await.unwrap();
    assert_eq!(patterns.task_durations, vec![8]);
    assert_eq!(patterns.successful_time_slots.morning, 1);
    assert_eq!(patterns.total_points_earned, 27);
}

#[tokio::test]
async fn log_close_failure_retry_does_not_double_count() {
    let (store, engine) = setup();
    let log = engine.start_task(USER, "dishes", Mood::Bad, None, now()).await.unwrap();
    store.fail_on(ops::LOG_UPDATE);

    let err = engine.complete_task(USER, close(&log.id), now()).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::Unavailable(_))));

    store.clear_failures();
    let outcome = engine.complete_task(USER, close(&log.id), now()).await.unwrap();
    assert_eq!(outcome.points, 27);
    assert_eq!(outcome.total_tasks_completed, 1);
    assert_eq!(outcome.weekly_points, 27);
    assert_eq!(outcome.current_streak, 1);

    let progress = engine.progress(USER).await.unwrap();
    assert_eq!(progress.high_impact_for("dishes").unwrap().times_completed, 1);
    assert_eq!(engine.patterns(USER).await.unwrap().task_durations.len(), 1);
    assert_eq!(engine.completed_today(USER, now()).await.unwrap(), 1);

    let err = engine.complete_task(USER, close(&log.id), now()).await.unwrap_err();
    assert!(matches!(err, CoreError::LogAlreadyCompleted(_)));
}

#[tokio::test]
async fn catalog_failure_surfaces_from_recommend() {
    let (store, engine) = setup();
    store.fail_on(ops::CATALOG_GET_ALL);
    let err = engine
        .recommend(USER, &UserState::new(Intention::NeedPlanning), now())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
}

#[tokio::test]
async fn concurrent_completions_do_not_lose_updates() {
    let (_, engine) = setup();
    let engine = Arc::new(engine);

    let mut logs = Vec::new();
    for i in 0..8 {
        let task = if i % 2 == 0 { "dishes" } else { "make_bed" };
        let log = engine
            .start_task(USER, task, Mood::VeryBad, None, now() + Duration::minutes(i))
            .await
            .unwrap();
        logs.push(log.id);
    }

    let handles: Vec<_> = logs
        .into_iter()
        .map(|log_id| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .complete_task(
                        USER,
                        CompleteTask {
                            log_id,
                            mood_after: Mood::Good,
                            actual_minutes: Some(3),
                        },
                        now() + Duration::minutes(30),
                    )
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let progress = engine.progress(USER).await.unwrap();
    assert_eq!(progress.total_tasks_completed, 8);
    let dishes = progress.high_impact_for("dishes").unwrap();
    let bed = progress.high_impact_for("make_bed").unwrap();
    assert_eq!(dishes.times_completed + bed.times_completed, 8);
    assert_eq!(engine.patterns(USER).await.unwrap().task_durations.len(), 8);
}

#[tokio::test]
async fn tiny_task_uses_injected_random_source() {
    let (_, engine) = setup();
    // tiny set is [make_bed, towels]; the fixed source yields index 1
    let task = engine.tiny_task(USER).await.unwrap().unwrap();
    assert_eq!(task.id, "towels");

    let empty = engine_with(Arc::new(MemoryStore::new()));
    assert!(empty.tiny_task(USER).await.unwrap().is_none());
}

#[tokio::test]
async fn custom_tasks_are_owner_only_and_self_correct() {
    let (_, engine) = setup();
    let draft = CustomTaskDraft {
        title: "Water the plants".into(),
        description: "carry the can to the balcony".into(),
        room: None,
        category: TaskCategory::Maintenance,
        estimated_minutes: 10,
        steps: vec![],
        intensity_levels: None,
    };
    let task = engine.create_custom_task(USER, draft, now()).await.unwrap();
    assert!(task.requires_movement);

    assert!(engine.tasks_for(USER).await.unwrap().iter().any(|t| t.id == task.id));
    assert!(!engine.tasks_for("bob").await.unwrap().iter().any(|t| t.id == task.id));

    let denied = engine
        .update_custom_task("bob", &task.id, CustomTaskPatch::default(), now())
        .await
        .unwrap_err();
    assert!(matches!(denied, CoreError::NotAuthorized { .. }));
    assert!(matches!(
        engine.delete_custom_task("bob", &task.id).await,
        Err(CoreError::NotAuthorized { .. })
    ));
    assert!(matches!(
        engine.start_task("bob", &task.id, Mood::Bad, None, now()).await,
        Err(CoreError::TaskNotFound(_))
    ));

    for (i, minutes) in [6, 7, 8].into_iter().enumerate() {
        do_task(&engine, &task.id, now() + Duration::hours(i as i64), Mood::Neutral, Mood::Neutral, minutes).await;
    }
    let updated = engine.find_task(USER, &task.id).await.unwrap();
    assert_eq!(updated.estimated_minutes, 7);
    assert_eq!(updated.custom.unwrap().usage_count, 3);

    engine.delete_custom_task(USER, &task.id).await.unwrap();
    assert!(engine.list_custom_tasks(USER).await.unwrap().is_empty());
}

#[tokio::test]
async fn weekly_goal_and_insights() {
    let (_, engine) = setup();
    assert!(engine.set_weekly_goal(USER, 0).await.is_err());
    let progress = engine.set_weekly_goal(USER, 50).await.unwrap();
    assert_eq!(progress.weekly_goal, 50);

    for day in 0..3 {
        do_task(&engine, "dishes", now() - Duration::days(2 - day), Mood::Bad, Mood::Good, 8).await;
    }
    let weekly = engine.weekly_progress(USER, now()).await.unwrap();
    // Monday through Wednesday: 27 points each, capped at 100%
    assert_eq!(weekly.weekly_points, 81);
    assert_eq!(weekly.percentage, 100.0);

    let insights = engine.insights(USER).await.unwrap();
    assert!(insights.iter().any(|i| i.message.contains("Wash the dishes")));
    assert!(insights.iter().any(|i| i.message.starts_with("3 days in a row")));
    assert_eq!(engine.current_streak(USER, now()).await.unwrap(), 3);
}

#[tokio::test]
async fn seeding_only_fills_an_empty_catalog() {
    let engine = engine_with(Arc::new(MemoryStore::new()));
    let inserted = engine.seed_if_empty().await.unwrap();
    assert!(inserted > 0);
    assert_eq!(engine.seed_if_empty().await.unwrap(), 0);
}
