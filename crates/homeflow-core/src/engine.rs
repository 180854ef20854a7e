//! Recommendation engine.
//!
//! Composes the pure pieces of the crate over the collaborator stores:
//!
//! - **recommend**: strategy selection, filtering and scoring
//! - **tiny_task**: one random micro-task for users who cannot choose
//! - **complete_task**: points, streak, patterns, progress, then log close
//!
//! The engine keeps no per-user state between calls. Completions for the same
//! user are serialized through an in-process lock. Across processes the
//! stores' version checks catch interleaved writes and the completion is
//! retried.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;

use crate::activity::{mood_delta, ActivityLog, LogCompletion, LogFilter, Mood};
use crate::calendar::{day_bounds, week_bounds};
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::filter::filter_tasks;
use crate::insights::{generate_insights, Insight};
use crate::patterns::{TimeOfDay, UserPatterns};
use crate::points::calculate_points;
use crate::progress::{record_high_impact, ProgressUpdate, UserProgress, WeeklyProgress};
use crate::random::{pick_tiny_task, PcgRandom, RandomSource};
use crate::room::Room;
use crate::scoring::{rank_tasks, ScoredTask, ScoringContext};
use crate::seed::default_catalog;
use crate::storage::Config;
use crate::store::Stores;
use crate::strategy::{select_strategy, Intention, Strategy, UserState};
use crate::streak::calculate_streak;
use crate::task::custom::{self, CustomTaskDraft, CustomTaskPatch};
use crate::task::Task;

/// Tunables the engine reads on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub recommendation_limit: usize,
    pub history_window: usize,
    pub weekly_goal: u32,
    pub offset: FixedOffset,
}

impl EngineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            recommendation_limit: config.engine.recommendation_limit,
            history_window: config.engine.history_window,
            weekly_goal: config.progress.weekly_goal,
            offset: config.engine.offset(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Ranked candidates plus the strategy that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub strategy: Strategy,
    pub tasks: Vec<ScoredTask>,
}

/// Input for closing an activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteTask {
    pub log_id: String,
    pub mood_after: Mood,
    /// Elapsed minutes; derived from the log's start time when absent
    pub actual_minutes: Option<u32>,
}

/// What the presentation layer shows after a completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    pub log_id: String,
    pub task_id: String,
    pub points: u32,
    pub mood_delta: i32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_points: u32,
    pub total_tasks_completed: u32,
    pub best_time_of_day: Option<TimeOfDay>,
    pub preferred_duration: Option<u32>,
}

/// Attempts made before a completion that keeps losing races gives up.
const MAX_COMPLETION_ATTEMPTS: u32 = 8;

/// Per-user async locks, created on demand and removed once nobody holds or
/// waits on them.
#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl UserLocks {
    fn map(&self) -> MutexGuard<'_, HashMap<String, Arc<tokio::sync::Mutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn acquire(&self, user_id: &str) -> UserLease<'_> {
        let lock = self.map().entry(user_id.to_string()).or_default().clone();
        let mut lease = UserLease {
            registry: self,
            user_id: user_id.to_string(),
            lock,
            guard: None,
        };
        lease.guard = Some(Arc::clone(&lease.lock).lock_owned().await);
        lease
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

/// Held for the duration of one user's completion.
struct UserLease<'a> {
    registry: &'a UserLocks,
    user_id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserLease<'_> {
    fn drop(&mut self) {
        let mut locks = self.registry.map();
        self.guard.take();
        // Only the registry and this lease still point at the lock.
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.user_id);
        }
    }
}

pub struct RecommendationEngine {
    stores: Stores,
    settings: EngineSettings,
    rng: Mutex<Box<dyn RandomSource>>,
    locks: UserLocks,
}

impl RecommendationEngine {
    pub fn new(stores: Stores, settings: EngineSettings) -> Self {
        Self {
            stores,
            settings,
            rng: Mutex::new(Box::new(PcgRandom::from_entropy())),
            locks: UserLocks::default(),
        }
    }

    /// Replace the random source used by [`RecommendationEngine::tiny_task`].
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Load the built-in library into an empty catalog. Returns the number
    /// of tasks inserted.
    pub async fn seed_if_empty(&self) -> Result<usize> {
        if !self.stores.catalog.get_all().await?.is_empty() {
            return Ok(0);
        }
        let catalog = default_catalog();
        self.stores.catalog.load(&catalog).await?;
        tracing::info!(count = catalog.len(), "seeded default task catalog");
        Ok(catalog.len())
    }

    /// Catalog tasks followed by the user's own tasks.
    pub async fn tasks_for(&self, user_id: &str) -> Result<Vec<Task>> {
        let mut tasks = self.stores.catalog.get_all().await?;
        tasks.extend(self.stores.custom_tasks.list_for_owner(user_id).await?);
        Ok(tasks)
    }

    /// Catalog task or one of the user's custom tasks.
    pub async fn find_task(&self, user_id: &str, task_id: &str) -> Result<Task> {
        if let Some(task) = self.stores.catalog.get_by_id(task_id).await? {
            return Ok(task);
        }
        match self.stores.custom_tasks.get(task_id).await? {
            Some(task) if custom::ensure_owner(&task, user_id).is_ok() => Ok(task),
            _ => Err(CoreError::TaskNotFound(task_id.to_string())),
        }
    }

    /// Rank tasks for the user's current state. No candidates is not an error.
    pub async fn recommend(&self, user_id: &str, state: &UserState, now: DateTime<Utc>) -> Result<Recommendation> {
        let strategy = select_strategy(state);

        let tasks = self.tasks_for(user_id).await?;
        let history = self
            .stores
            .logs
            .query_by_user(user_id, &LogFilter::Recent(self.settings.history_window))
            .await?;
        let rooms = self.stores.rooms.get_for_user(user_id).await?;
        let progress = self
            .stores
            .progress
            .get_or_create(user_id, self.settings.weekly_goal)
            .await?;

        let candidates = filter_tasks(&tasks, &strategy.filters, &history);
        let ctx = ScoringContext {
            state,
            rooms: &rooms,
            progress: &progress,
            history: &history,
            now,
        };
        let ranked = rank_tasks(&candidates, &ctx, self.settings.recommendation_limit);

        tracing::debug!(
            user_id,
            strategy = strategy.name,
            catalog = tasks.len(),
            candidates = candidates.len(),
            returned = ranked.len(),
            "recommendation computed"
        );

        Ok(Recommendation {
            strategy,
            tasks: ranked,
        })
    }

    /// One random tiny task, or `None` when nothing qualifies.
    pub async fn tiny_task(&self, user_id: &str) -> Result<Option<Task>> {
        let tasks = self.tasks_for(user_id).await?;
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(pick_tiny_task(&tasks, rng.as_mut()))
    }

    /// Open an activity log for a task the user is starting.
    pub async fn start_task(
        &self,
        user_id: &str,
        task_id: &str,
        mood_before: Mood,
        route: Option<Intention>,
        now: DateTime<Utc>,
    ) -> Result<ActivityLog> {
        let task = self.find_task(user_id, task_id).await?;
        let log = ActivityLog::start(user_id, &task.id, mood_before, route, now);
        self.stores.logs.append(&log).await?;
        tracing::info!(user_id, task_id = %task.id, log_id = %log.id, "task started");
        Ok(log)
    }

    /// Close a log and fold the outcome into streak, patterns and progress.
    ///
    /// Patterns and progress are written before the log is closed, and both
    /// remember which logs they already counted. After a store failure the
    /// log is still open, so calling again finishes the job without counting
    /// anything twice. A failure saving a custom task's usage statistics
    /// comes last and leaves the completion recorded.
    pub async fn complete_task(
        &self,
        user_id: &str,
        request: CompleteTask,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let _lease = self.locks.acquire(user_id).await;

        let mut attempt = 1;
        loop {
            match self.try_complete(user_id, &request, now).await {
                Err(CoreError::Store(StoreError::Conflict(record))) if attempt < MAX_COMPLETION_ATTEMPTS => {
                    tracing::debug!(user_id, log_id = %request.log_id, attempt, %record, "completion raced another writer, retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_complete(&self, user_id: &str, request: &CompleteTask, now: DateTime<Utc>) -> Result<CompletionOutcome> {
        let log = match self.stores.logs.get(&request.log_id).await? {
            Some(log) if log.user_id == user_id => log,
            _ => return Err(CoreError::ActivityLogNotFound(request.log_id.clone())),
        };
        if log.completed {
            return Err(CoreError::LogAlreadyCompleted(request.log_id.clone()));
        }
        let mut task = self.find_task(user_id, &log.task_id).await?;

        let actual_minutes = request
            .actual_minutes
            .unwrap_or_else(|| elapsed_minutes(log.start_time, now));
        let points = calculate_points(&task, Some(actual_minutes), Some(log.mood_before), Some(request.mood_after));
        let delta = mood_delta(log.mood_before, request.mood_after);

        let completion = LogCompletion {
            end_time: now,
            actual_minutes: Some(actual_minutes),
            mood_after: request.mood_after,
            points_earned: points,
        };
        let mut closed = log;
        closed.apply(&completion);

        let offset = self.settings.offset;
        let mut completed = self
            .stores
            .logs
            .query_by_user(user_id, &LogFilter::AllCompleted)
            .await?;
        completed.push(closed.clone());
        let streak = calculate_streak(&completed, now, &offset);

        let mut patterns = self.stores.patterns.get_or_create(user_id).await?;
        if patterns.learn(&closed, delta, points, &offset) {
            self.stores.patterns.replace(&patterns).await?;
        }

        let progress = self
            .stores
            .progress
            .get_or_create(user_id, self.settings.weekly_goal)
            .await?;
        let progress = if progress.has_applied(&closed.id) {
            progress
        } else {
            let mut high_impact = progress.high_impact_tasks.clone();
            record_high_impact(&mut high_impact, &task.id, delta as f64);

            let (week_start, week_end) = week_bounds(now, &offset);
            let this_week = LogFilter::CompletedBetween {
                start: week_start,
                end: week_end,
            };
            let mut weekly_points = self.points_this_week(user_id, now).await?;
            if this_week.matches(&closed) {
                weekly_points += points;
            }

            self.stores
                .progress
                .update(
                    user_id,
                    &ProgressUpdate {
                        current_streak: Some(streak),
                        longest_streak: Some(progress.longest_streak.max(streak)),
                        last_activity: Some(now),
                        total_tasks_completed: Some(progress.total_tasks_completed + 1),
                        weekly_points: Some(weekly_points),
                        high_impact_tasks: Some(high_impact),
                        applied_log: Some(closed.id.clone()),
                        expected_version: Some(progress.version),
                        ..Default::default()
                    },
                )
                .await?
        };

        if !self.stores.logs.update(&closed.id, &completion).await? {
            return Err(CoreError::ActivityLogNotFound(closed.id));
        }

        if custom::record_usage(&mut task, actual_minutes, now) {
            self.stores.custom_tasks.save(&task).await?;
        }

        tracing::info!(
            user_id,
            task_id = %task.id,
            points,
            mood_delta = delta,
            streak,
            "task completed"
        );

        Ok(CompletionOutcome {
            log_id: closed.id,
            task_id: task.id,
            points,
            mood_delta: delta,
            current_streak: progress.current_streak,
            longest_streak: progress.longest_streak,
            weekly_points: progress.weekly_points,
            total_tasks_completed: progress.total_tasks_completed,
            best_time_of_day: patterns.best_time_of_day,
            preferred_duration: patterns.preferred_duration,
        })
    }

    /// Sum of points earned by completions in the current Monday-start week.
    async fn points_this_week(&self, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
        let (start, end) = week_bounds(now, &self.settings.offset);
        let logs = self
            .stores
            .logs
            .query_by_user(user_id, &LogFilter::CompletedBetween { start, end })
            .await?;
        Ok(logs.iter().filter_map(|l| l.points_earned).sum())
    }

    pub async fn progress(&self, user_id: &str) -> Result<UserProgress> {
        Ok(self
            .stores
            .progress
            .get_or_create(user_id, self.settings.weekly_goal)
            .await?)
    }

    pub async fn patterns(&self, user_id: &str) -> Result<UserPatterns> {
        Ok(self.stores.patterns.get_or_create(user_id).await?)
    }

    /// Streak as of `now`, recomputed from the log history.
    pub async fn current_streak(&self, user_id: &str, now: DateTime<Utc>) -> Result<u32> {
        let completed = self
            .stores
            .logs
            .query_by_user(user_id, &LogFilter::AllCompleted)
            .await?;
        Ok(calculate_streak(&completed, now, &self.settings.offset))
    }

    /// Points this week against the user's goal.
    pub async fn weekly_progress(&self, user_id: &str, now: DateTime<Utc>) -> Result<WeeklyProgress> {
        let progress = self.progress(user_id).await?;
        let points = self.points_this_week(user_id, now).await?;
        Ok(WeeklyProgress::new(points, progress.weekly_goal))
    }

    pub async fn set_weekly_goal(&self, user_id: &str, goal: u32) -> Result<UserProgress> {
        if goal == 0 {
            return Err(ValidationError::InvalidValue {
                field: "weekly_goal".into(),
                message: "must be greater than zero".into(),
            }
            .into());
        }
        self.progress(user_id).await?;
        Ok(self
            .stores
            .progress
            .update(
                user_id,
                &ProgressUpdate {
                    weekly_goal: Some(goal),
                    ..Default::default()
                },
            )
            .await?)
    }

    /// Completed tasks started on the current local day.
    pub async fn completed_today(&self, user_id: &str, now: DateTime<Utc>) -> Result<usize> {
        let (start, end) = day_bounds(now, &self.settings.offset);
        Ok(self
            .stores
            .logs
            .query_by_user(user_id, &LogFilter::CompletedBetween { start, end })
            .await?
            .len())
    }

    pub async fn has_completed_today(&self, user_id: &str, now: DateTime<Utc>) -> Result<bool> {
        Ok(self.completed_today(user_id, now).await? > 0)
    }

    pub async fn insights(&self, user_id: &str) -> Result<Vec<Insight>> {
        let patterns = self.patterns(user_id).await?;
        let progress = self.progress(user_id).await?;
        let top_task = match progress.high_impact_tasks.first() {
            Some(entry) => match self.find_task(user_id, &entry.task_id).await {
                Ok(task) => Some(task),
                Err(CoreError::TaskNotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        Ok(generate_insights(&patterns, &progress, top_task.as_ref()))
    }

    pub async fn create_custom_task(&self, user_id: &str, draft: CustomTaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let task = custom::create_custom_task(user_id, draft, now)?;
        self.stores.custom_tasks.save(&task).await?;
        tracing::info!(user_id, task_id = %task.id, "custom task created");
        Ok(task)
    }

    pub async fn list_custom_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        Ok(self.stores.custom_tasks.list_for_owner(user_id).await?)
    }

    /// Edit a custom task. Only its owner may do so.
    pub async fn update_custom_task(
        &self,
        user_id: &str,
        task_id: &str,
        patch: CustomTaskPatch,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let mut task = self.owned_custom_task(user_id, task_id).await?;
        custom::apply_patch(&mut task, patch, now)?;
        self.stores.custom_tasks.save(&task).await?;
        Ok(task)
    }

    /// Delete a custom task. Only its owner may do so.
    pub async fn delete_custom_task(&self, user_id: &str, task_id: &str) -> Result<()> {
        self.owned_custom_task(user_id, task_id).await?;
        self.stores.custom_tasks.delete(task_id).await?;
        tracing::info!(user_id, task_id, "custom task deleted");
        Ok(())
    }

    async fn owned_custom_task(&self, user_id: &str, task_id: &str) -> Result<Task> {
        let task = self
            .stores
            .custom_tasks
            .get(task_id)
            .await?
            .ok_or_else(|| CoreError::TaskNotFound(task_id.to_string()))?;
        custom::ensure_owner(&task, user_id)?;
        Ok(task)
    }

    pub async fn rooms(&self, user_id: &str) -> Result<Vec<Room>> {
        Ok(self.stores.rooms.get_for_user(user_id).await?)
    }

    pub async fn upsert_room(&self, room: &Room) -> Result<()> {
        if room.kind.trim().is_empty() {
            return Err(ValidationError::EmptyField("kind".into()).into());
        }
        Ok(self.stores.rooms.upsert(room).await?)
    }

    /// Record work done in a room. Returns `false` for an unknown room.
    pub async fn mark_room_serviced(&self, user_id: &str, kind: &str, at: DateTime<Utc>) -> Result<bool> {
        Ok(self.stores.rooms.mark_serviced(user_id, kind, at).await?)
    }
}

/// Whole minutes between start and end, at least 1.
fn elapsed_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
    let seconds = (end - start).num_seconds().max(0);
    ((seconds as f64 / 60.0).round() as u32).max(1)
}
