//! Candidate scoring.
//!
//! Every candidate gets an additive score built from independent terms.
//! Each term is recorded so a recommendation can explain itself.
//!
//! ```text
//! mood history     min(avg_improvement * 10, 30)      positive history only
//! room priority    high +20, medium +10
//! room staleness   min(days_since_serviced * 2, 10)
//! task impact      high +15, medium +8
//! time fit         max(10 - |estimate - budget / 2|, 0)   budget given only
//! recency          -20 under 24h, -10 under 72h
//! overwhelmed      +15 for micro-tasks
//! have energy      +10 for high-impact tasks
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::ActivityLog;
use crate::progress::UserProgress;
use crate::room::{Room, RoomPriority};
use crate::strategy::{Intention, TimeBudget, UserState};
use crate::task::{ImpactLevel, Task};

/// Mood-history contribution above which the task earns a reason line.
const REASON_THRESHOLD: f64 = 15.0;

/// One named contribution to a task's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub points: f64,
}

/// A candidate with its total score and the terms that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTask {
    pub task: Task,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub terms: Vec<ScoreTerm>,
}

impl ScoredTask {
    fn new(task: Task) -> Self {
        Self {
            task,
            score: 0.0,
            reason: None,
            terms: Vec::new(),
        }
    }

    fn add(&mut self, name: &'static str, points: f64) {
        if points != 0.0 {
            self.score += points;
            self.terms.push(ScoreTerm { name, points });
        }
    }

    /// Term with the largest positive contribution.
    pub fn top_term(&self) -> Option<&ScoreTerm> {
        self.terms
            .iter()
            .filter(|t| t.points > 0.0)
            .max_by(|a, b| a.points.total_cmp(&b.points))
    }
}

/// Everything scoring reads besides the candidate itself.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub state: &'a UserState,
    pub rooms: &'a [Room],
    pub progress: &'a UserProgress,
    pub history: &'a [ActivityLog],
    pub now: DateTime<Utc>,
}

/// Score a single candidate.
pub fn score_task(task: &Task, ctx: &ScoringContext<'_>) -> ScoredTask {
    let mut scored = ScoredTask::new(task.clone());

    if let Some(entry) = ctx.progress.high_impact_for(&task.id) {
        if entry.avg_mood_improvement > 0.0 {
            let points = (entry.avg_mood_improvement * 10.0).min(30.0);
            scored.add("mood_history", points);
            if points > REASON_THRESHOLD {
                scored.reason = Some("This task usually makes you feel good".to_string());
            }
        }
    }

    if let Some(kind) = task.room.as_deref() {
        if let Some(room) = ctx.rooms.iter().find(|r| r.kind == kind) {
            let priority = match room.priority {
                RoomPriority::High => 20.0,
                RoomPriority::Medium => 10.0,
                RoomPriority::Low => 0.0,
            };
            scored.add("room_priority", priority);

            if let Some(days) = room.days_since_serviced(ctx.now) {
                scored.add("room_staleness", (days as f64 * 2.0).min(10.0));
            }
        }
    }

    let impact = match task.impact {
        ImpactLevel::High => 15.0,
        ImpactLevel::Medium => 8.0,
        ImpactLevel::Low => 0.0,
    };
    scored.add("impact", impact);

    if ctx.state.time_budget.is_some() {
        let budget = TimeBudget::max_minutes(ctx.state.time_budget) as f64;
        let distance = (task.estimated_minutes as f64 - budget / 2.0).abs();
        scored.add("time_fit", (10.0 - distance).max(0.0));
    }

    let last_done = ctx
        .history
        .iter()
        .filter(|log| log.completed && log.task_id == task.id)
        .map(|log| log.start_time)
        .max();
    if let Some(at) = last_done {
        let hours = (ctx.now - at).num_hours();
        if hours < 24 {
            scored.add("recency", -20.0);
        } else if hours < 72 {
            scored.add("recency", -10.0);
        }
    }

    if ctx.state.intention == Intention::Overwhelmed && task.is_micro_task {
        scored.add("overwhelmed_micro", 15.0);
    }

    if ctx.state.intention == Intention::HaveEnergy && task.impact == ImpactLevel::High {
        scored.add("energy_high_impact", 10.0);
    }

    scored
}

/// Score all candidates and sort descending. Equal scores keep input order.
pub fn score_tasks(candidates: &[Task], ctx: &ScoringContext<'_>) -> Vec<ScoredTask> {
    let mut scored: Vec<ScoredTask> = candidates.iter().map(|t| score_task(t, ctx)).collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Top `limit` scored candidates.
pub fn rank_tasks(candidates: &[Task], ctx: &ScoringContext<'_>, limit: usize) -> Vec<ScoredTask> {
    let mut ranked = score_tasks(candidates, ctx);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Mood;
    use crate::progress::{record_high_impact, DEFAULT_WEEKLY_GOAL};
    use crate::task::{EffortLevel, TaskCategory};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 12, 0, 0).unwrap()
    }

    fn term(scored: &ScoredTask, name: &str) -> Option<f64> {
        scored.terms.iter().find(|t| t.name == name).map(|t| t.points)
    }

    fn ctx<'a>(
        state: &'a UserState,
        rooms: &'a [Room],
        progress: &'a UserProgress,
        history: &'a [ActivityLog],
    ) -> ScoringContext<'a> {
        ScoringContext {
            state,
            rooms,
            progress,
            history,
            now: now(),
        }
    }

    #[test]
    fn overwhelmed_micro_bonus() {
        let task = Task::new("bed", "Make bed", TaskCategory::Organizing, 2, EffortLevel::Micro, ImpactLevel::Low)
            .micro();
        let state = UserState::new(Intention::Overwhelmed);
        let progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);
        let scored = score_task(&task, &ctx(&state, &[], &progress, &[]));
        assert_eq!(scored.score, 15.0);
        assert_eq!(term(&scored, "overwhelmed_micro"), Some(15.0));
    }

    #[test]
    fn room_priority_and_staleness() {
        let task = Task::new("dishes", "Dishes", TaskCategory::Cleaning, 10, EffortLevel::Low, ImpactLevel::Low)
            .in_room("kitchen");
        let mut room = Room::new("u", "kitchen", RoomPriority::High);
        room.last_serviced = Some(now() - Duration::days(3));
        let rooms = [room];
        let state = UserState::new(Intention::NeedPlanning);
        let progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);

        let scored = score_task(&task, &ctx(&state, &rooms, &progress, &[]));
        assert_eq!(term(&scored, "room_priority"), Some(20.0));
        assert_eq!(term(&scored, "room_staleness"), Some(6.0));
        assert_eq!(scored.score, 26.0);
    }

    #[test]
    fn mood_history_caps_and_gives_reason() {
        let task = Task::new("t", "T", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::Low);
        let mut progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);
        record_high_impact(&mut progress.high_impact_tasks, "t", 4.0);
        let state = UserState::new(Intention::NeedPlanning);

        let scored = score_task(&task, &ctx(&state, &[], &progress, &[]));
        assert_eq!(term(&scored, "mood_history"), Some(30.0));
        assert!(scored.reason.is_some());
    }

    #[test]
    fn time_fit_only_with_budget() {
        let task = Task::new("t", "T", TaskCategory::Cleaning, 8, EffortLevel::Low, ImpactLevel::Low);
        let progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);

        let without = UserState::new(Intention::HaveEnergy);
        assert_eq!(term(&score_task(&task, &ctx(&without, &[], &progress, &[])), "time_fit"), None);

        // budget 20 -> |8 - 10| = 2 -> 8
        let with = UserState::new(Intention::HaveEnergy).with_time_budget(TimeBudget::FifteenToTwenty);
        assert_eq!(term(&score_task(&task, &ctx(&with, &[], &progress, &[])), "time_fit"), Some(8.0));
    }

    #[test]
    fn recency_uses_latest_completion() {
        let task = Task::new("t", "T", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::Low);
        let progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);
        let state = UserState::new(Intention::NeedPlanning);

        let mut old = ActivityLog::start("u", "t", Mood::Neutral, None, now() - Duration::days(5));
        old.completed = true;
        let mut recent = ActivityLog::start("u", "t", Mood::Neutral, None, now() - Duration::hours(30));
        recent.completed = true;
        let open = ActivityLog::start("u", "t", Mood::Neutral, None, now() - Duration::hours(1));

        let history = [open, old, recent];
        let scored = score_task(&task, &ctx(&state, &[], &progress, &history));
        assert_eq!(term(&scored, "recency"), Some(-10.0));
    }

    #[test]
    fn ties_keep_candidate_order() {
        let a = Task::new("a", "A", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::Medium);
        let b = Task::new("b", "B", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::High);
        let c = Task::new("c", "C", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::Medium);
        let progress = UserProgress::new("u", DEFAULT_WEEKLY_GOAL);
        let state = UserState::new(Intention::NeedPlanning);

        let candidates = [a, b, c];
        let ranked = rank_tasks(&candidates, &ctx(&state, &[], &progress, &[]), 5);
        let ids: Vec<_> = ranked.iter().map(|s| s.task.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let top = rank_tasks(&candidates, &ctx(&state, &[], &progress, &[]), 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].task.id, "b");
    }
}
