//! # HomeFlow Core Library
//!
//! Adaptive household-task recommendation engine. Given a self-reported
//! state ("overwhelmed", "have energy", "hard to start"), it selects a
//! strategy, filters and scores the task catalog, and learns from each
//! completion to refine later suggestions and reward progress.
//!
//! ## Architecture
//!
//! - **Strategy / Filter / Scoring**: pure functions turning a [`UserState`]
//!   into ranked [`ScoredTask`]s
//! - **Streak / Points / Patterns**: pure calculators fed by completions
//! - **Stores**: async collaborator traits with in-memory and SQLite backends
//! - **Engine**: [`RecommendationEngine`] orchestrates the above, serializing
//!   completions per user
//!
//! Every operation that needs the current time takes it as a parameter.

pub mod activity;
pub mod calendar;
pub mod engine;
pub mod error;
pub mod filter;
pub mod insights;
pub mod patterns;
pub mod points;
pub mod progress;
pub mod random;
pub mod room;
pub mod scoring;
pub mod seed;
pub mod storage;
pub mod store;
pub mod strategy;
pub mod streak;
pub mod task;

pub use activity::{ActivityLog, LogCompletion, LogFilter, Mood};
pub use engine::{CompleteTask, CompletionOutcome, EngineSettings, Recommendation, RecommendationEngine};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use filter::filter_tasks;
pub use insights::{Insight, InsightKind};
pub use patterns::{TimeOfDay, UserPatterns};
pub use points::calculate_points;
pub use progress::{HighImpactTask, ProgressUpdate, UserProgress, WeeklyProgress};
pub use random::{FixedSequence, PcgRandom, RandomSource};
pub use room::{Room, RoomPriority};
pub use scoring::{ScoredTask, ScoringContext};
pub use storage::{Config, Database};
pub use store::{MemoryStore, Stores};
pub use strategy::{select_strategy, Barrier, Intention, Strategy, TimeBudget, UserState};
pub use streak::calculate_streak;
pub use task::custom::{CustomTaskDraft, CustomTaskPatch};
pub use task::{EffortLevel, ImpactLevel, IntensityTier, Task, TaskCategory};
