//! Collaborator contracts.
//!
//! The engine never touches persistence directly; it talks to these traits.
//! Two backends ship with the crate: [`MemoryStore`] for tests and
//! embedding, and [`crate::storage::Database`] backed by SQLite.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::activity::{ActivityLog, LogCompletion, LogFilter};
use crate::error::StoreError;
use crate::patterns::UserPatterns;
use crate::progress::{ProgressUpdate, UserProgress};
use crate::room::Room;
use crate::task::Task;

pub type StoreResult<T> = Result<T, StoreError>;

/// Read-only task library shared by all users.
#[async_trait]
pub trait TaskCatalog: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<Task>>;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Task>>;

    async fn get_by_room(&self, room: &str) -> StoreResult<Vec<Task>>;

    /// Insert catalog entries, replacing entries with the same id.
    async fn load(&self, tasks: &[Task]) -> StoreResult<()>;
}

/// User-authored tasks.
#[async_trait]
pub trait CustomTaskStore: Send + Sync {
    async fn get(&self, id: &str) -> StoreResult<Option<Task>>;

    async fn list_for_owner(&self, owner: &str) -> StoreResult<Vec<Task>>;

    /// Insert or replace by id.
    async fn save(&self, task: &Task) -> StoreResult<()>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

/// Per-user rooms.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    async fn get_for_user(&self, user_id: &str) -> StoreResult<Vec<Room>>;

    /// Insert or replace the user's room of the same kind.
    async fn upsert(&self, room: &Room) -> StoreResult<()>;

    /// Returns `false` when the user has no room of that kind.
    async fn mark_serviced(&self, user_id: &str, kind: &str, at: DateTime<Utc>) -> StoreResult<bool>;
}

/// Append-only activity history.
#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    /// Store a new log and return its id.
    async fn append(&self, log: &ActivityLog) -> StoreResult<String>;

    async fn get(&self, id: &str) -> StoreResult<Option<ActivityLog>>;

    /// Apply the completion fields. Returns `false` for an unknown id.
    async fn update(&self, id: &str, completion: &LogCompletion) -> StoreResult<bool>;

    /// Logs for one user, newest first.
    async fn query_by_user(&self, user_id: &str, filter: &LogFilter) -> StoreResult<Vec<ActivityLog>>;
}

/// Per-user progress record, created on first access.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_or_create(&self, user_id: &str, weekly_goal: u32) -> StoreResult<UserProgress>;

    /// Apply a partial update and return the stored record.
    ///
    /// Fails with [`StoreError::Conflict`] when `update.expected_version`
    /// is set and no longer matches.
    async fn update(&self, user_id: &str, update: &ProgressUpdate) -> StoreResult<UserProgress>;
}

/// Per-user pattern record, created on first access.
#[async_trait]
pub trait PatternStore: Send + Sync {
    async fn get_or_create(&self, user_id: &str) -> StoreResult<UserPatterns>;

    /// Replace the whole record if its version still matches the stored
    /// one, bumping the stored version. A stale record fails with
    /// [`StoreError::Conflict`].
    async fn replace(&self, patterns: &UserPatterns) -> StoreResult<()>;
}

/// Backend that provides every collaborator.
pub trait Backend:
    TaskCatalog + CustomTaskStore + RoomRegistry + ActivityLogStore + ProgressStore + PatternStore
{
}

impl<T> Backend for T where
    T: TaskCatalog + CustomTaskStore + RoomRegistry + ActivityLogStore + ProgressStore + PatternStore
{
}

/// The engine's collaborators.
#[derive(Clone)]
pub struct Stores {
    pub catalog: Arc<dyn TaskCatalog>,
    pub custom_tasks: Arc<dyn CustomTaskStore>,
    pub rooms: Arc<dyn RoomRegistry>,
    pub logs: Arc<dyn ActivityLogStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub patterns: Arc<dyn PatternStore>,
}

impl Stores {
    /// Use one backend for every collaborator.
    pub fn from_backend<B: Backend + 'static>(backend: Arc<B>) -> Self {
        Self {
            catalog: backend.clone(),
            custom_tasks: backend.clone(),
            rooms: backend.clone(),
            logs: backend.clone(),
            progress: backend.clone(),
            patterns: backend,
        }
    }
}
