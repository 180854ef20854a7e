//! In-memory backend.
//!
//! Holds everything behind one `tokio::sync::RwLock`. Operations can be
//! made to fail on demand with [`MemoryStore::fail_on`], which is how the
//! engine's error propagation is tested.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::RwLock;

use super::{
    ActivityLogStore, CustomTaskStore, PatternStore, ProgressStore, RoomRegistry, StoreResult,
    TaskCatalog,
};
use crate::activity::{ActivityLog, LogCompletion, LogFilter};
use crate::error::StoreError;
use crate::patterns::UserPatterns;
use crate::progress::{ProgressUpdate, UserProgress};
use crate::room::Room;
use crate::task::Task;

/// Operation names accepted by [`MemoryStore::fail_on`].
pub mod ops {
    pub const CATALOG_GET_ALL: &str = "catalog.get_all";
    pub const ROOMS_GET: &str = "rooms.get_for_user";
    pub const LOG_APPEND: &str = "logs.append";
    pub const LOG_UPDATE: &str = "logs.update";
    pub const LOG_QUERY: &str = "logs.query_by_user";
    pub const PROGRESS_GET: &str = "progress.get_or_create";
    pub const PROGRESS_UPDATE: &str = "progress.update";
    pub const PATTERNS_GET: &str = "patterns.get_or_create";
    pub const PATTERNS_REPLACE: &str = "patterns.replace";
    pub const CUSTOM_SAVE: &str = "custom.save";
}

#[derive(Default)]
struct Inner {
    catalog: Vec<Task>,
    custom: Vec<Task>,
    rooms: Vec<Room>,
    logs: Vec<ActivityLog>,
    progress: HashMap<String, UserProgress>,
    patterns: HashMap<String, UserPatterns>,
}

/// Thread-safe in-memory implementation of every store trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with catalog tasks.
    pub fn with_catalog(tasks: Vec<Task>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                catalog: tasks,
                ..Default::default()
            }),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make every later call of `op` fail with [`StoreError::Unavailable`].
    pub fn fail_on(&self, op: &'static str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(op);
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.clear();
        }
    }

    fn check(&self, op: &'static str) -> StoreResult<()> {
        let failing = self.failing.lock().map_err(|_| StoreError::Locked)?;
        if failing.contains(op) {
            return Err(StoreError::Unavailable(format!("{op} is failing")));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskCatalog for MemoryStore {
    async fn get_all(&self) -> StoreResult<Vec<Task>> {
        self.check(ops::CATALOG_GET_ALL)?;
        Ok(self.inner.read().await.catalog.clone())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().await.catalog.iter().find(|t| t.id == id).cloned())
    }

    async fn get_by_room(&self, room: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .inner
            .read()
            .await
            .catalog
            .iter()
            .filter(|t| t.room.as_deref() == Some(room))
            .cloned()
            .collect())
    }

    async fn load(&self, tasks: &[Task]) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        for task in tasks {
            match inner.catalog.iter_mut().find(|t| t.id == task.id) {
                Some(existing) => *existing = task.clone(),
                None => inner.catalog.push(task.clone()),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CustomTaskStore for MemoryStore {
    async fn get(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().await.custom.iter().find(|t| t.id == id).cloned())
    }

    async fn list_for_owner(&self, owner: &str) -> StoreResult<Vec<Task>> {
        Ok(self
            .inner
            .read()
            .await
            .custom
            .iter()
            .filter(|t| t.custom.as_ref().is_some_and(|m| m.owner == owner))
            .cloned()
            .collect())
    }

    async fn save(&self, task: &Task) -> StoreResult<()> {
        self.check(ops::CUSTOM_SAVE)?;
        let mut inner = self.inner.write().await;
        match inner.custom.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task.clone(),
            None => inner.custom.push(task.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.custom.len();
        inner.custom.retain(|t| t.id != id);
        Ok(inner.custom.len() != before)
    }
}

#[async_trait]
impl RoomRegistry for MemoryStore {
    async fn get_for_user(&self, user_id: &str) -> StoreResult<Vec<Room>> {
        self.check(ops::ROOMS_GET)?;
        Ok(self
            .inner
            .read()
            .await
            .rooms
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn upsert(&self, room: &Room) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        match inner
            .rooms
            .iter_mut()
            .find(|r| r.user_id == room.user_id && r.kind == room.kind)
        {
            Some(existing) => *existing = room.clone(),
            None => inner.rooms.push(room.clone()),
        }
        Ok(())
    }

    async fn mark_serviced(&self, user_id: &str, kind: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner
            .rooms
            .iter_mut()
            .find(|r| r.user_id == user_id && r.kind == kind)
        {
            Some(room) => {
                room.last_serviced = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ActivityLogStore for MemoryStore {
    async fn append(&self, log: &ActivityLog) -> StoreResult<String> {
        self.check(ops::LOG_APPEND)?;
        self.inner.write().await.logs.push(log.clone());
        Ok(log.id.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ActivityLog>> {
        Ok(self.inner.read().await.logs.iter().find(|l| l.id == id).cloned())
    }

    async fn update(&self, id: &str, completion: &LogCompletion) -> StoreResult<bool> {
        self.check(ops::LOG_UPDATE)?;
        let mut inner = self.inner.write().await;
        match inner.logs.iter_mut().find(|l| l.id == id) {
            Some(log) => {
                log.apply(completion);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn query_by_user(&self, user_id: &str, filter: &LogFilter) -> StoreResult<Vec<ActivityLog>> {
        self.check(ops::LOG_QUERY)?;
        let inner = self.inner.read().await;
        // newest appended first among equal start times
        let mut logs: Vec<ActivityLog> = inner
            .logs
            .iter()
            .rev()
            .filter(|l| l.user_id == user_id && filter.matches(l))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        if let Some(limit) = filter.limit() {
            logs.truncate(limit);
        }
        Ok(logs)
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_or_create(&self, user_id: &str, weekly_goal: u32) -> StoreResult<UserProgress> {
        self.check(ops::PROGRESS_GET)?;
        let mut inner = self.inner.write().await;
        Ok(inner
            .progress
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id, weekly_goal))
            .clone())
    }

    async fn update(&self, user_id: &str, update: &ProgressUpdate) -> StoreResult<UserProgress> {
        self.check(ops::PROGRESS_UPDATE)?;
        let mut inner = self.inner.write().await;
        let progress = inner
            .progress
            .entry(user_id.to_string())
            .or_insert_with(|| UserProgress::new(user_id, crate::progress::DEFAULT_WEEKLY_GOAL));
        if !progress.accepts(update) {
            return Err(StoreError::Conflict(format!("progress for {user_id}")));
        }
        progress.apply(update);
        Ok(progress.clone())
    }
}

#[async_trait]
impl PatternStore for MemoryStore {
    async fn get_or_create(&self, user_id: &str) -> StoreResult<UserPatterns> {
        self.check(ops::PATTERNS_GET)?;
        let mut inner = self.inner.write().await;
        Ok(inner
            .patterns
            .entry(user_id.to_string())
            .or_insert_with(|| UserPatterns::new(user_id))
            .clone())
    }

    async fn replace(&self, patterns: &UserPatterns) -> StoreResult<()> {
        self.check(ops::PATTERNS_REPLACE)?;
        let mut inner = self.inner.write().await;
        let stored_version = inner.patterns.get(&patterns.user_id).map_or(0, |p| p.version);
        if stored_version != patterns.version {
            return Err(StoreError::Conflict(format!("patterns for {}", patterns.user_id)));
        }
        let mut next = patterns.clone();
        next.version += 1;
        inner.patterns.insert(patterns.user_id.clone(), next);
        Ok(())
    }
}
