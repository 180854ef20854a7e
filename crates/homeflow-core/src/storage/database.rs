//! SQLite backend.
//!
//! Implements every store trait on one `rusqlite::Connection`. Records are
//! stored as JSON, with the columns used for lookups and ordering kept
//! alongside. Timestamps are written as fixed-width RFC 3339 UTC so string
//! order equals time order.
//!
//! Several processes may share one file. Read-modify-write of progress and
//! patterns runs in an IMMEDIATE transaction and checks the record version,
//! so a writer holding a stale copy gets [`StoreError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{data_dir, migrations};
use crate::activity::{ActivityLog, LogCompletion, LogFilter};
use crate::error::{CoreError, StoreError};
use crate::patterns::UserPatterns;
use crate::progress::{ProgressUpdate, UserProgress, DEFAULT_WEEKLY_GOAL};
use crate::room::Room;
use crate::store::{
    ActivityLogStore, CustomTaskStore, PatternStore, ProgressStore, RoomRegistry, StoreResult,
    TaskCatalog,
};
use crate::task::Task;

/// How long a connection waits on another process's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite database holding catalog, rooms, logs, progress and patterns.
pub struct Database {
    conn: Mutex<Connection>,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn encode<T: Serialize>(table: &'static str, value: &T) -> StoreResult<String> {
    serde_json::to_string(value).map_err(|e| StoreError::QueryFailed(format!("encoding {table} row: {e}")))
}

fn decode<T: DeserializeOwned>(table: &'static str, data: &str) -> StoreResult<T> {
    serde_json::from_str(data).map_err(|e| StoreError::CorruptRecord {
        table,
        message: e.to_string(),
    })
}

fn decode_all<T: DeserializeOwned>(table: &'static str, rows: Vec<String>) -> StoreResult<Vec<T>> {
    rows.iter().map(|data| decode(table, data)).collect()
}

impl Database {
    /// Open the database at `<data dir>/homeflow.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened,
    /// or if migration fails.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("homeflow.db");
        Ok(Self::open(&path)?)
    }

    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Locked)
    }

    fn query_data(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> StoreResult<Option<String>> {
        let conn = self.conn()?;
        Ok(conn.query_row(sql, params, |row| row.get::<_, String>(0)).optional()?)
    }

    fn write_progress(conn: &Connection, progress: &UserProgress) -> StoreResult<()> {
        conn.execute(
            "INSERT INTO user_progress (user_id, data) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET data = excluded.data",
            params![progress.user_id, encode("user_progress", progress)?],
        )?;
        Ok(())
    }

    fn load_patterns(conn: &Connection, user_id: &str) -> StoreResult<Option<UserPatterns>> {
        let data = conn
            .query_row(
                "SELECT data FROM user_patterns WHERE user_id = ?1",
                [user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        data.map(|d| decode("user_patterns", &d)).transpose()
    }

    fn load_progress(conn: &Connection, user_id: &str) -> StoreResult<Option<UserProgress>> {
        let data = conn
            .query_row(
                "SELECT data FROM user_progress WHERE user_id = ?1",
                [user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        data.map(|d| decode("user_progress", &d)).transpose()
    }
}

#[async_trait]
impl TaskCatalog for Database {
    async fn get_all(&self) -> StoreResult<Vec<Task>> {
        let rows = self.query_data("SELECT data FROM tasks ORDER BY rowid", [])?;
        decode_all("tasks", rows)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Task>> {
        self.query_one("SELECT data FROM tasks WHERE id = ?1", [id])?
            .map(|d| decode("tasks", &d))
            .transpose()
    }

    async fn get_by_room(&self, room: &str) -> StoreResult<Vec<Task>> {
        let rows = self.query_data("SELECT data FROM tasks WHERE room = ?1 ORDER BY rowid", [room])?;
        decode_all("tasks", rows)
    }

    async fn load(&self, tasks: &[Task]) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for task in tasks {
            tx.execute(
                "INSERT INTO tasks (id, room, data) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET room = excluded.room, data = excluded.data",
                params![task.id, task.room, encode("tasks", task)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[async_trait]
impl CustomTaskStore for Database {
    async fn get(&self, id: &str) -> StoreResult<Option<Task>> {
        self.query_one("SELECT data FROM custom_tasks WHERE id = ?1", [id])?
            .map(|d| decode("custom_tasks", &d))
            .transpose()
    }

    async fn list_for_owner(&self, owner: &str) -> StoreResult<Vec<Task>> {
        let rows = self.query_data(
            "SELECT data FROM custom_tasks WHERE owner = ?1 ORDER BY rowid",
            [owner],
        )?;
        decode_all("custom_tasks", rows)
    }

    async fn save(&self, task: &Task) -> StoreResult<()> {
        let owner = task
            .custom
            .as_ref()
            .map(|m| m.owner.clone())
            .ok_or_else(|| StoreError::QueryFailed(format!("task {} has no owner", task.id)))?;
        self.conn()?.execute(
            "INSERT INTO custom_tasks (id, owner, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET owner = excluded.owner, data = excluded.data",
            params![task.id, owner, encode("custom_tasks", task)?],
        )?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let deleted = self.conn()?.execute("DELETE FROM custom_tasks WHERE id = ?1", [id])?;
        Ok(deleted > 0)
    }
}

#[async_trait]
impl RoomRegistry for Database {
    async fn get_for_user(&self, user_id: &str) -> StoreResult<Vec<Room>> {
        let rows = self.query_data(
            "SELECT data FROM rooms WHERE user_id = ?1 ORDER BY rowid",
            [user_id],
        )?;
        decode_all("rooms", rows)
    }

    async fn upsert(&self, room: &Room) -> StoreResult<()> {
        self.conn()?.execute(
            "INSERT INTO rooms (id, user_id, kind, data) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id, kind) DO UPDATE SET id = excluded.id, data = excluded.data",
            params![room.id, room.user_id, room.kind, encode("rooms", room)?],
        )?;
        Ok(())
    }

    async fn mark_serviced(&self, user_id: &str, kind: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let conn = self.conn()?;
        let data = conn
            .query_row(
                "SELECT data FROM rooms WHERE user_id = ?1 AND kind = ?2",
                params![user_id, kind],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        let Some(data) = data else {
            return Ok(false);
        };

        let mut room: Room = decode("rooms", &data)?;
        room.last_serviced = Some(at);
        conn.execute(
            "UPDATE rooms SET data = ?1 WHERE user_id = ?2 AND kind = ?3",
            params![encode("rooms", &room)?, user_id, kind],
        )?;
        Ok(true)
    }
}

#[async_trait]
impl ActivityLogStore for Database {
    async fn append(&self, log: &ActivityLog) -> StoreResult<String> {
        self.conn()?.execute(
            "INSERT INTO activity_logs (id, user_id, task_id, start_time, completed, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                log.id,
                log.user_id,
                log.task_id,
                timestamp(log.start_time),
                log.completed,
                encode("activity_logs", log)?
            ],
        )?;
        Ok(log.id.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<ActivityLog>> {
        self.query_one("SELECT data FROM activity_logs WHERE id = ?1", [id])?
            .map(|d| decode("activity_logs", &d))
            .transpose()
    }

    async fn update(&self, id: &str, completion: &LogCompletion) -> StoreResult<bool> {
        let conn = self.conn()?;
        let data = conn
            .query_row("SELECT data FROM activity_logs WHERE id = ?1", [id], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        let Some(data) = data else {
            return Ok(false);
        };

        let mut log: ActivityLog = decode("activity_logs", &data)?;
        log.apply(completion);
        conn.execute(
            "UPDATE activity_logs SET completed = ?1, data = ?2 WHERE id = ?3",
            params![log.completed, encode("activity_logs", &log)?, id],
        )?;
        Ok(true)
    }

    async fn query_by_user(&self, user_id: &str, filter: &LogFilter) -> StoreResult<Vec<ActivityLog>> {
        let rows = match filter {
            LogFilter::Recent(n) => self.query_data(
                "SELECT data FROM activity_logs WHERE user_id = ?1
                 ORDER BY start_time DESC, seq DESC LIMIT ?2",
                params![user_id, *n as i64],
            )?,
            LogFilter::AllCompleted => self.query_data(
                "SELECT data FROM activity_logs WHERE user_id = ?1 AND completed = 1
                 ORDER BY start_time DESC, seq DESC",
                [user_id],
            )?,
            LogFilter::CompletedBetween { start, end } => self.query_data(
                "SELECT data FROM activity_logs
                 WHERE user_id = ?1 AND completed = 1 AND start_time >= ?2 AND start_time < ?3
                 ORDER BY start_time DESC, seq DESC",
                params![user_id, timestamp(*start), timestamp(*end)],
            )?,
        };
        decode_all("activity_logs", rows)
    }
}

#[async_trait]
impl ProgressStore for Database {
    async fn get_or_create(&self, user_id: &str, weekly_goal: u32) -> StoreResult<UserProgress> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_progress (user_id, data) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO NOTHING",
            params![user_id, encode("user_progress", &UserProgress::new(user_id, weekly_goal))?],
        )?;
        Self::load_progress(&conn, user_id)?
            .ok_or_else(|| StoreError::QueryFailed(format!("progress for {user_id} vanished")))
    }

    async fn update(&self, user_id: &str, update: &ProgressUpdate) -> StoreResult<UserProgress> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut progress = Self::load_progress(&tx, user_id)?
            .unwrap_or_else(|| UserProgress::new(user_id, DEFAULT_WEEKLY_GOAL));
        if !progress.accepts(update) {
            return Err(StoreError::Conflict(format!("progress for {user_id}")));
        }
        progress.apply(update);
        Self::write_progress(&tx, &progress)?;
        tx.commit()?;
        Ok(progress)
    }
}

#[async_trait]
impl PatternStore for Database {
    async fn get_or_create(&self, user_id: &str) -> StoreResult<UserPatterns> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_patterns (user_id, data) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO NOTHING",
            params![user_id, encode("user_patterns", &UserPatterns::new(user_id))?],
        )?;
        Self::load_patterns(&conn, user_id)?
            .ok_or_else(|| StoreError::QueryFailed(format!("patterns for {user_id} vanished")))
    }

    async fn replace(&self, patterns: &UserPatterns) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let stored_version = Self::load_patterns(&tx, &patterns.user_id)?.map_or(0, |p| p.version);
        if stored_version != patterns.version {
            return Err(StoreError::Conflict(format!("patterns for {}", patterns.user_id)));
        }
        let mut next = patterns.clone();
        next.version += 1;
        tx.execute(
            "INSERT INTO user_patterns (user_id, data) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET data = excluded.data",
            params![next.user_id, encode("user_patterns", &next)?],
        )?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Mood;
    use crate::room::RoomPriority;
    use crate::task::{EffortLevel, ImpactLevel, TaskCategory};
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn catalog_load_and_lookup() {
        let db = Database::open_memory().unwrap();
        let tasks = vec![
            Task::new("a", "A", TaskCategory::Cleaning, 5, EffortLevel::Low, ImpactLevel::High).in_room("kitchen"),
            Task::new("b", "B", TaskCategory::Organizing, 2, EffortLevel::Micro, ImpactLevel::Low),
        ];
        db.load(&tasks).await.unwrap();
        db.load(&tasks[..1]).await.unwrap();

        assert_eq!(db.get_all().await.unwrap(), tasks);
        assert_eq!(db.get_by_room("kitchen").await.unwrap().len(), 1);
        assert!(db.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn log_lifecycle_and_ordering() {
        let db = Database::open_memory().unwrap();
        let first = ActivityLog::start("u", "a", Mood::Bad, None, at(9));
        let second = ActivityLog::start("u", "b", Mood::Bad, None, at(11));
        db.append(&first).await.unwrap();
        db.append(&second).await.unwrap();

        let completion = LogCompletion {
            end_time: at(9) + Duration::minutes(4),
            actual_minutes: Some(4),
            mood_after: Mood::Good,
            points_earned: 22,
        };
        assert!(ActivityLogStore::update(&db, &first.id, &completion).await.unwrap());
        assert!(!ActivityLogStore::update(&db, "missing", &completion).await.unwrap());

        let recent = db.query_by_user("u", &LogFilter::Recent(10)).await.unwrap();
        assert_eq!(recent[0].id, second.id);

        let done = db.query_by_user("u", &LogFilter::AllCompleted).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].mood_delta, Some(2));
        assert_eq!(done[0].points_earned, Some(22));

        let window = LogFilter::CompletedBetween { start: at(9), end: at(10) };
        assert_eq!(db.query_by_user("u", &window).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn progress_and_patterns_persist() {
        let db = Database::open_memory().unwrap();
        let created = ProgressStore::get_or_create(&db, "u", 120).await.unwrap();
        assert_eq!(created.weekly_goal, 120);

        let updated = ProgressStore::update(
            &db,
            "u",
            &ProgressUpdate {
                current_streak: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.current_streak, 2);
        assert_eq!(updated.weekly_goal, 120);

        let mut patterns = PatternStore::get_or_create(&db, "u").await.unwrap();
        patterns.total_points_earned = 40;
        db.replace(&patterns).await.unwrap();
        assert_eq!(PatternStore::get_or_create(&db, "u").await.unwrap().total_points_earned, 40);
    }

    #[tokio::test]
    async fn rooms_upsert_by_kind() {
        let db = Database::open_memory().unwrap();
        db.upsert(&Room::new("u", "kitchen", RoomPriority::Low)).await.unwrap();
        db.upsert(&Room::new("u", "kitchen", RoomPriority::High)).await.unwrap();
        assert!(db.mark_serviced("u", "kitchen", at(8)).await.unwrap());

        let rooms = db.get_for_user("u").await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].priority, RoomPriority::High);
        assert_eq!(rooms[0].last_serviced, Some(at(8)));
    }

    #[tokio::test]
    async fn stale_copy_from_another_handle_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let first = Database::open(&path).unwrap();
        let second = Database::open(&path).unwrap();

        let mine = PatternStore::get_or_create(&first, "u").await.unwrap();
        let mut theirs = PatternStore::get_or_create(&second, "u").await.unwrap();
        theirs.total_points_earned = 10;
        second.replace(&theirs).await.unwrap();

        let err = first.replace(&mine).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        let stored = PatternStore::get_or_create(&first, "u").await.unwrap();
        assert_eq!(stored.total_points_earned, 10);
        assert_eq!(stored.version, 1);

        let progress = ProgressStore::get_or_create(&first, "u", 100).await.unwrap();
        let stale = ProgressUpdate {
            total_tasks_completed: Some(1),
            expected_version: Some(progress.version),
            ..Default::default()
        };
        ProgressStore::update(&second, "u", &stale).await.unwrap();
        let err = ProgressStore::update(&first, "u", &stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(ProgressStore::get_or_create(&first, "u", 100).await.unwrap().version, 1);
    }
}
