use chrono::{NaiveDateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::models::time_entry::TimeEntry;
use crate::store::time_entries::TimeEntryStore;

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("time entry not found")]
    NotFound,
    #[error("time entry is already stopped")]
    AlreadyStopped,
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Per-user open/closed state machine over stored entries. At most one entry
/// per user is open at any instant; `start` enforces this by closing every
/// open entry before inserting.
///
/// There is no lock or transaction around close-then-insert: two concurrent
/// `start` calls for the same user can both observe the same stale open
/// entry, close it, and each insert a new one, leaving two open entries
/// until the next `start` or `stop_all` repairs the state. That window is an
/// accepted tradeoff of this design, which is why `stop_all` tolerates and
/// reports more than one open row.
pub struct TimeEntryService {
    entries: TimeEntryStore,
}

impl TimeEntryService {
    pub fn new(pool: SqlitePool) -> Self {
        TimeEntryService {
            entries: TimeEntryStore::new(pool),
        }
    }

    /// Starting implicitly stops any running entry, closing it at the new
    /// entry's start time.
    pub async fn start(
        &self,
        user_id: i64,
        description: &str,
        start_time: Option<NaiveDateTime>,
    ) -> Result<TimeEntry, EntryError> {
        let start_time = start_time.unwrap_or_else(|| Utc::now().naive_utc());
        let closed = self.entries.close_open(user_id, start_time).await?;
        if closed > 0 {
            tracing::debug!(user_id, closed, "closed running entries before start");
        }
        Ok(self.entries.insert(user_id, description, start_time).await?)
    }

    /// Stops only the targeted entry. A second stop is an error, not a
    /// silent no-op.
    pub async fn stop(
        &self,
        id: i64,
        user_id: i64,
        end_time: Option<NaiveDateTime>,
    ) -> Result<TimeEntry, EntryError> {
        let entry = self
            .entries
            .get(id, user_id)
            .await?
            .ok_or(EntryError::NotFound)?;

        if entry.end_time.is_some() {
            return Err(EntryError::AlreadyStopped);
        }

        let end_time = end_time.unwrap_or_else(|| Utc::now().naive_utc());
        self.entries
            .set_end_time(id, user_id, end_time)
            .await?
            .ok_or(EntryError::NotFound)
    }

    /// Closes every open entry and returns how many there were. Normally 0
    /// or 1, but repairs a multi-open state too.
    pub async fn stop_all(&self, user_id: i64) -> Result<u64, EntryError> {
        Ok(self
            .entries
            .close_open(user_id, Utc::now().naive_utc())
            .await?)
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, EntryError> {
        Ok(self.entries.delete(id, user_id).await?)
    }

    pub async fn get_active(&self, user_id: i64) -> Result<Option<TimeEntry>, EntryError> {
        Ok(self.entries.find_open(user_id).await?)
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<TimeEntry>, EntryError> {
        Ok(self.entries.get(id, user_id).await?)
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<TimeEntry>, EntryError> {
        Ok(self.entries.list(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::Duration;

    async fn service() -> (TimeEntryService, SqlitePool) {
        let pool = db::connect_in_memory().await.unwrap();
        seed_user(&pool).await;
        (TimeEntryService::new(pool.clone()), pool)
    }

    async fn seed_user(pool: &SqlitePool) {
        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, created_at) \
             VALUES (1, 'Jo', 'jo@x.com', 'x', ?)",
        )
        .bind(Utc::now().naive_utc())
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn start_closes_the_running_entry() {
        let (svc, _pool) = service().await;
        let t0 = Utc::now().naive_utc();
        let t1 = t0 + Duration::minutes(5);

        let first = svc.start(1, "Write spec", Some(t0)).await.unwrap();
        assert!(first.end_time.is_none());

        let second = svc.start(1, "Review PR", Some(t1)).await.unwrap();
        assert!(second.end_time.is_none());

        let first = svc.get(first.id, 1).await.unwrap().unwrap();
        assert_eq!(first.end_time, Some(t1));

        let active = svc.get_active(1).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn stop_is_not_idempotent() {
        let (svc, _pool) = service().await;
        let entry = svc.start(1, "work", None).await.unwrap();

        let stopped = svc.stop(entry.id, 1, None).await.unwrap();
        assert!(stopped.end_time.is_some());
        assert!(stopped.updated_at.is_some());

        assert!(matches!(
            svc.stop(entry.id, 1, None).await,
            Err(EntryError::AlreadyStopped)
        ));
    }

    #[tokio::test]
    async fn stop_rejects_unknown_and_foreign_entries() {
        let (svc, _pool) = service().await;
        let entry = svc.start(1, "work", None).await.unwrap();

        assert!(matches!(
            svc.stop(9999, 1, None).await,
            Err(EntryError::NotFound)
        ));
        // entry ids are scoped to their owner
        assert!(matches!(
            svc.stop(entry.id, 2, None).await,
            Err(EntryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn stop_all_repairs_a_multi_open_state() {
        let (svc, pool) = service().await;
        // simulate the concurrent-start race: two open rows for one user
        let t0 = Utc::now().naive_utc();
        for desc in ["a", "b"] {
            sqlx::query(
                "INSERT INTO time_entries (user_id, description, start_time, created_at) \
                 VALUES (1, ?, ?, ?)",
            )
            .bind(desc)
            .bind(t0)
            .bind(t0)
            .execute(&pool)
            .await
            .unwrap();
        }

        assert_eq!(svc.stop_all(1).await.unwrap(), 2);
        assert!(svc.get_active(1).await.unwrap().is_none());
        assert_eq!(svc.stop_all(1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_was_removed() {
        let (svc, _pool) = service().await;
        let entry = svc.start(1, "work", None).await.unwrap();

        assert!(svc.delete(entry.id, 1).await.unwrap());
        assert!(!svc.delete(entry.id, 1).await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_entries_in_start_order() {
        let (svc, _pool) = service().await;
        let t0 = Utc::now().naive_utc();
        svc.start(1, "first", Some(t0)).await.unwrap();
        svc.start(1, "second", Some(t0 + Duration::minutes(1)))
            .await
            .unwrap();

        let entries = svc.list(1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].description, "first");
        assert_eq!(entries[1].description, "second");
    }
}
