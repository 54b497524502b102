use chrono::NaiveDateTime;
use sqlx::sqlite::SqlitePool;

use crate::models::time_entry::TimeEntry;

#[derive(Clone)]
pub struct TimeEntryStore {
    pool: SqlitePool,
}

impl TimeEntryStore {
    pub fn new(pool: SqlitePool) -> Self {
        TimeEntryStore { pool }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(
            "SELECT * FROM time_entries WHERE user_id = ? ORDER BY start_time",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get(&self, id: i64, user_id: i64) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>("SELECT * FROM time_entries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn insert(
        &self,
        user_id: i64,
        description: &str,
        start_time: NaiveDateTime,
    ) -> Result<TimeEntry, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(
            "INSERT INTO time_entries (user_id, description, start_time, created_at) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(user_id)
        .bind(description)
        .bind(start_time)
        .bind(chrono::Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_open(&self, user_id: i64) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(
            "SELECT * FROM time_entries WHERE user_id = ? AND end_time IS NULL \
             ORDER BY start_time DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Closes every open entry for the user at `end_time`; returns the
    /// number of rows closed.
    pub async fn close_open(
        &self,
        user_id: i64,
        end_time: NaiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE time_entries SET end_time = ?, updated_at = ? \
             WHERE user_id = ? AND end_time IS NULL",
        )
        .bind(end_time)
        .bind(chrono::Utc::now().naive_utc())
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_end_time(
        &self,
        id: i64,
        user_id: i64,
        end_time: NaiveDateTime,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(
            "UPDATE time_entries SET end_time = ?, updated_at = ? \
             WHERE id = ? AND user_id = ? RETURNING *",
        )
        .bind(end_time)
        .bind(chrono::Utc::now().naive_utc())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// True when a row was actually removed.
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
