use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePool;

/// Key-value store of the single currently-valid refresh token per user,
/// with expiry. One row per user; replacing is a single upsert, so the
/// previous token stops matching the instant a new one is written.
#[derive(Clone)]
pub struct RevocationStore {
    pool: SqlitePool,
}

impl RevocationStore {
    pub fn new(pool: SqlitePool) -> Self {
        RevocationStore { pool }
    }

    pub async fn replace(
        &self,
        user_id: i64,
        token: &str,
        ttl_secs: i64,
    ) -> Result<(), sqlx::Error> {
        let expires_at = Utc::now().naive_utc() + Duration::seconds(ttl_secs);
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token, expires_at) VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET token = excluded.token, \
             expires_at = excluded.expires_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The stored token, or None when absent or expired.
    pub async fn current(&self, user_id: i64) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT token FROM refresh_tokens WHERE user_id = ? AND expires_at > ?",
        )
        .bind(user_id)
        .bind(Utc::now().naive_utc())
        .fetch_optional(&self.pool)
        .await
    }

    /// Idempotent: clearing an absent entry is a no-op.
    pub async fn clear(&self, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
