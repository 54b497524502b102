use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::models::user::User;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        UserStore { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password_hash, created_at) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await
    }

    /// Profile edit. Bumps `updated_at`; returns None when the user is gone.
    pub async fn update_profile(
        &self,
        id: i64,
        name: &str,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = ?, email = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(Utc::now().naive_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
