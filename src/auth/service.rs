use sqlx::sqlite::SqlitePool;

use crate::auth::password;
use crate::auth::token::{TokenError, TokenKeys, TokenService};
use crate::models::user::{TokenPair, User};
use crate::store::revocation::RevocationStore;
use crate::store::users::UserStore;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,
    #[error("a user with this email already exists")]
    EmailTaken,
    #[error("invalid or expired token")]
    TokenInvalid,
    #[error("password hashing failed: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => AuthError::TokenInvalid,
            TokenError::Signing(e) => AuthError::Signing(e),
            TokenError::Store(e) => AuthError::Store(e),
        }
    }
}

/// Login/register/refresh/logout use cases over the credential store, the
/// password hasher and the token service.
pub struct AuthService {
    users: UserStore,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(pool: SqlitePool, keys: TokenKeys) -> Self {
        AuthService {
            users: UserStore::new(pool.clone()),
            tokens: TokenService::new(keys, RevocationStore::new(pool)),
        }
    }

    /// Issuing the refresh token overwrites the stored one, so a login from
    /// a new client silently ends the previous session's refresh chain.
    pub async fn login(&self, email: &str, plaintext: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !password::verify(plaintext, &user.password_hash) {
            return Err(AuthError::InvalidPassword);
        }

        self.issue_pair(&user).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        plaintext: &str,
    ) -> Result<User, AuthError> {
        if self.users.get_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hashed = password::hash(plaintext).map_err(AuthError::Hash)?;
        let user = self.users.create(name, email, &hashed).await?;
        Ok(user)
    }

    /// Rotates on every refresh: the returned pair supersedes the presented
    /// token, so a leaked refresh token is good for at most one use.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.tokens.verify_refresh_token(refresh_token).await?;
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.issue_pair(&user).await
    }

    /// Only forecloses future refreshes; outstanding access tokens expire
    /// naturally.
    pub async fn logout(&self, user_id: i64) -> Result<(), AuthError> {
        self.tokens.revoke_refresh_token(user_id).await?;
        Ok(())
    }

    async fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access_token = self.tokens.issue_access_token(user.id, &user.name)?;
        let refresh_token = self.tokens.issue_refresh_token(user.id).await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db;

    async fn auth_service() -> AuthService {
        let pool = db::connect_in_memory().await.unwrap();
        let keys = TokenKeys::new(&AuthConfig {
            jwt_secret: "access-secret".into(),
            access_ttl_secs: 900,
            refresh_secret: "refresh-secret".into(),
            refresh_ttl_secs: 3600,
        });
        AuthService::new(pool, keys)
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = auth_service().await;
        let user = auth
            .register("Jo", "jo@x.com", "Secret1!")
            .await
            .unwrap();
        assert_eq!(user.email, "jo@x.com");
        assert!(user.updated_at.is_none());

        let pair = auth.login("jo@x.com", "Secret1!").await.unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let auth = auth_service().await;
        auth.register("Jo", "jo@x.com", "Secret1!").await.unwrap();
        assert!(matches!(
            auth.register("Other", "jo@x.com", "pw").await,
            Err(AuthError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn login_failures_are_distinguished() {
        let auth = auth_service().await;
        auth.register("Jo", "jo@x.com", "Secret1!").await.unwrap();

        assert!(matches!(
            auth.login("nobody@x.com", "Secret1!").await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.login("jo@x.com", "wrong").await,
            Err(AuthError::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_and_old_token_dies() {
        let auth = auth_service().await;
        auth.register("Jo", "jo@x.com", "Secret1!").await.unwrap();
        let first = auth.login("jo@x.com", "Secret1!").await.unwrap();

        let second = auth.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        // replaying the superseded token fails
        assert!(matches!(
            auth.refresh(&first.refresh_token).await,
            Err(AuthError::TokenInvalid)
        ));
        // the fresh one still works
        auth.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn new_login_invalidates_previous_session() {
        let auth = auth_service().await;
        auth.register("Jo", "jo@x.com", "Secret1!").await.unwrap();

        let old_session = auth.login("jo@x.com", "Secret1!").await.unwrap();
        let _new_session = auth.login("jo@x.com", "Secret1!").await.unwrap();

        assert!(matches!(
            auth.refresh(&old_session.refresh_token).await,
            Err(AuthError::TokenInvalid)
        ));
    }

    #[tokio::test]
    async fn logout_forecloses_refresh_and_is_idempotent() {
        let auth = auth_service().await;
        let user = auth
            .register("Jo", "jo@x.com", "Secret1!")
            .await
            .unwrap();
        let pair = auth.login("jo@x.com", "Secret1!").await.unwrap();

        auth.logout(user.id).await.unwrap();
        auth.logout(user.id).await.unwrap();

        assert!(matches!(
            auth.refresh(&pair.refresh_token).await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
