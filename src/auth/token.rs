use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::store::revocation::RevocationStore;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Deliberately undifferentiated: expired, tampered, revoked and
    /// superseded tokens all surface as this one kind.
    #[error("invalid or expired token")]
    Invalid,
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    name: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    jti: String,
    iat: i64,
    exp: i64,
}

/// Random token id. `iat`/`exp` only have second resolution, so without
/// this two issuances in the same second would sign byte-identical tokens
/// and rotation would not actually supersede the previous one.
fn fresh_jti() -> String {
    use rand_core::{OsRng, RngCore};
    let mut rng = OsRng;
    format!("{:016x}{:016x}", rng.next_u64(), rng.next_u64())
}

/// Identity recovered from a verified access token.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub user_id: i64,
    pub name: String,
}

/// Signing material for both token kinds, built once at startup and cloned
/// into request state. Access and refresh tokens use separate secrets so one
/// can never be replayed as the other.
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    validation: Validation,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exact expiry, no clock slack
        validation.leeway = 0;
        TokenKeys {
            access_encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            validation,
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }
}

/// Issues and verifies the two token kinds. Access tokens are stateless;
/// refresh tokens are additionally checked byte-for-byte against the
/// revocation store, which holds at most one valid token per user.
pub struct TokenService {
    keys: TokenKeys,
    store: RevocationStore,
}

impl TokenService {
    pub fn new(keys: TokenKeys, store: RevocationStore) -> Self {
        TokenService { keys, store }
    }

    pub fn issue_access_token(&self, user_id: i64, name: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            name: name.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.keys.access_ttl_secs)).timestamp(),
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &self.keys.access_encoding,
        )?)
    }

    /// Purely cryptographic + time check; no store lookup.
    pub fn verify_access_token(&self, token: &str) -> Result<TokenIdentity, TokenError> {
        let data = decode::<AccessClaims>(token, &self.keys.access_decoding, &self.keys.validation)
            .map_err(|_| TokenError::Invalid)?;
        let user_id = data.claims.sub.parse().map_err(|_| TokenError::Invalid)?;
        Ok(TokenIdentity {
            user_id,
            name: data.claims.name,
        })
    }

    /// Signs a new refresh token and overwrites the stored one for this
    /// user, rendering any predecessor unusable even if unexpired.
    pub async fn issue_refresh_token(&self, user_id: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: fresh_jti(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.keys.refresh_ttl_secs)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.keys.refresh_encoding)?;
        self.store
            .replace(user_id, &token, self.keys.refresh_ttl_secs)
            .await?;
        Ok(token)
    }

    /// Valid only when the signature and expiry check out AND the store's
    /// current token for the decoded user equals the presented one. The
    /// store equality is what makes logout and rotation effective.
    pub async fn verify_refresh_token(&self, token: &str) -> Result<i64, TokenError> {
        let data =
            decode::<RefreshClaims>(token, &self.keys.refresh_decoding, &self.keys.validation)
                .map_err(|_| TokenError::Invalid)?;
        let user_id: i64 = data.claims.sub.parse().map_err(|_| TokenError::Invalid)?;
        match self.store.current(user_id).await? {
            Some(stored) if stored == token => Ok(user_id),
            _ => Err(TokenError::Invalid),
        }
    }

    /// Idempotent; revoking a never-issued user is a no-op.
    pub async fn revoke_refresh_token(&self, user_id: i64) -> Result<(), TokenError> {
        self.store.clear(user_id).await?;
        Ok(())
    }
}
