//! Access and refresh tokens.
//!
//! Access tokens carry the caller's identity and are checked on every
//! protected request. Refresh tokens only carry the user id and are
//! exchanged at `/api/auth/refresh-token` for a new pair. The two kinds are
//! signed with different secrets so one can never stand in for the other.

pub mod password;
pub mod policy;
pub mod revocation;

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::UserType;

pub use password::{hash_password, verify_password, PasswordError};
pub use policy::Policy;
pub use revocation::RevocationList;

const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("token revoked")]
    Revoked,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIdentity {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    pub organization_id: i64,
    /// Profile still incomplete; clients route these users to onboarding.
    pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    #[serde(flatten)]
    pub identity: TokenIdentity,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: i64,
    pub token_type: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: u64,
    refresh_ttl: u64,
    validation: Validation,
    revoked: RevocationList,
}

impl TokenService {
    pub fn new(config: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access_encoding: EncodingKey::from_secret(config.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_token_secret.as_bytes()),
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
            validation,
            revoked: RevocationList::default(),
        }
    }

    pub fn issue(&self, identity: TokenIdentity) -> Result<TokenPair, TokenError> {
        let now = Utc::now().timestamp();

        let refresh = RefreshClaims {
            user_id: identity.user_id,
            token_type: REFRESH_TOKEN_TYPE.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.refresh_ttl as i64,
        };
        let access = AccessClaims {
            identity,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.access_ttl as i64,
        };

        Ok(TokenPair {
            access_token: sign(&access, &self.access_encoding)?,
            refresh_token: sign(&refresh, &self.refresh_encoding)?,
            token_type: "Bearer",
            expires_in: self.access_ttl,
        })
    }

    pub async fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token, &self.access_decoding)?;
        if self.revoked.is_revoked(&claims.jti).await {
            return Err(TokenError::Revoked);
        }
        Ok(claims)
    }

    /// Expired or revoked refresh tokens are reported as `Invalid`.
    pub async fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self
            .decode(token, &self.refresh_decoding)
            .map_err(|_| TokenError::Invalid)?;
        if claims.token_type != REFRESH_TOKEN_TYPE || self.revoked.is_revoked(&claims.jti).await {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Revokes a token by id until its own expiry.
    pub async fn revoke(&self, jti: &str, exp: i64) {
        self.revoked.revoke(jti, exp).await;
    }

    /// Revokes a refresh token if it verifies; anything else is ignored.
    pub async fn revoke_refresh(&self, token: &str) -> bool {
        match self.verify_refresh(token).await {
            Ok(claims) => {
                self.revoked.revoke(&claims.jti, claims.exp).await;
                true
            }
            Err(_) => false,
        }
    }

    fn decode<C: DeserializeOwned>(&self, token: &str, key: &DecodingKey) -> Result<C, TokenError> {
        decode::<C>(token, key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(|e| TokenError::Signing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn service() -> TokenService {
        TokenService::new(&AppConfig::development().security)
    }

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: 3,
            email: "hinomori.shiho@leo.co.jp".into(),
            user_type: UserType::Graduate,
            organization_id: 0,
            is_new: false,
        }
    }

    #[tokio::test]
    async fn issued_tokens_verify_with_their_own_kind_only() {
        let tokens = service();
        let pair = tokens.issue(identity()).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let claims = tokens.verify_access(&pair.access_token).await.unwrap();
        assert_eq!(claims.identity, identity());
        assert_eq!(tokens.verify_refresh(&pair.refresh_token).await.unwrap().user_id, 3);

        assert_eq!(tokens.verify_access(&pair.refresh_token).await.unwrap_err(), TokenError::Invalid);
        assert_eq!(tokens.verify_refresh(&pair.access_token).await.unwrap_err(), TokenError::Invalid);
    }

    #[tokio::test]
    async fn expired_access_tokens_are_flagged() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            identity: identity(),
            jti: "expired".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = sign(&claims, &tokens.access_encoding).unwrap();
        assert_eq!(tokens.verify_access(&token).await.unwrap_err(), TokenError::Expired);
        assert_eq!(tokens.verify_access("not.a.token").await.unwrap_err(), TokenError::Invalid);
    }

    #[tokio::test]
    async fn revoked_tokens_stop_verifying() {
        let tokens = service();
        let pair = tokens.issue(identity()).unwrap();
        let claims = tokens.verify_access(&pair.access_token).await.unwrap();

        tokens.revoke(&claims.jti, claims.exp).await;
        assert_eq!(tokens.verify_access(&pair.access_token).await.unwrap_err(), TokenError::Revoked);

        assert!(tokens.revoke_refresh(&pair.refresh_token).await);
        assert_eq!(tokens.verify_refresh(&pair.refresh_token).await.unwrap_err(), TokenError::Invalid);
        assert!(!tokens.revoke_refresh("garbage").await);
    }
}
