//! Credential handling: password hashing and bearer token issuance.
//!
//! Passwords are stored as Argon2 PHC strings. Access and refresh tokens are
//! HS256 JWTs signed with separate secrets, so one can never stand in for
//! the other.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::models::Role;

/// Errors raised while hashing passwords or handling tokens
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Wrong token type: expected {expected:?}")]
    WrongTokenType { expected: TokenKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

/// Access and refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl KeyPair {
    fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: ttl_minutes * 60,
        }
    }
}

/// Issues and verifies bearer tokens
pub struct TokenService {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_minutes: i64,
        refresh_ttl_minutes: i64,
    ) -> Self {
        Self {
            access: KeyPair::new(access_secret, access_ttl_minutes),
            refresh: KeyPair::new(refresh_secret, refresh_ttl_minutes),
        }
    }

    /// Issue a fresh access/refresh pair for a user
    pub fn issue_pair(&self, user_id: &str, role: Role) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issue(user_id, role, TokenKind::Access)?,
            refresh_token: self.issue(user_id, role, TokenKind::Refresh)?,
        })
    }

    pub fn issue(&self, user_id: &str, role: Role, kind: TokenKind) -> Result<String, AuthError> {
        let keys = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            token_type: kind,
            iat: now,
            exp: now + keys.ttl_secs,
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation)?;

        if data.claims.token_type != kind {
            return Err(AuthError::WrongTokenType { expected: kind });
        }

        Ok(data.claims)
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

/// Hash a password into a PHC string using Argon2id
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verify a password against a stored PHC string
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("access-secret", "refresh-secret", 15, 60)
    }

    #[test]
    fn test_issue_and_verify_access() {
        let svc = service();
        let token = svc.issue("owner-1", Role::Owner, TokenKind::Access).unwrap();

        let claims = svc.verify_access(&token).unwrap();

        assert_eq!(claims.sub, "owner-1");
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let svc = service();
        let pair = svc.issue_pair("caretaker-1", Role::Caretaker).unwrap();

        assert!(svc.verify_access(&pair.refresh_token).is_err());
        assert!(svc.verify_refresh(&pair.access_token).is_err());
        assert_eq!(svc.verify_refresh(&pair.refresh_token).unwrap().sub, "caretaker-1");
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = TokenService::new("other", "other", 15, 60)
            .issue("owner-1", Role::Owner, TokenKind::Access)
            .unwrap();

        assert!(matches!(
            service().verify_access(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let svc = TokenService::new("access-secret", "refresh-secret", -5, 60);
        let token = svc.issue("owner-1", Role::Owner, TokenKind::Access).unwrap();

        assert!(svc.verify_access(&token).is_err());
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_each_hash_gets_its_own_salt() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert_ne!(first, second);
        assert_ne!(
            PasswordHash::new(&first).unwrap().salt,
            PasswordHash::new(&second).unwrap().salt
        );
        assert!(verify_password("correct horse", &second));
    }

    #[test]
    fn test_malformed_hash_is_mismatch() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
