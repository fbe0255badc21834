// Service exports
pub mod auth;
pub mod cache;
pub mod postgres;

pub use auth::{AuthError, Claims, TokenKind, TokenPair, TokenService, hash_password, verify_password};
pub use cache::{CacheManager, CacheKey, CacheError, CacheStats};
pub use postgres::{PostgresClient, PostgresError, NewAccount, AccountUpdate};
