/// Storage seams of the portal service
///
/// Handlers and the token lifecycle only see the [`UserStore`] and
/// [`RevocationStore`] traits. PostgreSQL implementations back the running
/// service; the in-memory ones back the test suites.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LogoutRecord, NewUser, User, UserRecord};

pub mod memory;
pub mod sessions;
pub mod token_revocation;
pub mod users;

pub use memory::{InMemoryRevocationStore, InMemoryUserStore};
pub use token_revocation::PgRevocationStore;
pub use users::PgUserStore;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool>;

    /// Insert a new account; a duplicate email yields `EmailAlreadyExists`
    async fn create_user(&self, user: NewUser) -> Result<User>;

    /// Look up an account with its role and location names
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
}

#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn is_jti_revoked(&self, jti: &str) -> Result<bool>;

    /// Whether `user_id` has a logout event strictly later than `issued_at`
    async fn has_logged_out_since(&self, user_id: Uuid, issued_at: DateTime<Utc>)
        -> Result<bool>;

    /// Persist every write of one logout, all or nothing
    async fn record_logout(&self, record: &LogoutRecord) -> Result<()>;
}
