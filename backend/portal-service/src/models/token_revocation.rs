/// Token revocation models
use chrono::{DateTime, Utc};
use crypto_core::TokenType;
use uuid::Uuid;

use super::LogoutEvent;

/// Blocklist entry for one revoked token id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationRecord {
    pub jti: String,
    pub token_type: TokenType,
    pub created_at: DateTime<Utc>,
    pub user_id: Uuid,
}

/// Everything one logout writes, persisted atomically
#[derive(Debug, Clone, Default)]
pub struct LogoutRecord {
    pub revocations: Vec<RevocationRecord>,
    pub event: Option<LogoutEvent>,
}
