/// Token blocklist database operations
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{sessions, RevocationStore};
use crate::error;
use crate::models::{LogoutRecord, RevocationRecord};

/// Record a revoked token id; re-revoking the same jti is a no-op
pub async fn insert_revocation(
    conn: &mut PgConnection,
    record: &RevocationRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO token_blocklist (jti, type, created_at, user_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (jti) DO NOTHING
        "#,
    )
    .bind(&record.jti)
    .bind(record.token_type.as_str())
    .bind(record.created_at)
    .bind(record.user_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Check if a token (by JTI) is revoked
pub async fn is_jti_revoked(pool: &PgPool, jti: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM token_blocklist WHERE jti = $1)")
        .bind(jti)
        .fetch_one(pool)
        .await
}

#[derive(Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
}

impl PgRevocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn is_jti_revoked(&self, jti: &str) -> error::Result<bool> {
        Ok(is_jti_revoked(&self.pool, jti).await?)
    }

    async fn has_logged_out_since(
        &self,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
    ) -> error::Result<bool> {
        Ok(sessions::has_logged_out_since(&self.pool, user_id, issued_at).await?)
    }

    async fn record_logout(&self, record: &LogoutRecord) -> error::Result<()> {
        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        for revocation in &record.revocations {
            insert_revocation(&mut tx, revocation).await?;
        }
        if let Some(event) = &record.event {
            sessions::insert_logout_event(&mut tx, event).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
