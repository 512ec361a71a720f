/// Logout event database operations
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::LogoutEvent;

pub async fn insert_logout_event(
    conn: &mut PgConnection,
    event: &LogoutEvent,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO user_sessions (user_id, logout_time) VALUES ($1, $2)")
        .bind(event.user_id)
        .bind(event.logout_time)
        .execute(conn)
        .await?;

    Ok(())
}

/// Whether the user logged out strictly after `issued_at`
pub async fn has_logged_out_since(
    pool: &PgPool,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM user_sessions
            WHERE user_id = $1 AND logout_time > $2
        )
        "#,
    )
    .bind(user_id)
    .bind(issued_at)
    .fetch_one(pool)
    .await
}
