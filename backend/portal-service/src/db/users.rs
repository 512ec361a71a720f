/// User database operations
use async_trait::async_trait;
use sqlx::PgPool;

use super::UserStore;
use crate::error::{ApiError, Result};
use crate::models::{NewUser, User, UserRecord};

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (location_id, role_id, first_name, last_name, email, phone, password_hash, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING user_id, location_id, role_id, first_name, last_name, email, phone,
                      password_hash, is_active, created_at
            "#,
        )
        .bind(user.location_id)
        .bind(user.role_id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::EmailAlreadyExists
            }
            _ => ApiError::from(e),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT u.user_id, u.location_id, u.role_id, u.first_name, u.last_name, u.email,
                   u.phone, u.password_hash, u.is_active, u.created_at,
                   r.name AS role_name, l.name AS location_name
            FROM users u
            JOIN roles r ON u.role_id = r.role_id
            LEFT JOIN locations l ON u.location_id = l.location_id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
