/// In-memory stores backing the unit and HTTP test suites
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RevocationStore, UserStore};
use crate::error::{ApiError, Result};
use crate::models::{LogoutEvent, LogoutRecord, NewUser, RevocationRecord, User, UserRecord};

/// Accounts keyed by email, with the seeded `admin`/`user` roles
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    roles: HashMap<i32, String>,
    locations: RwLock<HashMap<i32, String>>,
    next_location_id: AtomicI32,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        let roles = HashMap::from([(1, "admin".to_string()), (2, "user".to_string())]);
        Self {
            users: RwLock::new(HashMap::new()),
            roles,
            locations: RwLock::new(HashMap::new()),
            next_location_id: AtomicI32::new(1),
        }
    }

    /// Create a location and return its id
    pub async fn add_location(&self, name: &str) -> i32 {
        let id = self.next_location_id.fetch_add(1, Ordering::SeqCst);
        self.locations.write().await.insert(id, name.to_string());
        id
    }

    /// Flip the account-active flag; returns false if the email is unknown
    pub async fn set_active(&self, email: &str, active: bool) -> bool {
        match self.users.write().await.get_mut(email) {
            Some(user) => {
                user.is_active = active;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self.users.read().await.contains_key(email))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        if !self.roles.contains_key(&new_user.role_id) {
            return Err(ApiError::Database(format!(
                "unknown role_id {}",
                new_user.role_id
            )));
        }
        if let Some(location_id) = new_user.location_id {
            if !self.locations.read().await.contains_key(&location_id) {
                return Err(ApiError::Database(format!(
                    "unknown location_id {location_id}"
                )));
            }
        }

        let mut users = self.users.write().await;
        if users.contains_key(&new_user.email) {
            return Err(ApiError::EmailAlreadyExists);
        }

        let user = User {
            user_id: Uuid::new_v4(),
            location_id: new_user.location_id,
            role_id: new_user.role_id,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email.clone(),
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            is_active: true,
            created_at: Utc::now(),
        };
        users.insert(new_user.email, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let Some(user) = self.users.read().await.get(email).cloned() else {
            return Ok(None);
        };

        let role_name = self
            .roles
            .get(&user.role_id)
            .cloned()
            .ok_or_else(|| ApiError::Database(format!("unknown role_id {}", user.role_id)))?;
        let location_name = match user.location_id {
            Some(id) => self.locations.read().await.get(&id).cloned(),
            None => None,
        };

        Ok(Some(UserRecord {
            user,
            role_name,
            location_name,
        }))
    }
}

/// Blocklist and logout log kept in process memory
///
/// `fail_writes` makes `record_logout` fail without writing anything, for
/// exercising the persistence-failure path.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: RwLock<HashMap<String, RevocationRecord>>,
    logouts: RwLock<Vec<LogoutEvent>>,
    fail_writes: AtomicBool,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn revoked_count(&self) -> usize {
        self.revoked.read().await.len()
    }

    pub async fn logout_events(&self) -> Vec<LogoutEvent> {
        self.logouts.read().await.clone()
    }

    pub async fn revocation(&self, jti: &str) -> Option<RevocationRecord> {
        self.revoked.read().await.get(jti).cloned()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn is_jti_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self.revoked.read().await.contains_key(jti))
    }

    async fn has_logged_out_since(&self, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .logouts
            .read()
            .await
            .iter()
            .any(|e| e.user_id == user_id && e.logout_time > issued_at))
    }

    async fn record_logout(&self, record: &LogoutRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApiError::Database("simulated write failure".to_string()));
        }

        let mut revoked = self.revoked.write().await;
        let mut logouts = self.logouts.write().await;

        for revocation in &record.revocations {
            revoked
                .entry(revocation.jti.clone())
                .or_insert_with(|| revocation.clone());
        }
        if let Some(event) = &record.event {
            logouts.push(event.clone());
        }
        Ok(())
    }
}
