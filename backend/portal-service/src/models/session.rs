/// Logout event model
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A principal logged out at `logout_time`; refresh tokens issued before it
/// are no longer accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LogoutEvent {
    pub user_id: Uuid,
    pub logout_time: DateTime<Utc>,
}

impl LogoutEvent {
    /// Logout at `at`, kept at whole-second precision to match the `iat`
    /// claim it is compared against
    pub fn new(user_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            logout_time: at.trunc_subsecs(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_time_drops_subseconds() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.750Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = LogoutEvent::new(Uuid::new_v4(), at);

        assert_eq!(event.logout_time.timestamp(), at.timestamp());
        assert_eq!(event.logout_time.timestamp_subsec_nanos(), 0);
    }
}
