use dashmap::DashSet;
use std::sync::Arc;

/// Process-local set of revoked token ids
///
/// Append-only and shared by every request of the process. It holds at least
/// every jti this process has revoked or seen revoked since startup; the
/// durable blocklist stays authoritative.
#[derive(Debug, Clone, Default)]
pub struct RevocationCache {
    revoked: Arc<DashSet<String>>,
}

impl RevocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the jti was not present before
    pub fn insert(&self, jti: impl Into<String>) -> bool {
        self.revoked.insert(jti.into())
    }

    pub fn contains(&self, jti: &str) -> bool {
        self.revoked.contains(jti)
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}
