/// Token lifecycle: issue, validate, refresh and logout
///
/// Validation runs one linear procedure: signature and expiry, credential
/// kind, the in-memory [`RevocationCache`], then the durable
/// [`RevocationStore`]. Refresh additionally rejects credentials issued
/// before the principal's latest logout. Logout revokes the presented jti
/// and, for access credentials, an optional companion refresh credential
/// plus a logout event, all persisted in one store call.
use actix_middleware::{AuthRejection, TokenRequirement, TokenVerifier};
use async_trait::async_trait;
use chrono::Utc;
use crypto_core::{Claims, IssuedToken, JwtKeys, TokenPair, TokenType};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Credential, RevocationCache};
use crate::db::RevocationStore;
use crate::error::{ApiError, Result};
use crate::metrics;
use crate::models::{LogoutEvent, LogoutRecord, RevocationRecord};

pub struct TokenLifecycle {
    keys: JwtKeys,
    cache: RevocationCache,
    store: Arc<dyn RevocationStore>,
}

impl TokenLifecycle {
    pub fn new(keys: JwtKeys, cache: RevocationCache, store: Arc<dyn RevocationStore>) -> Self {
        Self { keys, cache, store }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn cache(&self) -> &RevocationCache {
        &self.cache
    }

    /// Mint an access/refresh pair for an authenticated principal
    pub fn issue(&self, user_id: Uuid) -> Result<TokenPair> {
        let pair = self.keys.issue_pair(&user_id.to_string())?;
        debug!(
            user_id = %user_id,
            access_jti = %pair.access.claims.jti,
            refresh_jti = %pair.refresh.claims.jti,
            "issued token pair"
        );
        Ok(pair)
    }

    /// Accept or reject a raw token for a route's requirement
    pub async fn validate(
        &self,
        token: &str,
        requirement: TokenRequirement,
    ) -> std::result::Result<Credential, AuthRejection> {
        self.check(token, requirement)
            .await
            .map(|(_, credential)| credential)
    }

    /// Mint a new access credential from a valid refresh credential
    ///
    /// The refresh credential itself is not rotated.
    pub async fn refresh(&self, token: &str) -> std::result::Result<IssuedToken, AuthRejection> {
        let credential = self.validate(token, TokenRequirement::Refresh).await?;
        let claims = credential.claims();

        let logged_out = self
            .store
            .has_logged_out_since(claims.subject, claims.issued_at)
            .await
            .map_err(|e| AuthRejection::Unavailable(e.to_string()))?;

        if logged_out {
            info!(
                user_id = %claims.subject,
                jti = %claims.jti,
                "refresh token predates a logout"
            );
            return Err(reject(AuthRejection::LoggedOut));
        }

        let access = self
            .keys
            .issue(TokenType::Access, &claims.subject.to_string())?;
        debug!(user_id = %claims.subject, jti = %access.claims.jti, "refreshed access token");
        Ok(access)
    }

    /// Revoke a credential, and for access credentials the companion refresh
    /// token and all refresh tokens issued before now
    ///
    /// A companion that fails to decode is logged and skipped.
    pub async fn logout(&self, credential: &Credential, companion: Option<&str>) -> Result<()> {
        let now = Utc::now();
        let primary = credential.claims();

        let mut revocations = vec![RevocationRecord {
            jti: primary.jti.clone(),
            token_type: credential.token_type(),
            created_at: now,
            user_id: primary.subject,
        }];
        let mut event = None;

        if let Credential::Access(claims) = credential {
            if let Some(raw) = companion {
                match self.keys.decode(raw) {
                    Ok(decoded) => revocations.push(RevocationRecord {
                        jti: decoded.jti,
                        token_type: decoded.token_type,
                        created_at: now,
                        user_id: claims.subject,
                    }),
                    Err(e) => warn!(
                        user_id = %claims.subject,
                        error = %e,
                        "could not decode companion refresh token; skipping it"
                    ),
                }
            }

            event = Some(LogoutEvent::new(claims.subject, now));
        }

        for revocation in &revocations {
            self.cache.insert(revocation.jti.clone());
        }

        let record = LogoutRecord {
            revocations,
            event,
        };
        self.store
            .record_logout(&record)
            .await
            .map_err(|e| ApiError::LogoutFailed(e.to_string()))?;

        info!(
            user_id = %primary.subject,
            token_type = %credential.token_type(),
            revoked = record.revocations.len(),
            "logged out"
        );
        Ok(())
    }

    async fn check(
        &self,
        token: &str,
        requirement: TokenRequirement,
    ) -> std::result::Result<(Claims, Credential), AuthRejection> {
        let result = self.check_inner(token, requirement).await;
        if let Err(rejection) = &result {
            metrics::record_token_rejection(rejection.reason());
        }
        result
    }

    async fn check_inner(
        &self,
        token: &str,
        requirement: TokenRequirement,
    ) -> std::result::Result<(Claims, Credential), AuthRejection> {
        let claims = self.keys.decode(token)?;
        let credential = Credential::from_claims(&claims)?.require(requirement)?;

        if self.cache.contains(credential.jti()) {
            debug!(jti = %credential.jti(), "token found in revocation cache");
            return Err(AuthRejection::Revoked);
        }

        let revoked = self
            .store
            .is_jti_revoked(credential.jti())
            .await
            .map_err(|e| AuthRejection::Unavailable(e.to_string()))?;

        if revoked {
            debug!(jti = %credential.jti(), "token found in durable blocklist");
            self.cache.insert(credential.jti());
            return Err(AuthRejection::Revoked);
        }

        Ok((claims, credential))
    }
}

fn reject(rejection: AuthRejection) -> AuthRejection {
    metrics::record_token_rejection(rejection.reason());
    rejection
}

#[async_trait]
impl TokenVerifier for TokenLifecycle {
    async fn verify(
        &self,
        token: &str,
        requirement: TokenRequirement,
    ) -> std::result::Result<Claims, AuthRejection> {
        self.check(token, requirement).await.map(|(claims, _)| claims)
    }
}
