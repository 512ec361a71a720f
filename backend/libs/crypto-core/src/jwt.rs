/// JWT credential codec for the portal backend
///
/// Every credential carries a unique `jti`, the principal id in `sub`, the
/// issue time in `iat`, the expiry in `exp` and its kind in `type`.
///
/// ## Key material
///
/// Credentials are signed with HS256 using a shared secret of at least 32
/// bytes. Keys are held by a [`JwtKeys`] value that the service owns and passes
/// around explicitly. There is no process-global key slot.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::{JwtKeys, TokenType};
///
/// let keys = JwtKeys::from_secret(b"0123456789abcdef0123456789abcdef").unwrap();
/// let pair = keys.issue_pair("7d8f8a8e-6b3c-4d5e-9f00-1a2b3c4d5e6f").unwrap();
///
/// let claims = keys.decode(&pair.access.token).unwrap();
/// assert_eq!(claims.token_type, TokenType::Access);
/// ```
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Shortest HMAC secret accepted for HS256
pub const MIN_SECRET_LEN: usize = 32;

const ALGORITHM: Algorithm = Algorithm::HS256;

// ============================================================================
// Data Structures
// ============================================================================

/// Kind of credential, serialized as `"access"` / `"refresh"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire claims of a portal credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (principal id as UUID string)
    pub sub: String,
    /// Unique token id, the revocation key
    pub jti: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.iat, 0)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// A freshly signed credential together with the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Invalid key material: {0}")]
    Key(String),
}

// ============================================================================
// Keys
// ============================================================================

/// Signing and verification keys plus the lifetime of each credential kind
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("algorithm", &ALGORITHM)
            .field("keys", &"[REDACTED]")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl JwtKeys {
    /// HS256 keys from a shared secret
    ///
    /// Secrets shorter than [`MIN_SECRET_LEN`] bytes are rejected.
    pub fn from_secret(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::Key(format!(
                "JWT secret too short: {} bytes, need at least {}",
                secret.len(),
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        })
    }

    /// Override the credential lifetimes
    pub fn with_lifetimes(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn lifetime(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    // ========================================================================
    // Token Generation
    // ========================================================================

    /// Sign a new credential for `subject`, issued now
    pub fn issue(&self, token_type: TokenType, subject: &str) -> Result<IssuedToken, JwtError> {
        self.issue_at(token_type, subject, Utc::now())
    }

    /// Sign a new credential for `subject` with an explicit issue time
    ///
    /// Every call gets a fresh random `jti`.
    pub fn issue_at(
        &self,
        token_type: TokenType,
        subject: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let expires_at = issued_at + self.lifetime(token_type);

        let claims = Claims {
            sub: subject.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            token_type,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| JwtError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Sign an access and a refresh credential for `subject`
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, JwtError> {
        let now = Utc::now();
        Ok(TokenPair {
            access: self.issue_at(TokenType::Access, subject, now)?,
            refresh: self.issue_at(TokenType::Refresh, subject, now)?,
        })
    }

    // ========================================================================
    // Token Validation
    // ========================================================================

    /// Verify signature and expiry, returning the claims
    ///
    /// Only HS256 is accepted. Revocation is not checked
    /// here.
    pub fn decode(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub", "jti"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Invalid(e.to_string()),
            })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"unit-test-secret-unit-test-secret-0001";

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(TEST_SECRET).expect("test keys")
    }

    #[test]
    fn test_issue_access_token() {
        let issued = keys().issue(TokenType::Access, "user-1").unwrap();

        assert_eq!(issued.token.matches('.').count(), 2); // JWT has 3 parts
        assert_eq!(issued.claims.token_type, TokenType::Access);
        assert_eq!(issued.claims.exp - issued.claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_longer_expiry() {
        let pair = keys().issue_pair("user-1").unwrap();

        assert_eq!(
            pair.refresh.claims.exp - pair.refresh.claims.iat,
            REFRESH_TOKEN_TTL_SECS
        );
        assert!(pair.refresh.claims.exp > pair.access.claims.exp);
    }

    #[test]
    fn test_decode_round_trip_keeps_claims() {
        let keys = keys();
        let issued = keys.issue(TokenType::Refresh, "user-2").unwrap();

        let decoded = keys.decode(&issued.token).unwrap();
        assert_eq!(decoded, issued.claims);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let keys = keys();
        let issued = keys
            .issue_at(
                TokenType::Access,
                "user-3",
                Utc::now() - Duration::hours(2),
            )
            .unwrap();

        assert!(matches!(keys.decode(&issued.token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let keys = keys();
        let issued = keys.issue(TokenType::Access, "user-4").unwrap();

        // Swap in a payload claiming another subject, keep the first signature
        let forged = keys.issue(TokenType::Access, "user-999").unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();
        let forged_parts: Vec<&str> = forged.token.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(matches!(keys.decode(&tampered), Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_other_secret_rejected() {
        let issued = keys().issue(TokenType::Access, "user-5").unwrap();
        let other = JwtKeys::from_secret(b"another-secret-another-secret-0002").unwrap();

        assert!(other.decode(&issued.token).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        let result = JwtKeys::from_secret(&[b'a'; 31]);
        assert!(matches!(result, Err(JwtError::Key(_))));

        assert!(JwtKeys::from_secret(&[b'a'; 32]).is_ok());
    }

}
