/// Typed view of verified token claims
use actix_middleware::{AuthRejection, TokenRequirement};
use chrono::{DateTime, Utc};
use crypto_core::{Claims, TokenType};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialClaims {
    pub jti: String,
    pub subject: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A decoded credential, tagged by kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Access(CredentialClaims),
    Refresh(CredentialClaims),
}

impl Credential {
    /// Build a credential from decoded wire claims
    ///
    /// Fails when the subject is not a user id or a timestamp is out of range.
    pub fn from_claims(claims: &Claims) -> Result<Self, AuthRejection> {
        let subject = Uuid::parse_str(&claims.sub)
            .map_err(|_| AuthRejection::Invalid("subject is not a user id".to_string()))?;
        let issued_at = claims
            .issued_at()
            .ok_or_else(|| AuthRejection::Invalid("iat out of range".to_string()))?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| AuthRejection::Invalid("exp out of range".to_string()))?;

        let inner = CredentialClaims {
            jti: claims.jti.clone(),
            subject,
            issued_at,
            expires_at,
        };

        Ok(match claims.token_type {
            TokenType::Access => Credential::Access(inner),
            TokenType::Refresh => Credential::Refresh(inner),
        })
    }

    pub fn token_type(&self) -> TokenType {
        match self {
            Credential::Access(_) => TokenType::Access,
            Credential::Refresh(_) => TokenType::Refresh,
        }
    }

    pub fn claims(&self) -> &CredentialClaims {
        match self {
            Credential::Access(claims) | Credential::Refresh(claims) => claims,
        }
    }

    pub fn jti(&self) -> &str {
        &self.claims().jti
    }

    pub fn subject(&self) -> Uuid {
        self.claims().subject
    }

    /// Reject the credential unless the route admits its kind
    pub fn require(self, requirement: TokenRequirement) -> Result<Self, AuthRejection> {
        let actual = self.token_type();
        if requirement.admits(actual) {
            Ok(self)
        } else {
            Err(AuthRejection::WrongType {
                expected: requirement,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str, token_type: TokenType) -> Claims {
        Claims {
            sub: sub.to_string(),
            jti: "jti-1".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
            token_type,
        }
    }

    #[test]
    fn test_from_claims_tags_by_type() {
        let id = Uuid::new_v4();

        let access = Credential::from_claims(&claims(&id.to_string(), TokenType::Access)).unwrap();
        assert!(matches!(access, Credential::Access(_)));
        assert_eq!(access.subject(), id);
        assert_eq!(access.jti(), "jti-1");
        assert_eq!(access.claims().issued_at.timestamp(), 1_700_000_000);

        let refresh =
            Credential::from_claims(&claims(&id.to_string(), TokenType::Refresh)).unwrap();
        assert_eq!(refresh.token_type(), TokenType::Refresh);
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        assert!(matches!(
            Credential::from_claims(&claims("42", TokenType::Access)),
            Err(AuthRejection::Invalid(_))
        ));
    }

    #[test]
    fn test_require() {
        let id = Uuid::new_v4().to_string();
        let refresh = Credential::from_claims(&claims(&id, TokenType::Refresh)).unwrap();

        assert!(refresh.clone().require(TokenRequirement::Refresh).is_ok());
        assert!(refresh.clone().require(TokenRequirement::Any).is_ok());
        assert!(matches!(
            refresh.require(TokenRequirement::Access),
            Err(AuthRejection::WrongType {
                expected: TokenRequirement::Access,
                actual: TokenType::Refresh
            })
        ));
    }
}
