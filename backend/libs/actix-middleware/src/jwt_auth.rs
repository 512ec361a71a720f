//! Bearer-token authentication middleware
//!
//! The middleware pulls the `Authorization: Bearer <token>` header, hands the
//! token to an injected [`TokenVerifier`] together with the credential kind
//! the route requires, and stores the verified claims in the request
//! extensions as [`AuthClaims`]. Rejections are rendered as JSON responses
//! (`{"error": ..., "status": ...}`) without reaching the handler.
//!
//! ## Example
//! ```rust,ignore
//! use actix_middleware::{JwtAuthMiddleware, TokenRequirement};
//!
//! web::resource("/protected")
//!     .wrap(JwtAuthMiddleware::new(verifier.clone(), TokenRequirement::Access))
//!     .route(web::get().to(protected));
//! ```

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{HeaderValue, AUTHORIZATION},
        StatusCode,
    },
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError,
};
use async_trait::async_trait;
use crypto_core::jwt::{Claims, JwtError, TokenType};
use futures::future::LocalBoxFuture;
use serde_json::json;
use std::fmt;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

/// Which credential kinds a route admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequirement {
    Access,
    Refresh,
    Any,
}

impl TokenRequirement {
    pub fn admits(&self, token_type: TokenType) -> bool {
        match self {
            TokenRequirement::Access => token_type == TokenType::Access,
            TokenRequirement::Refresh => token_type == TokenType::Refresh,
            TokenRequirement::Any => true,
        }
    }
}

impl fmt::Display for TokenRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRequirement::Access => f.write_str("access"),
            TokenRequirement::Refresh => f.write_str("refresh"),
            TokenRequirement::Any => f.write_str("any"),
        }
    }
}

/// Why a presented credential was not accepted
#[derive(Debug, thiserror::Error)]
pub enum AuthRejection {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token has been revoked")]
    Revoked,

    /// Refresh credential issued before the principal's latest logout
    #[error("Token has been revoked")]
    LoggedOut,

    #[error("Only {expected} tokens are allowed, got {actual}")]
    WrongType {
        expected: TokenRequirement,
        actual: TokenType,
    },

    #[error("Token revocation check failed: {0}")]
    Unavailable(String),
}

impl AuthRejection {
    /// Short label for logs and metrics
    pub fn reason(&self) -> &'static str {
        match self {
            AuthRejection::MissingToken => "missing_token",
            AuthRejection::MalformedHeader => "malformed_header",
            AuthRejection::Expired => "expired",
            AuthRejection::Invalid(_) => "invalid",
            AuthRejection::Revoked => "revoked",
            AuthRejection::LoggedOut => "logged_out",
            AuthRejection::WrongType { .. } => "wrong_type",
            AuthRejection::Unavailable(_) => "unavailable",
        }
    }

    fn public_message(&self) -> String {
        match self {
            AuthRejection::Unavailable(_) => "Token revocation check failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthRejection::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<JwtError> for AuthRejection {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthRejection::Expired,
            JwtError::Invalid(msg) => AuthRejection::Invalid(msg),
            JwtError::Signing(msg) | JwtError::Key(msg) => AuthRejection::Unavailable(msg),
        }
    }
}

/// Decides whether a raw bearer token is acceptable for a route
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(
        &self,
        token: &str,
        requirement: TokenRequirement,
    ) -> Result<Claims, AuthRejection>;
}

/// Extract the token from a `Bearer <token>` header value
pub fn bearer_token(value: Option<&HeaderValue>) -> Result<&str, AuthRejection> {
    let value = value.ok_or(AuthRejection::MissingToken)?;
    let value = value.to_str().map_err(|_| AuthRejection::MalformedHeader)?;

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthRejection::MalformedHeader),
    }
}

/// Verified claims inserted by [`JwtAuthMiddleware`]
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl FromRequest for AuthClaims {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthClaims>()
                .cloned()
                .ok_or(AuthRejection::MissingToken),
        )
    }
}

/// Raw bearer token from the `Authorization` header, not yet verified
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl FromRequest for BearerToken {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            bearer_token(req.headers().get(AUTHORIZATION))
                .map(|token| BearerToken(token.to_string())),
        )
    }
}

/// JWT Authentication Middleware
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    verifier: Arc<dyn TokenVerifier>,
    requirement: TokenRequirement,
}

impl JwtAuthMiddleware {
    pub fn new(verifier: Arc<dyn TokenVerifier>, requirement: TokenRequirement) -> Self {
        Self {
            verifier,
            requirement,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            requirement: self.requirement,
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    verifier: Arc<dyn TokenVerifier>,
    requirement: TokenRequirement,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verifier = self.verifier.clone();
        let requirement = self.requirement;

        Box::pin(async move {
            let token = bearer_token(req.headers().get(AUTHORIZATION)).map(str::to_string);

            let verified = match token {
                Ok(token) => verifier.verify(&token, requirement).await,
                Err(rejection) => Err(rejection),
            };

            match verified {
                Ok(claims) => {
                    req.extensions_mut().insert(AuthClaims(claims));
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(rejection) => {
                    tracing::warn!(
                        path = %req.path(),
                        reason = rejection.reason(),
                        "JWT authentication rejected request"
                    );
                    let response = rejection.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};
    use crypto_core::jwt::JwtKeys;
    use std::collections::HashSet;

    struct StubVerifier {
        keys: JwtKeys,
        revoked: HashSet<String>,
        fail_lookups: bool,
    }

    #[async_trait]
    impl TokenVerifier for StubVerifier {
        async fn verify(
            &self,
            token: &str,
            requirement: TokenRequirement,
        ) -> Result<Claims, AuthRejection> {
            let claims = self.keys.decode(token)?;
            if !requirement.admits(claims.token_type) {
                return Err(AuthRejection::WrongType {
                    expected: requirement,
                    actual: claims.token_type,
                });
            }
            if self.fail_lookups {
                return Err(AuthRejection::Unavailable("store offline".into()));
            }
            if self.revoked.contains(&claims.jti) {
                return Err(AuthRejection::Revoked);
            }
            Ok(claims)
        }
    }

    fn keys() -> JwtKeys {
        JwtKeys::from_secret(b"middleware-test-secret-0123456789abcdef").unwrap()
    }

    async fn whoami(claims: AuthClaims) -> HttpResponse {
        HttpResponse::Ok().body(claims.0.sub)
    }

    fn verifier(revoked: &[&str], fail_lookups: bool) -> Arc<dyn TokenVerifier> {
        Arc::new(StubVerifier {
            keys: keys(),
            revoked: revoked.iter().map(|s| s.to_string()).collect(),
            fail_lookups,
        })
    }

    macro_rules! app {
        ($verifier:expr, $requirement:expr) => {
            test::init_service(
                App::new().service(
                    web::resource("/whoami")
                        .wrap(JwtAuthMiddleware::new($verifier, $requirement))
                        .route(web::get().to(whoami)),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_valid_token_reaches_handler_with_claims() {
        let app = app!(verifier(&[], false), TokenRequirement::Access);
        let token = keys().issue(TokenType::Access, "user-42").unwrap().token;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, "user-42");
    }

    #[actix_web::test]
    async fn test_missing_header_is_401_json() {
        let app = app!(verifier(&[], false), TokenRequirement::Access);

        let req = test::TestRequest::get().uri("/whoami").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing Authorization header");
        assert_eq!(body["status"], 401);
    }

    #[actix_web::test]
    async fn test_non_bearer_scheme_rejected() {
        let app = app!(verifier(&[], false), TokenRequirement::Any);

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_revoked_token_rejected() {
        let issued = keys().issue(TokenType::Access, "user-7").unwrap();
        let app = app!(
            verifier(&[issued.claims.jti.as_str()], false),
            TokenRequirement::Access
        );

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", issued.token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Token has been revoked");
    }

    #[actix_web::test]
    async fn test_refresh_token_on_access_route_rejected() {
        let app = app!(verifier(&[], false), TokenRequirement::Access);
        let token = keys().issue(TokenType::Refresh, "user-8").unwrap().token;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_any_requirement_admits_refresh_token() {
        let app = app!(verifier(&[], false), TokenRequirement::Any);
        let token = keys().issue(TokenType::Refresh, "user-9").unwrap().token;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_lookup_failure_is_500() {
        let app = app!(verifier(&[], true), TokenRequirement::Access);
        let token = keys().issue(TokenType::Access, "user-10").unwrap().token;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Token revocation check failed");
    }

    #[actix_web::test]
    async fn test_bearer_token_parsing() {
        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(bearer_token(Some(&ok)).unwrap(), "abc.def.ghi");

        let empty = HeaderValue::from_static("Bearer ");
        assert!(matches!(
            bearer_token(Some(&empty)),
            Err(AuthRejection::MalformedHeader)
        ));
        assert!(matches!(bearer_token(None), Err(AuthRejection::MissingToken)));
    }
}
