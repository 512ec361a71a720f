//! # Actix Middleware Library
//!
//! Middleware shared by the portal's Actix services
//!
//! ## Modules
//! - `jwt_auth`: bearer-token authentication against an injected verifier
//! - `logging`: request id tagging and request/response logging

pub mod jwt_auth;
pub mod logging;

pub use jwt_auth::{
    bearer_token, AuthClaims, AuthRejection, BearerToken, JwtAuthMiddleware, TokenRequirement,
    TokenVerifier,
};
pub use logging::{Logging, RequestId, REQUEST_ID_HEADER};
