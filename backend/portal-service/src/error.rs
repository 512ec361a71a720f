use actix_middleware::AuthRejection;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use crypto_core::JwtError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated")]
    AccountDeactivated,

    #[error(transparent)]
    Token(#[from] AuthRejection),

    #[error("Error during logout: {0}")]
    LogoutFailed(String),

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Storage and internal failures during login collapse into one generic
    /// failure; credential errors pass through untouched
    pub fn during_login(self) -> Self {
        match self {
            ApiError::Database(msg) | ApiError::Internal(msg) => ApiError::LoginFailed(msg),
            other => other,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::LogoutFailed(_) => "Error during logout".to_string(),
            ApiError::LoginFailed(_) => "An error occurred during login".to_string(),
            ApiError::Database(_) | ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::EmailAlreadyExists => StatusCode::CONFLICT,
            ApiError::InvalidCredentials | ApiError::AccountDeactivated => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Token(rejection) => rejection.status_code(),
            ApiError::LogoutFailed(_)
            | ApiError::LoginFailed(_)
            | ApiError::Database(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Token(rejection) = self {
            return rejection.error_response();
        }

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        HttpResponse::build(status).json(json!({
            "error": self.public_message(),
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Signing(msg) | JwtError::Key(msg) => ApiError::Internal(msg),
            other => ApiError::Token(AuthRejection::from(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: ApiError) -> serde_json::Value {
        let resp = err.error_response();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::AccountDeactivated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Token(AuthRejection::Revoked).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::LogoutFailed("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn test_database_detail_not_leaked() {
        let body = body_json(ApiError::Database("relation users does not exist".into())).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["status"], 500);
    }

    #[actix_web::test]
    async fn test_login_failure_is_generic() {
        let err = ApiError::Database("connection refused".into()).during_login();
        assert!(matches!(err, ApiError::LoginFailed(_)));

        let body = body_json(err).await;
        assert_eq!(body["error"], "An error occurred during login");

        assert!(matches!(
            ApiError::InvalidCredentials.during_login(),
            ApiError::InvalidCredentials
        ));
    }

    #[test]
    fn test_jwt_error_mapping() {
        assert!(matches!(
            ApiError::from(JwtError::Expired),
            ApiError::Token(AuthRejection::Expired)
        ));
        assert!(matches!(
            ApiError::from(JwtError::Signing("bad key".into())),
            ApiError::Internal(_)
        ));
    }
}
