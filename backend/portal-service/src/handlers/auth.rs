/// Authentication handlers
use actix_middleware::{bearer_token, AuthClaims, BearerToken};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{ApiError, Result},
    metrics,
    models::{user::DEFAULT_ROLE_ID, LoginRequest, NewUser, RegisterRequest, UserProfile},
    security::{password, Credential},
    AppState,
};

/// Header carrying the companion refresh token on logout
pub const REFRESH_TOKEN_HEADER: &str = "X-Refresh-Token";

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user_id: Uuid,
}

fn outcome<T>(event: &str, result: &Result<T>) {
    let label = match result {
        Ok(_) => "success",
        Err(ApiError::Validation(_)) => "invalid",
        Err(ApiError::EmailAlreadyExists) => "conflict",
        Err(ApiError::InvalidCredentials) | Err(ApiError::AccountDeactivated) => "denied",
        Err(ApiError::Token(_)) => "rejected",
        Err(_) => "error",
    };
    metrics::record_auth_event(event, label);
}

/// Register endpoint handler
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let result = register_user(&state, payload.into_inner()).await;
    outcome("register", &result);

    let user_id = result?;
    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        user_id,
    }))
}

async fn register_user(state: &AppState, payload: RegisterRequest) -> Result<Uuid> {
    payload.validate()?;

    if state.users.email_exists(&payload.email).await? {
        return Err(ApiError::EmailAlreadyExists);
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = state
        .users
        .create_user(NewUser {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            location_id: payload.location_id,
            role_id: DEFAULT_ROLE_ID,
        })
        .await?;

    tracing::info!(user_id = %user.user_id, "user registered");
    Ok(user.user_id)
}

/// Login endpoint handler
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    if !payload.is_complete() {
        metrics::record_auth_event("login", "invalid");
        return Err(ApiError::Validation("Missing required fields".into()));
    }

    let result = authenticate(&state, &payload)
        .await
        .map_err(ApiError::during_login);
    outcome("login", &result);

    Ok(HttpResponse::Ok().json(result?))
}

async fn authenticate(state: &AppState, payload: &LoginRequest) -> Result<LoginResponse> {
    let record = state
        .users
        .find_by_email(&payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    password::verify_password(&payload.password, &record.user.password_hash)?;

    if !record.user.is_active {
        tracing::info!(user_id = %record.user.user_id, "login refused for deactivated account");
        return Err(ApiError::AccountDeactivated);
    }

    let pair = state.tokens.issue(record.user.user_id)?;
    tracing::info!(user_id = %record.user.user_id, "user logged in");

    Ok(LoginResponse {
        access_token: pair.access.token,
        refresh_token: pair.refresh.token,
        user: UserProfile::from(&record),
    })
}

/// Exchange a refresh token for a new access token
pub async fn refresh(state: web::Data<AppState>, token: BearerToken) -> Result<HttpResponse> {
    let result = state.tokens.refresh(&token.0).await.map_err(ApiError::from);
    outcome("refresh", &result);

    let access = result?;
    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token: access.token,
    }))
}

/// Revoke the presented token (and the companion refresh token, if any)
pub async fn logout(
    state: web::Data<AppState>,
    claims: AuthClaims,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let credential = Credential::from_claims(&claims.0)?;
    let companion = bearer_token(req.headers().get(REFRESH_TOKEN_HEADER)).ok();

    let result = state.tokens.logout(&credential, companion).await;
    outcome("logout", &result);
    result?;

    Ok(HttpResponse::Ok().json(LogoutResponse {
        msg: format!(
            "Logged out successfully. Token type: {}",
            credential.token_type()
        ),
    }))
}

pub async fn protected(claims: AuthClaims) -> Result<HttpResponse> {
    let credential = Credential::from_claims(&claims.0)?;
    let user_id = credential.subject();

    Ok(HttpResponse::Ok().json(ProtectedResponse {
        message: format!("You have accessed a protected route, {}!", user_id),
        user_id,
    }))
}
