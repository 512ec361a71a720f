// Portal Service Library

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod security;
pub mod services;
pub mod telemetry;

use actix_middleware::TokenVerifier;
use std::sync::Arc;

pub use error::{ApiError, Result};

use db::UserStore;
use security::TokenLifecycle;
use services::ContactRelay;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<TokenLifecycle>,
    pub contact: ContactRelay,
}

impl AppState {
    /// The token lifecycle as the verifier used by the auth middleware
    pub fn verifier(&self) -> Arc<dyn TokenVerifier> {
        self.tokens.clone()
    }
}
