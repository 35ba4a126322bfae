use crate::state::AppState;
use axum::Router;
use thiserror::Error;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod last_login;
pub mod password;
pub mod services;

pub use claims::{SessionClaims, TokenSubject};
pub use jwt::CredentialManager;

/// Failures of the credential manager.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("security configuration error: {0}")]
    Config(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token expired")]
    ExpiredToken,
}

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
