use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{post, put},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        extractors::ClientOrigin,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::dto::UserResponse,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", put(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload, origin))]
pub async fn register(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.auth.register_user(payload, origin).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Returns the token in the body and as `Authorization: Bearer <token>`.
#[instrument(skip(state, payload, origin))]
pub async fn login(
    State(state): State<AppState>,
    ClientOrigin(origin): ClientOrigin,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let outcome = state.auth.login(payload, origin).await?;

    let value = HeaderValue::from_str(&format!("Bearer {}", outcome.token)).map_err(|e| {
        error!(error = %e, "token is not a valid header value");
        AppError::Internal {
            message: e.to_string(),
        }
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, value);

    Ok((
        headers,
        Json(LoginResponse {
            token: outcome.token,
            user: outcome.user.into(),
        }),
    ))
}
