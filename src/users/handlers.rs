use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{UpdateUserRequest, UserResponse};
use crate::{auth::extractors::AuthSession, error::AppResult, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/user", post(update_user))
}

#[instrument(skip(state, session), fields(user_id = session.id))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.get_user(session.id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, session, payload), fields(user_id = session.id))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.update_user(&session, payload).await?;
    Ok(Json(user.into()))
}
