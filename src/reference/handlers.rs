use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use super::repo_types::{Interest, Language};
use crate::{auth::extractors::AuthSession, error::AppResult, state::AppState};

pub fn reference_routes() -> Router<AppState> {
    Router::new()
        .route("/interest", get(list_interests))
        .route("/interest/:id", get(get_interest))
        .route("/language", get(list_languages))
}

pub async fn list_interests(
    State(state): State<AppState>,
    _session: AuthSession,
) -> AppResult<Json<Vec<Interest>>> {
    Ok(Json(state.reference.list_interests().await?))
}

pub async fn get_interest(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(id): Path<i64>,
) -> AppResult<Json<Interest>> {
    Ok(Json(state.reference.get_interest(id).await?))
}

pub async fn list_languages(
    State(state): State<AppState>,
    _session: AuthSession,
) -> AppResult<Json<Vec<Language>>> {
    Ok(Json(state.reference.list_languages().await?))
}
