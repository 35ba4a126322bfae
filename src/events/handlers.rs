use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::dto::{EventRequest, EventResponse};
use crate::{auth::extractors::AuthSession, error::AppResult, state::AppState};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/event", put(create_event))
        .route("/event/:id", get(get_event))
        .route("/event/:id/user", put(join_event).delete(leave_event))
}

#[instrument(skip(state, session, payload), fields(user_id = session.id))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(payload): Json<EventRequest>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let event = state.events.create_event(session.id, payload).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[instrument(skip(state, _session))]
pub async fn get_event(
    State(state): State<AppState>,
    AuthSession(_session): AuthSession,
    Path(id): Path<i64>,
) -> AppResult<Json<EventResponse>> {
    let event = state.events.get_event(id).await?;
    Ok(Json(event.into()))
}

#[instrument(skip(state, session), fields(user_id = session.id))]
pub async fn join_event(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<i64>,
) -> AppResult<Json<EventResponse>> {
    let event = state.events.add_attendee(id, session.id).await?;
    Ok(Json(event.into()))
}

#[instrument(skip(state, session), fields(user_id = session.id))]
pub async fn leave_event(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<i64>,
) -> AppResult<Json<EventResponse>> {
    let event = state.events.remove_attendee(id, session.id).await?;
    Ok(Json(event.into()))
}
