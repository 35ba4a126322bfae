use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tracing::warn;

use crate::repository::with_deadline;
use crate::state::AppState;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub enum Status {
    Available,
    Unavailable,
}

#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ComponentHealth {
    fn from_result<E: std::fmt::Display>(component: &str, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: Status::Available,
                detail: None,
            },
            Err(e) => {
                warn!(component, error = %e, "health check failed");
                Self {
                    status: Status::Unavailable,
                    detail: Some(e.to_string()),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub repository: ComponentHealth,
    pub security: ComponentHealth,
}

impl HealthReport {
    pub fn is_available(&self) -> bool {
        self.repository.status == Status::Available && self.security.status == Status::Available
    }
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

pub async fn check(state: &AppState) -> HealthReport {
    let repository = with_deadline("health check", state.deadline, state.repo.health()).await;
    HealthReport {
        repository: ComponentHealth::from_result("repository", repository),
        security: ComponentHealth::from_result("security", state.credentials.health()),
    }
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let report = check(&state).await;
    let status = if report.is_available() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
