use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use super::dto::EventRequest;
use super::repo_types::{Event, NewEvent};
use crate::error::{AppError, AppResult};
use crate::repository::{with_deadline, RepoError, Repository};
use crate::validation::{validate_coordinates, validate_text};

#[derive(Clone)]
pub struct EventService {
    repo: Arc<dyn Repository>,
    deadline: Duration,
}

impl EventService {
    pub fn new(repo: Arc<dyn Repository>, deadline: Duration) -> Self {
        Self { repo, deadline }
    }

    #[instrument(skip(self, req))]
    pub async fn create_event(&self, creator_id: i64, req: EventRequest) -> AppResult<Event> {
        if req.start_date >= req.end_date {
            return Err(AppError::validation("end_date", "must be after start_date"));
        }
        validate_text("location", &req.location)?;
        validate_coordinates(req.longitude, req.latitude)?;

        self.require_active_user(creator_id).await?;

        let new_event = NewEvent {
            start_date: req.start_date,
            end_date: req.end_date,
            location: req.location.trim().to_string(),
            longitude: req.longitude,
            latitude: req.latitude,
            active: req.active,
            created_by: creator_id,
        };
        let event_id =
            with_deadline("insert event", self.deadline, self.repo.insert_event(&new_event))
                .await?;
        info!(event_id, creator_id, "event created");

        self.get_event(event_id).await
    }

    pub async fn get_event(&self, id: i64) -> AppResult<Event> {
        Ok(with_deadline("find event", self.deadline, self.repo.find_event_by_id(id)).await?)
    }

    /// The creator is refused before the active flags are looked at.
    #[instrument(skip(self))]
    pub async fn add_attendee(&self, event_id: i64, user_id: i64) -> AppResult<Event> {
        let event = self.get_event(event_id).await?;
        if event.created_by.id == user_id {
            return Err(AppError::CannotAddCreatorAsAttendee);
        }
        self.require_active_event(event_id).await?;
        self.require_active_user(user_id).await?;

        with_deadline(
            "add attendee",
            self.deadline,
            self.repo.add_attendee(event_id, user_id),
        )
        .await?;
        info!(event_id, user_id, "attendee added");

        self.get_event(event_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_attendee(&self, event_id: i64, user_id: i64) -> AppResult<Event> {
        self.require_active_event(event_id).await?;
        self.require_active_user(user_id).await?;

        with_deadline(
            "remove attendee",
            self.deadline,
            self.repo.remove_attendee(event_id, user_id),
        )
        .await?;
        info!(event_id, user_id, "attendee removed");

        self.get_event(event_id).await
    }

    async fn require_active_event(&self, id: i64) -> AppResult<()> {
        if !with_deadline("event active probe", self.deadline, self.repo.event_is_active(id))
            .await?
        {
            return Err(RepoError::not_found("event", id).into());
        }
        Ok(())
    }

    async fn require_active_user(&self, id: i64) -> AppResult<()> {
        if !with_deadline("user active probe", self.deadline, self.repo.user_is_active(id)).await?
        {
            return Err(RepoError::not_found("user", id).into());
        }
        Ok(())
    }
}
