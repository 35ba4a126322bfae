use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::Event;
use crate::users::dto::PublicUser;

fn default_active() -> bool {
    true
}

/// Request body for `PUT /event`; dates are RFC 3339.
#[derive(Debug, Clone, Deserialize)]
pub struct EventRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_date: OffsetDateTime,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    pub active: bool,
    pub created_by: PublicUser,
    pub attendees: Vec<PublicUser>,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            created_at: e.created_at,
            start_date: e.start_date,
            end_date: e.end_date,
            location: e.location,
            longitude: e.longitude,
            latitude: e.latitude,
            active: e.active,
            created_by: PublicUser::from(&e.created_by),
            attendees: e.attendees.iter().map(PublicUser::from).collect(),
        }
    }
}
