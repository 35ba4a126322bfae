use sqlx::FromRow;
use time::OffsetDateTime;

use crate::users::repo_types::User;

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    pub active: bool,
    pub fk_created_by: i64,
}

/// Event aggregate: core fields, creator and attendees (creator excluded).
#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub created_at: OffsetDateTime,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    pub active: bool,
    pub created_by: User,
    pub attendees: Vec<User>,
}

impl Event {
    pub fn from_row(row: EventRow, created_by: User, attendees: Vec<User>) -> Self {
        Self {
            id: row.id,
            created_at: row.created_at,
            start_date: row.start_date,
            end_date: row.end_date,
            location: row.location,
            longitude: row.longitude,
            latitude: row.latitude,
            active: row.active,
            created_by,
            attendees,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub location: String,
    pub longitude: f64,
    pub latitude: f64,
    pub active: bool,
    pub created_by: i64,
}
