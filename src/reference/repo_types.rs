use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Provider attached to every password (non-federated) account.
pub const API_LOGIN_PROVIDER_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Interest {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Language {
    pub id: i64,
    pub name: String,
    pub name_iso2: String,
    pub name_iso3: String,
}

/// Client credentials for a federated login source. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct LoginProvider {
    pub id: i64,
    pub name: String,
    pub web_clientid: Option<String>,
    pub web_secret: Option<String>,
    pub android_clientid: Option<String>,
    pub android_secret: Option<String>,
    pub iphone_clientid: Option<String>,
    pub iphone_secret: Option<String>,
    pub updated_at: OffsetDateTime,
}
