use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::reference::repo_types::{Interest, Language, LoginProvider};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub active: bool,
}

/// User aggregate: account fields plus the optional profile and the
/// security record once loaded.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub active: bool,
    pub profile: Option<Profile>,
    pub security: Option<Security>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            created_at: r.created_at,
            updated_at: r.updated_at,
            active: r.active,
            profile: None,
            security: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{other}'")),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRange {
    #[serde(rename = "18-25")]
    From18To25,
    #[serde(rename = "26-32")]
    From26To32,
    #[serde(rename = "33-39")]
    From33To39,
    #[serde(rename = "40-46")]
    From40To46,
    #[serde(rename = "47-53")]
    From47To53,
    #[serde(rename = "54-60")]
    From54To60,
    #[serde(rename = "61-70")]
    From61To70,
    #[serde(rename = "+70")]
    Over70,
}

impl AgeRange {
    pub const ALL: [AgeRange; 8] = [
        AgeRange::From18To25,
        AgeRange::From26To32,
        AgeRange::From33To39,
        AgeRange::From40To46,
        AgeRange::From47To53,
        AgeRange::From54To60,
        AgeRange::From61To70,
        AgeRange::Over70,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeRange::From18To25 => "18-25",
            AgeRange::From26To32 => "26-32",
            AgeRange::From33To39 => "33-39",
            AgeRange::From40To46 => "40-46",
            AgeRange::From47To53 => "47-53",
            AgeRange::From54To60 => "54-60",
            AgeRange::From61To70 => "61-70",
            AgeRange::Over70 => "+70",
        }
    }
}

impl FromStr for AgeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgeRange::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown age range '{s}'"))
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub fk_language: i64,
    pub age_range: String,
    pub sex: String,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub id: i64,
    pub language: Language,
    pub sex: Sex,
    pub age_range: AgeRange,
    pub updated_at: OffsetDateTime,
    pub interests: Vec<Interest>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SecurityRow {
    pub id: i64,
    pub fk_login_provider: i64,
    pub hash: Option<String>,
    pub last_machine: Option<String>,
    pub last_login_date: Option<OffsetDateTime>,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct Security {
    pub id: i64,
    pub provider: LoginProvider,
    pub hash: Option<String>, // argon2 PHC string, None for federated accounts
    pub last_machine: Option<String>,
    pub last_login: Option<OffsetDateTime>,
    pub updated_at: OffsetDateTime,
}

/// Input for the atomic user + security insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub security: NewSecurity,
}

#[derive(Debug, Clone)]
pub struct NewSecurity {
    pub provider_id: i64,
    pub hash: Option<String>,
    pub last_machine: Option<String>,
}

/// Input for the composite user update.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub profile: Option<ProfileUpdate>,
}

/// A non-positive `id` inserts a new profile, a positive one updates it.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub id: i64,
    pub language_id: i64,
    pub sex: Sex,
    pub age_range: AgeRange,
    pub interest_ids: Vec<i64>,
}
