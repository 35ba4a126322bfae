use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{AgeRange, Profile, Security, Sex, User};
use crate::reference::repo_types::{Interest, Language};

/// Request body for `POST /user`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUserRequest {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>, // defaults to the session email
    pub name: String,
    #[serde(default)]
    pub profile: Option<ProfileRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub id: i64,
    pub language: i64,
    pub sex: String,
    pub age_range: String,
    #[serde(default)]
    pub interests: Vec<i64>,
}

/// Member of an event, as shown to other users.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: i64,
    pub language: Language,
    pub sex: Sex,
    pub age_range: AgeRange,
    pub interests: Vec<Interest>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            language: p.language,
            sex: p.sex,
            age_range: p.age_range,
            interests: p.interests,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginProviderRef {
    pub id: i64,
    pub name: String,
}

/// Security record without the password hash or provider secrets.
#[derive(Debug, Serialize)]
pub struct SecurityResponse {
    pub id: i64,
    pub provider: LoginProviderRef,
    pub has_password: bool,
    pub last_machine: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
}

impl From<Security> for SecurityResponse {
    fn from(s: Security) -> Self {
        Self {
            id: s.id,
            provider: LoginProviderRef {
                id: s.provider.id,
                name: s.provider.name,
            },
            has_password: s.hash.is_some(),
            last_machine: s.last_machine,
            last_login: s.last_login,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub profile: Option<ProfileResponse>,
    pub security: Option<SecurityResponse>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            active: u.active,
            created_at: u.created_at,
            updated_at: u.updated_at,
            profile: u.profile.map(ProfileResponse::from),
            security: u.security.map(SecurityResponse::from),
        }
    }
}
