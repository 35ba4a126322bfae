//! Aggregate persistence for users, profiles, security records, events and
//! the reference data they point at.
//!
//! Every "by id"/"by email" accessor probes for existence first and fetches
//! second, so an absent entity (`NotFound`) stays distinguishable from a row
//! that exists but cannot be read (`MalformedRow`). Writes that touch more
//! than one table run on a single transaction handle and either commit as a
//! whole or roll back as a whole.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::events::repo_types::{Event, NewEvent};
use crate::reference::repo_types::{Interest, Language, LoginProvider};
use crate::users::repo_types::{NewUser, Profile, Security, User, UserUpdate};

mod postgres;

pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{kind} constraint violation: {detail}")]
    ConstraintViolation {
        kind: ConstraintKind,
        constraint: Option<String>,
        detail: String,
    },

    #[error("transaction failed during {operation}: {cause}")]
    TransactionFailure {
        operation: &'static str,
        #[source]
        cause: sqlx::Error,
    },

    #[error("cannot add the event creator as an attendee")]
    CannotAddCreatorAsAttendee,

    #[error("malformed {entity} row for id {id}: {cause}")]
    MalformedRow {
        entity: &'static str,
        id: String,
        #[source]
        cause: sqlx::Error,
    },

    #[error("store error during {operation}: {cause}")]
    Store {
        operation: &'static str,
        #[source]
        cause: sqlx::Error,
    },

    #[error("deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Which table constraint a write tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::Check => "check",
        }
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RepoError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        RepoError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Read-side failure outside a transaction.
    pub fn store(operation: &'static str, cause: sqlx::Error) -> Self {
        RepoError::Store { operation, cause }
    }

    /// Statement failure inside a transaction; constraint violations keep
    /// their own kind.
    pub fn write(operation: &'static str, cause: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &cause {
            let kind = if db.is_unique_violation() {
                Some(ConstraintKind::Unique)
            } else if db.is_foreign_key_violation() {
                Some(ConstraintKind::ForeignKey)
            } else if db.is_check_violation() {
                Some(ConstraintKind::Check)
            } else {
                None
            };
            if let Some(kind) = kind {
                return RepoError::ConstraintViolation {
                    kind,
                    constraint: db.constraint().map(str::to_string),
                    detail: format!("{operation}: {}", db.message()),
                };
            }
        }
        RepoError::TransactionFailure { operation, cause }
    }
}

/// Store operations needed by the service layer.
///
/// Implementations hold no per-call state; a multi-statement write opens its
/// own transaction for the duration of the call.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn health(&self) -> RepoResult<()>;

    // Reference data
    async fn find_interest_by_id(&self, id: i64) -> RepoResult<Interest>;
    async fn list_interests(&self) -> RepoResult<Vec<Interest>>;
    async fn find_language_by_id(&self, id: i64) -> RepoResult<Language>;
    async fn list_languages(&self) -> RepoResult<Vec<Language>>;
    async fn find_login_provider_by_id(&self, id: i64) -> RepoResult<LoginProvider>;

    // Users
    async fn user_is_active(&self, id: i64) -> RepoResult<bool>;
    async fn email_in_use(&self, email: &str) -> RepoResult<bool>;
    async fn find_user_by_id(&self, id: i64) -> RepoResult<User>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<User>;
    /// Inserts the user and its security record atomically; returns the user id.
    async fn insert_user(&self, user: &NewUser) -> RepoResult<i64>;
    /// Updates the user row and inserts or updates the profile, replacing its
    /// interests, atomically.
    async fn update_user(&self, update: &UserUpdate) -> RepoResult<()>;
    async fn find_profile_by_user_id(&self, user_id: i64) -> RepoResult<Profile>;
    async fn find_security_by_user_id(&self, user_id: i64) -> RepoResult<Security>;
    async fn update_login_data(&self, security_id: i64, origin: Option<&str>) -> RepoResult<()>;

    // Events
    async fn event_is_active(&self, id: i64) -> RepoResult<bool>;
    async fn find_event_by_id(&self, id: i64) -> RepoResult<Event>;
    async fn insert_event(&self, event: &NewEvent) -> RepoResult<i64>;
    /// Fails with `CannotAddCreatorAsAttendee` when `user_id` created the event.
    async fn add_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()>;
    async fn remove_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()>;
}

/// Existence probe followed by a full fetch.
pub(crate) async fn check_then_fetch<T, P, F, Fut>(
    entity: &'static str,
    id: impl ToString,
    probe: P,
    fetch: F,
) -> RepoResult<T>
where
    P: Future<Output = Result<bool, sqlx::Error>>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let id = id.to_string();
    let found = probe
        .await
        .map_err(|cause| RepoError::store("existence probe", cause))?;
    if !found {
        return Err(RepoError::NotFound { entity, id });
    }
    match fetch().await {
        Ok(row) => Ok(row),
        // deleted between probe and fetch
        Err(sqlx::Error::RowNotFound) => Err(RepoError::NotFound { entity, id }),
        Err(cause) => Err(RepoError::MalformedRow { entity, id, cause }),
    }
}

/// Bounds a store call; on expiry the future is dropped, which rolls back any
/// transaction it still holds.
pub async fn with_deadline<T>(
    operation: &'static str,
    deadline: Duration,
    fut: impl Future<Output = RepoResult<T>>,
) -> RepoResult<T> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RepoError::DeadlineExceeded { operation }),
    }
}
