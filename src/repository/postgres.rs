use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use super::{check_then_fetch, RepoError, RepoResult, Repository};
use crate::events::repo as event_sql;
use crate::events::repo_types::{Event, NewEvent};
use crate::reference::repo as reference_sql;
use crate::reference::repo_types::{Interest, Language, LoginProvider};
use crate::users::repo as user_sql;
use crate::users::repo_types::{
    AgeRange, NewUser, Profile, ProfileRow, Security, SecurityRow, Sex, User, UserUpdate,
};

/// Postgres-backed repository over a shared pool.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, operation: &'static str) -> RepoResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|cause| RepoError::TransactionFailure { operation, cause })
    }

    /// Commits on success, rolls back explicitly on the first error.
    async fn finish<T>(
        tx: Transaction<'static, Postgres>,
        operation: &'static str,
        result: RepoResult<T>,
    ) -> RepoResult<T> {
        match result {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|cause| RepoError::TransactionFailure { operation, cause })?;
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(operation, error = %rb, "rollback failed");
                }
                debug!(operation, error = %e, "transaction rolled back");
                Err(e)
            }
        }
    }

    async fn insert_user_in(
        tx: &mut Transaction<'static, Postgres>,
        user: &NewUser,
    ) -> RepoResult<i64> {
        let user_id = user_sql::insert_user_tx(tx, &user.email, &user.name)
            .await
            .map_err(|e| RepoError::write("insert user", e))?;
        user_sql::insert_security_tx(tx, user_id, &user.security)
            .await
            .map_err(|e| RepoError::write("insert security", e))?;
        Ok(user_id)
    }

    async fn update_user_in(
        tx: &mut Transaction<'static, Postgres>,
        update: &UserUpdate,
    ) -> RepoResult<()> {
        let rows = user_sql::update_user_tx(tx, update.id, &update.email, &update.name)
            .await
            .map_err(|e| RepoError::write("update user", e))?;
        if rows == 0 {
            return Err(RepoError::not_found("user", update.id));
        }

        let Some(profile) = &update.profile else {
            return Ok(());
        };
        let profile_id = if profile.id <= 0 {
            user_sql::insert_profile_tx(tx, update.id, profile)
                .await
                .map_err(|e| RepoError::write("insert profile", e))?
        } else {
            let rows = user_sql::update_profile_tx(tx, update.id, profile)
                .await
                .map_err(|e| RepoError::write("update profile", e))?;
            if rows == 0 {
                return Err(RepoError::not_found("profile", profile.id));
            }
            profile.id
        };
        user_sql::replace_interests_tx(tx, profile_id, &profile.interest_ids)
            .await
            .map_err(|e| RepoError::write("replace interests", e))
    }

    async fn add_attendee_in(
        tx: &mut Transaction<'static, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> RepoResult<()> {
        let creator = event_sql::find_event_creator_tx(tx, event_id)
            .await
            .map_err(|e| RepoError::write("lock event", e))?
            .ok_or_else(|| RepoError::not_found("event", event_id))?;
        if creator == user_id {
            return Err(RepoError::CannotAddCreatorAsAttendee);
        }
        event_sql::insert_attendee_tx(tx, event_id, user_id)
            .await
            .map_err(|e| RepoError::write("insert attendee", e))
    }

    async fn profile_from_row(&self, row: ProfileRow) -> RepoResult<Profile> {
        let malformed = |reason: String| RepoError::MalformedRow {
            entity: "profile",
            id: row.id.to_string(),
            cause: sqlx::Error::Decode(reason.into()),
        };
        let sex = row.sex.parse::<Sex>().map_err(malformed)?;
        let age_range = row.age_range.parse::<AgeRange>().map_err(malformed)?;
        let language = self.find_language_by_id(row.fk_language).await?;
        let interests = reference_sql::list_interests_by_profile(&self.pool, row.id)
            .await
            .map_err(|e| RepoError::store("list profile interests", e))?;
        Ok(Profile {
            id: row.id,
            language,
            sex,
            age_range,
            updated_at: row.updated_at,
            interests,
        })
    }

    async fn security_from_row(&self, row: SecurityRow) -> RepoResult<Security> {
        let provider = self.find_login_provider_by_id(row.fk_login_provider).await?;
        Ok(Security {
            id: row.id,
            provider,
            hash: row.hash,
            last_machine: row.last_machine,
            last_login: row.last_login_date,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn health(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| RepoError::store("health check", e))?;
        Ok(())
    }

    async fn find_interest_by_id(&self, id: i64) -> RepoResult<Interest> {
        check_then_fetch(
            "interest",
            id,
            reference_sql::interest_exists(&self.pool, id),
            || reference_sql::get_interest(&self.pool, id),
        )
        .await
    }

    async fn list_interests(&self) -> RepoResult<Vec<Interest>> {
        reference_sql::list_interests(&self.pool)
            .await
            .map_err(|e| RepoError::store("list interests", e))
    }

    async fn find_language_by_id(&self, id: i64) -> RepoResult<Language> {
        check_then_fetch(
            "language",
            id,
            reference_sql::language_exists(&self.pool, id),
            || reference_sql::get_language(&self.pool, id),
        )
        .await
    }

    async fn list_languages(&self) -> RepoResult<Vec<Language>> {
        reference_sql::list_languages(&self.pool)
            .await
            .map_err(|e| RepoError::store("list languages", e))
    }

    async fn find_login_provider_by_id(&self, id: i64) -> RepoResult<LoginProvider> {
        check_then_fetch(
            "login_provider",
            id,
            reference_sql::login_provider_exists(&self.pool, id),
            || reference_sql::get_login_provider(&self.pool, id),
        )
        .await
    }

    async fn user_is_active(&self, id: i64) -> RepoResult<bool> {
        user_sql::user_is_active(&self.pool, id)
            .await
            .map_err(|e| RepoError::store("user active probe", e))
    }

    async fn email_in_use(&self, email: &str) -> RepoResult<bool> {
        user_sql::active_email_exists(&self.pool, email)
            .await
            .map_err(|e| RepoError::store("email probe", e))
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<User> {
        check_then_fetch("user", id, user_sql::user_exists(&self.pool, id), || {
            user_sql::get_user(&self.pool, id)
        })
        .await
        .map(User::from)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        check_then_fetch(
            "user",
            email,
            user_sql::active_email_exists(&self.pool, email),
            || user_sql::get_active_user_by_email(&self.pool, email),
        )
        .await
        .map(User::from)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert_user(&self, user: &NewUser) -> RepoResult<i64> {
        const OP: &str = "insert user";
        let mut tx = self.begin(OP).await?;
        let result = Self::insert_user_in(&mut tx, user).await;
        Self::finish(tx, OP, result).await
    }

    #[instrument(skip(self, update), fields(user_id = update.id))]
    async fn update_user(&self, update: &UserUpdate) -> RepoResult<()> {
        const OP: &str = "update user";
        let mut tx = self.begin(OP).await?;
        let result = Self::update_user_in(&mut tx, update).await;
        Self::finish(tx, OP, result).await
    }

    async fn find_profile_by_user_id(&self, user_id: i64) -> RepoResult<Profile> {
        let row = check_then_fetch(
            "profile",
            user_id,
            user_sql::profile_exists_by_user(&self.pool, user_id),
            || user_sql::get_profile_by_user(&self.pool, user_id),
        )
        .await?;
        self.profile_from_row(row).await
    }

    async fn find_security_by_user_id(&self, user_id: i64) -> RepoResult<Security> {
        let row = check_then_fetch(
            "security",
            user_id,
            user_sql::security_exists_by_user(&self.pool, user_id),
            || user_sql::get_security_by_user(&self.pool, user_id),
        )
        .await?;
        self.security_from_row(row).await
    }

    async fn update_login_data(&self, security_id: i64, origin: Option<&str>) -> RepoResult<()> {
        let rows = user_sql::update_login_data(&self.pool, security_id, origin)
            .await
            .map_err(|e| RepoError::store("update login data", e))?;
        if rows == 0 {
            return Err(RepoError::not_found("security", security_id));
        }
        Ok(())
    }

    async fn event_is_active(&self, id: i64) -> RepoResult<bool> {
        event_sql::event_is_active(&self.pool, id)
            .await
            .map_err(|e| RepoError::store("event active probe", e))
    }

    async fn find_event_by_id(&self, id: i64) -> RepoResult<Event> {
        let row = check_then_fetch("event", id, event_sql::event_exists(&self.pool, id), || {
            event_sql::get_event(&self.pool, id)
        })
        .await?;

        let created_by = self.find_user_by_id(row.fk_created_by).await?;
        let attendee_ids = event_sql::list_attendee_ids(&self.pool, id)
            .await
            .map_err(|e| RepoError::store("list attendees", e))?;
        let mut attendees = Vec::with_capacity(attendee_ids.len());
        for user_id in attendee_ids {
            attendees.push(self.find_user_by_id(user_id).await?);
        }
        Ok(Event::from_row(row, created_by, attendees))
    }

    #[instrument(skip(self, event), fields(created_by = event.created_by))]
    async fn insert_event(&self, event: &NewEvent) -> RepoResult<i64> {
        const OP: &str = "insert event";
        let mut tx = self.begin(OP).await?;
        let result = event_sql::insert_event_tx(&mut tx, event)
            .await
            .map_err(|e| RepoError::write(OP, e));
        Self::finish(tx, OP, result).await
    }

    #[instrument(skip(self))]
    async fn add_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()> {
        const OP: &str = "add attendee";
        let mut tx = self.begin(OP).await?;
        let result = Self::add_attendee_in(&mut tx, event_id, user_id).await;
        Self::finish(tx, OP, result).await
    }

    #[instrument(skip(self))]
    async fn remove_attendee(&self, event_id: i64, user_id: i64) -> RepoResult<()> {
        let rows = event_sql::delete_attendee(&self.pool, event_id, user_id)
            .await
            .map_err(|e| RepoError::write("remove attendee", e))?;
        if rows == 0 {
            return Err(RepoError::not_found(
                "event_attendee",
                format!("{event_id}:{user_id}"),
            ));
        }
        Ok(())
    }
}
