use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use super::dto::{ProfileRequest, UpdateUserRequest};
use super::repo_types::{AgeRange, ProfileUpdate, Sex, User, UserUpdate};
use crate::auth::SessionClaims;
use crate::error::{AppError, AppResult};
use crate::repository::{with_deadline, RepoError, Repository};
use crate::validation::{normalize_email, validate_text};

/// User reads and the composite profile update.
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn Repository>,
    deadline: Duration,
}

impl UserService {
    pub fn new(repo: Arc<dyn Repository>, deadline: Duration) -> Self {
        Self { repo, deadline }
    }

    pub async fn get_user(&self, id: i64) -> AppResult<User> {
        self.load_user_aggregate(id).await
    }

    /// User row plus profile (if any) and security record.
    pub(crate) async fn load_user_aggregate(&self, id: i64) -> AppResult<User> {
        let mut user = with_deadline("find user", self.deadline, self.repo.find_user_by_id(id)).await?;

        user.profile = match with_deadline(
            "find profile",
            self.deadline,
            self.repo.find_profile_by_user_id(id),
        )
        .await
        {
            Ok(profile) => Some(profile),
            Err(RepoError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let security = with_deadline(
            "find security",
            self.deadline,
            self.repo.find_security_by_user_id(id),
        )
        .await?;
        user.security = Some(security);
        Ok(user)
    }

    /// Updates the session user's account and profile in one transaction.
    #[instrument(skip(self, session, payload), fields(user_id = session.id))]
    pub async fn update_user(
        &self,
        session: &SessionClaims,
        payload: UpdateUserRequest,
    ) -> AppResult<User> {
        if payload.id != session.id {
            return Err(AppError::unauthorized("cannot update another user"));
        }

        let raw_email = payload.email.as_deref().unwrap_or(&session.email);
        let email = normalize_email("email", raw_email)?;
        validate_text("name", &payload.name)?;

        let profile = match payload.profile {
            Some(p) => Some(self.resolve_profile(p).await?),
            None => None,
        };

        let update = UserUpdate {
            id: payload.id,
            email,
            name: payload.name.trim().to_string(),
            profile,
        };
        with_deadline("update user", self.deadline, self.repo.update_user(&update)).await?;
        info!(user_id = update.id, "user updated");

        self.load_user_aggregate(update.id).await
    }

    /// Parses enums and checks every referenced language/interest exists.
    async fn resolve_profile(&self, p: ProfileRequest) -> AppResult<ProfileUpdate> {
        let sex = p
            .sex
            .parse::<Sex>()
            .map_err(|reason| AppError::validation("profile.sex", reason))?;
        let age_range = p
            .age_range
            .parse::<AgeRange>()
            .map_err(|reason| AppError::validation("profile.age_range", reason))?;

        match with_deadline(
            "find language",
            self.deadline,
            self.repo.find_language_by_id(p.language),
        )
        .await
        {
            Ok(_) => {}
            Err(RepoError::NotFound { .. }) => {
                return Err(AppError::validation(
                    "profile.language",
                    format!("unknown language {}", p.language),
                ))
            }
            Err(e) => return Err(e.into()),
        }

        let interest_ids: Vec<i64> = p
            .interests
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        for &id in &interest_ids {
            match with_deadline(
                "find interest",
                self.deadline,
                self.repo.find_interest_by_id(id),
            )
            .await
            {
                Ok(_) => {}
                Err(RepoError::NotFound { .. }) => {
                    return Err(AppError::validation(
                        "profile.interests",
                        format!("unknown interest {id}"),
                    ))
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(ProfileUpdate {
            id: p.id,
            language_id: p.language,
            sex,
            age_range,
            interest_ids,
        })
    }
}
