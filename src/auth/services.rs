use std::sync::Arc;
use std::time::Duration;

use lazy_static::lazy_static;
use tracing::{error, info, instrument, warn};

use super::dto::{LoginRequest, RegisterRequest};
use super::last_login::LastLoginRecorder;
use super::{password, CredentialError, CredentialManager, TokenSubject};
use crate::error::{AppError, AppResult};
use crate::reference::repo_types::API_LOGIN_PROVIDER_ID;
use crate::repository::{with_deadline, RepoError, Repository};
use crate::users::repo_types::{NewSecurity, NewUser, User};
use crate::users::services::UserService;
use crate::validation::{bounded_origin, normalize_email, validate_text};

lazy_static! {
    // verified against when the email is unknown so both failure paths hash once
    static ref DUMMY_HASH: Option<String> =
        password::hash_password("popmeet-timing-equaliser").ok();
}

/// Successful login: signed session token plus the user aggregate.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Registration and login.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    credentials: CredentialManager,
    users: UserService,
    last_login: LastLoginRecorder,
    deadline: Duration,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn Repository>,
        credentials: CredentialManager,
        users: UserService,
        last_login: LastLoginRecorder,
        deadline: Duration,
    ) -> Self {
        Self {
            repo,
            credentials,
            users,
            last_login,
            deadline,
        }
    }

    #[instrument(skip(self, req, origin))]
    pub async fn register_user(
        &self,
        req: RegisterRequest,
        origin: Option<String>,
    ) -> AppResult<User> {
        let email = normalize_email("email", &req.email)?;
        validate_text("name", &req.name)?;

        let (provider_id, plain) = match (req.password, req.login_provider) {
            (Some(p), None) if p.is_empty() => {
                return Err(AppError::validation("password", "must not be empty"))
            }
            (Some(p), None) => (API_LOGIN_PROVIDER_ID, Some(p)),
            (None, Some(id)) if id == API_LOGIN_PROVIDER_ID => {
                return Err(AppError::validation(
                    "password",
                    "required for password accounts",
                ))
            }
            (None, Some(id)) => (id, None),
            _ => {
                return Err(AppError::validation(
                    "login_provider",
                    "exactly one of password or login_provider is required",
                ))
            }
        };

        if plain.is_none() {
            match with_deadline(
                "find login provider",
                self.deadline,
                self.repo.find_login_provider_by_id(provider_id),
            )
            .await
            {
                Ok(_) => {}
                Err(RepoError::NotFound { .. }) => {
                    return Err(AppError::validation(
                        "login_provider",
                        format!("unknown login provider {provider_id}"),
                    ))
                }
                Err(e) => return Err(e.into()),
            }
        }

        if with_deadline("email probe", self.deadline, self.repo.email_in_use(&email)).await? {
            warn!(%email, "email already registered");
            return Err(AppError::Conflict {
                message: "email already registered".into(),
            });
        }

        let hash = match plain {
            Some(p) => {
                let creds = self.credentials.clone();
                Some(blocking(move || creds.hash(&p)).await?)
            }
            None => None,
        };

        let new_user = NewUser {
            email,
            name: req.name.trim().to_string(),
            security: NewSecurity {
                provider_id,
                hash,
                last_machine: bounded_origin(origin),
            },
        };
        let user_id =
            with_deadline("insert user", self.deadline, self.repo.insert_user(&new_user)).await?;
        info!(user_id, email = %new_user.email, "user registered");

        self.users.load_user_aggregate(user_id).await
    }

    /// Every failure to match email and password is `InvalidCredentials`.
    #[instrument(skip(self, req, origin))]
    pub async fn login(&self, req: LoginRequest, origin: Option<String>) -> AppResult<LoginOutcome> {
        let email = req.email.trim().to_lowercase();

        let user = match with_deadline(
            "find user by email",
            self.deadline,
            self.repo.find_user_by_email(&email),
        )
        .await
        {
            Ok(u) => Some(u),
            Err(RepoError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let security = match &user {
            Some(u) => match with_deadline(
                "find security",
                self.deadline,
                self.repo.find_security_by_user_id(u.id),
            )
            .await
            {
                Ok(s) => Some(s),
                Err(RepoError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        let stored = security.as_ref().and_then(|s| s.hash.clone());
        let creds = self.credentials.clone();
        let plain = req.password;
        let matched = blocking(move || match stored {
            Some(hash) => creds.verify(&plain, &hash),
            None => {
                if let Some(dummy) = DUMMY_HASH.as_deref() {
                    creds.verify(&plain, dummy)?;
                }
                Ok(false)
            }
        })
        .await?;

        let (user, security) = match (user, security) {
            (Some(u), Some(s)) if matched => (u, s),
            _ => {
                warn!(%email, "login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.credentials.issue_session_token(&TokenSubject {
            id: user.id,
            email: user.email.clone(),
        })?;
        self.last_login.record(security.id, bounded_origin(origin));
        info!(user_id = user.id, "user logged in");

        let user = self.users.load_user_aggregate(user.id).await?;
        Ok(LoginOutcome { token, user })
    }
}

/// Runs a hashing job on the blocking pool.
async fn blocking<T, F>(job: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, CredentialError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result.map_err(AppError::from),
        Err(e) => {
            error!(error = %e, "hashing task failed");
            Err(AppError::Internal {
                message: format!("hashing task failed: {e}"),
            })
        }
    }
}
