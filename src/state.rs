use std::sync::Arc;
use std::time::Duration;

use crate::auth::last_login::LastLoginRecorder;
use crate::auth::services::AuthService;
use crate::auth::CredentialManager;
use crate::config::SecurityConfig;
use crate::events::services::EventService;
use crate::reference::services::ReferenceService;
use crate::repository::Repository;
use crate::users::services::UserService;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub credentials: CredentialManager,
    pub auth: AuthService,
    pub users: UserService,
    pub events: EventService,
    pub reference: ReferenceService,
    pub deadline: Duration,
}

impl AppState {
    /// Wires the services over `repo`; must run inside a tokio runtime since
    /// it spawns the last-login worker.
    pub fn new(repo: Arc<dyn Repository>, security: SecurityConfig, deadline: Duration) -> Self {
        let credentials = CredentialManager::new(security);
        let users = UserService::new(repo.clone(), deadline);
        let last_login = LastLoginRecorder::spawn(repo.clone(), deadline);
        let auth = AuthService::new(
            repo.clone(),
            credentials.clone(),
            users.clone(),
            last_login,
            deadline,
        );
        Self {
            events: EventService::new(repo.clone(), deadline),
            reference: ReferenceService::new(repo.clone(), deadline),
            repo,
            credentials,
            auth,
            users,
            deadline,
        }
    }
}
