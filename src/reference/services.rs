use std::sync::Arc;
use std::time::Duration;

use super::repo_types::{Interest, Language};
use crate::error::AppResult;
use crate::repository::{with_deadline, Repository};

/// Read-only lookups for profile metadata.
#[derive(Clone)]
pub struct ReferenceService {
    repo: Arc<dyn Repository>,
    deadline: Duration,
}

impl ReferenceService {
    pub fn new(repo: Arc<dyn Repository>, deadline: Duration) -> Self {
        Self { repo, deadline }
    }

    pub async fn list_interests(&self) -> AppResult<Vec<Interest>> {
        Ok(with_deadline("list interests", self.deadline, self.repo.list_interests()).await?)
    }

    pub async fn get_interest(&self, id: i64) -> AppResult<Interest> {
        Ok(with_deadline("find interest", self.deadline, self.repo.find_interest_by_id(id)).await?)
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        Ok(with_deadline("list languages", self.deadline, self.repo.list_languages()).await?)
    }
}
