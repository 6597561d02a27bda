//! Profile query handlers.

use std::sync::Arc;

use super::load_owned;
use crate::domain::foundation::{ProfileId, TenantId};
use crate::domain::profile::{Profile, ProfileError};
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct GetProfileQuery {
    pub profile_id: ProfileId,
    pub tenant_id: TenantId,
}

pub struct GetProfileHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl GetProfileHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, query: GetProfileQuery) -> Result<Profile, ProfileError> {
        load_owned(self.repository.as_ref(), &query.profile_id, &query.tenant_id).await
    }
}

pub struct ListProfilesHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl ListProfilesHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, tenant_id: &TenantId) -> Result<Vec<Profile>, ProfileError> {
        Ok(self.repository.list_by_tenant(tenant_id).await?)
    }
}
