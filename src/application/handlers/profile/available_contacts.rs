//! ListAvailableContactsHandler - Channel contacts with no profile yet.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::foundation::TenantId;
use crate::domain::profile::ProfileError;
use crate::ports::{Contact, ContactDirectory, ProfileRepository};

pub struct ListAvailableContactsHandler {
    directory: Arc<dyn ContactDirectory>,
    profiles: Arc<dyn ProfileRepository>,
}

impl ListAvailableContactsHandler {
    pub fn new(directory: Arc<dyn ContactDirectory>, profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { directory, profiles }
    }

    pub async fn handle(&self, tenant_id: &TenantId) -> Result<Vec<Contact>, ProfileError> {
        let configured: HashSet<String> = self
            .profiles
            .list_by_tenant(tenant_id)
            .await?
            .iter()
            .map(|p| p.channel_address().to_string())
            .collect();

        let contacts = self
            .directory
            .list_contacts()
            .await
            .map_err(|e| ProfileError::Infrastructure(e.to_string()))?;

        Ok(contacts
            .into_iter()
            .filter(|c| !configured.contains(c.address.as_str()))
            .collect())
    }
}
