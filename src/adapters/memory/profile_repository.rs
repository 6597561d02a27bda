//! In-memory profile repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, ProfileId, TenantId};
use crate::domain::profile::{ChannelAddress, Profile};
use crate::ports::ProfileRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileRepository {
    profiles: Arc<RwLock<HashMap<ProfileId, Profile>>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

fn not_found(id: &ProfileId) -> DomainError {
    DomainError::new(ErrorCode::ProfileNotFound, "Profile not found").with_detail("profile_id", id.to_string())
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn create(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut profiles = self.profiles.write().await;
        let duplicate = profiles.values().any(|p| {
            p.tenant_id() == profile.tenant_id() && p.channel_address() == profile.channel_address()
        });
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateChannel,
                "Channel address already has a profile",
            )
            .with_detail("channel", profile.channel_address().to_string()));
        }
        profiles.insert(*profile.id(), profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<(), DomainError> {
        let mut profiles = self.profiles.write().await;
        if !profiles.contains_key(profile.id()) {
            return Err(not_found(profile.id()));
        }
        let duplicate = profiles.values().any(|p| {
            p.id() != profile.id()
                && p.tenant_id() == profile.tenant_id()
                && p.channel_address() == profile.channel_address()
        });
        if duplicate {
            return Err(DomainError::new(
                ErrorCode::DuplicateChannel,
                "Channel address already has a profile",
            )
            .with_detail("channel", profile.channel_address().to_string()));
        }
        profiles.insert(*profile.id(), profile.clone());
        Ok(())
    }

    async fn delete(&self, id: &ProfileId) -> Result<(), DomainError> {
        self.profiles
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn find_by_channel(&self, channel: &ChannelAddress) -> Result<Vec<Profile>, DomainError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.channel_address() == channel)
            .cloned()
            .collect())
    }

    async fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Profile>, DomainError> {
        let mut found: Vec<Profile> = self
            .profiles
            .read()
            .await
            .values()
            .filter(|p| p.tenant_id() == tenant_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(found)
    }
}
