//! Profile repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProfileId, TenantId};
use crate::domain::profile::{ChannelAddress, Profile};

/// Repository for automation profiles.
///
/// A profile is stored together with its fields and menu options; `update`
/// replaces all of them.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert a new profile.
    ///
    /// # Errors
    ///
    /// - `DuplicateChannel` (detail `channel`) if the tenant already has a
    ///   profile for the same channel address
    async fn create(&self, profile: &Profile) -> Result<(), DomainError>;

    /// Replace a stored profile, including its fields and menu options.
    ///
    /// # Errors
    ///
    /// - `ProfileNotFound` if the profile doesn't exist
    async fn update(&self, profile: &Profile) -> Result<(), DomainError>;

    /// Delete a profile with its fields, menu options and sessions.
    ///
    /// # Errors
    ///
    /// - `ProfileNotFound` if the profile doesn't exist
    async fn delete(&self, id: &ProfileId) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, DomainError>;

    /// Every profile (any tenant, active or not) bound to a channel address.
    async fn find_by_channel(&self, channel: &ChannelAddress) -> Result<Vec<Profile>, DomainError>;

    /// Profiles of a tenant ordered by name.
    async fn list_by_tenant(&self, tenant_id: &TenantId) -> Result<Vec<Profile>, DomainError>;
}
