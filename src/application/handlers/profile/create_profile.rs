//! CreateProfileHandler - Registers a new automation target.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::CommandMetadata;
use crate::domain::profile::{NewProfile, Profile, ProfileError};
use crate::ports::ProfileRepository;

pub struct CreateProfileHandler {
    repository: Arc<dyn ProfileRepository>,
    /// Session lifetime applied when the request leaves max wait unset.
    default_max_wait_seconds: u32,
}

impl CreateProfileHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>, default_max_wait_seconds: u32) -> Self {
        Self {
            repository,
            default_max_wait_seconds,
        }
    }

    /// # Errors
    ///
    /// - `ValidationFailed` if any attribute is out of bounds
    /// - `DuplicateChannel` if the tenant already targets that address
    pub async fn handle(&self, mut cmd: NewProfile, metadata: CommandMetadata) -> Result<Profile, ProfileError> {
        cmd.max_wait_seconds.get_or_insert(self.default_max_wait_seconds);
        let profile = Profile::create(metadata.tenant_id.clone(), cmd)?;
        self.repository.create(&profile).await?;

        info!(
            profile_id = %profile.id(),
            channel = %profile.channel_address(),
            operator_id = %metadata.operator_id,
            "Profile created"
        );
        Ok(profile)
    }
}
