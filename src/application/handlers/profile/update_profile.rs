//! UpdateProfileHandler - Partial edit of profile attributes.

use std::sync::Arc;

use super::load_owned;
use crate::domain::foundation::{CommandMetadata, ProfileId};
use crate::domain::profile::{Profile, ProfileError, ProfileUpdate};
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct UpdateProfileCommand {
    pub profile_id: ProfileId,
    pub update: ProfileUpdate,
}

pub struct UpdateProfileHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl UpdateProfileHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: UpdateProfileCommand, metadata: CommandMetadata) -> Result<Profile, ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        profile.update(cmd.update)?;
        self.repository.update(&profile).await?;
        Ok(profile)
    }
}
