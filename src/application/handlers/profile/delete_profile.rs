//! DeleteProfileHandler - Removes a profile and its history.

use std::sync::Arc;

use tracing::info;

use super::load_owned;
use crate::domain::foundation::{CommandMetadata, ProfileId};
use crate::domain::profile::ProfileError;
use crate::ports::{ProfileRepository, SessionRepository};

#[derive(Debug, Clone)]
pub struct DeleteProfileCommand {
    pub profile_id: ProfileId,
}

pub struct DeleteProfileHandler {
    profiles: Arc<dyn ProfileRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl DeleteProfileHandler {
    pub fn new(profiles: Arc<dyn ProfileRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { profiles, sessions }
    }

    /// Deletes the profile with its fields, menu options and sessions.
    pub async fn handle(&self, cmd: DeleteProfileCommand, metadata: CommandMetadata) -> Result<(), ProfileError> {
        load_owned(self.profiles.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        let removed = self.sessions.delete_by_profile(&cmd.profile_id).await?;
        self.profiles.delete(&cmd.profile_id).await?;

        info!(profile_id = %cmd.profile_id, sessions_removed = removed, "Profile deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryProfileRepository, InMemorySessionRepository};
    use crate::domain::foundation::{OperatorId, TenantId, Timestamp};
    use crate::domain::profile::fixtures::profile_with_cpf;
    use crate::domain::session::fixtures::new_session;
    use crate::domain::session::Session;

    #[tokio::test]
    async fn delete_cascades_to_sessions() {
        let profiles = InMemoryProfileRepository::new();
        let sessions = InMemorySessionRepository::new();
        let profile = profile_with_cpf();
        profiles.create(&profile).await.unwrap();
        sessions
            .insert(Session::new(new_session(*profile.id(), Timestamp::now().plus_secs(60))).unwrap())
            .await;

        let handler = DeleteProfileHandler::new(Arc::new(profiles.clone()), Arc::new(sessions.clone()));
        let metadata = CommandMetadata::new(
            TenantId::new("tenant-1").unwrap(),
            OperatorId::new("operator-1").unwrap(),
        );
        handler
            .handle(DeleteProfileCommand { profile_id: *profile.id() }, metadata)
            .await
            .unwrap();

        assert!(profiles.is_empty().await);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn other_tenant_cannot_delete() {
        let profiles = InMemoryProfileRepository::new();
        let profile = profile_with_cpf();
        profiles.create(&profile).await.unwrap();

        let handler = DeleteProfileHandler::new(
            Arc::new(profiles.clone()),
            Arc::new(InMemorySessionRepository::new()),
        );
        let metadata = CommandMetadata::new(
            TenantId::new("tenant-2").unwrap(),
            OperatorId::new("operator-1").unwrap(),
        );
        let err = handler
            .handle(DeleteProfileCommand { profile_id: *profile.id() }, metadata)
            .await
            .unwrap_err();

        assert_eq!(err, ProfileError::NotFound(*profile.id()));
        assert_eq!(profiles.len().await, 1);
    }
}
