//! Field command handlers.
//!
//! Field edits only affect later turns; transcripts keep the text that was
//! actually sent.

use std::sync::Arc;

use super::load_owned;
use crate::domain::foundation::{CommandMetadata, FieldId, ProfileId};
use crate::domain::profile::{Field, FieldUpdate, NewField, ProfileError};
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct AddFieldCommand {
    pub profile_id: ProfileId,
    pub field: NewField,
}

#[derive(Debug, Clone)]
pub struct UpdateFieldCommand {
    pub profile_id: ProfileId,
    pub field_id: FieldId,
    pub update: FieldUpdate,
}

#[derive(Debug, Clone)]
pub struct RemoveFieldCommand {
    pub profile_id: ProfileId,
    pub field_id: FieldId,
}

pub struct AddFieldHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl AddFieldHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: AddFieldCommand, metadata: CommandMetadata) -> Result<Field, ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        let field = cmd.field.into_field()?;
        profile.add_field(field.clone())?;
        self.repository.update(&profile).await?;
        Ok(field)
    }
}

pub struct UpdateFieldHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl UpdateFieldHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: UpdateFieldCommand, metadata: CommandMetadata) -> Result<Field, ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        let field = profile.update_field(cmd.field_id, cmd.update)?.clone();
        self.repository.update(&profile).await?;
        Ok(field)
    }
}

pub struct RemoveFieldHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl RemoveFieldHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: RemoveFieldCommand, metadata: CommandMetadata) -> Result<(), ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        profile.remove_field(cmd.field_id)?;
        self.repository.update(&profile).await?;
        Ok(())
    }
}
