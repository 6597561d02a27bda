//! Menu option command handlers.

use std::sync::Arc;

use super::load_owned;
use crate::domain::foundation::{CommandMetadata, MenuOptionId, ProfileId};
use crate::domain::profile::{MenuOption, MenuOptionUpdate, NewMenuOption, ProfileError};
use crate::ports::ProfileRepository;

#[derive(Debug, Clone)]
pub struct AddMenuOptionCommand {
    pub profile_id: ProfileId,
    pub option: NewMenuOption,
}

#[derive(Debug, Clone)]
pub struct UpdateMenuOptionCommand {
    pub profile_id: ProfileId,
    pub option_id: MenuOptionId,
    pub update: MenuOptionUpdate,
}

#[derive(Debug, Clone)]
pub struct RemoveMenuOptionCommand {
    pub profile_id: ProfileId,
    pub option_id: MenuOptionId,
}

pub struct AddMenuOptionHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl AddMenuOptionHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: AddMenuOptionCommand, metadata: CommandMetadata) -> Result<MenuOption, ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        let option = cmd.option.into_option()?;
        profile.add_menu_option(option.clone())?;
        self.repository.update(&profile).await?;
        Ok(option)
    }
}

pub struct UpdateMenuOptionHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl UpdateMenuOptionHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(
        &self,
        cmd: UpdateMenuOptionCommand,
        metadata: CommandMetadata,
    ) -> Result<MenuOption, ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        let option = profile.update_menu_option(cmd.option_id, cmd.update)?.clone();
        self.repository.update(&profile).await?;
        Ok(option)
    }
}

pub struct RemoveMenuOptionHandler {
    repository: Arc<dyn ProfileRepository>,
}

impl RemoveMenuOptionHandler {
    pub fn new(repository: Arc<dyn ProfileRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: RemoveMenuOptionCommand, metadata: CommandMetadata) -> Result<(), ProfileError> {
        let mut profile = load_owned(self.repository.as_ref(), &cmd.profile_id, &metadata.tenant_id).await?;
        profile.remove_menu_option(cmd.option_id)?;
        self.repository.update(&profile).await?;
        Ok(())
    }
}
