//! Profile command and query handlers.

mod available_contacts;
mod create_profile;
mod delete_profile;
mod fields;
mod menu_options;
mod queries;
mod update_profile;

pub use available_contacts::ListAvailableContactsHandler;
pub use create_profile::CreateProfileHandler;
pub use delete_profile::{DeleteProfileCommand, DeleteProfileHandler};
pub use fields::{
    AddFieldCommand, AddFieldHandler, RemoveFieldCommand, RemoveFieldHandler, UpdateFieldCommand,
    UpdateFieldHandler,
};
pub use menu_options::{
    AddMenuOptionCommand, AddMenuOptionHandler, RemoveMenuOptionCommand, RemoveMenuOptionHandler,
    UpdateMenuOptionCommand, UpdateMenuOptionHandler,
};
pub use queries::{GetProfileHandler, GetProfileQuery, ListProfilesHandler};
pub use update_profile::{UpdateProfileCommand, UpdateProfileHandler};

use crate::domain::foundation::{ProfileId, TenantId};
use crate::domain::profile::{Profile, ProfileError};
use crate::ports::ProfileRepository;

/// Load a profile, treating another tenant's profile as missing.
async fn load_owned(
    repository: &dyn ProfileRepository,
    id: &ProfileId,
    tenant_id: &TenantId,
) -> Result<Profile, ProfileError> {
    repository
        .find_by_id(id)
        .await?
        .filter(|p| p.tenant_id() == tenant_id)
        .ok_or(ProfileError::NotFound(*id))
}
