//! HTTP DTOs for profile endpoints.
//!
//! Create and update bodies deserialize straight into the domain's
//! `NewProfile`, `ProfileUpdate`, `NewField`, ... types.

use serde::Serialize;

use crate::domain::foundation::Timestamp;
use crate::domain::profile::{Field, MenuOption, Profile, ResponderStyle};
use crate::ports::Contact;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub channel_address: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub description: String,
    pub style: ResponderStyle,
    pub max_wait_seconds: u32,
    pub max_retries: u32,
    pub active: bool,
    pub fields: Vec<Field>,
    pub menu_options: Vec<MenuOption>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id().to_string(),
            channel_address: profile.channel_address().to_string(),
            name: profile.name().to_string(),
            alias: profile.alias().map(str::to_string),
            description: profile.description().to_string(),
            style: profile.style(),
            max_wait_seconds: profile.max_wait_seconds(),
            max_retries: profile.max_retries(),
            active: profile.is_active(),
            fields: profile.fields().to_vec(),
            menu_options: profile.menu_options().to_vec(),
            created_at: *profile.created_at(),
            updated_at: *profile.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileListResponse {
    pub profiles: Vec<ProfileResponse>,
    pub total: usize,
}

impl From<Vec<Profile>> for ProfileListResponse {
    fn from(profiles: Vec<Profile>) -> Self {
        let profiles: Vec<ProfileResponse> = profiles.iter().map(ProfileResponse::from).collect();
        Self {
            total: profiles.len(),
            profiles,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<Contact>,
}
