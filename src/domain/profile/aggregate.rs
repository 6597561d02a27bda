//! Profile aggregate.
//!
//! A profile is a reusable automation target: one external responder per
//! tenant, the facts the engine may disclose to it, and its known menu.
//! Profiles own their fields and menu options; deleting a profile removes
//! them along with the profile's session history.

use serde::{Deserialize, Serialize};

use super::field::{validate_text, Field, FieldUpdate};
use super::menu_option::{MenuOption, MenuOptionUpdate};
use super::{ChannelAddress, ProfileError};
use crate::domain::foundation::{
    FieldId, MenuOptionId, ProfileId, TenantId, Timestamp, ValidationError,
};

/// Maximum length for profile name and alias.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum length for the free-text description fed to the decision function.
pub const MAX_DESCRIPTION_LENGTH: usize = 4_000;

/// Allowed range for `max_wait_seconds`.
pub const MIN_WAIT_SECONDS: u32 = 10;
pub const MAX_WAIT_SECONDS: u32 = 86_400;

/// Upper bound for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 100;

const DEFAULT_MAX_WAIT_SECONDS: u32 = 300;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// How the external responder converses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponderStyle {
    #[default]
    Menu,
    FreeText,
    Mixed,
}

impl ResponderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponderStyle::Menu => "menu",
            ResponderStyle::FreeText => "free_text",
            ResponderStyle::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "menu" => Ok(ResponderStyle::Menu),
            "free_text" => Ok(ResponderStyle::FreeText),
            "mixed" => Ok(ResponderStyle::Mixed),
            other => Err(ValidationError::invalid_format(
                "style",
                format!("unknown responder style '{}'", other),
            )),
        }
    }

    /// Whether menu options are part of the decision context.
    pub fn uses_menu(&self) -> bool {
        matches!(self, ResponderStyle::Menu | ResponderStyle::Mixed)
    }
}

/// Attributes accepted when creating a profile.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProfile {
    pub channel_address: String,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub style: ResponderStyle,
    #[serde(default)]
    pub max_wait_seconds: Option<u32>,
    #[serde(default)]
    pub max_retries: Option<u32>,
}

/// Partial update for profile attributes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    /// An empty string clears the alias.
    pub alias: Option<String>,
    pub description: Option<String>,
    pub style: Option<ResponderStyle>,
    pub max_wait_seconds: Option<u32>,
    pub max_retries: Option<u32>,
    pub active: Option<bool>,
}

/// Profile aggregate.
///
/// # Invariants
///
/// - `name` is 1-200 characters
/// - `max_wait_seconds` within `MIN_WAIT_SECONDS..=MAX_WAIT_SECONDS`
/// - `max_retries` at most `MAX_RETRIES_LIMIT`
/// - field and menu option ids are unique within the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    id: ProfileId,
    tenant_id: TenantId,
    channel_address: ChannelAddress,
    name: String,
    alias: Option<String>,
    description: String,
    style: ResponderStyle,
    max_wait_seconds: u32,
    max_retries: u32,
    active: bool,
    fields: Vec<Field>,
    menu_options: Vec<MenuOption>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Profile {
    /// Create a new active profile.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if any attribute is out of bounds
    pub fn create(tenant_id: TenantId, new: NewProfile) -> Result<Self, ProfileError> {
        let channel_address = ChannelAddress::parse(&new.channel_address)?;
        let now = Timestamp::now();
        let profile = Self {
            id: ProfileId::new(),
            tenant_id,
            channel_address,
            name: new.name.trim().to_string(),
            alias: normalize_optional(new.alias),
            description: new.description.trim().to_string(),
            style: new.style,
            max_wait_seconds: new.max_wait_seconds.unwrap_or(DEFAULT_MAX_WAIT_SECONDS),
            max_retries: new.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            active: true,
            fields: Vec::new(),
            menu_options: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Reconstitute a profile from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ProfileId,
        tenant_id: TenantId,
        channel_address: ChannelAddress,
        name: String,
        alias: Option<String>,
        description: String,
        style: ResponderStyle,
        max_wait_seconds: u32,
        max_retries: u32,
        active: bool,
        fields: Vec<Field>,
        menu_options: Vec<MenuOption>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            tenant_id,
            channel_address,
            name,
            alias,
            description,
            style,
            max_wait_seconds,
            max_retries,
            active,
            fields,
            menu_options,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn channel_address(&self) -> &ChannelAddress {
        &self.channel_address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn style(&self) -> ResponderStyle {
        self.style
    }

    pub fn max_wait_seconds(&self) -> u32 {
        self.max_wait_seconds
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Fields in insertion order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields ordered for decision-building: highest priority first,
    /// insertion order among equals.
    pub fn fields_by_priority(&self) -> Vec<&Field> {
        let mut fields: Vec<&Field> = self.fields.iter().collect();
        fields.sort_by(|a, b| b.priority.cmp(&a.priority));
        fields
    }

    pub fn menu_options(&self) -> &[MenuOption] {
        &self.menu_options
    }

    /// Returns the exit option selected by `reply`, if any.
    pub fn exit_option_for(&self, reply: &str) -> Option<&MenuOption> {
        self.menu_options
            .iter()
            .find(|option| option.is_exit && option.matches_reply(reply))
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// True if `text` names this profile by name or alias (case-insensitive).
    pub fn is_named_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        std::iter::once(self.name.as_str())
            .chain(self.alias.as_deref())
            .any(|name| !name.is_empty() && haystack.contains(&name.to_lowercase()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a partial update to the profile attributes.
    pub fn update(&mut self, update: ProfileUpdate) -> Result<(), ProfileError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name.trim().to_string();
        }
        if let Some(alias) = update.alias {
            next.alias = normalize_optional(Some(alias));
        }
        if let Some(description) = update.description {
            next.description = description.trim().to_string();
        }
        if let Some(style) = update.style {
            next.style = style;
        }
        if let Some(max_wait) = update.max_wait_seconds {
            next.max_wait_seconds = max_wait;
        }
        if let Some(max_retries) = update.max_retries {
            next.max_retries = max_retries;
        }
        if let Some(active) = update.active {
            next.active = active;
        }
        next.validate()?;
        next.updated_at = Timestamp::now();
        *self = next;
        Ok(())
    }

    pub fn add_field(&mut self, field: Field) -> Result<(), ProfileError> {
        field.validate()?;
        if self.fields.iter().any(|f| f.id == field.id) {
            return Err(ProfileError::validation("field_id", "duplicate field id"));
        }
        self.fields.push(field);
        self.touch();
        Ok(())
    }

    pub fn update_field(&mut self, field_id: FieldId, update: FieldUpdate) -> Result<&Field, ProfileError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or(ProfileError::FieldNotFound(field_id))?;
        self.fields[index] = update.apply(&self.fields[index])?;
        self.touch();
        Ok(&self.fields[index])
    }

    pub fn remove_field(&mut self, field_id: FieldId) -> Result<Field, ProfileError> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or(ProfileError::FieldNotFound(field_id))?;
        self.touch();
        Ok(self.fields.remove(index))
    }

    pub fn add_menu_option(&mut self, option: MenuOption) -> Result<(), ProfileError> {
        option.validate()?;
        if self.menu_options.iter().any(|o| o.id == option.id) {
            return Err(ProfileError::validation("option_id", "duplicate menu option id"));
        }
        self.menu_options.push(option);
        self.touch();
        Ok(())
    }

    pub fn update_menu_option(
        &mut self,
        option_id: MenuOptionId,
        update: MenuOptionUpdate,
    ) -> Result<&MenuOption, ProfileError> {
        let index = self
            .menu_options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or(ProfileError::MenuOptionNotFound(option_id))?;
        self.menu_options[index] = update.apply(&self.menu_options[index])?;
        self.touch();
        Ok(&self.menu_options[index])
    }

    pub fn remove_menu_option(&mut self, option_id: MenuOptionId) -> Result<MenuOption, ProfileError> {
        let index = self
            .menu_options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or(ProfileError::MenuOptionNotFound(option_id))?;
        self.touch();
        Ok(self.menu_options.remove(index))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name, MAX_NAME_LENGTH)?;
        if let Some(alias) = &self.alias {
            validate_text("alias", alias, MAX_NAME_LENGTH)?;
        }
        let description_len = self.description.chars().count();
        if description_len > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::out_of_range(
                "description",
                0,
                MAX_DESCRIPTION_LENGTH as i64,
                description_len as i64,
            ));
        }
        if !(MIN_WAIT_SECONDS..=MAX_WAIT_SECONDS).contains(&self.max_wait_seconds) {
            return Err(ValidationError::out_of_range(
                "max_wait_seconds",
                MIN_WAIT_SECONDS as i64,
                MAX_WAIT_SECONDS as i64,
                self.max_wait_seconds as i64,
            ));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::out_of_range(
                "max_retries",
                0,
                MAX_RETRIES_LIMIT as i64,
                self.max_retries as i64,
            ));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
