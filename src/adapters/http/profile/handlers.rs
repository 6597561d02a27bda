//! HTTP handlers for profile, field, menu option and contact endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::dto::{ContactListResponse, ProfileListResponse, ProfileResponse};
use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::middleware::Operator;
use crate::application::handlers::profile::{
    AddFieldCommand, AddFieldHandler, AddMenuOptionCommand, AddMenuOptionHandler, CreateProfileHandler,
    DeleteProfileCommand, DeleteProfileHandler, GetProfileHandler, GetProfileQuery, ListAvailableContactsHandler,
    ListProfilesHandler, RemoveFieldCommand, RemoveFieldHandler, RemoveMenuOptionCommand, RemoveMenuOptionHandler,
    UpdateFieldCommand, UpdateFieldHandler, UpdateMenuOptionCommand, UpdateMenuOptionHandler, UpdateProfileCommand,
    UpdateProfileHandler,
};
use crate::domain::foundation::{FieldId, MenuOptionId, ProfileId};
use crate::domain::profile::{
    Field, FieldUpdate, MenuOption, MenuOptionUpdate, NewField, NewMenuOption, NewProfile, ProfileUpdate,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ProfileHandlers {
    pub create: Arc<CreateProfileHandler>,
    pub update: Arc<UpdateProfileHandler>,
    pub delete: Arc<DeleteProfileHandler>,
    pub get: Arc<GetProfileHandler>,
    pub list: Arc<ListProfilesHandler>,
    pub add_field: Arc<AddFieldHandler>,
    pub update_field: Arc<UpdateFieldHandler>,
    pub remove_field: Arc<RemoveFieldHandler>,
    pub add_menu_option: Arc<AddMenuOptionHandler>,
    pub update_menu_option: Arc<UpdateMenuOptionHandler>,
    pub remove_menu_option: Arc<RemoveMenuOptionHandler>,
    pub available_contacts: Arc<ListAvailableContactsHandler>,
}

// ════════════════════════════════════════════════════════════════════════════
// Profiles
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/profiles
pub async fn create_profile(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Json(req): Json<NewProfile>,
) -> Result<Response, ApiError> {
    let profile = handlers.create.handle(req, metadata).await?;
    Ok((StatusCode::CREATED, Json(ProfileResponse::from(&profile))).into_response())
}

/// GET /api/profiles
pub async fn list_profiles(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
) -> Result<Json<ProfileListResponse>, ApiError> {
    let profiles = handlers.list.handle(&metadata.tenant_id).await?;
    Ok(Json(profiles.into()))
}

/// GET /api/profiles/:id
pub async fn get_profile(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path(profile_id): Path<String>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let query = GetProfileQuery {
        profile_id: parse_id(&profile_id, "profile")?,
        tenant_id: metadata.tenant_id,
    };
    let profile = handlers.get.handle(query).await?;
    Ok(Json(ProfileResponse::from(&profile)))
}

/// PUT /api/profiles/:id
pub async fn update_profile(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path(profile_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let cmd = UpdateProfileCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        update,
    };
    let profile = handlers.update.handle(cmd, metadata).await?;
    Ok(Json(ProfileResponse::from(&profile)))
}

/// DELETE /api/profiles/:id - Removes the profile and its sessions
pub async fn delete_profile(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path(profile_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let cmd = DeleteProfileCommand {
        profile_id: parse_id(&profile_id, "profile")?,
    };
    handlers.delete.handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════
// Fields
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/profiles/:id/fields
pub async fn add_field(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path(profile_id): Path<String>,
    Json(field): Json<NewField>,
) -> Result<Response, ApiError> {
    let cmd = AddFieldCommand {
        profile_id: parse_id::<ProfileId>(&profile_id, "profile")?,
        field,
    };
    let field = handlers.add_field.handle(cmd, metadata).await?;
    Ok((StatusCode::CREATED, Json(field)).into_response())
}

/// PUT /api/profiles/:id/fields/:field_id
pub async fn update_field(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path((profile_id, field_id)): Path<(String, String)>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<Field>, ApiError> {
    let cmd = UpdateFieldCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        field_id: parse_id::<FieldId>(&field_id, "field")?,
        update,
    };
    Ok(Json(handlers.update_field.handle(cmd, metadata).await?))
}

/// DELETE /api/profiles/:id/fields/:field_id
pub async fn remove_field(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path((profile_id, field_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let cmd = RemoveFieldCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        field_id: parse_id(&field_id, "field")?,
    };
    handlers.remove_field.handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════
// Menu options
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/profiles/:id/menu-options
pub async fn add_menu_option(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path(profile_id): Path<String>,
    Json(option): Json<NewMenuOption>,
) -> Result<Response, ApiError> {
    let cmd = AddMenuOptionCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        option,
    };
    let option = handlers.add_menu_option.handle(cmd, metadata).await?;
    Ok((StatusCode::CREATED, Json(option)).into_response())
}

/// PUT /api/profiles/:id/menu-options/:option_id
pub async fn update_menu_option(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path((profile_id, option_id)): Path<(String, String)>,
    Json(update): Json<MenuOptionUpdate>,
) -> Result<Json<MenuOption>, ApiError> {
    let cmd = UpdateMenuOptionCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        option_id: parse_id::<MenuOptionId>(&option_id, "menu option")?,
        update,
    };
    Ok(Json(handlers.update_menu_option.handle(cmd, metadata).await?))
}

/// DELETE /api/profiles/:id/menu-options/:option_id
pub async fn remove_menu_option(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
    Path((profile_id, option_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let cmd = RemoveMenuOptionCommand {
        profile_id: parse_id(&profile_id, "profile")?,
        option_id: parse_id(&option_id, "menu option")?,
    };
    handlers.remove_menu_option.handle(cmd, metadata).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ════════════════════════════════════════════════════════════════════════════
// Contacts
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/contacts/available - Gateway contacts without a profile
pub async fn list_available_contacts(
    State(handlers): State<ProfileHandlers>,
    Operator(metadata): Operator,
) -> Result<Json<ContactListResponse>, ApiError> {
    let contacts = handlers.available_contacts.handle(&metadata.tenant_id).await?;
    Ok(Json(ContactListResponse { contacts }))
}
