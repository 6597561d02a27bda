//! HTTP routes for profile endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    add_field, add_menu_option, create_profile, delete_profile, get_profile, list_available_contacts,
    list_profiles, remove_field, remove_menu_option, update_field, update_menu_option, update_profile,
    ProfileHandlers,
};

/// Profile endpoints, to be nested under `/api/profiles`.
pub fn profile_routes(handlers: ProfileHandlers) -> Router {
    Router::new()
        .route("/", post(create_profile).get(list_profiles))
        .route("/:id", get(get_profile).put(update_profile).delete(delete_profile))
        .route("/:id/fields", post(add_field))
        .route("/:id/fields/:field_id", put(update_field).delete(remove_field))
        .route("/:id/menu-options", post(add_menu_option))
        .route(
            "/:id/menu-options/:option_id",
            put(update_menu_option).delete(remove_menu_option),
        )
        .with_state(handlers)
}

/// Contact endpoints, to be nested under `/api/contacts`.
pub fn contact_routes(handlers: ProfileHandlers) -> Router {
    Router::new()
        .route("/available", get(list_available_contacts))
        .with_state(handlers)
}
