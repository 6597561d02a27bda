//! Profile HTTP adapter.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::ProfileHandlers;
pub use routes::{contact_routes, profile_routes};
