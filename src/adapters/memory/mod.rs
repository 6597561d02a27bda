//! In-memory repositories for development and tests.

mod profile_repository;
mod session_repository;

pub use profile_repository::InMemoryProfileRepository;
pub use session_repository::InMemorySessionRepository;
