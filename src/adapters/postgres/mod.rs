//! PostgreSQL adapters.
//!
//! - `PostgresSessionRepository` - sessions and their transcripts
//! - `PostgresProfileRepository` - profiles with fields and menu options

mod profile_repository;
mod session_repository;

pub use profile_repository::PostgresProfileRepository;
pub use session_repository::PostgresSessionRepository;
