//! Domain layer containing business rules and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, errors, session status)
//! - `profile` - Automation targets with their fields and menu options
//! - `session` - Session aggregate and its navigation log
//! - `navigation` - Decision classification, message budget, reply delay
//! - `intent` - Keyword pre-filter for automation requests

pub mod foundation;
pub mod intent;
pub mod navigation;
pub mod profile;
pub mod session;
