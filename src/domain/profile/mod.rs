//! Profile domain module.
//!
//! Profiles describe the external responders the engine can talk to:
//! their channel address, the facts it may disclose (`Field`) and the
//! known menu (`MenuOption`). Profiles are plain data; the navigation
//! engine reads them while building decisions.

mod aggregate;
mod channel_address;
mod errors;
mod field;
mod menu_option;

pub use aggregate::{
    NewProfile, Profile, ProfileUpdate, ResponderStyle, MAX_RETRIES_LIMIT, MAX_WAIT_SECONDS,
    MIN_WAIT_SECONDS,
};
pub use channel_address::ChannelAddress;
pub use errors::ProfileError;
pub use field::{Field, FieldType, FieldUpdate, NewField};
pub use menu_option::{MenuOption, MenuOptionUpdate, NewMenuOption};

#[cfg(test)]
pub(crate) use aggregate::fixtures;
