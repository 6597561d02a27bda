//! Navigation domain module.
//!
//! Pure rules for a navigation turn: turning decision output into one of
//! the closed actions, the outbound message budget, the reply delay, and
//! the inputs handed to the decision source.

mod action;
mod budget;
mod delay;
mod request;

pub use action::{DecisionOutput, NavigationAction};
pub use budget::{CeilingPolicy, MessageBudget};
pub use delay::ReplyDelay;
pub use request::{
    DecisionCounters, DecisionRequest, FieldContext, GenerationRequest, MenuOptionContext,
    SummaryRequest, DEFAULT_TRANSCRIPT_TAIL,
};
