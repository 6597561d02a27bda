//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the navigation core and the outside world. Adapters implement these ports.
//!
//! ## Persistence
//!
//! - `SessionRepository` - Exclusive session creation and versioned updates
//! - `ProfileRepository` - Profiles with their fields and menu options
//!
//! ## Collaborators
//!
//! - `DecisionEngine` - Generate / decide / summarize / classify intent
//! - `MessageGateway` - Outbound messages to the responder
//! - `ContactDirectory` - Contacts known to the messaging channel
//! - `NotificationSink` - Results delivered back to operators
//! - `AIProvider` - LLM completions behind the decision engine

mod ai_provider;
mod contact_directory;
mod decision_engine;
mod message_gateway;
mod notification_sink;
mod profile_repository;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, ProviderInfo, RequestMetadata,
};
pub use contact_directory::{Contact, ContactDirectory};
pub use decision_engine::{DecisionEngine, DecisionError};
pub use message_gateway::{GatewayError, MessageGateway};
pub use notification_sink::{Notification, NotificationError, NotificationSink};
pub use profile_repository::ProfileRepository;
pub use session_repository::{SessionFilter, SessionRepository};
