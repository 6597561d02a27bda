//! Notification sink adapters.

mod in_memory;
mod log_sink;

pub use in_memory::InMemoryNotificationSink;
pub use log_sink::LogNotificationSink;
