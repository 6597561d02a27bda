//! Adapters - Implementations of the ports against real infrastructure.
//!
//! - `ai` - LLM providers and the LLM-backed decision engine
//! - `gateway` - Messaging gateway client and webhook signatures
//! - `http` - Operator REST API and inbound webhook
//! - `memory` - In-memory repositories for tests and local runs
//! - `notification` - Completion notification sinks
//! - `postgres` - PostgreSQL repositories

pub mod ai;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod notification;
pub mod postgres;
