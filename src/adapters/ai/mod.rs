//! AI adapters.
//!
//! - `AnthropicProvider` - Anthropic Messages API
//! - `MockAIProvider` - Queued responses for tests and offline runs
//! - `LlmDecisionEngine` - DecisionEngine on top of any AIProvider

mod anthropic_provider;
mod llm_decision_engine;
mod mock_provider;

pub use anthropic_provider::{AnthropicConfig, AnthropicProvider};
pub use llm_decision_engine::LlmDecisionEngine;
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
