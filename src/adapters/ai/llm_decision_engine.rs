//! LLM-backed DecisionEngine.
//!
//! Each decision mode is one completion: a system prompt describing the
//! contract, and a user message carrying the request as JSON. Answers that
//! should be JSON are pulled out of whatever prose or code fence the model
//! wraps them in; anything that still does not parse is `Malformed`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

use crate::domain::intent::{IntentCandidate, IntentClassification};
use crate::domain::navigation::{DecisionOutput, DecisionRequest, GenerationRequest, SummaryRequest};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, DecisionEngine, DecisionError, MessageRole, RequestMetadata,
};

const GENERATE_PROMPT: &str = r#"You open a WhatsApp conversation with an automated customer-service bot on behalf of a user.
Write the first message to send. Be brief and natural, in the language the bot is likely to use (Brazilian Portuguese unless the profile says otherwise).
State the objective directly. Do not disclose any field value unless the objective requires it.
Reply with the message text only."#;

const DECIDE_PROMPT: &str = r#"You are navigating a conversation with an automated bot to reach an objective.
You receive the objective, the facts you may disclose (fields), the bot's menu options if it uses menus, the recent transcript, and counters.
Decide the next step and reply with a single JSON object:
{"action": "respond" | "complete" | "fail" | "wait", "response": string, "reason": string, "extracted_result": string}
- respond: "response" is the exact text to send. For menus, prefer the option value. Only disclose field values the bot asked for.
- complete: the objective was reached; put the answer the user needs in "extracted_result".
- fail: the objective cannot be reached; explain in "reason".
- wait: the bot is still typing or sent a partial message; send nothing.
Never choose an exit option unless giving up is intended. Reply with JSON only."#;

const SUMMARIZE_PROMPT: &str = r#"Summarize, in one or two sentences for the user, what the bot answered about the objective.
Reply with the summary text only."#;

const CLASSIFY_PROMPT: &str = r#"Decide whether the user's message asks to contact one of the listed bots on their behalf.
Reply with a single JSON object:
{"is_automation": boolean, "profile_id": string or null, "objective": string or null}
"profile_id" must be one of the candidate ids. "objective" restates what should be asked or done, in the user's language.
Reply with JSON only."#;

pub struct LlmDecisionEngine {
    provider: Arc<dyn AIProvider>,
    temperature: f32,
}

impl LlmDecisionEngine {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn ask(
        &self,
        purpose: &str,
        system_prompt: &str,
        payload: String,
        max_tokens: u32,
    ) -> Result<String, DecisionError> {
        let request = CompletionRequest::new(RequestMetadata::new(purpose))
            .with_system_prompt(system_prompt)
            .with_message(MessageRole::User, payload)
            .with_max_tokens(max_tokens)
            .with_temperature(self.temperature);

        let response = self.provider.complete(request).await.map_err(to_decision_error)?;
        debug!(purpose, model = %response.model, "Decision completion received");
        Ok(response.content.trim().to_string())
    }
}

fn to_decision_error(err: AIError) -> DecisionError {
    match err {
        AIError::Timeout { timeout_secs } => DecisionError::Timeout(u64::from(timeout_secs)),
        AIError::Parse(message) => DecisionError::malformed(message),
        other => DecisionError::backend(other.to_string()),
    }
}

fn to_payload<T: serde::Serialize>(value: &T) -> Result<String, DecisionError> {
    serde_json::to_string_pretty(value).map_err(|e| DecisionError::malformed(e.to_string()))
}

/// Returns the JSON object embedded in a model reply.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, DecisionError> {
    let json = extract_json(text).ok_or_else(|| DecisionError::malformed("no JSON object in reply"))?;
    serde_json::from_str(json).map_err(|e| DecisionError::malformed(e.to_string()))
}

/// Drops surrounding quotes the model sometimes adds to plain-text answers.
fn unquote(text: String) -> String {
    let trimmed = text.trim();
    match trimmed.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner.trim().to_string(),
        None => trimmed.to_string(),
    }
}

#[async_trait]
impl DecisionEngine for LlmDecisionEngine {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, DecisionError> {
        let reply = self.ask("generate", GENERATE_PROMPT, to_payload(request)?, 300).await?;
        Ok(unquote(reply))
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<DecisionOutput, DecisionError> {
        let reply = self.ask("decide", DECIDE_PROMPT, to_payload(request)?, 500).await?;
        parse_json(&reply)
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String, DecisionError> {
        let reply = self.ask("summarize", SUMMARIZE_PROMPT, to_payload(request)?, 200).await?;
        Ok(unquote(reply))
    }

    async fn classify_intent(
        &self,
        text: &str,
        candidates: &[IntentCandidate],
    ) -> Result<IntentClassification, DecisionError> {
        let payload = to_payload(&serde_json::json!({
            "message": text,
            "candidates": candidates,
        }))?;
        let reply = self.ask("classify_intent", CLASSIFY_PROMPT, payload, 200).await?;
        parse_json(&reply)
    }
}
