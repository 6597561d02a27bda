//! Decision output classification.
//!
//! Whatever the decision source returns is folded into the closed
//! [`NavigationAction`] set here. Anything unrecognized becomes `Wait`.

use serde::{Deserialize, Serialize};

/// Raw output of a decide call, as produced by the decision source.
///
/// Every attribute is optional on the wire; classification decides what a
/// missing value means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOutput {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, alias = "extractedResult")]
    pub extracted_result: Option<String>,
}

impl DecisionOutput {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_extracted_result(mut self, result: impl Into<String>) -> Self {
        self.extracted_result = Some(result.into());
        self
    }
}

/// The closed set of things the engine does after a responder message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Send `text` to the responder.
    Respond { text: String },
    /// The objective is satisfied. `result` is the engine-extracted answer,
    /// if the decision source provided one.
    Complete { result: Option<String> },
    /// The objective cannot be reached.
    Fail { reason: String },
    /// Do nothing this turn.
    Wait { reason: Option<String> },
}

const DEFAULT_FAIL_REASON: &str = "objective judged unreachable";

impl NavigationAction {
    /// Classifies a decision output. Never fails: unknown actions and
    /// respond without text both become `Wait`.
    pub fn classify(output: &DecisionOutput) -> Self {
        let reason = non_blank(output.reason.as_deref());
        match output.action.trim().to_ascii_lowercase().as_str() {
            "respond" => match non_blank(output.response.as_deref()) {
                Some(text) => NavigationAction::Respond { text },
                None => NavigationAction::Wait {
                    reason: Some("respond without a response".to_string()),
                },
            },
            "complete" => NavigationAction::Complete {
                result: non_blank(output.extracted_result.as_deref()),
            },
            "fail" => NavigationAction::Fail {
                reason: reason.unwrap_or_else(|| DEFAULT_FAIL_REASON.to_string()),
            },
            "wait" => NavigationAction::Wait { reason },
            other => NavigationAction::Wait {
                reason: Some(format!("unrecognized action '{}'", other)),
            },
        }
    }

    pub fn wait(reason: impl Into<String>) -> Self {
        NavigationAction::Wait {
            reason: Some(reason.into()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationAction::Respond { .. } => "respond",
            NavigationAction::Complete { .. } => "complete",
            NavigationAction::Fail { .. } => "fail",
            NavigationAction::Wait { .. } => "wait",
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn respond_with_text_is_respond() {
        let output = DecisionOutput::new("respond").with_response(" 111.111.111-11 ");
        assert_eq!(
            NavigationAction::classify(&output),
            NavigationAction::Respond {
                text: "111.111.111-11".to_string()
            }
        );
    }

    #[test]
    fn respond_without_text_is_wait() {
        let output = DecisionOutput::new("respond").with_response("   ");
        assert_eq!(NavigationAction::classify(&output).as_str(), "wait");
    }

    #[test]
    fn action_names_are_case_insensitive() {
        let output = DecisionOutput::new(" COMPLETE ").with_extracted_result("Sem pendências.");
        assert_eq!(
            NavigationAction::classify(&output),
            NavigationAction::Complete {
                result: Some("Sem pendências.".to_string())
            }
        );
    }

    #[test]
    fn fail_without_reason_gets_default() {
        let output = DecisionOutput::new("fail");
        assert_eq!(
            NavigationAction::classify(&output),
            NavigationAction::Fail {
                reason: DEFAULT_FAIL_REASON.to_string()
            }
        );
    }

    #[test]
    fn unknown_action_is_wait() {
        let output = DecisionOutput::new("escalate").with_response("call a human");
        assert!(matches!(
            NavigationAction::classify(&output),
            NavigationAction::Wait { .. }
        ));
    }

    #[test]
    fn camel_case_extracted_result_deserializes() {
        let output: DecisionOutput =
            serde_json::from_str(r#"{"action":"complete","extractedResult":"ok"}"#).unwrap();
        assert_eq!(output.extracted_result.as_deref(), Some("ok"));
    }

    proptest! {
        #[test]
        fn classification_stays_in_closed_set(
            action in ".{0,16}",
            response in proptest::option::of(".{0,32}"),
            reason in proptest::option::of(".{0,32}"),
        ) {
            let output = DecisionOutput { action, response, reason, extracted_result: None };
            let name = NavigationAction::classify(&output).as_str();
            prop_assert!(["respond", "complete", "fail", "wait"].contains(&name));
        }

        #[test]
        fn respond_is_never_empty(response in proptest::option::of("\\s{0,8}")) {
            let output = DecisionOutput { action: "respond".to_string(), response, ..DecisionOutput::default() };
            let is_wait = matches!(NavigationAction::classify(&output), NavigationAction::Wait { .. });
            prop_assert!(is_wait);
        }
    }
}
