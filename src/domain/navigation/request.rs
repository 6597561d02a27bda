//! Inputs for the three decision modes.

use serde::{Deserialize, Serialize};

use crate::domain::profile::{Field, FieldType, MenuOption, Profile, ResponderStyle};
use crate::domain::session::{LogEntry, Session};

/// Default number of transcript entries handed to a decide call.
pub const DEFAULT_TRANSCRIPT_TAIL: usize = 10;

/// A disclosable fact as the decision source sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContext {
    pub label: String,
    pub value: String,
    pub phrasings: Vec<String>,
    pub field_type: FieldType,
    pub required: bool,
}

impl From<&Field> for FieldContext {
    fn from(field: &Field) -> Self {
        Self {
            label: field.label.clone(),
            value: field.value.clone(),
            phrasings: field.phrasings.clone(),
            field_type: field.field_type,
            required: field.required,
        }
    }
}

/// A menu option as the decision source sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOptionContext {
    pub value: String,
    pub label: String,
    pub keywords: Vec<String>,
    pub is_exit: bool,
}

impl From<&MenuOption> for MenuOptionContext {
    fn from(option: &MenuOption) -> Self {
        Self {
            value: option.value.clone(),
            label: option.label.clone(),
            keywords: option.keywords.clone(),
            is_exit: option.is_exit,
        }
    }
}

/// Session counters shown to the decision source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounters {
    pub messages_sent: u32,
    pub messages_received: u32,
    pub message_ceiling: u32,
}

/// Input for the opening-message generation mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub objective: String,
    pub profile_name: String,
    pub profile_description: String,
    pub fields: Vec<FieldContext>,
}

impl GenerationRequest {
    pub fn build(profile: &Profile, session: &Session) -> Self {
        Self {
            objective: session.objective().to_string(),
            profile_name: profile.name().to_string(),
            profile_description: profile.description().to_string(),
            fields: field_contexts(profile),
        }
    }

    /// Opening message used when generation returns nothing usable.
    pub fn fallback_message(&self) -> String {
        format!("Olá! {}", self.objective)
    }
}

/// Input for the decide mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub objective: String,
    pub profile_name: String,
    pub profile_description: String,
    pub style: ResponderStyle,
    pub fields: Vec<FieldContext>,
    /// Empty for free-text responders.
    pub menu_options: Vec<MenuOptionContext>,
    /// Oldest first.
    pub transcript: Vec<LogEntry>,
    pub counters: DecisionCounters,
}

impl DecisionRequest {
    pub fn build(profile: &Profile, session: &Session, tail_len: usize, message_ceiling: u32) -> Self {
        let menu_options = if profile.style().uses_menu() {
            profile.menu_options().iter().map(MenuOptionContext::from).collect()
        } else {
            Vec::new()
        };

        Self {
            objective: session.objective().to_string(),
            profile_name: profile.name().to_string(),
            profile_description: profile.description().to_string(),
            style: profile.style(),
            fields: field_contexts(profile),
            menu_options,
            transcript: session.log_tail(tail_len).to_vec(),
            counters: DecisionCounters {
                messages_sent: session.messages_sent(),
                messages_received: session.messages_received(),
                message_ceiling,
            },
        }
    }
}

/// Input for the summarize mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub objective: String,
    pub final_message: String,
}

impl SummaryRequest {
    pub fn new(objective: impl Into<String>, final_message: impl Into<String>) -> Self {
        Self {
            objective: objective.into(),
            final_message: final_message.into(),
        }
    }

    /// Summary used when summarization fails.
    pub fn fallback_summary(&self) -> String {
        let mut excerpt: String = self.final_message.chars().take(200).collect();
        if excerpt.len() < self.final_message.len() {
            excerpt.push_str("...");
        }
        format!("{}: {}", self.objective, excerpt)
    }
}

fn field_contexts(profile: &Profile) -> Vec<FieldContext> {
    profile
        .fields_by_priority()
        .into_iter()
        .map(FieldContext::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::profile::fixtures::profile_with_cpf;
    use crate::domain::profile::{Field, MenuOption, ProfileUpdate};
    use crate::domain::session::fixtures::new_session;

    fn session_for(profile: &Profile) -> Session {
        Session::new(new_session(*profile.id(), Timestamp::now().plus_secs(600))).unwrap()
    }

    #[test]
    fn decision_request_carries_tail_and_counters() {
        let profile = profile_with_cpf();
        let mut session = session_for(&profile);
        for i in 0..15 {
            session.append_our_message(format!("us {}", i)).unwrap();
            session.append_responder_message(format!("bot {}", i)).unwrap();
        }

        let request = DecisionRequest::build(&profile, &session, 10, 20);

        assert_eq!(request.transcript.len(), 10);
        assert_eq!(request.transcript.last().unwrap().text, "bot 14");
        assert_eq!(request.counters.messages_sent, 15);
        assert_eq!(request.counters.messages_received, 15);
        assert_eq!(request.counters.message_ceiling, 20);
        assert_eq!(request.fields[0].value, "111.111.111-11");
    }

    #[test]
    fn fields_are_ordered_by_priority() {
        let mut profile = profile_with_cpf();
        profile
            .add_field(
                Field::new("Conta", "998877", FieldType::Number)
                    .unwrap()
                    .with_priority(5),
            )
            .unwrap();
        let session = session_for(&profile);

        let request = DecisionRequest::build(&profile, &session, 10, 20);
        let labels: Vec<&str> = request.fields.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["Conta", "CPF"]);
    }

    #[test]
    fn free_text_responders_get_no_menu() {
        let mut profile = profile_with_cpf();
        profile
            .add_menu_option(MenuOption::new("1", "Segunda via").unwrap())
            .unwrap();
        let session = session_for(&profile);
        assert_eq!(DecisionRequest::build(&profile, &session, 10, 20).menu_options.len(), 1);

        profile
            .update(ProfileUpdate {
                style: Some(ResponderStyle::FreeText),
                ..ProfileUpdate::default()
            })
            .unwrap();
        assert!(DecisionRequest::build(&profile, &session, 10, 20).menu_options.is_empty());
    }

    #[test]
    fn fallback_summary_truncates_long_messages() {
        let request = SummaryRequest::new("check outage", "x".repeat(500));
        let summary = request.fallback_summary();
        assert!(summary.starts_with("check outage: "));
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn fallback_message_mentions_objective() {
        let profile = profile_with_cpf();
        let session = session_for(&profile);
        let request = GenerationRequest::build(&profile, &session);
        assert!(request.fallback_message().contains("ask if water is out"));
    }
}
