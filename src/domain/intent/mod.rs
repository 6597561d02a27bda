//! Intent domain module.
//!
//! Cheap keyword pre-filter that decides whether free-form operator text
//! is worth a classification call at all, and the types that call returns.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::ProfileId;

/// Automation verbs recognized when no keyword list is configured.
pub static DEFAULT_KEYWORDS: Lazy<Vec<String>> = Lazy::new(|| {
    [
        // Portuguese
        "pergunte",
        "pergunta",
        "consulte",
        "consultar",
        "verifique",
        "verificar",
        "descubra",
        "solicite",
        "peça",
        "entre em contato",
        "fale com",
        // English
        "ask",
        "check",
        "find out",
        "request",
        "contact",
        "query",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
});

/// Keyword pre-filter for automation requests.
#[derive(Debug, Clone)]
pub struct IntentFilter {
    keywords: Vec<String>,
}

impl IntentFilter {
    pub fn new(keywords: Vec<String>) -> Self {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Self::default();
        }
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True if `text` contains any keyword as a whole word or phrase.
    pub fn matches(&self, text: &str) -> bool {
        let normalized = normalize(text);
        self.keywords.iter().any(|keyword| {
            let keyword = normalize(keyword);
            !keyword.is_empty() && format!(" {} ", normalized).contains(&format!(" {} ", keyword))
        })
    }
}

impl Default for IntentFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.clone(),
        }
    }
}

/// Lowercase, with punctuation folded into single spaces.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A profile offered to the classifier as a possible target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCandidate {
    pub profile_id: ProfileId,
    pub name: String,
    pub alias: Option<String>,
    pub description: String,
}

/// What the classifier concluded about an operator message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentClassification {
    #[serde(default)]
    pub is_automation: bool,
    #[serde(default)]
    pub profile_id: Option<ProfileId>,
    /// Objective rewritten for the responder, if the classifier produced one.
    #[serde(default)]
    pub objective: Option<String>,
}

impl IntentClassification {
    pub fn not_automation() -> Self {
        Self::default()
    }

    /// Accepts the classification only if it names one of `candidates`.
    pub fn resolve<'a>(&self, candidates: &'a [IntentCandidate]) -> Option<&'a IntentCandidate> {
        if !self.is_automation {
            return None;
        }
        let target = self.profile_id?;
        candidates.iter().find(|c| c.profile_id == target)
    }
}
