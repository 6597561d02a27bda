//! Menu options for menu-driven responders.

use serde::{Deserialize, Serialize};

use super::field::{clean_list, validate_text};
use crate::domain::foundation::{MenuOptionId, ValidationError};

const MAX_OPTION_VALUE_LENGTH: usize = 40;
const MAX_OPTION_LABEL_LENGTH: usize = 200;

/// A known selectable choice in the responder's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: MenuOptionId,
    /// Literal text to send to select the option (e.g. `"2"`).
    pub value: String,
    pub label: String,
    /// Words the decision function uses to map intent to this option.
    pub keywords: Vec<String>,
    /// Selecting this option ends the conversation without a usable result.
    pub is_exit: bool,
}

impl MenuOption {
    /// Creates a validated menu option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Result<Self, ValidationError> {
        let option = Self {
            id: MenuOptionId::new(),
            value: value.into().trim().to_string(),
            label: label.into().trim().to_string(),
            keywords: Vec::new(),
            is_exit: false,
        };
        option.validate()?;
        Ok(option)
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = clean_list(keywords);
        self
    }

    pub fn exit(mut self) -> Self {
        self.is_exit = true;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("value", &self.value, MAX_OPTION_VALUE_LENGTH)?;
        validate_text("label", &self.label, MAX_OPTION_LABEL_LENGTH)?;
        Ok(())
    }

    /// True if `reply` selects this option.
    pub fn matches_reply(&self, reply: &str) -> bool {
        reply.trim().eq_ignore_ascii_case(&self.value)
    }
}

/// Attributes accepted when adding a menu option.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub is_exit: bool,
}

impl NewMenuOption {
    pub fn into_option(self) -> Result<MenuOption, ValidationError> {
        let mut option = MenuOption::new(self.value, self.label)?.with_keywords(self.keywords);
        option.is_exit = self.is_exit;
        Ok(option)
    }
}

/// Partial update for a menu option.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuOptionUpdate {
    pub value: Option<String>,
    pub label: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub is_exit: Option<bool>,
}

impl MenuOptionUpdate {
    pub fn apply(self, option: &MenuOption) -> Result<MenuOption, ValidationError> {
        let mut updated = option.clone();
        if let Some(value) = self.value {
            updated.value = value.trim().to_string();
        }
        if let Some(label) = self.label {
            updated.label = label.trim().to_string();
        }
        if let Some(keywords) = self.keywords {
            updated.keywords = clean_list(keywords);
        }
        if let Some(is_exit) = self.is_exit {
            updated.is_exit = is_exit;
        }
        updated.validate()?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_reply_ignores_whitespace_and_case() {
        let option = MenuOption::new("A", "Segunda via").unwrap();
        assert!(option.matches_reply(" a "));
        assert!(!option.matches_reply("b"));
    }

    #[test]
    fn exit_builder_marks_option() {
        let option = MenuOption::new("9", "Encerrar").unwrap().exit();
        assert!(option.is_exit);
    }

    #[test]
    fn rejects_blank_value() {
        assert!(MenuOption::new("", "Label").is_err());
    }

    #[test]
    fn update_toggles_exit_flag() {
        let option = MenuOption::new("9", "Encerrar").unwrap();
        let updated = MenuOptionUpdate {
            is_exit: Some(true),
            ..Default::default()
        }
        .apply(&option)
        .unwrap();
        assert!(updated.is_exit);
        assert_eq!(updated.value, "9");
    }
}
