//! Disclosable profile fields.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FieldId, ValidationError};

/// Maximum length for a field label.
pub const MAX_LABEL_LENGTH: usize = 120;

/// Maximum length for a field value.
pub const MAX_VALUE_LENGTH: usize = 1_000;

/// Kind of data a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    NationalId,
    Phone,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::NationalId => "national_id",
            FieldType::Phone => "phone",
            FieldType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "national_id" => Ok(FieldType::NationalId),
            "phone" => Ok(FieldType::Phone),
            "date" => Ok(FieldType::Date),
            other => Err(ValidationError::invalid_format(
                "field_type",
                format!("unknown field type '{}'", other),
            )),
        }
    }
}

/// A fact the engine may disclose to the responder.
///
/// Transcripts store the text that was sent, so editing a field only
/// affects later turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub label: String,
    pub value: String,
    /// Phrasings the responder is known to use when asking for this field.
    pub phrasings: Vec<String>,
    pub field_type: FieldType,
    /// Higher wins when several fields match the same prompt.
    pub priority: i32,
    pub required: bool,
}

impl Field {
    /// Creates a validated field.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if label or value is blank
    /// - `OutOfRange` if label or value is too long
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        field_type: FieldType,
    ) -> Result<Self, ValidationError> {
        let field = Self {
            id: FieldId::new(),
            label: label.into().trim().to_string(),
            value: value.into().trim().to_string(),
            phrasings: Vec::new(),
            field_type,
            priority: 0,
            required: false,
        };
        field.validate()?;
        Ok(field)
    }

    pub fn with_phrasings(mut self, phrasings: Vec<String>) -> Self {
        self.phrasings = clean_list(phrasings);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Checks label/value constraints.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("label", &self.label, MAX_LABEL_LENGTH)?;
        validate_text("value", &self.value, MAX_VALUE_LENGTH)?;
        Ok(())
    }
}

/// Attributes accepted when adding a field.
#[derive(Debug, Clone, Deserialize)]
pub struct NewField {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub phrasings: Vec<String>,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub required: bool,
}

impl NewField {
    pub fn into_field(self) -> Result<Field, ValidationError> {
        Ok(Field::new(self.label, self.value, self.field_type)?
            .with_phrasings(self.phrasings)
            .with_priority(self.priority)
            .with_required(self.required))
    }
}

/// Partial update for a field. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldUpdate {
    pub label: Option<String>,
    pub value: Option<String>,
    pub phrasings: Option<Vec<String>>,
    pub field_type: Option<FieldType>,
    pub priority: Option<i32>,
    pub required: Option<bool>,
}

impl FieldUpdate {
    /// Applies the update to a copy of `field` and validates the result.
    pub fn apply(self, field: &Field) -> Result<Field, ValidationError> {
        let mut updated = field.clone();
        if let Some(label) = self.label {
            updated.label = label.trim().to_string();
        }
        if let Some(value) = self.value {
            updated.value = value.trim().to_string();
        }
        if let Some(phrasings) = self.phrasings {
            updated.phrasings = clean_list(phrasings);
        }
        if let Some(field_type) = self.field_type {
            updated.field_type = field_type;
        }
        if let Some(priority) = self.priority {
            updated.priority = priority;
        }
        if let Some(required) = self.required {
            updated.required = required;
        }
        updated.validate()?;
        Ok(updated)
    }
}

pub(crate) fn validate_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::out_of_range(field, 1, max as i64, len as i64));
    }
    Ok(())
}

pub(crate) fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_label_and_value() {
        let field = Field::new("  CPF ", " 111.111.111-11 ", FieldType::NationalId).unwrap();
        assert_eq!(field.label, "CPF");
        assert_eq!(field.value, "111.111.111-11");
    }

    #[test]
    fn new_rejects_blank_value() {
        let err = Field::new("CPF", "  ", FieldType::NationalId).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("value"));
    }

    #[test]
    fn phrasings_drop_blank_entries() {
        let field = Field::new("CPF", "1", FieldType::Text)
            .unwrap()
            .with_phrasings(vec!["informe seu cpf".into(), "  ".into()]);
        assert_eq!(field.phrasings, vec!["informe seu cpf".to_string()]);
    }

    #[test]
    fn update_changes_only_given_attributes() {
        let field = Field::new("CPF", "1", FieldType::Text).unwrap().with_priority(3);
        let updated = FieldUpdate {
            value: Some("2".into()),
            ..Default::default()
        }
        .apply(&field)
        .unwrap();

        assert_eq!(updated.value, "2");
        assert_eq!(updated.label, "CPF");
        assert_eq!(updated.priority, 3);
        assert_eq!(updated.id, field.id);
    }

    #[test]
    fn update_rejects_blank_label() {
        let field = Field::new("CPF", "1", FieldType::Text).unwrap();
        let result = FieldUpdate {
            label: Some(" ".into()),
            ..Default::default()
        }
        .apply(&field);
        assert!(result.is_err());
    }

    #[test]
    fn field_type_parses_storage_names() {
        assert_eq!(FieldType::parse("national_id").unwrap(), FieldType::NationalId);
        assert!(FieldType::parse("ssn").is_err());
    }
}
