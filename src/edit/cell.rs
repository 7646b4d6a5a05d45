//! Inline editor for a single field.

use chrono::NaiveDate;

use crate::errors::ConsoleError;
use crate::models::{FieldKind, FieldSpec};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// An open inline editor, seeded with the field's effective value.
///
/// The cell never writes anywhere itself: `confirm` hands back the value for
/// the panel to stage, dropping the cell is a cancel.
#[derive(Debug, Clone)]
pub struct FieldEditCell {
    spec: &'static FieldSpec,
    value: String,
}

impl FieldEditCell {
    pub fn open(spec: &'static FieldSpec, seed: Option<String>) -> Self {
        Self {
            spec,
            value: seed.unwrap_or_default(),
        }
    }

    pub fn field(&self) -> &'static str {
        self.spec.name
    }

    pub fn spec(&self) -> &'static FieldSpec {
        self.spec
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Replace the editor's text. For enum fields a 1-based option number
    /// selects that option.
    pub fn input(&mut self, text: &str) {
        let text = text.trim();
        self.value = match self.spec.kind {
            FieldKind::Enum(options) => text
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| options.get(i))
                .map(|opt| opt.to_string())
                .unwrap_or_else(|| text.to_string()),
            _ => text.to_string(),
        };
    }

    /// Validate the editor value against the field kind.
    pub fn confirm(&self) -> Result<String, ConsoleError> {
        let value = self.value.trim();
        match self.spec.kind {
            FieldKind::Text => Ok(value.to_string()),
            FieldKind::Date if value.is_empty() => Ok(String::new()),
            FieldKind::Date => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map(|date| date.format(DATE_FORMAT).to_string())
                .map_err(|_| {
                    ConsoleError::field(
                        self.spec.name,
                        format!("{} must be a date like 2024-06-30", self.spec.label),
                    )
                }),
            FieldKind::Enum(options) => options
                .iter()
                .find(|opt| opt.eq_ignore_ascii_case(value))
                .map(|opt| opt.to_string())
                .ok_or_else(|| {
                    ConsoleError::field(
                        self.spec.name,
                        format!("{} must be one of: {}", self.spec.label, options.join(", ")),
                    )
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::STUDENT_SCHEMA;

    fn cell(field: &str, seed: &str) -> FieldEditCell {
        FieldEditCell::open(STUDENT_SCHEMA.field(field).unwrap(), Some(seed.to_string()))
    }

    #[test]
    fn test_seeded_with_effective_value() {
        let cell = cell("first_name", "Ana");
        assert_eq!(cell.value(), "Ana");
        assert_eq!(cell.confirm().unwrap(), "Ana");
    }

    #[test]
    fn test_enum_accepts_option_or_number() {
        let mut cell = cell("program", "Nursing Program");
        cell.input("engineering program");
        assert_eq!(cell.confirm().unwrap(), "Engineering Program");

        cell.input("1");
        assert_eq!(cell.value(), "Nursing Program");

        cell.input("Astrology Program");
        let err = cell.confirm().unwrap_err();
        assert!(err.field_errors().contains_key("program"));
    }

    #[test]
    fn test_date_validation() {
        let mut cell = cell("date_of_birth", "");
        cell.input("2001-02-30");
        assert!(cell.confirm().is_err());

        cell.input(" 2001-02-03 ");
        assert_eq!(cell.confirm().unwrap(), "2001-02-03");

        cell.input("");
        assert_eq!(cell.confirm().unwrap(), "");
    }
}
