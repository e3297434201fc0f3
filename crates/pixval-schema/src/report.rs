//! # Violation Formatting
//!
//! Turns structural validator errors into the short, stable strings that
//! key the error ledger. The wording is deliberately fixed (`must be
//! boolean`, `must be <= 100`, `must NOT have additional properties`):
//! identical problems across millions of events must collapse onto the
//! same ledger entry, and the strings are what operators grep for.
//!
//! Two renderings exist:
//!
//! - parameters: `"<path> <message>"`, plus `. Found extra property '<k>'`
//!   for undeclared parameters.
//! - suffixes: positions are meaningless to an operator without the token,
//!   so a rejected position reads `Suffix '<token>' at index <i> /<i>
//!   <message>` and a surplus token reads `... Found extra suffix
//!   '<token>' at index <i>`.

use std::fmt;

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value;

const ADDITIONAL_PROPERTIES: &str = "must NOT have additional properties";

/// A single structural violation with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the violating value (empty for the root).
    pub instance_path: String,
    /// JSON Pointer within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description, without location.
    pub message: String,
    /// For undeclared properties: the property name.
    pub unexpected: Option<String>,
}

impl Violation {
    /// Split one validator error into violations. An additional-properties
    /// error naming several properties yields one violation per property.
    pub(crate) fn from_error(error: &ValidationError<'_>) -> Vec<Violation> {
        let instance_path = error.instance_path.to_string();
        let schema_path = error.schema_path.to_string();

        match &error.kind {
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
                .iter()
                .map(|name| Violation {
                    instance_path: instance_path.clone(),
                    schema_path: schema_path.clone(),
                    message: ADDITIONAL_PROPERTIES.to_string(),
                    unexpected: Some(name.clone()),
                })
                .collect(),
            // `additionalProperties: false` can also surface as a false
            // subschema evaluated against the property itself.
            ValidationErrorKind::FalseSchema if schema_path.ends_with("/additionalProperties") => {
                let (parent, name) = split_last_segment(&instance_path);
                vec![Violation {
                    instance_path: parent.to_string(),
                    schema_path,
                    message: ADDITIONAL_PROPERTIES.to_string(),
                    unexpected: Some(name),
                }]
            }
            kind => vec![Violation {
                instance_path,
                schema_path,
                message: message_for(kind).unwrap_or_else(|| error.to_string()),
                unexpected: None,
            }],
        }
    }

    /// Render for a parameter list.
    pub fn format_param(&self) -> String {
        let mut out = format!("{} {}", self.instance_path, self.message);
        if let Some(name) = &self.unexpected {
            out.push_str(&format!(". Found extra property '{name}'"));
        }
        out.trim().to_string()
    }

    /// Render for a suffix list, naming the literal token involved.
    pub fn format_suffix(&self, tokens: &[String]) -> String {
        let token_at = |index: &str| {
            index
                .parse::<usize>()
                .ok()
                .and_then(|i| tokens.get(i))
                .map(String::as_str)
                .unwrap_or_default()
        };

        let out = match &self.unexpected {
            Some(index) => format!(
                "{} {}. Found extra suffix '{}' at index {}",
                self.instance_path,
                self.message,
                token_at(index),
                index
            ),
            None => match first_segment(&self.instance_path) {
                Some(index) => format!(
                    "Suffix '{}' at index {} {} {}",
                    token_at(index),
                    index,
                    self.instance_path,
                    self.message
                ),
                None => format!("{} {}", self.instance_path, self.message),
            },
        };
        out.trim().to_string()
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_param())
    }
}

/// Fixed wording for the error kinds definitions can produce. `None` falls
/// back to the validator's own message.
fn message_for(kind: &ValidationErrorKind) -> Option<String> {
    let message = match kind {
        ValidationErrorKind::Type { kind } => match kind {
            TypeKind::Single(ty) => format!("must be {ty}"),
            TypeKind::Multiple(types) => format!(
                "must be {}",
                types
                    .clone()
                    .into_iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        },
        ValidationErrorKind::Enum { .. } => "must be equal to one of the allowed values".into(),
        ValidationErrorKind::Constant { .. } => "must be equal to constant".into(),
        ValidationErrorKind::Minimum { limit } => format!("must be >= {}", limit_str(limit)),
        ValidationErrorKind::Maximum { limit } => format!("must be <= {}", limit_str(limit)),
        ValidationErrorKind::ExclusiveMinimum { limit } => {
            format!("must be > {}", limit_str(limit))
        }
        ValidationErrorKind::ExclusiveMaximum { limit } => {
            format!("must be < {}", limit_str(limit))
        }
        ValidationErrorKind::MinLength { limit } => {
            format!("must NOT have fewer than {limit} characters")
        }
        ValidationErrorKind::MaxLength { limit } => {
            format!("must NOT have more than {limit} characters")
        }
        ValidationErrorKind::Pattern { pattern } => format!("must match pattern \"{pattern}\""),
        ValidationErrorKind::Format { format } => format!("must match format \"{format}\""),
        ValidationErrorKind::Required { property } => format!(
            "must have required property '{}'",
            property.as_str().map_or_else(|| property.to_string(), str::to_string)
        ),
        _ => return None,
    };
    Some(message)
}

fn limit_str(limit: &Value) -> String {
    match limit {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn first_segment(pointer: &str) -> Option<&str> {
    pointer
        .strip_prefix('/')
        .map(|rest| rest.split('/').next().unwrap_or(rest))
        .filter(|s| !s.is_empty())
}

fn split_last_segment(pointer: &str) -> (&str, String) {
    match pointer.rfind('/') {
        Some(idx) => (
            &pointer[..idx],
            pointer[idx + 1..].replace("~1", "/").replace("~0", "~"),
        ),
        None => ("", pointer.to_string()),
    }
}
