//! # Case Normalization
//!
//! A run either preserves case everywhere or folds everything to lowercase:
//! dictionary keys, shortcut names, query keys, decoded values, suffix
//! tokens and the messages recorded for them. [`Normalizer`] is the single
//! place that decision lives; it is chosen once per run and passed to every
//! stage that compares strings.

use std::borrow::Cow;

use serde_json::{Map, Value};

/// Case policy for one validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Normalizer {
    /// Strings are compared exactly as written.
    #[default]
    Preserve,
    /// Strings are folded to lowercase before comparison.
    LowerCase,
}

impl Normalizer {
    /// Build the normalizer described by a product's `forceLowerCase` flag.
    pub fn from_force_lower_case(force_lower_case: bool) -> Self {
        if force_lower_case {
            Self::LowerCase
        } else {
            Self::Preserve
        }
    }

    /// Whether this normalizer changes anything.
    pub fn is_folding(&self) -> bool {
        matches!(self, Self::LowerCase)
    }

    /// Return the canonical form of `value`, borrowing when nothing changes.
    pub fn canonicalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match self {
            Self::Preserve => Cow::Borrowed(value),
            Self::LowerCase => {
                let lowered = value.to_lowercase();
                if lowered == value {
                    Cow::Borrowed(value)
                } else {
                    Cow::Owned(lowered)
                }
            }
        }
    }

    /// Canonicalize every string and every object key inside a JSON value.
    pub fn canonicalize_value(&self, value: Value) -> Value {
        if !self.is_folding() {
            return value;
        }
        match value {
            Value::String(s) => Value::String(self.canonicalize(&s).into_owned()),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|v| self.canonicalize_value(v))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(self.canonicalize_map(map)),
            other => other,
        }
    }

    /// Canonicalize the keys and values of a JSON object.
    pub fn canonicalize_map(&self, map: Map<String, Value>) -> Map<String, Value> {
        if !self.is_folding() {
            return map;
        }
        map.into_iter()
            .map(|(k, v)| (self.canonicalize(&k).into_owned(), self.canonicalize_value(v)))
            .collect()
    }
}
