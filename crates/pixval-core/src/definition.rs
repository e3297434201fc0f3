//! # Pixel Definitions
//!
//! The authoring-side data model: a definition file maps dot-segmented
//! pixel prefixes to the parameters and suffixes the pixel may carry.
//! Each parameter or suffix entry is either a [`ParamEntry::Shortcut`]
//! naming a spec in a [`CommonDictionary`], or an inline [`InlineSpec`].
//!
//! Definition files also carry documentation fields (description, owners,
//! triggers, ...). Those are accepted and ignored here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::normalize::Normalizer;

/// Value type assumed when a spec declares none.
pub const DEFAULT_VALUE_TYPE: &str = "string";

/// Encodings a parameter value can be transported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Standard or URL-safe base64, padding optional.
    Base64,
}

/// How a spec identifies the value it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecIdentity<'a> {
    /// An exact parameter name, or a fixed suffix token.
    Key(&'a str),
    /// A regular expression over parameter names.
    Pattern(&'a str),
    /// Neither: a purely positional suffix.
    Positional,
    /// Both `key` and `keyPattern` were set.
    Ambiguous,
}

/// A parameter or suffix descriptor.
///
/// The named fields are the ones the engine interprets. Every other JSON
/// Schema keyword (nested `properties`, `pattern`, `description`, ...) is
/// kept in `keywords` and carried into the compiled schema verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_pattern: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(flatten)]
    pub keywords: Map<String, Value>,
}

impl InlineSpec {
    /// A spec for the exact parameter `key`.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    /// A spec for every parameter whose name matches `pattern`.
    pub fn patterned(pattern: impl Into<String>) -> Self {
        Self {
            key_pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Set the declared value type.
    pub fn with_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    /// Set the allowed values.
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.allowed = Some(values.into_iter().collect());
        self
    }

    /// Set the transport encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Add a raw JSON Schema keyword.
    pub fn with_keyword(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keywords.insert(name.into(), value);
        self
    }

    pub fn identity(&self) -> SpecIdentity<'_> {
        match (self.key.as_deref(), self.key_pattern.as_deref()) {
            (Some(key), None) => SpecIdentity::Key(key),
            (None, Some(pattern)) => SpecIdentity::Pattern(pattern),
            (None, None) => SpecIdentity::Positional,
            (Some(_), Some(_)) => SpecIdentity::Ambiguous,
        }
    }

    /// The declared type, or [`DEFAULT_VALUE_TYPE`].
    pub fn effective_type(&self) -> &str {
        self.value_type.as_deref().unwrap_or(DEFAULT_VALUE_TYPE)
    }

    /// Fill in the default type and turn every enum member into a string.
    ///
    /// Live values always arrive as strings, so `enum: [1, 2]` must accept
    /// `"1"` whatever type the author declared.
    pub fn with_defaults(mut self) -> Self {
        if self.value_type.is_none() {
            self.value_type = Some(DEFAULT_VALUE_TYPE.to_string());
        }
        if let Some(values) = self.allowed.take() {
            self.allowed = Some(
                values
                    .into_iter()
                    .map(|v| Value::String(enum_member_string(v)))
                    .collect(),
            );
        }
        self
    }

    /// Apply `normalizer` to every string that validation compares against.
    pub fn canonicalized(self, normalizer: Normalizer) -> Self {
        if !normalizer.is_folding() {
            return self;
        }
        let fold = |s: String| normalizer.canonicalize(&s).into_owned();
        Self {
            key: self.key.map(fold),
            key_pattern: self.key_pattern.map(fold),
            value_type: self.value_type.map(fold),
            allowed: self.allowed.map(|values| {
                values
                    .into_iter()
                    .map(|v| normalizer.canonicalize_value(v))
                    .collect()
            }),
            minimum: self.minimum,
            maximum: self.maximum,
            encoding: self.encoding,
            format: self.format,
            keywords: normalizer.canonicalize_map(self.keywords),
        }
    }
}

fn enum_member_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A parameter or suffix entry as written in a definition file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamEntry {
    /// A name resolved against a common dictionary.
    Shortcut(String),
    /// A spec written in place.
    Inline(InlineSpec),
}

impl From<InlineSpec> for ParamEntry {
    fn from(spec: InlineSpec) -> Self {
        Self::Inline(spec)
    }
}

impl From<&str> for ParamEntry {
    fn from(name: &str) -> Self {
        Self::Shortcut(name.to_string())
    }
}

/// The payload kept for one pixel prefix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelDefinition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParamEntry>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffixes: Vec<ParamEntry>,
}

/// One definition source: prefix to definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelDefinitions(pub BTreeMap<String, PixelDefinition>);

impl PixelDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the definition for `prefix`.
    pub fn insert(&mut self, prefix: impl Into<String>, definition: PixelDefinition) {
        self.0.insert(prefix.into(), definition);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PixelDefinition)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, PixelDefinition)> for PixelDefinitions {
    fn from_iter<I: IntoIterator<Item = (String, PixelDefinition)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Named specs that shortcuts resolve against. Also the shape of the
/// ignore-list merged into every pixel's parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommonDictionary(pub BTreeMap<String, InlineSpec>);

impl CommonDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: InlineSpec) {
        self.0.insert(name.into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<&InlineSpec> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every spec as an inline entry, in name order.
    pub fn entries(&self) -> Vec<ParamEntry> {
        self.0.values().cloned().map(ParamEntry::Inline).collect()
    }

    /// Re-key the dictionary under `normalizer`. Spec bodies are folded at
    /// resolution time, not here.
    pub fn canonicalized(&self, normalizer: Normalizer) -> Self {
        Self(
            self.0
                .iter()
                .map(|(name, spec)| (normalizer.canonicalize(name).into_owned(), spec.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, InlineSpec)> for CommonDictionary {
    fn from_iter<I: IntoIterator<Item = (String, InlineSpec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
