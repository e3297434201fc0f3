//! # Scalar Coercion
//!
//! Query parameters and suffix tokens always arrive as strings, while
//! definitions declare `integer`, `number`, `boolean` or `null` fields.
//! Before a value reaches the structural validator it is rewritten in
//! place to the declared scalar type wherever the conversion is lossless
//! (`"42"` to `42`, `"true"` to `true`). Values that do not convert are
//! left alone so the validator reports them against the declared type.
//!
//! The [`CoercionPlan`] mirrors the emitted schema: one node per schema,
//! with children for `properties`, `patternProperties` and `items`, so
//! nested objects decoded from JSON payloads are coerced as deeply as they
//! are validated. Schemas with an `enum` are never coerced: enum members
//! are strings and membership is checked on the string form.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Number, Value};

use crate::error::CompileError;

/// Scalar types a string can be coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl ScalarType {
    fn from_schema_type(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }
}

/// Coercion rules derived from one schema node.
#[derive(Debug, Clone, Default)]
pub struct CoercionPlan {
    scalar: Option<ScalarType>,
    properties: BTreeMap<String, CoercionPlan>,
    patterns: Vec<(Regex, CoercionPlan)>,
    items: Option<Box<CoercionPlan>>,
}

impl CoercionPlan {
    /// Derive a plan from an emitted JSON Schema.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InvalidKeyPattern`] if a `patternProperties`
    /// key anywhere in the schema is not a valid regex.
    pub fn from_schema(schema: &Value) -> Result<Self, CompileError> {
        let Some(obj) = schema.as_object() else {
            return Ok(Self::default());
        };

        let scalar = if obj.contains_key("enum") {
            None
        } else {
            obj.get("type")
                .and_then(Value::as_str)
                .and_then(ScalarType::from_schema_type)
        };

        let mut properties = BTreeMap::new();
        if let Some(props) = obj.get("properties").and_then(Value::as_object) {
            for (name, sub) in props {
                properties.insert(name.clone(), Self::from_schema(sub)?);
            }
        }

        let mut patterns = Vec::new();
        if let Some(props) = obj.get("patternProperties").and_then(Value::as_object) {
            for (pattern, sub) in props {
                let regex = Regex::new(pattern).map_err(|e| CompileError::InvalidKeyPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                patterns.push((regex, Self::from_schema(sub)?));
            }
        }

        let items = match obj.get("items") {
            Some(sub) if sub.is_object() => Some(Box::new(Self::from_schema(sub)?)),
            _ => None,
        };

        Ok(Self {
            scalar,
            properties,
            patterns,
            items,
        })
    }

    /// Whether applying this plan can change anything.
    pub fn is_noop(&self) -> bool {
        self.scalar.is_none()
            && self.items.is_none()
            && self.properties.values().all(CoercionPlan::is_noop)
            && self.patterns.iter().all(|(_, p)| p.is_noop())
    }

    /// Coerce `value` in place.
    pub fn apply(&self, value: &mut Value) {
        if let Some(scalar) = self.scalar {
            if let Some(coerced) = coerce_scalar(value, scalar) {
                *value = coerced;
            }
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    if let Some(plan) = self.properties.get(key) {
                        plan.apply(child);
                    }
                    for (regex, plan) in &self.patterns {
                        if regex.is_match(key) {
                            plan.apply(child);
                        }
                    }
                }
            }
            Value::Array(items) => {
                if let Some(plan) = &self.items {
                    for item in items {
                        plan.apply(item);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Convert `value` to `target`, or `None` when it already has that type or
/// has no lossless conversion.
fn coerce_scalar(value: &Value, target: ScalarType) -> Option<Value> {
    match (target, value) {
        (ScalarType::Integer, Value::String(s)) => parse_number(s)
            .filter(|n| n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0))
            .map(Value::Number),
        (ScalarType::Number, Value::String(s)) => parse_number(s).map(Value::Number),
        (ScalarType::Integer | ScalarType::Number, Value::Bool(b)) => {
            Some(Value::Number(Number::from(u8::from(*b))))
        }
        (ScalarType::Integer | ScalarType::Number, Value::Null) => Some(Value::Number(0.into())),

        (ScalarType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (ScalarType::Boolean, Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            _ => None,
        },
        (ScalarType::Boolean, Value::Null) => Some(Value::Bool(false)),

        (ScalarType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ScalarType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (ScalarType::String, Value::Null) => Some(Value::String(String::new())),

        (ScalarType::Null, Value::String(s)) if s.is_empty() => Some(Value::Null),
        (ScalarType::Null, Value::Bool(false)) => Some(Value::Null),
        (ScalarType::Null, Value::Number(n)) if n.as_f64() == Some(0.0) => Some(Value::Null),

        _ => None,
    }
}

/// Numeric reading of a string, following JavaScript's `Number(s)`:
/// surrounding whitespace is ignored, a blank string reads as zero, and
/// `0x`/`0o`/`0b` prefixes select the radix. The empty string and
/// non-finite results do not convert.
fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() {
        return None;
    }
    let s = s.trim();
    if s.is_empty() {
        return Some(Number::from(0));
    }
    if let Some(n) = parse_radix(s) {
        return Some(Number::from(n));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Number::from(u));
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return None;
    }
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

fn parse_radix(s: &str) -> Option<u64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}
