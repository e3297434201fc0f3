//! # Schema Compiler
//!
//! Resolves a pixel's parameter and suffix entries against the common
//! dictionaries and compiles each list into a strict structural validator.
//!
//! ## Parameters
//!
//! Every entry is resolved (shortcut lookup, default `type`, enum members
//! stringified) and placed by identity: a `key` becomes an exact object
//! property, a `keyPattern` becomes a regex-keyed pattern property. The
//! emitted schema is
//!
//! ```json
//! { "type": "object", "properties": {..}, "patternProperties": {..},
//!   "additionalProperties": false }
//! ```
//!
//! ## Suffixes
//!
//! Suffixes are positional. A counter starts at 0; an entry with a `key`
//! first pins that literal at the current position (`enum: [key]`), then
//! its own constraint takes the next position. Entries without a key take
//! one position. The resulting index-keyed object schema rejects positions
//! past the declared ones but requires none of them.
//!
//! ## Case folding
//!
//! [`SchemaCompiler::with_case_folding`] re-keys the dictionaries and folds
//! every resolved spec, so shortcut names, keys, patterns and enum members
//! are compared in the run's canonical case.

use std::collections::BTreeMap;
use std::fmt;

use jsonschema::{Draft, Validator};
use pixval_core::{
    CommonDictionary, Encoding, InlineSpec, Normalizer, ParamEntry, PixelDefinition, SpecIdentity,
};
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::coerce::CoercionPlan;
use crate::error::CompileError;
use crate::report::Violation;

/// How a live parameter value must be decoded before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Transport encoding applied on top of percent-encoding.
    pub encoding: Option<Encoding>,
    /// Declared value type after defaults.
    pub value_type: String,
}

impl FieldSpec {
    fn from_spec(spec: &InlineSpec) -> Self {
        Self {
            encoding: spec.encoding,
            value_type: spec.effective_type().to_string(),
        }
    }

    /// Whether the decoded value is a JSON document.
    pub fn is_object(&self) -> bool {
        self.value_type == "object"
    }
}

/// A compiled JSON Schema plus the coercion applied before it runs.
struct StructuralValidator {
    schema: Value,
    validator: Validator,
    coercion: CoercionPlan,
}

impl StructuralValidator {
    fn build(schema: Value) -> Result<Self, CompileError> {
        let coercion = CoercionPlan::from_schema(&schema)?;

        let mut opts = jsonschema::options();
        opts.with_draft(Draft::Draft202012);
        opts.should_validate_formats(true);
        let validator = opts
            .build(&schema)
            .map_err(|e| CompileError::SchemaBuild {
                reason: e.to_string(),
            })?;

        Ok(Self {
            schema,
            validator,
            coercion,
        })
    }

    fn validate(&self, mut instance: Value) -> Vec<Violation> {
        self.coercion.apply(&mut instance);
        self.validator
            .iter_errors(&instance)
            .flat_map(|e| Violation::from_error(&e))
            .collect()
    }
}

impl fmt::Debug for StructuralValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Strict validator over a pixel's normalized query parameters.
#[derive(Debug)]
pub struct CompiledParams {
    inner: StructuralValidator,
    fields: BTreeMap<String, FieldSpec>,
    patterns: Vec<(Regex, FieldSpec)>,
}

impl CompiledParams {
    /// Decoding rules for parameter `key`: an exact key wins over patterns.
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key).or_else(|| {
            self.patterns
                .iter()
                .find(|(regex, _)| regex.is_match(key))
                .map(|(_, field)| field)
        })
    }

    /// The emitted JSON Schema.
    pub fn schema(&self) -> &Value {
        &self.inner.schema
    }

    /// Validate a key → value object.
    pub fn validate(&self, params: Value) -> Vec<Violation> {
        self.inner.validate(params)
    }
}

/// Strict validator over a pixel's suffix tokens.
#[derive(Debug)]
pub struct CompiledSuffixes {
    inner: StructuralValidator,
    positions: usize,
}

impl CompiledSuffixes {
    /// Number of declared positions.
    pub fn positions(&self) -> usize {
        self.positions
    }

    pub fn schema(&self) -> &Value {
        &self.inner.schema
    }

    /// Validate suffix tokens, taken in order as positions 0, 1, ...
    pub fn validate(&self, tokens: &[String]) -> Vec<Violation> {
        let instance: Map<String, Value> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (i.to_string(), Value::String(t.clone())))
            .collect();
        self.inner.validate(Value::Object(instance))
    }
}

/// Both validators of one defined prefix. Immutable once built.
#[derive(Debug)]
pub struct CompiledPixel {
    pub params: CompiledParams,
    pub suffixes: CompiledSuffixes,
}

/// Resolves entries against the common dictionaries and compiles them.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    common_params: CommonDictionary,
    common_suffixes: CommonDictionary,
    params_case: Normalizer,
    suffixes_case: Normalizer,
}

impl SchemaCompiler {
    pub fn new(common_params: CommonDictionary, common_suffixes: CommonDictionary) -> Self {
        Self {
            common_params,
            common_suffixes,
            params_case: Normalizer::Preserve,
            suffixes_case: Normalizer::Preserve,
        }
    }

    /// Compare parameters under `params` and suffixes under `suffixes`.
    pub fn with_case_folding(self, params: Normalizer, suffixes: Normalizer) -> Self {
        Self {
            common_params: self.common_params.canonicalized(params),
            common_suffixes: self.common_suffixes.canonicalized(suffixes),
            params_case: params,
            suffixes_case: suffixes,
        }
    }

    pub fn params_case(&self) -> Normalizer {
        self.params_case
    }

    pub fn suffixes_case(&self) -> Normalizer {
        self.suffixes_case
    }

    /// Resolve one parameter entry to its final spec.
    pub fn resolve_param(&self, entry: &ParamEntry) -> Result<InlineSpec, CompileError> {
        resolve(entry, &self.common_params, self.params_case)
    }

    /// Resolve one suffix entry to its final spec.
    pub fn resolve_suffix(&self, entry: &ParamEntry) -> Result<InlineSpec, CompileError> {
        resolve(entry, &self.common_suffixes, self.suffixes_case)
    }

    /// Compile a parameter list into a strict object validator.
    ///
    /// # Errors
    ///
    /// Unknown shortcuts, entries without (or with both) identities,
    /// duplicate keys or patterns, a key claimed by a pattern, and invalid
    /// patterns.
    pub fn compile_params(&self, entries: &[ParamEntry]) -> Result<CompiledParams, CompileError> {
        let mut properties = Map::new();
        let mut pattern_properties = Map::new();
        let mut fields = BTreeMap::new();
        let mut patterns: Vec<(Regex, FieldSpec)> = Vec::new();

        for entry in entries {
            let spec = self.resolve_param(entry)?;
            let field = FieldSpec::from_spec(&spec);
            match spec.identity() {
                SpecIdentity::Key(key) => {
                    if properties.contains_key(key) {
                        return Err(CompileError::DuplicateKey { key: key.to_string() });
                    }
                    properties.insert(key.to_string(), value_schema(&spec));
                    fields.insert(key.to_string(), field);
                }
                SpecIdentity::Pattern(pattern) => {
                    if pattern_properties.contains_key(pattern) {
                        return Err(CompileError::DuplicateKeyPattern {
                            pattern: pattern.to_string(),
                        });
                    }
                    let regex = Regex::new(pattern).map_err(|e| CompileError::InvalidKeyPattern {
                        pattern: pattern.to_string(),
                        reason: e.to_string(),
                    })?;
                    pattern_properties.insert(pattern.to_string(), value_schema(&spec));
                    patterns.push((regex, field));
                }
                SpecIdentity::Positional => return Err(CompileError::MissingKey),
                SpecIdentity::Ambiguous => {
                    return Err(CompileError::AmbiguousIdentity {
                        key: spec.key.clone().unwrap_or_default(),
                        pattern: spec.key_pattern.clone().unwrap_or_default(),
                    })
                }
            }
        }

        for key in fields.keys() {
            if let Some((regex, _)) = patterns.iter().find(|(regex, _)| regex.is_match(key)) {
                return Err(CompileError::KeyMatchesPattern {
                    key: key.clone(),
                    pattern: regex.as_str().to_string(),
                });
            }
        }

        let schema = json!({
            "type": "object",
            "properties": properties,
            "patternProperties": pattern_properties,
            "additionalProperties": false,
        });
        Ok(CompiledParams {
            inner: StructuralValidator::build(schema)?,
            fields,
            patterns,
        })
    }

    /// Compile a suffix list into a strict positional validator.
    ///
    /// # Errors
    ///
    /// Unknown shortcuts, and invalid nested patterns.
    pub fn compile_suffixes(
        &self,
        entries: &[ParamEntry],
    ) -> Result<CompiledSuffixes, CompileError> {
        let mut properties = Map::new();
        let mut index = 0usize;

        for entry in entries {
            let spec = self.resolve_suffix(entry)?;
            if let Some(key) = &spec.key {
                properties.insert(index.to_string(), json!({ "enum": [key] }));
                index += 1;
            }
            properties.insert(index.to_string(), value_schema(&spec));
            index += 1;
        }

        let schema = json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
        });
        Ok(CompiledSuffixes {
            inner: StructuralValidator::build(schema)?,
            positions: index,
        })
    }

    /// Compile both lists of a definition. `extra_params` (the run's
    /// ignore-list) is appended to the definition's own parameters.
    pub fn compile_pixel(
        &self,
        definition: &PixelDefinition,
        extra_params: &[ParamEntry],
    ) -> Result<CompiledPixel, CompileError> {
        let suffixes = self.compile_suffixes(&definition.suffixes)?;
        let params: Vec<ParamEntry> = definition
            .parameters
            .iter()
            .chain(extra_params)
            .cloned()
            .collect();
        let params = self.compile_params(&params)?;
        Ok(CompiledPixel { params, suffixes })
    }
}

fn resolve(
    entry: &ParamEntry,
    dictionary: &CommonDictionary,
    normalizer: Normalizer,
) -> Result<InlineSpec, CompileError> {
    let spec = match entry {
        ParamEntry::Shortcut(name) => {
            let name = normalizer.canonicalize(name);
            dictionary
                .get(&name)
                .cloned()
                .ok_or_else(|| CompileError::UnknownShortcut {
                    name: name.into_owned(),
                })?
        }
        ParamEntry::Inline(spec) => spec.clone(),
    };
    Ok(spec.canonicalized(normalizer).with_defaults())
}

/// The JSON Schema constraining a single value. Identity and transport
/// fields (`key`, `keyPattern`, `encoding`) are not schema keywords and are
/// left out. With an `enum`, membership alone decides: members are strings,
/// so a scalar `type` would only contradict them.
fn value_schema(spec: &InlineSpec) -> Value {
    let mut schema = spec.keywords.clone();
    match &spec.allowed {
        Some(values) => {
            schema.insert("enum".into(), Value::Array(values.clone()));
        }
        None => {
            schema.insert("type".into(), Value::String(spec.effective_type().to_string()));
        }
    }
    if let Some(min) = &spec.minimum {
        schema.insert("minimum".into(), Value::Number(min.clone()));
    }
    if let Some(max) = &spec.maximum {
        schema.insert("maximum".into(), Value::Number(max.clone()));
    }
    if let Some(format) = &spec.format {
        schema.insert("format".into(), Value::String(format.clone()));
    }
    Value::Object(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entries(value: Value) -> Vec<ParamEntry> {
        serde_json::from_value(value).unwrap()
    }

    fn dict(value: Value) -> CommonDictionary {
        serde_json::from_value(value).unwrap()
    }

    fn messages(violations: &[Violation]) -> Vec<String> {
        violations.iter().map(Violation::format_param).collect()
    }

    #[test]
    fn fixed_keys_and_strictness() {
        let compiler = SchemaCompiler::default();
        let params = compiler
            .compile_params(&entries(json!([{"key": "param1", "type": "boolean"}])))
            .unwrap();

        assert!(params.validate(json!({})).is_empty());
        assert!(params.validate(json!({"param1": "true"})).is_empty());
        assert_eq!(
            messages(&params.validate(json!({"param1": "not_a_bool"}))),
            vec!["/param1 must be boolean"]
        );
        assert_eq!(
            messages(&params.validate(json!({"param1": "true", "param2": "x"}))),
            vec!["must NOT have additional properties. Found extra property 'param2'"]
        );
    }

    #[test]
    fn shortcuts_resolve_against_dictionary() {
        let compiler = SchemaCompiler::new(
            dict(json!({"common": {"key": "common", "type": "integer", "minimum": 0, "maximum": 100}})),
            CommonDictionary::new(),
        );
        let params = compiler
            .compile_params(&entries(json!(["common", {"key": "param1", "type": "boolean"}])))
            .unwrap();
        assert!(params.validate(json!({"common": "42"})).is_empty());
        assert!(params.validate(json!({"param1": "false", "common": "0"})).is_empty());
        assert_eq!(
            messages(&params.validate(json!({"common": "200"}))),
            vec!["/common must be <= 100"]
        );
    }

    #[test]
    fn unknown_shortcut() {
        let err = SchemaCompiler::default()
            .compile_params(&entries(json!(["invalid_shortcut"])))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid shortcut 'invalid_shortcut' - please update common params/suffixes"
        );
    }

    #[test]
    fn duplicate_key_through_shortcut() {
        let compiler = SchemaCompiler::new(
            dict(json!({"common": {"key": "common"}})),
            CommonDictionary::new(),
        );
        let err = compiler
            .compile_params(&entries(json!(["common", {"key": "common"}])))
            .unwrap_err();
        assert_eq!(err, CompileError::DuplicateKey { key: "common".into() });
        assert_eq!(err.to_string(), "duplicate key 'common' found!");
    }

    #[test]
    fn duplicate_pattern() {
        let err = SchemaCompiler::default()
            .compile_params(&entries(json!([
                {"keyPattern": "^param[0-9]$"},
                {"keyPattern": "^param[0-9]$"}
            ])))
            .unwrap_err();
        assert_eq!(err.to_string(), "duplicate keyPattern '^param[0-9]$' found!");
    }

    #[test]
    fn key_claimed_by_pattern() {
        let err = SchemaCompiler::default()
            .compile_params(&entries(json!([
                {"keyPattern": "^param[0-9]$"},
                {"key": "param1"}
            ])))
            .unwrap_err();
        assert!(matches!(err, CompileError::KeyMatchesPattern { .. }));
    }

    #[test]
    fn identity_errors() {
        let compiler = SchemaCompiler::default();
        assert_eq!(
            compiler.compile_params(&entries(json!([{}]))).unwrap_err(),
            CompileError::MissingKey
        );
        assert!(matches!(
            compiler
                .compile_params(&entries(json!([{"key": "a", "keyPattern": "^a$"}])))
                .unwrap_err(),
            CompileError::AmbiguousIdentity { .. }
        ));
        assert!(matches!(
            compiler
                .compile_params(&entries(json!([{"keyPattern": "("}])))
                .unwrap_err(),
            CompileError::InvalidKeyPattern { .. }
        ));
    }

    #[test]
    fn lookaround_key_patterns_are_rejected_with_a_hint() {
        let err = SchemaCompiler::default()
            .compile_params(&entries(json!([{"keyPattern": "^(?!internal)[a-z]+$"}])))
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidKeyPattern { .. }));
        assert!(err.to_string().contains("lookaround"), "{err}");
    }

    #[test]
    fn numeric_enum_accepts_strings() {
        let params = SchemaCompiler::default()
            .compile_params(&entries(json!([{"key": "v", "enum": [1, 2, 3]}])))
            .unwrap();
        assert!(params.validate(json!({"v": "2"})).is_empty());
        assert_eq!(
            messages(&params.validate(json!({"v": "4"}))),
            vec!["/v must be equal to one of the allowed values"]
        );
    }

    #[test]
    fn integer_enum_still_compares_as_strings() {
        let params = SchemaCompiler::default()
            .compile_params(&entries(json!([{"key": "v", "type": "integer", "enum": [1, 2]}])))
            .unwrap();
        assert!(params.validate(json!({"v": "1"})).is_empty());
    }

    #[test]
    fn pattern_properties_validate_matching_keys() {
        let params = SchemaCompiler::default()
            .compile_params(&entries(json!([{"keyPattern": "^n[0-9]+$", "type": "integer"}])))
            .unwrap();
        assert!(params.validate(json!({"n1": "5", "n22": "7"})).is_empty());
        assert_eq!(
            messages(&params.validate(json!({"n1": "x"}))),
            vec!["/n1 must be integer"]
        );
        assert_eq!(params.field("n9").unwrap().value_type, "integer");
        assert!(params.field("m").is_none());
    }

    #[test]
    fn nested_object_schema() {
        let params = SchemaCompiler::default()
            .compile_params(&entries(json!([{
                "key": "payload",
                "type": "object",
                "encoding": "base64",
                "properties": {
                    "p1": {"type": "boolean"},
                    "deep": {"type": "object", "properties": {"n": {"type": "integer"}}}
                }
            }])))
            .unwrap();
        let field = params.field("payload").unwrap();
        assert!(field.is_object());
        assert_eq!(field.encoding, Some(Encoding::Base64));
        assert!(params.validate(json!({"payload": {"p1": false}})).is_empty());
        assert!(params
            .validate(json!({"payload": {"deep": {"n": "3"}}}))
            .is_empty());
        assert_eq!(
            messages(&params.validate(json!({"payload": {"p1": 10}}))),
            vec!["/payload/p1 must be boolean"]
        );
        assert!(!params.schema()["properties"]["payload"]
            .as_object()
            .unwrap()
            .contains_key("encoding"));
    }

    #[test]
    fn suffix_positions() {
        let compiler = SchemaCompiler::new(
            CommonDictionary::new(),
            dict(json!({"exception": {"key": "exception"}})),
        );
        let suffixes = compiler
            .compile_suffixes(&entries(json!(["exception", {"enum": [1, 2, 3]}])))
            .unwrap();
        assert_eq!(suffixes.positions(), 3);

        let toks = |s: &str| s.split('.').map(str::to_string).collect::<Vec<_>>();
        assert!(suffixes.validate(&toks("exception.anystring.1")).is_empty());
        assert!(suffixes.validate(&toks("exception.1")).is_empty());

        let wrong = toks("wrongkey.anystring.1");
        let v = suffixes.validate(&wrong);
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].format_suffix(&wrong),
            "Suffix 'wrongkey' at index 0 /0 must be equal to one of the allowed values"
        );

        let extra = toks("exception.anystring.1.extra");
        let v = suffixes.validate(&extra);
        assert_eq!(v.len(), 1);
        assert_eq!(
            v[0].format_suffix(&extra),
            "must NOT have additional properties. Found extra suffix 'extra' at index 3"
        );
    }

    #[test]
    fn empty_suffix_list_rejects_any_token() {
        let suffixes = SchemaCompiler::default().compile_suffixes(&[]).unwrap();
        assert!(suffixes.validate(&[]).is_empty());
        assert_eq!(suffixes.validate(&["x".to_string()]).len(), 1);
    }

    #[test]
    fn case_folding_applies_to_shortcuts_and_specs() {
        let compiler = SchemaCompiler::new(
            dict(json!({"AppVersion": {"key": "AppVersion"}})),
            CommonDictionary::new(),
        )
        .with_case_folding(Normalizer::LowerCase, Normalizer::LowerCase);
        let params = compiler
            .compile_params(&entries(json!(["AppVersion", {"key": "Mode", "enum": ["Fast"]}])))
            .unwrap();
        assert!(params.field("appversion").is_some());
        assert!(params.validate(json!({"mode": "fast"})).is_empty());
        assert_eq!(params.validate(json!({"Mode": "fast"})).len(), 1);
    }

    #[test]
    fn compile_pixel_appends_extra_params() {
        let def = PixelDefinition {
            parameters: entries(json!([{"key": "a"}])),
            suffixes: vec![],
        };
        let extra = entries(json!([{"keyPattern": "^[0-9]+$"}]));
        let pixel = SchemaCompiler::default().compile_pixel(&def, &extra).unwrap();
        assert!(pixel.params.validate(json!({"a": "x", "12345": ""})).is_empty());
    }
}
