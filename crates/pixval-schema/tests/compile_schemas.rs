//! Integration test: compile realistic definition files end to end.
//!
//! Mirrors how a pixel directory is used: the common dictionaries and a
//! definition file are deserialized from JSON, every prefix is compiled,
//! and live-shaped string values are validated against the result.

use pixval_core::{CommonDictionary, Normalizer, ParamEntry, PixelDefinitions};
use pixval_schema::{CompiledPixel, DefinitionChecker, SchemaCompiler, Violation};
use serde_json::{json, Value};

fn common_params() -> CommonDictionary {
    serde_json::from_value(json!({
        "appVersion": {"key": "appVersion", "description": "Client version", "type": "string"},
        "atb": {"key": "atb", "pattern": "^v[0-9]+-[0-9]$"},
        "cacheBuster": {"keyPattern": "^[0-9]+$"}
    }))
    .unwrap()
}

fn common_suffixes() -> CommonDictionary {
    serde_json::from_value(json!({
        "exception": {"key": "exception"},
        "formFactor": {"enum": ["phone", "tablet"], "description": "Device class"}
    }))
    .unwrap()
}

fn definitions() -> PixelDefinitions {
    serde_json::from_value(json!({
        "m.app.crash": {
            "description": "App crashed",
            "owners": ["someone"],
            "triggers": ["exception"],
            "parameters": [
                "appVersion",
                "atb",
                {"key": "count", "type": "integer", "minimum": 0, "maximum": 100},
                {"key": "fatal", "type": "boolean"}
            ],
            "suffixes": ["exception", "formFactor"]
        },
        "m.app.sync": {
            "parameters": [{
                "key": "state",
                "type": "object",
                "encoding": "base64",
                "properties": {
                    "enabled": {"type": "boolean"},
                    "devices": {"type": "integer", "minimum": 1}
                },
                "additionalProperties": false
            }]
        }
    }))
    .unwrap()
}

fn compiler() -> SchemaCompiler {
    SchemaCompiler::new(common_params(), common_suffixes())
}

fn params_messages(violations: Vec<Violation>) -> Vec<String> {
    violations.iter().map(Violation::format_param).collect()
}

fn compile(prefix: &str) -> CompiledPixel {
    let defs = definitions();
    let def = defs.0.get(prefix).unwrap();
    let ignore: Vec<ParamEntry> = vec!["cacheBuster".into()];
    compiler().compile_pixel(def, &ignore).unwrap()
}

#[test]
fn test_all_definitions_compile() {
    let mut checker = DefinitionChecker::new(compiler());
    let issues = checker.check(&definitions());
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn test_crash_params() {
    let pixel = compile("m.app.crash");
    let ok = json!({"appVersion": "7.1.0", "atb": "v400-1", "count": "12", "fatal": "true", "12345": ""});
    assert!(pixel.params.validate(ok).is_empty());

    let bad = json!({"atb": "x", "count": "101", "fatal": "maybe"});
    let mut messages = params_messages(pixel.params.validate(bad));
    messages.sort();
    assert_eq!(
        messages,
        vec![
            "/atb must match pattern \"^v[0-9]+-[0-9]$\"",
            "/count must be <= 100",
            "/fatal must be boolean",
        ]
    );
}

#[test]
fn test_crash_suffixes() {
    let pixel = compile("m.app.crash");
    let toks = |s: &str| s.split('.').map(str::to_string).collect::<Vec<_>>();

    assert!(pixel.suffixes.validate(&toks("exception.phone")).is_empty());
    assert!(pixel.suffixes.validate(&toks("exception")).is_empty());

    let tokens = toks("exception.watch");
    let rendered: Vec<String> = pixel
        .suffixes
        .validate(&tokens)
        .iter()
        .map(|v| v.format_suffix(&tokens))
        .collect();
    assert_eq!(
        rendered,
        vec!["Suffix 'watch' at index 1 /1 must be equal to one of the allowed values"]
    );
}

#[test]
fn test_nested_object_params() {
    let pixel = compile("m.app.sync");
    assert!(pixel
        .params
        .validate(json!({"state": {"enabled": "false", "devices": "2"}}))
        .is_empty());

    let messages = params_messages(pixel.params.validate(json!({"state": {"devices": 0, "extra": 1}})));
    assert!(messages.contains(&"/state/devices must be >= 1".to_string()));
    assert!(messages
        .contains(&"/state must NOT have additional properties. Found extra property 'extra'".to_string()));
}

#[test]
fn test_string_payload_for_object_param() {
    let pixel = compile("m.app.sync");
    let messages = params_messages(pixel.params.validate(json!({"state": "not json"})));
    assert_eq!(messages, vec!["/state must be object"]);
}

#[test]
fn test_case_folded_compilation() {
    let compiler = compiler().with_case_folding(Normalizer::LowerCase, Normalizer::LowerCase);
    let defs = definitions();
    let def = defs.0.get("m.app.crash").unwrap();
    let params = compiler.compile_params(&def.parameters).unwrap();
    let schema: &Value = params.schema();
    assert!(schema["properties"].get("appversion").is_some());
    assert!(schema["properties"].get("appVersion").is_none());
}
