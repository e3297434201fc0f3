//! Integration test: the preprocess → validate-live workflow over a
//! temporary pixel directory, plus the check and validate-url handlers.

use std::fs;
use std::path::Path;

use pixval_cli::check::{run_check, CheckArgs};
use pixval_cli::files::{PIXEL_ERRORS, RESULTS_DIR, TOKENIZED_PIXELS, UNDOCUMENTED_PIXELS};
use pixval_cli::live::{run_validate_live, ValidateLiveArgs};
use pixval_cli::preprocess::{run_preprocess, PreprocessArgs};
use pixval_cli::url::{run_validate_url, ValidateUrlArgs};
use serde_json::{json, Value};

fn write(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

fn pixel_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        &root.join("params_dictionary.json"),
        &json!({"appVersion": {"key": "appVersion"}}),
    );
    write(
        &root.join("suffixes_dictionary.json"),
        &json!({"formFactor": {"enum": ["phone", "tablet"]}}),
    );
    write(
        &root.join("ignore_params.json"),
        &json!({"cacheBuster": {"keyPattern": "^[0-9]+$"}}),
    );
    write(
        &root.join("product.json"),
        &json!({"agents": ["app"], "target": {"key": "appVersion", "version": "2.0.0"}, "forceLowerCase": false}),
    );
    write(
        &root.join("pixels/app.json"),
        &json!({
            "m.app.crash": {
                "description": "crash",
                "parameters": ["appVersion", {"key": "fatal", "type": "boolean"}],
                "suffixes": ["formFactor"]
            }
        }),
    );
    fs::create_dir_all(root.join("pixels/sync")).unwrap();
    fs::write(
        root.join("pixels/sync/sync.json5"),
        "{\n    // owned by the sync team\n    'm.sync': {\n        parameters: ['appVersion',],\n    },\n}\n",
    )
    .unwrap();
    write(
        &root.join("pixels/TEMPLATES/example.json"),
        &json!({"m.app.crash": {}}),
    );
    write(&root.join("pixels/TEMPLATE.json"), &json!({"m.app.crash": {}}));
    dir
}

fn read(path: &Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn test_preprocess_writes_tokenized_trie() {
    let dir = pixel_dir();
    let code = run_preprocess(&PreprocessArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();
    assert_eq!(code, 0);

    let trie = read(&dir.path().join(RESULTS_DIR).join(TOKENIZED_PIXELS));
    assert_eq!(
        trie["m"]["app"]["crash"]["__root_prefix__"]["suffixes"],
        json!(["formFactor"])
    );
    assert_eq!(
        trie["m"]["sync"]["__root_prefix__"]["parameters"],
        json!(["appVersion"])
    );
}

#[test]
fn test_preprocess_rejects_duplicate_prefixes() {
    let dir = pixel_dir();
    write(&dir.path().join("pixels/dup.json"), &json!({"m.sync": {}}));
    let err = run_preprocess(&PreprocessArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate pixel definition found for m.sync"));
}

#[test]
fn test_validate_live_writes_results() {
    let dir = pixel_dir();
    run_preprocess(&PreprocessArgs {
        dir: dir.path().to_path_buf(),
    })
    .unwrap();

    let csv_path = dir.path().join("live.csv");
    fs::write(
        &csv_path,
        "pixel,params\n\
         m.app.crash.phone,\"['appVersion=2.1.0','fatal=true','123']\"\n\
         m.app.crash.watch,\"['appVersion=2.1.0','fatal=nope']\"\n\
         m.app.crash.watch,\"['appVersion=1.0.0']\"\n\
         m.unknown,\"[]\"\n",
    )
    .unwrap();

    let code = run_validate_live(&ValidateLiveArgs {
        dir: dir.path().to_path_buf(),
        csv: Some(csv_path),
    })
    .unwrap();
    assert_eq!(code, 0);

    let results = dir.path().join(RESULTS_DIR);
    assert_eq!(read(&results.join(UNDOCUMENTED_PIXELS)), json!(["m.unknown"]));
    assert_eq!(
        read(&results.join(PIXEL_ERRORS)),
        json!({
            "m.app.crash": {
                "/fatal must be boolean": ["appVersion=2.1.0&fatal=nope"],
                "Suffix 'watch' at index 0 /0 must be equal to one of the allowed values": [
                    "m.app.crash.watch"
                ]
            }
        })
    );
}

#[test]
fn test_validate_live_without_preprocess_fails() {
    let dir = pixel_dir();
    let csv_path = dir.path().join("live.csv");
    fs::write(&csv_path, "pixel,params\n").unwrap();
    assert!(run_validate_live(&ValidateLiveArgs {
        dir: dir.path().to_path_buf(),
        csv: Some(csv_path),
    })
    .is_err());
}

#[test]
fn test_validate_url_exit_codes() {
    let dir = pixel_dir();
    let run = |url: &str| {
        run_validate_url(&ValidateUrlArgs {
            dir: dir.path().to_path_buf(),
            url: url.to_string(),
        })
        .unwrap()
    };
    assert_eq!(run("/t/m_app_crash_phone?12345&appVersion=2.0.0&fatal=false"), 0);
    assert_eq!(run("/t/m_app_crash_phone?fatal=maybe"), 1);
    assert_eq!(run("/t/m_nothing"), 1);
}

#[test]
fn test_check_reports_broken_definitions() {
    let dir = pixel_dir();
    let args = CheckArgs {
        dir: dir.path().to_path_buf(),
        file: None,
    };
    assert_eq!(run_check(&args).unwrap(), 0);

    write(
        &dir.path().join("pixels/broken.json"),
        &json!({"m.broken": {"parameters": ["unknownShortcut"]}, "m.sync": {}}),
    );
    assert_eq!(run_check(&args).unwrap(), 1);

    let single = CheckArgs {
        dir: dir.path().to_path_buf(),
        file: Some("app.json".into()),
    };
    assert_eq!(run_check(&single).unwrap(), 0);
}
