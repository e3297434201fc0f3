//! # Pixel Directory
//!
//! On-disk layout of one product's definitions:
//!
//! ```text
//! <dir>/
//!   pixels/                       definition files, any depth
//!   params_dictionary.json        common parameters
//!   suffixes_dictionary.json      common suffixes
//!   ignore_params.json            parameters accepted on every pixel
//!   product.json                  product target
//!   pixel_processing_results/     created on demand
//!     tokenized_pixels.json
//!     pixel_errors.json
//!     undocumented_pixels.json
//! ```
//!
//! Input files may use a `.json` or `.json5` extension; whichever exists is
//! read. Every input is parsed as JSON5, so comments, single quotes,
//! unquoted keys and trailing commas are accepted.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pixval_core::{CommonDictionary, PixelDefinitions, ProductTarget, RawTrie};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const PIXELS_DIR: &str = "pixels";
pub const RESULTS_DIR: &str = "pixel_processing_results";
pub const PARAMS_DICTIONARY: &str = "params_dictionary.json";
pub const SUFFIXES_DICTIONARY: &str = "suffixes_dictionary.json";
pub const IGNORE_PARAMS: &str = "ignore_params.json";
pub const PRODUCT: &str = "product.json";
pub const TOKENIZED_PIXELS: &str = "tokenized_pixels.json";
pub const PIXEL_ERRORS: &str = "pixel_errors.json";
pub const UNDOCUMENTED_PIXELS: &str = "undocumented_pixels.json";
pub const DEFAULT_LIVE_CSV: &str = "live_pixels.csv";

const TEMPLATE_PREFIX: &str = "TEMPLATE";

/// A product's pixel directory.
#[derive(Debug, Clone)]
pub struct PixelDir {
    root: PathBuf,
}

impl PixelDir {
    /// Open an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("Directory path {} does not exist!", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pixels_dir(&self) -> PathBuf {
        self.root.join(PIXELS_DIR)
    }

    /// The results directory, created if missing.
    pub fn results_dir(&self) -> Result<PathBuf> {
        let dir = self.root.join(RESULTS_DIR);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(dir)
    }

    pub fn common_params(&self) -> Result<CommonDictionary> {
        read_json(&self.root.join(PARAMS_DICTIONARY))
    }

    pub fn common_suffixes(&self) -> Result<CommonDictionary> {
        read_json(&self.root.join(SUFFIXES_DICTIONARY))
    }

    pub fn ignore_params(&self) -> Result<CommonDictionary> {
        read_json(&self.root.join(IGNORE_PARAMS))
    }

    pub fn product(&self) -> Result<ProductTarget> {
        read_json(&self.root.join(PRODUCT))
    }

    pub fn tokenized_pixels(&self) -> Result<RawTrie> {
        read_json(&self.root.join(RESULTS_DIR).join(TOKENIZED_PIXELS))
    }

    /// Every definition file under `pixels/`, sorted. Paths relative to
    /// `pixels/` that start with `TEMPLATE` are skipped, which covers both
    /// top-level template files and whole `TEMPLATE*/` directories.
    pub fn definition_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.pixels_dir();
        let mut files = Vec::new();
        collect_files(&dir, &mut files)
            .with_context(|| format!("failed to list {}", dir.display()))?;
        files.retain(|path| {
            path.strip_prefix(&dir)
                .ok()
                .and_then(|rel| rel.to_str())
                .is_some_and(|rel| !rel.starts_with(TEMPLATE_PREFIX))
        });
        files.sort();
        Ok(files)
    }

    /// Write `value` as 4-space indented JSON into the results directory.
    pub fn write_result<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.results_dir()?.join(name);
        write_json(&path, value)?;
        Ok(path)
    }
}

/// Parse a definition file.
pub fn read_definitions(path: &Path) -> Result<PixelDefinitions> {
    read_json(path)
}

fn collect_files(dir: &Path, acc: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, acc)?;
        } else {
            acc.push(path);
        }
    }
    Ok(())
}

/// `path`, or the same name with the other JSON extension if only that
/// one exists.
fn resolve_extension(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    let alternative = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => path.with_extension("json5"),
        Some("json5") => path.with_extension("json"),
        other => bail!("Unsupported file extension: {}", other.unwrap_or_default()),
    };
    if alternative.exists() {
        Ok(alternative)
    } else {
        bail!(
            "Neither {} nor {} exist.",
            path.display(),
            alternative.display()
        )
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let resolved = resolve_extension(path)?;
    let content = fs::read_to_string(&resolved)
        .with_context(|| format!("failed to read {}", resolved.display()))?;
    json5::from_str(&content).with_context(|| format!("failed to parse {}", resolved.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value
        .serialize(&mut ser)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

/// Format a count with `,` thousands separators.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_requires_directory() {
        assert!(PixelDir::open("/tmp/pixval-test-nonexistent-dir-xyz").is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(PixelDir::open(dir.path()).is_ok());
    }

    #[test]
    fn json5_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("product.json5"), br#"{"forceLowerCase": true}"#).unwrap();
        let pixel_dir = PixelDir::open(dir.path()).unwrap();
        assert!(pixel_dir.product().unwrap().force_lower_case);

        let err = pixel_dir.common_params().unwrap_err();
        assert!(err.to_string().starts_with("Neither"), "{err}");
    }

    #[test]
    fn definition_files_skip_templates_and_recurse() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join(PIXELS_DIR).join("sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(PIXELS_DIR).join("b.json"), b"{}").unwrap();
        fs::write(dir.path().join(PIXELS_DIR).join("TEMPLATE.json"), b"{}").unwrap();
        fs::write(nested.join("a.json"), b"{}").unwrap();

        let files = PixelDir::open(dir.path()).unwrap().definition_files().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.contains("TEMPLATE")));
    }

    #[test]
    fn template_directories_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pixels = dir.path().join(PIXELS_DIR);
        fs::create_dir_all(pixels.join("TEMPLATES")).unwrap();
        fs::write(pixels.join("TEMPLATES").join("crash.json"), b"{}").unwrap();
        fs::write(pixels.join("real.json"), b"{}").unwrap();

        let files = PixelDir::open(dir.path()).unwrap().definition_files().unwrap();
        assert_eq!(files, vec![pixels.join("real.json")]);
    }

    #[test]
    fn definitions_accept_json5_syntax() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("defs.json5");
        fs::write(
            &path,
            "{\n  // crash pixel\n  'm.a': {\n    parameters: ['appVersion', {key: 'n', type: 'integer'},],\n  },\n}\n",
        )
        .unwrap();

        let defs = read_definitions(&path).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs.0["m.a"].parameters.len(), 2);
    }

    #[test]
    fn results_are_indented_with_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let pixel_dir = PixelDir::open(dir.path()).unwrap();
        let path = pixel_dir
            .write_result(PIXEL_ERRORS, &serde_json::json!({"a": ["b"]}))
            .unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "{\n    \"a\": [\n        \"b\"\n    ]\n}");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
