//! # Product Target & Version Gate
//!
//! A product definition names the agents a run covers, the parameter that
//! carries the client version, the minimum version the definitions
//! describe, and whether the product's pixels are case-insensitive.
//!
//! Clients older than the target predate the current definitions, so their
//! events are skipped instead of validated. Version strings from the wild
//! are parsed leniently: a leading `v`, missing minor or patch components
//! (`"7"`, `"7.1"`) and a fourth build component (`"7.1.0.3"`) are
//! accepted.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use semver::Prerelease;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::normalize::Normalizer;

/// Parameter key and minimum version for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTarget {
    /// Parameter carrying the client version (e.g. `appVersion`). Empty
    /// disables version gating.
    #[serde(default)]
    pub key: String,
    /// Oldest client version the definitions apply to.
    #[serde(default)]
    pub version: String,
}

/// Process-wide configuration for one validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTarget {
    #[serde(default)]
    pub agents: BTreeSet<String>,
    #[serde(default)]
    pub target: VersionTarget,
    #[serde(default)]
    pub force_lower_case: bool,
}

impl ProductTarget {
    /// The case policy this product asks for.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::from_force_lower_case(self.force_lower_case)
    }

    /// Build the version gate, or `None` when no version key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTargetVersion`] when a key is configured
    /// but the target version does not parse.
    pub fn version_gate(&self) -> Result<Option<VersionGate>, CoreError> {
        let normalizer = self.normalizer();
        let key = normalizer.canonicalize(&self.target.key).into_owned();
        if key.is_empty() {
            return Ok(None);
        }
        let version = normalizer.canonicalize(&self.target.version);
        let minimum =
            ClientVersion::parse(&version).ok_or_else(|| CoreError::InvalidTargetVersion {
                key: self.target.key.clone(),
                version: self.target.version.clone(),
            })?;
        Ok(Some(VersionGate { key, minimum }))
    }
}

/// A leniently parsed client version.
///
/// Up to four numeric components (`7`, `7.1`, `7.1.0`, `7.1.0.3`); missing
/// ones compare as zero. A pre-release tag is allowed after the third or
/// fourth component and sorts below the bare release. Build metadata is
/// accepted and ignored.
#[derive(Debug, Clone)]
pub struct ClientVersion {
    core: [u64; 4],
    len: usize,
    pre: Prerelease,
}

impl ClientVersion {
    /// Parse `raw`, returning `None` when it is not a version. The string
    /// must start with `v` or a digit.
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.starts_with(|c: char| c == 'v' || c.is_ascii_digit()) {
            return None;
        }
        let trimmed = raw.trim_start_matches(['v', '^', '~', '<', '>', '=']);
        let (rest, _build) = trimmed.split_once('+').unwrap_or((trimmed, ""));
        let (numbers, pre) = match rest.split_once('-') {
            Some((numbers, pre)) => (numbers, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = numbers.split('.').collect();
        if parts.len() > 4 {
            return None;
        }
        let mut core = [0u64; 4];
        for (slot, part) in core.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            *slot = part.parse().ok()?;
        }

        let pre = match pre {
            Some(_) if parts.len() < 3 => return None,
            Some(tag) => Prerelease::new(tag).ok().filter(|p| !p.is_empty())?,
            None => Prerelease::EMPTY,
        };
        Some(Self {
            core,
            len: parts.len(),
            pre,
        })
    }

    /// Numeric components, zero-padded to four.
    pub fn components(&self) -> [u64; 4] {
        self.core
    }

    pub fn prerelease(&self) -> &Prerelease {
        &self.pre
    }
}

impl Ord for ClientVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.core.cmp(&other.core).then_with(|| {
            match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            }
        })
    }
}

impl PartialEq for ClientVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClientVersion {}

impl PartialOrd for ClientVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch, revision] = self.core;
        write!(f, "{major}.{minor}.{patch}")?;
        if self.len == 4 {
            write!(f, ".{revision}")?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

/// Skips events from clients older than the target version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    key: String,
    minimum: ClientVersion,
}

impl VersionGate {
    /// The (canonicalized) parameter key holding the client version.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn minimum(&self) -> &ClientVersion {
        &self.minimum
    }

    /// True when `value` is a valid version strictly below the target.
    /// Unparseable values are never stale; they get validated normally.
    pub fn is_stale(&self, value: &str) -> bool {
        ClientVersion::parse(value)
            .is_some_and(|v| v.cmp(&self.minimum) == Ordering::Less)
    }
}
