//! # Error Ledger
//!
//! Aggregated results of a validation run. Identical messages for the same
//! prefix collapse into one entry holding the set of distinct examples
//! that produced it, so millions of events reduce to a reviewable report.
//!
//! Both types serialize deterministically: maps and sets are ordered, sets
//! become sorted JSON arrays.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// prefix → message → examples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorLedger(BTreeMap<String, BTreeMap<String, BTreeSet<String>>>);

impl ErrorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `message` under `prefix`.
    pub fn record(
        &mut self,
        prefix: impl Into<String>,
        message: impl Into<String>,
        example: impl Into<String>,
    ) {
        self.0
            .entry(prefix.into())
            .or_default()
            .entry(message.into())
            .or_default()
            .insert(example.into());
    }

    /// Fold another ledger into this one.
    pub fn merge(&mut self, other: ErrorLedger) {
        for (prefix, messages) in other.0 {
            let mine = self.0.entry(prefix).or_default();
            for (message, examples) in messages {
                mine.entry(message).or_default().extend(examples);
            }
        }
    }

    /// Messages recorded for `prefix`.
    pub fn messages(&self, prefix: &str) -> Option<&BTreeMap<String, BTreeSet<String>>> {
        self.0.get(prefix)
    }

    pub fn examples(&self, prefix: &str, message: &str) -> Option<&BTreeSet<String>> {
        self.0.get(prefix).and_then(|m| m.get(message))
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of distinct (prefix, message) pairs.
    pub fn error_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Live pixel names that matched no defined prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndocumentedSet(BTreeSet<String>);

impl UndocumentedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the name was not yet present.
    pub fn insert(&mut self, pixel: impl Into<String>) -> bool {
        self.0.insert(pixel.into())
    }

    pub fn contains(&self, pixel: &str) -> bool {
        self.0.contains(pixel)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Extend<String> for UndocumentedSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for UndocumentedSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
