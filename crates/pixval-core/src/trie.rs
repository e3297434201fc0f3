//! # Prefix Trie Tokenizer
//!
//! Turns flat `prefix -> definition` maps into a tree indexed by name
//! segment, so a live pixel name can be matched against the longest
//! defined prefix in one walk.
//!
//! A node may hold both children and its own definition: `m.app.crash` and
//! `m.app.crash.native` can both be defined. The node's own definition sits
//! in a reserved terminal slot, serialized under [`TERMINAL_KEY`] next to
//! the child segments:
//!
//! ```json
//! { "m": { "app": { "crash": {
//!     "__root_prefix__": { "parameters": ["appVersion"] },
//!     "native": { "__root_prefix__": {} }
//! } } } }
//! ```
//!
//! Tokenizing is incremental: several definition sources can be merged into
//! one trie. Defining the same absolute prefix twice is the only conflict.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::{PixelDefinition, PixelDefinitions};
use crate::error::CoreError;

/// Key of the terminal slot in the serialized trie.
pub const TERMINAL_KEY: &str = "__root_prefix__";

/// Tokenizer output: definitions arranged by name segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrie {
    #[serde(
        rename = "__root_prefix__",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    terminal: Option<PixelDefinition>,

    #[serde(flatten)]
    children: BTreeMap<String, RawTrie>,
}

impl RawTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokenize every source in order into a fresh trie.
    pub fn from_sources<'a, I>(sources: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = &'a PixelDefinitions>,
    {
        let mut trie = Self::new();
        for defs in sources {
            trie.tokenize(defs)?;
        }
        Ok(trie)
    }

    /// Merge one definition source into this trie.
    ///
    /// # Errors
    ///
    /// - [`CoreError::DuplicateDefinition`] if a prefix already has a
    ///   definition in this trie.
    /// - [`CoreError::ReservedSegment`] if a prefix contains
    ///   [`TERMINAL_KEY`] as a segment.
    pub fn tokenize(&mut self, defs: &PixelDefinitions) -> Result<(), CoreError> {
        for (prefix, definition) in defs.iter() {
            self.insert(prefix, definition.clone())?;
        }
        Ok(())
    }

    /// Place one definition at `prefix`.
    pub fn insert(&mut self, prefix: &str, definition: PixelDefinition) -> Result<(), CoreError> {
        let mut node = self;
        for segment in prefix.split('.') {
            if segment == TERMINAL_KEY {
                return Err(CoreError::ReservedSegment {
                    prefix: prefix.to_string(),
                    segment: segment.to_string(),
                });
            }
            node = node.children.entry(segment.to_string()).or_default();
        }

        if node.terminal.is_some() {
            return Err(CoreError::DuplicateDefinition {
                prefix: prefix.to_string(),
            });
        }
        node.terminal = Some(definition);
        Ok(())
    }

    /// This node's own definition, if the path to it is a defined prefix.
    pub fn terminal(&self) -> Option<&PixelDefinition> {
        self.terminal.as_ref()
    }

    pub fn child(&self, segment: &str) -> Option<&RawTrie> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &RawTrie)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Find the definition stored for exactly `prefix`.
    pub fn get(&self, prefix: &str) -> Option<&PixelDefinition> {
        prefix
            .split('.')
            .try_fold(self, |node, segment| node.child(segment))
            .and_then(RawTrie::terminal)
    }

    /// Number of defined prefixes below (and including) this node.
    pub fn len(&self) -> usize {
        usize::from(self.terminal.is_some())
            + self.children.values().map(RawTrie::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every defined prefix with its definition, depth first in segment order.
    pub fn definitions(&self) -> Vec<(String, &PixelDefinition)> {
        let mut out = Vec::new();
        self.collect_definitions(&mut Vec::new(), &mut out);
        out
    }

    fn collect_definitions<'a>(
        &'a self,
        path: &mut Vec<&'a str>,
        out: &mut Vec<(String, &'a PixelDefinition)>,
    ) {
        if let Some(def) = &self.terminal {
            out.push((path.join("."), def));
        }
        for (segment, child) in &self.children {
            path.push(segment);
            child.collect_definitions(path, out);
            path.pop();
        }
    }
}
