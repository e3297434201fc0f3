//! # Compiled Prefix Trie
//!
//! The [`RawTrie`] with every terminal definition replaced by its compiled
//! validators. Built once per run, then shared read-only: it is `Send +
//! Sync` and can sit behind an `Arc` while several validators shard the
//! event stream.

use std::collections::HashMap;

use pixval_core::{ParamEntry, RawTrie};
use pixval_schema::{CompiledPixel, SchemaCompiler};

use crate::error::LiveBuildError;

/// Segment-indexed tree of compiled pixel validators.
#[derive(Debug, Default)]
pub struct CompiledTrie {
    terminal: Option<CompiledPixel>,
    children: HashMap<String, CompiledTrie>,
}

/// Result of a longest-prefix walk.
#[derive(Debug, Clone, Copy)]
pub struct PrefixMatch<'a> {
    /// Dot-joined segments consumed by the walk.
    pub prefix: &'a str,
    /// Validators at the node where the walk stopped, if it is defined.
    pub schemas: Option<&'a CompiledPixel>,
}

impl CompiledTrie {
    /// Compile every terminal of `raw`, appending `extra_params` to each
    /// definition's parameters.
    ///
    /// # Errors
    ///
    /// The first prefix that fails to compile, by name.
    pub fn compile(
        raw: &RawTrie,
        compiler: &SchemaCompiler,
        extra_params: &[ParamEntry],
    ) -> Result<Self, LiveBuildError> {
        Self::compile_node(raw, compiler, extra_params, &mut Vec::new())
    }

    fn compile_node<'a>(
        node: &'a RawTrie,
        compiler: &SchemaCompiler,
        extra_params: &[ParamEntry],
        path: &mut Vec<&'a str>,
    ) -> Result<Self, LiveBuildError> {
        let terminal = match node.terminal() {
            Some(definition) => {
                let compiled = compiler
                    .compile_pixel(definition, extra_params)
                    .map_err(|source| LiveBuildError::Compile {
                        prefix: path.join("."),
                        source,
                    })?;
                tracing::debug!(prefix = %path.join("."), "compiled pixel definition");
                Some(compiled)
            }
            None => None,
        };

        let mut children = HashMap::new();
        for (segment, child) in node.children() {
            path.push(segment);
            let compiled = Self::compile_node(child, compiler, extra_params, path);
            path.pop();
            children.insert(segment.to_string(), compiled?);
        }

        Ok(Self { terminal, children })
    }

    /// Walk `pixel` segment by segment as far as the trie goes.
    ///
    /// The walk is greedy: it stops at the first segment with no child and
    /// does not back off to a shorter defined prefix.
    pub fn lookup<'a>(&'a self, pixel: &'a str) -> PrefixMatch<'a> {
        let mut node = self;
        let mut consumed = 0usize;
        for (depth, segment) in pixel.split('.').enumerate() {
            let Some(child) = node.children.get(segment) else {
                break;
            };
            node = child;
            consumed += segment.len() + usize::from(depth > 0);
        }
        PrefixMatch {
            prefix: &pixel[..consumed],
            schemas: node.terminal.as_ref(),
        }
    }

    /// Number of compiled prefixes.
    pub fn len(&self) -> usize {
        usize::from(self.terminal.is_some())
            + self.children.values().map(CompiledTrie::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixval_core::{PixelDefinition, PixelDefinitions};

    fn trie(prefixes: &[&str]) -> CompiledTrie {
        let defs: PixelDefinitions = prefixes
            .iter()
            .map(|p| (p.to_string(), PixelDefinition::default()))
            .collect();
        let raw = RawTrie::from_sources([&defs]).unwrap();
        CompiledTrie::compile(&raw, &SchemaCompiler::default(), &[]).unwrap()
    }

    #[test]
    fn longest_prefix() {
        let trie = trie(&["a", "a.b"]);
        assert_eq!(trie.len(), 2);

        let m = trie.lookup("a.b.c");
        assert_eq!(m.prefix, "a.b");
        assert!(m.schemas.is_some());

        let m = trie.lookup("a.x");
        assert_eq!(m.prefix, "a");
        assert!(m.schemas.is_some());

        let m = trie.lookup("z");
        assert_eq!(m.prefix, "");
        assert!(m.schemas.is_none());
    }

    #[test]
    fn interior_node_without_definition() {
        let trie = trie(&["a.b.c"]);
        let m = trie.lookup("a.b.x");
        assert_eq!(m.prefix, "a.b");
        assert!(m.schemas.is_none());
    }

    #[test]
    fn compile_error_names_prefix() {
        let mut defs = PixelDefinitions::new();
        defs.insert(
            "m.bad",
            PixelDefinition {
                parameters: vec!["nope".into()],
                suffixes: vec![],
            },
        );
        let raw = RawTrie::from_sources([&defs]).unwrap();
        let err = CompiledTrie::compile(&raw, &SchemaCompiler::default(), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "m.bad --> invalid shortcut 'nope' - please update common params/suffixes"
        );
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledTrie>();
    }
}
