//! # Definition Compile Check
//!
//! Compiles every definition of one or more sources with a
//! collect-and-continue policy. Each problem becomes a [`DefinitionIssue`]
//! naming the prefix, so an author sees every broken definition in one
//! pass instead of the first one only.
//!
//! Prefixes are remembered across calls: checking several definition files
//! with the same checker reports a prefix defined in two files.

use std::collections::HashSet;
use std::fmt;

use pixval_core::PixelDefinitions;

use crate::compile::SchemaCompiler;
use crate::error::CompileError;

/// Why a definition was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The prefix was already defined by an earlier source.
    Duplicate,
    /// The definition's suffixes or parameters failed to compile.
    Compile(CompileError),
}

/// One rejected definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionIssue {
    pub prefix: String,
    pub kind: IssueKind,
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::Duplicate => write!(
                f,
                "{} --> Conflicting/duplicated definitions found!",
                self.prefix
            ),
            IssueKind::Compile(err) => write!(f, "{} --> {}", self.prefix, err),
        }
    }
}

/// Collects compile problems across definition sources.
#[derive(Debug)]
pub struct DefinitionChecker {
    compiler: SchemaCompiler,
    defined: HashSet<String>,
}

impl DefinitionChecker {
    pub fn new(compiler: SchemaCompiler) -> Self {
        Self {
            compiler,
            defined: HashSet::new(),
        }
    }

    /// Number of distinct prefixes seen so far.
    pub fn defined_count(&self) -> usize {
        self.defined.len()
    }

    /// Check one definition source. Suffixes are compiled before
    /// parameters; only the first error of a definition is reported.
    pub fn check(&mut self, definitions: &PixelDefinitions) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();
        for (prefix, definition) in definitions.iter() {
            if !self.defined.insert(prefix.to_string()) {
                issues.push(DefinitionIssue {
                    prefix: prefix.to_string(),
                    kind: IssueKind::Duplicate,
                });
                continue;
            }

            let compiled = self
                .compiler
                .compile_suffixes(&definition.suffixes)
                .and_then(|_| self.compiler.compile_params(&definition.parameters));
            if let Err(err) = compiled {
                tracing::debug!(prefix, error = %err, "definition failed to compile");
                issues.push(DefinitionIssue {
                    prefix: prefix.to_string(),
                    kind: IssueKind::Compile(err),
                });
            }
        }
        issues
    }
}
