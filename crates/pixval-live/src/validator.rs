//! # Live Pixel Validator
//!
//! Validates live events against the compiled definitions of one run.
//!
//! ## Per-event pipeline
//!
//! 1. **Match.** The pixel name is walked through the [`CompiledTrie`]. No
//!    definition at the stopping node makes the pixel undocumented.
//! 2. **Normalize.** The params fragments are joined into a query string
//!    and read as form-urlencoded pairs. Keys are folded to the run's case.
//!    Values of declared parameters are percent-decoded, base64-decoded
//!    when the field says so, folded, and parsed as JSON for `object`
//!    fields. Undeclared parameters keep their raw value; the strict params
//!    validator reports them.
//! 3. **Gate.** With a version gate configured, events reporting a valid
//!    version older than the target are skipped without validation.
//! 4. **Validate.** Params are checked with the query string as example;
//!    suffix tokens past the matched prefix are checked positionally with
//!    the pixel name as example.
//! 5. **Aggregate.** Messages land in the [`ErrorLedger`] under the matched
//!    prefix.
//!
//! Under `forceLowerCase` every recorded message is folded as well, so the
//! same problem reads the same whatever case the client sent.

use std::sync::Arc;

use pixval_core::{
    CommonDictionary, Encoding, Normalizer, ProductTarget, RawTrie, VersionGate,
};
use pixval_schema::{CompiledPixel, FieldSpec, SchemaCompiler};
use serde_json::{Map, Value};

use crate::error::{LiveBuildError, SinglePixelError};
use crate::ledger::{ErrorLedger, UndocumentedSet};
use crate::params::{decode_base64, parse_params_repr, parse_query, percent_decode, to_query};
use crate::request::PixelRequest;
use crate::stats::RunStats;
use crate::trie::CompiledTrie;

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// No defined prefix matched the pixel name.
    Undocumented,
    /// The event reported a version older than the target.
    Skipped { prefix: String },
    /// The event was validated; `errors` is empty when it passed.
    Validated { prefix: String, errors: Vec<String> },
}

impl EventOutcome {
    /// Whether the event was validated without errors.
    pub fn is_valid(&self) -> bool {
        matches!(self, EventOutcome::Validated { errors, .. } if errors.is_empty())
    }
}

struct Finding {
    message: String,
    example: String,
}

enum Evaluation {
    Undocumented,
    Skipped { prefix: String },
    Checked { prefix: String, findings: Vec<Finding> },
}

/// Matches, normalizes and validates live events, aggregating the errors.
#[derive(Debug)]
pub struct LivePixelValidator {
    trie: Arc<CompiledTrie>,
    normalizer: Normalizer,
    version_gate: Option<VersionGate>,
    ledger: ErrorLedger,
    undocumented: UndocumentedSet,
    stats: RunStats,
}

impl LivePixelValidator {
    /// Compile `raw` for the given product.
    ///
    /// Parameters are compared in the product's case; suffixes are always
    /// lowercase. Every entry of `ignore` is accepted on every pixel.
    ///
    /// # Errors
    ///
    /// - [`LiveBuildError::Core`] for an unparseable target version.
    /// - [`LiveBuildError::Compile`] for the first prefix that fails to
    ///   compile.
    pub fn new(
        raw: &RawTrie,
        product: &ProductTarget,
        ignore: &CommonDictionary,
        compiler: SchemaCompiler,
    ) -> Result<Self, LiveBuildError> {
        let normalizer = product.normalizer();
        let version_gate = product.version_gate()?;
        let compiler = compiler.with_case_folding(normalizer, Normalizer::LowerCase);
        let trie = CompiledTrie::compile(raw, &compiler, &ignore.entries())?;
        tracing::debug!(
            prefixes = trie.len(),
            force_lower_case = normalizer.is_folding(),
            gated = version_gate.is_some(),
            "live validator ready"
        );

        Ok(Self {
            trie: Arc::new(trie),
            normalizer,
            version_gate,
            ledger: ErrorLedger::new(),
            undocumented: UndocumentedSet::new(),
            stats: RunStats::default(),
        })
    }

    /// A validator over the same compiled trie with empty results, for
    /// processing another part of the event stream.
    pub fn shard(&self) -> Self {
        Self {
            trie: Arc::clone(&self.trie),
            normalizer: self.normalizer,
            version_gate: self.version_gate.clone(),
            ledger: ErrorLedger::new(),
            undocumented: UndocumentedSet::new(),
            stats: RunStats::default(),
        }
    }

    /// Validate one exported event. `params_repr` is the literal fragment
    /// list, e.g. `['a=1','b=2']`. A list that cannot be read is recorded
    /// as an error of the matched prefix.
    pub fn validate_pixel(&mut self, pixel: &str, params_repr: &str) -> EventOutcome {
        let evaluation = match self.trie.lookup(pixel).schemas {
            None => Evaluation::Undocumented,
            Some(_) => match parse_params_repr(params_repr) {
                Ok(fragments) => self.evaluate(pixel, &fragments),
                Err(err) => Evaluation::Checked {
                    prefix: self.trie.lookup(pixel).prefix.to_string(),
                    findings: vec![Finding {
                        message: self.normalizer.canonicalize(&err.to_string()).into_owned(),
                        example: params_repr.to_string(),
                    }],
                },
            },
        };
        self.record(pixel, evaluation)
    }

    /// Validate one event whose params are already split into fragments.
    pub fn validate_fragments(&mut self, pixel: &str, fragments: &[String]) -> EventOutcome {
        let evaluation = self.evaluate(pixel, fragments);
        self.record(pixel, evaluation)
    }

    /// Judge a single request without touching the run's results.
    pub fn validate_request(&self, request: &PixelRequest) -> Result<(), SinglePixelError> {
        match self.evaluate(&request.pixel, &request.fragments) {
            Evaluation::Undocumented => Err(SinglePixelError::Undocumented {
                pixel: request.pixel.clone(),
            }),
            Evaluation::Skipped { .. } => Ok(()),
            Evaluation::Checked { findings, .. } if findings.is_empty() => Ok(()),
            Evaluation::Checked { prefix, findings } => Err(SinglePixelError::Invalid {
                pixel: request.pixel.clone(),
                prefix,
                errors: findings.into_iter().map(|f| f.message).collect(),
            }),
        }
    }

    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }

    pub fn undocumented(&self) -> &UndocumentedSet {
        &self.undocumented
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn normalizer(&self) -> Normalizer {
        self.normalizer
    }

    pub fn version_gate(&self) -> Option<&VersionGate> {
        self.version_gate.as_ref()
    }

    /// Number of compiled prefixes.
    pub fn compiled_prefixes(&self) -> usize {
        self.trie.len()
    }

    /// Hand over the run's results.
    pub fn into_results(self) -> (ErrorLedger, UndocumentedSet, RunStats) {
        (self.ledger, self.undocumented, self.stats)
    }

    fn evaluate(&self, pixel: &str, fragments: &[String]) -> Evaluation {
        let found = self.trie.lookup(pixel);
        let Some(schemas) = found.schemas else {
            return Evaluation::Undocumented;
        };
        let prefix = found.prefix.to_string();

        let query = to_query(fragments);
        let params = self.normalize_params(&query, schemas);

        if self.is_stale(&params) {
            return Evaluation::Skipped { prefix };
        }

        let mut findings: Vec<Finding> = schemas
            .params
            .validate(Value::Object(params))
            .iter()
            .map(|v| Finding {
                message: self.normalizer.canonicalize(&v.format_param()).into_owned(),
                example: query.clone(),
            })
            .collect();

        if let Some(rest) = pixel[prefix.len()..].strip_prefix('.') {
            let tokens: Vec<String> = rest
                .split('.')
                .map(|t| self.normalizer.canonicalize(t).into_owned())
                .collect();
            findings.extend(schemas.suffixes.validate(&tokens).iter().map(|v| Finding {
                message: self
                    .normalizer
                    .canonicalize(&v.format_suffix(&tokens))
                    .into_owned(),
                example: pixel.to_string(),
            }));
        }

        Evaluation::Checked { prefix, findings }
    }

    fn normalize_params(&self, query: &str, schemas: &CompiledPixel) -> Map<String, Value> {
        parse_query(query)
            .into_iter()
            .map(|(key, raw)| {
                let key = self.normalizer.canonicalize(&key).into_owned();
                let value = match schemas.params.field(&key) {
                    Some(field) => self.decode_value(&raw, field),
                    None => Value::String(raw),
                };
                (key, value)
            })
            .collect()
    }

    fn decode_value(&self, raw: &str, field: &FieldSpec) -> Value {
        let mut value = percent_decode(raw).into_owned();
        if field.encoding == Some(Encoding::Base64) {
            if let Some(decoded) = decode_base64(&value) {
                value = decoded;
            }
        }
        let value = self.normalizer.canonicalize(&value).into_owned();

        if field.is_object() {
            match serde_json::from_str(&value) {
                Ok(parsed) => return parsed,
                Err(err) => {
                    tracing::warn!(value = %value, error = %err, "failed to parse object param value");
                }
            }
        }
        Value::String(value)
    }

    fn is_stale(&self, params: &Map<String, Value>) -> bool {
        let Some(gate) = &self.version_gate else {
            return false;
        };
        match params.get(gate.key()) {
            Some(Value::String(version)) if !version.is_empty() => gate.is_stale(version),
            _ => false,
        }
    }

    fn record(&mut self, pixel: &str, evaluation: Evaluation) -> EventOutcome {
        self.stats.processed += 1;
        match evaluation {
            Evaluation::Undocumented => {
                self.stats.undocumented += 1;
                self.undocumented.insert(pixel);
                EventOutcome::Undocumented
            }
            Evaluation::Skipped { prefix } => {
                self.stats.version_skipped += 1;
                EventOutcome::Skipped { prefix }
            }
            Evaluation::Checked { prefix, findings } => {
                if !findings.is_empty() {
                    self.stats.failing += 1;
                }
                let errors = findings
                    .into_iter()
                    .map(|f| {
                        self.ledger.record(prefix.as_str(), f.message.as_str(), f.example);
                        f.message
                    })
                    .collect();
                EventOutcome::Validated { prefix, errors }
            }
        }
    }
}
