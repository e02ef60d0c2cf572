#![forbid(unsafe_code)]

//! Boundary to the parsing engine.
//!
//! The engine is an external collaborator. It is given the grammar source,
//! the input, a start rule and the grammar registry to resolve rule names
//! against, and it returns the trace of its match attempts. A match failure
//! is an expected outcome that still carries a trace; every other engine
//! error is fatal for the caller.
//!
//! The registry is an explicit value. The session keeps a pristine copy and
//! resets the working registry by assignment before every parse, so grammars
//! defined by one edit never leak into the next.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::trace::{MatchOutcome, TraceDocument, TraceNode};

/// Grammars the engine can resolve by name (`super` grammars, built-ins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarRegistry {
    grammars: BTreeMap<String, String>,
}

impl GrammarRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a grammar.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.grammars.insert(name.into(), source.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.grammars.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.grammars.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.grammars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grammars.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.grammars.keys().map(String::as_str)
    }
}

/// What the engine can report instead of a successful trace.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input did not match; the trace was recovered from the failed state.
    #[error("match failed")]
    MatchFailure { trace: Vec<TraceNode> },

    #[error("engine error: {0}")]
    Other(String),
}

/// A parsing engine that records its decision trace.
pub trait TraceEngine {
    fn match_contents(
        &self,
        registry: &mut GrammarRegistry,
        grammar_source: &str,
        input: &str,
        start_rule: &str,
    ) -> Result<Vec<TraceNode>, EngineError>;
}

/// Accept both expected outcomes uniformly; anything else is returned as is.
pub fn extract_trace(
    result: Result<Vec<TraceNode>, EngineError>,
) -> Result<(MatchOutcome, Vec<TraceNode>), EngineError> {
    match result {
        Ok(trace) => Ok((MatchOutcome::Success, trace)),
        Err(EngineError::MatchFailure { trace }) => Ok((MatchOutcome::Failure, trace)),
        Err(other) => Err(other),
    }
}

/// Replays a trace recorded earlier, ignoring grammar and input.
#[derive(Debug, Clone)]
pub struct RecordedEngine {
    document: TraceDocument,
}

impl RecordedEngine {
    #[must_use]
    pub fn new(document: TraceDocument) -> Self {
        Self { document }
    }
}

impl TraceEngine for RecordedEngine {
    fn match_contents(
        &self,
        _registry: &mut GrammarRegistry,
        _grammar_source: &str,
        _input: &str,
        _start_rule: &str,
    ) -> Result<Vec<TraceNode>, EngineError> {
        let trace = self.document.nodes().to_vec();
        match self.document.outcome() {
            MatchOutcome::Success => Ok(trace),
            MatchOutcome::Failure => Err(EngineError::MatchFailure { trace }),
        }
    }
}
