#![forbid(unsafe_code)]

//! Parse-trace model consumed from the matching engine.
//!
//! A trace is an ordered forest of [`TraceNode`]s. Each node records one match
//! attempt: whether it succeeded, the grammar expression it evaluated, and the
//! input it consumed. Children are ordered left-to-right in attempt order.
//!
//! Nodes are read-only input. The renderer never validates their shape: a
//! malformed trace is a precondition violation on the engine side.
//!
//! # Wire format
//!
//! Recorded traces use the engine's camelCase field names:
//!
//! ```json
//! {
//!   "succeeded": true,
//!   "displayString": "number",
//!   "expr": { "kind": "primitive", "sourceInterval": { "start": 7, "end": 13 } },
//!   "interval": { "contents": "12" },
//!   "children": []
//! }
//! ```
//!
//! A [`TraceDocument`] wraps a forest together with the match outcome it was
//! recovered from, or is a bare array of nodes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Expression descriptors
// ---------------------------------------------------------------------------

/// Closed set of expression kinds the renderer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprKind {
    /// `a | b`
    Alternation,
    /// `a b`
    Sequence,
    /// `a*`, `a+`, `a?`
    Repetition,
    /// Literal or terminal text (string, range, built-in character class).
    Primitive,
    /// Rule applications, lookaheads and everything else.
    Other,
}

/// Location of an expression in the grammar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInterval {
    pub start: usize,
    pub end: usize,
}

/// The grammar expression a trace node evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExprDescriptor {
    pub kind: ExprKind,
    /// `None` when the expression was synthesized rather than written by the user.
    #[serde(default)]
    pub source_interval: Option<SourceInterval>,
}

impl ExprDescriptor {
    #[must_use]
    pub const fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            source_interval: None,
        }
    }

    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(self.kind, ExprKind::Primitive)
    }
}

/// The input consumed by a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedInterval {
    #[serde(default)]
    pub contents: String,
}

// ---------------------------------------------------------------------------
// TraceNode
// ---------------------------------------------------------------------------

/// One match attempt in the engine's trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceNode {
    pub succeeded: bool,
    #[serde(default)]
    pub display_string: String,
    pub expr: ExprDescriptor,
    #[serde(default, alias = "matchedInterval")]
    pub interval: MatchedInterval,
    #[serde(default)]
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// A successful node with no source interval and no children.
    #[must_use]
    pub fn new(kind: ExprKind, label: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            display_string: label.into(),
            expr: ExprDescriptor::new(kind),
            interval: MatchedInterval {
                contents: contents.into(),
            },
            children: Vec::new(),
        }
    }

    /// Attach a source interval, marking the node as user-written.
    #[must_use]
    pub fn with_source(mut self, start: usize, end: usize) -> Self {
        self.expr.source_interval = Some(SourceInterval { start, end });
        self
    }

    /// Mark the attempt as failed.
    #[must_use]
    pub fn failed(mut self) -> Self {
        self.succeeded = false;
        self
    }

    /// Append a child attempt.
    #[must_use]
    pub fn child(mut self, node: TraceNode) -> Self {
        self.children.push(node);
        self
    }

    /// Replace the children.
    #[must_use]
    pub fn with_children(mut self, nodes: Vec<TraceNode>) -> Self {
        self.children = nodes;
        self
    }

    /// Matched text.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.interval.contents
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.display_string
    }

    #[must_use]
    pub fn kind(&self) -> ExprKind {
        self.expr.kind
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.expr.is_primitive()
    }

    /// Total number of nodes in this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Recorded traces
// ---------------------------------------------------------------------------

/// How the engine finished the match a trace was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Success,
    Failure,
}

/// A trace persisted to disk, with or without its outcome envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceDocument {
    Recorded {
        outcome: MatchOutcome,
        trace: Vec<TraceNode>,
    },
    Bare(Vec<TraceNode>),
}

impl TraceDocument {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Outcome of the recorded match; bare traces are assumed successful.
    #[must_use]
    pub fn outcome(&self) -> MatchOutcome {
        match self {
            Self::Recorded { outcome, .. } => *outcome,
            Self::Bare(_) => MatchOutcome::Success,
        }
    }

    #[must_use]
    pub fn nodes(&self) -> &[TraceNode] {
        match self {
            Self::Recorded { trace, .. } | Self::Bare(trace) => trace,
        }
    }

    #[must_use]
    pub fn into_nodes(self) -> Vec<TraceNode> {
        match self {
            Self::Recorded { trace, .. } | Self::Bare(trace) => trace,
        }
    }
}
