#![forbid(unsafe_code)]

//! Per-node visibility policy.
//!
//! [`classify`] decides whether a trace node gets a box of its own. It is a
//! pure function of the node's success flag, label, expression kind, source
//! interval and matched-text emptiness.
//!
//! # Rules (first match wins)
//!
//! 1. Failed attempts are hidden.
//! 2. Blackhole labels (ending in `_`, or exactly `space` / `empty`) are hidden.
//!    These are lexical rules the grammar author did not write.
//! 3. Alternations and sequences are structural and always hidden.
//! 4. Repetitions are shown only when they consumed input.
//! 5. Anything else is hidden unless it has a source interval; primitives
//!    become leaves, the rest become expandable containers.
//!
//! [`is_blackhole`] is exported on its own because it also gates traversal:
//! a blackhole hides its whole subtree, while the other rules only skip the
//! node's own box.
//!
//! Rule 4 uses "matched text is non-empty", not "has a visible child". A
//! repetition that matched nothing but whose children include zero-width
//! visible nodes stays hidden.

use crate::trace::{ExprKind, TraceNode};

/// Labels that name internal whitespace rules.
const BLACKHOLE_LABELS: [&str; 2] = ["space", "empty"];

/// Outcome of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Hidden(HiddenReason),
    /// Non-expandable label (primitive expression).
    VisibleLeaf,
    /// Expandable box whose children are shown beneath it.
    VisibleContainer,
}

impl Visibility {
    #[must_use]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Hidden(_))
    }
}

/// Why a node was hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HiddenReason {
    Failed,
    Blackhole,
    Structural,
    EmptyRepetition,
    /// Not written by the user (no source interval).
    Synthetic,
}

/// True when the node's label marks it as internal lexical machinery.
#[must_use]
pub fn is_blackhole(node: &TraceNode) -> bool {
    let label = node.label();
    !label.is_empty() && (label.ends_with('_') || BLACKHOLE_LABELS.contains(&label))
}

/// Classify a single node. See the module docs for the rules.
#[must_use]
pub fn classify(node: &TraceNode) -> Visibility {
    if !node.succeeded {
        return Visibility::Hidden(HiddenReason::Failed);
    }
    if is_blackhole(node) {
        return Visibility::Hidden(HiddenReason::Blackhole);
    }
    match node.kind() {
        ExprKind::Alternation | ExprKind::Sequence => Visibility::Hidden(HiddenReason::Structural),
        ExprKind::Repetition => {
            if node.contents().is_empty() {
                Visibility::Hidden(HiddenReason::EmptyRepetition)
            } else {
                Visibility::VisibleContainer
            }
        }
        ExprKind::Primitive | ExprKind::Other => {
            if node.expr.source_interval.is_none() {
                Visibility::Hidden(HiddenReason::Synthetic)
            } else if node.is_primitive() {
                Visibility::VisibleLeaf
            } else {
                Visibility::VisibleContainer
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(kind: ExprKind, label: &str, contents: &str) -> TraceNode {
        TraceNode::new(kind, label, contents).with_source(0, 1)
    }

    #[test]
    fn blackhole_labels() {
        for label in ["letter_", "_", "space", "empty"] {
            let node = user(ExprKind::Other, label, "x");
            assert!(is_blackhole(&node), "{label}");
            assert_eq!(
                classify(&node),
                Visibility::Hidden(HiddenReason::Blackhole)
            );
        }
        for label in ["", "spaces", "letter", "_letter", "Empty"] {
            assert!(!is_blackhole(&user(ExprKind::Other, label, "x")), "{label}");
        }
    }

    #[test]
    fn failed_wins_over_everything() {
        let node = user(ExprKind::Primitive, "\"+\"", "+").failed();
        assert_eq!(classify(&node), Visibility::Hidden(HiddenReason::Failed));
    }

    #[test]
    fn structural_kinds_hidden_even_with_source() {
        for kind in [ExprKind::Alternation, ExprKind::Sequence] {
            assert_eq!(
                classify(&user(kind, "", "abc")),
                Visibility::Hidden(HiddenReason::Structural)
            );
        }
    }

    #[test]
    fn repetition_visible_only_when_it_consumed_input() {
        let empty = TraceNode::new(ExprKind::Repetition, "digit*", "");
        assert_eq!(
            classify(&empty),
            Visibility::Hidden(HiddenReason::EmptyRepetition)
        );
        let consumed = TraceNode::new(ExprKind::Repetition, "digit*", "12");
        assert_eq!(classify(&consumed), Visibility::VisibleContainer);
    }

    #[test]
    fn empty_repetition_stays_hidden_with_zero_width_children() {
        // Literal rule: matched text decides, not the children.
        let node = TraceNode::new(ExprKind::Repetition, "x*", "")
            .child(user(ExprKind::Other, "x", ""));
        assert_eq!(
            classify(&node),
            Visibility::Hidden(HiddenReason::EmptyRepetition)
        );
    }

    #[test]
    fn source_interval_decides_leaf_or_container() {
        assert_eq!(
            classify(&TraceNode::new(ExprKind::Other, "number", "12")),
            Visibility::Hidden(HiddenReason::Synthetic)
        );
        assert_eq!(
            classify(&user(ExprKind::Other, "number", "12")),
            Visibility::VisibleContainer
        );
        assert_eq!(
            classify(&user(ExprKind::Primitive, "\"+\"", "+")),
            Visibility::VisibleLeaf
        );
        assert_eq!(
            classify(&TraceNode::new(ExprKind::Primitive, "\"+\"", "+")),
            Visibility::Hidden(HiddenReason::Synthetic)
        );
    }

    #[test]
    fn classification_is_stable() {
        let node = user(ExprKind::Other, "Expr", "12+34");
        let first = classify(&node);
        for _ in 0..4 {
            assert_eq!(classify(&node), first);
        }
    }
}
