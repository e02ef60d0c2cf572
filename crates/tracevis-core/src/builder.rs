#![forbid(unsafe_code)]

//! Trace walk that builds the box tree and the input ribbon.
//!
//! The walk is depth-first and carries three things down: the box container
//! children are appended to, the ribbon fragment their input is nested in,
//! and whether tracing is still enabled (a blackhole disables it for its
//! whole subtree). Every successful node gets a fragment; only visible
//! nodes and whitespace runs get a box. Hidden nodes are flattened: their
//! descendants land directly in the enclosing container.

use crate::boxes::{BoxId, BoxSpec, BoxTree, FragmentId};
use crate::trace::TraceNode;
use crate::visibility::{classify, is_blackhole};

/// Glyph shown in place of a whitespace run.
pub const WHITESPACE_GLYPH: &str = "\u{b7}";

/// Builds [`BoxTree`]s from traces.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    whitespace_glyph: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(WHITESPACE_GLYPH)
    }
}

impl TreeBuilder {
    #[must_use]
    pub fn new(whitespace_glyph: impl Into<String>) -> Self {
        Self {
            whitespace_glyph: whitespace_glyph.into(),
        }
    }

    /// Build a fresh tree of the given generation from `trace`.
    #[must_use]
    pub fn build(&self, trace: &[TraceNode], generation: u32) -> BoxTree {
        let _span = tracing::debug_span!("tracevis.build", generation, nodes = trace.len()).entered();
        let mut tree = BoxTree::new(generation);
        for node in trace {
            self.walk(&mut tree, node, None, None, true);
        }
        tracing::debug!(
            boxes = tree.len(),
            fragments = tree.fragment_count(),
            "built box tree"
        );
        tree
    }

    fn walk(
        &self,
        tree: &mut BoxTree,
        node: &TraceNode,
        container: Option<BoxId>,
        ribbon: Option<FragmentId>,
        show_trace: bool,
    ) {
        if !node.succeeded {
            return;
        }

        let text = if node.is_primitive() {
            node.contents().to_string()
        } else {
            String::new()
        };
        let is_whitespace = is_whitespace_run(&text);
        let glyph = is_whitespace.then_some(self.whitespace_glyph.as_str());
        let fragment = tree.push_fragment(ribbon, text, glyph);

        let should_show = show_trace && !is_blackhole(node);
        let child_container = if (should_show && classify(node).is_visible()) || is_whitespace {
            Some(tree.push_box(
                container,
                fragment,
                BoxSpec {
                    label: node.label().to_string(),
                    is_whitespace,
                    is_failure: !node.succeeded,
                    is_primitive: node.is_primitive(),
                },
            ))
        } else {
            container
        };

        for child in &node.children {
            self.walk(tree, child, child_container, Some(fragment), should_show);
        }
    }
}

/// Non-empty and made only of whitespace.
fn is_whitespace_run(text: &str) -> bool {
    !text.is_empty() && text.trim().is_empty()
}
