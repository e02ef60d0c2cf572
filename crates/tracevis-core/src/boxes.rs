#![forbid(unsafe_code)]

//! Box tree arena.
//!
//! A [`BoxTree`] holds the rendered counterpart of one trace: the nested
//! [`VisualBox`]es and the parallel ribbon of [`InputFragment`]s that show
//! the input text each box consumed. Both live in flat vectors addressed by
//! ids; parent/child links are ids, never references.
//!
//! The tree is rebuilt from scratch on every re-parse. Each build gets a new
//! generation, and [`BoxId`]s carry the generation they were minted in, so an
//! id kept across a rebuild is detected as stale instead of silently aliasing
//! a box of the new tree.
//!
//! # Invariants
//!
//! 1. A box's `input` fragment belongs to the same tree.
//! 2. `children` of a box are in left-to-right trace order.
//! 3. Fragments nest like the trace: a node's fragment is a child of its
//!    parent node's fragment (or a root fragment for top-level nodes).

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::geometry::Px;

// ============================================================================
// Ids
// ============================================================================

/// Handle to a [`VisualBox`] in a specific tree generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId {
    generation: u32,
    index: u32,
}

impl BoxId {
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }
}

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}@{}", self.index, self.generation)
    }
}

/// Handle to an [`InputFragment`] in the tree that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId(u32);

impl FragmentId {
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{}", self.0)
    }
}

// ============================================================================
// Fragments
// ============================================================================

/// The rendered span of input text attributed to one trace node.
#[derive(Debug, Clone, PartialEq)]
pub struct InputFragment {
    /// Text as matched (empty for non-primitive nodes).
    pub text: String,
    /// Text as displayed; whitespace runs show a glyph instead.
    pub display: String,
    pub is_whitespace: bool,
    pub parent: Option<FragmentId>,
    pub children: Vec<FragmentId>,
    /// Pinned to the width of the box that owns this fragment.
    pub min_width: Option<Px>,
    pub highlighted: bool,
}

// ============================================================================
// Boxes
// ============================================================================

/// The rendered counterpart of a visible trace node.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualBox {
    pub label: String,
    pub input: FragmentId,
    pub parent: Option<BoxId>,
    pub children: Vec<BoxId>,
    /// Collapsed when set: the children block is not laid out.
    pub children_hidden: bool,
    pub is_whitespace: bool,
    pub is_failure: bool,
    pub is_primitive: bool,
    pub min_width: Option<Px>,
    /// Width pinned by an in-flight animation.
    pub explicit_width: Option<Px>,
    /// Height of the children block pinned by an in-flight animation.
    pub children_height: Option<Px>,
}

impl VisualBox {
    #[must_use]
    pub const fn collapsed(&self) -> bool {
        self.children_hidden
    }
}

/// Everything the builder knows when it creates a box.
#[derive(Debug, Clone, Default)]
pub struct BoxSpec {
    pub label: String,
    pub is_whitespace: bool,
    pub is_failure: bool,
    pub is_primitive: bool,
}

// ============================================================================
// BoxTree
// ============================================================================

/// Arena owning all boxes and fragments of one build.
#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    generation: u32,
    boxes: Vec<VisualBox>,
    fragments: Vec<InputFragment>,
    root_boxes: Vec<BoxId>,
    root_fragments: Vec<FragmentId>,
}

impl BoxTree {
    #[must_use]
    pub fn new(generation: u32) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// True when `id` addresses a box of this tree.
    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        id.generation == self.generation && (id.index as usize) < self.boxes.len()
    }

    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&VisualBox> {
        if self.contains(id) {
            self.boxes.get(id.index as usize)
        } else {
            None
        }
    }

    /// Top-level boxes, left to right.
    #[must_use]
    pub fn roots(&self) -> &[BoxId] {
        &self.root_boxes
    }

    /// Top-level ribbon fragments, left to right.
    #[must_use]
    pub fn root_fragments(&self) -> &[FragmentId] {
        &self.root_fragments
    }

    /// All box ids in creation order (which is pre-order).
    pub fn ids(&self) -> impl Iterator<Item = BoxId> + '_ {
        let generation = self.generation;
        (0..self.boxes.len() as u32).map(move |index| BoxId { generation, index })
    }

    #[must_use]
    pub fn fragment(&self, id: FragmentId) -> &InputFragment {
        &self.fragments[id.0 as usize]
    }

    pub fn fragment_mut(&mut self, id: FragmentId) -> &mut InputFragment {
        &mut self.fragments[id.0 as usize]
    }

    pub fn fragment_ids(&self) -> impl Iterator<Item = FragmentId> + '_ {
        (0..self.fragments.len() as u32).map(FragmentId)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Append a fragment under `parent` (or to the top-level ribbon).
    pub fn push_fragment(
        &mut self,
        parent: Option<FragmentId>,
        text: String,
        whitespace_glyph: Option<&str>,
    ) -> FragmentId {
        let id = FragmentId(self.fragments.len() as u32);
        let (display, is_whitespace) = match whitespace_glyph {
            Some(glyph) => (glyph.to_string(), true),
            None => (text.clone(), false),
        };
        self.fragments.push(InputFragment {
            text,
            display,
            is_whitespace,
            parent,
            children: Vec::new(),
            min_width: None,
            highlighted: false,
        });
        match parent {
            Some(p) => self.fragments[p.0 as usize].children.push(id),
            None => self.root_fragments.push(id),
        }
        id
    }

    /// Append an expanded box under `parent` (or at the top level).
    pub fn push_box(&mut self, parent: Option<BoxId>, input: FragmentId, spec: BoxSpec) -> BoxId {
        let id = BoxId {
            generation: self.generation,
            index: self.boxes.len() as u32,
        };
        self.boxes.push(VisualBox {
            label: spec.label,
            input,
            parent,
            children: Vec::new(),
            children_hidden: false,
            is_whitespace: spec.is_whitespace,
            is_failure: spec.is_failure,
            is_primitive: spec.is_primitive,
            min_width: None,
            explicit_width: None,
            children_height: None,
        });
        match parent {
            Some(p) => self[p].children.push(id),
            None => self.root_boxes.push(id),
        }
        id
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Boxes on the path from `id`'s parent up to the root, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut cursor = self[id].parent;
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self[parent].parent;
        }
        out
    }

    /// Every box nested beneath `id`, in pre-order. Excludes `id`.
    #[must_use]
    pub fn descendants(&self, id: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack: Vec<BoxId> = self[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self[next].children.iter().rev().copied());
        }
        out
    }

    /// Follow child indices from the top level: `[0, 2]` is the third child
    /// of the first top-level box.
    #[must_use]
    pub fn box_at_path(&self, path: &[usize]) -> Option<BoxId> {
        let (first, rest) = path.split_first()?;
        let mut cursor = *self.root_boxes.get(*first)?;
        for &i in rest {
            cursor = *self[cursor].children.get(i)?;
        }
        Some(cursor)
    }

    /// Displayed text of a fragment and all fragments nested in it.
    #[must_use]
    pub fn display_text(&self, id: FragmentId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, |f| &f.display);
        out
    }

    /// Matched text of a fragment and all fragments nested in it.
    #[must_use]
    pub fn matched_text(&self, id: FragmentId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out, |f| &f.text);
        out
    }

    fn collect_text(
        &self,
        id: FragmentId,
        out: &mut String,
        pick: fn(&InputFragment) -> &String,
    ) {
        let fragment = self.fragment(id);
        out.push_str(pick(fragment));
        for &child in &fragment.children {
            self.collect_text(child, out, pick);
        }
    }

    /// Concatenated matched text of the top-level ribbon.
    #[must_use]
    pub fn input_text(&self) -> String {
        let mut out = String::new();
        for &id in &self.root_fragments {
            self.collect_text(id, &mut out, |f| &f.text);
        }
        out
    }
}

impl Index<BoxId> for BoxTree {
    type Output = VisualBox;

    /// Panics when `id` belongs to another generation.
    fn index(&self, id: BoxId) -> &VisualBox {
        assert_eq!(
            id.generation, self.generation,
            "box {id} used with tree generation {}",
            self.generation
        );
        &self.boxes[id.index as usize]
    }
}

impl IndexMut<BoxId> for BoxTree {
    fn index_mut(&mut self, id: BoxId) -> &mut VisualBox {
        assert_eq!(
            id.generation, self.generation,
            "box {id} used with tree generation {}",
            self.generation
        );
        &mut self.boxes[id.index as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(label: &str) -> BoxSpec {
        BoxSpec {
            label: label.to_string(),
            ..BoxSpec::default()
        }
    }

    /// root(a(c), b)
    fn sample() -> (BoxTree, [BoxId; 4]) {
        let mut tree = BoxTree::new(3);
        let f_root = tree.push_fragment(None, String::new(), None);
        let root = tree.push_box(None, f_root, spec("root"));
        let f_a = tree.push_fragment(Some(f_root), String::new(), None);
        let a = tree.push_box(Some(root), f_a, spec("a"));
        let f_c = tree.push_fragment(Some(f_a), "x".into(), None);
        let c = tree.push_box(Some(a), f_c, spec("c"));
        let f_b = tree.push_fragment(Some(f_root), " ".into(), Some("\u{b7}"));
        let b = tree.push_box(Some(root), f_b, spec("b"));
        (tree, [root, a, c, b])
    }

    #[test]
    fn ancestors_nearest_first() {
        let (tree, [root, a, c, _]) = sample();
        assert_eq!(tree.ancestors(c), vec![a, root]);
        assert!(tree.ancestors(root).is_empty());
    }

    #[test]
    fn descendants_pre_order() {
        let (tree, [root, a, c, b]) = sample();
        assert_eq!(tree.descendants(root), vec![a, c, b]);
        assert!(tree.descendants(c).is_empty());
    }

    #[test]
    fn box_at_path_follows_child_indices() {
        let (tree, [root, _, c, b]) = sample();
        assert_eq!(tree.box_at_path(&[0]), Some(root));
        assert_eq!(tree.box_at_path(&[0, 0, 0]), Some(c));
        assert_eq!(tree.box_at_path(&[0, 1]), Some(b));
        assert_eq!(tree.box_at_path(&[0, 2]), None);
        assert_eq!(tree.box_at_path(&[]), None);
    }

    #[test]
    fn text_collection_distinguishes_display_and_matched() {
        let (tree, [root, ..]) = sample();
        let f = tree[root].input;
        assert_eq!(tree.matched_text(f), "x ");
        assert_eq!(tree.display_text(f), "x\u{b7}");
        assert_eq!(tree.input_text(), "x ");
    }

    #[test]
    fn stale_ids_are_not_contained() {
        let (tree, [root, ..]) = sample();
        let other = BoxTree::new(tree.generation() + 1);
        assert!(tree.contains(root));
        assert!(!other.contains(root));
        assert!(other.get(root).is_none());
    }

    #[test]
    #[should_panic(expected = "used with tree generation")]
    fn indexing_with_stale_id_panics() {
        let (_, [root, ..]) = sample();
        let mut other = BoxTree::new(9);
        let f = other.push_fragment(None, String::new(), None);
        other.push_box(None, f, spec("x"));
        let _ = &other[root];
    }
}
