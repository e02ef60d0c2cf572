#![forbid(unsafe_code)]

//! Explicit layout math for the box tree and the input ribbon.
//!
//! Boxes behave like nested horizontal flex rows: a box is a label on top of
//! a children block, and the children block lays its boxes out left to
//! right. A [`Layout`] borrows its tree immutably and memoizes every size it
//! computes, so a view answers any number of queries in one bottom-up pass
//! over the arena. Take a fresh view after mutating the tree; it then
//! reflects the current collapse flags, minimum widths and animation pins.
//!
//! # Rules
//!
//! - `rendered_width = max(min_width, explicit_width or natural)`, where
//!   natural is the label width when collapsed and
//!   `max(label, Σ child widths)` when expanded. A minimum width always wins
//!   over an explicit width.
//! - `children_height = 0` when hidden, else the explicit height, else the
//!   tallest child.
//! - `fragment_width = max(min_width, own text + Σ child fragment widths)`.
//! - A box inside a collapsed ancestor is not displayed and occupies zero
//!   width, whatever its own rendered width is.
//!
//! A [`Layout`] can be *detached*: one box is treated as a clone with its
//! explicit sizes cleared and its hidden flag overridden. The measurement
//! service uses this to size a children block without mutating the tree.

use std::cell::RefCell;

use serde::Serialize;

use crate::animator::ToggleState;
use crate::boxes::{BoxId, BoxTree, FragmentId};
use crate::geometry::{Px, Rect, Size};
use crate::measure::{TextMeasurer, TextRole};

/// Override applied to one box when laying out a measuring clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Detached {
    pub root: BoxId,
    pub children_hidden: bool,
}

/// Sizes computed so far by one [`Layout`], indexed by arena slot.
#[derive(Debug, Default)]
struct LayoutMemo {
    labels: RefCell<Vec<Option<Size>>>,
    widths: RefCell<Vec<Option<Px>>>,
    blocks: RefCell<Vec<Option<Size>>>,
    displayed: RefCell<Vec<Option<bool>>>,
    texts: RefCell<Vec<Option<Size>>>,
    inputs: RefCell<Vec<Option<Size>>>,
    fragments: RefCell<Vec<Option<Px>>>,
}

impl LayoutMemo {
    fn for_tree(tree: &BoxTree) -> Self {
        let boxes = tree.len();
        let fragments = tree.fragment_count();
        Self {
            labels: RefCell::new(vec![None; boxes]),
            widths: RefCell::new(vec![None; boxes]),
            blocks: RefCell::new(vec![None; boxes]),
            displayed: RefCell::new(vec![None; boxes]),
            texts: RefCell::new(vec![None; fragments]),
            inputs: RefCell::new(vec![None; fragments]),
            fragments: RefCell::new(vec![None; fragments]),
        }
    }
}

/// Look `index` up in `table`, computing and storing it on a miss.
///
/// No borrow is held while `compute` runs, so it may recurse into the same
/// table.
fn cached<T: Copy>(
    table: &RefCell<Vec<Option<T>>>,
    index: u32,
    compute: impl FnOnce() -> T,
) -> T {
    let slot = index as usize;
    if let Some(Some(hit)) = table.borrow().get(slot) {
        return *hit;
    }
    let value = compute();
    if let Some(entry) = table.borrow_mut().get_mut(slot) {
        *entry = Some(value);
    }
    value
}

/// Read-only layout queries over a [`BoxTree`].
pub struct Layout<'a> {
    tree: &'a BoxTree,
    measurer: &'a dyn TextMeasurer,
    detached: Option<Detached>,
    memo: LayoutMemo,
}

impl<'a> Layout<'a> {
    #[must_use]
    pub fn new(tree: &'a BoxTree, measurer: &'a dyn TextMeasurer) -> Self {
        Self {
            tree,
            measurer,
            detached: None,
            memo: LayoutMemo::for_tree(tree),
        }
    }

    pub(crate) fn detached(
        tree: &'a BoxTree,
        measurer: &'a dyn TextMeasurer,
        detached: Detached,
    ) -> Self {
        Self {
            tree,
            measurer,
            detached: Some(detached),
            memo: LayoutMemo::for_tree(tree),
        }
    }

    fn is_clone_root(&self, id: BoxId) -> bool {
        self.detached.is_some_and(|d| d.root == id)
    }

    fn children_hidden(&self, id: BoxId) -> bool {
        match self.detached {
            Some(d) if d.root == id => d.children_hidden,
            _ => self.tree[id].children_hidden,
        }
    }

    // ------------------------------------------------------------------
    // Boxes
    // ------------------------------------------------------------------

    #[must_use]
    pub fn label_size(&self, id: BoxId) -> Size {
        cached(&self.memo.labels, id.index(), || {
            let b = &self.tree[id];
            let role = if b.is_primitive {
                TextRole::PrimitiveLabel
            } else {
                TextRole::Label
            };
            self.measurer.measure(&b.label, role)
        })
    }

    /// Natural size of the children block, ignoring any pinned height.
    #[must_use]
    pub fn children_block(&self, id: BoxId) -> Size {
        if self.children_hidden(id) {
            return Size::ZERO;
        }
        cached(&self.memo.blocks, id.index(), || {
            self.tree[id]
                .children
                .iter()
                .fold(Size::ZERO, |acc, &child| {
                    Size::new(
                        acc.width + self.rendered_width(child),
                        acc.height.max(self.rendered_height(child)),
                    )
                })
        })
    }

    #[must_use]
    pub fn rendered_width(&self, id: BoxId) -> Px {
        cached(&self.memo.widths, id.index(), || {
            let b = &self.tree[id];
            let explicit = if self.is_clone_root(id) {
                None
            } else {
                b.explicit_width
            };
            let natural = explicit.unwrap_or_else(|| {
                let label = self.label_size(id).width;
                if self.children_hidden(id) {
                    label
                } else {
                    label.max(self.children_block(id).width)
                }
            });
            natural.max(b.min_width.unwrap_or(0.0))
        })
    }

    /// False when some ancestor hides its children.
    #[must_use]
    pub fn is_displayed(&self, id: BoxId) -> bool {
        cached(&self.memo.displayed, id.index(), || {
            self.tree[id]
                .parent
                .is_none_or(|parent| !self.children_hidden(parent) && self.is_displayed(parent))
        })
    }

    /// Width the box occupies on screen: zero inside a collapsed ancestor.
    #[must_use]
    pub fn displayed_width(&self, id: BoxId) -> Px {
        if self.is_displayed(id) {
            self.rendered_width(id)
        } else {
            0.0
        }
    }

    /// Rendered height of the children block.
    #[must_use]
    pub fn children_height(&self, id: BoxId) -> Px {
        if self.children_hidden(id) {
            return 0.0;
        }
        let pinned = if self.is_clone_root(id) {
            None
        } else {
            self.tree[id].children_height
        };
        pinned.unwrap_or_else(|| self.children_block(id).height)
    }

    #[must_use]
    pub fn rendered_height(&self, id: BoxId) -> Px {
        self.label_size(id).height + self.children_height(id)
    }

    // ------------------------------------------------------------------
    // Ribbon
    // ------------------------------------------------------------------

    #[must_use]
    pub fn fragment_text_size(&self, id: FragmentId) -> Size {
        cached(&self.memo.texts, id.raw(), || {
            let f = self.tree.fragment(id);
            self.measurer.measure(&f.display, TextRole::for_fragment(f))
        })
    }

    /// Natural size of the fragment's text and all nested fragments' text,
    /// ignoring pinned widths.
    #[must_use]
    pub fn input_size(&self, id: FragmentId) -> Size {
        cached(&self.memo.inputs, id.raw(), || {
            self.tree
                .fragment(id)
                .children
                .iter()
                .fold(self.fragment_text_size(id), |acc, &child| {
                    let size = self.input_size(child);
                    Size::new(acc.width + size.width, acc.height.max(size.height))
                })
        })
    }

    #[must_use]
    pub fn fragment_width(&self, id: FragmentId) -> Px {
        cached(&self.memo.fragments, id.raw(), || {
            let f = self.tree.fragment(id);
            let natural = self.fragment_text_size(id).width
                + f.children
                    .iter()
                    .map(|&child| self.fragment_width(child))
                    .sum::<Px>();
            natural.max(f.min_width.unwrap_or(0.0))
        })
    }

    // ------------------------------------------------------------------
    // Arrangement
    // ------------------------------------------------------------------

    /// Position every fragment and every laid-out box.
    #[must_use]
    pub fn arrange(&self) -> LayoutSnapshot {
        let ribbon_height = self.measurer.measure("", TextRole::Input).height;
        let mut ribbon = Vec::new();
        let mut x = 0.0;
        for &id in self.tree.root_fragments() {
            x = self.place_fragment(id, x, ribbon_height, 0, &mut ribbon);
        }
        let ribbon_width = x;

        let mut boxes = Vec::new();
        let mut x = 0.0;
        let mut height: Px = 0.0;
        for &id in self.tree.roots() {
            let rect = self.place_box(id, x, ribbon_height, 0, &mut boxes);
            x = rect.right();
            height = height.max(rect.height);
        }

        LayoutSnapshot {
            generation: self.tree.generation(),
            width: ribbon_width.max(x),
            height: ribbon_height + height,
            ribbon,
            boxes,
        }
    }

    fn place_fragment(
        &self,
        id: FragmentId,
        x: Px,
        height: Px,
        depth: usize,
        out: &mut Vec<FragmentRect>,
    ) -> Px {
        let f = self.tree.fragment(id);
        let width = self.fragment_width(id);
        out.push(FragmentRect {
            id: id.raw(),
            depth,
            rect: Rect::new(x, 0.0, width, height),
            text: f.display.clone(),
            whitespace: f.is_whitespace,
            highlighted: f.highlighted,
        });
        let mut cx = x + self.fragment_text_size(id).width;
        for &child in &f.children {
            cx = self.place_fragment(child, cx, height, depth + 1, out);
        }
        x + width
    }

    fn place_box(
        &self,
        id: BoxId,
        x: Px,
        y: Px,
        depth: usize,
        out: &mut Vec<BoxRect>,
    ) -> Rect {
        let b = &self.tree[id];
        let rect = Rect::new(x, y, self.rendered_width(id), self.rendered_height(id));
        out.push(BoxRect {
            id: id.index(),
            parent: b.parent.map(BoxId::index),
            depth,
            rect,
            label: b.label.clone(),
            fragment: b.input.raw(),
            classes: BoxClasses {
                failed: b.is_failure,
                primitive: b.is_primitive,
                whitespace: b.is_whitespace,
                collapsed: b.children_hidden,
            },
            state: if b.children_hidden {
                ToggleState::Collapsed
            } else {
                ToggleState::Expanded
            },
        });
        if !b.children_hidden {
            let mut cx = x;
            let cy = y + self.label_size(id).height;
            for &child in &b.children {
                cx = self.place_box(child, cx, cy, depth + 1, out).right();
            }
        }
        rect
    }

    /// Innermost box under the point. Children are clipped to their parent.
    #[must_use]
    pub fn hit_test(&self, x: Px, y: Px) -> Option<BoxId> {
        let mut rects: Vec<Option<Rect>> = vec![None; self.tree.len()];
        for placed in self.arrange().boxes {
            if let Some(slot) = rects.get_mut(placed.id as usize) {
                *slot = Some(placed.rect);
            }
        }
        let rect_of = |id: BoxId| rects.get(id.index() as usize).copied().flatten();
        let mut hit = self
            .tree
            .roots()
            .iter()
            .copied()
            .find(|&id| rect_of(id).is_some_and(|r| r.contains(x, y)))?;
        loop {
            let next = self.tree[hit]
                .children
                .iter()
                .copied()
                .find(|&id| rect_of(id).is_some_and(|r| r.contains(x, y)));
            match next {
                Some(child) => hit = child,
                None => return Some(hit),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Styling hooks carried by a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoxClasses {
    pub failed: bool,
    pub primitive: bool,
    pub whitespace: bool,
    pub collapsed: bool,
}

impl BoxClasses {
    /// CSS class list, `pexpr` first.
    #[must_use]
    pub fn css_classes(&self) -> Vec<&'static str> {
        let mut out = vec!["pexpr"];
        if self.failed {
            out.push("failed");
        }
        if self.primitive {
            out.push("prim");
        }
        if self.whitespace {
            out.push("whitespace");
        }
        if self.collapsed {
            out.push("collapsed");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxRect {
    pub id: u32,
    pub parent: Option<u32>,
    pub depth: usize,
    pub rect: Rect,
    pub label: String,
    pub fragment: u32,
    pub classes: BoxClasses,
    /// Settled state; the session overrides it for boxes mid-transition.
    pub state: ToggleState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FragmentRect {
    pub id: u32,
    pub depth: usize,
    pub rect: Rect,
    pub text: String,
    pub whitespace: bool,
    pub highlighted: bool,
}

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub generation: u32,
    pub width: Px,
    pub height: Px,
    pub ribbon: Vec<FragmentRect>,
    pub boxes: Vec<BoxRect>,
}
