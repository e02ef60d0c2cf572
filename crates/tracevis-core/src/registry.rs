#![forbid(unsafe_code)]

//! Width dependencies between boxes.
//!
//! When a box changes width, its ancestors reflow around it and its
//! descendants may need their ribbon fragments re-pinned. [`dependents_of`]
//! returns that set; [`update_input_widths`] walks it and pins each box's
//! input fragment to the box's current rendered width, so the input text
//! stays directly above the box that consumed it.
//!
//! There is no persistent index: the set is recomputed from the tree on
//! demand, so rebuilding the tree invalidates it implicitly.
//!
//! Boxes hidden inside a collapsed ancestor occupy no width, so their
//! fragments are pinned to zero and shrink back to their text.

use crate::boxes::{BoxId, BoxTree, FragmentId};
use crate::measure::{MeasurementService, TextMeasurer};

/// `id` itself, then its ancestors nearest first, then every descendant in
/// pre-order.
#[must_use]
pub fn dependents_of(tree: &BoxTree, id: BoxId) -> Vec<BoxId> {
    let mut out = vec![id];
    out.extend(tree.ancestors(id));
    out.extend(tree.descendants(id));
    out
}

/// For each box in `deps`, pin its fragment's minimum width to the box's
/// displayed width. A box without a minimum width gets one from its input
/// text first.
///
/// Boxes are processed in order and each reads the layout as left by the
/// previous one. Fragment pins never feed back into box widths, so one
/// layout view serves every box up to the next one that still needs a
/// minimum width.
pub fn update_input_widths<M: TextMeasurer>(
    tree: &mut BoxTree,
    service: &mut MeasurementService<M>,
    deps: &[BoxId],
) {
    let mut rest = deps;
    while !rest.is_empty() {
        let mut pins = Vec::with_capacity(rest.len());
        let mut unsized_box = None;
        {
            let layout = service.layout(tree);
            for &id in rest {
                pins.push((tree[id].input, layout.displayed_width(id)));
                if tree[id].min_width.is_none() {
                    unsized_box = Some(id);
                    break;
                }
            }
        }
        rest = &rest[pins.len()..];
        for (input, width) in pins {
            tree.fragment_mut(input).min_width = Some(width);
        }
        if let Some(id) = unsized_box {
            let text_width = service.measure_input(tree, tree[id].input).width;
            tree[id].min_width = Some(text_width);
        }
    }
}

/// Give every box a minimum width equal to its input text, then pin every
/// fragment.
pub fn initialize_widths<M: TextMeasurer>(tree: &mut BoxTree, service: &mut MeasurementService<M>) {
    let all: Vec<BoxId> = tree.ids().collect();
    let inputs: Vec<FragmentId> = all.iter().map(|&id| tree[id].input).collect();
    let sizes = service.measure_inputs(tree, &inputs);
    for (&id, size) in all.iter().zip(sizes) {
        tree[id].min_width = Some(size.width);
    }
    // Children before parents so each parent reads settled child widths.
    let mut order = all;
    order.reverse();
    update_input_widths(tree, service, &order);
    tracing::debug!(boxes = order.len(), "initialized box widths");
}
