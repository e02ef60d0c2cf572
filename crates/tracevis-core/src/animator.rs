#![forbid(unsafe_code)]

//! Expand/collapse transitions.
//!
//! Toggling a box starts two independent tweens: the box width (label width
//! when collapsing, children width when expanding) and the children block
//! height (down to zero, or up to the measured children height). After each
//! width frame every width-dependent box re-pins its input fragment, so the
//! ribbon tracks the animation in real time rather than jumping at the end.
//!
//! # State machine
//!
//! ```text
//!            toggle                 settle
//! Collapsed ───────▶ Expanding ───────────▶ Expanded
//!     ▲                 │  ▲                   │
//!     │ settle   toggle │  │ toggle     toggle │
//!     │                 ▼  │                   ▼
//!     └──────────────── Collapsing ◀───────────┘
//! ```
//!
//! # Invariants
//!
//! 1. A box is settled only when both of its tweens have completed.
//! 2. On start, an expanding box shows its children (height pinned at the
//!    current value, initially zero).
//! 3. On completion, a collapsing box hides its children; explicit width
//!    and height are cleared so the layout is flexible again.
//! 4. Settling re-pins the fragments of the whole dependency set once more
//!    against the unpinned layout.
//!
//! # Overlapping toggles
//!
//! Toggling a box that is still animating interrupts the running
//! transition and starts the opposite one from the current rendered width
//! and height. A direction is taken from the interrupted transition's
//! target, not from the hidden flag, which does not flip until a collapse
//! completes.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::animation::{Animation, EasingFn, Tween, ease_in_out_cubic};
use crate::boxes::{BoxId, BoxTree};
use crate::measure::{MeasurementService, TextMeasurer};
use crate::registry::{dependents_of, update_input_widths};

/// Default transition length.
pub const DEFAULT_TOGGLE_DURATION: Duration = Duration::from_millis(500);

/// Where a box is in its expand/collapse cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
    Collapsed,
    Expanding,
    Expanded,
    Collapsing,
}

impl ToggleState {
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Expanding | Self::Collapsing)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::Expanding => "expanding",
            Self::Expanded => "expanded",
            Self::Collapsing => "collapsing",
        }
    }
}

/// Which way a toggle goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Expand,
    Collapse,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Expand => Self::Collapse,
            Self::Collapse => Self::Expand,
        }
    }
}

#[derive(Debug)]
struct Transition {
    direction: Direction,
    deps: Vec<BoxId>,
    width: Option<Tween>,
    height: Option<Tween>,
}

/// Drives every in-flight toggle of one tree.
#[derive(Debug)]
pub struct ToggleAnimator {
    duration: Duration,
    easing: EasingFn,
    active: BTreeMap<BoxId, Transition>,
}

impl Default for ToggleAnimator {
    fn default() -> Self {
        Self::new(DEFAULT_TOGGLE_DURATION)
    }
}

impl ToggleAnimator {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            easing: ease_in_out_cubic,
            active: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// No transition in flight.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Boxes currently animating, in id order.
    pub fn animating(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.active.keys().copied()
    }

    #[must_use]
    pub fn state_of(&self, tree: &BoxTree, id: BoxId) -> ToggleState {
        match self.active.get(&id) {
            Some(t) if t.direction == Direction::Expand => ToggleState::Expanding,
            Some(_) => ToggleState::Collapsing,
            None if tree[id].children_hidden => ToggleState::Collapsed,
            None => ToggleState::Expanded,
        }
    }

    /// Drop every in-flight transition without touching the tree.
    ///
    /// Used when the tree itself is being replaced.
    pub fn cancel_all(&mut self) {
        if !self.active.is_empty() {
            tracing::debug!(cancelled = self.active.len(), "cancelled in-flight toggles");
        }
        self.active.clear();
    }

    /// Start (or reverse) the transition of `id`.
    pub fn toggle<M: TextMeasurer>(
        &mut self,
        tree: &mut BoxTree,
        service: &mut MeasurementService<M>,
        id: BoxId,
    ) -> Direction {
        let direction = match self.active.remove(&id) {
            Some(interrupted) => interrupted.direction.reversed(),
            None if tree[id].children_hidden => Direction::Expand,
            None => Direction::Collapse,
        };
        let showing = direction == Direction::Expand;

        let children = service.measure_children_as(tree, id, true);
        let label = service.measure_label(tree, id);
        let text = service.measure_input(tree, tree[id].input);
        let target_width = (if showing { children.width } else { label.width }).max(text.width);
        let target_height = if showing { children.height } else { 0.0 };

        let deps = dependents_of(tree, id);
        let (from_width, from_height) = {
            let layout = service.layout(tree);
            (layout.rendered_width(id), layout.children_height(id))
        };

        let b = &mut tree[id];
        b.explicit_width = Some(from_width);
        b.children_height = Some(from_height);
        if showing {
            b.children_hidden = false;
        }

        tracing::debug!(
            %id,
            ?direction,
            from_width,
            target_width,
            from_height,
            target_height,
            deps = deps.len(),
            "toggle"
        );

        self.active.insert(
            id,
            Transition {
                direction,
                deps,
                width: Some(Tween::new(from_width, target_width, self.duration).easing(self.easing)),
                height: Some(
                    Tween::new(from_height, target_height, self.duration).easing(self.easing),
                ),
            },
        );
        direction
    }

    /// Advance every transition by one frame. Returns the boxes that settled.
    pub fn tick<M: TextMeasurer>(
        &mut self,
        tree: &mut BoxTree,
        service: &mut MeasurementService<M>,
        dt: Duration,
    ) -> Vec<BoxId> {
        let mut settled = Vec::new();
        for (&id, transition) in &mut self.active {
            if let Some(tween) = transition.width.as_mut() {
                tween.tick(dt);
                tree[id].explicit_width = Some(tween.value());
                update_input_widths(tree, service, &transition.deps);
                tracing::trace!(%id, width = tween.value(), "width frame");
                if tween.is_complete() {
                    tree[id].explicit_width = None;
                    transition.width = None;
                }
            }

            if let Some(tween) = transition.height.as_mut() {
                tween.tick(dt);
                tree[id].children_height = Some(tween.value());
                if tween.is_complete() {
                    if transition.direction == Direction::Collapse {
                        tree[id].children_hidden = true;
                    }
                    tree[id].children_height = None;
                    transition.height = None;
                }
            }

            if transition.width.is_none() && transition.height.is_none() {
                settled.push(id);
            }
        }

        for &id in &settled {
            if let Some(transition) = self.active.remove(&id) {
                update_input_widths(tree, service, &transition.deps);
                tracing::debug!(%id, direction = ?transition.direction, "toggle settled");
            }
        }
        settled
    }
}
