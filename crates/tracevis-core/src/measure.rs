#![forbid(unsafe_code)]

//! Off-screen measurement.
//!
//! The renderer never reads live layout to decide where an animation should
//! end. Instead it clones the relevant markup into a [`MeasuringArea`], reads
//! the clone's natural size, and removes it again. Three modes exist:
//!
//! - **label**: the box label alone (collapsed width);
//! - **children**: the box with its explicit sizes cleared and its
//!   children-hidden flag flipped (expanded width and height);
//! - **input**: a plain span holding the fragment's full text content (the
//!   narrowest the box may ever be). Each fragment's run is measured in the
//!   same role the ribbon paints it in, so a box's minimum width always
//!   covers its own ribbon text.
//!
//! Raw text measurement is delegated to a [`TextMeasurer`], the one primitive
//! the host has to provide. [`MonospaceMeasurer`] is a deterministic
//! implementation for terminals and tests.
//!
//! # Invariants
//!
//! 1. The measuring area is never visible.
//! 2. Every measurement appends, reads and removes its clone within one call;
//!    the area is empty between calls.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

use crate::boxes::{BoxId, BoxTree, FragmentId, InputFragment};
use crate::geometry::{Px, Size};
use crate::layout::{Detached, Layout};

// ---------------------------------------------------------------------------
// Primitive text measurement
// ---------------------------------------------------------------------------

/// How a run of text is styled, which affects its measured size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextRole {
    /// Box label.
    Label,
    /// Label of a primitive leaf (distinct styling).
    PrimitiveLabel,
    /// Input ribbon text.
    Input,
    /// Whitespace glyph in the ribbon.
    Whitespace,
}

impl TextRole {
    /// Role a ribbon fragment is painted and measured in.
    #[must_use]
    pub fn for_fragment(fragment: &InputFragment) -> Self {
        if fragment.is_whitespace {
            Self::Whitespace
        } else {
            Self::Input
        }
    }
}

/// Host-provided text measurement.
pub trait TextMeasurer {
    /// Natural size of `text` rendered in `role`'s style.
    fn measure(&self, text: &str, role: TextRole) -> Size;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, role: TextRole) -> Size {
        (**self).measure(text, role)
    }
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for Box<T> {
    fn measure(&self, text: &str, role: TextRole) -> Size {
        (**self).measure(text, role)
    }
}

/// Cell metrics for [`MonospaceMeasurer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonospaceConfig {
    pub char_width: Px,
    pub line_height: Px,
    /// Padding on each side of a label.
    pub label_padding: Px,
}

impl Default for MonospaceConfig {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
            label_padding: 4.0,
        }
    }
}

/// Measures text as a grid of fixed-width cells.
///
/// Column counts come from Unicode display width, so wide characters take
/// two cells.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonospaceMeasurer {
    config: MonospaceConfig,
}

impl MonospaceMeasurer {
    #[must_use]
    pub const fn new(config: MonospaceConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> MonospaceConfig {
        self.config
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn measure(&self, text: &str, role: TextRole) -> Size {
        let cols = UnicodeWidthStr::width(text) as Px;
        let c = &self.config;
        match role {
            TextRole::Label | TextRole::PrimitiveLabel => Size::new(
                cols * c.char_width + 2.0 * c.label_padding,
                c.line_height + 2.0 * c.label_padding,
            ),
            TextRole::Input | TextRole::Whitespace => {
                Size::new(cols * c.char_width, c.line_height)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Measuring area
// ---------------------------------------------------------------------------

/// Markup placed in the measuring area.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MeasureClone {
    Label { text: String, role: TextRole },
    Subtree(Detached),
    Input(Vec<FragmentId>),
}

/// The single off-screen scratch container.
#[derive(Debug, Default)]
pub struct MeasuringArea {
    scratch: Vec<MeasureClone>,
    measurements: u64,
}

impl MeasuringArea {
    /// Number of clones currently attached. Zero between measurements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scratch.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scratch.is_empty()
    }

    /// Never: the area only exists to be read.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        false
    }

    /// Total measurements taken.
    #[must_use]
    pub const fn measurements(&self) -> u64 {
        self.measurements
    }

    fn with_clone<R>(&mut self, clone: MeasureClone, read: impl FnOnce(&MeasureClone) -> R) -> R {
        debug_assert!(self.scratch.is_empty(), "measuring area leaked a clone");
        self.scratch.push(clone);
        let result = read(&self.scratch[self.scratch.len() - 1]);
        self.scratch.clear();
        self.measurements += 1;
        result
    }
}

// ---------------------------------------------------------------------------
// MeasurementService
// ---------------------------------------------------------------------------

/// Measures boxes and fragments without touching their live state.
#[derive(Debug)]
pub struct MeasurementService<M> {
    measurer: M,
    area: MeasuringArea,
}

impl<M: TextMeasurer> MeasurementService<M> {
    pub fn new(measurer: M) -> Self {
        Self {
            measurer,
            area: MeasuringArea::default(),
        }
    }

    #[must_use]
    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    #[must_use]
    pub fn area(&self) -> &MeasuringArea {
        &self.area
    }

    /// Live layout over `tree`.
    #[must_use]
    pub fn layout<'a>(&'a self, tree: &'a BoxTree) -> Layout<'a> {
        Layout::new(tree, &self.measurer)
    }

    /// Size of the box's label alone.
    pub fn measure_label(&mut self, tree: &BoxTree, id: BoxId) -> Size {
        let b = &tree[id];
        let role = if b.is_primitive {
            TextRole::PrimitiveLabel
        } else {
            TextRole::Label
        };
        let measurer = &self.measurer;
        self.area.with_clone(
            MeasureClone::Label {
                text: b.label.clone(),
                role,
            },
            |clone| match clone {
                MeasureClone::Label { text, role } => measurer.measure(text, *role),
                _ => Size::ZERO,
            },
        )
    }

    /// Size of the box's children block with its hidden flag flipped.
    pub fn measure_children(&mut self, tree: &BoxTree, id: BoxId) -> Size {
        let shown = tree[id].children_hidden;
        self.measure_children_as(tree, id, shown)
    }

    /// Size of the box's children block when shown (`true`) or hidden.
    pub fn measure_children_as(&mut self, tree: &BoxTree, id: BoxId, shown: bool) -> Size {
        let measurer = &self.measurer;
        self.area.with_clone(
            MeasureClone::Subtree(Detached {
                root: id,
                children_hidden: !shown,
            }),
            |clone| match clone {
                MeasureClone::Subtree(detached) => {
                    Layout::detached(tree, measurer, *detached).children_block(detached.root)
                }
                _ => Size::ZERO,
            },
        )
    }

    /// Size of the fragment's full text content, nested fragments included.
    pub fn measure_input(&mut self, tree: &BoxTree, id: FragmentId) -> Size {
        self.measure_inputs(tree, &[id])
            .first()
            .copied()
            .unwrap_or(Size::ZERO)
    }

    /// [`measure_input`](Self::measure_input) for many fragments in one
    /// clone. Runs shared between nested fragments are measured once.
    pub fn measure_inputs(&mut self, tree: &BoxTree, ids: &[FragmentId]) -> Vec<Size> {
        let measurer = &self.measurer;
        self.area
            .with_clone(MeasureClone::Input(ids.to_vec()), |clone| match clone {
                MeasureClone::Input(ids) => {
                    let layout = Layout::new(tree, measurer);
                    ids.iter().map(|&id| layout.input_size(id)).collect()
                }
                _ => Vec::new(),
            })
    }
}
