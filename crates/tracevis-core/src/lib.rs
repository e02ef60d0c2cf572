#![forbid(unsafe_code)]

//! Core: trace model, box tree, layout, measurement and toggle animation.
//!
//! # Role in tracevis
//! `tracevis-core` turns the decision trace of a PEG parse into a nested,
//! collapsible tree of labeled boxes sitting under a ribbon of the input
//! text. It owns everything that does not depend on a particular host:
//! hosts only supply text measurement ([`TextMeasurer`]) and a frame delta.
//!
//! # Primary responsibilities
//! - **Visibility policy**: which trace nodes get a box ([`classify`]).
//! - **Tree building**: trace walk producing a [`BoxTree`] with nested
//!   input fragments ([`TreeBuilder`]).
//! - **Measurement**: off-screen label, children and input sizing
//!   ([`MeasurementService`]).
//! - **Width synchronization**: every box's input fragment is pinned to the
//!   box's rendered width ([`registry`]).
//! - **Animation**: expand/collapse tweens driven by explicit frame ticks
//!   ([`ToggleAnimator`]).
//! - **Session**: [`Visualizer`] ties it together behind refresh, pointer
//!   and tick events.
//!
//! # How it fits in the system
//! `tracevis-web` wraps a [`Visualizer`] for the browser and measures text
//! with a canvas; `tracevis-cli` replays recorded traces on a monospace grid
//! and prints the resulting layout.

pub mod animation;
pub mod animator;
pub mod boxes;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod measure;
pub mod registry;
pub mod trace;
pub mod visibility;
pub mod visualizer;

pub use animation::{Animation, Easing, FrameClock, Tween};
pub use animator::{Direction, ToggleAnimator, ToggleState};
pub use boxes::{BoxId, BoxTree, FragmentId, InputFragment, VisualBox};
pub use builder::{TreeBuilder, WHITESPACE_GLYPH};
pub use config::{ConfigError, VisualizerConfig};
pub use engine::{EngineError, GrammarRegistry, RecordedEngine, TraceEngine};
pub use error::{Result, VisError};
pub use geometry::{Px, Rect, Size};
pub use layout::{BoxClasses, BoxRect, FragmentRect, Layout, LayoutSnapshot};
pub use measure::{
    MeasurementService, MeasuringArea, MonospaceConfig, MonospaceMeasurer, TextMeasurer, TextRole,
};
pub use trace::{ExprKind, MatchOutcome, TraceDocument, TraceNode};
pub use visibility::{HiddenReason, Visibility, classify, is_blackhole};
pub use visualizer::Visualizer;
