#![forbid(unsafe_code)]

//! Interactive visualization session.
//!
//! A [`Visualizer`] owns everything one view needs: the current box tree,
//! the measurement service, the toggle animator and the frame clock. Hosts
//! drive it with three kinds of events:
//!
//! - **refresh / load**: a new trace replaces the tree wholesale;
//! - **pointer**: click toggles a box, hover highlights its input fragment;
//! - **tick**: advances animations by an explicit frame delta.
//!
//! Nothing reads wall-clock time, so a recorded event sequence replays to
//! the same layout on every host.
//!
//! # Invariants
//!
//! 1. Rebuilding cancels every in-flight animation before the old tree is
//!    dropped; ids from the old tree are reported as stale afterwards.
//! 2. After every rebuild, every box's fragment is pinned to the box's
//!    displayed width.
//! 3. At most one fragment is highlighted at a time.

use std::time::Duration;

use crate::animation::FrameClock;
use crate::animator::{Direction, ToggleAnimator, ToggleState};
use crate::boxes::{BoxId, BoxTree};
use crate::builder::TreeBuilder;
use crate::config::VisualizerConfig;
use crate::engine::{GrammarRegistry, TraceEngine, extract_trace};
use crate::error::{Result, VisError};
use crate::geometry::Px;
use crate::layout::{Layout, LayoutSnapshot};
use crate::measure::{MeasurementService, MeasuringArea, MonospaceMeasurer, TextMeasurer};
use crate::registry::initialize_widths;
use crate::trace::{MatchOutcome, TraceNode};

/// Upper bound on frames [`Visualizer::settle`] will run.
const MAX_SETTLE_FRAMES: usize = 100_000;

pub struct Visualizer<M> {
    config: VisualizerConfig,
    service: MeasurementService<M>,
    builder: TreeBuilder,
    pristine_registry: GrammarRegistry,
    registry: GrammarRegistry,
    tree: BoxTree,
    animator: ToggleAnimator,
    clock: FrameClock,
    hovered: Option<BoxId>,
    outcome: Option<MatchOutcome>,
}

impl Visualizer<MonospaceMeasurer> {
    /// A session measuring text on the configured monospace grid.
    #[must_use]
    pub fn monospace(config: VisualizerConfig) -> Self {
        let measurer = MonospaceMeasurer::new(config.monospace);
        Self::new(measurer, config)
    }
}

impl<M: TextMeasurer> Visualizer<M> {
    #[must_use]
    pub fn new(measurer: M, config: VisualizerConfig) -> Self {
        let animator =
            ToggleAnimator::new(config.toggle_duration()).with_easing(config.easing.function());
        let builder = TreeBuilder::new(config.whitespace_glyph.clone());
        Self {
            config,
            service: MeasurementService::new(measurer),
            builder,
            pristine_registry: GrammarRegistry::new(),
            registry: GrammarRegistry::new(),
            tree: BoxTree::new(0),
            animator,
            clock: FrameClock::new(),
            hovered: None,
            outcome: None,
        }
    }

    /// Use `registry` as the state every parse starts from.
    #[must_use]
    pub fn with_registry(mut self, registry: GrammarRegistry) -> Self {
        self.registry = registry.clone();
        self.pristine_registry = registry;
        self
    }

    // ------------------------------------------------------------------
    // Rebuild
    // ------------------------------------------------------------------

    /// Re-parse and rebuild the tree.
    ///
    /// The working registry is reset to its pristine state first. A match
    /// failure still renders its trace; any other engine error leaves the
    /// current tree untouched.
    pub fn refresh<E: TraceEngine + ?Sized>(
        &mut self,
        engine: &E,
        grammar_source: &str,
        input: &str,
        start_rule: &str,
    ) -> Result<MatchOutcome> {
        let _span =
            tracing::info_span!("tracevis.refresh", start_rule, input_len = input.len()).entered();
        self.registry = self.pristine_registry.clone();
        let result = engine.match_contents(&mut self.registry, grammar_source, input, start_rule);
        let (outcome, trace) = extract_trace(result).map_err(|err| {
            tracing::warn!(error = %err, "engine failed; keeping previous tree");
            VisError::Engine(err)
        })?;
        self.rebuild(&trace, outcome);
        Ok(outcome)
    }

    /// Rebuild from a trace obtained elsewhere.
    pub fn load_trace(&mut self, trace: &[TraceNode], outcome: MatchOutcome) {
        self.rebuild(trace, outcome);
    }

    fn rebuild(&mut self, trace: &[TraceNode], outcome: MatchOutcome) {
        self.animator.cancel_all();
        let generation = self.tree.generation().wrapping_add(1);
        let mut tree = self.builder.build(trace, generation);
        initialize_widths(&mut tree, &mut self.service);
        self.tree = tree;
        self.hovered = None;
        self.outcome = Some(outcome);
        tracing::info!(
            generation,
            ?outcome,
            boxes = self.tree.len(),
            "rebuilt visualization"
        );
    }

    // ------------------------------------------------------------------
    // Pointer events
    // ------------------------------------------------------------------

    fn check(&self, id: BoxId) -> Result<()> {
        if self.tree.contains(id) {
            Ok(())
        } else if id.generation() != self.tree.generation() {
            tracing::warn!(%id, generation = self.tree.generation(), "stale box id");
            Err(VisError::StaleBox(id))
        } else {
            Err(VisError::UnknownBox(id))
        }
    }

    /// Toggle a box between expanded and collapsed.
    pub fn click(&mut self, id: BoxId) -> Result<Direction> {
        self.check(id)?;
        Ok(self.animator.toggle(&mut self.tree, &mut self.service, id))
    }

    /// Toggle the innermost box under the point, if any.
    pub fn click_at(&mut self, x: Px, y: Px) -> Option<(BoxId, Direction)> {
        let id = self.layout().hit_test(x, y)?;
        let direction = self.animator.toggle(&mut self.tree, &mut self.service, id);
        Some((id, direction))
    }

    /// Highlight the input fragment of `id`, or clear the highlight.
    pub fn hover(&mut self, id: Option<BoxId>) -> Result<()> {
        if let Some(id) = id {
            self.check(id)?;
        }
        if let Some(previous) = self.hovered.take() {
            let input = self.tree[previous].input;
            self.tree.fragment_mut(input).highlighted = false;
        }
        if let Some(id) = id {
            let input = self.tree[id].input;
            self.tree.fragment_mut(input).highlighted = true;
            self.hovered = Some(id);
        }
        Ok(())
    }

    /// Hover whatever box lies under the point.
    pub fn hover_at(&mut self, x: Px, y: Px) -> Option<BoxId> {
        let id = self.layout().hit_test(x, y);
        // The id was just produced by this tree, so it cannot be rejected.
        let _ = self.hover(id);
        id
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Advance animations by one frame of length `dt`. Returns settled boxes.
    pub fn tick(&mut self, dt: Duration) -> Vec<BoxId> {
        self.clock.advance(dt);
        self.animator.tick(&mut self.tree, &mut self.service, dt)
    }

    /// Tick with fixed-size frames until every animation has settled.
    /// Returns the number of frames run.
    pub fn settle(&mut self, frame: Duration) -> usize {
        let frame = frame.max(Duration::from_millis(1));
        let mut frames = 0;
        while !self.animator.is_idle() && frames < MAX_SETTLE_FRAMES {
            self.tick(frame);
            frames += 1;
        }
        frames
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.animator.is_idle()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn state(&self, id: BoxId) -> Result<ToggleState> {
        self.check(id)?;
        Ok(self.animator.state_of(&self.tree, id))
    }

    #[must_use]
    pub fn tree(&self) -> &BoxTree {
        &self.tree
    }

    #[must_use]
    pub fn layout(&self) -> Layout<'_> {
        self.service.layout(&self.tree)
    }

    /// Arrange the current frame, with transition states filled in.
    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        let mut snapshot = self.layout().arrange();
        for id in self.animator.animating() {
            let state = self.animator.state_of(&self.tree, id);
            if let Some(rect) = snapshot.boxes.iter_mut().find(|r| r.id == id.index()) {
                rect.state = state;
            }
        }
        snapshot
    }

    /// Concatenated ribbon text.
    #[must_use]
    pub fn input_text(&self) -> String {
        self.tree.input_text()
    }

    /// Follow child indices from the top-level boxes.
    #[must_use]
    pub fn box_at_path(&self, path: &[usize]) -> Option<BoxId> {
        self.tree.box_at_path(path)
    }

    #[must_use]
    pub fn hovered(&self) -> Option<BoxId> {
        self.hovered
    }

    /// Outcome of the last successful refresh, if any.
    #[must_use]
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn registry(&self) -> &GrammarRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    #[must_use]
    pub fn measuring_area(&self) -> &MeasuringArea {
        self.service.area()
    }
}
