#![forbid(unsafe_code)]

//! Platform-independent browser session.
//!
//! Everything the `wasm-bindgen` exports do lives here, behind plain Rust
//! types, so the event handling can be tested natively. The host forwards
//! pointer events in canvas pixels and calls [`WebSession::tick_ms`] from
//! `requestAnimationFrame` with the elapsed milliseconds.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracevis_core::{
    BoxId, Direction, LayoutSnapshot, MatchOutcome, Px, Size, TextMeasurer, TextRole,
    TraceDocument, VisError, Visualizer, VisualizerConfig,
};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed trace: {0}")]
    Trace(#[source] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] tracevis_core::ConfigError),

    #[error("no box at path {0:?}")]
    NoSuchPath(Vec<usize>),

    #[error(transparent)]
    Vis(#[from] VisError),
}

// ---------------------------------------------------------------------------
// Measurement cache
// ---------------------------------------------------------------------------

/// Memoizes a slow measurer (canvas `measureText` crosses into JS).
///
/// Results depend only on text and role, so entries never go stale while
/// the wrapped measurer's fonts stay the same. When full, the least recently
/// used entry is evicted. Lookups borrow the text; only misses allocate.
#[derive(Debug)]
pub struct MeasureCache<M> {
    inner: M,
    entries: RefCell<HashMap<TextRole, HashMap<String, CachedSize>>>,
    len: Cell<usize>,
    clock: Cell<u64>,
    capacity: usize,
}

#[derive(Debug, Clone, Copy)]
struct CachedSize {
    size: Size,
    last_used: u64,
}

impl<M: TextMeasurer> MeasureCache<M> {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn new(inner: M) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: M, capacity: usize) -> Self {
        Self {
            inner,
            entries: RefCell::new(HashMap::new()),
            len: Cell::new(0),
            clock: Cell::new(0),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len.get()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len.get() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    fn stamp(&self) -> u64 {
        let now = self.clock.get().wrapping_add(1);
        self.clock.set(now);
        now
    }

    fn evict_lru(entries: &mut HashMap<TextRole, HashMap<String, CachedSize>>) -> bool {
        let oldest = entries
            .iter()
            .flat_map(|(role, by_text)| {
                by_text
                    .iter()
                    .map(move |(text, cached)| (cached.last_used, *role, text))
            })
            .min_by_key(|(last_used, _, _)| *last_used)
            .map(|(_, role, text)| (role, text.clone()));
        let Some((role, text)) = oldest else {
            return false;
        };
        entries
            .get_mut(&role)
            .is_some_and(|by_text| by_text.remove(&text).is_some())
    }
}

impl<M: TextMeasurer> TextMeasurer for MeasureCache<M> {
    fn measure(&self, text: &str, role: TextRole) -> Size {
        let now = self.stamp();
        if let Some(cached) = self
            .entries
            .borrow_mut()
            .get_mut(&role)
            .and_then(|by_text| by_text.get_mut(text))
        {
            cached.last_used = now;
            return cached.size;
        }
        let size = self.inner.measure(text, role);
        let mut entries = self.entries.borrow_mut();
        if self.len.get() >= self.capacity && Self::evict_lru(&mut entries) {
            self.len.set(self.len.get() - 1);
        }
        entries.entry(role).or_default().insert(
            text.to_string(),
            CachedSize {
                size,
                last_used: now,
            },
        );
        self.len.set(self.len.get() + 1);
        size
    }
}

/// Canvas backing-store size that fits `snapshot` without shrinking below
/// the current `(width, height)`.
#[must_use]
pub fn canvas_extent(current: (u32, u32), snapshot: &LayoutSnapshot) -> (u32, u32) {
    let fit = |px: Px| {
        if px.is_finite() && px > 0.0 {
            px.ceil().min(f64::from(u32::MAX)) as u32
        } else {
            0
        }
    };
    (
        current.0.max(fit(snapshot.width)),
        current.1.max(fit(snapshot.height)),
    )
}

// ---------------------------------------------------------------------------
// WebSession
// ---------------------------------------------------------------------------

/// What a pointer-down did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointerOutcome {
    #[serde(rename = "box")]
    pub box_index: u32,
    pub direction: Direction,
}

pub struct WebSession<M> {
    vis: Visualizer<M>,
}

impl<M: TextMeasurer> WebSession<M> {
    pub fn new(measurer: M, config: VisualizerConfig) -> Self {
        Self {
            vis: Visualizer::new(measurer, config),
        }
    }

    /// Replace the tree with a recorded trace document.
    pub fn load_trace_json(&mut self, json: &str) -> Result<MatchOutcome, SessionError> {
        let document = TraceDocument::from_json_str(json).map_err(SessionError::Trace)?;
        let outcome = document.outcome();
        self.vis.load_trace(document.nodes(), outcome);
        Ok(outcome)
    }

    pub fn pointer_down(&mut self, x: Px, y: Px) -> Option<PointerOutcome> {
        let (id, direction) = self.vis.click_at(x, y)?;
        tracing::debug!(%id, ?direction, x, y, "pointer down");
        Some(PointerOutcome {
            box_index: id.index(),
            direction,
        })
    }

    /// Moves the hover highlight. Returns the hovered box index, if any.
    pub fn pointer_move(&mut self, x: Px, y: Px) -> Option<u32> {
        self.vis.hover_at(x, y).map(BoxId::index)
    }

    pub fn pointer_leave(&mut self) {
        // Clearing never names a box, so it cannot fail.
        let _ = self.vis.hover(None);
    }

    /// Toggle the box at a child-index path from the top level.
    pub fn toggle_path(&mut self, path: &[usize]) -> Result<Direction, SessionError> {
        let id = self
            .vis
            .box_at_path(path)
            .ok_or_else(|| SessionError::NoSuchPath(path.to_vec()))?;
        Ok(self.vis.click(id)?)
    }

    /// Advance one animation frame. Negative or non-finite deltas count as zero.
    /// Returns how many boxes settled.
    pub fn tick_ms(&mut self, dt_ms: f64) -> usize {
        let dt = if dt_ms.is_finite() && dt_ms > 0.0 {
            Duration::from_secs_f64(dt_ms / 1000.0)
        } else {
            Duration::ZERO
        };
        self.vis.tick(dt).len()
    }

    #[must_use]
    pub fn is_animating(&self) -> bool {
        !self.vis.is_settled()
    }

    #[must_use]
    pub fn snapshot(&self) -> LayoutSnapshot {
        self.vis.snapshot()
    }

    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.vis.snapshot())
    }

    #[must_use]
    pub fn visualizer(&self) -> &Visualizer<M> {
        &self.vis
    }
}
