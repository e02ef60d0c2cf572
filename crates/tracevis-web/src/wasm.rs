#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`TraceVisualizer`].
//!
//! This module wraps [`super::session::WebSession`] with JS-friendly types,
//! measures text with the canvas 2D context and paints snapshots back onto
//! the same canvas. Only compiled on `wasm32` targets.

use js_sys::Reflect;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use tracevis_core::{
    LayoutSnapshot, MonospaceConfig, Px, Size, TextMeasurer, TextRole, VisualizerConfig,
};

use super::session::{MeasureCache, WebSession, canvas_extent};

const LABEL_FONT: &str = "12px sans-serif";
const PRIMITIVE_FONT: &str = "12px monospace";
const INPUT_FONT: &str = "14px monospace";

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ---------------------------------------------------------------------------
// Canvas measurement
// ---------------------------------------------------------------------------

/// Measures text with `CanvasRenderingContext2d::measureText`.
///
/// Canvas reports advance widths only, so heights come from the configured
/// line height (plus padding for labels).
struct CanvasMeasurer {
    ctx: CanvasRenderingContext2d,
    metrics: MonospaceConfig,
}

impl CanvasMeasurer {
    fn font_for(role: TextRole) -> &'static str {
        match role {
            TextRole::Label => LABEL_FONT,
            TextRole::PrimitiveLabel => PRIMITIVE_FONT,
            TextRole::Input | TextRole::Whitespace => INPUT_FONT,
        }
    }
}

impl TextMeasurer for CanvasMeasurer {
    fn measure(&self, text: &str, role: TextRole) -> Size {
        self.ctx.set_font(Self::font_for(role));
        let width = self
            .ctx
            .measure_text(text)
            .map(|m| m.width())
            .unwrap_or_default();
        let m = &self.metrics;
        match role {
            TextRole::Label | TextRole::PrimitiveLabel => Size::new(
                width + 2.0 * m.label_padding,
                m.line_height + 2.0 * m.label_padding,
            ),
            TextRole::Input | TextRole::Whitespace => Size::new(width, m.line_height),
        }
    }
}

// ---------------------------------------------------------------------------
// Painting
// ---------------------------------------------------------------------------

/// Grow the canvas to fit `snapshot`, then clear all of it so pixels from a
/// larger previous frame never survive a collapse.
fn prepare_canvas(
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    snapshot: &LayoutSnapshot,
) {
    let current = (canvas.width(), canvas.height());
    let (width, height) = canvas_extent(current, snapshot);
    if width != current.0 {
        canvas.set_width(width);
    }
    if height != current.1 {
        canvas.set_height(height);
    }
    // Resizing resets context state; `paint` sets everything it uses.
    ctx.clear_rect(0.0, 0.0, f64::from(width), f64::from(height));
}

fn paint(ctx: &CanvasRenderingContext2d, snapshot: &LayoutSnapshot, padding: Px) {
    ctx.set_text_baseline("top");

    ctx.set_font(INPUT_FONT);
    for fragment in &snapshot.ribbon {
        let r = fragment.rect;
        if fragment.highlighted {
            ctx.set_fill_style_str("#fde68a");
            ctx.fill_rect(r.x, r.y, r.width, r.height);
        }
        ctx.set_fill_style_str(if fragment.whitespace { "#9ca3af" } else { "#111827" });
        let _ = ctx.fill_text(&fragment.text, r.x, r.y);
    }

    for b in &snapshot.boxes {
        let r = b.rect;
        ctx.set_stroke_style_str(if b.classes.failed { "#dc2626" } else { "#6b7280" });
        ctx.stroke_rect(r.x, r.y, r.width, r.height);
        ctx.set_font(if b.classes.primitive { PRIMITIVE_FONT } else { LABEL_FONT });
        ctx.set_fill_style_str(if b.classes.collapsed { "#6b7280" } else { "#1f2937" });
        let _ = ctx.fill_text(&b.label, r.x + padding, r.y + padding);
    }
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

/// Trace visualizer bound to one `<canvas>`.
#[wasm_bindgen]
pub struct TraceVisualizer {
    inner: WebSession<MeasureCache<CanvasMeasurer>>,
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    padding: Px,
}

#[wasm_bindgen]
impl TraceVisualizer {
    /// Bind to `canvas`. `config_json` is an optional JSON visualizer config.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        config_json: Option<String>,
    ) -> Result<TraceVisualizer, JsValue> {
        install_panic_hook();
        let config = match config_json.as_deref() {
            Some(json) => VisualizerConfig::from_json_str(json).map_err(to_js_error)?,
            None => VisualizerConfig::default(),
        };
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        let measurer = MeasureCache::new(CanvasMeasurer {
            ctx: ctx.clone(),
            metrics: config.monospace,
        });
        let padding = config.monospace.label_padding;
        Ok(Self {
            inner: WebSession::new(measurer, config),
            canvas,
            ctx,
            padding,
        })
    }

    /// Load a recorded trace (JSON). Returns `"success"` or `"failure"`.
    #[wasm_bindgen(js_name = loadTrace)]
    pub fn load_trace(&mut self, json: &str) -> Result<String, JsValue> {
        let outcome = self.inner.load_trace_json(json).map_err(to_js_error)?;
        serde_json::to_value(outcome)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| JsValue::from_str("unrepresentable outcome"))
    }

    /// Advance animations by `dt_ms` and repaint.
    /// Returns `true` while animations are still running.
    pub fn tick(&mut self, dt_ms: f64) -> bool {
        self.inner.tick_ms(dt_ms);
        self.render();
        self.inner.is_animating()
    }

    /// Toggle the box under the pointer. Returns its index, if any.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<u32> {
        let outcome = self.inner.pointer_down(x, y).map(|o| o.box_index);
        self.render();
        outcome
    }

    /// Move the hover highlight. Returns the hovered box index, if any.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<u32> {
        let hovered = self.inner.pointer_move(x, y);
        self.render();
        hovered
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) {
        self.inner.pointer_leave();
        self.render();
    }

    #[wasm_bindgen(js_name = isAnimating)]
    pub fn is_animating(&self) -> bool {
        self.inner.is_animating()
    }

    /// Current layout as JSON.
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.inner.snapshot_json().map_err(to_js_error)
    }

    /// Repaint the current layout.
    pub fn render(&self) {
        let snapshot = self.inner.snapshot();
        prepare_canvas(&self.canvas, &self.ctx, &snapshot);
        paint(&self.ctx, &snapshot, self.padding);
    }
}
