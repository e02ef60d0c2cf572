#![forbid(unsafe_code)]

//! Browser frontend for tracevis.
//!
//! This crate provides [`session::WebSession`], the host-agnostic event
//! handling shared by the browser build and native tests, and (on `wasm32`)
//! `TraceVisualizer`, a `wasm-bindgen`-exported struct that measures and
//! paints with a canvas 2D context.
//!
//! The host owns the frame loop: it forwards pointer events in canvas pixels
//! and calls `tick(dt_ms)` from `requestAnimationFrame` while `tick` keeps
//! returning `true`.

pub mod session;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::TraceVisualizer;

pub use session::{MeasureCache, PointerOutcome, SessionError, WebSession, canvas_extent};
