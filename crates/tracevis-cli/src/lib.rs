#![forbid(unsafe_code)]

//! Command-line replay of recorded parse traces.
//!
//! `tracevis render` builds the same box tree and layout the browser view
//! shows, on a monospace grid, so traces can be inspected and diffed in a
//! terminal. `tracevis classify` explains which trace nodes get a box.

pub mod cli;
pub mod error;
pub mod render;

pub use cli::{run, run_from_env};
pub use error::{CliError, Result};
