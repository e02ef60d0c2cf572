//! `render` and `classify` subcommands.
//!
//! Both read a recorded trace document from disk. `render` builds the
//! visualization, replays clicks given as child-index paths and prints the
//! resulting layout; `classify` prints the visibility decision for every
//! node of the raw trace.

use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use tracevis_core::{
    BoxId, HiddenReason, LayoutSnapshot, MatchOutcome, TraceDocument, TraceNode, Visibility,
    Visualizer, VisualizerConfig, classify,
};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Recorded trace (JSON).
    #[arg(long)]
    pub trace: PathBuf,

    /// Visualizer config (TOML, or JSON with a `.json` extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Click the box at this child-index path, e.g. `0/1`. Repeatable.
    #[arg(long = "toggle", value_name = "PATH")]
    pub toggles: Vec<String>,

    /// Run frames until every animation has settled before printing.
    #[arg(long)]
    pub settle: bool,

    /// Frame length used when settling.
    #[arg(long = "frame-ms", default_value_t = 16)]
    pub frame_ms: u64,

    /// Print the layout snapshot as JSON instead of a tree.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Recorded trace (JSON).
    #[arg(long)]
    pub trace: PathBuf,
}

fn read_document(path: &Path) -> Result<TraceDocument> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(TraceDocument::from_json_str(&content)?)
}

/// Parse `0/1/2` into child indices.
pub fn parse_box_path(raw: &str) -> Result<Vec<usize>> {
    raw.split('/')
        .map(|segment| {
            segment.trim().parse::<usize>().map_err(|_| {
                CliError::invalid(format!("bad path segment `{segment}` in `{raw}`"))
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

pub fn run_render(args: &RenderArgs, out: &mut dyn Write) -> Result<()> {
    let config = match &args.config {
        Some(path) => VisualizerConfig::from_file(path)?,
        None => VisualizerConfig::default(),
    };
    let paths = args
        .toggles
        .iter()
        .map(|raw| parse_box_path(raw))
        .collect::<Result<Vec<_>>>()?;

    let document = read_document(&args.trace)?;
    let outcome = document.outcome();
    let mut vis = Visualizer::monospace(config);
    vis.load_trace(document.nodes(), outcome);

    for path in &paths {
        let id = vis.box_at_path(path).ok_or_else(|| {
            CliError::invalid(format!("no box at path {}", format_path(path)))
        })?;
        let direction = vis.click(id)?;
        tracing::info!(%id, ?direction, "applied toggle");
    }
    if args.settle {
        let frames = vis.settle(Duration::from_millis(args.frame_ms));
        tracing::info!(frames, "settled");
    }

    let snapshot = vis.snapshot();
    if args.json {
        serde_json::to_writer_pretty(&mut *out, &snapshot)?;
        writeln!(out)?;
    } else {
        out.write_all(dump(&vis, outcome, &snapshot).as_bytes())?;
    }
    Ok(())
}

fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn outcome_label(outcome: MatchOutcome) -> &'static str {
    match outcome {
        MatchOutcome::Success => "success",
        MatchOutcome::Failure => "failure",
    }
}

/// Indented text dump: header, ribbon, then one line per box.
pub fn dump<M: tracevis_core::TextMeasurer>(
    vis: &Visualizer<M>,
    outcome: MatchOutcome,
    snapshot: &LayoutSnapshot,
) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "outcome: {}  boxes: {}  size: {}x{}",
        outcome_label(outcome),
        snapshot.boxes.len(),
        snapshot.width,
        snapshot.height
    );
    let ribbon: String = snapshot.ribbon.iter().map(|f| f.text.as_str()).collect();
    let _ = writeln!(s, "input: {ribbon}");
    let tree = vis.tree();
    let ids: Vec<BoxId> = tree.ids().collect();
    for rect in &snapshot.boxes {
        let r = rect.rect;
        let text = ids
            .get(rect.id as usize)
            .map(|&id| tree.matched_text(tree[id].input))
            .unwrap_or_default();
        let _ = writeln!(
            s,
            "{:indent$}{} {:?} {}x{} @ ({}, {}) [{}] {}",
            "",
            rect.label,
            text,
            r.width,
            r.height,
            r.x,
            r.y,
            rect.classes.css_classes().join(" "),
            rect.state.as_str(),
            indent = rect.depth * 2
        );
    }
    s
}

// ---------------------------------------------------------------------------
// classify
// ---------------------------------------------------------------------------

pub fn run_classify(args: &ClassifyArgs, out: &mut dyn Write) -> Result<()> {
    let document = read_document(&args.trace)?;
    let mut s = String::new();
    for node in document.nodes() {
        classify_into(&mut s, node, 0);
    }
    out.write_all(s.as_bytes())?;
    Ok(())
}

fn visibility_label(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::VisibleLeaf => "leaf",
        Visibility::VisibleContainer => "container",
        Visibility::Hidden(HiddenReason::Failed) => "hidden (failed)",
        Visibility::Hidden(HiddenReason::Blackhole) => "hidden (blackhole)",
        Visibility::Hidden(HiddenReason::Structural) => "hidden (structural)",
        Visibility::Hidden(HiddenReason::EmptyRepetition) => "hidden (empty repetition)",
        Visibility::Hidden(HiddenReason::Synthetic) => "hidden (synthetic)",
    }
}

fn classify_into(s: &mut String, node: &TraceNode, depth: usize) {
    let _ = writeln!(
        s,
        "{:indent$}{} {:?} {:?}: {}",
        "",
        node.label(),
        node.kind(),
        node.contents(),
        visibility_label(classify(node)),
        indent = depth * 2
    );
    for child in &node.children {
        classify_into(s, child, depth + 1);
    }
}
