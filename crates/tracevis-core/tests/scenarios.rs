//! End-to-end scenarios over the visualization session.
//!
//! Each test builds a session from a hand-written trace shaped like what a
//! PEG engine records, then drives it through refresh, pointer and frame
//! events and checks the resulting tree and layout.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tracevis_core::{
    BoxId, Direction, EngineError, ExprKind, GrammarRegistry, MatchOutcome, MonospaceMeasurer,
    TextMeasurer, TextRole, ToggleState, TraceDocument, TraceEngine, TraceNode, VisError,
    Visualizer, VisualizerConfig,
};

const FRAME: Duration = Duration::from_millis(16);

// ── Helpers ─────────────────────────────────────────────────────────────

fn prim(label: &str, text: &str) -> TraceNode {
    TraceNode::new(ExprKind::Primitive, label, text).with_source(0, 1)
}

fn rule(label: &str, text: &str) -> TraceNode {
    TraceNode::new(ExprKind::Other, label, text).with_source(0, 1)
}

/// `Expr = number "+" number` matched against `12+34`, with the failed
/// attempts an engine records along the way.
fn arithmetic_trace() -> Vec<TraceNode> {
    vec![
        rule("Expr", "12+34").child(
            TraceNode::new(ExprKind::Sequence, "number \"+\" number", "12+34")
                .child(prim("number", "12"))
                .child(prim("\"-\"", "").failed())
                .child(prim("\"+\"", "+"))
                .child(prim("number", "34")),
        ),
    ]
}

fn session(trace: &[TraceNode]) -> Visualizer<MonospaceMeasurer> {
    let mut vis = Visualizer::monospace(VisualizerConfig::default());
    vis.load_trace(trace, MatchOutcome::Success);
    vis
}

fn labels(vis: &Visualizer<MonospaceMeasurer>, ids: &[BoxId]) -> Vec<String> {
    ids.iter().map(|&id| vis.tree()[id].label.clone()).collect()
}

fn size_of(vis: &Visualizer<MonospaceMeasurer>, id: BoxId) -> (f64, f64) {
    let layout = vis.layout();
    (layout.rendered_width(id), layout.rendered_height(id))
}

fn assert_widths_cover_input(vis: &Visualizer<MonospaceMeasurer>) {
    let measurer = MonospaceMeasurer::default();
    let tree = vis.tree();
    let layout = vis.layout();
    for id in tree.ids() {
        let text = tree.display_text(tree[id].input);
        let text_width = measurer.measure(&text, TextRole::Input).width;
        assert!(
            layout.rendered_width(id) >= text_width,
            "{id} narrower than its input {text:?}"
        );
    }
}

fn assert_fragments_pinned(vis: &Visualizer<MonospaceMeasurer>) {
    let tree = vis.tree();
    let layout = vis.layout();
    for id in tree.ids() {
        assert_eq!(
            tree.fragment(tree[id].input).min_width,
            Some(layout.displayed_width(id)),
            "fragment of {id} not pinned"
        );
    }
}

// ── Tree shape ──────────────────────────────────────────────────────────

#[test]
fn arithmetic_expression_renders_three_leaves() {
    let vis = session(&arithmetic_trace());
    let tree = vis.tree();
    assert_eq!(labels(&vis, tree.roots()), vec!["Expr"]);

    let root = tree.roots()[0];
    assert!(!tree[root].is_primitive);
    assert_eq!(
        labels(&vis, &tree[root].children),
        vec!["number", "\"+\"", "number"]
    );
    let consumed: Vec<String> = tree[root]
        .children
        .iter()
        .map(|&id| tree.matched_text(tree[id].input))
        .collect();
    assert_eq!(consumed, vec!["12", "+", "34"]);
    assert!(tree[root].children.iter().all(|&id| tree[id].is_primitive));
    assert_eq!(vis.input_text(), "12+34");
}

#[test]
fn arithmetic_layout() {
    let vis = session(&arithmetic_trace());
    let snapshot = vis.snapshot();
    let rects: Vec<(String, f64, f64, f64)> = snapshot
        .boxes
        .iter()
        .map(|b| (b.label.clone(), b.rect.x, b.rect.y, b.rect.width))
        .collect();
    assert_eq!(
        rects,
        vec![
            ("Expr".to_string(), 0.0, 16.0, 144.0),
            ("number".to_string(), 0.0, 40.0, 56.0),
            ("\"+\"".to_string(), 56.0, 40.0, 32.0),
            ("number".to_string(), 88.0, 40.0, 56.0),
        ]
    );
    assert_eq!(snapshot.height, 64.0);
    let ribbon: String = snapshot.ribbon.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(ribbon, "12+34");
    assert_eq!(snapshot.boxes[2].classes.css_classes(), vec!["pexpr", "prim"]);
}

#[test]
fn blackhole_subtree_is_flattened_into_parent_ribbon() {
    let letter = rule("letter_", "ab")
        .child(rule("lower", "a").child(prim("\"a\"", "a")))
        .child(rule("lower", "b").child(prim("\"b\"", "b")));
    let trace = vec![rule("ident", "ab1").child(letter).child(prim("digit", "1"))];
    let vis = session(&trace);
    let tree = vis.tree();

    assert!(tree.ids().all(|id| !tree[id].label.ends_with('_')));
    assert!(tree.ids().all(|id| tree[id].label != "lower"));
    let root = tree.roots()[0];
    assert_eq!(labels(&vis, &tree[root].children), vec!["digit"]);
    assert_eq!(vis.input_text(), "ab1");
    // The letters still sit in the root's span of the ribbon.
    assert_eq!(tree.matched_text(tree[root].input), "ab1");
}

#[test]
fn failed_blackhole_produces_nothing() {
    let trace = vec![
        rule("ident", "1")
            .child(rule("letter_", "").failed())
            .child(prim("digit", "1")),
    ];
    let vis = session(&trace);
    assert_eq!(vis.tree().len(), 2);
}

#[test]
fn repetition_shown_only_when_it_consumed_input() {
    let star = |text: &str| {
        let digits = text.chars().map(|c| prim("digit", &c.to_string())).collect();
        TraceNode::new(ExprKind::Repetition, "digit*", text)
            .with_source(0, 6)
            .with_children(digits)
    };

    let empty = session(&[rule("Num", "").child(star(""))]);
    let root = empty.tree().roots()[0];
    assert!(empty.tree()[root].children.is_empty());

    let full = session(&[rule("Num", "12").child(star("12"))]);
    let tree = full.tree();
    let root = tree.roots()[0];
    assert_eq!(labels(&full, &tree[root].children), vec!["digit*"]);
    let rep = tree[root].children[0];
    assert!(!tree[rep].is_primitive);
    assert_eq!(labels(&full, &tree[rep].children), vec!["digit", "digit"]);
}

#[test]
fn whitespace_is_boxed_and_shown_as_glyph() {
    let spaces = rule("spaces", " ").child(prim("space", " "));
    let trace = vec![
        rule("Pair", "a b")
            .child(prim("\"a\"", "a"))
            .child(spaces)
            .child(prim("\"b\"", "b")),
    ];
    let vis = session(&trace);
    let snapshot = vis.snapshot();
    let ribbon: String = snapshot.ribbon.iter().map(|f| f.text.as_str()).collect();
    assert_eq!(ribbon, "a\u{b7}b");
    assert_eq!(vis.input_text(), "a b");
    assert!(snapshot.boxes.iter().any(|b| b.classes.whitespace));
}

// ── Toggling ────────────────────────────────────────────────────────────

#[test]
fn toggle_round_trip_restores_size() {
    let mut vis = session(&arithmetic_trace());
    let root = vis.box_at_path(&[0]).unwrap();
    let before = size_of(&vis, root);

    assert_eq!(vis.click(root).unwrap(), Direction::Collapse);
    vis.settle(FRAME);
    assert_eq!(size_of(&vis, root), (40.0, 24.0));
    assert_fragments_pinned(&vis);

    assert_eq!(vis.click(root).unwrap(), Direction::Expand);
    vis.settle(FRAME);
    assert_eq!(size_of(&vis, root), before);
    assert_fragments_pinned(&vis);
}

#[test]
fn collapsed_root_shrinks_ribbon_to_its_width() {
    let mut vis = session(&arithmetic_trace());
    let root = vis.box_at_path(&[0]).unwrap();
    vis.click(root).unwrap();
    vis.settle(FRAME);

    let snapshot = vis.snapshot();
    assert_eq!(snapshot.boxes.len(), 1);
    assert_eq!(snapshot.width, 40.0);
    assert_eq!(snapshot.height, 40.0);
    assert_eq!(snapshot.ribbon[0].rect.width, 40.0);
    let hidden = vis.box_at_path(&[0, 0]).unwrap();
    assert!(!vis.layout().is_displayed(hidden));
    assert_eq!(vis.layout().displayed_width(hidden), 0.0);
}

#[test]
fn width_invariant_holds_every_frame() {
    let mut vis = session(&arithmetic_trace());
    let root = vis.box_at_path(&[0]).unwrap();
    vis.click(root).unwrap();
    while !vis.is_settled() {
        vis.tick(Duration::from_millis(11));
        assert_widths_cover_input(&vis);
        let width = vis.layout().rendered_width(root);
        assert_eq!(vis.tree().fragment(vis.tree()[root].input).min_width, Some(width));
    }
    assert_fragments_pinned(&vis);
}

#[test]
fn overlapping_toggles_on_one_box_reverse() {
    let mut vis = session(&arithmetic_trace());
    let root = vis.box_at_path(&[0]).unwrap();
    let before = size_of(&vis, root);

    vis.click(root).unwrap();
    for _ in 0..8 {
        vis.tick(FRAME);
    }
    assert_eq!(vis.state(root).unwrap(), ToggleState::Collapsing);
    assert_eq!(vis.click(root).unwrap(), Direction::Expand);
    assert_eq!(vis.state(root).unwrap(), ToggleState::Expanding);

    vis.settle(FRAME);
    assert_eq!(vis.state(root).unwrap(), ToggleState::Expanded);
    assert_eq!(size_of(&vis, root), before);
}

#[test]
fn nested_boxes_animate_independently() {
    let trace = vec![
        rule("Pair", "ab")
            .child(rule("Left", "a").child(prim("\"a\"", "a")))
            .child(rule("Right", "b").child(prim("\"b\"", "b"))),
    ];
    let mut vis = session(&trace);
    let left = vis.box_at_path(&[0, 0]).unwrap();
    let right = vis.box_at_path(&[0, 1]).unwrap();

    vis.click(left).unwrap();
    for _ in 0..4 {
        vis.tick(FRAME);
    }
    vis.click(right).unwrap();
    assert_eq!(vis.state(left).unwrap(), ToggleState::Collapsing);
    assert_eq!(vis.state(right).unwrap(), ToggleState::Collapsing);

    let mut settled = Vec::new();
    while !vis.is_settled() {
        settled.extend(vis.tick(FRAME));
        assert_widths_cover_input(&vis);
    }
    assert_eq!(settled, vec![left, right]);
    assert_fragments_pinned(&vis);
}

#[test]
fn clicking_a_child_leaves_parent_state_alone() {
    let mut vis = session(&arithmetic_trace());
    let root = vis.box_at_path(&[0]).unwrap();
    let plus = vis.box_at_path(&[0, 1]).unwrap();
    vis.click(plus).unwrap();
    vis.settle(FRAME);
    assert_eq!(vis.state(plus).unwrap(), ToggleState::Collapsed);
    assert_eq!(vis.state(root).unwrap(), ToggleState::Expanded);
}

// ── Re-parsing ──────────────────────────────────────────────────────────

struct Scripted {
    document: TraceDocument,
}

impl TraceEngine for Scripted {
    fn match_contents(
        &self,
        registry: &mut GrammarRegistry,
        grammar_source: &str,
        _input: &str,
        _start_rule: &str,
    ) -> Result<Vec<TraceNode>, EngineError> {
        if grammar_source.is_empty() {
            return Err(EngineError::Other("empty grammar".into()));
        }
        registry.register("Scratch", grammar_source);
        match self.document.outcome() {
            MatchOutcome::Success => Ok(self.document.nodes().to_vec()),
            MatchOutcome::Failure => Err(EngineError::MatchFailure {
                trace: self.document.nodes().to_vec(),
            }),
        }
    }
}

#[test]
fn reparse_mid_animation_invalidates_old_ids() {
    let engine = Scripted {
        document: TraceDocument::Bare(arithmetic_trace()),
    };
    let mut vis = Visualizer::monospace(VisualizerConfig::default());
    vis.refresh(&engine, "G", "12+34", "Expr").unwrap();
    let root = vis.box_at_path(&[0]).unwrap();
    vis.click(root).unwrap();
    vis.tick(FRAME);

    vis.refresh(&engine, "G", "12+34", "Expr").unwrap();
    assert!(vis.is_settled());
    assert!(matches!(vis.click(root), Err(VisError::StaleBox(id)) if id == root));
    assert!(matches!(vis.state(root), Err(VisError::StaleBox(_))));

    let fresh = vis.box_at_path(&[0]).unwrap();
    assert_eq!(vis.state(fresh).unwrap(), ToggleState::Expanded);
    assert_eq!(size_of(&vis, fresh), (144.0, 48.0));
    assert_fragments_pinned(&vis);
}

#[test]
fn match_failure_renders_partial_trace() {
    let engine = Scripted {
        document: TraceDocument::Recorded {
            outcome: MatchOutcome::Failure,
            trace: vec![rule("Expr", "12").child(prim("number", "12"))],
        },
    };
    let mut vis = Visualizer::monospace(VisualizerConfig::default());
    assert_eq!(
        vis.refresh(&engine, "G", "12+", "Expr").unwrap(),
        MatchOutcome::Failure
    );
    assert_eq!(vis.input_text(), "12");
    assert_eq!(vis.outcome(), Some(MatchOutcome::Failure));
}

#[test]
fn fatal_engine_error_keeps_tree_and_resets_registry() {
    let engine = Scripted {
        document: TraceDocument::Bare(arithmetic_trace()),
    };
    let mut vis = Visualizer::monospace(VisualizerConfig::default());
    vis.refresh(&engine, "G", "12+34", "Expr").unwrap();
    assert!(vis.registry().contains("Scratch"));

    let err = vis.refresh(&engine, "", "12+34", "Expr").unwrap_err();
    assert_eq!(err.to_string(), "parsing engine failed: engine error: empty grammar");
    assert!(!vis.registry().contains("Scratch"));
    assert_eq!(vis.tree().len(), 4);
}

// ── Recorded traces ─────────────────────────────────────────────────────

#[test]
fn recorded_json_document_loads() {
    let json = r#"{
        "outcome": "success",
        "trace": [{
            "succeeded": true,
            "displayString": "Greeting",
            "expr": { "kind": "other", "sourceInterval": { "start": 0, "end": 8 } },
            "interval": { "contents": "hi" },
            "children": [{
                "succeeded": true,
                "displayString": "\"hi\"",
                "expr": { "kind": "primitive", "sourceInterval": { "start": 11, "end": 15 } },
                "interval": { "contents": "hi" }
            }]
        }]
    }"#;
    let document = TraceDocument::from_json_str(json).unwrap();
    let vis = session(document.nodes());
    assert_eq!(vis.input_text(), "hi");
    assert_eq!(vis.tree().len(), 2);
}
