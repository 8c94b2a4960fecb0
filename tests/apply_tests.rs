//! Integration tests for the apply pipeline
//!
//! All tests start from `fixtures/recon.json`:
//!
//! ```text
//! custom-script-1 (collect-hosts)
//! ├── nmap-1 ← string-input-1 "example.com"
//! └── nmap-2 ← file-splitter-1
//! ```

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use weft::error::WeftError;
use weft::{
    plan_run, ConfigApplier, FleetMaxima, LayoutConfig, NoLocalFiles, PrimitiveKind,
    PrimitiveNode, RunConfig, WorkflowVersionGraph,
};

const RECON: &str = include_str!("fixtures/recon.json");
const RUN: &str = include_str!("fixtures/run.yaml");

fn recon() -> WorkflowVersionGraph {
    WorkflowVersionGraph::from_json(RECON).unwrap()
}

fn fleet() -> FleetMaxima {
    serde_yaml::from_str(include_str!("fixtures/fleet.yaml")).unwrap()
}

fn inputs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn apply(graph: &WorkflowVersionGraph, pairs: &[(&str, Value)]) -> weft::Result<weft::Applied> {
    ConfigApplier::new(&NoLocalFiles).apply(graph, &inputs(pairs))
}

// ═══════════════════════════════════════════════════════════════
// FIXTURE
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_fixture_is_consistent() {
    let graph = recon();
    assert!(graph.check_connections().is_ok());
    assert_eq!(graph.nodes.len(), 4);
    assert_eq!(graph.find_sources("nmap-1", "target"), vec!["string-input-1"]);
}

#[test]
fn test_edge_into_primitive_is_accepted() {
    let mut graph = recon().with_primitive(PrimitiveNode::new(
        "string-input-9",
        PrimitiveKind::String,
        json!("scan.log"),
    ));
    graph.connect("nmap-1", "file", "string-input-9", "value");

    let applied = apply(&graph, &[]).unwrap();
    assert!(!applied.changed);
    assert_eq!(applied.graph, graph);
}

#[test]
fn test_graph_json_round_trip_after_apply() {
    let applied = apply(&recon(), &[("nmap-1.target", json!("other.com"))]).unwrap();
    let json = applied.graph.to_json_pretty().unwrap();
    assert_eq!(WorkflowVersionGraph::from_json(&json).unwrap(), applied.graph);
    assert!(json.contains("input/nmap-1/target/string-input-2"));
}

// ═══════════════════════════════════════════════════════════════
// WIRING
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_replace_not_append() {
    let applied = apply(&recon(), &[("nmap-1.target", json!("other.com"))]).unwrap();
    let graph = &applied.graph;

    assert_eq!(graph.find_sources("nmap-1", "target"), vec!["string-input-2"]);
    assert_eq!(graph.primitive_nodes.len(), 1);
    assert_eq!(
        graph.primitive("string-input-2").unwrap().value,
        json!("other.com")
    );

    let mirrored: Vec<&str> = graph
        .node("nmap-1")
        .unwrap()
        .inputs
        .keys()
        .filter(|key| key.starts_with("target/"))
        .map(String::as_str)
        .collect();
    assert_eq!(mirrored, vec!["target/string-input-2"]);
}

#[test]
fn test_multi_value_splitter() {
    let applied = apply(
        &recon(),
        &[(
            "file-splitter.files",
            json!(["https://cdn.example.com/a.txt", "https://cdn.example.com/b.txt"]),
        )],
    )
    .unwrap();
    let graph = &applied.graph;

    let sources = graph.find_sources("file-splitter-1", "files");
    assert_eq!(sources, vec!["http-input-1", "http-input-2"]);

    let splitter = graph.node("file-splitter-1").unwrap();
    for (id, file) in [("http-input-1", "a.txt"), ("http-input-2", "b.txt")] {
        assert_eq!(
            splitter.inputs[&format!("files/{id}")].value,
            json!(format!("in/{id}/{file}"))
        );
    }
}

#[test]
fn test_multi_param_keeps_node_suppliers() {
    let applied = apply(
        &recon(),
        &[("collect-hosts.in", json!("https://cdn.example.com/extra.txt"))],
    )
    .unwrap();
    let graph = &applied.graph;
    assert_eq!(graph.find_sources("custom-script-1", "in"), vec!["http-input-1"]);
    assert_eq!(
        graph.find_node_sources("custom-script-1", "in"),
        vec!["nmap-1", "nmap-2"]
    );
}

#[test]
fn test_manual_connections_survive() {
    let graph = recon();
    let applied = apply(&graph, &[("nmap-1.verbose", json!(false))]).unwrap();
    for conn in &graph.connections {
        assert!(applied.graph.connections.contains(conn), "{conn:?}");
    }
    assert_eq!(applied.graph.connections.len(), graph.connections.len() + 1);
}

// ═══════════════════════════════════════════════════════════════
// RESOLUTION + TYPES
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_shared_label_is_ambiguous() {
    let err = apply(&recon(), &[("nmap.target", json!("x.org"))]).unwrap_err();
    assert_eq!(err.key(), Some("nmap.target"));
    match err.root() {
        WeftError::Ambiguous { candidates, .. } => {
            assert_eq!(candidates, &vec!["nmap-1".to_string(), "nmap-2".to_string()]);
        }
        other => panic!("Expected Ambiguous, got {other:?}"),
    }
}

#[test]
fn test_type_enforcement() {
    let graph = recon();
    let err = apply(
        &graph,
        &[("nmap-1.target", json!("https://github.com/org/repo.git"))],
    )
    .unwrap_err();

    assert_eq!(err.code(), "WEFT-020");
    let msg = err.to_string();
    assert!(msg.contains("STRING"));
    assert!(msg.contains("FOLDER"));
    assert_eq!(graph, recon());
}

#[test]
fn test_first_error_aborts_whole_pass() {
    // "file-splitter-1.files" sorts before "nmap-1.verbose", so the good entry
    // is applied to the working copy before the bad one fails
    let err = apply(
        &recon(),
        &[
            ("file-splitter-1.files", json!(["https://cdn.example.com/a.txt"])),
            ("nmap-1.verbose", json!("yes")),
        ],
    )
    .unwrap_err();
    assert_eq!(err.key(), Some("nmap-1.verbose"));
}

#[test]
fn test_single_param_fed_by_node() {
    let err = apply(&recon(), &[("nmap-2.target", json!("x.org"))]).unwrap_err();
    assert_eq!(err.code(), "WEFT-023");
}

// ═══════════════════════════════════════════════════════════════
// IDEMPOTENCE
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_second_apply_is_no_op() {
    let config = RunConfig::from_yaml(RUN).unwrap();
    let applier = ConfigApplier::new(&NoLocalFiles);

    let first = applier.apply(&recon(), &config.inputs).unwrap();
    assert!(first.changed);

    let second = applier.apply(&first.graph, &config.inputs).unwrap();
    assert!(!second.changed);
    assert_eq!(second.graph, first.graph);
}

// ═══════════════════════════════════════════════════════════════
// FULL PLAN
// ═══════════════════════════════════════════════════════════════

#[test]
fn test_plan_from_fixtures() {
    let config = RunConfig::from_yaml(RUN).unwrap();
    let plan = plan_run(
        &recon(),
        &config,
        &fleet(),
        &LayoutConfig::default(),
        &NoLocalFiles,
    )
    .unwrap();

    assert!(plan.changed);
    assert_eq!(plan.outputs, vec!["custom-script-1"]);
    assert_eq!(plan.machines.small, Some(2));
    assert_eq!(plan.machines.medium, None);
    assert_eq!(plan.machines.large, Some(5));

    let x = |id: &str| {
        plan.graph
            .node(id)
            .map(|node| node.meta.coordinates.x)
            .or_else(|| plan.graph.primitive(id).map(|p| p.coordinates.x))
            .unwrap()
    };
    assert!(x("custom-script-1") > x("nmap-1"));
    assert!(x("nmap-2") > x("file-splitter-1"));
    assert!(x("file-splitter-1") > x("http-input-1"));
}

#[test]
fn test_plan_rejects_unoffered_class() {
    let config = RunConfig::from_yaml("machines: {small: 2, medium: 1}").unwrap();
    let err = plan_run(
        &recon(),
        &config,
        &fleet(),
        &LayoutConfig::default(),
        &NoLocalFiles,
    )
    .unwrap_err();
    assert!(matches!(err.root(), WeftError::CannotAllocate { class } if class == "medium"));
}
