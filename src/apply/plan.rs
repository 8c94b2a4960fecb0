//! RunPlanner - everything a submission needs, computed in one pass
//!
//! Machines are validated first, then inputs are applied, outputs resolved
//! against the rewritten graph, and the graph laid out when it changed.

use tracing::info;

use crate::error::Result;
use crate::graph::WorkflowVersionGraph;
use crate::layout::{Forest, LayoutConfig, LayoutEngine};
use crate::machines::{validate_allocation, FleetMaxima, MachineAllocation};
use crate::resolve::NodeResolver;
use crate::wiring::FileProbe;

use super::applier::{ConfigApplier, PendingUpload};
use super::run_config::RunConfig;

#[derive(Debug, Clone)]
pub struct RunPlan {
    pub graph: WorkflowVersionGraph,
    /// A new workflow version must be stored before running
    pub changed: bool,
    /// Resolved output node ids, in request order
    pub outputs: Vec<String>,
    pub machines: MachineAllocation,
    pub pending_uploads: Vec<PendingUpload>,
}

pub fn plan_run(
    graph: &WorkflowVersionGraph,
    config: &RunConfig,
    fleet: &FleetMaxima,
    layout: &LayoutConfig,
    probe: &dyn FileProbe,
) -> Result<RunPlan> {
    let request = config.machines.unwrap_or_default();
    let machines = validate_allocation(&request, fleet).map_err(|e| e.for_key("machines"))?;

    let applied = ConfigApplier::new(probe).apply(graph, &config.inputs)?;
    let outputs = NodeResolver::new(&applied.graph).resolve_outputs(&config.outputs)?;
    let pending_uploads = applied.pending_uploads();

    let mut graph = applied.graph;
    if applied.changed {
        let forest = Forest::project(&graph, true);
        let computed = LayoutEngine::new(*layout).compute(&forest)?;
        graph.apply_layout(&computed);
    }

    info!(
        changed = applied.changed,
        outputs = outputs.len(),
        machines = machines.total(),
        uploads = pending_uploads.len(),
        "run planned"
    );
    Ok(RunPlan {
        graph,
        changed: applied.changed,
        outputs,
        machines,
        pending_uploads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InputPort, Node, NodeKind, PrimitiveKind};
    use crate::wiring::NoLocalFiles;

    fn graph() -> WorkflowVersionGraph {
        WorkflowVersionGraph::new()
            .with_node(
                Node::new("nmap-1", NodeKind::Tool, "nmap")
                    .with_input("target", InputPort::new(PrimitiveKind::String))
                    .with_output("file", "FILE"),
            )
            .with_node(Node::new("custom-script-1", NodeKind::Script, "collect-hosts"))
    }

    fn fleet() -> FleetMaxima {
        FleetMaxima {
            small: Some(3),
            medium: None,
            large: Some(5),
        }
    }

    fn plan(yaml: &str) -> Result<RunPlan> {
        let config = RunConfig::from_yaml(yaml)?;
        plan_run(&graph(), &config, &fleet(), &LayoutConfig::default(), &NoLocalFiles)
    }

    #[test]
    fn test_full_plan() {
        let plan = plan(
            "machines: {small: 2}\n\
             inputs:\n  nmap-1.target: example.com\n\
             outputs: [collect-hosts, nmap-1]\n",
        )
        .unwrap();

        assert!(plan.changed);
        assert_eq!(plan.outputs, vec!["custom-script-1", "nmap-1"]);
        assert_eq!(plan.machines.small, Some(2));
        assert!(plan.pending_uploads.is_empty());

        // Laid out: nmap-1 sits one column right of its literal
        let nmap = plan.graph.node("nmap-1").unwrap();
        let literal = plan.graph.primitive("string-input-1").unwrap();
        assert!(nmap.meta.coordinates.x > literal.coordinates.x);
    }

    #[test]
    fn test_default_machine_request_is_one_per_offered_class() {
        let plan = plan("").unwrap();
        assert!(!plan.changed);
        assert_eq!(plan.machines.total(), 2);
        assert_eq!(plan.graph, graph());
    }

    #[test]
    fn test_machine_error_names_key() {
        let err = plan("machines: {medium: 1}").unwrap_err();
        assert_eq!(err.code(), "WEFT-030");
        assert_eq!(err.key(), Some("machines"));
    }

    #[test]
    fn test_bad_output_reference() {
        let err = plan("outputs: [httpx]").unwrap_err();
        assert_eq!(err.key(), Some("outputs.httpx"));
        assert_eq!(err.code(), "WEFT-010");
    }
}
