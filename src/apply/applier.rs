//! ConfigApplier - rewrite a graph snapshot from a run configuration's inputs
//!
//! Keys are processed in sorted order. Two shapes:
//! - `node.param: value | [values]` replaces the literals feeding a parameter
//! - `primitive: value` overwrites an existing literal node in place
//!
//! The input graph is never touched: the pass works on a clone and either
//! returns the whole rewritten graph or the first error.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, WeftError};
use crate::graph::{
    mirror_key, InputPort, PrimitiveKind, WorkflowVersionGraph, PRIMITIVE_OUTPUT_PORT,
};
use crate::resolve::{NodeResolver, Reference};
use crate::wiring::{infer_kind, mirror_value, FileProbe, Literal, PrimitiveNodeManager};

/// Result of one apply pass
#[derive(Debug, Clone)]
pub struct Applied {
    pub graph: WorkflowVersionGraph,
    /// Did the pass change anything a new version would need?
    pub changed: bool,
}

/// A local file that must be uploaded before the version is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub primitive: String,
    pub path: String,
}

impl Applied {
    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        self.graph
            .primitive_nodes
            .values()
            .filter_map(|primitive| {
                primitive.update_file.as_ref().map(|path| PendingUpload {
                    primitive: primitive.name.clone(),
                    path: path.clone(),
                })
            })
            .collect()
    }
}

/// Target parameter, copied out of the resolver before mutation
struct ParamTarget {
    node: String,
    param: String,
    port_type: String,
    multi: bool,
}

pub struct ConfigApplier<'p> {
    probe: &'p dyn FileProbe,
}

impl<'p> ConfigApplier<'p> {
    pub fn new(probe: &'p dyn FileProbe) -> Self {
        Self { probe }
    }

    pub fn apply(
        &self,
        graph: &WorkflowVersionGraph,
        inputs: &BTreeMap<String, Value>,
    ) -> Result<Applied> {
        let mut working = graph.clone();
        let mut primitives = PrimitiveNodeManager::new(graph, self.probe);

        for (key, value) in inputs {
            debug!(key = %key, "applying input");
            self.apply_entry(&mut working, &mut primitives, key, value)
                .map_err(|e| e.for_key(key.as_str()))?;
        }

        working.check_connections()?;

        let changed = working != *graph;
        info!(
            inputs = inputs.len(),
            primitives = working.primitive_nodes.len(),
            connections = working.connections.len(),
            changed,
            "inputs applied"
        );
        Ok(Applied {
            graph: working,
            changed,
        })
    }

    fn apply_entry(
        &self,
        graph: &mut WorkflowVersionGraph,
        primitives: &mut PrimitiveNodeManager<'_>,
        key: &str,
        value: &Value,
    ) -> Result<()> {
        match Reference::parse(key)? {
            Reference::Primitive(reference) => set_primitive(graph, primitives, reference, value),
            Reference::Param { .. } => set_param(graph, primitives, key, value),
        }
    }
}

/// Overwrite an existing literal node and refresh its consumers' mirrors
fn set_primitive(
    graph: &mut WorkflowVersionGraph,
    primitives: &PrimitiveNodeManager<'_>,
    reference: &str,
    value: &Value,
) -> Result<()> {
    let (id, kind) = {
        let resolver = NodeResolver::new(graph);
        let id = resolver.resolve_primitive(reference)?;
        (id.to_string(), graph.primitive_nodes[id].kind)
    };

    let literal = primitives.normalize(kind, value, &id)?;
    let primitive = graph
        .primitive_mut(&id)
        .ok_or_else(|| WeftError::Undefined {
            reference: id.clone(),
        })?;
    if literal.matches(primitive) {
        debug!(primitive = %id, "literal unchanged");
        return Ok(());
    }
    primitive.value = literal.value;
    primitive.label = literal.label;
    primitive.update_file = literal.pending_upload;

    let consumers: Vec<(String, String)> = graph
        .consumers(&id)
        .map(|port| (port.node().to_string(), port.port().to_string()))
        .collect();
    for (node, param) in consumers {
        write_mirror(graph, &node, &param, &id)?;
    }
    Ok(())
}

/// Replace every literal feeding `node.param` with the configured values
fn set_param(
    graph: &mut WorkflowVersionGraph,
    primitives: &mut PrimitiveNodeManager<'_>,
    key: &str,
    value: &Value,
) -> Result<()> {
    let target = {
        let resolved = NodeResolver::new(graph).resolve_param(key)?;
        ParamTarget {
            node: resolved.node.to_string(),
            param: resolved.param.to_string(),
            port_type: resolved.port.port_type.clone(),
            multi: resolved.port.multi,
        }
    };

    let values: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    if !target.multi && values.len() != 1 {
        return Err(WeftError::MultipleValues {
            param: target.param,
            count: values.len(),
        });
    }
    if !target.multi {
        if let Some(upstream) = graph.find_node_sources(&target.node, &target.param).first() {
            return Err(WeftError::ParameterConnected {
                param: target.param.clone(),
                source_node: upstream.to_string(),
            });
        }
    }

    let kind: PrimitiveKind =
        target
            .port_type
            .parse()
            .map_err(|_| WeftError::TypeMismatch {
                param: target.param.clone(),
                expected: target.port_type.clone(),
                actual: values
                    .first()
                    .map_or("NULL", |value| infer_kind(value))
                    .to_string(),
            })?;

    let literals = values
        .iter()
        .map(|raw| primitives.normalize(kind, raw, &target.param))
        .collect::<Result<Vec<Literal>>>()?;

    let existing = graph.find_sources(&target.node, &target.param);
    let unchanged = existing.len() == literals.len()
        && existing.iter().zip(&literals).all(|(id, literal)| {
            graph
                .primitive(id)
                .is_some_and(|primitive| literal.matches(primitive))
        });
    if unchanged {
        debug!(node = %target.node, param = %target.param, "literals unchanged");
        return Ok(());
    }

    for src in &existing {
        teardown(graph, &target.node, &target.param, src)?;
    }

    for literal in literals {
        let id = primitives.create(graph, literal);
        graph.connect(&id, PRIMITIVE_OUTPUT_PORT, &target.node, &target.param);
        write_mirror(graph, &target.node, &target.param, &id)?;
        debug!(primitive = %id, node = %target.node, param = %target.param, "literal wired");
    }
    Ok(())
}

/// Drop one literal edge, its mirrored entry, and the literal when orphaned
fn teardown(graph: &mut WorkflowVersionGraph, node: &str, param: &str, src: &str) -> Result<()> {
    if graph.primitive(src).is_none() {
        return Err(WeftError::MissingNodeDuringCleanup {
            node: src.to_string(),
            param: format!("{node}.{param}"),
        });
    }

    let port = graph
        .source_port(src, node, param)
        .unwrap_or(PRIMITIVE_OUTPUT_PORT)
        .to_string();
    graph.disconnect(src, &port, node, param)?;

    if let Some(consumer) = graph.node_mut(node) {
        consumer.inputs.remove(&mirror_key(param, src));
    }
    // A literal may also feed other parameters
    if graph.consumers(src).next().is_none() {
        graph.primitive_nodes.remove(src);
    }
    Ok(())
}

/// Create or refresh the `<param>/<primitive>` entry on `node`
fn write_mirror(
    graph: &mut WorkflowVersionGraph,
    node: &str,
    param: &str,
    primitive_id: &str,
) -> Result<()> {
    let primitive = graph
        .primitive(primitive_id)
        .ok_or_else(|| WeftError::MissingNodeDuringCleanup {
            node: primitive_id.to_string(),
            param: format!("{node}.{param}"),
        })?;
    let value = mirror_value(primitive);
    let port_type = primitive.kind.as_str().to_string();

    let consumer = graph.node_mut(node).ok_or_else(|| WeftError::Undefined {
        reference: node.to_string(),
    })?;
    let order = consumer.inputs.get(param).map_or(0, |declared| declared.order);

    consumer
        .inputs
        .entry(mirror_key(param, primitive_id))
        .and_modify(|entry| entry.value = value.clone())
        .or_insert_with(|| InputPort {
            port_type,
            value,
            order,
            visible: false,
            multi: false,
        });
    Ok(())
}
