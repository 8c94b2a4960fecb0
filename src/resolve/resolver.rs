//! NodeResolver - reference strings to canonical ids
//!
//! Node rules, in order:
//! 1. exact id match
//! 2. several nodes carrying the label → ambiguous
//! 3. a ref without `-N` suffix is retried as `ref-1`
//! 4. a single label match resolves for scripts and splitters only;
//!    tools and modules must be named by id
//!
//! Label lookups use a precomputed FxHashMap built once per graph.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{Result, WeftError};
use crate::graph::{instance_index, InputPort, WorkflowVersionGraph};

use super::reference::Reference;

type IdVec<'g> = SmallVec<[&'g str; 2]>;

/// A resolved `node.param` reference
#[derive(Debug, Clone, Copy)]
pub struct ParamRef<'g> {
    pub node: &'g str,
    pub param: &'g str,
    pub port: &'g InputPort,
}

pub struct NodeResolver<'g> {
    graph: &'g WorkflowVersionGraph,
    node_labels: FxHashMap<&'g str, IdVec<'g>>,
    primitive_labels: FxHashMap<&'g str, IdVec<'g>>,
}

impl<'g> NodeResolver<'g> {
    pub fn new(graph: &'g WorkflowVersionGraph) -> Self {
        let mut node_labels: FxHashMap<&str, IdVec> = FxHashMap::default();
        for node in graph.nodes.values() {
            node_labels
                .entry(node.label())
                .or_default()
                .push(node.name.as_str());
        }

        let mut primitive_labels: FxHashMap<&str, IdVec> = FxHashMap::default();
        for primitive in graph.primitive_nodes.values() {
            primitive_labels
                .entry(primitive.label.as_str())
                .or_default()
                .push(primitive.name.as_str());
        }

        Self {
            graph,
            node_labels,
            primitive_labels,
        }
    }

    /// Resolve a node reference to its canonical id
    pub fn resolve(&self, reference: &str) -> Result<&'g str> {
        if let Some((id, _)) = self.graph.nodes.get_key_value(reference) {
            return Ok(id.as_str());
        }

        let matches = self
            .node_labels
            .get(reference)
            .map(SmallVec::as_slice)
            .unwrap_or_default();

        if matches.len() > 1 {
            return Err(WeftError::Ambiguous {
                reference: reference.to_string(),
                candidates: matches.iter().map(|id| id.to_string()).collect(),
            });
        }

        if instance_index(reference).is_none() {
            let first = format!("{reference}-1");
            if let Some((id, _)) = self.graph.nodes.get_key_value(&first) {
                return Ok(id.as_str());
            }
        }

        match matches {
            [id] => {
                let node = &self.graph.nodes[*id];
                if node.kind.is_label_addressable() {
                    Ok(*id)
                } else {
                    Err(WeftError::IncompleteReference {
                        reference: reference.to_string(),
                        node: id.to_string(),
                        kind: node.kind.to_string(),
                    })
                }
            }
            _ => Err(WeftError::Undefined {
                reference: reference.to_string(),
            }),
        }
    }

    /// Resolve `node.param` and fetch the declared parameter
    pub fn resolve_param(&self, key: &str) -> Result<ParamRef<'g>> {
        let (node_ref, param) = match Reference::parse(key)? {
            Reference::Param { node, param } => (node, param),
            Reference::Primitive(_) => {
                return Err(WeftError::BadReference {
                    reference: key.to_string(),
                    reason: "expected 'node.param'".to_string(),
                })
            }
        };

        let node_id = self.resolve(node_ref)?;
        let node = &self.graph.nodes[node_id];
        let (param, port) = node
            .inputs
            .get_key_value(param)
            .filter(|_| node.param(param).is_some())
            .ok_or_else(|| WeftError::UnknownParameter {
                node: node_id.to_string(),
                param: param.to_string(),
            })?;

        Ok(ParamRef {
            node: node_id,
            param,
            port,
        })
    }

    /// Resolve an existing primitive node by id or unique label
    pub fn resolve_primitive(&self, reference: &str) -> Result<&'g str> {
        if let Some((id, _)) = self.graph.primitive_nodes.get_key_value(reference) {
            return Ok(id.as_str());
        }

        match self
            .primitive_labels
            .get(reference)
            .map(SmallVec::as_slice)
            .unwrap_or_default()
        {
            [] => Err(WeftError::Undefined {
                reference: reference.to_string(),
            }),
            [id] => Ok(*id),
            many => Err(WeftError::Ambiguous {
                reference: reference.to_string(),
                candidates: many.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }

    /// Resolve requested output nodes, deduplicated in request order
    pub fn resolve_outputs<S: AsRef<str>>(&self, refs: &[S]) -> Result<Vec<String>> {
        let mut resolved: Vec<String> = Vec::with_capacity(refs.len());
        for reference in refs {
            let reference = reference.as_ref();
            let id = self
                .resolve(reference)
                .map_err(|e| e.for_key(format!("outputs.{reference}")))?;
            if !resolved.iter().any(|seen| seen == id) {
                resolved.push(id.to_string());
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InputPort, Node, NodeKind, PrimitiveKind, PrimitiveNode};
    use serde_json::json;

    fn graph() -> WorkflowVersionGraph {
        WorkflowVersionGraph::new()
            .with_node(
                Node::new("nmap-1", NodeKind::Tool, "nmap")
                    .with_input("target", InputPort::new(PrimitiveKind::String)),
            )
            .with_node(Node::new("nmap-2", NodeKind::Tool, "nmap"))
            .with_node(Node::new("httpx-1", NodeKind::Tool, "httpx"))
            .with_node(Node::new("custom-script-1", NodeKind::Script, "collect-hosts"))
            .with_node(Node::new("custom-script-2", NodeKind::Script, "dedupe"))
            .with_node(Node::new("custom-script-3", NodeKind::Script, "dedupe"))
            .with_node(Node::new("ffuf-1", NodeKind::Tool, "fuzzer"))
            .with_primitive(PrimitiveNode::new(
                "string-input-1",
                PrimitiveKind::String,
                json!("example.com"),
            ))
            .with_primitive(PrimitiveNode::new(
                "string-input-2",
                PrimitiveKind::String,
                json!("dup"),
            ))
            .with_primitive(PrimitiveNode::new(
                "string-input-3",
                PrimitiveKind::String,
                json!("dup"),
            ))
    }

    #[test]
    fn test_exact_id_wins() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        assert_eq!(resolver.resolve("nmap-1").unwrap(), "nmap-1");
        assert_eq!(resolver.resolve("nmap-2").unwrap(), "nmap-2");
    }

    #[test]
    fn test_shared_label_is_ambiguous() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        let err = resolver.resolve("nmap").unwrap_err();
        match err {
            WeftError::Ambiguous { candidates, .. } => {
                assert_eq!(candidates, vec!["nmap-1", "nmap-2"]);
            }
            other => panic!("Expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_name_defaults_to_first_instance() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        assert_eq!(resolver.resolve("httpx").unwrap(), "httpx-1");
    }

    #[test]
    fn test_unique_script_label_resolves() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        assert_eq!(resolver.resolve("collect-hosts").unwrap(), "custom-script-1");
        assert!(matches!(
            resolver.resolve("dedupe"),
            Err(WeftError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_tool_label_is_incomplete() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        let err = resolver.resolve("fuzzer").unwrap_err();
        assert_eq!(err.code(), "WEFT-014");
        assert!(err.to_string().contains("ffuf-1"));
    }

    #[test]
    fn test_unknown_reference() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        assert!(matches!(
            resolver.resolve("subfinder"),
            Err(WeftError::Undefined { .. })
        ));
        assert!(matches!(
            resolver.resolve("nmap-9"),
            Err(WeftError::Undefined { .. })
        ));
    }

    #[test]
    fn test_resolve_param() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        let param = resolver.resolve_param("nmap-1.target").unwrap();
        assert_eq!(param.node, "nmap-1");
        assert_eq!(param.param, "target");
        assert_eq!(param.port.port_type, "STRING");

        let err = resolver.resolve_param("nmap-1.ports").unwrap_err();
        assert_eq!(err.code(), "WEFT-013");

        let err = resolver.resolve_param("nmap.target").unwrap_err();
        assert_eq!(err.code(), "WEFT-011");
    }

    #[test]
    fn test_resolve_param_ignores_mirrored_entries() {
        let mut g = graph();
        g.node_mut("nmap-1").unwrap().inputs.insert(
            "target/string-input-1".into(),
            InputPort::new(PrimitiveKind::String),
        );
        let resolver = NodeResolver::new(&g);
        assert!(resolver.resolve_param("nmap-1.target/string-input-1").is_err());
    }

    #[test]
    fn test_resolve_primitive() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        assert_eq!(
            resolver.resolve_primitive("string-input-1").unwrap(),
            "string-input-1"
        );
        assert_eq!(
            resolver.resolve_primitive("example.com").unwrap(),
            "string-input-1"
        );
        assert_eq!(resolver.resolve_primitive("dup").unwrap_err().code(), "WEFT-011");
        assert_eq!(resolver.resolve_primitive("nope").unwrap_err().code(), "WEFT-010");
    }

    #[test]
    fn test_resolve_outputs_dedupes_in_order() {
        let g = graph();
        let resolver = NodeResolver::new(&g);
        let outputs = resolver
            .resolve_outputs(&["collect-hosts", "httpx", "httpx-1"])
            .unwrap();
        assert_eq!(outputs, vec!["custom-script-1", "httpx-1"]);

        let err = resolver.resolve_outputs(&["nmap"]).unwrap_err();
        assert_eq!(err.key(), Some("outputs.nmap"));
    }
}
