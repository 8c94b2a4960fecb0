//! Graph Module - in-memory workflow version graph
//!
//! Pure data mirroring the remote schema:
//! - `node`: tools, scripts, splitters, modules and their ports
//! - `primitive`: literal-value nodes (string / boolean / file / git)
//! - `endpoint`: structured connection endpoints (`PortRef`, `Connection`)
//!
//! A graph is fetched once as a snapshot, rewritten in memory by the
//! applier, then handed off to be stored as a new immutable version.

mod endpoint;
mod node;
mod primitive;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WeftError};

pub use endpoint::{Connection, PortRef, PRIMITIVE_OUTPUT_PORT};
pub use node::{mirror_key, Coordinates, InputPort, Node, NodeKind, NodeMeta, OutputPort};
pub use primitive::{PrimitiveKind, PrimitiveNode};

/// `<base>-<n>` instance suffix on node ids
static INSTANCE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<base>.+)-(?P<index>\d+)$").expect("valid regex"));

/// Split `nmap-2` into (`nmap`, 2). Returns `None` without a numeric suffix.
pub fn instance_index(id: &str) -> Option<(&str, u32)> {
    let caps = INSTANCE_SUFFIX.captures(id)?;
    let base = caps.name("base")?.as_str();
    let index = caps.name("index")?.as_str().parse().ok()?;
    Some((base, index))
}

/// Nodes, primitive nodes and connections of one workflow version
///
/// Maps are ordered by id so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowVersionGraph {
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
    #[serde(default)]
    pub primitive_nodes: BTreeMap<String, PrimitiveNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl WorkflowVersionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a graph snapshot from the remote JSON shape
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.insert(node.name.clone(), node);
        self
    }

    pub fn with_primitive(mut self, primitive: PrimitiveNode) -> Self {
        self.primitive_nodes.insert(primitive.name.clone(), primitive);
        self
    }

    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn primitive(&self, id: &str) -> Option<&PrimitiveNode> {
        self.primitive_nodes.get(id)
    }

    pub fn primitive_mut(&mut self, id: &str) -> Option<&mut PrimitiveNode> {
        self.primitive_nodes.get_mut(id)
    }

    /// Is `id` a node or a primitive node?
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id) || self.primitive_nodes.contains_key(id)
    }

    /// Check that every connection joins existing endpoints
    ///
    /// Either end may be a node or a primitive node.
    pub fn check_connections(&self) -> Result<()> {
        for conn in &self.connections {
            let dangling = |missing: &str| WeftError::DanglingConnection {
                source_id: conn.source.to_string(),
                destination_id: conn.destination.to_string(),
                missing: missing.to_string(),
            };

            let src = conn.source.node();
            if conn.source.is_input() || !self.contains(src) {
                return Err(dangling(src));
            }

            let dst = conn.destination.node();
            if !conn.destination.is_input() || !self.contains(dst) {
                return Err(dangling(dst));
            }

            if let Some(embedded) = conn.destination.source() {
                if embedded != src {
                    return Err(WeftError::InvalidEndpoint {
                        id: conn.destination.to_string(),
                        reason: format!("embeds source '{embedded}' but the edge starts at '{src}'"),
                    });
                }
            }
        }
        Ok(())
    }
}
