//! Connection endpoints
//!
//! The remote schema encodes endpoints as slash-separated strings:
//! - source:      `output/<node>/<port>`
//! - destination: `input/<node>/<port>/<source node>`
//!
//! The destination embeds the source node so several literals can feed one
//! multi-valued port without colliding. `PortRef` parses and formats these
//! strings; everything else in the crate works with the structured form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WeftError;

/// Port name used by every primitive node's single output
pub const PRIMITIVE_OUTPUT_PORT: &str = "output";

/// One side of a connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PortRef {
    Output {
        node: String,
        port: String,
    },
    Input {
        node: String,
        port: String,
        source: Option<String>,
    },
}

impl PortRef {
    pub fn output(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self::Output {
            node: node.into(),
            port: port.into(),
        }
    }

    pub fn input(node: impl Into<String>, port: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Input {
            node: node.into(),
            port: port.into(),
            source: Some(source.into()),
        }
    }

    /// Node id this endpoint sits on
    pub fn node(&self) -> &str {
        match self {
            Self::Output { node, .. } | Self::Input { node, .. } => node,
        }
    }

    pub fn port(&self) -> &str {
        match self {
            Self::Output { port, .. } | Self::Input { port, .. } => port,
        }
    }

    /// Source node embedded in an input endpoint
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Input { source, .. } => source.as_deref(),
            Self::Output { .. } => None,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Output { node, port } => write!(f, "output/{node}/{port}"),
            Self::Input {
                node,
                port,
                source: Some(source),
            } => write!(f, "input/{node}/{port}/{source}"),
            Self::Input {
                node,
                port,
                source: None,
            } => write!(f, "input/{node}/{port}"),
        }
    }
}

impl FromStr for PortRef {
    type Err = WeftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| WeftError::InvalidEndpoint {
            id: s.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = s.split('/').collect();
        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(invalid("empty segment"));
        }

        match segments.as_slice() {
            ["output", node, port] => Ok(Self::output(*node, *port)),
            ["input", node, port] => Ok(Self::Input {
                node: (*node).to_string(),
                port: (*port).to_string(),
                source: None,
            }),
            ["input", node, port, source] => Ok(Self::input(*node, *port, *source)),
            ["output", ..] => Err(invalid("expected output/<node>/<port>")),
            ["input", ..] => Err(invalid("expected input/<node>/<port>/<source>")),
            _ => Err(invalid("must start with 'input' or 'output'")),
        }
    }
}

impl TryFrom<String> for PortRef {
    type Error = WeftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PortRef> for String {
    fn from(value: PortRef) -> Self {
        value.to_string()
    }
}

/// Directed edge between two ports
///
/// Serialized as `{"source": {"id": ...}, "destination": {"id": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(with = "endpoint_id")]
    pub source: PortRef,
    #[serde(with = "endpoint_id")]
    pub destination: PortRef,
}

impl Connection {
    /// Edge from `src_node/src_port` into `dst_node/dst_port`
    pub fn new(src_node: &str, src_port: &str, dst_node: &str, dst_port: &str) -> Self {
        Self {
            source: PortRef::output(src_node, src_port),
            destination: PortRef::input(dst_node, dst_port, src_node),
        }
    }

    /// Does this edge feed `node`'s parameter `port`?
    pub fn feeds(&self, node: &str, port: &str) -> bool {
        self.destination.node() == node && self.destination.port() == port
    }
}

mod endpoint_id {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::PortRef;

    #[derive(Serialize)]
    struct Out<'a> {
        id: &'a PortRef,
    }

    #[derive(Deserialize)]
    struct In {
        id: PortRef,
    }

    pub fn serialize<S: Serializer>(port: &PortRef, serializer: S) -> Result<S::Ok, S::Error> {
        Out { id: port }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PortRef, D::Error> {
        In::deserialize(deserializer).map(|e| e.id)
    }
}
