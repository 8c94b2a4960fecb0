//! Workflow nodes (tools, scripts, splitters, modules)

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::primitive::PrimitiveKind;

/// The four node kinds a workflow can contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Tool,
    Script,
    Splitter,
    Module,
}

impl NodeKind {
    /// Scripts and splitters may be referenced by a unique label alone.
    /// Tools and modules must be referenced by id.
    pub fn is_label_addressable(self) -> bool {
        matches!(self, Self::Script | Self::Splitter)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "TOOL",
            Self::Script => "SCRIPT",
            Self::Splitter => "SPLITTER",
            Self::Module => "MODULE",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 2D position consumed by the remote visual editor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub coordinates: Coordinates,
}

/// Input parameter (or mirrored literal entry) of a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPort {
    /// Declared type name, e.g. "STRING", "FILE"
    #[serde(rename = "type")]
    pub port_type: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub multi: bool,
}

impl InputPort {
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            port_type: kind.as_str().to_string(),
            value: Value::Null,
            order: 0,
            visible: true,
            multi: false,
        }
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    /// Declared type as a literal kind, when it is one
    pub fn declared_kind(&self) -> Option<PrimitiveKind> {
        self.port_type.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPort {
    #[serde(rename = "type")]
    pub port_type: String,
    #[serde(default)]
    pub order: i64,
}

/// A unit of work in the workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical id: `<kind>-<index>`
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub meta: NodeMeta,
    /// Declared parameters plus mirrored literal entries (`<port>/<primitive>`)
    #[serde(default)]
    pub inputs: BTreeMap<String, InputPort>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputPort>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            meta: NodeMeta {
                label: label.into(),
                coordinates: Coordinates::default(),
            },
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, param: impl Into<String>, port: InputPort) -> Self {
        self.inputs.insert(param.into(), port);
        self
    }

    pub fn with_output(mut self, port: impl Into<String>, port_type: impl Into<String>) -> Self {
        let order = self.outputs.len() as i64;
        self.outputs.insert(
            port.into(),
            OutputPort {
                port_type: port_type.into(),
                order,
            },
        );
        self
    }

    pub fn label(&self) -> &str {
        &self.meta.label
    }

    /// Declared parameter (never a mirrored entry)
    pub fn param(&self, name: &str) -> Option<&InputPort> {
        if is_mirror_key(name) {
            return None;
        }
        self.inputs.get(name)
    }

    /// Declared parameters, skipping mirrored entries
    pub fn params(&self) -> impl Iterator<Item = (&str, &InputPort)> {
        self.inputs
            .iter()
            .filter(|(k, _)| !is_mirror_key(k))
            .map(|(k, v)| (k.as_str(), v))
    }
}

/// Key of the mirrored entry for a literal feeding `param`
pub fn mirror_key(param: &str, primitive_id: &str) -> String {
    format!("{param}/{primitive_id}")
}

fn is_mirror_key(key: &str) -> bool {
    key.contains('/')
}
