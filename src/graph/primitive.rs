//! Primitive (literal-value) nodes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::node::Coordinates;

/// Kinds of literal a primitive node can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrimitiveKind {
    String,
    Boolean,
    /// http(s) file URL or uploaded file
    File,
    /// git repository URL
    Folder,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 4] = [Self::String, Self::Boolean, Self::File, Self::Folder];

    /// Declared type name as it appears in the remote schema
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Boolean => "BOOLEAN",
            Self::File => "FILE",
            Self::Folder => "FOLDER",
        }
    }

    /// Prefix of primitive ids of this kind (`<prefix>-input-<n>`)
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::File => "http",
            Self::Folder => "git",
        }
    }

    /// Canonical id of the n-th primitive of this kind
    pub fn id_for(self, index: u32) -> String {
        format!("{}-input-{}", self.id_prefix(), index)
    }

    /// Numeric suffix of `id` if it names a primitive of this kind
    pub fn index_of(self, id: &str) -> Option<u32> {
        id.strip_prefix(self.id_prefix())?
            .strip_prefix("-input-")?
            .parse()
            .ok()
    }

    /// Literals mirrored into consumers as `in/<id>/<basename>`
    pub fn is_file_like(self) -> bool {
        matches!(self, Self::File | Self::Folder)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrimitiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown literal type '{s}'"))
    }
}

/// A literal-value node feeding one or more parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveNode {
    /// Canonical id: `<prefix>-input-<n>`
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub coordinates: Coordinates,
    /// Local path waiting to be uploaded before submission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_file: Option<String>,
}

impl PrimitiveNode {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind, value: Value) -> Self {
        let label = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            name: name.into(),
            kind,
            label,
            value,
            coordinates: Coordinates::default(),
            update_file: None,
        }
    }

    /// Index parsed from the id, if it follows the canonical pattern
    pub fn index(&self) -> Option<u32> {
        self.kind.index_of(&self.name)
    }
}
