//! PrimitiveNodeManager - literal normalization and id allocation
//!
//! Per-kind formats:
//! - STRING:  strings and numbers (stringified)
//! - BOOLEAN: booleans only
//! - FILE:    http(s) URL, uploaded file (`weft://file/<name>`), or an existing
//!            local path (rewritten to an uploaded reference, marked pending)
//! - FOLDER:  http(s) URL ending in `.git`
//!
//! Local path checks go through `FileProbe` so the apply pass itself does no IO.

use std::path::Path;

use rustc_hash::FxHashMap;
use serde_json::Value;
use url::Url;

use crate::error::{Result, WeftError};
use crate::graph::{PrimitiveKind, PrimitiveNode, WorkflowVersionGraph};

/// Prefix of files already stored by the remote service
pub const UPLOADED_FILE_PREFIX: &str = "weft://file/";

/// Answers "does this local file exist?" for FILE literals
pub trait FileProbe {
    fn exists(&self, path: &str) -> bool;
}

/// Checks the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileProbe for LocalFiles {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}

/// Treats every local path as missing (URLs and uploaded refs only)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalFiles;

impl FileProbe for NoLocalFiles {
    fn exists(&self, _path: &str) -> bool {
        false
    }
}

/// A literal ready to be stored in a primitive node
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: PrimitiveKind,
    pub value: Value,
    pub label: String,
    /// Local file to upload before submission
    pub pending_upload: Option<String>,
}

impl Literal {
    /// Same stored value as an existing primitive?
    ///
    /// A literal waiting for upload never matches: the uploaded reference
    /// only carries the basename, so the local file may differ.
    pub fn matches(&self, primitive: &PrimitiveNode) -> bool {
        self.pending_upload.is_none()
            && self.kind == primitive.kind
            && self.value == primitive.value
    }
}

/// Kind name of a raw value, for type mismatch messages
pub fn infer_kind(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "BOOLEAN",
        Value::String(s) if is_git_url(s) => "FOLDER",
        Value::String(_) | Value::Number(_) => "STRING",
        Value::Array(_) => "LIST",
        Value::Object(_) => "MAP",
        Value::Null => "NULL",
    }
}

/// Validate `raw` for `kind` and produce the stored literal
///
/// `param` only names the target in error messages.
pub fn normalize(
    kind: PrimitiveKind,
    raw: &Value,
    param: &str,
    probe: &dyn FileProbe,
) -> Result<Literal> {
    let mismatch = || WeftError::TypeMismatch {
        param: param.to_string(),
        expected: kind.to_string(),
        actual: infer_kind(raw).to_string(),
    };
    let invalid = |value: &str, reason: &str| WeftError::InvalidLiteralFormat {
        kind: kind.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let plain = |value: String| Literal {
        kind,
        label: value.clone(),
        value: Value::String(value),
        pending_upload: None,
    };

    match (kind, raw) {
        (PrimitiveKind::String, Value::String(s)) if !is_git_url(s) => Ok(plain(s.clone())),
        (PrimitiveKind::String, Value::Number(n)) => Ok(plain(n.to_string())),

        (PrimitiveKind::Boolean, Value::Bool(b)) => Ok(Literal {
            kind,
            value: Value::Bool(*b),
            label: b.to_string(),
            pending_upload: None,
        }),

        (PrimitiveKind::File, Value::String(s)) if !is_git_url(s) => {
            if is_http_url(s) {
                return Ok(plain(s.clone()));
            }
            if let Some(name) = s.strip_prefix(UPLOADED_FILE_PREFIX) {
                if name.is_empty() {
                    return Err(invalid(s, "uploaded file reference has no name"));
                }
                return Ok(plain(s.clone()));
            }
            if probe.exists(s) {
                let reference = format!("{UPLOADED_FILE_PREFIX}{}", basename(s));
                return Ok(Literal {
                    pending_upload: Some(s.clone()),
                    ..plain(reference)
                });
            }
            Err(invalid(
                s,
                "not an http(s) URL, an uploaded file, or an existing local file",
            ))
        }

        (PrimitiveKind::Folder, Value::String(s)) => {
            if is_git_url(s) {
                Ok(plain(s.clone()))
            } else {
                Err(invalid(s, "expected an http(s) repository URL ending in .git"))
            }
        }

        _ => Err(mismatch()),
    }
}

/// Value written to a consumer's mirrored entry
///
/// FILE and FOLDER literals are staged by the runner under `in/<id>/<basename>`.
pub fn mirror_value(primitive: &PrimitiveNode) -> Value {
    if !primitive.kind.is_file_like() {
        return primitive.value.clone();
    }
    let raw = primitive.value.as_str().unwrap_or_default();
    Value::String(format!("in/{}/{}", primitive.name, basename(raw)))
}

/// Last path segment of a URL, uploaded reference or local path
pub fn basename(value: &str) -> String {
    if let Ok(url) = Url::parse(value) {
        if url.has_host() {
            let last = url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last());
            if let Some(last) = last {
                return last.to_string();
            }
        }
    }
    let trimmed = value.trim_end_matches(['/', '\\']);
    trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

fn is_http_url(s: &str) -> bool {
    Url::parse(s)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

fn is_git_url(s: &str) -> bool {
    Url::parse(s)
        .map(|url| {
            matches!(url.scheme(), "http" | "https")
                && url.has_host()
                && url.path().trim_end_matches('/').ends_with(".git")
        })
        .unwrap_or(false)
}

/// Hands out `<prefix>-input-<n>` ids, monotonic for one apply pass
///
/// Seeded from the graph at pass start so ids freed during the pass are
/// never handed out again.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: FxHashMap<PrimitiveKind, u32>,
}

impl IdAllocator {
    pub fn from_graph(graph: &WorkflowVersionGraph) -> Self {
        let next = PrimitiveKind::ALL
            .into_iter()
            .map(|kind| {
                let max = graph
                    .primitive_nodes
                    .keys()
                    .filter_map(|id| kind.index_of(id))
                    .max()
                    .unwrap_or(0);
                (kind, max + 1)
            })
            .collect();
        Self { next }
    }

    pub fn next_id(&mut self, kind: PrimitiveKind) -> String {
        let next = self.next.entry(kind).or_insert(1);
        let id = kind.id_for(*next);
        *next += 1;
        id
    }
}

/// Creates literal nodes for one apply pass
pub struct PrimitiveNodeManager<'p> {
    ids: IdAllocator,
    probe: &'p dyn FileProbe,
}

impl<'p> PrimitiveNodeManager<'p> {
    pub fn new(graph: &WorkflowVersionGraph, probe: &'p dyn FileProbe) -> Self {
        Self {
            ids: IdAllocator::from_graph(graph),
            probe,
        }
    }

    pub fn normalize(&self, kind: PrimitiveKind, raw: &Value, param: &str) -> Result<Literal> {
        normalize(kind, raw, param, self.probe)
    }

    /// Insert a new primitive node holding `literal`, returning its id
    pub fn create(&mut self, graph: &mut WorkflowVersionGraph, literal: Literal) -> String {
        let mut id = self.ids.next_id(literal.kind);
        while graph.contains(&id) {
            id = self.ids.next_id(literal.kind);
        }

        graph.primitive_nodes.insert(
            id.clone(),
            PrimitiveNode {
                name: id.clone(),
                kind: literal.kind,
                label: literal.label,
                value: literal.value,
                coordinates: Default::default(),
                update_file: literal.pending_upload,
            },
        );
        id
    }
}
