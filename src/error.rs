// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Weft Error Types with Error Codes
//!
//! Error code ranges:
//! - WEFT-001-009: Input / IO errors
//! - WEFT-010-019: Reference errors (resolver)
//! - WEFT-020-029: Type errors (literal values vs. declared parameter types)
//! - WEFT-030-039: Allocation errors (machines)
//! - WEFT-040-049: Structural errors (graph consistency)
//! - WEFT-050: Configuration entry wrapper

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeftError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for fancy terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum WeftError {
    // ═══════════════════════════════════════════
    // INPUT / IO ERRORS (001-009)
    // ═══════════════════════════════════════════
    #[error("[WEFT-001] Failed to parse {what}: {details}")]
    #[diagnostic(code(weft::parse_error), help("Check the file syntax"))]
    ParseError { what: String, details: String },

    #[error("[WEFT-002] IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("[WEFT-003] JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("[WEFT-004] YAML parse error: {0}")]
    #[diagnostic(
        code(weft::yaml_parse),
        help("Check YAML syntax: indentation must be consistent, strings with special chars need quoting")
    )]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[WEFT-005] Config error: {reason}")]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // REFERENCE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[WEFT-010] '{reference}' is not defined in this workflow")]
    #[diagnostic(code(weft::undefined))]
    Undefined { reference: String },

    #[error("[WEFT-011] '{reference}' is ambiguous: matches {}", .candidates.join(", "))]
    #[diagnostic(code(weft::ambiguous))]
    Ambiguous {
        reference: String,
        candidates: Vec<String>,
    },

    #[error("[WEFT-012] Bad reference '{reference}': {reason}")]
    #[diagnostic(code(weft::bad_reference))]
    BadReference { reference: String, reason: String },

    #[error("[WEFT-013] Node '{node}' has no input parameter '{param}'")]
    #[diagnostic(code(weft::unknown_parameter))]
    UnknownParameter { node: String, param: String },

    #[error("[WEFT-014] '{reference}' names {kind} node '{node}', which must be addressed by its id")]
    #[diagnostic(code(weft::incomplete_reference))]
    IncompleteReference {
        reference: String,
        node: String,
        kind: String,
    },

    // ═══════════════════════════════════════════
    // TYPE ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[WEFT-020] Type mismatch for '{param}': expected {expected}, got {actual}")]
    #[diagnostic(code(weft::type_mismatch))]
    TypeMismatch {
        param: String,
        expected: String,
        actual: String,
    },

    #[error("[WEFT-021] Invalid {kind} value '{value}': {reason}")]
    #[diagnostic(code(weft::invalid_literal))]
    InvalidLiteralFormat {
        kind: String,
        value: String,
        reason: String,
    },

    #[error("[WEFT-022] Parameter '{param}' takes a single value, got {count}")]
    #[diagnostic(code(weft::multiple_values))]
    MultipleValues { param: String, count: usize },

    #[error("[WEFT-023] Parameter '{param}' is already fed by node output '{source_node}'")]
    #[diagnostic(code(weft::parameter_connected))]
    ParameterConnected { param: String, source_node: String },

    // ═══════════════════════════════════════════
    // ALLOCATION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[WEFT-030] Cannot allocate {class} machines: the fleet does not offer them")]
    #[diagnostic(code(weft::cannot_allocate))]
    CannotAllocate { class: String },

    #[error("[WEFT-031] Requested {requested} {class} machines, maximum is {maximum} ({limits})")]
    #[diagnostic(code(weft::overflow))]
    Overflow {
        class: String,
        requested: u32,
        maximum: u32,
        limits: String,
    },

    // ═══════════════════════════════════════════
    // STRUCTURAL ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[WEFT-040] Connection {source_id} -> {destination_id} references missing node '{missing}'")]
    #[diagnostic(code(weft::dangling_connection))]
    DanglingConnection {
        source_id: String,
        destination_id: String,
        missing: String,
    },

    #[error("[WEFT-041] Primitive node '{node}' vanished while rewiring '{param}'")]
    #[diagnostic(code(weft::missing_node))]
    MissingNodeDuringCleanup { node: String, param: String },

    #[error("[WEFT-042] Invalid endpoint id '{id}': {reason}")]
    #[diagnostic(code(weft::invalid_endpoint))]
    InvalidEndpoint { id: String, reason: String },

    #[error("[WEFT-043] Cycle detected in workflow graph: {cycle}")]
    #[diagnostic(code(weft::cycle))]
    CycleDetected { cycle: String },

    #[error("[WEFT-044] No connection {source_id} -> {destination_id}")]
    #[diagnostic(code(weft::connection_not_found))]
    ConnectionNotFound {
        source_id: String,
        destination_id: String,
    },

    // ═══════════════════════════════════════════
    // CONFIG ENTRY WRAPPER (050)
    // ═══════════════════════════════════════════
    #[error("[WEFT-050] Input '{key}': {source}")]
    #[diagnostic(code(weft::config_entry))]
    ConfigEntry {
        key: String,
        #[source]
        source: Box<WeftError>,
    },
}

impl WeftError {
    /// Attach the offending configuration key
    pub fn for_key(self, key: impl Into<String>) -> Self {
        match self {
            // Never double-wrap
            wrapped @ Self::ConfigEntry { .. } => wrapped,
            other => Self::ConfigEntry {
                key: key.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, looking through `ConfigEntry`
    pub fn root(&self) -> &WeftError {
        match self {
            Self::ConfigEntry { source, .. } => source.root(),
            other => other,
        }
    }

    /// Configuration key the error was raised for, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::ConfigEntry { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Get the error code (e.g., "WEFT-010")
    pub fn code(&self) -> &'static str {
        match self {
            // Input / IO
            Self::ParseError { .. } => "WEFT-001",
            Self::IoError(_) => "WEFT-002",
            Self::JsonError(_) => "WEFT-003",
            Self::YamlParse(_) => "WEFT-004",
            Self::ConfigError { .. } => "WEFT-005",
            // Reference
            Self::Undefined { .. } => "WEFT-010",
            Self::Ambiguous { .. } => "WEFT-011",
            Self::BadReference { .. } => "WEFT-012",
            Self::UnknownParameter { .. } => "WEFT-013",
            Self::IncompleteReference { .. } => "WEFT-014",
            // Type
            Self::TypeMismatch { .. } => "WEFT-020",
            Self::InvalidLiteralFormat { .. } => "WEFT-021",
            Self::MultipleValues { .. } => "WEFT-022",
            Self::ParameterConnected { .. } => "WEFT-023",
            // Allocation
            Self::CannotAllocate { .. } => "WEFT-030",
            Self::Overflow { .. } => "WEFT-031",
            // Structural
            Self::DanglingConnection { .. } => "WEFT-040",
            Self::MissingNodeDuringCleanup { .. } => "WEFT-041",
            Self::InvalidEndpoint { .. } => "WEFT-042",
            Self::CycleDetected { .. } => "WEFT-043",
            Self::ConnectionNotFound { .. } => "WEFT-044",
            // Wrapper reports the underlying code
            Self::ConfigEntry { source, .. } => source.code(),
        }
    }

    /// Reference errors are fixable by editing the config key
    pub fn is_reference_error(&self) -> bool {
        matches!(
            self.root(),
            Self::Undefined { .. }
                | Self::Ambiguous { .. }
                | Self::BadReference { .. }
                | Self::UnknownParameter { .. }
                | Self::IncompleteReference { .. }
        )
    }
}

impl FixSuggestion for WeftError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            WeftError::ParseError { .. } => Some("Check the file syntax"),
            WeftError::IoError(_) => Some("Check file path and permissions"),
            WeftError::JsonError(_) => {
                Some("Re-export the workflow version; the graph JSON is malformed")
            }
            WeftError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            WeftError::ConfigError { .. } => Some("Check ~/.config/weft/config.toml"),
            WeftError::Undefined { .. } => {
                Some("Use a node id (e.g. nmap-1) or a primitive id (e.g. string-input-1)")
            }
            WeftError::Ambiguous { .. } => Some("Use one of the listed node ids instead of the label"),
            WeftError::BadReference { .. } => Some("Use 'node' or 'node.param' (one dot at most)"),
            WeftError::UnknownParameter { .. } => {
                Some("Run `weft tree --params` to list the node's input parameters")
            }
            WeftError::IncompleteReference { .. } => {
                Some("Tool nodes are addressed by id, e.g. 'nmap-1.target'")
            }
            WeftError::TypeMismatch { .. } => {
                Some("Supply a value of the parameter's declared type")
            }
            WeftError::InvalidLiteralFormat { .. } => Some(
                "FILE takes an http(s) URL or an existing path; FOLDER takes an http(s) .git URL",
            ),
            WeftError::MultipleValues { .. } => {
                Some("Only multi-valued parameters accept a list; pass a single value")
            }
            WeftError::ParameterConnected { .. } => {
                Some("Remove the node connection in the editor before setting a literal")
            }
            WeftError::CannotAllocate { .. } => {
                Some("Request only machine classes the fleet offers, or set them to 0")
            }
            WeftError::Overflow { .. } => Some("Lower the machine count or use 'max'"),
            WeftError::DanglingConnection { .. } => {
                Some("The workflow version is inconsistent; re-save it in the editor")
            }
            WeftError::MissingNodeDuringCleanup { .. } => {
                Some("The workflow version is inconsistent; re-save it in the editor")
            }
            WeftError::InvalidEndpoint { .. } => {
                Some("Endpoints look like output/<node>/<port> or input/<node>/<port>/<source>")
            }
            WeftError::CycleDetected { .. } => Some("Remove circular connections from the workflow"),
            WeftError::ConnectionNotFound { .. } => None,
            WeftError::ConfigEntry { source, .. } => source.fix_suggestion(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_key_wraps_and_reports_inner_code() {
        let err = WeftError::Undefined {
            reference: "nmap".into(),
        }
        .for_key("nmap.target");

        assert_eq!(err.code(), "WEFT-010");
        assert_eq!(err.key(), Some("nmap.target"));
        assert!(err.to_string().contains("nmap.target"));
        assert!(matches!(err.root(), WeftError::Undefined { .. }));
    }

    #[test]
    fn test_for_key_does_not_double_wrap() {
        let err = WeftError::BadReference {
            reference: "a.b.c".into(),
            reason: "too many dots".into(),
        }
        .for_key("a.b.c")
        .for_key("other");

        assert_eq!(err.key(), Some("a.b.c"));
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let err = WeftError::TypeMismatch {
            param: "target".into(),
            expected: "STRING".into(),
            actual: "FOLDER".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("WEFT-020"));
        assert!(msg.contains("expected STRING"));
        assert!(msg.contains("got FOLDER"));
    }

    #[test]
    fn test_ambiguous_lists_candidates() {
        let err = WeftError::Ambiguous {
            reference: "nmap".into(),
            candidates: vec!["nmap-1".into(), "nmap-2".into()],
        };
        assert!(err.to_string().contains("nmap-1, nmap-2"));
    }

    #[test]
    fn test_fix_suggestion_through_wrapper() {
        let err = WeftError::CannotAllocate {
            class: "medium".into(),
        }
        .for_key("machines");
        assert_eq!(
            err.fix_suggestion(),
            Some("Request only machine classes the fleet offers, or set them to 0")
        );
    }

    #[test]
    fn test_is_reference_error() {
        let err = WeftError::UnknownParameter {
            node: "nmap-1".into(),
            param: "ports".into(),
        }
        .for_key("nmap-1.ports");
        assert!(err.is_reference_error());

        let err = WeftError::Overflow {
            class: "small".into(),
            requested: 9,
            maximum: 3,
            limits: "small: 3".into(),
        };
        assert!(!err.is_reference_error());
    }

    #[test]
    fn test_yaml_parse_error_from_serde() {
        let bad: std::result::Result<serde_yaml::Value, _> = serde_yaml::from_str("a: [1, 2");
        let err: WeftError = bad.unwrap_err().into();
        assert_eq!(err.code(), "WEFT-004");
    }
}
