//! Run configuration file
//!
//! ```yaml
//! machines: 3              # or {small: 1, medium: 0, large: max}
//! inputs:
//!   nmap-1.target: example.com
//!   file-splitter-1.files: [a.txt, b.txt]
//!   string-input-3: "new literal"
//! outputs: [nmap-1, collect-hosts]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::machines::MachineRequest;

/// Parsed run configuration; every section is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub machines: Option<MachineRequest>,
    /// Sorted by key, which is also the apply order
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl RunConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machines::{MachineCount, MachineRequest};
    use serde_json::json;

    #[test]
    fn test_full_config() {
        let config = RunConfig::from_yaml(
            r#"
machines: {small: 1, large: max}
inputs:
  nmap-1.target: example.com
  file-splitter-1.files: [a.txt, b.txt]
  nmap-1.verbose: true
  nmap-1.ports: 443
outputs: [nmap-1, collect-hosts]
"#,
        )
        .unwrap();

        match config.machines {
            Some(MachineRequest::PerClass(counts)) => {
                assert_eq!(counts.small, Some(MachineCount::Exact(1)));
                assert_eq!(counts.large, Some(MachineCount::Max));
                assert_eq!(counts.medium, None);
            }
            other => panic!("Expected per-class request, got {other:?}"),
        }
        assert_eq!(config.inputs["nmap-1.target"], json!("example.com"));
        assert_eq!(config.inputs["file-splitter-1.files"], json!(["a.txt", "b.txt"]));
        assert_eq!(config.inputs["nmap-1.verbose"], json!(true));
        assert_eq!(config.inputs["nmap-1.ports"], json!(443));
        assert_eq!(config.outputs, vec!["nmap-1", "collect-hosts"]);

        let keys: Vec<&str> = config.inputs.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["file-splitter-1.files", "nmap-1.ports", "nmap-1.target", "nmap-1.verbose"]
        );
    }

    #[test]
    fn test_empty_and_partial() {
        assert_eq!(RunConfig::from_yaml("").unwrap(), RunConfig::default());

        let config = RunConfig::from_yaml("machines: max").unwrap();
        assert_eq!(
            config.machines,
            Some(MachineRequest::Uniform(MachineCount::Max))
        );
        assert!(config.inputs.is_empty());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let err = RunConfig::from_yaml("input:\n  a.b: 1\n").unwrap_err();
        assert_eq!(err.code(), "WEFT-004");
    }
}
