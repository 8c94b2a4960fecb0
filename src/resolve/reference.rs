//! Configuration key syntax
//!
//! - `ref`        → a primitive node (id or unique label)
//! - `ref.param`  → a parameter of a node

use crate::error::{Result, WeftError};

/// Parsed configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// No dot: an existing literal node
    Primitive(&'a str),
    /// `node.param`
    Param { node: &'a str, param: &'a str },
}

impl<'a> Reference<'a> {
    pub fn parse(key: &'a str) -> Result<Self> {
        let bad = |reason: &str| WeftError::BadReference {
            reference: key.to_string(),
            reason: reason.to_string(),
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(bad("empty reference"));
        }

        match key.split_once('.') {
            None => Ok(Self::Primitive(key)),
            Some((_, rest)) if rest.contains('.') => {
                Err(bad("expected 'node.param' with a single dot"))
            }
            Some(("", _)) => Err(bad("missing node before '.'")),
            Some((_, "")) => Err(bad("missing parameter after '.'")),
            Some((node, param)) => Ok(Self::Param { node, param }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive_reference() {
        assert_eq!(
            Reference::parse("string-input-1").unwrap(),
            Reference::Primitive("string-input-1")
        );
    }

    #[test]
    fn test_parse_param_reference() {
        assert_eq!(
            Reference::parse("nmap-1.target").unwrap(),
            Reference::Param {
                node: "nmap-1",
                param: "target"
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for key in ["", "  ", "a.b.c", ".target", "nmap-1."] {
            let err = Reference::parse(key).unwrap_err();
            assert_eq!(err.code(), "WEFT-012", "{key:?}");
        }
    }
}
