//! Machines Module - validate requested machine counts against fleet maxima
//!
//! Requests come in two shapes:
//! - `machines: 3`                                → uniform count
//! - `machines: {small: 1, medium: 0, large: max}` → per class
//!
//! A count is an integer or `max` / `maximum`. Zero means "skip this class".

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, WeftError};

/// Machine size classes offered by a fleet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineClass {
    Small,
    Medium,
    Large,
}

impl MachineClass {
    pub const ALL: [MachineClass; 3] = [Self::Small, Self::Medium, Self::Large];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for MachineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-class maxima; `None` means the class is not offered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetMaxima {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<u32>,
}

impl FleetMaxima {
    pub fn get(&self, class: MachineClass) -> Option<u32> {
        match class {
            MachineClass::Small => self.small,
            MachineClass::Medium => self.medium,
            MachineClass::Large => self.large,
        }
    }

    /// "small: 3, medium: not offered, large: 5"
    pub fn describe(&self) -> String {
        MachineClass::ALL
            .iter()
            .map(|class| match self.get(*class) {
                Some(max) => format!("{class}: {max}"),
                None => format!("{class}: not offered"),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A requested count for one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineCount {
    Exact(u32),
    /// Whatever the fleet's maximum for the class is
    Max,
}

impl<'de> Deserialize<'de> for MachineCount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Exact(n)),
            Raw::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "max" | "maximum" => Ok(Self::Max),
                other => other.parse().map(Self::Exact).map_err(|_| {
                    de::Error::custom(format!(
                        "invalid machine count '{text}': expected a number or 'max'"
                    ))
                }),
            },
        }
    }
}

/// Per-class request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassCounts {
    #[serde(default)]
    pub small: Option<MachineCount>,
    #[serde(default)]
    pub medium: Option<MachineCount>,
    #[serde(default)]
    pub large: Option<MachineCount>,
}

impl ClassCounts {
    pub fn get(&self, class: MachineClass) -> Option<MachineCount> {
        match class {
            MachineClass::Small => self.small,
            MachineClass::Medium => self.medium,
            MachineClass::Large => self.large,
        }
    }
}

/// Machine request from the run configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MachineRequest {
    /// Same count for every class the fleet offers
    Uniform(MachineCount),
    PerClass(ClassCounts),
}

impl Default for MachineRequest {
    fn default() -> Self {
        Self::Uniform(MachineCount::Exact(1))
    }
}

/// Validated allocation; zero counts are omitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MachineAllocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large: Option<u32>,
}

impl MachineAllocation {
    pub fn get(&self, class: MachineClass) -> Option<u32> {
        match class {
            MachineClass::Small => self.small,
            MachineClass::Medium => self.medium,
            MachineClass::Large => self.large,
        }
    }

    fn set(&mut self, class: MachineClass, count: u32) {
        let slot = match class {
            MachineClass::Small => &mut self.small,
            MachineClass::Medium => &mut self.medium,
            MachineClass::Large => &mut self.large,
        };
        *slot = (count > 0).then_some(count);
    }

    pub fn total(&self) -> u32 {
        MachineClass::ALL
            .iter()
            .filter_map(|class| self.get(*class))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for MachineAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = MachineClass::ALL
            .iter()
            .filter_map(|class| self.get(*class).map(|n| format!("{n} {class}")))
            .collect();
        if parts.is_empty() {
            f.write_str("no machines")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}

/// Check `request` against `fleet` and produce the allocation
pub fn validate_allocation(
    request: &MachineRequest,
    fleet: &FleetMaxima,
) -> Result<MachineAllocation> {
    let mut allocation = MachineAllocation::default();

    for class in MachineClass::ALL {
        let (requested, uniform) = match request {
            MachineRequest::Uniform(count) => (Some(*count), true),
            MachineRequest::PerClass(counts) => (counts.get(class), false),
        };

        let Some(requested) = requested else { continue };
        if requested == MachineCount::Exact(0) {
            continue;
        }

        let Some(maximum) = fleet.get(class) else {
            if uniform {
                warn!(%class, "class not offered by fleet, skipped");
                continue;
            }
            return Err(WeftError::CannotAllocate {
                class: class.to_string(),
            });
        };

        let count = match requested {
            MachineCount::Max => maximum,
            MachineCount::Exact(n) if n > maximum => {
                return Err(WeftError::Overflow {
                    class: class.to_string(),
                    requested: n,
                    maximum,
                    limits: fleet.describe(),
                })
            }
            MachineCount::Exact(n) => n,
        };
        allocation.set(class, count);
    }

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> FleetMaxima {
        FleetMaxima {
            small: Some(3),
            medium: None,
            large: Some(5),
        }
    }

    fn per_class(yaml: &str) -> MachineRequest {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_absent_class_cannot_allocate() {
        let err = validate_allocation(&per_class("{small: 2, medium: 1}"), &fleet()).unwrap_err();
        assert!(matches!(&err, WeftError::CannotAllocate { class } if class == "medium"));
        assert!(err.to_string().contains("medium"));
    }

    #[test]
    fn test_overflow_enumerates_maxima() {
        let err = validate_allocation(&per_class("{large: 6}"), &fleet()).unwrap_err();
        let msg = err.to_string();
        assert_eq!(err.code(), "WEFT-031");
        assert!(msg.contains("small: 3"));
        assert!(msg.contains("medium: not offered"));
        assert!(msg.contains("large: 5"));
    }

    #[test]
    fn test_zero_is_skip_even_for_absent_class() {
        let allocation =
            validate_allocation(&per_class("{small: 0, medium: 0, large: 2}"), &fleet()).unwrap();
        assert_eq!(
            allocation,
            MachineAllocation {
                small: None,
                medium: None,
                large: Some(2)
            }
        );
    }

    #[test]
    fn test_max_keyword() {
        let allocation =
            validate_allocation(&per_class("{small: max, large: Maximum}"), &fleet()).unwrap();
        assert_eq!(allocation.small, Some(3));
        assert_eq!(allocation.large, Some(5));
        assert_eq!(allocation.total(), 8);
        assert_eq!(allocation.to_string(), "3 small, 5 large");
    }

    #[test]
    fn test_uniform_applies_to_offered_classes() {
        let allocation = validate_allocation(&per_class("2"), &fleet()).unwrap();
        assert_eq!(allocation.small, Some(2));
        assert_eq!(allocation.medium, None);
        assert_eq!(allocation.large, Some(2));

        let err = validate_allocation(&per_class("4"), &fleet()).unwrap_err();
        assert!(matches!(err, WeftError::Overflow { ref class, .. } if class == "small"));

        let allocation = validate_allocation(&per_class("max"), &fleet()).unwrap();
        assert_eq!(allocation.total(), 8);
    }

    #[test]
    fn test_uniform_zero_is_empty() {
        let allocation = validate_allocation(&per_class("0"), &fleet()).unwrap();
        assert!(allocation.is_empty());
        assert_eq!(allocation.to_string(), "no machines");
    }

    #[test]
    fn test_bad_count_rejected_at_parse() {
        assert!(serde_yaml::from_str::<MachineRequest>("{small: lots}").is_err());
        assert!(serde_yaml::from_str::<MachineRequest>("{tiny: 1}").is_err());
        assert_eq!(
            serde_yaml::from_str::<MachineRequest>("\"7\"").unwrap(),
            MachineRequest::Uniform(MachineCount::Exact(7))
        );
    }

    #[test]
    fn test_allocation_serializes_without_empty_classes() {
        let allocation = validate_allocation(&per_class("{small: 1}"), &fleet()).unwrap();
        assert_eq!(
            serde_json::to_value(allocation).unwrap(),
            serde_json::json!({"small": 1})
        );
    }
}
