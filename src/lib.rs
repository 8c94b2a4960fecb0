//! Weft - run configurator for remote DAG workflows
//!
//! Turns a declarative run configuration (input values, outputs, machine
//! counts) into a rewritten workflow version graph ready to be stored.
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  graph/     Workflow version graph (Node, PrimitiveNode,     │
//! │             PortRef, Connection)                             │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  resolve/   Reference strings → canonical ids                │
//! │  wiring/    Literal nodes, ids, connect / disconnect         │
//! │  apply/     RunConfig, ConfigApplier, plan_run               │
//! │  machines/  Machine counts vs. fleet maxima                  │
//! │  layout/    Display forest and editor coordinates            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`graph`] | Serde model of nodes, literals and connections |
//! | [`resolve`] | Id / label resolution with ambiguity detection |
//! | [`wiring`] | Literal normalization, id allocation, edge editing |
//! | [`apply`] | Pure graph rewrite from a run configuration |
//! | [`machines`] | `MachineAllocation` validation |
//! | [`layout`] | `Forest` projection and `LayoutEngine` |
//! | [`config`] | `~/.config/weft/config.toml` |
//! | [`error`] | Error types with codes and fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - remote graph schema
// ═══════════════════════════════════════════════════════════════
pub mod graph;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - configuration → graph mutation
// ═══════════════════════════════════════════════════════════════
pub mod apply;
pub mod layout;
pub mod machines;
pub mod resolve;
pub mod wiring;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, Result, WeftError};

// Config types
pub use config::WeftConfig;

// Graph types
pub use graph::{
    Connection, InputPort, Node, NodeKind, PortRef, PrimitiveKind, PrimitiveNode,
    WorkflowVersionGraph,
};

// Apply pipeline
pub use apply::{plan_run, Applied, ConfigApplier, PendingUpload, RunConfig, RunPlan};
pub use machines::{validate_allocation, FleetMaxima, MachineAllocation, MachineRequest};
pub use resolve::NodeResolver;
pub use wiring::{FileProbe, LocalFiles, NoLocalFiles, PrimitiveNodeManager};

// Layout
pub use layout::{Forest, Layout, LayoutConfig, LayoutEngine};
