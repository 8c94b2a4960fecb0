//! Apply Module - run configuration to new workflow version
//!
//! - `run_config`: YAML `RunConfig` (machines, inputs, outputs)
//! - `applier`: `ConfigApplier`, the pure graph rewrite
//! - `plan`: `plan_run`, applier + outputs + machines + layout

mod applier;
mod plan;
mod run_config;

pub use applier::{Applied, ConfigApplier, PendingUpload};
pub use plan::{plan_run, RunPlan};
pub use run_config::RunConfig;
