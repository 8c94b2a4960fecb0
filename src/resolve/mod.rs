//! Resolve Module - user references to canonical graph ids
//!
//! - `reference`: configuration key syntax (`ref` vs `ref.param`)
//! - `resolver`: `NodeResolver` with ambiguity detection

mod reference;
mod resolver;

pub use reference::Reference;
pub use resolver::{NodeResolver, ParamRef};
