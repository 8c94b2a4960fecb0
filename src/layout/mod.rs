//! Layout Module - display forest and editor coordinates
//!
//! - `tree`: `Forest` projection (children = suppliers) and text rendering
//! - `engine`: `LayoutEngine` heights, reconciliation and X/Y placement

mod engine;
mod tree;

pub use engine::{Layout, LayoutConfig, LayoutEngine};
pub use tree::{Forest, TreeNode};
