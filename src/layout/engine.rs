//! LayoutEngine - height-based columns for the visual editor
//!
//! Algorithm steps:
//! 1. Height per node: leaves are 0, otherwise 1 + max(child heights)
//! 2. Reconcile roots: a root not strictly above its children is raised,
//!    and every raise is pushed to consumers until all edges are ordered
//! 3. X = height × column_spacing
//! 4. Y: nodes of one height sorted by name, centred on 0, spaced by
//!    row_spacing + input_spacing × (most inputs at that height)

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WeftError};
use crate::graph::{Coordinates, WorkflowVersionGraph};

use super::tree::Forest;

/// Spacing configuration (editor units)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between height columns
    pub column_spacing: f64,
    /// Base gap between nodes sharing a column
    pub row_spacing: f64,
    /// Extra gap per input of the widest node in the column
    pub input_spacing: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            column_spacing: 400.0,
            row_spacing: 150.0,
            input_spacing: 30.0,
        }
    }
}

/// Computed heights and coordinates, keyed by node name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    heights: BTreeMap<String, usize>,
    positions: BTreeMap<String, Coordinates>,
}

impl Layout {
    pub fn height(&self, name: &str) -> Option<usize> {
        self.heights.get(name).copied()
    }

    pub fn position(&self, name: &str) -> Option<Coordinates> {
        self.positions.get(name).copied()
    }

    pub fn positions(&self) -> impl Iterator<Item = (&str, Coordinates)> {
        self.positions.iter().map(|(name, pos)| (name.as_str(), *pos))
    }

    /// Node names grouped by height, lowest first, each column sorted
    pub fn columns(&self) -> Vec<Vec<&str>> {
        let mut columns: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (name, height) in &self.heights {
            columns.entry(*height).or_default().push(name);
        }
        columns.into_values().collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn compute(&self, forest: &Forest) -> Result<Layout> {
        let mut heights = compute_heights(forest)?;
        if forest.roots().len() > 1 {
            reconcile_heights(forest, &mut heights);
        }

        let mut columns: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
        for (name, height) in &heights {
            columns.entry(*height).or_default().push(*name);
        }

        let mut positions = BTreeMap::new();
        for (height, mut names) in columns {
            names.sort_unstable();
            let widest = names
                .iter()
                .filter_map(|name| forest.get(name))
                .map(|node| node.inputs)
                .max()
                .unwrap_or(0);
            let gap = self.config.row_spacing + self.config.input_spacing * widest as f64;
            let centre = (names.len() as f64 - 1.0) / 2.0;
            let x = height as f64 * self.config.column_spacing;

            for (i, name) in names.into_iter().enumerate() {
                let y = (i as f64 - centre) * gap;
                positions.insert(name.to_string(), Coordinates { x, y });
            }
        }

        debug!(nodes = positions.len(), "layout computed");
        Ok(Layout {
            heights: heights
                .into_iter()
                .map(|(name, height)| (name.to_string(), height))
                .collect(),
            positions,
        })
    }
}

/// Bottom-up heights with DFS three-color cycle detection
fn compute_heights(forest: &Forest) -> Result<FxHashMap<&str, usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        Gray,
        Black,
    }

    fn visit<'f>(
        name: &'f str,
        forest: &'f Forest,
        heights: &mut FxHashMap<&'f str, usize>,
        colors: &mut FxHashMap<&'f str, Color>,
        stack: &mut Vec<&'f str>,
    ) -> std::result::Result<usize, String> {
        match colors.get(name) {
            Some(Color::Black) => return Ok(heights.get(name).copied().unwrap_or(0)),
            Some(Color::Gray) => {
                let start = stack.iter().position(|n| *n == name).unwrap_or(0);
                return Err(format!("{} → {name}", stack[start..].join(" → ")));
            }
            None => {}
        }

        colors.insert(name, Color::Gray);
        stack.push(name);

        let mut height = 0;
        if let Some(node) = forest.get(name) {
            for child in &node.children {
                height = height.max(visit(child, forest, heights, colors, stack)? + 1);
            }
        }

        stack.pop();
        colors.insert(name, Color::Black);
        heights.insert(name, height);
        Ok(height)
    }

    let mut heights = FxHashMap::default();
    let mut colors = FxHashMap::default();
    let mut stack = Vec::new();
    for node in forest.nodes() {
        visit(&node.name, forest, &mut heights, &mut colors, &mut stack)
            .map_err(|cycle| WeftError::CycleDetected { cycle })?;
    }
    Ok(heights)
}

/// Raise any node sitting at or below one of its children, then push each
/// raise up through its consumers until every edge climbs
fn reconcile_heights<'f>(forest: &'f Forest, heights: &mut FxHashMap<&'f str, usize>) {
    let mut queue: VecDeque<&str> = forest.nodes().map(|node| node.name.as_str()).collect();

    while let Some(name) = queue.pop_front() {
        let Some(node) = forest.get(name) else { continue };
        let floor = node
            .children
            .iter()
            .filter_map(|child| heights.get(child.as_str()).copied())
            .max();
        let current = heights.get(name).copied().unwrap_or(0);

        if let Some(floor) = floor {
            if current <= floor {
                heights.insert(&node.name, floor + 1);
                queue.extend(node.parents.iter().map(String::as_str));
            }
        }
    }
}

impl WorkflowVersionGraph {
    /// Write computed coordinates into nodes and primitive nodes
    pub fn apply_layout(&mut self, layout: &Layout) {
        for (name, position) in layout.positions() {
            if let Some(node) = self.nodes.get_mut(name) {
                node.meta.coordinates = position;
            } else if let Some(primitive) = self.primitive_nodes.get_mut(name) {
                primitive.coordinates = position;
            }
        }
    }
}
