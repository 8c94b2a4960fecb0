//! TreeProjector - graph to display forest
//!
//! Edges point from consumer to supplier: a node's children feed it, its
//! parents consume it. Roots are nodes nothing consumes (the workflow's
//! final steps).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::graph::WorkflowVersionGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub name: String,
    pub label: String,
    /// Suppliers, sorted by name
    pub children: Vec<String>,
    /// Consumers, sorted by name
    pub parents: Vec<String>,
    /// Declared input parameters (0 for literals)
    pub inputs: usize,
    pub primitive: bool,
}

impl TreeNode {
    fn new(name: &str, label: &str, inputs: usize, primitive: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            children: Vec::new(),
            parents: Vec::new(),
            inputs,
            primitive,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Forest {
    nodes: BTreeMap<String, TreeNode>,
    roots: Vec<String>,
}

impl Forest {
    /// Project `graph`; literal nodes become leaves when `include_primitives`
    pub fn project(graph: &WorkflowVersionGraph, include_primitives: bool) -> Self {
        let mut nodes: BTreeMap<String, TreeNode> = graph
            .nodes
            .values()
            .map(|node| {
                let tree = TreeNode::new(&node.name, node.label(), node.params().count(), false);
                (node.name.clone(), tree)
            })
            .collect();

        if include_primitives {
            for primitive in graph.primitive_nodes.values() {
                nodes.insert(
                    primitive.name.clone(),
                    TreeNode::new(&primitive.name, &primitive.label, 0, true),
                );
            }
        }

        for conn in &graph.connections {
            let supplier = conn.source.node();
            let consumer = conn.destination.node();
            if !nodes.contains_key(supplier) || !nodes.contains_key(consumer) {
                continue;
            }
            if let Some(node) = nodes.get_mut(consumer) {
                push_unique(&mut node.children, supplier);
            }
            if let Some(node) = nodes.get_mut(supplier) {
                push_unique(&mut node.parents, consumer);
            }
        }

        for node in nodes.values_mut() {
            node.children.sort();
            node.parents.sort();
        }

        let roots = nodes
            .values()
            .filter(|node| node.parents.is_empty())
            .map(|node| node.name.clone())
            .collect();

        Self { nodes, roots }
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn get(&self, name: &str) -> Option<&TreeNode> {
        self.nodes.get(name)
    }

    /// Nodes in name order
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Indented text tree, one per root
    ///
    /// Shared suppliers are drawn under every consumer. A supplier already on
    /// the current path is marked `(cycle)` and not expanded.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut path: FxHashSet<&str> = FxHashSet::default();
        for root in &self.roots {
            if let Some(node) = self.nodes.get(root) {
                let _ = writeln!(out, "{}", describe(node));
                path.insert(node.name.as_str());
                self.render_children(node, "", &mut path, &mut out);
                path.remove(node.name.as_str());
            }
        }
        out
    }

    fn render_children<'a>(
        &'a self,
        node: &'a TreeNode,
        prefix: &str,
        path: &mut FxHashSet<&'a str>,
        out: &mut String,
    ) {
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let Some(child) = self.nodes.get(child) else {
                continue;
            };
            let last = i + 1 == count;
            let (branch, indent) = if last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };

            if !path.insert(child.name.as_str()) {
                let _ = writeln!(out, "{prefix}{branch}{} (cycle)", describe(child));
                continue;
            }
            let _ = writeln!(out, "{prefix}{branch}{}", describe(child));
            self.render_children(child, &format!("{prefix}{indent}"), path, out);
            path.remove(child.name.as_str());
        }
    }
}

fn describe(node: &TreeNode) -> String {
    if node.label.is_empty() || node.label == node.name {
        node.name.clone()
    } else {
        format!("{} ({})", node.name, node.label)
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}
