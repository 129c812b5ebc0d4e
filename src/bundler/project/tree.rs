//! The project tree: named projects and their children.

use super::ProjectNode;
use crate::bundler::{Arch, Error, Result, error::ErrorExt};
use petgraph::{algo::toposort, graph::DiGraph};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Write as _,
    path::Path,
};

/// All configured projects, by name.
#[derive(Clone, Debug, Default)]
pub struct ProjectTree {
    nodes: BTreeMap<String, ProjectNode>,
}

impl ProjectTree {
    /// Parses a project tree document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut nodes: BTreeMap<String, ProjectNode> = serde_json::from_str(json)?;
        for node in nodes.values_mut() {
            node.collect_arch_lists()?;
        }
        Ok(Self { nodes })
    }

    /// Reads a project tree file.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .fs_context("reading project tree", path)?;
        Self::from_json_str(&json)
    }

    /// Project by name.
    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        self.nodes.get(name)
    }

    /// Whether a project is configured.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Configured project names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Checks that every child is configured and that no project contains
    /// itself.
    pub fn validate(&self) -> Result<()> {
        let mut graph = DiGraph::<&str, ()>::new();
        let index: HashMap<&str, _> = self
            .nodes
            .keys()
            .map(|name| (name.as_str(), graph.add_node(name.as_str())))
            .collect();

        for (name, node) in &self.nodes {
            for child in node.all_children() {
                let Some(&to) = index.get(child.as_str()) else {
                    return Err(Error::UnknownProject(child.clone()));
                };
                graph.update_edge(index[name.as_str()], to, ());
            }
        }

        toposort(&graph, None)
            .map(|_| ())
            .map_err(|cycle| Error::ProjectCycle(graph[cycle.node_id()].to_string()))
    }

    /// Renders the subtree below `root` as seen on `run_arch`.
    ///
    /// Each project is printed as `-- name (arch)`, with two more dashes per
    /// level.
    pub fn render(&self, root: &str, run_arch: Arch) -> String {
        let mut out = String::from("Project Tree:\n");
        if self.contains(root) {
            self.render_node(&mut out, root, run_arch, 1);
        }
        out
    }

    fn render_node(&self, out: &mut String, name: &str, run_arch: Arch, depth: usize) {
        let Some(node) = self.get(name) else {
            return;
        };
        let arch = match &node.arch {
            Some(spec) => spec.to_string(),
            None => run_arch.to_string(),
        };
        let _ = writeln!(out, "{} {name} ({arch})", "--".repeat(depth));
        for child in node.children(run_arch) {
            self.render_node(out, child, run_arch, depth + 1);
        }
    }
}
