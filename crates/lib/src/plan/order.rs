//! Dependency ordering between artifacts via their parents.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::artifact::ParentRef;

use super::PlanError;

/// An artifact taking part in ordering.
#[derive(Debug, Clone)]
pub struct OrderNode<'a> {
  pub label: &'a str,
  pub namespace: &'a str,
  pub name: &'a str,
  pub parents: &'a [String],
}

/// Order labels so every parent comes before the artifacts extending it.
///
/// Only parents that name another node in the same namespace create an edge.
/// Parents scoped to `system` live outside user namespaces and are ignored.
pub fn dependency_order(nodes: &[OrderNode<'_>]) -> Result<Vec<String>, PlanError> {
  let mut graph: DiGraph<&str, ()> = DiGraph::new();
  let mut by_name: HashMap<(&str, &str), NodeIndex> = HashMap::new();

  let indices: Vec<NodeIndex> = nodes
    .iter()
    .map(|node| {
      let idx = graph.add_node(node.label);
      by_name.insert((node.namespace, node.name), idx);
      idx
    })
    .collect();

  for (node, &child) in nodes.iter().zip(&indices) {
    for parent in node.parents.iter().map(|p| ParentRef::parse(p)) {
      if parent.scope.is_some_and(|scope| scope.eq_ignore_ascii_case("system")) {
        continue;
      }
      if let Some(&parent_idx) = by_name.get(&(node.namespace, parent.name))
        && parent_idx != child
      {
        graph.add_edge(parent_idx, child, ());
      }
    }
  }

  let sorted = toposort(&graph, None).map_err(|cycle| PlanError::DependencyCycle {
    label: graph[cycle.node_id()].to_string(),
  })?;
  Ok(sorted.into_iter().map(|idx| graph[idx].to_string()).collect())
}
