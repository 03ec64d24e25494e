use std::collections::VecDeque;

use crate::error::{ReferenceError, WorkflowError};
use crate::node::{ActionNode, WorkflowEdge};
use crate::reference::ReferenceMap;

/// Directed graph over action indices plus one synthetic start node.
///
/// Node `i` for `i < action_count` is the submitted action at index `i`; the
/// node at `action_count` is the synthetic start node, whose only outgoing
/// edge leads to the start edge's target.
#[derive(Debug, Clone)]
pub struct ActionGraph {
  /// Adjacency list: node -> downstream nodes.
  adjacency: Vec<Vec<usize>>,
  /// Number of incoming edges per node.
  in_degree: Vec<usize>,
  /// Target of the start edge.
  entry: usize,
}

impl ActionGraph {
  /// Build the graph, resolving every edge reference through `refs`.
  ///
  /// Fails unless exactly one start edge is present.
  pub fn build(refs: &ReferenceMap, edges: &[WorkflowEdge]) -> Result<Self, WorkflowError> {
    match edges.iter().filter(|e| e.is_start()).count() {
      0 => return Err(WorkflowError::MissingStartEdge),
      1 => {}
      count => return Err(WorkflowError::MultipleStartEdges { count }),
    }

    let start = refs.len();
    let mut adjacency = vec![Vec::new(); start + 1];
    let mut in_degree = vec![0; start + 1];
    let mut entry = start;

    for (index, edge) in edges.iter().enumerate() {
      let target = refs
        .resolve(&edge.target)
        .map_err(|source| WorkflowError::InvalidTarget {
          edge: index,
          source,
        })?;

      let from = if edge.is_start() {
        entry = target;
        start
      } else {
        let source = edge.source.as_ref().ok_or(WorkflowError::InvalidSource {
          edge: index,
          source: ReferenceError::Missing,
        })?;
        refs
          .resolve(source)
          .map_err(|source| WorkflowError::InvalidSource {
            edge: index,
            source,
          })?
      };

      adjacency[from].push(target);
      in_degree[target] += 1;
    }

    Ok(Self {
      adjacency,
      in_degree,
      entry,
    })
  }

  /// Number of real action nodes.
  pub fn action_count(&self) -> usize {
    self.adjacency.len() - 1
  }

  /// Index of the synthetic start node.
  pub fn start_node(&self) -> usize {
    self.action_count()
  }

  /// The action the start edge points at.
  pub fn entry(&self) -> usize {
    self.entry
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node: usize) -> &[usize] {
    self
      .adjacency
      .get(node)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Topological order of all nodes (Kahn's algorithm), or
  /// [`WorkflowError::CycleDetected`] if some nodes can never be released.
  pub fn topological_order(&self) -> Result<Vec<usize>, WorkflowError> {
    let mut in_degree = self.in_degree.clone();
    let mut queue: VecDeque<usize> = in_degree
      .iter()
      .enumerate()
      .filter(|(_, degree)| **degree == 0)
      .map(|(node, _)| node)
      .collect();

    let mut order = Vec::with_capacity(self.adjacency.len());
    while let Some(node) = queue.pop_front() {
      order.push(node);
      for &next in &self.adjacency[node] {
        in_degree[next] -= 1;
        if in_degree[next] == 0 {
          queue.push_back(next);
        }
      }
    }

    if order.len() < self.adjacency.len() {
      return Err(WorkflowError::CycleDetected);
    }
    Ok(order)
  }

  /// Actions never visited by a breadth-first walk from the entry action,
  /// in ascending index order.
  pub fn unreachable(&self) -> Vec<usize> {
    let count = self.action_count();
    let mut visited = vec![false; count];
    let mut queue = VecDeque::from([self.entry]);
    visited[self.entry] = true;

    while let Some(node) = queue.pop_front() {
      for &next in &self.adjacency[node] {
        if !visited[next] {
          visited[next] = true;
          queue.push_back(next);
        }
      }
    }

    (0..count).filter(|&node| !visited[node]).collect()
  }
}

/// Check that `actions` and `edges` form an executable workflow graph:
/// exactly one start edge, every reference resolvable, no cycle, and every
/// action reachable from the start.
pub fn validate_graph(actions: &[ActionNode], edges: &[WorkflowEdge]) -> Result<(), WorkflowError> {
  if actions.is_empty() {
    return Err(WorkflowError::NoActions);
  }

  let refs = ReferenceMap::new(actions);
  let graph = ActionGraph::build(&refs, edges)?;

  graph.topological_order()?;

  if let Some(&index) = graph.unreachable().first() {
    return Err(WorkflowError::Unreachable {
      index,
      name: actions[index].name.clone(),
    });
  }

  Ok(())
}
