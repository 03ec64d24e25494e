use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::ReferenceError;
use crate::node::ActionNode;

const TEMP_PREFIX: &str = "temp:";

/// How an edge addresses an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeReference {
  /// An action by its position in the submitted action list.
  New(usize),
  /// An action that already has a persisted identifier.
  Existing(Uuid),
}

impl FromStr for NodeReference {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.is_empty() {
      return Err(ReferenceError::Missing);
    }

    if let Some(index) = s.strip_prefix(TEMP_PREFIX) {
      return index
        .parse::<usize>()
        .map(NodeReference::New)
        .map_err(|_| ReferenceError::Malformed(s.to_string()));
    }

    Uuid::parse_str(s)
      .map(NodeReference::Existing)
      .map_err(|_| ReferenceError::Malformed(s.to_string()))
  }
}

impl fmt::Display for NodeReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NodeReference::New(index) => write!(f, "{TEMP_PREFIX}{index}"),
      NodeReference::Existing(id) => write!(f, "{id}"),
    }
  }
}

/// Resolves references to positions in a submitted action list.
///
/// Every action at index `i` answers to `temp:i`; an action that carries a
/// persisted id answers to that id as well. Update requests can therefore mix
/// both forms in one edge list.
#[derive(Debug, Clone)]
pub struct ReferenceMap {
  count: usize,
  persisted: HashMap<Uuid, usize>,
}

impl ReferenceMap {
  pub fn new(actions: &[ActionNode]) -> Self {
    let persisted = actions
      .iter()
      .enumerate()
      .filter_map(|(index, action)| action.id.map(|id| (id, index)))
      .collect();

    Self {
      count: actions.len(),
      persisted,
    }
  }

  /// Number of actions this map addresses.
  pub fn len(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  /// Resolve a reference to the index of the action it names.
  pub fn resolve(&self, reference: &NodeReference) -> Result<usize, ReferenceError> {
    match *reference {
      NodeReference::New(index) if index < self.count => Ok(index),
      NodeReference::New(index) => Err(ReferenceError::TempIndexOutOfBounds {
        index,
        count: self.count,
      }),
      NodeReference::Existing(id) => self
        .persisted
        .get(&id)
        .copied()
        .ok_or(ReferenceError::NotFound(id)),
    }
  }
}
