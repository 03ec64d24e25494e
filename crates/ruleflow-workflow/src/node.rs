use ruleflow_config::{ActionType, EdgeType};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::reference::NodeReference;

/// A submitted action after shape parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
  /// Persisted identifier, present when the request updates an existing action.
  pub id: Option<Uuid>,
  pub name: String,
  pub description: String,
  pub action_type: ActionType,
  pub config: Value,
  pub is_active: bool,
}

impl ActionNode {
  /// The reference an edge would use for this action at `index`.
  pub fn reference(&self, index: usize) -> NodeReference {
    match self.id {
      Some(id) => NodeReference::Existing(id),
      None => NodeReference::New(index),
    }
  }
}

/// A submitted edge after shape parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEdge {
  /// `None` only for the start edge.
  pub source: Option<NodeReference>,
  pub target: NodeReference,
  pub edge_type: EdgeType,
  pub source_output: Option<String>,
  pub edge_order: i64,
}

impl WorkflowEdge {
  pub fn is_start(&self) -> bool {
    self.edge_type == EdgeType::Start
  }
}

/// A parsed workflow request with typed identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowPlan {
  pub name: String,
  pub description: String,
  pub is_active: bool,
  pub entity_id: Uuid,
  pub trigger_type_id: Uuid,
  pub trigger_conditions: Option<Value>,
  pub canvas_layout: Option<Value>,
  pub actions: Vec<ActionNode>,
  pub edges: Vec<WorkflowEdge>,
}
