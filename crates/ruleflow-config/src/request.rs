use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A workflow save request: rule metadata plus its action graph.
///
/// The same document is used for create, update and dry-run. Identifiers and
/// enumerations are kept as strings here so that a malformed value surfaces
/// as a field error from validation rather than a decode failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRequest {
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub is_active: bool,
  pub entity_id: String,
  pub trigger_type_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub trigger_conditions: Option<Value>,
  pub actions: Vec<ActionRequest>,
  pub edges: Vec<EdgeRequest>,
  /// UI-only layout document, stored and returned untouched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub canvas_layout: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
  /// Persisted identifier of an existing action. Absent for new actions,
  /// which edges then address as `temp:<index>`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub name: String,
  #[serde(default)]
  pub description: String,
  pub action_type: String,
  pub action_config: Value,
  pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRequest {
  /// Absent for the start edge.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_action_id: Option<String>,
  pub target_action_id: String,
  pub edge_type: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_output: Option<String>,
  #[serde(default)]
  pub edge_order: i64,
}
