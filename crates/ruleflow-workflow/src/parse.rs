use std::collections::HashSet;

use ruleflow_config::{ActionRequest, ActionType, EdgeRequest, EdgeType, WorkflowRequest};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ReferenceError, WorkflowError};
use crate::node::{ActionNode, WorkflowEdge, WorkflowPlan};
use crate::reference::NodeReference;

const MAX_NAME_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Check the shape of a request and convert it into typed form.
///
/// Fails on the first problem found. Graph structure and action config
/// contents are not examined here.
pub fn parse_request(request: &WorkflowRequest) -> Result<WorkflowPlan, WorkflowError> {
  check_name("name", &request.name)?;
  check_description("description", &request.description)?;

  let entity_id = parse_uuid("entity_id", &request.entity_id)?;
  let trigger_type_id = parse_uuid("trigger_type_id", &request.trigger_type_id)?;
  let trigger_conditions = optional_object("trigger_conditions", &request.trigger_conditions)?;
  let canvas_layout = optional_object("canvas_layout", &request.canvas_layout)?;

  let mut seen = HashSet::new();
  let mut actions = Vec::with_capacity(request.actions.len());
  for (index, action) in request.actions.iter().enumerate() {
    let node = parse_action(index, action)?;
    if let Some(id) = node.id {
      if !seen.insert(id) {
        return Err(WorkflowError::DuplicateActionId(id));
      }
    }
    actions.push(node);
  }

  let edges = request
    .edges
    .iter()
    .enumerate()
    .map(|(index, edge)| parse_edge(index, edge))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(WorkflowPlan {
    name: request.name.trim().to_string(),
    description: request.description.clone(),
    is_active: request.is_active,
    entity_id,
    trigger_type_id,
    trigger_conditions,
    canvas_layout,
    actions,
    edges,
  })
}

fn parse_action(index: usize, action: &ActionRequest) -> Result<ActionNode, WorkflowError> {
  let prefix = format!("actions[{index}]");

  let id = match action.id.as_deref() {
    None | Some("") => None,
    Some(raw) => Some(parse_uuid(&format!("{prefix}.id"), raw)?),
  };

  check_name(&format!("{prefix}.name"), &action.name)?;
  check_description(&format!("{prefix}.description"), &action.description)?;

  let action_type: ActionType = action
    .action_type
    .parse()
    .map_err(|e| WorkflowError::field(format!("{prefix}.action_type"), format!("{e}")))?;

  if !action.action_config.is_object() {
    return Err(WorkflowError::field(
      format!("{prefix}.action_config"),
      "must be an object",
    ));
  }

  Ok(ActionNode {
    id,
    name: action.name.trim().to_string(),
    description: action.description.clone(),
    action_type,
    config: action.action_config.clone(),
    is_active: action.is_active,
  })
}

fn parse_edge(index: usize, edge: &EdgeRequest) -> Result<WorkflowEdge, WorkflowError> {
  let target = edge
    .target_action_id
    .parse::<NodeReference>()
    .map_err(|source| WorkflowError::InvalidTarget {
      edge: index,
      source,
    })?;

  let source = match edge.source_action_id.as_deref() {
    None | Some("") => None,
    Some(raw) => Some(
      raw
        .parse::<NodeReference>()
        .map_err(|source| WorkflowError::InvalidSource {
          edge: index,
          source,
        })?,
    ),
  };

  let edge_type: EdgeType = edge
    .edge_type
    .parse()
    .map_err(|e| WorkflowError::field(format!("edges[{index}].edge_type"), format!("{e}")))?;

  if edge_type == EdgeType::Start && source.is_some() {
    return Err(WorkflowError::InvalidSource {
      edge: index,
      source: ReferenceError::SourceOnStartEdge,
    });
  }

  if edge.edge_order < 0 {
    return Err(WorkflowError::field(
      format!("edges[{index}].edge_order"),
      "must be zero or greater",
    ));
  }

  Ok(WorkflowEdge {
    source,
    target,
    edge_type,
    source_output: edge.source_output.clone().filter(|s| !s.is_empty()),
    edge_order: edge.edge_order,
  })
}

fn check_name(field: &str, value: &str) -> Result<(), WorkflowError> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(WorkflowError::field(field, "is required"));
  }
  if trimmed.chars().count() > MAX_NAME_CHARS {
    return Err(WorkflowError::field(
      field,
      format!("must be at most {MAX_NAME_CHARS} characters"),
    ));
  }
  Ok(())
}

fn check_description(field: &str, value: &str) -> Result<(), WorkflowError> {
  if value.chars().count() > MAX_DESCRIPTION_CHARS {
    return Err(WorkflowError::field(
      field,
      format!("must be at most {MAX_DESCRIPTION_CHARS} characters"),
    ));
  }
  Ok(())
}

fn parse_uuid(field: &str, value: &str) -> Result<Uuid, WorkflowError> {
  if value.is_empty() {
    return Err(WorkflowError::field(field, "is required"));
  }
  Uuid::parse_str(value).map_err(|_| WorkflowError::field(field, "must be a valid UUID"))
}

fn optional_object(field: &str, value: &Option<Value>) -> Result<Option<Value>, WorkflowError> {
  match value {
    None | Some(Value::Null) => Ok(None),
    Some(v @ Value::Object(_)) => Ok(Some(v.clone())),
    Some(_) => Err(WorkflowError::field(field, "must be an object")),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::ReferenceError;
  use serde_json::json;

  fn request() -> WorkflowRequest {
    serde_json::from_value(json!({
      "name": "Reorder widgets",
      "description": "Raise an alert when stock runs low",
      "is_active": true,
      "entity_id": "7b0e4f8e-5d7b-4c55-9d43-0f8f0f7f6a11",
      "trigger_type_id": "0f5d6c1e-2a3b-4c5d-8e9f-a0b1c2d3e4f5",
      "trigger_conditions": { "field": "quantity", "operator": "lt", "value": 10 },
      "actions": [{
        "name": "Alert",
        "action_type": "create_alert",
        "action_config": { "alert_type": "stock", "severity": "info", "title": "t", "message": "m" },
        "is_active": true
      }],
      "edges": [{ "target_action_id": "temp:0", "edge_type": "start", "edge_order": 0 }],
      "canvas_layout": { "nodes": [] }
    }))
    .unwrap()
  }

  #[test]
  fn parses_a_well_formed_request() {
    let plan = parse_request(&request()).unwrap();
    assert_eq!(plan.name, "Reorder widgets");
    assert_eq!(plan.actions[0].action_type, ActionType::CreateAlert);
    assert_eq!(plan.edges[0].target, NodeReference::New(0));
    assert!(plan.edges[0].source.is_none());
    assert!(plan.canvas_layout.is_some());
  }

  #[test]
  fn rejects_blank_and_overlong_names() {
    let mut req = request();
    req.name = "   ".to_string();
    assert_eq!(
      parse_request(&req).unwrap_err(),
      WorkflowError::field("name", "is required")
    );

    req.name = "x".repeat(256);
    assert!(matches!(
      parse_request(&req),
      Err(WorkflowError::InvalidField { field, .. }) if field == "name"
    ));

    req.name = "x".repeat(255);
    assert!(parse_request(&req).is_ok());
  }

  #[test]
  fn rejects_overlong_description() {
    let mut req = request();
    req.description = "d".repeat(1001);
    assert!(matches!(
      parse_request(&req),
      Err(WorkflowError::InvalidField { field, .. }) if field == "description"
    ));
  }

  #[test]
  fn rejects_invalid_uuids() {
    let mut req = request();
    req.entity_id = "entity-1".to_string();
    assert_eq!(
      parse_request(&req).unwrap_err(),
      WorkflowError::field("entity_id", "must be a valid UUID")
    );
  }

  #[test]
  fn rejects_unknown_action_type() {
    let mut req = request();
    req.actions[0].action_type = "launch_rocket".to_string();
    let err = parse_request(&req).unwrap_err();
    assert_eq!(
      err.to_string(),
      "actions[0].action_type: unknown action type: launch_rocket"
    );
  }

  #[test]
  fn rejects_non_object_config_and_trigger_conditions() {
    let mut req = request();
    req.actions[0].action_config = json!(["not", "an", "object"]);
    assert!(parse_request(&req).is_err());

    let mut req = request();
    req.trigger_conditions = Some(json!("quantity < 10"));
    assert_eq!(
      parse_request(&req).unwrap_err(),
      WorkflowError::field("trigger_conditions", "must be an object")
    );
  }

  #[test]
  fn rejects_duplicate_persisted_ids() {
    let mut req = request();
    let id = Uuid::new_v4().to_string();
    req.actions[0].id = Some(id.clone());
    let mut second = req.actions[0].clone();
    second.name = "Alert again".to_string();
    req.actions.push(second);

    assert!(matches!(
      parse_request(&req),
      Err(WorkflowError::DuplicateActionId(_))
    ));
  }

  #[test]
  fn empty_id_means_new_action() {
    let mut req = request();
    req.actions[0].id = Some(String::new());
    assert!(parse_request(&req).unwrap().actions[0].id.is_none());
  }

  #[test]
  fn rejects_bad_edge_fields() {
    let mut req = request();
    req.edges[0].edge_order = -1;
    assert!(matches!(
      parse_request(&req),
      Err(WorkflowError::InvalidField { field, .. }) if field == "edges[0].edge_order"
    ));

    let mut req = request();
    req.edges[0].edge_type = "branch".to_string();
    assert!(parse_request(&req).is_err());

    let mut req = request();
    req.edges[0].target_action_id = "first".to_string();
    assert_eq!(
      parse_request(&req).unwrap_err(),
      WorkflowError::InvalidTarget {
        edge: 0,
        source: ReferenceError::Malformed("first".to_string()),
      }
    );
  }

  #[test]
  fn start_edge_with_source_is_rejected() {
    let mut req = request();
    req.edges[0].source_action_id = Some("temp:0".to_string());
    assert_eq!(
      parse_request(&req).unwrap_err(),
      WorkflowError::InvalidSource {
        edge: 0,
        source: ReferenceError::SourceOnStartEdge,
      }
    );
  }
}
