//! Per-action-type shape checks for config documents.
//!
//! Only structure is checked: required keys exist and are non-empty. Whether
//! a condition makes sense or a referenced field exists is decided when the
//! rule runs.

use ruleflow_config::ActionType;
use serde_json::{Map, Value};

use crate::error::WorkflowError;
use crate::node::ActionNode;

/// Key under which a config document carries its own action type.
pub const ACTION_TYPE_KEY: &str = "action_type";

#[derive(Debug, Clone, Copy)]
enum Shape {
  /// A non-blank string.
  Text,
  /// A non-empty array.
  List,
  /// A non-empty object.
  Object,
  /// Anything except null or a blank string.
  Present,
}

fn required_keys(action_type: ActionType) -> &'static [(&'static str, Shape)] {
  use Shape::*;

  match action_type {
    ActionType::AllocateInventory => &[("inventory_items", List), ("allocation_mode", Text)],
    ActionType::CheckInventory => &[("product_id", Text), ("threshold", Present)],
    ActionType::CheckReorderPoint => &[("product_id", Text)],
    ActionType::CommitAllocation => &[("reservation_id", Text)],
    ActionType::CreateAlert => &[
      ("alert_type", Text),
      ("severity", Text),
      ("title", Text),
      ("message", Text),
    ],
    ActionType::CreateEntity => &[("entity_name", Text), ("fields", Object)],
    ActionType::Delay => &[("duration", Present)],
    ActionType::EvaluateCondition => &[("conditions", List)],
    ActionType::LogAuditEntry => &[("message", Text)],
    ActionType::LookupEntity => &[("entity_name", Text), ("filter_criteria", Object)],
    ActionType::ReleaseReservation => &[("reservation_id", Text)],
    ActionType::ReserveInventory => &[("inventory_items", List)],
    ActionType::SeekApproval => &[("approvers", List), ("approval_type", Text)],
    ActionType::SendEmail => &[("recipients", List), ("subject", Text), ("body", Text)],
    ActionType::SendNotification => &[("recipients", List), ("message", Text)],
    ActionType::TransitionStatus => &[("field", Text), ("to", Text)],
    ActionType::UpdateField => &[("target_entity", Text), ("target_field", Text)],
  }
}

/// Validate the config document of every action against its type.
pub fn validate_action_configs(actions: &[ActionNode]) -> Result<(), WorkflowError> {
  for (index, action) in actions.iter().enumerate() {
    check_config(action.action_type, &action.config).map_err(|message| {
      WorkflowError::InvalidActionConfig {
        index,
        name: action.name.clone(),
        message,
      }
    })?;
  }
  Ok(())
}

fn check_config(action_type: ActionType, config: &Value) -> Result<(), String> {
  let Some(object) = config.as_object() else {
    return Err("action_config must be an object".to_string());
  };

  if let Some(embedded) = embedded_action_type(config) {
    match embedded {
      Ok(tag) if tag == action_type => {}
      Ok(tag) => {
        return Err(format!(
          "action_config.{ACTION_TYPE_KEY} '{tag}' does not match action_type '{action_type}'"
        ));
      }
      Err(message) => return Err(message),
    }
  }

  for (key, shape) in required_keys(action_type) {
    check_key(object, key, *shape)?;
  }
  Ok(())
}

fn check_key(object: &Map<String, Value>, key: &str, shape: Shape) -> Result<(), String> {
  let Some(value) = object.get(key) else {
    return Err(format!("missing required field '{key}'"));
  };

  let ok = match shape {
    Shape::Text => value.as_str().is_some_and(|s| !s.trim().is_empty()),
    Shape::List => value.as_array().is_some_and(|a| !a.is_empty()),
    Shape::Object => value.as_object().is_some_and(|o| !o.is_empty()),
    Shape::Present => match value {
      Value::Null => false,
      Value::String(s) => !s.trim().is_empty(),
      _ => true,
    },
  };

  if ok {
    return Ok(());
  }

  Err(match shape {
    Shape::Text => format!("'{key}' must be a non-empty string"),
    Shape::List => format!("'{key}' must be a non-empty list"),
    Shape::Object => format!("'{key}' must be a non-empty object"),
    Shape::Present => format!("'{key}' must not be empty"),
  })
}

/// The action type a config document carries about itself, if any.
pub fn embedded_action_type(config: &Value) -> Option<Result<ActionType, String>> {
  let tag = config.get(ACTION_TYPE_KEY)?;
  Some(match tag.as_str() {
    Some(s) => s.parse().map_err(|e| format!("action_config.{ACTION_TYPE_KEY}: {e}")),
    None => Err(format!("action_config.{ACTION_TYPE_KEY} must be a string")),
  })
}

/// Return `config` with its action type embedded.
///
/// Stored configs must be self-describing: readers recover the type from the
/// document alone. A tag the caller already embedded is left as is.
pub fn tag_action_type(config: &Value, action_type: ActionType) -> Value {
  let mut tagged = config.clone();
  if let Some(object) = tagged.as_object_mut() {
    object
      .entry(ACTION_TYPE_KEY)
      .or_insert_with(|| Value::String(action_type.as_str().to_string()));
  }
  tagged
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn node(action_type: ActionType, config: Value) -> ActionNode {
    ActionNode {
      id: None,
      name: "step".to_string(),
      description: String::new(),
      action_type,
      config,
      is_active: true,
    }
  }

  fn sample_config(action_type: ActionType) -> Value {
    let mut object = Map::new();
    for (key, shape) in required_keys(action_type) {
      let value = match shape {
        Shape::Text | Shape::Present => json!("x"),
        Shape::List => json!(["x"]),
        Shape::Object => json!({ "x": 1 }),
      };
      object.insert(key.to_string(), value);
    }
    Value::Object(object)
  }

  #[test]
  fn every_type_accepts_a_config_with_all_required_keys() {
    for action_type in ActionType::ALL {
      let actions = [node(action_type, sample_config(action_type))];
      assert!(
        validate_action_configs(&actions).is_ok(),
        "{action_type} rejected a complete config"
      );
    }
  }

  #[test]
  fn every_missing_key_is_named() {
    for action_type in ActionType::ALL {
      for (key, _) in required_keys(action_type) {
        let mut config = sample_config(action_type);
        config.as_object_mut().unwrap().remove(*key);

        let err = validate_action_configs(&[node(action_type, config)]).unwrap_err();
        assert_eq!(
          err,
          WorkflowError::InvalidActionConfig {
            index: 0,
            name: "step".to_string(),
            message: format!("missing required field '{key}'"),
          }
        );
      }
    }
  }

  #[test]
  fn create_alert_accepts_semantically_odd_values() {
    let config = json!({
      "alert_type": "x",
      "severity": "not-a-real-severity",
      "title": "t",
      "message": "m"
    });
    assert!(validate_action_configs(&[node(ActionType::CreateAlert, config)]).is_ok());
  }

  #[test]
  fn send_email_requires_non_empty_recipients() {
    let config = json!({ "recipients": [], "subject": "s", "body": "b" });
    let err = validate_action_configs(&[node(ActionType::SendEmail, config)]).unwrap_err();
    assert!(err.to_string().contains("'recipients' must be a non-empty list"));
  }

  #[test]
  fn failure_identifies_the_offending_action() {
    let actions = [
      node(ActionType::Delay, json!({ "duration": "1h" })),
      node(ActionType::EvaluateCondition, json!({ "conditions": [] })),
    ];
    let err = validate_action_configs(&actions).unwrap_err();
    assert!(err.to_string().starts_with("action 1 (step):"));
  }

  #[test]
  fn embedded_tag_must_match_action_type() {
    let mut config = sample_config(ActionType::Delay);
    config["action_type"] = json!("send_email");
    assert!(validate_action_configs(&[node(ActionType::Delay, config)]).is_err());

    let mut config = sample_config(ActionType::Delay);
    config["action_type"] = json!("launch_rocket");
    let err = validate_action_configs(&[node(ActionType::Delay, config)]).unwrap_err();
    assert!(err.to_string().contains("unknown action type: launch_rocket"));
  }

  #[test]
  fn tagging_adds_missing_type_and_keeps_existing() {
    let tagged = tag_action_type(&json!({ "duration": "5m" }), ActionType::Delay);
    assert_eq!(tagged["action_type"], "delay");
    assert_eq!(tagged["duration"], "5m");

    let pre_tagged = json!({ "duration": "5m", "action_type": "delay" });
    assert_eq!(tag_action_type(&pre_tagged, ActionType::Delay), pre_tagged);

    assert_eq!(
      embedded_action_type(&tagged),
      Some(Ok(ActionType::Delay))
    );
  }
}
