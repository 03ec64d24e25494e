use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that does not name any variant of a closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
  pub kind: &'static str,
  pub value: String,
}

/// The closed set of actions a rule can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
  AllocateInventory,
  CheckInventory,
  CheckReorderPoint,
  CommitAllocation,
  CreateAlert,
  CreateEntity,
  Delay,
  EvaluateCondition,
  LogAuditEntry,
  LookupEntity,
  ReleaseReservation,
  ReserveInventory,
  SeekApproval,
  SendEmail,
  SendNotification,
  TransitionStatus,
  UpdateField,
}

impl ActionType {
  pub const ALL: [ActionType; 17] = [
    ActionType::AllocateInventory,
    ActionType::CheckInventory,
    ActionType::CheckReorderPoint,
    ActionType::CommitAllocation,
    ActionType::CreateAlert,
    ActionType::CreateEntity,
    ActionType::Delay,
    ActionType::EvaluateCondition,
    ActionType::LogAuditEntry,
    ActionType::LookupEntity,
    ActionType::ReleaseReservation,
    ActionType::ReserveInventory,
    ActionType::SeekApproval,
    ActionType::SendEmail,
    ActionType::SendNotification,
    ActionType::TransitionStatus,
    ActionType::UpdateField,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ActionType::AllocateInventory => "allocate_inventory",
      ActionType::CheckInventory => "check_inventory",
      ActionType::CheckReorderPoint => "check_reorder_point",
      ActionType::CommitAllocation => "commit_allocation",
      ActionType::CreateAlert => "create_alert",
      ActionType::CreateEntity => "create_entity",
      ActionType::Delay => "delay",
      ActionType::EvaluateCondition => "evaluate_condition",
      ActionType::LogAuditEntry => "log_audit_entry",
      ActionType::LookupEntity => "lookup_entity",
      ActionType::ReleaseReservation => "release_reservation",
      ActionType::ReserveInventory => "reserve_inventory",
      ActionType::SeekApproval => "seek_approval",
      ActionType::SendEmail => "send_email",
      ActionType::SendNotification => "send_notification",
      ActionType::TransitionStatus => "transition_status",
      ActionType::UpdateField => "update_field",
    }
  }
}

impl fmt::Display for ActionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ActionType {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ActionType::ALL
      .into_iter()
      .find(|t| t.as_str() == s)
      .ok_or_else(|| UnknownVariant {
        kind: "action type",
        value: s.to_string(),
      })
  }
}

impl TryFrom<String> for ActionType {
  type Error = UnknownVariant;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

/// Kind of a directed edge between two actions.
///
/// Only structural legality is checked at save time; what each kind means
/// when a rule runs is decided by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
  Start,
  Sequence,
  Always,
}

impl EdgeType {
  pub fn as_str(&self) -> &'static str {
    match self {
      EdgeType::Start => "start",
      EdgeType::Sequence => "sequence",
      EdgeType::Always => "always",
    }
  }
}

impl fmt::Display for EdgeType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for EdgeType {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "start" => Ok(EdgeType::Start),
      "sequence" => Ok(EdgeType::Sequence),
      "always" => Ok(EdgeType::Always),
      other => Err(UnknownVariant {
        kind: "edge type",
        value: other.to_string(),
      }),
    }
  }
}

impl TryFrom<String> for EdgeType {
  type Error = UnknownVariant;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn action_type_string_forms_match_serde() {
    for action_type in ActionType::ALL {
      let json = serde_json::to_value(action_type).unwrap();
      assert_eq!(json, serde_json::Value::String(action_type.as_str().into()));
      assert_eq!(action_type.as_str().parse::<ActionType>().unwrap(), action_type);
    }
  }

  #[test]
  fn unknown_action_type_is_rejected() {
    let err = "launch_rocket".parse::<ActionType>().unwrap_err();
    assert_eq!(err.to_string(), "unknown action type: launch_rocket");
  }

  #[test]
  fn edge_type_parses_known_values() {
    assert_eq!("start".parse::<EdgeType>().unwrap(), EdgeType::Start);
    assert_eq!("always".parse::<EdgeType>().unwrap(), EdgeType::Always);
    assert!("branch".parse::<EdgeType>().is_err());
  }
}
