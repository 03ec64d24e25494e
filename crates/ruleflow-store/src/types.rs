use chrono::{DateTime, Utc};
use ruleflow_config::{ActionType, EdgeType};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A business entity rules can be attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Entity {
  pub entity_id: Uuid,
  pub entity_type_id: Uuid,
  pub name: String,
}

/// A rule as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Rule {
  pub rule_id: Uuid,
  pub name: String,
  pub description: String,
  pub entity_id: Uuid,
  pub entity_type_id: Uuid,
  pub trigger_type_id: Uuid,
  pub is_active: bool,
  pub trigger_conditions: Option<Json<serde_json::Value>>,
  pub canvas_layout: Option<Json<serde_json::Value>>,
  pub created_by: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An action (workflow step) as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Action {
  pub action_id: Uuid,
  pub rule_id: Uuid,
  pub name: String,
  pub description: String,
  #[sqlx(try_from = "String")]
  pub action_type: ActionType,
  /// Type-specific config; always carries an `action_type` key.
  pub action_config: Json<serde_json::Value>,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An edge between two actions as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Edge {
  pub edge_id: Uuid,
  pub rule_id: Uuid,
  /// `None` for the start edge.
  pub source_action_id: Option<Uuid>,
  pub target_action_id: Uuid,
  #[sqlx(try_from = "String")]
  pub edge_type: EdgeType,
  pub source_output: Option<String>,
  pub edge_order: i64,
  pub created_at: DateTime<Utc>,
}
