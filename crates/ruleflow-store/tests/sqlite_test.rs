//! Integration tests for the SQLite store.

use chrono::Utc;
use ruleflow_config::{ActionType, EdgeType};
use ruleflow_store::{Action, Edge, Entity, Error, Rule, SqliteStore, Store, StoreTx};
use serde_json::json;
use sqlx::types::Json;
use uuid::Uuid;

async fn store_with_entity() -> (SqliteStore, Entity) {
  let store = SqliteStore::in_memory().await.expect("failed to open store");
  store.migrate().await.expect("failed to migrate");

  let entity = Entity {
    entity_id: Uuid::new_v4(),
    entity_type_id: Uuid::new_v4(),
    name: "inventory_items".to_string(),
  };
  store.insert_entity(&entity).await.expect("failed to insert entity");
  (store, entity)
}

fn rule(entity: &Entity) -> Rule {
  let now = Utc::now();
  Rule {
    rule_id: Uuid::new_v4(),
    name: "Low stock".to_string(),
    description: String::new(),
    entity_id: entity.entity_id,
    entity_type_id: entity.entity_type_id,
    trigger_type_id: Uuid::new_v4(),
    is_active: true,
    trigger_conditions: Some(Json(json!({ "field": "quantity" }))),
    canvas_layout: None,
    created_by: Uuid::new_v4(),
    created_at: now,
    updated_at: now,
  }
}

fn action(rule_id: Uuid, name: &str) -> Action {
  let now = Utc::now();
  Action {
    action_id: Uuid::new_v4(),
    rule_id,
    name: name.to_string(),
    description: String::new(),
    action_type: ActionType::LogAuditEntry,
    action_config: Json(json!({ "message": name, "action_type": "log_audit_entry" })),
    is_active: true,
    created_at: now,
    updated_at: now,
  }
}

fn edge(rule_id: Uuid, source: Option<Uuid>, target: Uuid, edge_type: EdgeType) -> Edge {
  Edge {
    edge_id: Uuid::new_v4(),
    rule_id,
    source_action_id: source,
    target_action_id: target,
    edge_type,
    source_output: None,
    edge_order: 0,
    created_at: Utc::now(),
  }
}

#[tokio::test]
async fn committed_writes_are_readable() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);
  let first = action(rule.rule_id, "first");
  let second = action(rule.rule_id, "second");

  let mut tx = store.begin().await.unwrap();
  assert_eq!(
    tx.entity_type_id(entity.entity_id).await.unwrap(),
    entity.entity_type_id
  );
  tx.create_rule(&rule).await.unwrap();
  tx.create_action(&first).await.unwrap();
  tx.create_action(&second).await.unwrap();
  tx.create_edge(&edge(rule.rule_id, None, first.action_id, EdgeType::Start))
    .await
    .unwrap();
  tx.create_edge(&edge(
    rule.rule_id,
    Some(first.action_id),
    second.action_id,
    EdgeType::Sequence,
  ))
  .await
  .unwrap();
  tx.commit().await.unwrap();

  let stored = store.get_rule(rule.rule_id).await.unwrap();
  assert_eq!(stored.name, "Low stock");
  assert_eq!(stored.trigger_conditions, rule.trigger_conditions);

  let actions = store.list_actions(rule.rule_id).await.unwrap();
  assert_eq!(actions.len(), 2);
  assert_eq!(actions[0].action_id, first.action_id);
  assert_eq!(actions[0].action_type, ActionType::LogAuditEntry);
  assert_eq!(actions[1].action_config.0["message"], "second");

  let edges = store.list_edges(rule.rule_id).await.unwrap();
  assert_eq!(edges.len(), 2);
  assert_eq!(edges[0].source_action_id, None);
  assert_eq!(edges[0].edge_type, EdgeType::Start);
  assert_eq!(edges[1].source_action_id, Some(first.action_id));
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);

  {
    let mut tx = store.begin().await.unwrap();
    tx.create_rule(&rule).await.unwrap();
    tx.create_action(&action(rule.rule_id, "lost")).await.unwrap();
  }

  let err = store.get_rule(rule.rule_id).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
  assert!(store.list_actions(rule.rule_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn explicit_rollback_discards_writes() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);

  let mut tx = store.begin().await.unwrap();
  tx.create_rule(&rule).await.unwrap();
  tx.rollback().await.unwrap();

  assert!(matches!(
    store.get_rule(rule.rule_id).await,
    Err(Error::NotFound(_))
  ));
}

#[tokio::test]
async fn unknown_entity_is_not_found() {
  let (store, _) = store_with_entity().await;
  let mut tx = store.begin().await.unwrap();
  let err = tx.entity_type_id(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn deactivate_keeps_the_row() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);
  let step = action(rule.rule_id, "retired");

  let mut tx = store.begin().await.unwrap();
  tx.create_rule(&rule).await.unwrap();
  tx.create_action(&step).await.unwrap();
  tx.deactivate_action(step.action_id).await.unwrap();
  tx.commit().await.unwrap();

  let actions = store.list_actions(rule.rule_id).await.unwrap();
  assert_eq!(actions.len(), 1);
  assert!(!actions[0].is_active);
}

#[tokio::test]
async fn update_action_is_scoped_to_its_rule() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);
  let step = action(rule.rule_id, "step");

  let mut tx = store.begin().await.unwrap();
  tx.create_rule(&rule).await.unwrap();
  tx.create_action(&step).await.unwrap();

  let mut foreign = step.clone();
  foreign.rule_id = Uuid::new_v4();
  assert!(matches!(tx.update_action(&foreign).await, Err(Error::NotFound(_))));

  let mut renamed = step.clone();
  renamed.name = "renamed".to_string();
  tx.update_action(&renamed).await.unwrap();
  tx.commit().await.unwrap();

  assert_eq!(store.list_actions(rule.rule_id).await.unwrap()[0].name, "renamed");
}

#[tokio::test]
async fn delete_edges_reports_count() {
  let (store, entity) = store_with_entity().await;
  let rule = rule(&entity);
  let step = action(rule.rule_id, "only");

  let mut tx = store.begin().await.unwrap();
  tx.create_rule(&rule).await.unwrap();
  tx.create_action(&step).await.unwrap();
  tx.create_edge(&edge(rule.rule_id, None, step.action_id, EdgeType::Start))
    .await
    .unwrap();
  assert_eq!(tx.delete_edges(rule.rule_id).await.unwrap(), 1);
  assert_eq!(tx.delete_edges(rule.rule_id).await.unwrap(), 0);
  tx.commit().await.unwrap();
}

#[tokio::test]
async fn update_of_missing_rule_is_not_found() {
  let (store, entity) = store_with_entity().await;
  let mut tx = store.begin().await.unwrap();
  assert!(matches!(tx.update_rule(&rule(&entity)).await, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn file_database_persists_across_connections() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let url = format!("sqlite://{}", dir.path().join("rules.db").display());
  let entity = Entity {
    entity_id: Uuid::new_v4(),
    entity_type_id: Uuid::new_v4(),
    name: "orders".to_string(),
  };

  {
    let store = SqliteStore::connect(&url).await.unwrap();
    store.migrate().await.unwrap();
    store.insert_entity(&entity).await.unwrap();
    store.pool().close().await;
  }

  let store = SqliteStore::connect(&url).await.unwrap();
  store.migrate().await.unwrap();
  let mut tx = store.begin().await.unwrap();
  assert_eq!(
    tx.entity_type_id(entity.entity_id).await.unwrap(),
    entity.entity_type_id
  );
}
