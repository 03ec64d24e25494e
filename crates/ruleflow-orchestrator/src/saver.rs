//! Transactional create and update of workflows.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ruleflow_config::{ValidationReport, WorkflowRequest};
use ruleflow_store::{Action, Edge, Json, Rule, Store, StoreTx};
use ruleflow_workflow::{
  ActionNode, NodeReference, ReferenceError, ReferenceMap, WorkflowError, WorkflowPlan,
  parse_request, tag_action_type, validate_action_configs, validate_graph,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::SaveError;
use crate::events::{NoopNotifier, RuleEvent, RuleNotifier};

/// A workflow as persisted: the rule with its actions and edges, all carrying
/// their assigned identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedWorkflow {
  pub rule: Rule,
  pub actions: Vec<Action>,
  pub edges: Vec<Edge>,
}

/// Validates and persists workflow save requests.
pub struct WorkflowSaver<S, N = NoopNotifier> {
  store: S,
  notifier: N,
}

impl<S: Store> WorkflowSaver<S> {
  /// Create a saver that emits no events.
  pub fn without_events(store: S) -> Self {
    Self::new(store, NoopNotifier)
  }
}

impl<S: Store, N: RuleNotifier> WorkflowSaver<S, N> {
  pub fn new(store: S, notifier: N) -> Self {
    Self { store, notifier }
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Dry run. See [`validate_request`].
  pub fn validate(&self, request: &WorkflowRequest) -> ValidationReport {
    validate_request(request)
  }

  /// Create a new rule with its action graph.
  #[instrument(name = "workflow_create", skip_all, fields(requester_id = %requester_id))]
  pub async fn create_workflow(
    &self,
    requester_id: Uuid,
    request: &WorkflowRequest,
    cancel: &CancellationToken,
  ) -> Result<SavedWorkflow, SaveError> {
    let plan = checked_plan(request, cancel)?;

    let mut tx = self
      .store
      .begin()
      .await
      .map_err(SaveError::store("begin transaction"))?;

    let outcome = tokio::select! {
      biased;
      _ = cancel.cancelled() => Err(SaveError::Cancelled),
      result = create_in_tx(&mut tx, requester_id, &plan) => result,
    };
    let saved = finish(tx, outcome).await?;

    info!(
      rule_id = %saved.rule.rule_id,
      action_count = saved.actions.len(),
      edge_count = saved.edges.len(),
      "workflow created"
    );
    self.notify(RuleEvent::RuleCreated {
      rule_id: saved.rule.rule_id,
    });

    Ok(saved)
  }

  /// Replace an existing rule's metadata and action graph.
  ///
  /// Submitted actions with an `id` update that action in place; actions
  /// without one are created. Previously owned actions left out of the
  /// request are deactivated, never deleted. Edges are replaced wholesale.
  #[instrument(name = "workflow_save", skip_all, fields(rule_id = %rule_id))]
  pub async fn save_workflow(
    &self,
    rule_id: Uuid,
    request: &WorkflowRequest,
    cancel: &CancellationToken,
  ) -> Result<SavedWorkflow, SaveError> {
    let plan = checked_plan(request, cancel)?;

    let mut tx = self
      .store
      .begin()
      .await
      .map_err(SaveError::store("begin transaction"))?;

    let outcome = tokio::select! {
      biased;
      _ = cancel.cancelled() => Err(SaveError::Cancelled),
      result = update_in_tx(&mut tx, rule_id, &plan) => result,
    };
    let saved = finish(tx, outcome).await?;

    info!(
      action_count = saved.actions.len(),
      edge_count = saved.edges.len(),
      "workflow saved"
    );
    self.notify(RuleEvent::RuleUpdated { rule_id });

    Ok(saved)
  }

  /// Read a committed workflow, inactive actions included.
  pub async fn load_workflow(&self, rule_id: Uuid) -> Result<SavedWorkflow, SaveError> {
    let rule = self
      .store
      .get_rule(rule_id)
      .await
      .map_err(SaveError::store("get rule"))?;
    let actions = self
      .store
      .list_actions(rule_id)
      .await
      .map_err(SaveError::store("list actions"))?;
    let edges = self
      .store
      .list_edges(rule_id)
      .await
      .map_err(SaveError::store("list edges"))?;

    Ok(SavedWorkflow {
      rule,
      actions,
      edges,
    })
  }

  fn notify(&self, event: RuleEvent) {
    let rule_id = event.rule_id();
    if let Err(e) = self.notifier.notify(event) {
      warn!(rule_id = %rule_id, error = %e, "post-commit notification failed");
    }
  }
}

/// Dry run: run every validation phase and report, without touching storage.
///
/// A shape error stops the run, since the later phases need parsed input.
/// Config and graph checks both run and both contribute errors.
pub fn validate_request(request: &WorkflowRequest) -> ValidationReport {
  let mut errors = Vec::new();

  match parse_request(request) {
    Err(e) => errors.push(e.to_string()),
    Ok(plan) => {
      if let Err(e) = validate_action_configs(&plan.actions) {
        errors.push(e.to_string());
      }
      if let Err(e) = validate_graph(&plan.actions, &plan.edges) {
        errors.push(e.to_string());
      }
    }
  }

  ValidationReport {
    valid: errors.is_empty(),
    errors,
    action_count: request.actions.len(),
    edge_count: request.edges.len(),
  }
}

/// Run all validation phases, bailing out early if the caller has gone away.
fn checked_plan(
  request: &WorkflowRequest,
  cancel: &CancellationToken,
) -> Result<WorkflowPlan, SaveError> {
  if cancel.is_cancelled() {
    return Err(SaveError::Cancelled);
  }

  let plan = parse_request(request)?;
  validate_action_configs(&plan.actions)?;
  validate_graph(&plan.actions, &plan.edges)?;

  if cancel.is_cancelled() {
    return Err(SaveError::Cancelled);
  }
  Ok(plan)
}

/// Commit on success, roll back on failure.
///
/// A rollback failure is logged; the caller sees the original error.
async fn finish<T: StoreTx>(
  tx: T,
  outcome: Result<SavedWorkflow, SaveError>,
) -> Result<SavedWorkflow, SaveError> {
  match outcome {
    Ok(saved) => {
      tx.commit()
        .await
        .map_err(SaveError::store("commit transaction"))?;
      Ok(saved)
    }
    Err(err) => {
      if let Err(rollback) = tx.rollback().await {
        warn!(error = %rollback, "rollback failed");
      }
      debug!(error = %err, "save rolled back");
      Err(err)
    }
  }
}

async fn create_in_tx<T: StoreTx>(
  tx: &mut T,
  requester_id: Uuid,
  plan: &WorkflowPlan,
) -> Result<SavedWorkflow, SaveError> {
  let entity_type_id = tx
    .entity_type_id(plan.entity_id)
    .await
    .map_err(SaveError::store("resolve entity type"))?;

  let now = Utc::now();
  let rule = Rule {
    rule_id: Uuid::new_v4(),
    name: plan.name.clone(),
    description: plan.description.clone(),
    entity_id: plan.entity_id,
    entity_type_id,
    trigger_type_id: plan.trigger_type_id,
    is_active: plan.is_active,
    trigger_conditions: plan.trigger_conditions.clone().map(Json),
    canvas_layout: plan.canvas_layout.clone().map(Json),
    created_by: requester_id,
    created_at: now,
    updated_at: now,
  };
  tx.create_rule(&rule)
    .await
    .map_err(SaveError::store("create rule"))?;

  let mut actions = Vec::with_capacity(plan.actions.len());
  for node in &plan.actions {
    let action = build_action(Uuid::new_v4(), rule.rule_id, node, now, now);
    tx.create_action(&action)
      .await
      .map_err(SaveError::store("create action"))?;
    actions.push(action);
  }

  let edges = replace_edges(tx, rule.rule_id, plan, &actions, now).await?;

  Ok(SavedWorkflow {
    rule,
    actions,
    edges,
  })
}

async fn update_in_tx<T: StoreTx>(
  tx: &mut T,
  rule_id: Uuid,
  plan: &WorkflowPlan,
) -> Result<SavedWorkflow, SaveError> {
  let mut rule = tx
    .get_rule(rule_id)
    .await
    .map_err(SaveError::store("get rule"))?;
  let entity_type_id = tx
    .entity_type_id(plan.entity_id)
    .await
    .map_err(SaveError::store("resolve entity type"))?;

  let now = Utc::now();
  rule.name = plan.name.clone();
  rule.description = plan.description.clone();
  rule.entity_id = plan.entity_id;
  rule.entity_type_id = entity_type_id;
  rule.trigger_type_id = plan.trigger_type_id;
  rule.is_active = plan.is_active;
  rule.trigger_conditions = plan.trigger_conditions.clone().map(Json);
  rule.canvas_layout = plan.canvas_layout.clone().map(Json);
  rule.updated_at = now;
  tx.update_rule(&rule)
    .await
    .map_err(SaveError::store("update rule"))?;

  let existing = tx
    .list_actions(rule_id)
    .await
    .map_err(SaveError::store("list actions"))?;
  let owned: HashMap<Uuid, &Action> = existing.iter().map(|a| (a.action_id, a)).collect();

  let mut referenced = HashSet::new();
  let mut actions = Vec::with_capacity(plan.actions.len());
  for node in &plan.actions {
    let action = match node.id {
      Some(action_id) => {
        let current = owned.get(&action_id).ok_or_else(|| {
          SaveError::NotFound(format!("action {action_id} does not belong to rule {rule_id}"))
        })?;
        let action = build_action(action_id, rule_id, node, current.created_at, now);
        tx.update_action(&action)
          .await
          .map_err(SaveError::store("update action"))?;
        referenced.insert(action_id);
        action
      }
      None => {
        let action = build_action(Uuid::new_v4(), rule_id, node, now, now);
        tx.create_action(&action)
          .await
          .map_err(SaveError::store("create action"))?;
        action
      }
    };
    actions.push(action);
  }

  let mut deactivated = 0usize;
  for stale in existing
    .iter()
    .filter(|a| a.is_active && !referenced.contains(&a.action_id))
  {
    tx.deactivate_action(stale.action_id)
      .await
      .map_err(SaveError::store("deactivate action"))?;
    deactivated += 1;
  }

  let removed = tx
    .delete_edges(rule_id)
    .await
    .map_err(SaveError::store("delete edges"))?;
  let edges = replace_edges(tx, rule_id, plan, &actions, now).await?;

  debug!(
    deactivated,
    edges_removed = removed,
    edges_created = edges.len(),
    "actions reconciled"
  );

  Ok(SavedWorkflow {
    rule,
    actions,
    edges,
  })
}

fn build_action(
  action_id: Uuid,
  rule_id: Uuid,
  node: &ActionNode,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
) -> Action {
  Action {
    action_id,
    rule_id,
    name: node.name.clone(),
    description: node.description.clone(),
    action_type: node.action_type,
    action_config: Json(tag_action_type(&node.config, node.action_type)),
    is_active: node.is_active,
    created_at,
    updated_at,
  }
}

/// Create every submitted edge, mapping references onto the identifiers the
/// actions ended up with. `actions` is parallel to `plan.actions`.
async fn replace_edges<T: StoreTx>(
  tx: &mut T,
  rule_id: Uuid,
  plan: &WorkflowPlan,
  actions: &[Action],
  now: DateTime<Utc>,
) -> Result<Vec<Edge>, SaveError> {
  let refs = ReferenceMap::new(&plan.actions);
  let resolve = |reference: &NodeReference| {
    refs
      .resolve(reference)
      .map(|index| actions[index].action_id)
  };

  let mut edges = Vec::with_capacity(plan.edges.len());
  for (index, edge) in plan.edges.iter().enumerate() {
    let target_action_id =
      resolve(&edge.target).map_err(|source| WorkflowError::InvalidTarget {
        edge: index,
        source,
      })?;

    let source_action_id = if edge.is_start() {
      None
    } else {
      let reference = edge.source.as_ref().ok_or(WorkflowError::InvalidSource {
        edge: index,
        source: ReferenceError::Missing,
      })?;
      Some(
        resolve(reference).map_err(|source| WorkflowError::InvalidSource {
          edge: index,
          source,
        })?,
      )
    };

    let row = Edge {
      edge_id: Uuid::new_v4(),
      rule_id,
      source_action_id,
      target_action_id,
      edge_type: edge.edge_type,
      source_output: edge.source_output.clone(),
      edge_order: edge.edge_order,
      created_at: now,
    };
    tx.create_edge(&row)
      .await
      .map_err(SaveError::store("create edge"))?;
    edges.push(row);
  }

  Ok(edges)
}
