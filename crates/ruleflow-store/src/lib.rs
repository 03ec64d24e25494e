//! Ruleflow Store
//!
//! This crate provides the storage traits and implementations for rules and
//! their action graphs. Data is persisted to a database (SQLite).
//!
//! Writes happen inside a transaction:
//! - [`Store::begin`] opens a transaction and returns a [`StoreTx`] handle
//! - [`StoreTx`] offers rule, action and edge CRUD scoped to that transaction
//! - [`StoreTx::commit`] makes the writes visible; dropping the handle or
//!   calling [`StoreTx::rollback`] discards them
//!
//! Reads of committed state go through [`Store`] directly.

mod sqlite;
mod types;

pub use sqlite::{SqliteStore, SqliteTx};
pub use sqlx::types::Json;
pub use types::{Action, Edge, Entity, Rule};

use async_trait::async_trait;
use uuid::Uuid;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Applying schema migrations failed.
  #[error("migration error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Storage trait for rules, actions and edges.
#[async_trait]
pub trait Store: Send + Sync {
  /// Transaction handle returned by [`Store::begin`].
  type Tx: StoreTx;

  /// Open a transaction.
  async fn begin(&self) -> Result<Self::Tx, Error>;

  /// Register an entity that rules can target.
  async fn insert_entity(&self, entity: &Entity) -> Result<(), Error>;

  /// Get a committed rule by ID.
  async fn get_rule(&self, rule_id: Uuid) -> Result<Rule, Error>;

  /// List every action of a rule, inactive ones included, in creation order.
  async fn list_actions(&self, rule_id: Uuid) -> Result<Vec<Action>, Error>;

  /// List the edges of a rule in creation order.
  async fn list_edges(&self, rule_id: Uuid) -> Result<Vec<Edge>, Error>;
}

/// Transaction-scoped storage handle.
///
/// Owned by exactly one save call. Dropping it without [`StoreTx::commit`]
/// rolls the transaction back.
#[async_trait]
pub trait StoreTx: Send + Sized {
  /// Look up the entity type of an entity.
  async fn entity_type_id(&mut self, entity_id: Uuid) -> Result<Uuid, Error>;

  /// Get a rule by ID.
  async fn get_rule(&mut self, rule_id: Uuid) -> Result<Rule, Error>;

  /// Insert a new rule.
  async fn create_rule(&mut self, rule: &Rule) -> Result<(), Error>;

  /// Replace the metadata of an existing rule.
  async fn update_rule(&mut self, rule: &Rule) -> Result<(), Error>;

  /// List every action of a rule, inactive ones included.
  async fn list_actions(&mut self, rule_id: Uuid) -> Result<Vec<Action>, Error>;

  /// Insert a new action.
  async fn create_action(&mut self, action: &Action) -> Result<(), Error>;

  /// Replace an existing action of the same rule.
  async fn update_action(&mut self, action: &Action) -> Result<(), Error>;

  /// Clear the active flag of an action.
  async fn deactivate_action(&mut self, action_id: Uuid) -> Result<(), Error>;

  /// Delete every edge of a rule, returning how many were removed.
  async fn delete_edges(&mut self, rule_id: Uuid) -> Result<u64, Error>;

  /// Insert a new edge.
  async fn create_edge(&mut self, edge: &Edge) -> Result<(), Error>;

  /// Commit the transaction.
  async fn commit(self) -> Result<(), Error>;

  /// Roll the transaction back.
  async fn rollback(self) -> Result<(), Error>;
}
