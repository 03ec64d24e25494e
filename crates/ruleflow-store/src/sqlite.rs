use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::{Action, Edge, Entity, Error, Rule, Store, StoreTx};

const RULE_COLUMNS: &str = "rule_id, name, description, entity_id, entity_type_id, trigger_type_id, \
   is_active, trigger_conditions, canvas_layout, created_by, created_at, updated_at";

const ACTION_COLUMNS: &str = "action_id, rule_id, name, description, action_type, action_config, \
   is_active, created_at, updated_at";

const EDGE_COLUMNS: &str = "edge_id, rule_id, source_action_id, target_action_id, edge_type, \
   source_output, edge_order, created_at";

/// SQLite-based store implementation.
#[derive(Debug, Clone)]
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Connect to a database URL, creating the file if it does not exist.
  pub async fn connect(url: &str) -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str(url)?
      .create_if_missing(true)
      .foreign_keys(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// Open a private in-memory database.
  ///
  /// Every pooled connection to `:memory:` would see its own empty database,
  /// so the pool is pinned to a single connection that is never recycled.
  pub async fn in_memory() -> Result<Self, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .idle_timeout(None)
      .max_lifetime(None)
      .connect_with(options)
      .await?;
    Ok(Self::new(pool))
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), Error> {
    sqlx::migrate!("../../migrations").run(&self.pool).await?;
    Ok(())
  }

  /// The underlying connection pool.
  pub fn pool(&self) -> &SqlitePool {
    &self.pool
  }
}

#[async_trait]
impl Store for SqliteStore {
  type Tx = SqliteTx;

  async fn begin(&self) -> Result<SqliteTx, Error> {
    let tx = self.pool.begin().await?;
    Ok(SqliteTx { tx })
  }

  async fn insert_entity(&self, entity: &Entity) -> Result<(), Error> {
    sqlx::query(
      r#"
            INSERT INTO entities (entity_id, entity_type_id, name)
            VALUES (?, ?, ?)
            "#,
    )
    .bind(entity.entity_id)
    .bind(entity.entity_type_id)
    .bind(&entity.name)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_rule(&self, rule_id: Uuid) -> Result<Rule, Error> {
    sqlx::query_as(&format!("SELECT {RULE_COLUMNS} FROM rules WHERE rule_id = ?"))
      .bind(rule_id)
      .fetch_optional(&self.pool)
      .await?
      .ok_or_else(|| Error::NotFound(format!("rule {rule_id}")))
  }

  async fn list_actions(&self, rule_id: Uuid) -> Result<Vec<Action>, Error> {
    let actions = sqlx::query_as(&format!(
      "SELECT {ACTION_COLUMNS} FROM rule_actions WHERE rule_id = ? ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(rule_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(actions)
  }

  async fn list_edges(&self, rule_id: Uuid) -> Result<Vec<Edge>, Error> {
    let edges = sqlx::query_as(&format!(
      "SELECT {EDGE_COLUMNS} FROM rule_edges WHERE rule_id = ? ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(rule_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(edges)
  }
}

/// An open SQLite transaction.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct SqliteTx {
  tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTx for SqliteTx {
  async fn entity_type_id(&mut self, entity_id: Uuid) -> Result<Uuid, Error> {
    sqlx::query_scalar("SELECT entity_type_id FROM entities WHERE entity_id = ?")
      .bind(entity_id)
      .fetch_optional(&mut *self.tx)
      .await?
      .ok_or_else(|| Error::NotFound(format!("entity {entity_id}")))
  }

  async fn get_rule(&mut self, rule_id: Uuid) -> Result<Rule, Error> {
    sqlx::query_as(&format!("SELECT {RULE_COLUMNS} FROM rules WHERE rule_id = ?"))
      .bind(rule_id)
      .fetch_optional(&mut *self.tx)
      .await?
      .ok_or_else(|| Error::NotFound(format!("rule {rule_id}")))
  }

  async fn create_rule(&mut self, rule: &Rule) -> Result<(), Error> {
    sqlx::query(&format!(
      "INSERT INTO rules ({RULE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(rule.rule_id)
    .bind(&rule.name)
    .bind(&rule.description)
    .bind(rule.entity_id)
    .bind(rule.entity_type_id)
    .bind(rule.trigger_type_id)
    .bind(rule.is_active)
    .bind(&rule.trigger_conditions)
    .bind(&rule.canvas_layout)
    .bind(rule.created_by)
    .bind(rule.created_at)
    .bind(rule.updated_at)
    .execute(&mut *self.tx)
    .await?;

    debug!(rule_id = %rule.rule_id, "rule inserted");
    Ok(())
  }

  async fn update_rule(&mut self, rule: &Rule) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
            UPDATE rules
            SET name = ?, description = ?, entity_id = ?, entity_type_id = ?,
                trigger_type_id = ?, is_active = ?, trigger_conditions = ?,
                canvas_layout = ?, updated_at = ?
            WHERE rule_id = ?
            "#,
    )
    .bind(&rule.name)
    .bind(&rule.description)
    .bind(rule.entity_id)
    .bind(rule.entity_type_id)
    .bind(rule.trigger_type_id)
    .bind(rule.is_active)
    .bind(&rule.trigger_conditions)
    .bind(&rule.canvas_layout)
    .bind(rule.updated_at)
    .bind(rule.rule_id)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!("rule {}", rule.rule_id)));
    }
    Ok(())
  }

  async fn list_actions(&mut self, rule_id: Uuid) -> Result<Vec<Action>, Error> {
    let actions = sqlx::query_as(&format!(
      "SELECT {ACTION_COLUMNS} FROM rule_actions WHERE rule_id = ? ORDER BY created_at ASC, rowid ASC"
    ))
    .bind(rule_id)
    .fetch_all(&mut *self.tx)
    .await?;

    Ok(actions)
  }

  async fn create_action(&mut self, action: &Action) -> Result<(), Error> {
    sqlx::query(&format!(
      "INSERT INTO rule_actions ({ACTION_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(action.action_id)
    .bind(action.rule_id)
    .bind(&action.name)
    .bind(&action.description)
    .bind(action.action_type.as_str())
    .bind(&action.action_config)
    .bind(action.is_active)
    .bind(action.created_at)
    .bind(action.updated_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn update_action(&mut self, action: &Action) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
            UPDATE rule_actions
            SET name = ?, description = ?, action_type = ?, action_config = ?,
                is_active = ?, updated_at = ?
            WHERE action_id = ? AND rule_id = ?
            "#,
    )
    .bind(&action.name)
    .bind(&action.description)
    .bind(action.action_type.as_str())
    .bind(&action.action_config)
    .bind(action.is_active)
    .bind(action.updated_at)
    .bind(action.action_id)
    .bind(action.rule_id)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!(
        "action {} of rule {}",
        action.action_id, action.rule_id
      )));
    }
    Ok(())
  }

  async fn deactivate_action(&mut self, action_id: Uuid) -> Result<(), Error> {
    let result = sqlx::query(
      r#"
            UPDATE rule_actions
            SET is_active = 0, updated_at = ?
            WHERE action_id = ?
            "#,
    )
    .bind(Utc::now())
    .bind(action_id)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() == 0 {
      return Err(Error::NotFound(format!("action {action_id}")));
    }
    Ok(())
  }

  async fn delete_edges(&mut self, rule_id: Uuid) -> Result<u64, Error> {
    let result = sqlx::query("DELETE FROM rule_edges WHERE rule_id = ?")
      .bind(rule_id)
      .execute(&mut *self.tx)
      .await?;

    Ok(result.rows_affected())
  }

  async fn create_edge(&mut self, edge: &Edge) -> Result<(), Error> {
    sqlx::query(&format!(
      "INSERT INTO rule_edges ({EDGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(edge.edge_id)
    .bind(edge.rule_id)
    .bind(edge.source_action_id)
    .bind(edge.target_action_id)
    .bind(edge.edge_type.as_str())
    .bind(&edge.source_output)
    .bind(edge.edge_order)
    .bind(edge.created_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn commit(self) -> Result<(), Error> {
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self) -> Result<(), Error> {
    self.tx.rollback().await?;
    Ok(())
  }
}
