use thiserror::Error;
use uuid::Uuid;

/// Why an action reference on an edge could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
  #[error("reference is missing")]
  Missing,

  #[error("malformed reference '{0}'")]
  Malformed(String),

  #[error("temp:{index} is out of bounds for {count} submitted actions")]
  TempIndexOutOfBounds { index: usize, count: usize },

  #[error("action '{0}' not found in submitted actions")]
  NotFound(Uuid),

  #[error("start edges take no source")]
  SourceOnStartEdge,
}

/// A workflow request that cannot be accepted as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("{field}: {message}")]
  InvalidField { field: String, message: String },

  #[error("action id {0} is submitted more than once")]
  DuplicateActionId(Uuid),

  #[error("workflow must contain at least one action")]
  NoActions,

  #[error("missing start edge")]
  MissingStartEdge,

  #[error("workflow must have exactly one start edge, found {count}")]
  MultipleStartEdges { count: usize },

  #[error("edge {edge}: invalid target_action_id: {source}")]
  InvalidTarget {
    edge: usize,
    #[source]
    source: ReferenceError,
  },

  #[error("edge {edge}: invalid source_action_id: {source}")]
  InvalidSource {
    edge: usize,
    #[source]
    source: ReferenceError,
  },

  #[error("cycle detected in workflow graph")]
  CycleDetected,

  #[error("action {index} ({name}) is unreachable from the start edge")]
  Unreachable { index: usize, name: String },

  #[error("action {index} ({name}): {message}")]
  InvalidActionConfig {
    index: usize,
    name: String,
    message: String,
  },
}

impl WorkflowError {
  pub(crate) fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
    WorkflowError::InvalidField {
      field: field.into(),
      message: message.into(),
    }
  }
}
