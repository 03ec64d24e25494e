//! Save error types.

use ruleflow_workflow::WorkflowError;

/// Errors returned by the workflow save path.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
  /// The request was rejected before any transaction was opened.
  #[error("invalid argument: {0}")]
  InvalidArgument(#[from] WorkflowError),

  /// A referenced rule, entity or action does not exist.
  #[error("not found: {0}")]
  NotFound(String),

  /// The caller cancelled the save. Nothing was persisted.
  #[error("save cancelled")]
  Cancelled,

  /// Storage failed; the transaction was rolled back.
  #[error("internal error during {operation}: {source}")]
  Internal {
    operation: &'static str,
    #[source]
    source: ruleflow_store::Error,
  },
}

/// Coarse classification of a [`SaveError`] for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  InvalidArgument,
  NotFound,
  Cancelled,
  Internal,
}

impl ErrorKind {
  /// HTTP status a transport should answer with.
  pub fn http_status(&self) -> u16 {
    match self {
      ErrorKind::InvalidArgument => 400,
      ErrorKind::NotFound => 404,
      ErrorKind::Cancelled => 499,
      ErrorKind::Internal => 500,
    }
  }
}

impl SaveError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      SaveError::InvalidArgument(_) => ErrorKind::InvalidArgument,
      SaveError::NotFound(_) => ErrorKind::NotFound,
      SaveError::Cancelled => ErrorKind::Cancelled,
      SaveError::Internal { .. } => ErrorKind::Internal,
    }
  }

  /// Map a storage error raised while performing `operation`.
  pub(crate) fn store(operation: &'static str) -> impl FnOnce(ruleflow_store::Error) -> Self {
    move |source| match source {
      ruleflow_store::Error::NotFound(what) => SaveError::NotFound(what),
      source => SaveError::Internal { operation, source },
    }
  }
}
