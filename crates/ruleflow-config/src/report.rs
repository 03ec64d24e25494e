use serde::{Deserialize, Serialize};

/// Outcome of a dry-run validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
  pub valid: bool,
  pub errors: Vec<String>,
  pub action_count: usize,
  pub edge_count: usize,
}
