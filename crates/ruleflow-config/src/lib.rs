//! Ruleflow Config
//!
//! This crate contains the serializable documents exchanged with callers of
//! the workflow save path. These types represent a workflow exactly as a
//! client submitted it, before any validation or identifier resolution.
//!
//! Documents arrive as:
//! - JSON request bodies (create, update, dry-run)
//! - JSON files (via CLI with `ruleflow create workflow.json`)
//!
//! The `ruleflow-workflow` crate parses these documents into validated
//! action/edge sets, and `ruleflow-orchestrator` persists them.

mod enums;
mod report;
mod request;

pub use enums::{ActionType, EdgeType, UnknownVariant};
pub use report::ValidationReport;
pub use request::{ActionRequest, EdgeRequest, WorkflowRequest};
