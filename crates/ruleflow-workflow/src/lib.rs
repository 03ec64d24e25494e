//! Ruleflow Workflow
//!
//! This crate turns a submitted [`WorkflowRequest`](ruleflow_config::WorkflowRequest)
//! into a validated action graph. Everything here is pure: no storage, no
//! network, and the same input always yields the same verdict.
//!
//! Validation runs in three phases, each of which rejects the whole request:
//! - [`parse_request`]: field shape, identifier formats, enumerations
//! - [`validate_action_configs`]: per-action-type config document shape
//! - [`validate_graph`]: single start edge, no cycles, every action reachable
//!
//! Actions are addressed by [`NodeReference`]: `temp:<index>` for actions that
//! are new in this request, or the persisted UUID of an existing action.

mod action_config;
mod error;
mod graph;
mod node;
mod parse;
mod reference;

pub use action_config::{
  ACTION_TYPE_KEY, embedded_action_type, tag_action_type, validate_action_configs,
};
pub use error::{ReferenceError, WorkflowError};
pub use graph::{ActionGraph, validate_graph};
pub use node::{ActionNode, WorkflowEdge, WorkflowPlan};
pub use parse::parse_request;
pub use reference::{NodeReference, ReferenceMap};
