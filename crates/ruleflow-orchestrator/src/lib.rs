//! Ruleflow Orchestrator
//!
//! The save path for automation workflows. Every create or update runs the
//! same four phases:
//!
//! 1. **validate**: request shape, action configs, graph structure. Nothing
//!    touches storage until all three pass.
//! 2. **transact**: open one transaction for the whole save.
//! 3. **reconcile**: write the rule, create/update/deactivate actions, and
//!    replace the edge set.
//! 4. **notify**: after commit, emit a [`RuleEvent`] so caches can
//!    invalidate. A failed notification is logged, never returned.

mod error;
mod events;
mod saver;

pub use error::{ErrorKind, SaveError};
pub use events::{ChannelNotifier, NoopNotifier, NotifyError, RuleEvent, RuleNotifier};
pub use saver::{SavedWorkflow, WorkflowSaver, validate_request};
