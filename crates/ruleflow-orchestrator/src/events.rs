//! Rule change events and notifiers.
//!
//! Events are emitted only after a save has committed, so consumers such as
//! rule caches can invalidate. Delivery is best effort: the saver logs a
//! failed notification and still reports the save as successful.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events emitted after a workflow save commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleEvent {
  /// A new rule and its action graph were created.
  RuleCreated { rule_id: Uuid },

  /// An existing rule and its action graph were replaced.
  RuleUpdated { rule_id: Uuid },
}

impl RuleEvent {
  pub fn rule_id(&self) -> Uuid {
    match self {
      RuleEvent::RuleCreated { rule_id } | RuleEvent::RuleUpdated { rule_id } => *rule_id,
    }
  }
}

/// A notification could not be delivered.
#[derive(Debug, thiserror::Error)]
#[error("notification not delivered: {0}")]
pub struct NotifyError(pub String);

/// Trait for receiving rule change events.
///
/// The saver calls `notify` once per committed save. Implementations decide
/// what to do with the event (invalidate a cache, publish, log, ignore).
pub trait RuleNotifier: Send + Sync {
  /// Called after a save commits.
  fn notify(&self, event: RuleEvent) -> Result<(), NotifyError>;
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RuleNotifier for NoopNotifier {
  fn notify(&self, _event: RuleEvent) -> Result<(), NotifyError> {
    Ok(())
  }
}

/// A notifier that sends events to an unbounded channel.
///
/// Sending fails once the receiver has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<RuleEvent>,
}

impl ChannelNotifier {
  /// Create a new channel notifier.
  pub fn new(sender: mpsc::UnboundedSender<RuleEvent>) -> Self {
    Self { sender }
  }
}

impl RuleNotifier for ChannelNotifier {
  fn notify(&self, event: RuleEvent) -> Result<(), NotifyError> {
    self
      .sender
      .send(event)
      .map_err(|e| NotifyError(format!("receiver closed, dropped {:?}", e.0)))
  }
}
