//! The outbound seam to the chat transport.
//!
//! The relay services never talk to the transport beyond
//! [`NotificationGateway::deliver`]. Delivery is best-effort: callers log a
//! failure and carry on, they never undo the ledger write that preceded it.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{PlatformId, action::Action};

/// An interactive button attached to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordance {
  pub label:     String,
  pub action_id: String,
}

impl Affordance {
  pub fn new(label: impl Into<String>, action: Action) -> Self {
    Self { label: label.into(), action_id: action.to_string() }
  }
}

/// Delivers a message plus affordances to a destination identity.
pub trait NotificationGateway: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn deliver(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
