//! Providers and clients, the two participant roles.
//!
//! Both are addressed internally by UUID. The platform identity is kept only
//! so the gateway knows where to deliver, and so the front-end can resolve an
//! inbound chat back to a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PlatformId;

/// Where a provider stands in the admin approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

/// A registered provider (the party who issues invitations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
  pub provider_id:  Uuid,
  pub platform_id:  PlatformId,
  pub display_name: String,
  /// Assigned by the admin on approval; `None` while pending.
  pub specialty:    Option<String>,
  pub status:       ApprovalStatus,
  pub created_at:   DateTime<Utc>,
}

impl Provider {
  pub fn is_approved(&self) -> bool { self.status == ApprovalStatus::Approved }
}

/// Input to [`crate::ledger::Ledger::add_provider`].
#[derive(Debug, Clone)]
pub struct NewProvider {
  pub platform_id:  PlatformId,
  pub display_name: String,
}

/// A registered client (the party who redeems invitations).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub client_id:     Uuid,
  pub platform_id:   PlatformId,
  pub display_name:  String,
  pub registered_at: DateTime<Utc>,
}

/// Input to [`crate::ledger::Ledger::add_client`].
#[derive(Debug, Clone)]
pub struct NewClient {
  pub platform_id:  PlatformId,
  pub display_name: String,
}

/// Which side of a dialogue a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Client,
  Provider,
}

impl Role {
  pub fn counterpart(self) -> Self {
    match self {
      Self::Client => Self::Provider,
      Self::Provider => Self::Client,
    }
  }
}
