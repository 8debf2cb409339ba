//! Attachments: the time-bounded right of a client to contact a provider.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  party::{Client, Provider},
};

// ─── Window ──────────────────────────────────────────────────────────────────

/// Longest subscription window accepted.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// How long an attachment lasts after it is bound or refreshed.
///
/// Always strictly positive, which is what keeps `expires_at > created_at`,
/// and at most [`MAX_WINDOW_DAYS`], which keeps expiries inside the
/// four-digit years the ledger's timestamp encoding orders correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionWindow(TimeDelta);

impl SubscriptionWindow {
  pub fn new(duration: TimeDelta) -> Result<Self> {
    if duration <= TimeDelta::zero() {
      return Err(Error::NonPositiveWindow);
    }
    if duration > TimeDelta::days(MAX_WINDOW_DAYS) {
      return Err(Error::WindowTooLong { max_days: MAX_WINDOW_DAYS });
    }
    Ok(Self(duration))
  }

  pub fn days(days: i64) -> Result<Self> {
    if days > MAX_WINDOW_DAYS {
      return Err(Error::WindowTooLong { max_days: MAX_WINDOW_DAYS });
    }
    TimeDelta::try_days(days)
      .ok_or(Error::NonPositiveWindow)
      .and_then(Self::new)
  }

  pub fn duration(&self) -> TimeDelta { self.0 }
}

// ─── Attachment ──────────────────────────────────────────────────────────────

/// A provider↔client relation keyed by `(client_id, provider_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub client_id:   Uuid,
  pub provider_id: Uuid,
  pub created_at:  DateTime<Utc>,
  pub expires_at:  DateTime<Utc>,
}

impl Attachment {
  pub fn new(
    client_id: Uuid,
    provider_id: Uuid,
    now: DateTime<Utc>,
    window: SubscriptionWindow,
  ) -> Result<Self> {
    let expires_at = now
      .checked_add_signed(window.duration())
      .ok_or(Error::ExpiryOutOfRange)?;
    Ok(Self { client_id, provider_id, created_at: now, expires_at })
  }

  /// An attachment is live strictly before its expiry instant.
  pub fn is_active_at(&self, now: DateTime<Utc>) -> bool { self.expires_at > now }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A provider a client may currently contact, with the attachment expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedProvider {
  pub provider:   Provider,
  pub expires_at: DateTime<Utc>,
}

/// A client currently attached to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedClient {
  pub client:     Client,
  pub expires_at: DateTime<Utc>,
}
