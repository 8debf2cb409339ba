//! Single-use invitation tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An invitation issued by a provider. The `used` flag only ever moves from
/// `false` to `true`; a code is never reissued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationToken {
  pub code:        String,
  pub provider_id: Uuid,
  pub used:        bool,
  pub created_at:  DateTime<Utc>,
  pub used_at:     Option<DateTime<Utc>>,
}

/// Result of the ledger's compare-and-swap on a token's `used` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
  /// This call flipped the flag; the token binds to `provider_id`.
  Redeemed { provider_id: Uuid },
  /// No token with that code exists.
  Unknown,
  /// The flag was already set, by an earlier or a concurrent call.
  AlreadyUsed,
}
