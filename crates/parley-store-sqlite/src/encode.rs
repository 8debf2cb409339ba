//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings. Enums are stored as lowercase words.

use chrono::{DateTime, SecondsFormat, Utc};
use parley_core::{
  attachment::Attachment,
  dialogue::{Dialogue, DialogueState, Message},
  invitation::InvitationToken,
  party::{ApprovalStatus, Client, Provider, Role},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Always microsecond precision with a `Z` suffix, so every encoded value has
/// the same width and string order equals time order.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ApprovalStatus ──────────────────────────────────────────────────────────

pub fn encode_status(s: ApprovalStatus) -> &'static str {
  match s {
    ApprovalStatus::Pending => "pending",
    ApprovalStatus::Approved => "approved",
    ApprovalStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<ApprovalStatus> {
  match s {
    "pending" => Ok(ApprovalStatus::Pending),
    "approved" => Ok(ApprovalStatus::Approved),
    "rejected" => Ok(ApprovalStatus::Rejected),
    other => Err(Error::Decode { column: "status", value: other.to_owned() }),
  }
}

// ─── DialogueState ───────────────────────────────────────────────────────────

pub fn decode_state(s: &str) -> Result<DialogueState> {
  match s {
    "active" => Ok(DialogueState::Active),
    "completed" => Ok(DialogueState::Completed),
    other => Err(Error::Decode { column: "state", value: other.to_owned() }),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Client => "client",
    Role::Provider => "provider",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "client" => Ok(Role::Client),
    "provider" => Ok(Role::Provider),
    other => Err(Error::Decode { column: "sender_role", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` struct holds the column values exactly as read inside the
// connection closure; conversion to domain types happens back on the async
// side so decode errors surface as `Error` rather than `rusqlite::Error`.

pub const PROVIDER_COLUMNS: &str =
  "provider_id, platform_id, display_name, specialty, status, created_at";

pub struct RawProvider {
  pub provider_id:  String,
  pub platform_id:  i64,
  pub display_name: String,
  pub specialty:    Option<String>,
  pub status:       String,
  pub created_at:   String,
}

impl RawProvider {
  /// Reads columns in [`PROVIDER_COLUMNS`] order starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      provider_id:  row.get(offset)?,
      platform_id:  row.get(offset + 1)?,
      display_name: row.get(offset + 2)?,
      specialty:    row.get(offset + 3)?,
      status:       row.get(offset + 4)?,
      created_at:   row.get(offset + 5)?,
    })
  }

  pub fn into_provider(self) -> Result<Provider> {
    Ok(Provider {
      provider_id:  decode_uuid(&self.provider_id)?,
      platform_id:  self.platform_id,
      display_name: self.display_name,
      specialty:    self.specialty,
      status:       decode_status(&self.status)?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const CLIENT_COLUMNS: &str =
  "client_id, platform_id, display_name, registered_at";

pub struct RawClient {
  pub client_id:     String,
  pub platform_id:   i64,
  pub display_name:  String,
  pub registered_at: String,
}

impl RawClient {
  /// Reads columns in [`CLIENT_COLUMNS`] order starting at `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      client_id:     row.get(offset)?,
      platform_id:   row.get(offset + 1)?,
      display_name:  row.get(offset + 2)?,
      registered_at: row.get(offset + 3)?,
    })
  }

  pub fn into_client(self) -> Result<Client> {
    Ok(Client {
      client_id:     decode_uuid(&self.client_id)?,
      platform_id:   self.platform_id,
      display_name:  self.display_name,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

pub struct RawToken {
  pub code:        String,
  pub provider_id: String,
  pub used:        bool,
  pub created_at:  String,
  pub used_at:     Option<String>,
}

impl RawToken {
  pub fn into_token(self) -> Result<InvitationToken> {
    Ok(InvitationToken {
      code:        self.code,
      provider_id: decode_uuid(&self.provider_id)?,
      used:        self.used,
      created_at:  decode_dt(&self.created_at)?,
      used_at:     self.used_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub struct RawAttachment {
  pub client_id:   String,
  pub provider_id: String,
  pub created_at:  String,
  pub expires_at:  String,
}

impl RawAttachment {
  pub fn into_attachment(self) -> Result<Attachment> {
    Ok(Attachment {
      client_id:   decode_uuid(&self.client_id)?,
      provider_id: decode_uuid(&self.provider_id)?,
      created_at:  decode_dt(&self.created_at)?,
      expires_at:  decode_dt(&self.expires_at)?,
    })
  }
}

pub const DIALOGUE_COLUMNS: &str =
  "dialogue_id, client_id, provider_id, state, opened_at, closed_at";

pub struct RawDialogue {
  pub dialogue_id: String,
  pub client_id:   String,
  pub provider_id: String,
  pub state:       String,
  pub opened_at:   String,
  pub closed_at:   Option<String>,
}

impl RawDialogue {
  /// Reads columns in [`DIALOGUE_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      dialogue_id: row.get(0)?,
      client_id:   row.get(1)?,
      provider_id: row.get(2)?,
      state:       row.get(3)?,
      opened_at:   row.get(4)?,
      closed_at:   row.get(5)?,
    })
  }

  pub fn into_dialogue(self) -> Result<Dialogue> {
    Ok(Dialogue {
      dialogue_id: decode_uuid(&self.dialogue_id)?,
      client_id:   decode_uuid(&self.client_id)?,
      provider_id: decode_uuid(&self.provider_id)?,
      state:       decode_state(&self.state)?,
      opened_at:   decode_dt(&self.opened_at)?,
      closed_at:   self.closed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub const MESSAGE_COLUMNS: &str =
  "seq, message_id, dialogue_id, sender_role, sender_id, text, sent_at";

pub struct RawMessage {
  pub seq:         i64,
  pub message_id:  String,
  pub dialogue_id: String,
  pub sender_role: String,
  pub sender_id:   String,
  pub text:        String,
  pub sent_at:     String,
}

impl RawMessage {
  /// Reads columns in [`MESSAGE_COLUMNS`] order.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      seq:         row.get(0)?,
      message_id:  row.get(1)?,
      dialogue_id: row.get(2)?,
      sender_role: row.get(3)?,
      sender_id:   row.get(4)?,
      text:        row.get(5)?,
      sent_at:     row.get(6)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      message_id:  decode_uuid(&self.message_id)?,
      dialogue_id: decode_uuid(&self.dialogue_id)?,
      seq:         self.seq,
      sender_role: decode_role(&self.sender_role)?,
      sender_id:   decode_uuid(&self.sender_id)?,
      text:        self.text,
      sent_at:     decode_dt(&self.sent_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let whole = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
    let later = whole + TimeDelta::microseconds(1);
    // Default `to_rfc3339` would render `whole` without a fraction and put
    // `+` after the seconds, which sorts after `.`.
    assert!(encode_dt(whole) < encode_dt(later));
    assert_eq!(encode_dt(whole).len(), encode_dt(later).len());
  }

  #[test]
  fn timestamps_round_trip_at_micro_precision() {
    let dt = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
      + TimeDelta::microseconds(123_456);
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
  }

  #[test]
  fn unknown_status_is_a_decode_error() {
    assert!(matches!(
      decode_status("banned"),
      Err(Error::Decode { column: "status", .. })
    ));
  }
}
