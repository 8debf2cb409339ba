//! Dialogues and their message history.
//!
//! A dialogue moves `Active → Completed` exactly once. A completed row is
//! never revived; a later contact attempt opens a fresh dialogue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::party::Role;

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogueState {
  Active,
  Completed,
}

// ─── Dialogue ────────────────────────────────────────────────────────────────

/// A relay session between one client and one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dialogue {
  pub dialogue_id: Uuid,
  pub client_id:   Uuid,
  pub provider_id: Uuid,
  pub state:       DialogueState,
  pub opened_at:   DateTime<Utc>,
  pub closed_at:   Option<DateTime<Utc>>,
}

impl Dialogue {
  pub fn is_active(&self) -> bool { self.state == DialogueState::Active }

  /// The role `participant_id` plays in this dialogue, if any.
  pub fn role_of(&self, participant_id: Uuid) -> Option<Role> {
    if participant_id == self.client_id {
      Some(Role::Client)
    } else if participant_id == self.provider_id {
      Some(Role::Provider)
    } else {
      None
    }
  }

  /// The internal id of the participant playing `role`.
  pub fn participant(&self, role: Role) -> Uuid {
    match role {
      Role::Client => self.client_id,
      Role::Provider => self.provider_id,
    }
  }
}

/// Result of [`crate::ledger::Ledger::open_dialogue`].
#[derive(Debug, Clone, Serialize)]
pub struct OpenedDialogue {
  pub dialogue: Dialogue,
  /// `false` when an already-active dialogue for the pair was returned.
  pub created:  bool,
}

/// Result of the ledger's conditional `active → completed` update.
#[derive(Debug, Clone)]
pub enum Completion {
  Completed(Dialogue),
  AlreadyCompleted(Dialogue),
  NotFound,
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// Result of the ledger's conditional [`crate::ledger::Ledger::append_message`].
#[derive(Debug, Clone)]
pub enum Append {
  Appended(Message),
  /// The dialogue is no longer active; nothing was written.
  Closed,
  /// The pair's attachment is missing or lapsed at `sent_at`; nothing was
  /// written.
  Expired,
  NotFound,
}

/// A relayed message. Append-only; ordered by `seq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
  pub message_id:  Uuid,
  pub dialogue_id: Uuid,
  /// Ledger-assigned insertion sequence; strictly increasing.
  pub seq:         i64,
  pub sender_role: Role,
  pub sender_id:   Uuid,
  pub text:        String,
  pub sent_at:     DateTime<Utc>,
}

/// Input to [`crate::ledger::Ledger::append_message`].
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub dialogue_id: Uuid,
  pub sender_role: Role,
  pub sender_id:   Uuid,
  pub text:        String,
  pub sent_at:     DateTime<Utc>,
}
