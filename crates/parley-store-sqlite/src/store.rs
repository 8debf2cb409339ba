//! [`SqliteLedger`], the SQLite implementation of [`Ledger`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use parley_core::{
  PlatformId,
  attachment::{AttachedClient, AttachedProvider, Attachment},
  dialogue::{Append, Completion, Dialogue, Message, NewMessage, OpenedDialogue},
  invitation::{InvitationToken, Redemption},
  ledger::{Ledger, LedgerStats},
  party::{ApprovalStatus, Client, NewClient, NewProvider, Provider},
  registration::RegistrationState,
};

use crate::{
  Result,
  encode::{
    CLIENT_COLUMNS, DIALOGUE_COLUMNS, MESSAGE_COLUMNS, PROVIDER_COLUMNS,
    RawAttachment, RawClient, RawDialogue, RawMessage, RawProvider, RawToken,
    decode_dt, decode_uuid, encode_dt, encode_role, encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

/// What the append transaction decided, before the message is assembled.
enum Appending {
  Seq(i64),
  Closed,
  Expired,
  NotFound,
}

/// Prefix every column in a `COLUMNS` list with a table alias.
fn qualify(columns: &str, alias: &str) -> String {
  columns
    .split(", ")
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Parley ledger backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteLedger {
  conn: tokio_rusqlite::Connection,
}

impl SqliteLedger {
  /// Open (or create) a ledger at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    Ok(ledger)
  }

  /// Open an in-memory ledger for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let ledger = Self { conn };
    ledger.init_schema().await?;
    Ok(ledger)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn provider_where(
    &self,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<Option<Provider>> {
    let raw: Option<RawProvider> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROVIDER_COLUMNS} FROM providers WHERE {column} = ?1"),
              rusqlite::params![value],
              |row| RawProvider::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProvider::into_provider).transpose()
  }

  async fn client_where(
    &self,
    column: &'static str,
    value: rusqlite::types::Value,
  ) -> Result<Option<Client>> {
    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE {column} = ?1"),
              rusqlite::params![value],
              |row| RawClient::from_row(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawClient::into_client).transpose()
  }

  async fn dialogues_where(
    &self,
    condition: &'static str,
    value: String,
  ) -> Result<Vec<Dialogue>> {
    let raws: Vec<RawDialogue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DIALOGUE_COLUMNS} FROM dialogues
           WHERE {condition}
           ORDER BY opened_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![value], RawDialogue::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDialogue::into_dialogue).collect()
  }
}

// ─── Ledger impl ─────────────────────────────────────────────────────────────

impl Ledger for SqliteLedger {
  type Error = crate::Error;

  // ── Providers ─────────────────────────────────────────────────────────────

  async fn add_provider(&self, input: NewProvider) -> Result<Option<Provider>> {
    let provider = Provider {
      provider_id:  Uuid::new_v4(),
      platform_id:  input.platform_id,
      display_name: input.display_name,
      specialty:    None,
      status:       ApprovalStatus::Pending,
      created_at:   Utc::now(),
    };

    let id_str     = encode_uuid(provider.provider_id);
    let platform   = provider.platform_id;
    let name       = provider.display_name.clone();
    let status_str = encode_status(provider.status);
    let at_str     = encode_dt(provider.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO providers (provider_id, platform_id, display_name, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (platform_id) DO NOTHING",
          rusqlite::params![id_str, platform, name, status_str, at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    Ok(inserted.then_some(provider))
  }

  async fn get_provider(&self, provider_id: Uuid) -> Result<Option<Provider>> {
    self
      .provider_where("provider_id", encode_uuid(provider_id).into())
      .await
  }

  async fn find_provider(&self, platform_id: PlatformId) -> Result<Option<Provider>> {
    self.provider_where("platform_id", platform_id.into()).await
  }

  async fn list_providers(
    &self,
    status: Option<ApprovalStatus>,
  ) -> Result<Vec<Provider>> {
    let status_str = status.map(encode_status);

    let raws: Vec<RawProvider> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROVIDER_COLUMNS} FROM providers
           WHERE ?1 IS NULL OR status = ?1
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], |row| {
            RawProvider::from_row(row, 0)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProvider::into_provider).collect()
  }

  async fn set_provider_status(
    &self,
    provider_id: Uuid,
    status: ApprovalStatus,
    specialty: Option<String>,
  ) -> Result<Option<Provider>> {
    let id_str     = encode_uuid(provider_id);
    let status_str = encode_status(status);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE providers
           SET status = ?2, specialty = COALESCE(?3, specialty)
           WHERE provider_id = ?1",
          rusqlite::params![id_str, status_str, specialty],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_provider(provider_id).await
  }

  // ── Clients ───────────────────────────────────────────────────────────────

  async fn add_client(
    &self,
    input: NewClient,
    registered_at: DateTime<Utc>,
  ) -> Result<Client> {
    let id_str   = encode_uuid(Uuid::new_v4());
    let platform = input.platform_id;
    let at_str   = encode_dt(registered_at);

    let raw: RawClient = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO clients (client_id, platform_id, display_name, registered_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (platform_id) DO NOTHING",
          rusqlite::params![id_str, platform, input.display_name, at_str],
        )?;
        let raw = tx.query_row(
          &format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE platform_id = ?1"),
          rusqlite::params![platform],
          |row| RawClient::from_row(row, 0),
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_client()
  }

  async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>> {
    self.client_where("client_id", encode_uuid(client_id).into()).await
  }

  async fn find_client(&self, platform_id: PlatformId) -> Result<Option<Client>> {
    self.client_where("platform_id", platform_id.into()).await
  }

  // ── Invitation tokens ─────────────────────────────────────────────────────

  async fn insert_token(&self, token: InvitationToken) -> Result<()> {
    let provider_str = encode_uuid(token.provider_id);
    let at_str       = encode_dt(token.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO invitation_tokens (code, provider_id, used, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![token.code, provider_str, token.used, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_token(&self, code: String) -> Result<Option<InvitationToken>> {
    let raw: Option<RawToken> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT code, provider_id, used, created_at, used_at
               FROM invitation_tokens WHERE code = ?1",
              rusqlite::params![code],
              |row| {
                Ok(RawToken {
                  code:        row.get(0)?,
                  provider_id: row.get(1)?,
                  used:        row.get(2)?,
                  created_at:  row.get(3)?,
                  used_at:     row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawToken::into_token).transpose()
  }

  async fn redeem_token(&self, code: String, at: DateTime<Utc>) -> Result<Redemption> {
    let at_str = encode_dt(at);

    // The UPDATE only matches an unused row, so of two racing calls exactly
    // one gets a provider id back.
    let (won, exists): (Option<String>, bool) = self
      .conn
      .call(move |conn| {
        let won: Option<String> = conn
          .query_row(
            "UPDATE invitation_tokens SET used = 1, used_at = ?2
             WHERE code = ?1 AND used = 0
             RETURNING provider_id",
            rusqlite::params![code, at_str],
            |row| row.get(0),
          )
          .optional()?;

        if won.is_some() {
          return Ok((won, true));
        }

        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM invitation_tokens WHERE code = ?1",
            rusqlite::params![code],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        Ok((None, exists))
      })
      .await?;

    Ok(match won {
      Some(provider_str) => Redemption::Redeemed { provider_id: decode_uuid(&provider_str)? },
      None if exists => Redemption::AlreadyUsed,
      None => Redemption::Unknown,
    })
  }

  // ── Attachments ───────────────────────────────────────────────────────────

  async fn upsert_attachment(&self, attachment: Attachment) -> Result<()> {
    let client_str   = encode_uuid(attachment.client_id);
    let provider_str = encode_uuid(attachment.provider_id);
    let created_str  = encode_dt(attachment.created_at);
    let expires_str  = encode_dt(attachment.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attachments (client_id, provider_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (client_id, provider_id) DO UPDATE
             SET created_at = excluded.created_at,
                 expires_at = excluded.expires_at",
          rusqlite::params![client_str, provider_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_attachment(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> Result<Option<Attachment>> {
    let client_str   = encode_uuid(client_id);
    let provider_str = encode_uuid(provider_id);

    let raw: Option<RawAttachment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT client_id, provider_id, created_at, expires_at
               FROM attachments WHERE client_id = ?1 AND provider_id = ?2",
              rusqlite::params![client_str, provider_str],
              |row| {
                Ok(RawAttachment {
                  client_id:   row.get(0)?,
                  provider_id: row.get(1)?,
                  created_at:  row.get(2)?,
                  expires_at:  row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttachment::into_attachment).transpose()
  }

  async fn attached_providers(
    &self,
    client_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Vec<AttachedProvider>> {
    let client_str = encode_uuid(client_id);
    let now_str    = encode_dt(now);

    let raws: Vec<(RawProvider, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {}, a.expires_at
           FROM attachments a
           JOIN providers p ON p.provider_id = a.provider_id
           WHERE a.client_id = ?1 AND a.expires_at > ?2
           ORDER BY a.expires_at",
          qualify(PROVIDER_COLUMNS, "p"),
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![client_str, now_str], |row| {
            Ok((RawProvider::from_row(row, 0)?, row.get(6)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, expires)| {
        Ok(AttachedProvider {
          provider:   raw.into_provider()?,
          expires_at: decode_dt(&expires)?,
        })
      })
      .collect()
  }

  async fn attached_clients(
    &self,
    provider_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Vec<AttachedClient>> {
    let provider_str = encode_uuid(provider_id);
    let now_str      = encode_dt(now);

    let raws: Vec<(RawClient, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {}, a.expires_at
           FROM attachments a
           JOIN clients c ON c.client_id = a.client_id
           WHERE a.provider_id = ?1 AND a.expires_at > ?2
           ORDER BY a.expires_at",
          qualify(CLIENT_COLUMNS, "c"),
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![provider_str, now_str], |row| {
            Ok((RawClient::from_row(row, 0)?, row.get(4)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, expires)| {
        Ok(AttachedClient {
          client:     raw.into_client()?,
          expires_at: decode_dt(&expires)?,
        })
      })
      .collect()
  }

  async fn delete_expired_attachments(&self, now: DateTime<Utc>) -> Result<u64> {
    let now_str = encode_dt(now);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attachments WHERE expires_at <= ?1",
          rusqlite::params![now_str],
        )?)
      })
      .await?;

    Ok(deleted as u64)
  }

  // ── Dialogues ─────────────────────────────────────────────────────────────

  async fn open_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<OpenedDialogue> {
    let id_str       = encode_uuid(Uuid::new_v4());
    let client_str   = encode_uuid(client_id);
    let provider_str = encode_uuid(provider_id);
    let at_str       = encode_dt(at);

    // The partial unique index turns a duplicate insert into a no-op; the
    // follow-up SELECT then sees whichever row won.
    let (raw, created): (RawDialogue, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
          "INSERT INTO dialogues (dialogue_id, client_id, provider_id, state, opened_at)
           VALUES (?1, ?2, ?3, 'active', ?4)
           ON CONFLICT DO NOTHING",
          rusqlite::params![id_str, client_str, provider_str, at_str],
        )?;
        let raw = tx.query_row(
          &format!(
            "SELECT {DIALOGUE_COLUMNS} FROM dialogues
             WHERE client_id = ?1 AND provider_id = ?2 AND state = 'active'"
          ),
          rusqlite::params![client_str, provider_str],
          RawDialogue::from_row,
        )?;
        tx.commit()?;
        Ok((raw, inserted == 1))
      })
      .await?;

    Ok(OpenedDialogue { dialogue: raw.into_dialogue()?, created })
  }

  async fn get_dialogue(&self, dialogue_id: Uuid) -> Result<Option<Dialogue>> {
    let id_str = encode_uuid(dialogue_id);

    let raw: Option<RawDialogue> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DIALOGUE_COLUMNS} FROM dialogues WHERE dialogue_id = ?1"),
              rusqlite::params![id_str],
              RawDialogue::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDialogue::into_dialogue).transpose()
  }

  async fn active_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> Result<Option<Dialogue>> {
    let client_str   = encode_uuid(client_id);
    let provider_str = encode_uuid(provider_id);

    let raw: Option<RawDialogue> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {DIALOGUE_COLUMNS} FROM dialogues
                 WHERE client_id = ?1 AND provider_id = ?2 AND state = 'active'"
              ),
              rusqlite::params![client_str, provider_str],
              RawDialogue::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDialogue::into_dialogue).transpose()
  }

  async fn active_dialogues_for_client(&self, client_id: Uuid) -> Result<Vec<Dialogue>> {
    self
      .dialogues_where("client_id = ?1 AND state = 'active'", encode_uuid(client_id))
      .await
  }

  async fn active_dialogues_for_provider(
    &self,
    provider_id: Uuid,
  ) -> Result<Vec<Dialogue>> {
    self
      .dialogues_where("provider_id = ?1 AND state = 'active'", encode_uuid(provider_id))
      .await
  }

  async fn complete_dialogue(
    &self,
    dialogue_id: Uuid,
    at: DateTime<Utc>,
  ) -> Result<Completion> {
    let id_str = encode_uuid(dialogue_id);
    let at_str = encode_dt(at);

    let (changed, raw): (usize, Option<RawDialogue>) = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE dialogues SET state = 'completed', closed_at = ?2
           WHERE dialogue_id = ?1 AND state = 'active'",
          rusqlite::params![id_str, at_str],
        )?;
        let raw = conn
          .query_row(
            &format!("SELECT {DIALOGUE_COLUMNS} FROM dialogues WHERE dialogue_id = ?1"),
            rusqlite::params![id_str],
            RawDialogue::from_row,
          )
          .optional()?;
        Ok((changed, raw))
      })
      .await?;

    Ok(match raw {
      None => Completion::NotFound,
      Some(raw) if changed == 1 => Completion::Completed(raw.into_dialogue()?),
      Some(raw) => Completion::AlreadyCompleted(raw.into_dialogue()?),
    })
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn append_message(&self, input: NewMessage) -> Result<Append> {
    let message_id   = Uuid::new_v4();
    let id_str       = encode_uuid(message_id);
    let dialogue_str = encode_uuid(input.dialogue_id);
    let role_str     = encode_role(input.sender_role);
    let sender_str   = encode_uuid(input.sender_id);
    let text         = input.text.clone();
    let at_str       = encode_dt(input.sent_at);

    // The state and attachment checks share the write's transaction, so a
    // close or sweep from the other side lands either wholly before or
    // wholly after the append.
    let outcome: Appending = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let state: Option<String> = tx
          .query_row(
            "SELECT state FROM dialogues WHERE dialogue_id = ?1",
            rusqlite::params![dialogue_str],
            |row| row.get(0),
          )
          .optional()?;
        match state.as_deref() {
          None => return Ok(Appending::NotFound),
          Some("active") => {}
          Some(_) => return Ok(Appending::Closed),
        }

        let attached: bool = tx.query_row(
          "SELECT EXISTS (
             SELECT 1 FROM attachments a
             JOIN dialogues d
               ON a.client_id = d.client_id AND a.provider_id = d.provider_id
             WHERE d.dialogue_id = ?1 AND a.expires_at > ?2
           )",
          rusqlite::params![dialogue_str, at_str],
          |row| row.get(0),
        )?;
        if !attached {
          return Ok(Appending::Expired);
        }

        let seq = tx.query_row(
          "INSERT INTO messages (message_id, dialogue_id, sender_role, sender_id, text, sent_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           RETURNING seq",
          rusqlite::params![id_str, dialogue_str, role_str, sender_str, text, at_str],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(Appending::Seq(seq))
      })
      .await?;

    Ok(match outcome {
      Appending::Seq(seq) => Append::Appended(Message {
        message_id,
        dialogue_id: input.dialogue_id,
        seq,
        sender_role: input.sender_role,
        sender_id: input.sender_id,
        text: input.text,
        sent_at: input.sent_at,
      }),
      Appending::Closed => Append::Closed,
      Appending::Expired => Append::Expired,
      Appending::NotFound => Append::NotFound,
    })
  }

  async fn messages(&self, dialogue_id: Uuid) -> Result<Vec<Message>> {
    let id_str = encode_uuid(dialogue_id);

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages
           WHERE dialogue_id = ?1
           ORDER BY seq"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMessage::into_message).collect()
  }

  // ── Registration sessions ─────────────────────────────────────────────────

  async fn get_registration(
    &self,
    platform_id: PlatformId,
  ) -> Result<Option<RegistrationState>> {
    let json: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT state_json FROM registration_sessions WHERE platform_id = ?1",
              rusqlite::params![platform_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(json.as_deref().map(RegistrationState::from_json).transpose()?)
  }

  async fn put_registration(
    &self,
    platform_id: PlatformId,
    state: RegistrationState,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let json   = state.to_json()?;
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO registration_sessions (platform_id, state_json, updated_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (platform_id) DO UPDATE
             SET state_json = excluded.state_json,
                 updated_at = excluded.updated_at",
          rusqlite::params![platform_id, json, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn clear_registration(&self, platform_id: PlatformId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM registration_sessions WHERE platform_id = ?1",
          rusqlite::params![platform_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<LedgerStats> {
    let counts: [i64; 5] = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM providers WHERE status = 'pending'),
             (SELECT COUNT(*) FROM providers WHERE status = 'approved'),
             (SELECT COUNT(*) FROM providers WHERE status = 'rejected'),
             (SELECT COUNT(*) FROM clients),
             (SELECT COUNT(*) FROM dialogues WHERE state = 'active')",
          [],
          |row| Ok([row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?]),
        )?)
      })
      .await?;

    let [providers_pending, providers_approved, providers_rejected, clients, active_dialogues] =
      counts.map(|n| n as u64);

    Ok(LedgerStats {
      providers_pending,
      providers_approved,
      providers_rejected,
      clients,
      active_dialogues,
    })
  }
}
