//! The `Ledger` trait, the only component that touches persistent state.
//!
//! The trait is implemented by storage backends (e.g. `parley-store-sqlite`).
//! The relay services depend on this abstraction, not on any concrete
//! backend.
//!
//! Cross-party invariants are the backend's job. Methods that resolve a race
//! ([`Ledger::redeem_token`], [`Ledger::open_dialogue`],
//! [`Ledger::complete_dialogue`], [`Ledger::append_message`]) must do so with
//! a single atomic conditional write, because the two sides of a pair may
//! call them concurrently from unrelated requests.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  PlatformId,
  attachment::{AttachedClient, AttachedProvider, Attachment},
  dialogue::{Append, Completion, Dialogue, Message, NewMessage, OpenedDialogue},
  invitation::{InvitationToken, Redemption},
  party::{ApprovalStatus, Client, NewClient, NewProvider, Provider},
  registration::RegistrationState,
};

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
  pub providers_pending:  u64,
  pub providers_approved: u64,
  pub providers_rejected: u64,
  pub clients:            u64,
  pub active_dialogues:   u64,
}

/// Abstraction over a Parley ledger backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait Ledger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Providers ─────────────────────────────────────────────────────────

  /// Persist a new provider in [`ApprovalStatus::Pending`]. Returns `None`
  /// if a provider with that platform identity already exists.
  fn add_provider(
    &self,
    input: NewProvider,
  ) -> impl Future<Output = Result<Option<Provider>, Self::Error>> + Send + '_;

  fn get_provider(
    &self,
    provider_id: Uuid,
  ) -> impl Future<Output = Result<Option<Provider>, Self::Error>> + Send + '_;

  fn find_provider(
    &self,
    platform_id: PlatformId,
  ) -> impl Future<Output = Result<Option<Provider>, Self::Error>> + Send + '_;

  /// List providers, optionally filtered by status, oldest first.
  fn list_providers(
    &self,
    status: Option<ApprovalStatus>,
  ) -> impl Future<Output = Result<Vec<Provider>, Self::Error>> + Send + '_;

  /// Set the approval status, and the specialty when one is given. Returns
  /// the updated row, or `None` if the provider does not exist.
  fn set_provider_status(
    &self,
    provider_id: Uuid,
    status: ApprovalStatus,
    specialty: Option<String>,
  ) -> impl Future<Output = Result<Option<Provider>, Self::Error>> + Send + '_;

  // ── Clients ───────────────────────────────────────────────────────────

  /// Register a client. Idempotent per platform identity: an existing row is
  /// returned unchanged. The `registered_at` timestamp is set by the caller.
  fn add_client(
    &self,
    input: NewClient,
    registered_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  fn get_client(
    &self,
    client_id: Uuid,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  fn find_client(
    &self,
    platform_id: PlatformId,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;

  // ── Invitation tokens ─────────────────────────────────────────────────

  fn insert_token(
    &self,
    token: InvitationToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_token(
    &self,
    code: String,
  ) -> impl Future<Output = Result<Option<InvitationToken>, Self::Error>> + Send + '_;

  /// Compare-and-swap the `used` flag from `false` to `true`. Exactly one of
  /// any number of concurrent calls for the same code sees
  /// [`Redemption::Redeemed`].
  fn redeem_token(
    &self,
    code: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Redemption, Self::Error>> + Send + '_;

  // ── Attachments ───────────────────────────────────────────────────────

  /// Insert or replace the attachment for its `(client_id, provider_id)`.
  fn upsert_attachment(
    &self,
    attachment: Attachment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_attachment(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> impl Future<Output = Result<Option<Attachment>, Self::Error>> + Send + '_;

  /// Providers attached to `client_id` with `expires_at > now`.
  fn attached_providers(
    &self,
    client_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<AttachedProvider>, Self::Error>> + Send + '_;

  /// Clients attached to `provider_id` with `expires_at > now`.
  fn attached_clients(
    &self,
    provider_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<AttachedClient>, Self::Error>> + Send + '_;

  /// Delete every attachment with `expires_at <= now`; returns the count.
  fn delete_expired_attachments(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Dialogues ─────────────────────────────────────────────────────────

  /// Return the active dialogue for the pair, or atomically create one.
  fn open_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<OpenedDialogue, Self::Error>> + Send + '_;

  fn get_dialogue(
    &self,
    dialogue_id: Uuid,
  ) -> impl Future<Output = Result<Option<Dialogue>, Self::Error>> + Send + '_;

  /// The single active dialogue for a pair, if any. Completed rows are never
  /// returned.
  fn active_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> impl Future<Output = Result<Option<Dialogue>, Self::Error>> + Send + '_;

  fn active_dialogues_for_client(
    &self,
    client_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Dialogue>, Self::Error>> + Send + '_;

  fn active_dialogues_for_provider(
    &self,
    provider_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Dialogue>, Self::Error>> + Send + '_;

  /// Conditionally move a dialogue from active to completed.
  fn complete_dialogue(
    &self,
    dialogue_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Completion, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Append a message if, at the moment of writing, the dialogue is active
  /// and its pair holds an attachment with `expires_at > sent_at`. The
  /// ledger assigns `message_id` and `seq`.
  fn append_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<Append, Self::Error>> + Send + '_;

  /// All messages of a dialogue in insertion order.
  fn messages(
    &self,
    dialogue_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Registration sessions ─────────────────────────────────────────────

  fn get_registration(
    &self,
    platform_id: PlatformId,
  ) -> impl Future<Output = Result<Option<RegistrationState>, Self::Error>> + Send + '_;

  fn put_registration(
    &self,
    platform_id: PlatformId,
    state: RegistrationState,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn clear_registration(
    &self,
    platform_id: PlatformId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  fn stats(&self) -> impl Future<Output = Result<LedgerStats, Self::Error>> + Send + '_;
}
