//! Test doubles and fixtures shared by the service tests.

use std::sync::{
  Arc, Mutex,
  atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, TimeZone, Utc};
use parley_core::{
  Affordance, Ledger, NotificationGateway, PlatformId,
  attachment::{AttachedClient, AttachedProvider, Attachment, SubscriptionWindow},
  clock::{Clock, ManualClock},
  dialogue::{Append, Completion, Dialogue, Message, NewMessage, OpenedDialogue},
  invitation::{InvitationToken, Redemption},
  ledger::LedgerStats,
  party::{ApprovalStatus, Client, NewClient, NewProvider, Provider},
  registration::RegistrationState,
};
use parley_store_sqlite::SqliteLedger;
use uuid::Uuid;

use crate::{RelayConfig, Services};

pub const ADMIN: PlatformId = 1;

// ─── Gateway ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Delivery {
  pub destination: PlatformId,
  pub text:        String,
  pub affordances: Vec<Affordance>,
}

#[derive(Debug, thiserror::Error)]
#[error("gateway unavailable")]
pub struct GatewayDown;

/// Records every delivery; can be switched to fail.
#[derive(Debug, Default)]
pub struct RecordingGateway {
  sent:    Mutex<Vec<Delivery>>,
  failing: AtomicBool,
}

impl RecordingGateway {
  pub fn sent(&self) -> Vec<Delivery> {
    self.sent.lock().unwrap().clone()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }
}

impl NotificationGateway for RecordingGateway {
  type Error = GatewayDown;

  async fn deliver(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> Result<(), GatewayDown> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(GatewayDown);
    }
    self.sent.lock().unwrap().push(Delivery { destination, text, affordances });
    Ok(())
  }
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

/// Delegates to a [`SqliteLedger`], except that once armed, the next
/// `get_dialogue` completes the dialogue right after reading it. The caller
/// sees an active row that the other participant has already closed.
pub struct ClosingLedger {
  inner: SqliteLedger,
  armed: AtomicBool,
}

impl ClosingLedger {
  pub fn new(inner: SqliteLedger) -> Self {
    Self { inner, armed: AtomicBool::new(false) }
  }

  pub fn close_after_next_read(&self) { self.armed.store(true, Ordering::SeqCst); }
}

type StoreResult<T> = parley_store_sqlite::Result<T>;

impl Ledger for ClosingLedger {
  type Error = parley_store_sqlite::Error;

  async fn add_provider(&self, input: NewProvider) -> StoreResult<Option<Provider>> {
    self.inner.add_provider(input).await
  }

  async fn get_provider(&self, provider_id: Uuid) -> StoreResult<Option<Provider>> {
    self.inner.get_provider(provider_id).await
  }

  async fn find_provider(&self, platform_id: PlatformId) -> StoreResult<Option<Provider>> {
    self.inner.find_provider(platform_id).await
  }

  async fn list_providers(
    &self,
    status: Option<ApprovalStatus>,
  ) -> StoreResult<Vec<Provider>> {
    self.inner.list_providers(status).await
  }

  async fn set_provider_status(
    &self,
    provider_id: Uuid,
    status: ApprovalStatus,
    specialty: Option<String>,
  ) -> StoreResult<Option<Provider>> {
    self.inner.set_provider_status(provider_id, status, specialty).await
  }

  async fn add_client(
    &self,
    input: NewClient,
    registered_at: DateTime<Utc>,
  ) -> StoreResult<Client> {
    self.inner.add_client(input, registered_at).await
  }

  async fn get_client(&self, client_id: Uuid) -> StoreResult<Option<Client>> {
    self.inner.get_client(client_id).await
  }

  async fn find_client(&self, platform_id: PlatformId) -> StoreResult<Option<Client>> {
    self.inner.find_client(platform_id).await
  }

  async fn insert_token(&self, token: InvitationToken) -> StoreResult<()> {
    self.inner.insert_token(token).await
  }

  async fn get_token(&self, code: String) -> StoreResult<Option<InvitationToken>> {
    self.inner.get_token(code).await
  }

  async fn redeem_token(&self, code: String, at: DateTime<Utc>) -> StoreResult<Redemption> {
    self.inner.redeem_token(code, at).await
  }

  async fn upsert_attachment(&self, attachment: Attachment) -> StoreResult<()> {
    self.inner.upsert_attachment(attachment).await
  }

  async fn get_attachment(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> StoreResult<Option<Attachment>> {
    self.inner.get_attachment(client_id, provider_id).await
  }

  async fn attached_providers(
    &self,
    client_id: Uuid,
    now: DateTime<Utc>,
  ) -> StoreResult<Vec<AttachedProvider>> {
    self.inner.attached_providers(client_id, now).await
  }

  async fn attached_clients(
    &self,
    provider_id: Uuid,
    now: DateTime<Utc>,
  ) -> StoreResult<Vec<AttachedClient>> {
    self.inner.attached_clients(provider_id, now).await
  }

  async fn delete_expired_attachments(&self, now: DateTime<Utc>) -> StoreResult<u64> {
    self.inner.delete_expired_attachments(now).await
  }

  async fn open_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
    at: DateTime<Utc>,
  ) -> StoreResult<OpenedDialogue> {
    self.inner.open_dialogue(client_id, provider_id, at).await
  }

  async fn get_dialogue(&self, dialogue_id: Uuid) -> StoreResult<Option<Dialogue>> {
    let read = self.inner.get_dialogue(dialogue_id).await?;
    if self.armed.swap(false, Ordering::SeqCst) {
      self.inner.complete_dialogue(dialogue_id, start()).await?;
    }
    Ok(read)
  }

  async fn active_dialogue(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> StoreResult<Option<Dialogue>> {
    self.inner.active_dialogue(client_id, provider_id).await
  }

  async fn active_dialogues_for_client(&self, client_id: Uuid) -> StoreResult<Vec<Dialogue>> {
    self.inner.active_dialogues_for_client(client_id).await
  }

  async fn active_dialogues_for_provider(
    &self,
    provider_id: Uuid,
  ) -> StoreResult<Vec<Dialogue>> {
    self.inner.active_dialogues_for_provider(provider_id).await
  }

  async fn complete_dialogue(
    &self,
    dialogue_id: Uuid,
    at: DateTime<Utc>,
  ) -> StoreResult<Completion> {
    self.inner.complete_dialogue(dialogue_id, at).await
  }

  async fn append_message(&self, input: NewMessage) -> StoreResult<Append> {
    self.inner.append_message(input).await
  }

  async fn messages(&self, dialogue_id: Uuid) -> StoreResult<Vec<Message>> {
    self.inner.messages(dialogue_id).await
  }

  async fn get_registration(
    &self,
    platform_id: PlatformId,
  ) -> StoreResult<Option<RegistrationState>> {
    self.inner.get_registration(platform_id).await
  }

  async fn put_registration(
    &self,
    platform_id: PlatformId,
    state: RegistrationState,
    at: DateTime<Utc>,
  ) -> StoreResult<()> {
    self.inner.put_registration(platform_id, state, at).await
  }

  async fn clear_registration(&self, platform_id: PlatformId) -> StoreResult<()> {
    self.inner.clear_registration(platform_id).await
  }

  async fn stats(&self) -> StoreResult<LedgerStats> { self.inner.stats().await }
}

// ─── Fixture ─────────────────────────────────────────────────────────────────

pub struct Fixture {
  pub services: Services<SqliteLedger, RecordingGateway>,
  pub ledger:   Arc<SqliteLedger>,
  pub gateway:  Arc<RecordingGateway>,
  pub clock:    Arc<ManualClock>,
}

pub fn start() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap() }

pub async fn fixture() -> Fixture {
  let ledger = Arc::new(SqliteLedger::open_in_memory().await.unwrap());
  let gateway = Arc::new(RecordingGateway::default());
  let clock = Arc::new(ManualClock::new(start()));
  let services = Services::new(
    ledger.clone(),
    gateway.clone(),
    clock.clone() as Arc<dyn Clock>,
    RelayConfig {
      window:            SubscriptionWindow::days(30).unwrap(),
      bot_username:      Some("parley_test_bot".into()),
      admin_platform_id: ADMIN,
    },
  );
  Fixture { services, ledger, gateway, clock }
}

impl Fixture {
  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  /// A provider straight in the ledger, without notifying the admin.
  pub async fn pending_provider(&self, platform_id: PlatformId) -> Provider {
    self
      .ledger
      .add_provider(NewProvider {
        platform_id,
        display_name: format!("Provider {platform_id}"),
      })
      .await
      .unwrap()
      .unwrap()
  }

  pub async fn approved_provider(&self, platform_id: PlatformId) -> Provider {
    let p = self.pending_provider(platform_id).await;
    self
      .ledger
      .set_provider_status(p.provider_id, ApprovalStatus::Approved, Some("GP".into()))
      .await
      .unwrap()
      .unwrap()
  }

  pub async fn client(&self, platform_id: PlatformId) -> Client {
    self
      .services
      .registrar
      .register_client(NewClient {
        platform_id,
        display_name: format!("Client {platform_id}"),
      })
      .await
      .unwrap()
  }

  /// An approved provider and a client bound to it from now.
  pub async fn attached_pair(&self) -> (Client, Provider) {
    let provider = self.approved_provider(10).await;
    let client = self.client(20).await;
    self
      .services
      .attachments
      .bind(client.client_id, provider.provider_id, self.now())
      .await
      .unwrap();
    (client, provider)
  }
}
