//! Attachment Tracker: the time-bounded relation between a client and a
//! provider.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_core::{
  Ledger,
  attachment::{AttachedClient, AttachedProvider, Attachment, SubscriptionWindow},
};
use tracing::info;
use uuid::Uuid;

use crate::{Entity, Error, Result};

pub struct AttachmentTracker<L> {
  ledger: Arc<L>,
  window: SubscriptionWindow,
}

impl<L> Clone for AttachmentTracker<L> {
  fn clone(&self) -> Self {
    Self { ledger: self.ledger.clone(), window: self.window }
  }
}

impl<L: Ledger> AttachmentTracker<L> {
  pub fn new(ledger: Arc<L>, window: SubscriptionWindow) -> Self {
    Self { ledger, window }
  }

  pub fn window(&self) -> SubscriptionWindow { self.window }

  /// Attach `client_id` to `provider_id` until `now + window`. Binding an
  /// existing pair refreshes its window.
  pub async fn bind(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<DateTime<Utc>> {
    if self.ledger.get_client(client_id).await.map_err(Error::store)?.is_none() {
      return Err(Error::NotFound(Entity::Client, client_id));
    }
    if self
      .ledger
      .get_provider(provider_id)
      .await
      .map_err(Error::store)?
      .is_none()
    {
      return Err(Error::NotFound(Entity::Provider, provider_id));
    }

    let attachment = Attachment::new(client_id, provider_id, now, self.window)
      .map_err(Error::store)?;
    let expires_at = attachment.expires_at;
    self
      .ledger
      .upsert_attachment(attachment)
      .await
      .map_err(Error::store)?;
    info!(
      client_id = %client_id,
      provider_id = %provider_id,
      %expires_at,
      "client attached"
    );
    Ok(expires_at)
  }

  pub async fn active_providers_for(
    &self,
    client_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Vec<AttachedProvider>> {
    self
      .ledger
      .attached_providers(client_id, now)
      .await
      .map_err(Error::store)
  }

  pub async fn active_clients_for(
    &self,
    provider_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<Vec<AttachedClient>> {
    self
      .ledger
      .attached_clients(provider_id, now)
      .await
      .map_err(Error::store)
  }

  /// Remove every attachment with `expires_at <= now`. Dialogues are left
  /// alone; they are completed lazily on their next relay.
  pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64> {
    self
      .ledger
      .delete_expired_attachments(now)
      .await
      .map_err(Error::store)
  }
}
