//! Relay services for Parley.
//!
//! Each service is a thin, stateless layer over a [`Ledger`] and, where it
//! talks to people, a [`NotificationGateway`]. [`Services`] builds them all
//! once from shared handles so the front-end can hold a single value.
//!
//! ```rust,ignore
//! let services = Services::new(ledger, gateway, Arc::new(SystemClock), config);
//! let invitation = services.invitations.issue(provider_id).await?;
//! ```

pub mod attachment;
pub mod dialogue;
pub mod error;
pub mod invitation;
pub mod registration;
pub mod sweeper;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use parley_core::{
  Ledger, NotificationGateway, PlatformId,
  action::Action,
  attachment::SubscriptionWindow,
  clock::Clock,
  dialogue::Dialogue,
  ledger::LedgerStats,
  party::{ApprovalStatus, Client, Provider},
};
use serde::Serialize;
use uuid::Uuid;

pub use error::{Entity, Error, Result};

use crate::{
  attachment::AttachmentTracker,
  dialogue::{DialogueEngine, RelayReceipt},
  invitation::InvitationManager,
  registration::Registrar,
  sweeper::ExpirySweeper,
};

/// Settings the services need beyond their handles.
#[derive(Debug, Clone)]
pub struct RelayConfig {
  pub window:            SubscriptionWindow,
  pub bot_username:      Option<String>,
  /// The only identity allowed to approve or reject providers.
  pub admin_platform_id: PlatformId,
}

/// Result of [`Services::dispatch`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
  /// A reply without text: the front-end should collect the message.
  AwaitingReply { dialogue: Dialogue },
  Relayed { receipt: RelayReceipt },
  Closed { dialogue: Dialogue },
  Approved { provider: Provider },
  Rejected { provider: Provider },
}

pub struct Services<L, G> {
  pub invitations: InvitationManager<L>,
  pub attachments: AttachmentTracker<L>,
  pub dialogues:   DialogueEngine<L, G>,
  pub registrar:   Registrar<L, G>,
  ledger:          Arc<L>,
  clock:           Arc<dyn Clock>,
}

impl<L, G> Services<L, G>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  pub fn new(
    ledger: Arc<L>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    config: RelayConfig,
  ) -> Self {
    let invitations =
      InvitationManager::new(ledger.clone(), clock.clone(), config.bot_username);
    let attachments = AttachmentTracker::new(ledger.clone(), config.window);
    let dialogues =
      DialogueEngine::new(ledger.clone(), gateway.clone(), clock.clone());
    let registrar = Registrar::new(
      ledger.clone(),
      gateway,
      clock.clone(),
      invitations.clone(),
      attachments.clone(),
      dialogues.clone(),
      config.admin_platform_id,
    );
    Self { invitations, attachments, dialogues, registrar, ledger, clock }
  }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  /// A sweeper over this bundle's attachments, ready to spawn.
  pub fn sweeper(&self, interval: Duration) -> ExpirySweeper<L> {
    ExpirySweeper::new(self.attachments.clone(), self.clock.clone(), interval)
  }

  // ─── Lookups ──────────────────────────────────────────────────────────────

  pub async fn provider(&self, provider_id: Uuid) -> Result<Provider> {
    self
      .ledger
      .get_provider(provider_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Provider, provider_id))
  }

  pub async fn providers(
    &self,
    status: Option<ApprovalStatus>,
  ) -> Result<Vec<Provider>> {
    self.ledger.list_providers(status).await.map_err(Error::store)
  }

  pub async fn client(&self, client_id: Uuid) -> Result<Client> {
    self
      .ledger
      .get_client(client_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Client, client_id))
  }

  pub async fn stats(&self) -> Result<LedgerStats> {
    self.ledger.stats().await.map_err(Error::store)
  }

  // ─── Actions ──────────────────────────────────────────────────────────────

  /// Perform an affordance action pressed by `actor`. The actor's role is
  /// derived from who they are, never from the action. `text` is the message
  /// body for `Reply` and the specialty for `Approve`.
  pub async fn dispatch(
    &self,
    actor: PlatformId,
    action: Action,
    text: Option<String>,
  ) -> Result<ActionOutcome> {
    match action {
      Action::Reply { dialogue_id } => {
        let dialogue = self.dialogues.get(dialogue_id).await?;
        let sender_id = self.dialogues.resolve_participant(&dialogue, actor).await?;
        match text {
          Some(text) => {
            let receipt = self.dialogues.relay(dialogue_id, sender_id, text).await?;
            Ok(ActionOutcome::Relayed { receipt })
          }
          None if dialogue.is_active() => Ok(ActionOutcome::AwaitingReply { dialogue }),
          None => Err(Error::DialogueClosed),
        }
      }
      Action::Close { dialogue_id } => {
        let dialogue = self.dialogues.get(dialogue_id).await?;
        let initiator = self.dialogues.resolve_participant(&dialogue, actor).await?;
        let dialogue = self.dialogues.close(dialogue_id, initiator).await?;
        Ok(ActionOutcome::Closed { dialogue })
      }
      Action::Approve { provider_id } => {
        let provider = self.registrar.approve(actor, provider_id, text).await?;
        Ok(ActionOutcome::Approved { provider })
      }
      Action::Reject { provider_id } => {
        let provider = self.registrar.reject(actor, provider_id).await?;
        Ok(ActionOutcome::Rejected { provider })
      }
    }
  }
}

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;
