//! Dialogue Engine: the per-pair `ABSENT → ACTIVE → COMPLETED` state machine
//! and the message relay between its two participants.
//!
//! The engine keeps no state of its own. Transitions that race with the
//! other participant (open, relay, close) are settled by the ledger's
//! conditional writes, not by the engine's earlier reads. Notifications go out after the ledger write and
//! never undo it.

use std::sync::Arc;

use parley_core::{
  Affordance, Ledger, NotificationGateway, PlatformId,
  action::Action,
  clock::Clock,
  dialogue::{Append, Completion, Dialogue, Message, NewMessage, OpenedDialogue},
  party::{Client, Provider, Role},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Entity, Error, Result};

/// Outcome of a successful [`DialogueEngine::relay`].
#[derive(Debug, Clone, Serialize)]
pub struct RelayReceipt {
  pub message:   Message,
  /// Whether the gateway accepted the notification to the counterpart. The
  /// message is recorded either way.
  pub delivered: bool,
}

pub struct DialogueEngine<L, G> {
  ledger:  Arc<L>,
  gateway: Arc<G>,
  clock:   Arc<dyn Clock>,
}

impl<L, G> Clone for DialogueEngine<L, G> {
  fn clone(&self) -> Self {
    Self {
      ledger:  self.ledger.clone(),
      gateway: self.gateway.clone(),
      clock:   self.clock.clone(),
    }
  }
}

impl<L, G> DialogueEngine<L, G>
where
  L: Ledger,
  G: NotificationGateway,
{
  pub fn new(ledger: Arc<L>, gateway: Arc<G>, clock: Arc<dyn Clock>) -> Self {
    Self { ledger, gateway, clock }
  }

  // ─── Transitions ──────────────────────────────────────────────────────────

  /// Return the pair's active dialogue, creating it if there is none. The
  /// pair must hold an unexpired attachment.
  pub async fn open(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> Result<OpenedDialogue> {
    let now = self.clock.now();
    let attachment = self
      .ledger
      .get_attachment(client_id, provider_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::denied("client is not attached to this provider"))?;
    if !attachment.is_active_at(now) {
      return Err(Error::SubscriptionExpired);
    }

    let opened = self
      .ledger
      .open_dialogue(client_id, provider_id, now)
      .await
      .map_err(Error::store)?;
    if opened.created {
      info!(
        dialogue_id = %opened.dialogue.dialogue_id,
        client_id = %client_id,
        provider_id = %provider_id,
        "dialogue opened"
      );
    }
    Ok(opened)
  }

  /// Record `text` from `sender_id` and forward it to the other participant.
  pub async fn relay(
    &self,
    dialogue_id: Uuid,
    sender_id: Uuid,
    text: String,
  ) -> Result<RelayReceipt> {
    let dialogue = self.get(dialogue_id).await?;
    let sender_role = dialogue
      .role_of(sender_id)
      .ok_or_else(|| Error::denied("sender is not a participant"))?;
    if !dialogue.is_active() {
      return Err(Error::DialogueClosed);
    }

    let now = self.clock.now();
    let message = match self
      .ledger
      .append_message(NewMessage {
        dialogue_id,
        sender_role,
        sender_id,
        text,
        sent_at: now,
      })
      .await
      .map_err(Error::store)?
    {
      Append::Appended(message) => message,
      // Closed by the other participant since the read above.
      Append::Closed => return Err(Error::DialogueClosed),
      Append::Expired => {
        self
          .ledger
          .complete_dialogue(dialogue_id, now)
          .await
          .map_err(Error::store)?;
        info!(dialogue_id = %dialogue_id, "dialogue completed on expired subscription");
        return Err(Error::SubscriptionExpired);
      }
      Append::NotFound => return Err(Error::NotFound(Entity::Dialogue, dialogue_id)),
    };

    let (client, provider) = self.parties(&dialogue).await?;
    let sender_name = match sender_role {
      Role::Client => client.display_name.clone(),
      Role::Provider => provider.display_name.clone(),
    };
    let destination = platform_id_of(sender_role.counterpart(), &client, &provider);
    let delivered = self
      .notify(
        destination,
        format!("New message from {sender_name}:\n{}", message.text),
        vec![
          Affordance::new("Reply", Action::Reply { dialogue_id }),
          Affordance::new("Close dialogue", Action::Close { dialogue_id }),
        ],
      )
      .await;

    Ok(RelayReceipt { message, delivered })
  }

  /// End the dialogue on behalf of either participant and tell the other.
  pub async fn close(
    &self,
    dialogue_id: Uuid,
    initiator_id: Uuid,
  ) -> Result<Dialogue> {
    let dialogue = self.get(dialogue_id).await?;
    let initiator_role = dialogue
      .role_of(initiator_id)
      .ok_or_else(|| Error::denied("initiator is not a participant"))?;
    if !dialogue.is_active() {
      return Err(Error::DialogueClosed);
    }

    let closed = match self
      .ledger
      .complete_dialogue(dialogue_id, self.clock.now())
      .await
      .map_err(Error::store)?
    {
      Completion::Completed(d) => d,
      // Lost a race with the other participant or with an expiry.
      Completion::AlreadyCompleted(_) => return Err(Error::DialogueClosed),
      Completion::NotFound => {
        return Err(Error::NotFound(Entity::Dialogue, dialogue_id));
      }
    };
    info!(dialogue_id = %dialogue_id, by = ?initiator_role, "dialogue closed");

    let (client, provider) = self.parties(&closed).await?;
    let destination = platform_id_of(initiator_role.counterpart(), &client, &provider);
    self
      .notify(destination, "The other party has closed the dialogue.".into(), vec![])
      .await;

    Ok(closed)
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  pub async fn get(&self, dialogue_id: Uuid) -> Result<Dialogue> {
    self
      .ledger
      .get_dialogue(dialogue_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Dialogue, dialogue_id))
  }

  /// Messages in insertion order. Only participants may read them.
  pub async fn history(
    &self,
    dialogue_id: Uuid,
    reader_id: Uuid,
  ) -> Result<Vec<Message>> {
    let dialogue = self.get(dialogue_id).await?;
    if dialogue.role_of(reader_id).is_none() {
      return Err(Error::denied("reader is not a participant"));
    }
    self.ledger.messages(dialogue_id).await.map_err(Error::store)
  }

  pub async fn active_for_client(&self, client_id: Uuid) -> Result<Vec<Dialogue>> {
    self
      .ledger
      .active_dialogues_for_client(client_id)
      .await
      .map_err(Error::store)
  }

  pub async fn active_for_provider(
    &self,
    provider_id: Uuid,
  ) -> Result<Vec<Dialogue>> {
    self
      .ledger
      .active_dialogues_for_provider(provider_id)
      .await
      .map_err(Error::store)
  }

  /// Map a platform identity to its participant id in `dialogue`.
  pub async fn resolve_participant(
    &self,
    dialogue: &Dialogue,
    platform_id: PlatformId,
  ) -> Result<Uuid> {
    let (client, provider) = self.parties(dialogue).await?;
    [Role::Client, Role::Provider]
      .into_iter()
      .find(|&role| platform_id_of(role, &client, &provider) == platform_id)
      .map(|role| dialogue.participant(role))
      .ok_or_else(|| Error::denied("not a participant of this dialogue"))
  }

  // ─── Helpers ──────────────────────────────────────────────────────────────

  async fn parties(&self, dialogue: &Dialogue) -> Result<(Client, Provider)> {
    let client = self
      .ledger
      .get_client(dialogue.client_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Client, dialogue.client_id))?;
    let provider = self
      .ledger
      .get_provider(dialogue.provider_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Provider, dialogue.provider_id))?;
    Ok((client, provider))
  }

  async fn notify(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> bool {
    match self.gateway.deliver(destination, text, affordances).await {
      Ok(()) => true,
      Err(e) => {
        warn!(destination, error = %e, "notification not delivered");
        false
      }
    }
  }
}

fn platform_id_of(role: Role, client: &Client, provider: &Provider) -> PlatformId {
  match role {
    Role::Client => client.platform_id,
    Role::Provider => provider.platform_id,
  }
}
