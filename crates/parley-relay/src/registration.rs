//! Registrar: drives the registration state machine and the provider approval
//! workflow.
//!
//! The state machine itself lives in [`parley_core::registration`]; this
//! module persists its state per platform identity and performs the side
//! effects of a submitted flow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_core::{
  Affordance, Ledger, NotificationGateway, PlatformId,
  action::Action,
  clock::Clock,
  dialogue::Dialogue,
  party::{ApprovalStatus, Client, NewClient, NewProvider, Provider},
  registration::{self, Enrolment, Prompt, RegistrationInput, Transition},
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Entity, Error, Result, attachment::AttachmentTracker, dialogue::DialogueEngine,
  invitation::InvitationManager,
};

/// What happened after one registration input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
  /// The flow continues; show `prompt`.
  Prompt { prompt: Prompt },
  Cancelled,
  /// A provider application was filed and awaits the admin.
  ProviderPending { provider: Provider },
  /// An invited client was registered and their first dialogue opened.
  ClientRegistered { client: Client, dialogue: Dialogue },
}

/// What happened after a start payload was accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Acceptance {
  /// A known client was attached and their dialogue is ready.
  Attached {
    client:     Client,
    dialogue:   Dialogue,
    expires_at: DateTime<Utc>,
  },
  /// An unknown identity must register first.
  Registering { prompt: Prompt },
}

pub struct Registrar<L, G> {
  ledger:      Arc<L>,
  gateway:     Arc<G>,
  clock:       Arc<dyn Clock>,
  invitations: InvitationManager<L>,
  attachments: AttachmentTracker<L>,
  dialogues:   DialogueEngine<L, G>,
  admin:       PlatformId,
}

impl<L, G> Registrar<L, G>
where
  L: Ledger,
  G: NotificationGateway,
{
  pub fn new(
    ledger: Arc<L>,
    gateway: Arc<G>,
    clock: Arc<dyn Clock>,
    invitations: InvitationManager<L>,
    attachments: AttachmentTracker<L>,
    dialogues: DialogueEngine<L, G>,
    admin: PlatformId,
  ) -> Self {
    Self { ledger, gateway, clock, invitations, attachments, dialogues, admin }
  }

  // ─── Flows ────────────────────────────────────────────────────────────────

  /// Start a provider application for `platform_id`. Any flow already in
  /// progress for that identity is replaced.
  pub async fn begin_provider(&self, platform_id: PlatformId) -> Result<Prompt> {
    if self
      .ledger
      .find_provider(platform_id)
      .await
      .map_err(Error::store)?
      .is_some()
    {
      return Err(Error::AlreadyRegistered);
    }
    let (state, prompt) = registration::begin(Enrolment::Provider);
    self
      .ledger
      .put_registration(platform_id, state, self.clock.now())
      .await
      .map_err(Error::store)?;
    Ok(prompt)
  }

  /// Feed one input into the flow in progress for `platform_id`.
  pub async fn handle(
    &self,
    platform_id: PlatformId,
    input: RegistrationInput,
  ) -> Result<RegistrationOutcome> {
    let state = self
      .ledger
      .get_registration(platform_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NoRegistration)?;

    match registration::step(state, input) {
      Transition::Continue { state, prompt } => {
        self
          .ledger
          .put_registration(platform_id, state, self.clock.now())
          .await
          .map_err(Error::store)?;
        Ok(RegistrationOutcome::Prompt { prompt })
      }
      Transition::Cancelled => {
        self.clear(platform_id).await?;
        Ok(RegistrationOutcome::Cancelled)
      }
      Transition::Submit { enrolment: Enrolment::Provider, name } => {
        self.clear(platform_id).await?;
        let provider = self
          .register_provider(NewProvider { platform_id, display_name: name })
          .await?;
        Ok(RegistrationOutcome::ProviderPending { provider })
      }
      Transition::Submit { enrolment: Enrolment::Client { provider_id }, name } => {
        let client = self
          .register_client(NewClient { platform_id, display_name: name })
          .await?;
        let dialogue = self.attach_and_open(client.client_id, provider_id).await?.1;
        self.clear(platform_id).await?;
        Ok(RegistrationOutcome::ClientRegistered { client, dialogue })
      }
    }
  }

  /// Redeem a start payload for `platform_id`. A known client is attached and
  /// gets their dialogue; anyone else is asked to register.
  pub async fn accept_invitation(
    &self,
    platform_id: PlatformId,
    payload: &str,
  ) -> Result<Acceptance> {
    let provider_id = self.invitations.redeem_payload(payload).await?;

    let known = self
      .ledger
      .find_client(platform_id)
      .await
      .map_err(Error::store)?;
    match known {
      Some(client) => {
        let (expires_at, dialogue) =
          self.attach_and_open(client.client_id, provider_id).await?;
        Ok(Acceptance::Attached { client, dialogue, expires_at })
      }
      None => {
        let (state, prompt) = registration::begin(Enrolment::Client { provider_id });
        self
          .ledger
          .put_registration(platform_id, state, self.clock.now())
          .await
          .map_err(Error::store)?;
        Ok(Acceptance::Registering { prompt })
      }
    }
  }

  // ─── Direct registration ─────────────────────────────────────────────────

  /// File a pending provider and ask the admin to decide on it.
  pub async fn register_provider(&self, input: NewProvider) -> Result<Provider> {
    let provider = self
      .ledger
      .add_provider(input)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AlreadyRegistered)?;
    info!(provider_id = %provider.provider_id, "provider application filed");

    let id = provider.provider_id;
    self
      .notify(
        self.admin,
        format!("New provider application: {}", provider.display_name),
        vec![
          Affordance::new("Approve", Action::Approve { provider_id: id }),
          Affordance::new("Reject", Action::Reject { provider_id: id }),
        ],
      )
      .await;
    Ok(provider)
  }

  /// Register a client; an identity that already has a row gets it back.
  pub async fn register_client(&self, input: NewClient) -> Result<Client> {
    self
      .ledger
      .add_client(input, self.clock.now())
      .await
      .map_err(Error::store)
  }

  // ─── Approval ─────────────────────────────────────────────────────────────

  pub async fn approve(
    &self,
    actor: PlatformId,
    provider_id: Uuid,
    specialty: Option<String>,
  ) -> Result<Provider> {
    let provider = self
      .decide(actor, provider_id, ApprovalStatus::Approved, specialty)
      .await?;
    self
      .notify(
        provider.platform_id,
        "Your application has been approved. You can now create invitation links."
          .into(),
        vec![],
      )
      .await;
    Ok(provider)
  }

  pub async fn reject(&self, actor: PlatformId, provider_id: Uuid) -> Result<Provider> {
    let provider = self
      .decide(actor, provider_id, ApprovalStatus::Rejected, None)
      .await?;
    self
      .notify(
        provider.platform_id,
        "Unfortunately, your application has been rejected.".into(),
        vec![],
      )
      .await;
    Ok(provider)
  }

  // ─── Helpers ──────────────────────────────────────────────────────────────

  async fn decide(
    &self,
    actor: PlatformId,
    provider_id: Uuid,
    status: ApprovalStatus,
    specialty: Option<String>,
  ) -> Result<Provider> {
    if actor != self.admin {
      return Err(Error::denied("only the administrator may review providers"));
    }
    let provider = self
      .ledger
      .set_provider_status(provider_id, status, specialty)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Provider, provider_id))?;
    info!(provider_id = %provider_id, ?status, "provider reviewed");
    Ok(provider)
  }

  async fn attach_and_open(
    &self,
    client_id: Uuid,
    provider_id: Uuid,
  ) -> Result<(DateTime<Utc>, Dialogue)> {
    let expires_at = self
      .attachments
      .bind(client_id, provider_id, self.clock.now())
      .await?;
    let opened = self.dialogues.open(client_id, provider_id).await?;
    Ok((expires_at, opened.dialogue))
  }

  async fn clear(&self, platform_id: PlatformId) -> Result<()> {
    self
      .ledger
      .clear_registration(platform_id)
      .await
      .map_err(Error::store)
  }

  async fn notify(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) {
    if let Err(e) = self.gateway.deliver(destination, text, affordances).await {
      warn!(destination, error = %e, "notification not delivered");
    }
  }
}

#[cfg(test)]
mod tests {
  use parley_core::registration::RegistrationState;

  use super::*;
  use crate::testing::{ADMIN, fixture};

  fn text(s: &str) -> RegistrationInput { RegistrationInput::Text(s.into()) }

  #[tokio::test]
  async fn provider_flow_files_a_pending_application() {
    let fx = fixture().await;
    let reg = &fx.services.registrar;

    assert_eq!(reg.begin_provider(10).await.unwrap(), Prompt::AskName);
    assert!(matches!(
      reg.handle(10, text("Dr. Ada Lovelace")).await.unwrap(),
      RegistrationOutcome::Prompt { prompt: Prompt::ConfirmName { .. } }
    ));
    let provider = match reg.handle(10, text("yes")).await.unwrap() {
      RegistrationOutcome::ProviderPending { provider } => provider,
      other => panic!("expected ProviderPending, got {other:?}"),
    };
    assert_eq!(provider.status, ApprovalStatus::Pending);
    assert_eq!(provider.display_name, "Dr. Ada Lovelace");

    // Session is gone once submitted.
    assert!(matches!(reg.handle(10, text("yes")).await, Err(Error::NoRegistration)));

    let sent = fx.gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].destination, ADMIN);
    assert_eq!(
      sent[0].affordances[0].action_id,
      Action::Approve { provider_id: provider.provider_id }.to_string()
    );
  }

  #[tokio::test]
  async fn known_provider_cannot_apply_again() {
    let fx = fixture().await;
    fx.pending_provider(10).await;
    assert!(matches!(
      fx.services.registrar.begin_provider(10).await,
      Err(Error::AlreadyRegistered)
    ));
  }

  #[tokio::test]
  async fn cancel_drops_the_session() {
    let fx = fixture().await;
    let reg = &fx.services.registrar;
    reg.begin_provider(10).await.unwrap();

    assert!(matches!(
      reg.handle(10, RegistrationInput::Cancel).await.unwrap(),
      RegistrationOutcome::Cancelled
    ));
    assert!(fx.ledger.get_registration(10).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn input_without_a_session_is_rejected() {
    let fx = fixture().await;
    assert!(matches!(
      fx.services.registrar.handle(10, text("hello")).await,
      Err(Error::NoRegistration)
    ));
  }

  #[tokio::test]
  async fn only_the_admin_reviews() {
    let fx = fixture().await;
    let provider = fx.pending_provider(10).await;
    let reg = &fx.services.registrar;

    assert!(matches!(
      reg.approve(10, provider.provider_id, Some("ENT".into())).await,
      Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
      reg.approve(ADMIN, Uuid::new_v4(), None).await,
      Err(Error::NotFound(Entity::Provider, _))
    ));

    let approved = reg
      .approve(ADMIN, provider.provider_id, Some("ENT".into()))
      .await
      .unwrap();
    assert!(approved.is_approved());
    assert_eq!(approved.specialty.as_deref(), Some("ENT"));
    assert_eq!(fx.gateway.sent().last().unwrap().destination, 10);

    let rejected = reg.reject(ADMIN, provider.provider_id).await.unwrap();
    assert_eq!(rejected.status, ApprovalStatus::Rejected);
  }

  #[tokio::test]
  async fn unknown_identity_registers_through_an_invitation() {
    let fx = fixture().await;
    let provider = fx.approved_provider(10).await;
    let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();
    let reg = &fx.services.registrar;

    assert!(matches!(
      reg.accept_invitation(20, &inv.payload).await.unwrap(),
      Acceptance::Registering { prompt: Prompt::AskName }
    ));
    assert_eq!(
      fx.ledger.get_registration(20).await.unwrap(),
      Some(RegistrationState::AwaitingName {
        enrolment: Enrolment::Client { provider_id: provider.provider_id },
      })
    );

    reg.handle(20, text("Rose")).await.unwrap();
    let (client, dialogue) = match reg.handle(20, text("да")).await.unwrap() {
      RegistrationOutcome::ClientRegistered { client, dialogue } => (client, dialogue),
      other => panic!("expected ClientRegistered, got {other:?}"),
    };
    assert_eq!(client.display_name, "Rose");
    assert_eq!(dialogue.client_id, client.client_id);
    assert_eq!(dialogue.provider_id, provider.provider_id);
    assert!(fx.ledger.get_registration(20).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn known_client_is_attached_directly() {
    let fx = fixture().await;
    let provider = fx.approved_provider(10).await;
    let client = fx.client(20).await;
    let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();

    match fx.services.registrar.accept_invitation(20, &inv.payload).await.unwrap() {
      Acceptance::Attached { client: c, dialogue, expires_at } => {
        assert_eq!(c.client_id, client.client_id);
        assert!(dialogue.is_active());
        assert_eq!(expires_at, fx.now() + fx.services.attachments.window().duration());
      }
      other => panic!("expected Attached, got {other:?}"),
    }

    assert!(matches!(
      fx.services.registrar.accept_invitation(20, &inv.payload).await,
      Err(Error::TokenAlreadyUsed)
    ));
  }

  #[tokio::test]
  async fn garbage_payload_is_an_unknown_token() {
    let fx = fixture().await;
    assert!(matches!(
      fx.services.registrar.accept_invitation(20, "hello").await,
      Err(Error::TokenNotFound)
    ));
  }
}
