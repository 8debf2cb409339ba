//! End-to-end scenarios across the relay services.

use chrono::TimeDelta;
use parley_core::{
  action::Action,
  dialogue::DialogueState,
  party::{ApprovalStatus, NewClient, NewProvider},
};

use crate::{
  ActionOutcome, Error,
  testing::{ADMIN, fixture},
};

#[tokio::test]
async fn invite_relay_close_reopen() {
  let fx = fixture().await;
  let provider = fx.approved_provider(10).await;
  let client = fx.client(20).await;
  let s = &fx.services;

  let inv = s.invitations.issue(provider.provider_id).await.unwrap();
  let bound = s.invitations.redeem_payload(&inv.payload).await.unwrap();
  assert_eq!(bound, provider.provider_id);

  s.attachments
    .bind(client.client_id, provider.provider_id, fx.now())
    .await
    .unwrap();
  let first = s.dialogues.open(client.client_id, provider.provider_id).await.unwrap();
  assert!(first.created);
  let d1 = first.dialogue.dialogue_id;

  let receipt = s.dialogues.relay(d1, client.client_id, "hello".into()).await.unwrap();
  assert!(receipt.delivered);
  s.dialogues.relay(d1, provider.provider_id, "hi there".into()).await.unwrap();

  let closed = s.dialogues.close(d1, client.client_id).await.unwrap();
  assert_eq!(closed.state, DialogueState::Completed);

  let second = s.dialogues.open(client.client_id, provider.provider_id).await.unwrap();
  assert!(second.created);
  assert_ne!(second.dialogue.dialogue_id, d1);

  // The old history stays with the old dialogue.
  assert_eq!(s.dialogues.history(d1, client.client_id).await.unwrap().len(), 2);
  assert!(
    s.dialogues
      .history(second.dialogue.dialogue_id, client.client_id)
      .await
      .unwrap()
      .is_empty()
  );
}

#[tokio::test]
async fn concurrent_double_redeem() {
  let fx = fixture().await;
  let provider = fx.approved_provider(10).await;
  let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();

  let invitations = &fx.services.invitations;
  let (a, b) = tokio::join!(
    invitations.redeem(&inv.token.code),
    invitations.redeem(&inv.token.code),
  );
  let wins = [&a, &b].iter().filter(|r| r.is_ok()).count();
  assert_eq!(wins, 1);
  assert!(
    matches!(a, Err(Error::TokenAlreadyUsed)) || matches!(b, Err(Error::TokenAlreadyUsed))
  );
}

#[tokio::test]
async fn concurrent_opens_from_both_sides() {
  let fx = fixture().await;
  let (client, provider) = fx.attached_pair().await;
  let engine = &fx.services.dialogues;

  let (a, b) = tokio::join!(
    engine.open(client.client_id, provider.provider_id),
    engine.open(client.client_id, provider.provider_id),
  );
  let (a, b) = (a.unwrap(), b.unwrap());
  assert_eq!(a.dialogue.dialogue_id, b.dialogue.dialogue_id);
  assert_eq!(engine.active_for_client(client.client_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expiry_ends_the_conversation() {
  let fx = fixture().await;
  let (client, provider) = fx.attached_pair().await;
  let s = &fx.services;
  let d = s.dialogues.open(client.client_id, provider.provider_id).await.unwrap().dialogue;
  s.dialogues.relay(d.dialogue_id, client.client_id, "day one".into()).await.unwrap();
  let delivered_before = fx.gateway.sent().len();

  fx.clock.advance(s.attachments.window().duration() + TimeDelta::hours(1));
  assert!(matches!(
    s.dialogues.relay(d.dialogue_id, provider.provider_id, "late".into()).await,
    Err(Error::SubscriptionExpired)
  ));
  assert_eq!(fx.gateway.sent().len(), delivered_before);

  // A fresh invitation renews the relation and allows a new dialogue.
  let inv = s.invitations.issue(provider.provider_id).await.unwrap();
  s.invitations.redeem(&inv.token.code).await.unwrap();
  s.attachments.bind(client.client_id, provider.provider_id, fx.now()).await.unwrap();
  let reopened = s.dialogues.open(client.client_id, provider.provider_id).await.unwrap();
  assert!(reopened.created);
}

#[tokio::test]
async fn dispatch_derives_the_actor_from_identity() {
  let fx = fixture().await;
  let (client, provider) = fx.attached_pair().await;
  let s = &fx.services;
  let d = s.dialogues.open(client.client_id, provider.provider_id).await.unwrap().dialogue;
  let reply = Action::Reply { dialogue_id: d.dialogue_id };

  assert!(matches!(
    s.dispatch(provider.platform_id, reply, None).await.unwrap(),
    ActionOutcome::AwaitingReply { .. }
  ));
  match s.dispatch(provider.platform_id, reply, Some("take rest".into())).await.unwrap() {
    ActionOutcome::Relayed { receipt } => {
      assert_eq!(receipt.message.sender_id, provider.provider_id);
    }
    other => panic!("expected Relayed, got {other:?}"),
  }

  let close = Action::Close { dialogue_id: d.dialogue_id };
  assert!(matches!(
    s.dispatch(12345, close, None).await,
    Err(Error::PermissionDenied(_))
  ));
  assert!(matches!(
    s.dispatch(client.platform_id, close, None).await.unwrap(),
    ActionOutcome::Closed { .. }
  ));
  assert!(matches!(
    s.dispatch(client.platform_id, reply, None).await,
    Err(Error::DialogueClosed)
  ));
}

#[tokio::test]
async fn dispatch_approval_is_admin_only() {
  let fx = fixture().await;
  let s = &fx.services;
  let provider = s
    .registrar
    .register_provider(NewProvider { platform_id: 10, display_name: "Dr. X".into() })
    .await
    .unwrap();

  let approve = Action::Approve { provider_id: provider.provider_id };
  assert!(matches!(
    s.dispatch(10, approve, Some("Dermatology".into())).await,
    Err(Error::PermissionDenied(_))
  ));
  match s.dispatch(ADMIN, approve, Some("Dermatology".into())).await.unwrap() {
    ActionOutcome::Approved { provider } => {
      assert_eq!(provider.specialty.as_deref(), Some("Dermatology"));
    }
    other => panic!("expected Approved, got {other:?}"),
  }
  assert_eq!(
    s.providers(Some(ApprovalStatus::Approved)).await.unwrap().len(),
    1
  );
}

#[tokio::test]
async fn stats_reflect_the_ledger() {
  let fx = fixture().await;
  let (client, provider) = fx.attached_pair().await;
  fx.pending_provider(11).await;
  fx.services
    .registrar
    .register_client(NewClient { platform_id: 20, display_name: "dup".into() })
    .await
    .unwrap();
  fx.services.dialogues.open(client.client_id, provider.provider_id).await.unwrap();

  let stats = fx.services.stats().await.unwrap();
  assert_eq!(stats.providers_approved, 1);
  assert_eq!(stats.providers_pending, 1);
  assert_eq!(stats.clients, 1);
  assert_eq!(stats.active_dialogues, 1);
}
