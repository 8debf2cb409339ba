//! Invitation Manager: issues and redeems single-use invitation tokens.

use std::sync::Arc;

use parley_core::{
  Ledger, clock::Clock, deeplink, invitation::{InvitationToken, Redemption},
};
use rand_core::{OsRng, RngCore};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{Entity, Error, Result};

/// Bytes of OS randomness behind each code.
const CODE_BYTES: usize = 16;

/// A freshly issued invitation, ready to hand to a client.
#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
  pub token:   InvitationToken,
  /// The `invite_<code>` start parameter.
  pub payload: String,
  /// A `t.me` link, when a bot username is configured.
  pub link:    Option<String>,
}

pub struct InvitationManager<L> {
  ledger:       Arc<L>,
  clock:        Arc<dyn Clock>,
  bot_username: Option<String>,
}

impl<L> Clone for InvitationManager<L> {
  fn clone(&self) -> Self {
    Self {
      ledger:       self.ledger.clone(),
      clock:        self.clock.clone(),
      bot_username: self.bot_username.clone(),
    }
  }
}

impl<L: Ledger> InvitationManager<L> {
  pub fn new(
    ledger: Arc<L>,
    clock: Arc<dyn Clock>,
    bot_username: Option<String>,
  ) -> Self {
    Self { ledger, clock, bot_username }
  }

  /// Issue a new token for an approved provider.
  pub async fn issue(&self, provider_id: Uuid) -> Result<Invitation> {
    let provider = self
      .ledger
      .get_provider(provider_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound(Entity::Provider, provider_id))?;
    if !provider.is_approved() {
      return Err(Error::denied("provider is not approved"));
    }

    let token = InvitationToken {
      code: generate_code(),
      provider_id,
      used: false,
      created_at: self.clock.now(),
      used_at: None,
    };
    self
      .ledger
      .insert_token(token.clone())
      .await
      .map_err(Error::store)?;
    info!(provider_id = %provider_id, "invitation issued");

    let payload = deeplink::encode(&token.code);
    let link = self
      .bot_username
      .as_deref()
      .map(|bot| deeplink::link(bot, &token.code));
    Ok(Invitation { token, payload, link })
  }

  /// Consume `code` and return the provider it binds to.
  pub async fn redeem(&self, code: &str) -> Result<Uuid> {
    let outcome = self
      .ledger
      .redeem_token(code.to_owned(), self.clock.now())
      .await
      .map_err(Error::store)?;
    match outcome {
      Redemption::Redeemed { provider_id } => {
        info!(provider_id = %provider_id, "invitation redeemed");
        Ok(provider_id)
      }
      Redemption::Unknown => Err(Error::TokenNotFound),
      Redemption::AlreadyUsed => Err(Error::TokenAlreadyUsed),
    }
  }

  /// Parse an `invite_<code>` payload and redeem it. A payload that does not
  /// parse is treated as an unknown token.
  pub async fn redeem_payload(&self, payload: &str) -> Result<Uuid> {
    let code = deeplink::decode(payload).map_err(|e| {
      debug!(error = %e, "rejecting start payload");
      Error::TokenNotFound
    })?;
    self.redeem(code).await
  }
}

fn generate_code() -> String {
  let mut bytes = [0u8; CODE_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

#[cfg(test)]
mod tests {
  use parley_core::party::ApprovalStatus;

  use super::*;
  use crate::testing::fixture;

  #[test]
  fn codes_are_32_hex_chars_and_distinct() {
    let a = generate_code();
    let b = generate_code();
    assert_eq!(a.len(), 32);
    assert!(a.bytes().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(a, b);
  }

  #[tokio::test]
  async fn issue_returns_payload_and_link() {
    let fx = fixture().await;
    let provider = fx.approved_provider(10).await;

    let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();
    assert_eq!(inv.payload, format!("invite_{}", inv.token.code));
    assert_eq!(
      inv.link.as_deref(),
      Some(format!("https://t.me/parley_test_bot?start=invite_{}", inv.token.code).as_str())
    );
    assert!(!inv.token.used);
  }

  #[tokio::test]
  async fn issue_requires_an_approved_provider() {
    let fx = fixture().await;
    let pending = fx.pending_provider(10).await;
    assert!(matches!(
      fx.services.invitations.issue(pending.provider_id).await,
      Err(Error::PermissionDenied(_))
    ));

    fx.ledger
      .set_provider_status(pending.provider_id, ApprovalStatus::Rejected, None)
      .await
      .unwrap();
    assert!(matches!(
      fx.services.invitations.issue(pending.provider_id).await,
      Err(Error::PermissionDenied(_))
    ));

    assert!(matches!(
      fx.services.invitations.issue(Uuid::new_v4()).await,
      Err(Error::NotFound(Entity::Provider, _))
    ));
  }

  #[tokio::test]
  async fn redeem_succeeds_at_most_once() {
    let fx = fixture().await;
    let provider = fx.approved_provider(10).await;
    let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();

    let invitations = &fx.services.invitations;
    assert_eq!(invitations.redeem(&inv.token.code).await.unwrap(), provider.provider_id);
    assert!(matches!(
      invitations.redeem(&inv.token.code).await,
      Err(Error::TokenAlreadyUsed)
    ));
    assert!(matches!(invitations.redeem("feedface").await, Err(Error::TokenNotFound)));
  }

  #[tokio::test]
  async fn redeem_payload_parses_the_prefix() {
    let fx = fixture().await;
    let provider = fx.approved_provider(10).await;
    let inv = fx.services.invitations.issue(provider.provider_id).await.unwrap();

    let invitations = &fx.services.invitations;
    assert!(matches!(
      invitations.redeem_payload(&inv.token.code).await,
      Err(Error::TokenNotFound)
    ));
    assert_eq!(
      invitations.redeem_payload(&inv.payload).await.unwrap(),
      provider.provider_id
    );
  }
}
