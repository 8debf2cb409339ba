//! The gateway the server hands to the relay services.

use parley_core::{Affordance, NotificationGateway, PlatformId};
use tracing::info;

use crate::{error::Error, telegram::TelegramGateway};

/// Writes notifications to the log instead of sending them. Used when no bot
/// token is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogGateway;

impl NotificationGateway for LogGateway {
  type Error = std::convert::Infallible;

  async fn deliver(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> Result<(), Self::Error> {
    let actions: Vec<&str> = affordances.iter().map(|a| a.action_id.as_str()).collect();
    info!(destination, %text, ?actions, "notification (not sent)");
    Ok(())
  }
}

/// The transport picked at startup.
#[derive(Clone)]
pub enum Gateway {
  Telegram(TelegramGateway),
  Log(LogGateway),
}

impl NotificationGateway for Gateway {
  type Error = Error;

  async fn deliver(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> Result<(), Error> {
    match self {
      Gateway::Telegram(tg) => tg.deliver(destination, text, affordances).await,
      Gateway::Log(log) => log
        .deliver(destination, text, affordances)
        .await
        .map_err(|never| match never {}),
    }
  }
}
