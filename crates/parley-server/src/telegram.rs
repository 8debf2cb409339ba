//! [`NotificationGateway`] over the Telegram Bot API.
//!
//! Each affordance becomes an inline keyboard button whose `callback_data` is
//! the affordance's action id.

use std::time::Duration;

use parley_core::{Affordance, NotificationGateway, PlatformId};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::Error;

const API_BASE: &str = "https://api.telegram.org";

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TelegramGateway {
  client: Client,
  token:  String,
}

#[derive(Debug, Deserialize)]
struct ApiReply {
  ok:          bool,
  description: Option<String>,
}

impl TelegramGateway {
  pub fn new(token: impl Into<String>) -> Result<Self, Error> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(Error::Transport)?;
    Ok(Self { client, token: token.into() })
  }

  fn url(&self, method: &str) -> String {
    format!("{API_BASE}/bot{}/{method}", self.token)
  }
}

/// The `sendMessage` request body.
pub fn send_message_body(
  chat_id: PlatformId,
  text: &str,
  affordances: &[Affordance],
) -> Value {
  let mut body = json!({ "chat_id": chat_id, "text": text });
  if !affordances.is_empty() {
    let row: Vec<Value> = affordances
      .iter()
      .map(|a| json!({ "text": a.label, "callback_data": a.action_id }))
      .collect();
    body["reply_markup"] = json!({ "inline_keyboard": [row] });
  }
  body
}

impl NotificationGateway for TelegramGateway {
  type Error = Error;

  async fn deliver(
    &self,
    destination: PlatformId,
    text: String,
    affordances: Vec<Affordance>,
  ) -> Result<(), Error> {
    let body = send_message_body(destination, &text, &affordances);
    let reply: ApiReply = self
      .client
      .post(self.url("sendMessage"))
      .json(&body)
      .send()
      .await
      .map_err(|e| Error::Transport(e.without_url()))?
      .json()
      .await
      .map_err(|e| Error::Transport(e.without_url()))?;

    if !reply.ok {
      return Err(Error::Telegram(
        reply.description.unwrap_or_else(|| "no description".to_string()),
      ));
    }
    debug!(destination, "telegram message sent");
    Ok(())
  }
}
