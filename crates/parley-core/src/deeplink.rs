//! The `invite_<code>` start-parameter payload.
//!
//! Telegram limits start parameters to 64 characters from `[A-Za-z0-9_-]`,
//! which bounds what a code may look like.

use crate::{Error, Result};

pub const INVITE_PREFIX: &str = "invite_";

const MAX_PAYLOAD_LEN: usize = 64;

/// Wrap an invitation code into a start-parameter payload.
pub fn encode(code: &str) -> String { format!("{INVITE_PREFIX}{code}") }

/// Extract the invitation code from a start-parameter payload.
pub fn decode(payload: &str) -> Result<&str> {
  let malformed = || Error::MalformedDeepLink(payload.to_owned());
  if payload.len() > MAX_PAYLOAD_LEN {
    return Err(malformed());
  }
  let code = payload.strip_prefix(INVITE_PREFIX).ok_or_else(malformed)?;
  let valid = !code.is_empty()
    && code
      .bytes()
      .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
  if valid { Ok(code) } else { Err(malformed()) }
}

/// Full `t.me` link that opens the bot with the given payload.
pub fn link(bot_username: &str, code: &str) -> String {
  format!("https://t.me/{bot_username}?start={}", encode(code))
}
