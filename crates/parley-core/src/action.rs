//! Typed action ids carried by gateway affordances.
//!
//! Every action names exactly one entity by UUID, encoded as `<verb>:<uuid>`.
//! Who pressed the button is taken from the inbound event, never from the
//! payload, so there is nothing positional to get wrong.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
  /// Start composing a reply in a dialogue.
  Reply { dialogue_id: Uuid },
  /// End a dialogue.
  Close { dialogue_id: Uuid },
  /// Admin approves a pending provider.
  Approve { provider_id: Uuid },
  /// Admin rejects a pending provider.
  Reject { provider_id: Uuid },
}

impl Action {
  fn verb(&self) -> &'static str {
    match self {
      Self::Reply { .. } => "reply",
      Self::Close { .. } => "close",
      Self::Approve { .. } => "approve",
      Self::Reject { .. } => "reject",
    }
  }

  fn target(&self) -> Uuid {
    match *self {
      Self::Reply { dialogue_id } | Self::Close { dialogue_id } => dialogue_id,
      Self::Approve { provider_id } | Self::Reject { provider_id } => {
        provider_id
      }
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.verb(), self.target().hyphenated())
  }
}

impl FromStr for Action {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let malformed = || Error::MalformedAction(s.to_owned());
    let (verb, id) = s.split_once(':').ok_or_else(malformed)?;
    let id = Uuid::parse_str(id).map_err(|_| malformed())?;
    match verb {
      "reply" => Ok(Self::Reply { dialogue_id: id }),
      "close" => Ok(Self::Close { dialogue_id: id }),
      "approve" => Ok(Self::Approve { provider_id: id }),
      "reject" => Ok(Self::Reject { provider_id: id }),
      _ => Err(malformed()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn close_action_encodes_verb_and_id() {
    let id = Uuid::new_v4();
    let action = Action::Close { dialogue_id: id };
    assert_eq!(action.to_string(), format!("close:{id}"));
    assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
  }

  #[test]
  fn encoded_actions_fit_in_callback_data() {
    // Telegram caps callback data at 64 bytes.
    let action = Action::Approve { provider_id: Uuid::new_v4() };
    assert!(action.to_string().len() <= 64);
  }

  #[test]
  fn rejects_unknown_verbs_and_bad_ids() {
    let id = Uuid::new_v4();
    assert!(format!("open_chat:{id}").parse::<Action>().is_err());
    assert!("close:42".parse::<Action>().is_err());
    assert!("close".parse::<Action>().is_err());
    // The old `doctor_end_dialogue_<id>` underscore form is not accepted.
    assert!(format!("close_{id}").parse::<Action>().is_err());
  }
}
