//! Conversational registration as an explicit state machine.
//!
//! One state value per platform identity, persisted by the ledger between
//! inbound messages. [`step`] is the only transition function; the caller
//! renders the returned [`Prompt`] and performs the side effects of a
//! [`Transition::Submit`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;

/// Longest display name accepted, in characters.
pub const MAX_NAME_CHARS: usize = 128;

/// Which record a registration flow will create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Enrolment {
  /// A provider applying for admin approval.
  Provider,
  /// A client who arrived through an invitation from `provider_id`.
  Client { provider_id: Uuid },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum RegistrationState {
  AwaitingName { enrolment: Enrolment },
  AwaitingConfirmation { enrolment: Enrolment, name: String },
}

impl RegistrationState {
  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }
}

/// One inbound event from the registering user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum RegistrationInput {
  Text(String),
  Cancel,
}

/// What the front-end should ask next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "prompt", rename_all = "snake_case")]
pub enum Prompt {
  AskName,
  /// The previous answer was blank or too long.
  NameInvalid,
  ConfirmName { name: String },
  /// The confirmation answer was neither yes nor no.
  ConfirmUnclear { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// Persist `state` and show `prompt`.
  Continue { state: RegistrationState, prompt: Prompt },
  /// The user confirmed; create the record and drop the session.
  Submit { enrolment: Enrolment, name: String },
  /// The flow was abandoned; drop the session.
  Cancelled,
}

/// Entry point of every flow.
pub fn begin(enrolment: Enrolment) -> (RegistrationState, Prompt) {
  (RegistrationState::AwaitingName { enrolment }, Prompt::AskName)
}

/// Advance `state` by one input.
pub fn step(state: RegistrationState, input: RegistrationInput) -> Transition {
  let text = match input {
    RegistrationInput::Cancel => return Transition::Cancelled,
    RegistrationInput::Text(text) => text,
  };

  match state {
    RegistrationState::AwaitingName { enrolment } => match normalise_name(&text)
    {
      Some(name) => Transition::Continue {
        prompt: Prompt::ConfirmName { name: name.clone() },
        state:  RegistrationState::AwaitingConfirmation { enrolment, name },
      },
      None => Transition::Continue {
        state:  RegistrationState::AwaitingName { enrolment },
        prompt: Prompt::NameInvalid,
      },
    },

    RegistrationState::AwaitingConfirmation { enrolment, name } => {
      match parse_answer(&text) {
        Some(true) => Transition::Submit { enrolment, name },
        // A provider declining starts over from the command; a client keeps
        // the redeemed invitation and is asked for the name again.
        Some(false) => match enrolment {
          Enrolment::Provider => Transition::Cancelled,
          Enrolment::Client { .. } => Transition::Continue {
            state:  RegistrationState::AwaitingName { enrolment },
            prompt: Prompt::AskName,
          },
        },
        None => Transition::Continue {
          prompt: Prompt::ConfirmUnclear { name: name.clone() },
          state:  RegistrationState::AwaitingConfirmation { enrolment, name },
        },
      }
    }
  }
}

fn normalise_name(text: &str) -> Option<String> {
  let name = text.split_whitespace().collect::<Vec<_>>().join(" ");
  let len = name.chars().count();
  (len > 0 && len <= MAX_NAME_CHARS).then_some(name)
}

fn parse_answer(text: &str) -> Option<bool> {
  match text.trim().to_lowercase().as_str() {
    "yes" | "y" | "да" | "д" => Some(true),
    "no" | "n" | "нет" | "н" => Some(false),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn text(s: &str) -> RegistrationInput { RegistrationInput::Text(s.into()) }

  fn expect_continue(t: Transition) -> (RegistrationState, Prompt) {
    match t {
      Transition::Continue { state, prompt } => (state, prompt),
      other => panic!("expected Continue, got {other:?}"),
    }
  }

  #[test]
  fn provider_happy_path() {
    let (state, prompt) = begin(Enrolment::Provider);
    assert_eq!(prompt, Prompt::AskName);

    let (state, prompt) = expect_continue(step(state, text("  Ada   Lovelace ")));
    assert_eq!(prompt, Prompt::ConfirmName { name: "Ada Lovelace".into() });

    assert_eq!(step(state, text("Yes")), Transition::Submit {
      enrolment: Enrolment::Provider,
      name:      "Ada Lovelace".into(),
    });
  }

  #[test]
  fn blank_name_reprompts() {
    let (state, _) = begin(Enrolment::Provider);
    let (state, prompt) = expect_continue(step(state, text("   ")));
    assert_eq!(prompt, Prompt::NameInvalid);
    assert!(matches!(state, RegistrationState::AwaitingName { .. }));
  }

  #[test]
  fn overlong_name_reprompts() {
    let (state, _) = begin(Enrolment::Provider);
    let long = "x".repeat(MAX_NAME_CHARS + 1);
    let (_, prompt) = expect_continue(step(state, text(&long)));
    assert_eq!(prompt, Prompt::NameInvalid);
  }

  #[test]
  fn provider_declining_cancels() {
    let (state, _) = begin(Enrolment::Provider);
    let (state, _) = expect_continue(step(state, text("Ada")));
    assert_eq!(step(state, text("no")), Transition::Cancelled);
  }

  #[test]
  fn client_declining_asks_name_again() {
    let enrolment = Enrolment::Client { provider_id: Uuid::new_v4() };
    let (state, _) = begin(enrolment);
    let (state, _) = expect_continue(step(state, text("Bob")));
    let (state, prompt) = expect_continue(step(state, text("нет")));
    assert_eq!(prompt, Prompt::AskName);
    assert_eq!(state, RegistrationState::AwaitingName { enrolment });
  }

  #[test]
  fn unclear_answer_keeps_waiting() {
    let (state, _) = begin(Enrolment::Provider);
    let (state, _) = expect_continue(step(state, text("Ada")));
    let (state, prompt) = expect_continue(step(state, text("maybe")));
    assert_eq!(prompt, Prompt::ConfirmUnclear { name: "Ada".into() });
    assert!(matches!(state, RegistrationState::AwaitingConfirmation { .. }));
  }

  #[test]
  fn cancel_from_any_state() {
    let (state, _) = begin(Enrolment::Provider);
    assert_eq!(step(state.clone(), RegistrationInput::Cancel), Transition::Cancelled);
    let (state, _) = expect_continue(step(state, text("Ada")));
    assert_eq!(step(state, RegistrationInput::Cancel), Transition::Cancelled);
  }

  #[test]
  fn state_survives_json() {
    let state = RegistrationState::AwaitingConfirmation {
      enrolment: Enrolment::Client { provider_id: Uuid::new_v4() },
      name:      "Bob".into(),
    };
    let json = state.to_json().unwrap();
    assert_eq!(RegistrationState::from_json(&json).unwrap(), state);
  }
}
