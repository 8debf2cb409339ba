//! Core types and trait definitions for Parley.
//!
//! This crate is deliberately free of HTTP, database and chat-transport
//! dependencies. It defines the records the ledger persists, the [`Ledger`]
//! and [`NotificationGateway`] seams, and the pure codecs and state machines
//! the relay services drive.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod action;
pub mod attachment;
pub mod clock;
pub mod deeplink;
pub mod dialogue;
pub mod error;
pub mod gateway;
pub mod invitation;
pub mod ledger;
pub mod party;
pub mod registration;

pub use error::{Error, Result};
pub use gateway::{Affordance, NotificationGateway};
pub use ledger::Ledger;

/// A chat-transport identity (a Telegram chat id).
///
/// Only ever used as a lookup key into providers and clients; relations
/// always reference internal UUIDs.
pub type PlatformId = i64;
