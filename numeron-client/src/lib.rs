//! # numeron-client: HTTP Game Server client
//!
//! Implements the core's [`GameServer`](numeron_core::ports::GameServer)
//! port over HTTP, plus the read-only queries the play screen needs after
//! an item changes game state:
//!
//! - `POST /use-item`: activate an item
//! - `GET /state`: authoritative snapshot (turn, history, remaining items)
//! - `GET /check-double-call`: whether a DOUBLE follow-up call is pending
//!
//! The server keeps the game in a cookie session, so one [`GameClient`]
//! must be reused for the whole page lifetime.

pub mod client;
pub mod error;

pub use client::GameClient;
pub use error::ClientError;
