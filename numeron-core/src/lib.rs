//! # Numeron Play-Screen Core
//!
//! Transport-agnostic client logic for the Numeron play screen.
//!
//! Two components share one page lifetime:
//!
//! - **[`ItemActivationController`]**: the one-shot "use an item" cycle. It selects
//!   an item, optionally picks a target digit, submits it to the Game
//!   Server and reflects rejection, transport failure or success on the
//!   item's control.
//! - **[`MemoStore`]**: per-digit annotations (0–9) persisted to durable
//!   client storage and discarded when the page address carries the reset
//!   marker.
//!
//! Everything outside these two (rendering, rules, the server's item
//! effects) is reached through the traits in [`ports`].
//!
//! ```text
//!   UI events ──▶ ItemActivationController ──▶ GameServer (request/response)
//!                        │                         │
//!                        ▼                         ▼
//!             Notifier / Presenter / ItemView   Reconciler (refetch)
//!
//!   page load ──▶ MemoStore::initialize ──▶ AddressBar (reset marker)
//!   memo click ─▶ MemoStore::toggle ─────▶ KeyValueStore + MemoIndicator
//! ```

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod address;
pub mod config;
pub mod error;
pub mod item;
pub mod memo;
pub mod ports;
pub mod protocol;
pub mod storage;
pub mod types;

pub use config::PlayConfig;
pub use error::{NumeronError, TransportError};
pub use item::ItemActivationController;
pub use memo::{MemoMap, MemoStore};
pub use types::*;
