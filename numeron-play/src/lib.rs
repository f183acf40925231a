//! # numeron-play: Play-Screen Integration
//!
//! Glue between the page and the transport-agnostic `numeron-core`.
//!
//! ```text
//! ┌───────────────────────────────────────────┐
//! │                 Page (UI)                  │
//! │   raw attributes / text  ──▶  UiEvent      │
//! │  ┌─────────────────────────────────────┐   │
//! │  │            PlayScreen               │   │
//! │  │  ┌──────────────┐ ┌──────────────┐  │   │
//! │  │  │ItemActivation│ │  MemoStore   │  │   │
//! │  │  │  Controller  │ │              │  │   │
//! │  │  └──────┬───────┘ └──────┬───────┘  │   │
//! │  │         ▼                ▼          │   │
//! │  │  numeron-client   KeyValueStore     │   │
//! │  │  (Game Server)    + AddressBar      │   │
//! │  └─────────────────────────────────────┘   │
//! └───────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `events`: raw UI events and their validation into typed ids
//! - `reconcile`: snapshot-based reconciliation after an item is used
//! - `screen`: the `PlayScreen` that owns both core components
//! - `telemetry`: `tracing` subscriber setup

pub mod events;
pub mod reconcile;
pub mod screen;
pub mod telemetry;

pub use events::{PlayAction, UiEvent};
pub use screen::{PageHooks, PlayScreen, ScreenUpdate};
