//! Collaborator traits the core talks through.
//!
//! The core never touches a page, a network socket or a storage engine
//! directly. Integrations implement these traits; tests implement them with
//! recording fakes.

use std::future::Future;
use std::sync::Arc;

use url::Url;

use crate::error::{Result, TransportError};
use crate::protocol::{ItemReply, UseItemRequest};
use crate::types::{AppliedItem, ControlState, Digit, ItemKey};

/// The remote authority that validates and executes item effects.
pub trait GameServer: Send + Sync {
    /// Submit one activation and wait for its reply.
    ///
    /// Rejections are a normal [`ItemReply::Rejected`]; `Err` means the
    /// request itself did not complete.
    fn use_item(
        &self,
        request: &UseItemRequest,
    ) -> impl Future<Output = std::result::Result<ItemReply, TransportError>> + Send;
}

/// Blocking, user-facing notification (an alert box).
pub trait Notifier: Send + Sync {
    /// Show `message` to the player.
    fn alert(&self, message: &str);
}

/// Optional display for item effect descriptions.
pub trait Presenter: Send + Sync {
    /// Show the outcome of a successful item.
    fn show_effect(&self, message: &str);
}

/// Rendering of item controls and the target-digit picker.
pub trait ItemView: Send + Sync {
    /// Re-render one item control.
    fn render_control(&self, key: &ItemKey, state: ControlState, selected: bool);

    /// Show or hide the digit picker for `item`.
    fn set_picker(&self, item: Option<&ItemKey>);
}

/// Post-success reconciliation hook.
///
/// Called once per applied item. Implementations refetch whatever
/// authoritative state (history, remaining items) the item may have changed.
pub trait Reconciler: Send + Sync {
    /// React to a consumed item.
    fn reconcile(&self, applied: &AppliedItem);
}

/// Durable client-side key/value storage.
pub trait KeyValueStore {
    /// Read the value under `key`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` entirely. Returns `true` if something was removed.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<bool>;
}

/// Per-digit memo indicator on the page.
pub trait MemoIndicator {
    /// Render `digit` as annotated or not.
    fn render(&mut self, digit: Digit, annotated: bool);
}

/// The page's visible address.
pub trait AddressBar {
    /// Current address.
    fn location(&self) -> Url;

    /// Replace the visible address without navigating or adding history.
    fn replace_state(&mut self, url: Url);
}

/// [`ItemView`] that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoView;

impl ItemView for NoView {
    fn render_control(&self, _key: &ItemKey, _state: ControlState, _selected: bool) {}

    fn set_picker(&self, _item: Option<&ItemKey>) {}
}

/// [`MemoIndicator`] that keeps the last rendered state of each digit.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndicatorBoard {
    annotated: [bool; 10],
    renders: usize,
}

impl IndicatorBoard {
    /// Create a board with every digit unannotated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last rendered state of `digit`.
    #[must_use]
    pub fn is_annotated(&self, digit: Digit) -> bool {
        self.annotated[digit.index()]
    }

    /// Hover hint for `digit`, empty when unannotated.
    #[must_use]
    pub fn hint(&self, digit: Digit) -> &'static str {
        if self.is_annotated(digit) { "memo" } else { "" }
    }

    /// Total number of render calls received.
    #[must_use]
    pub fn renders(&self) -> usize {
        self.renders
    }
}

impl MemoIndicator for IndicatorBoard {
    fn render(&mut self, digit: Digit, annotated: bool) {
        self.annotated[digit.index()] = annotated;
        self.renders += 1;
    }
}

// ---------------------------------------------------------------------------
// Shared handles
// ---------------------------------------------------------------------------

impl<T: GameServer> GameServer for Arc<T> {
    fn use_item(
        &self,
        request: &UseItemRequest,
    ) -> impl Future<Output = std::result::Result<ItemReply, TransportError>> + Send {
        (**self).use_item(request)
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn alert(&self, message: &str) {
        (**self).alert(message);
    }
}

impl<T: Presenter + ?Sized> Presenter for Arc<T> {
    fn show_effect(&self, message: &str) {
        (**self).show_effect(message);
    }
}

impl<T: ItemView + ?Sized> ItemView for Arc<T> {
    fn render_control(&self, key: &ItemKey, state: ControlState, selected: bool) {
        (**self).render_control(key, state, selected);
    }

    fn set_picker(&self, item: Option<&ItemKey>) {
        (**self).set_picker(item);
    }
}

impl<T: Reconciler + ?Sized> Reconciler for Arc<T> {
    fn reconcile(&self, applied: &AppliedItem) {
        (**self).reconcile(applied);
    }
}
