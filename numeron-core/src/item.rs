//! Item activation: select an item, optionally pick a digit, submit it,
//! reflect the outcome.
//!
//! Each item control moves `Available → Pending → Used`. `Pending` only
//! lasts for one request; a rejection, transport failure or timeout puts the
//! control back to `Available` so the player can retry. `Used` is terminal.
//!
//! After a successful activation the controller does not patch any game
//! state itself. It hands an [`AppliedItem`] to the [`Reconciler`], which is
//! expected to refetch the authoritative snapshot from the server.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ItemConfig;
use crate::error::{NumeronError, Result};
use crate::ports::{GameServer, ItemView, NoView, Notifier, Presenter, Reconciler};
use crate::protocol::{ItemReply, UseItemRequest};
use crate::types::{AppliedItem, ControlState, Digit, ItemKey};

/// Alert text when the request could not complete.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "An error occurred while using the item.";

/// Behaviour knobs for the controller.
#[derive(Debug, Clone)]
pub struct ItemSettings {
    /// Items that need a target digit.
    pub digit_items: Vec<ItemKey>,
    /// Shown when a success reply carries no effect text.
    pub fallback_effect: String,
    /// Upper bound on one activation round trip.
    pub request_timeout: Duration,
}

impl ItemSettings {
    /// Whether `key` needs a target digit.
    #[must_use]
    pub fn requires_digit(&self, key: &ItemKey) -> bool {
        self.digit_items.contains(key)
    }
}

impl Default for ItemSettings {
    fn default() -> Self {
        Self::from(&ItemConfig::default())
    }
}

impl From<&ItemConfig> for ItemSettings {
    fn from(config: &ItemConfig) -> Self {
        Self {
            digit_items: config
                .digit_items
                .iter()
                .filter_map(|name| ItemKey::new(name).ok())
                .collect(),
            fallback_effect: config.fallback_effect.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

/// What an activation did, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The server applied the item.
    Applied(AppliedItem),
    /// The item was already used; nothing was sent.
    AlreadyUsed,
    /// A request for this item is still in flight; nothing was sent.
    InFlight,
}

/// Result of a click on an item control or a picker digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The control was not interactive, or no picker was open.
    Ignored,
    /// The item needs a digit; the picker is now showing.
    PickerShown,
    /// An activation ran.
    Activated(ActivationOutcome),
}

#[derive(Debug, Clone, Copy, Default)]
struct ItemControl {
    state: ControlState,
    selected: bool,
}

/// Drives the item activation cycle against a [`GameServer`].
///
/// All methods take `&self`; control state lives behind a lock that is
/// never held across the network await.
pub struct ItemActivationController<S> {
    server: S,
    settings: ItemSettings,
    controls: Mutex<BTreeMap<ItemKey, ItemControl>>,
    picker: Mutex<Option<ItemKey>>,
    notifier: Box<dyn Notifier>,
    presenter: Option<Box<dyn Presenter>>,
    view: Box<dyn ItemView>,
    reconciler: Option<Box<dyn Reconciler>>,
}

impl<S> std::fmt::Debug for ItemActivationController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemActivationController")
            .field("settings", &self.settings)
            .field("controls", &*self.controls.lock())
            .field("picker", &*self.picker.lock())
            .field("has_presenter", &self.presenter.is_some())
            .field("has_reconciler", &self.reconciler.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: GameServer> ItemActivationController<S> {
    /// Create a controller with no presenter, no view and no reconciler.
    pub fn new(server: S, settings: ItemSettings, notifier: impl Notifier + 'static) -> Self {
        Self {
            server,
            settings,
            controls: Mutex::new(BTreeMap::new()),
            picker: Mutex::new(None),
            notifier: Box::new(notifier),
            presenter: None,
            view: Box::new(NoView),
            reconciler: None,
        }
    }

    /// Attach the effect display.
    #[must_use]
    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Some(Box::new(presenter));
        self
    }

    /// Attach the control renderer.
    #[must_use]
    pub fn with_view(mut self, view: impl ItemView + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    /// Attach the post-success reconciliation hook.
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: impl Reconciler + 'static) -> Self {
        self.reconciler = Some(Box::new(reconciler));
        self
    }

    /// The Game Server this controller talks to.
    #[must_use]
    pub fn server(&self) -> &S {
        &self.server
    }

    /// Declare an item control. Existing controls keep their state.
    pub fn register(&self, key: ItemKey) {
        let control = *self.controls.lock().entry(key.clone()).or_default();
        self.view.render_control(&key, control.state, control.selected);
    }

    /// Current state of `key`'s control, if it is known.
    #[must_use]
    pub fn state(&self, key: &ItemKey) -> Option<ControlState> {
        self.controls.lock().get(key).map(|c| c.state)
    }

    /// Whether `key`'s control is marked selected.
    #[must_use]
    pub fn is_selected(&self, key: &ItemKey) -> bool {
        self.controls.lock().get(key).is_some_and(|c| c.selected)
    }

    /// Item whose digit picker is open, if any.
    #[must_use]
    pub fn picker(&self) -> Option<ItemKey> {
        self.picker.lock().clone()
    }

    /// Mark every known control that is not in `remaining` as used.
    ///
    /// Used to line controls up with an authoritative snapshot. Pending
    /// controls are left alone and nothing ever goes back to available.
    /// Returns how many controls were retired.
    pub fn retire_missing(&self, remaining: &[ItemKey]) -> usize {
        let retired: Vec<ItemKey> = {
            let mut controls = self.controls.lock();
            controls
                .iter_mut()
                .filter(|(key, control)| {
                    control.state == ControlState::Available && !remaining.contains(*key)
                })
                .map(|(key, control)| {
                    control.state = ControlState::Used;
                    control.selected = false;
                    key.clone()
                })
                .collect()
        };
        for key in &retired {
            self.view.render_control(key, ControlState::Used, false);
        }
        if !retired.is_empty() {
            debug!(retired = retired.len(), "Retired items missing from snapshot");
        }
        retired.len()
    }

    /// Handle a click on an item control.
    ///
    /// Used or pending controls are ignored. Digit items open the picker;
    /// every other item is activated right away.
    ///
    /// # Errors
    /// Propagates the activation error for items activated directly.
    pub async fn select_item(&self, key: &ItemKey) -> Result<Selection> {
        let state = {
            let mut controls = self.controls.lock();
            let control = controls.entry(key.clone()).or_default();
            if control.state.is_interactive() {
                control.selected = true;
            }
            control.state
        };
        if !state.is_interactive() {
            debug!(item = %key, ?state, "Ignoring click on inactive item");
            return Ok(Selection::Ignored);
        }
        self.view.render_control(key, state, true);

        if self.settings.requires_digit(key) {
            *self.picker.lock() = Some(key.clone());
            self.view.set_picker(Some(key));
            return Ok(Selection::PickerShown);
        }

        self.activate_item(key, None).await.map(Selection::Activated)
    }

    /// Handle a digit chosen in the open picker.
    ///
    /// The picker closes before the request is sent.
    ///
    /// # Errors
    /// Propagates the activation error.
    pub async fn choose_digit(&self, digit: Digit) -> Result<Selection> {
        let Some(key) = self.picker.lock().take() else {
            return Ok(Selection::Ignored);
        };
        self.view.set_picker(None);
        self.activate_item(&key, Some(digit))
            .await
            .map(Selection::Activated)
    }

    /// Close the picker without using the item.
    pub fn cancel_picker(&self) {
        let Some(key) = self.picker.lock().take() else {
            return;
        };
        self.view.set_picker(None);
        let state = self.controls.lock().get_mut(&key).map(|control| {
            control.selected = false;
            control.state
        });
        if let Some(state) = state {
            self.view.render_control(&key, state, false);
        }
    }

    /// Use `key`, with `digit` for items that need one.
    ///
    /// Used items and items with a request in flight are skipped without a
    /// request. A digit item without a digit fails locally with
    /// [`NumeronError::MissingParameter`]. Otherwise exactly one request is
    /// sent and resolved along one of three paths: rejection, transport
    /// failure (including timeout) or success. Every failure alerts the
    /// player and leaves the control available. Dropping the returned
    /// future before it completes also leaves the control available.
    ///
    /// # Errors
    /// Returns `MissingParameter`, `RemoteRejection` or `TransportFailure`.
    pub async fn activate_item(
        &self,
        key: &ItemKey,
        digit: Option<Digit>,
    ) -> Result<ActivationOutcome> {
        let selected = {
            let mut controls = self.controls.lock();
            let control = controls.entry(key.clone()).or_default();
            match control.state {
                ControlState::Used => return Ok(ActivationOutcome::AlreadyUsed),
                ControlState::Pending => return Ok(ActivationOutcome::InFlight),
                ControlState::Available => {}
            }

            if digit.is_none() && self.settings.requires_digit(key) {
                drop(controls);
                let err = NumeronError::MissingParameter {
                    item: key.to_string(),
                };
                self.notifier
                    .alert(&format!("Choose a digit before using the {key} item."));
                return Err(err);
            }

            control.state = ControlState::Pending;
            control.selected
        };
        self.view.render_control(key, ControlState::Pending, selected);
        let _pending = PendingGuard {
            controls: &self.controls,
            view: &*self.view,
            key,
        };

        let request = UseItemRequest::new(key, digit);
        let start = Instant::now();
        let reply = tokio::time::timeout(self.settings.request_timeout, self.server.use_item(&request))
            .await
            .unwrap_or_else(|_| {
                Err(crate::TransportError::new(format!(
                    "no reply within {}ms",
                    self.settings.request_timeout.as_millis()
                )))
            });
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match reply {
            Ok(ItemReply::Applied { effect }) => {
                let effect = effect.unwrap_or_else(|| self.settings.fallback_effect.clone());
                if let Some(presenter) = &self.presenter {
                    presenter.show_effect(&effect);
                }
                self.settle(key, ControlState::Used);
                info!(item = %key, digit = ?digit.map(Digit::value), latency_ms, "Item applied");

                let applied = AppliedItem {
                    key: key.clone(),
                    digit,
                    effect,
                };
                if let Some(reconciler) = &self.reconciler {
                    reconciler.reconcile(&applied);
                }
                Ok(ActivationOutcome::Applied(applied))
            }
            Ok(ItemReply::Rejected { reason }) => {
                self.settle(key, ControlState::Available);
                info!(item = %key, reason = %reason, latency_ms, "Item rejected by server");
                self.notifier
                    .alert(&format!("Item use failed: {reason}"));
                Err(NumeronError::RemoteRejection { reason })
            }
            Err(cause) => {
                self.settle(key, ControlState::Available);
                warn!(item = %key, error = %cause, latency_ms, "Item request failed");
                self.notifier.alert(TRANSPORT_FAILURE_MESSAGE);
                Err(cause.into())
            }
        }
    }

    /// Leave the pending state. `Used` also clears the selection.
    fn settle(&self, key: &ItemKey, state: ControlState) {
        let selected = {
            let mut controls = self.controls.lock();
            let control = controls.entry(key.clone()).or_default();
            control.state = state;
            if state == ControlState::Used {
                control.selected = false;
            }
            control.selected
        };
        self.view.render_control(key, state, selected);
    }
}

/// Puts a control that is still `Pending` back to `Available` when the
/// activation that set it is dropped before settling.
struct PendingGuard<'a> {
    controls: &'a Mutex<BTreeMap<ItemKey, ItemControl>>,
    view: &'a dyn ItemView,
    key: &'a ItemKey,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let selected = self.controls.lock().get_mut(self.key).and_then(|control| {
            (control.state == ControlState::Pending).then(|| {
                control.state = ControlState::Available;
                control.selected
            })
        });
        if let Some(selected) = selected {
            debug!(item = %self.key, "Activation dropped before settling");
            self.view.render_control(self.key, ControlState::Available, selected);
        }
    }
}
