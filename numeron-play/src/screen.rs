//! The play screen: one item controller and one memo store per page.

use std::sync::Arc;

use anyhow::Context;
use numeron_client::GameClient;
use numeron_core::address::BrowserAddress;
use numeron_core::error::Result;
use numeron_core::item::{ItemActivationController, ItemSettings, Selection};
use numeron_core::memo::{InitOutcome, MemoSettings, MemoStore};
use numeron_core::ports::{
    AddressBar, IndicatorBoard, ItemView, KeyValueStore, MemoIndicator, Notifier, Presenter,
};
use numeron_core::protocol::GameSnapshot;
use numeron_core::storage::AnyStorage;
use numeron_core::types::{ControlState, ItemKey};
use numeron_core::PlayConfig;
use tracing::{debug, info, warn};

use crate::events::{PlayAction, UiEvent};
use crate::reconcile::{SnapshotReconciler, SnapshotSource};

/// Page-side collaborators handed to the item controller.
#[derive(Clone)]
pub struct PageHooks {
    /// Blocking alerts.
    pub notifier: Arc<dyn Notifier>,
    /// Effect display, if the page has one.
    pub presenter: Option<Arc<dyn Presenter>>,
    /// Control renderer, if the page has one.
    pub view: Option<Arc<dyn ItemView>>,
}

impl PageHooks {
    /// Hooks that only alert.
    pub fn alerts_only(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            presenter: None,
            view: None,
        }
    }
}

impl Default for PageHooks {
    fn default() -> Self {
        let page = Arc::new(TracingPage);
        Self {
            notifier: page.clone(),
            presenter: Some(page.clone()),
            view: Some(page),
        }
    }
}

/// Headless page that reports everything through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPage;

impl Notifier for TracingPage {
    fn alert(&self, message: &str) {
        warn!(target: "numeron::page", "{message}");
    }
}

impl Presenter for TracingPage {
    fn show_effect(&self, message: &str) {
        info!(target: "numeron::page", "{message}");
    }
}

impl ItemView for TracingPage {
    fn render_control(&self, key: &ItemKey, state: ControlState, selected: bool) {
        debug!(target: "numeron::page", item = %key, ?state, selected, "render item");
    }

    fn set_picker(&self, item: Option<&ItemKey>) {
        debug!(target: "numeron::page", item = ?item.map(ItemKey::as_str), "digit picker");
    }
}

/// What a handled event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenUpdate {
    /// Memos were initialised on page load.
    Loaded(InitOutcome),
    /// An item click or digit pick was handled.
    Item(Selection),
    /// The picker was closed.
    PickerClosed,
    /// A memo was toggled to this state.
    Memo(bool),
    /// The event payload was invalid and was dropped.
    Rejected,
}

/// Owns both core components for one page.
pub struct PlayScreen<S, K, V, A> {
    items: ItemActivationController<S>,
    memo: MemoStore<K, V>,
    address: A,
    reconciler: Arc<SnapshotReconciler>,
    snapshot: Option<GameSnapshot>,
}

impl<S, K, V, A> std::fmt::Debug for PlayScreen<S, K, V, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayScreen")
            .field("items", &self.items)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl PlayScreen<GameClient, AnyStorage, IndicatorBoard, BrowserAddress> {
    /// Build a headless screen from configuration.
    ///
    /// # Errors
    /// Fails if the page URL is invalid, the storage backend cannot be
    /// opened or the HTTP client cannot be built.
    pub fn from_config(config: &PlayConfig, page_url: &str, hooks: PageHooks) -> anyhow::Result<Self> {
        let address = BrowserAddress::parse(page_url)
            .with_context(|| format!("invalid page url {page_url:?}"))?;
        let storage = AnyStorage::open(&config.memo).context("opening memo storage")?;
        let client = GameClient::new(config.server.clone()).context("building Game Server client")?;
        Ok(Self::new(
            client,
            storage,
            IndicatorBoard::new(),
            address,
            config,
            hooks,
        ))
    }
}

impl<S, K, V, A> PlayScreen<S, K, V, A>
where
    S: SnapshotSource,
    K: KeyValueStore,
    V: MemoIndicator,
    A: AddressBar,
{
    /// Wire a screen from its parts.
    pub fn new(
        server: S,
        storage: K,
        indicator: V,
        address: A,
        config: &PlayConfig,
        hooks: PageHooks,
    ) -> Self {
        let reconciler = Arc::new(SnapshotReconciler::new());
        let mut items =
            ItemActivationController::new(server, ItemSettings::from(&config.items), hooks.notifier)
                .with_reconciler(Arc::clone(&reconciler));
        if let Some(presenter) = hooks.presenter {
            items = items.with_presenter(presenter);
        }
        if let Some(view) = hooks.view {
            items = items.with_view(view);
        }

        Self {
            items,
            memo: MemoStore::new(storage, indicator, MemoSettings::from(&config.memo)),
            address,
            reconciler,
            snapshot: None,
        }
    }

    /// The item controller.
    #[must_use]
    pub fn items(&self) -> &ItemActivationController<S> {
        &self.items
    }

    /// The memo store.
    #[must_use]
    pub fn memo(&self) -> &MemoStore<K, V> {
        &self.memo
    }

    /// The page address.
    #[must_use]
    pub fn address(&self) -> &A {
        &self.address
    }

    /// Last fetched snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.snapshot.as_ref()
    }

    /// Page-load entry point for the memo half of the screen.
    ///
    /// # Errors
    /// See [`MemoStore::initialize`].
    pub fn load(&mut self) -> Result<InitOutcome> {
        self.memo.initialize(&mut self.address)
    }

    /// Declare the item controls present on the page.
    pub fn register_items<I: IntoIterator<Item = ItemKey>>(&self, keys: I) {
        for key in keys {
            self.items.register(key);
        }
    }

    /// Handle one raw UI event.
    ///
    /// Invalid payloads are logged and dropped. After an item is applied the
    /// snapshot is refetched before returning.
    ///
    /// # Errors
    /// Returns item activation errors (already shown to the player) and
    /// memo storage errors.
    pub async fn handle(&mut self, event: UiEvent) -> Result<ScreenUpdate> {
        let action = match event.into_action() {
            Ok(action) => action,
            Err(e) => {
                warn!(error = %e, "Dropping invalid UI event");
                return Ok(ScreenUpdate::Rejected);
            }
        };

        let update = match action {
            PlayAction::Load => ScreenUpdate::Loaded(self.load()?),
            PlayAction::SelectItem(key) => ScreenUpdate::Item(self.items.select_item(&key).await?),
            PlayAction::PickDigit(digit) => ScreenUpdate::Item(self.items.choose_digit(digit).await?),
            PlayAction::DismissPicker => {
                self.items.cancel_picker();
                ScreenUpdate::PickerClosed
            }
            PlayAction::ToggleMemo(digit) => ScreenUpdate::Memo(self.memo.toggle(digit)?),
        };

        self.refresh_snapshot().await;
        Ok(update)
    }

    /// Refetch the snapshot if an item was applied since the last fetch.
    ///
    /// Returns `true` if a new snapshot was stored. A failed fetch is logged
    /// and retried on the next call.
    pub async fn refresh_snapshot(&mut self) -> bool {
        if !self.reconciler.is_stale() {
            return false;
        }
        let applied = self.reconciler.take();

        match self.items.server().snapshot().await {
            Ok(snapshot) => {
                if let Some(remaining) = &snapshot.remaining_items {
                    let keys: Vec<ItemKey> = remaining
                        .iter()
                        .filter_map(|name| ItemKey::new(name).ok())
                        .collect();
                    self.items.retire_missing(&keys);
                }
                info!(
                    turn = snapshot.turn,
                    history = snapshot.history.len(),
                    applied = applied.len(),
                    "Play state resynchronised"
                );
                self.snapshot = Some(snapshot);
                true
            }
            Err(e) => {
                warn!(error = %e, "Snapshot refetch failed, will retry");
                self.reconciler.restore(applied);
                false
            }
        }
    }
}
