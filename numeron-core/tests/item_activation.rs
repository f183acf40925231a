//! Item activation scenarios against scripted Game Server fakes.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use numeron_core::error::{NumeronError, TransportError};
use numeron_core::item::{ActivationOutcome, ItemActivationController, ItemSettings, Selection};
use numeron_core::ports::{GameServer, ItemView, Notifier, Presenter, Reconciler};
use numeron_core::protocol::{ItemReply, UseItemRequest};
use numeron_core::types::{AppliedItem, ControlState, Digit, ItemKey};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeServer {
    replies: Mutex<VecDeque<Result<ItemReply, TransportError>>>,
    requests: Mutex<Vec<UseItemRequest>>,
    gate: Option<Arc<Notify>>,
    hang: bool,
}

impl FakeServer {
    fn scripted(replies: Vec<Result<ItemReply, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl GameServer for FakeServer {
    async fn use_item(&self, request: &UseItemRequest) -> Result<ItemReply, TransportError> {
        self.requests.lock().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.replies.lock().pop_front();
        next.unwrap_or(Ok(ItemReply::Applied { effect: None }))
    }
}

/// Records everything the controller pushes to the page.
#[derive(Default)]
struct Page {
    alerts: Mutex<Vec<String>>,
    effects: Mutex<Vec<String>>,
    renders: Mutex<Vec<(String, ControlState, bool)>>,
    picker: Mutex<Option<String>>,
    reconciled: Mutex<Vec<AppliedItem>>,
}

impl Notifier for Page {
    fn alert(&self, message: &str) {
        self.alerts.lock().push(message.to_string());
    }
}

impl Presenter for Page {
    fn show_effect(&self, message: &str) {
        self.effects.lock().push(message.to_string());
    }
}

impl ItemView for Page {
    fn render_control(&self, key: &ItemKey, state: ControlState, selected: bool) {
        self.renders.lock().push((key.to_string(), state, selected));
    }

    fn set_picker(&self, item: Option<&ItemKey>) {
        *self.picker.lock() = item.map(ToString::to_string);
    }
}

impl Reconciler for Page {
    fn reconcile(&self, applied: &AppliedItem) {
        self.reconciled.lock().push(applied.clone());
    }
}

fn key(name: &str) -> ItemKey {
    ItemKey::new(name).expect("key")
}

fn digit(n: u8) -> Digit {
    Digit::new(n).expect("digit")
}

fn full_controller(
    server: FakeServer,
    page: &Arc<Page>,
) -> ItemActivationController<FakeServer> {
    ItemActivationController::new(server, ItemSettings::default(), Arc::clone(page))
        .with_presenter(Arc::clone(page))
        .with_view(Arc::clone(page))
        .with_reconciler(Arc::clone(page))
}

// ---------------------------------------------------------------------------
// Success and rejection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn success_marks_used_and_surfaces_effect() {
    let page = Arc::new(Page::default());
    let server = FakeServer::scripted(vec![Ok(ItemReply::Applied {
        effect: Some("Revealed digit 3 is present".into()),
    })]);
    let items = full_controller(server, &page);
    let target = key("TARGET");
    items.register(target.clone());

    assert_eq!(items.select_item(&target).await.expect("select"), Selection::PickerShown);
    assert_eq!(page.picker.lock().as_deref(), Some("TARGET"));

    let selection = items.choose_digit(digit(3)).await.expect("choose");
    let Selection::Activated(ActivationOutcome::Applied(applied)) = selection else {
        panic!("expected the item to be applied");
    };

    assert_eq!(applied.digit, Some(digit(3)));
    assert_eq!(page.effects.lock().as_slice(), ["Revealed digit 3 is present"]);
    assert_eq!(items.state(&target), Some(ControlState::Used));
    assert!(!items.is_selected(&target));
    assert!(page.picker.lock().is_none());
    assert!(page.alerts.lock().is_empty());
    assert_eq!(page.reconciled.lock().as_slice(), [applied]);
    assert_eq!(
        page.renders.lock().last(),
        Some(&("TARGET".to_string(), ControlState::Used, false))
    );
}

#[tokio::test]
async fn rejection_keeps_item_available_and_shows_reason() {
    let page = Arc::new(Page::default());
    let server = FakeServer::scripted(vec![
        Err(TransportError::new("connection reset")),
        Ok(ItemReply::Rejected {
            reason: "already used".into(),
        }),
    ]);
    let items = full_controller(server, &page);
    let slash = key("SLASH");

    // First request hits a transport failure, second is rejected.
    let _ = items.activate_item(&slash, None).await;
    let err = items.activate_item(&slash, None).await.expect_err("rejected");

    assert!(matches!(err, NumeronError::RemoteRejection { ref reason } if reason == "already used"));
    assert_eq!(items.state(&slash), Some(ControlState::Available));
    let alerts = page.alerts.lock();
    assert_eq!(alerts.len(), 2);
    assert!(alerts[1].contains("already used"));
    assert!(page.effects.lock().is_empty());
    assert!(page.reconciled.lock().is_empty());
}

#[tokio::test]
async fn transport_cause_is_never_shown() {
    let page = Arc::new(Page::default());
    let server = FakeServer::scripted(vec![Err(TransportError::new(
        "tcp connect error: Connection refused (os error 111)",
    ))]);
    let items = full_controller(server, &page);

    let err = items.activate_item(&key("DOUBLE"), None).await.expect_err("fail");
    assert!(matches!(err, NumeronError::TransportFailure { .. }));
    assert!(page.alerts.lock().iter().all(|a| !a.contains("os error")));
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn used_item_click_is_ignored() {
    let page = Arc::new(Page::default());
    let items = full_controller(FakeServer::default(), &page);
    let high_low = key("HIGH_LOW");

    let first = items.select_item(&high_low).await.expect("select");
    assert!(matches!(first, Selection::Activated(ActivationOutcome::Applied(_))));
    let renders_before = page.renders.lock().len();

    assert_eq!(items.select_item(&high_low).await.expect("select"), Selection::Ignored);
    assert_eq!(
        items.activate_item(&high_low, None).await.expect("activate"),
        ActivationOutcome::AlreadyUsed
    );
    assert_eq!(items.server().request_count(), 1);
    assert_eq!(page.renders.lock().len(), renders_before);
}

#[tokio::test]
async fn missing_digit_blocks_request() {
    let page = Arc::new(Page::default());
    let items = full_controller(FakeServer::default(), &page);

    let err = items.activate_item(&key("TARGET"), None).await.expect_err("missing");
    assert!(matches!(err, NumeronError::MissingParameter { .. }));
    assert_eq!(items.server().request_count(), 0);
    assert_eq!(page.alerts.lock().len(), 1);
}

#[tokio::test]
async fn second_activation_while_pending_is_dropped() {
    let gate = Arc::new(Notify::new());
    let server = FakeServer {
        gate: Some(Arc::clone(&gate)),
        ..FakeServer::default()
    };
    let page = Arc::new(Page::default());
    let items = full_controller(server, &page);
    let slash = key("SLASH");

    let (first, second, ()) = tokio::join!(
        items.activate_item(&slash, None),
        async {
            tokio::task::yield_now().await;
            assert_eq!(items.state(&slash), Some(ControlState::Pending));
            items.activate_item(&slash, None).await
        },
        async {
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            gate.notify_one();
        },
    );

    assert!(matches!(first.expect("first"), ActivationOutcome::Applied(_)));
    assert_eq!(second.expect("second"), ActivationOutcome::InFlight);
    assert_eq!(items.server().request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn hung_request_times_out_as_transport_failure() {
    let server = FakeServer {
        hang: true,
        ..FakeServer::default()
    };
    let page = Arc::new(Page::default());
    let settings = ItemSettings {
        request_timeout: Duration::from_millis(1500),
        ..ItemSettings::default()
    };
    let items = ItemActivationController::new(server, settings, Arc::clone(&page));
    let double = key("DOUBLE");

    let err = items.activate_item(&double, None).await.expect_err("timeout");
    assert!(matches!(err, NumeronError::TransportFailure { ref cause } if cause.contains("1500ms")));
    assert_eq!(items.state(&double), Some(ControlState::Available));
    assert_eq!(page.alerts.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_activation_returns_control_to_available() {
    let gate = Arc::new(Notify::new());
    let server = FakeServer {
        gate: Some(Arc::clone(&gate)),
        ..FakeServer::default()
    };
    let page = Arc::new(Page::default());
    let items = full_controller(server, &page);
    let double = key("DOUBLE");

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), items.activate_item(&double, None)).await;
    assert!(abandoned.is_err());
    assert_eq!(items.state(&double), Some(ControlState::Available));
    assert_eq!(
        page.renders.lock().last().cloned(),
        Some(("DOUBLE".to_string(), ControlState::Available, false))
    );
    assert!(page.alerts.lock().is_empty());

    gate.notify_one();
    let retry = items.activate_item(&double, None).await.expect("retry");
    assert!(matches!(retry, ActivationOutcome::Applied(_)));
    assert_eq!(items.server().request_count(), 2);
    assert_eq!(items.state(&double), Some(ControlState::Used));
}

// ---------------------------------------------------------------------------
// Views that read controller state while rendering
// ---------------------------------------------------------------------------

/// Looks the rendered control up again from inside the render callback.
#[derive(Default)]
struct ReadBackView {
    controller: OnceLock<Weak<ItemActivationController<FakeServer>>>,
    seen: Mutex<Vec<(ControlState, Option<ControlState>)>>,
}

impl ItemView for ReadBackView {
    fn render_control(&self, key: &ItemKey, state: ControlState, _selected: bool) {
        if let Some(items) = self.controller.get().and_then(Weak::upgrade) {
            let current = items.state(key);
            let _ = items.is_selected(key);
            let _ = items.picker();
            self.seen.lock().push((state, current));
        }
    }

    fn set_picker(&self, _item: Option<&ItemKey>) {}
}

#[tokio::test]
async fn view_can_query_controller_while_rendering() {
    let view = Arc::new(ReadBackView::default());
    let page = Arc::new(Page::default());
    let server = FakeServer::scripted(vec![
        Err(TransportError::new("reset")),
        Ok(ItemReply::Applied { effect: None }),
    ]);
    let items = Arc::new(
        ItemActivationController::new(server, ItemSettings::default(), Arc::clone(&page))
            .with_view(Arc::clone(&view)),
    );
    assert!(view.controller.set(Arc::downgrade(&items)).is_ok());

    items.register(key("SLASH"));
    items.register(key("HIGH_LOW"));
    assert_eq!(items.select_item(&key("TARGET")).await.expect("select"), Selection::PickerShown);
    items.cancel_picker();
    items.activate_item(&key("SLASH"), None).await.expect_err("transport");
    items.activate_item(&key("SLASH"), None).await.expect("use");
    assert_eq!(items.retire_missing(&[]), 2);

    let seen = view.seen.lock();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|(rendered, current)| *current == Some(*rendered)));
}

// ---------------------------------------------------------------------------
// Optional collaborators
// ---------------------------------------------------------------------------

#[tokio::test]
async fn works_without_presenter_view_or_reconciler() {
    let page = Arc::new(Page::default());
    let server = FakeServer::scripted(vec![Ok(ItemReply::Applied {
        effect: Some("SLASH: 8".into()),
    })]);
    let items = ItemActivationController::new(server, ItemSettings::default(), Arc::clone(&page));

    let outcome = items.activate_item(&key("SLASH"), None).await.expect("use");
    assert!(matches!(outcome, ActivationOutcome::Applied(ref a) if a.effect == "SLASH: 8"));
    assert!(page.effects.lock().is_empty());
    assert!(page.renders.lock().is_empty());
}

#[tokio::test]
async fn unregistered_items_are_tracked_on_first_use() {
    let page = Arc::new(Page::default());
    let items = full_controller(FakeServer::default(), &page);
    let custom = key("SHUFFLE");

    assert_eq!(items.state(&custom), None);
    items.activate_item(&custom, None).await.expect("use");
    assert_eq!(items.state(&custom), Some(ControlState::Used));
}
