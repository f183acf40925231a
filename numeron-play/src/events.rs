//! Raw UI events and their validation.
//!
//! The page hands over whatever its controls carry: an item's data
//! attribute, a picker button's text, a memo button's digit. Validation into
//! [`ItemKey`] and [`Digit`] happens here so the core never sees raw
//! markup values.

use numeron_core::error::Result;
use numeron_core::types::{Digit, ItemKey};

/// An event as the page reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The page finished loading.
    PageLoaded,
    /// An item control was clicked; carries its item attribute.
    ItemClicked(String),
    /// A digit button in the target picker was clicked; carries its text.
    DigitPicked(String),
    /// The target picker was dismissed.
    PickerDismissed,
    /// A memo button was clicked; carries its digit text.
    MemoClicked(String),
}

/// A validated event, ready for the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayAction {
    /// Initialise memos from the address and storage.
    Load,
    /// Select an item.
    SelectItem(ItemKey),
    /// Choose a digit in the picker.
    PickDigit(Digit),
    /// Close the picker.
    DismissPicker,
    /// Toggle a memo.
    ToggleMemo(Digit),
}

impl UiEvent {
    /// Validate the raw payload.
    ///
    /// # Errors
    /// Returns `InvalidItemKey` or `InvalidDigit` for malformed payloads.
    pub fn into_action(self) -> Result<PlayAction> {
        Ok(match self {
            Self::PageLoaded => PlayAction::Load,
            Self::ItemClicked(raw) => PlayAction::SelectItem(ItemKey::new(&raw)?),
            Self::DigitPicked(raw) => PlayAction::PickDigit(raw.parse()?),
            Self::PickerDismissed => PlayAction::DismissPicker,
            Self::MemoClicked(raw) => PlayAction::ToggleMemo(raw.parse()?),
        })
    }
}
