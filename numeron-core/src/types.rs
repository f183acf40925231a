//! Core type definitions for the play screen.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NumeronError;

// ---------------------------------------------------------------------------
// Digits
// ---------------------------------------------------------------------------

/// A single decimal digit, 0 through 9.
///
/// Both the memo board and the target-digit picker are keyed by this type,
/// so nothing outside 0–9 can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Digit(u8);

impl Digit {
    /// Every digit in ascending order.
    pub const ALL: [Digit; 10] = [
        Digit(0),
        Digit(1),
        Digit(2),
        Digit(3),
        Digit(4),
        Digit(5),
        Digit(6),
        Digit(7),
        Digit(8),
        Digit(9),
    ];

    /// Create a digit, rejecting values above 9.
    ///
    /// # Errors
    /// Returns [`NumeronError::InvalidDigit`] if `value > 9`.
    pub fn new(value: u8) -> Result<Self, NumeronError> {
        if value <= 9 {
            Ok(Self(value))
        } else {
            Err(NumeronError::InvalidDigit(value.to_string()))
        }
    }

    /// The numeric value.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Position of this digit in a ten-slot table.
    #[must_use]
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for Digit {
    type Error = NumeronError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Digit> for u8 {
    fn from(digit: Digit) -> Self {
        digit.0
    }
}

impl FromStr for Digit {
    type Err = NumeronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u8>()
            .map_err(|_| NumeronError::InvalidDigit(s.to_string()))
            .and_then(Self::new)
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Item names the game server knows about.
pub mod items {
    /// Reveals one digit of the hidden number.
    pub const DOUBLE: &str = "DOUBLE";
    /// Tells which positions hold high (5–9) and low (0–4) digits.
    pub const HIGH_LOW: &str = "HIGH_LOW";
    /// Checks whether a chosen digit is in the hidden number.
    pub const TARGET: &str = "TARGET";
    /// Reveals max − min of the hidden digits.
    pub const SLASH: &str = "SLASH";
}

/// Identifier of a one-time item, as carried in `item_name` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    /// Create an item key from raw UI text.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns [`NumeronError::InvalidItemKey`] if the key is empty or blank.
    pub fn new(raw: &str) -> Result<Self, NumeronError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NumeronError::InvalidItemKey(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The key as sent to the server.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = NumeronError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ItemKey> for String {
    fn from(key: ItemKey) -> Self {
        key.0
    }
}

impl FromStr for ItemKey {
    type Err = NumeronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interaction state of a single item control.
///
/// `Used` is terminal for the page lifetime. `Pending` only exists while a
/// request is in flight and falls back to `Available` if it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlState {
    /// The item can be used.
    #[default]
    Available,
    /// A request for this item is in flight; the control is disabled.
    Pending,
    /// The item has been consumed.
    Used,
}

impl ControlState {
    /// Whether the control should accept clicks.
    #[must_use]
    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Available)
    }
}

/// A successful item activation, handed to the reconciliation hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedItem {
    /// The item that was consumed.
    pub key: ItemKey,
    /// Target digit, for parameterised items.
    pub digit: Option<Digit>,
    /// The effect description that was displayed.
    pub effect: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_range_is_enforced() {
        assert!(Digit::new(9).is_ok());
        assert!(matches!(Digit::new(10), Err(NumeronError::InvalidDigit(_))));
        assert_eq!(Digit::ALL.len(), 10);
        assert!(Digit::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn digit_parses_picker_text() {
        assert_eq!(" 7 ".parse::<Digit>().expect("parse").value(), 7);
        assert!("12".parse::<Digit>().is_err());
        assert!("-1".parse::<Digit>().is_err());
        assert!("x".parse::<Digit>().is_err());
    }

    #[test]
    fn digit_serde_rejects_out_of_range() {
        let d: Digit = serde_json::from_str("4").expect("in range");
        assert_eq!(d.value(), 4);
        assert!(serde_json::from_str::<Digit>("11").is_err());
    }

    #[test]
    fn item_key_rejects_blank() {
        assert!(ItemKey::new("").is_err());
        assert!(ItemKey::new("   ").is_err());
        assert_eq!(ItemKey::new(" TARGET ").expect("key").as_str(), items::TARGET);
    }

    #[test]
    fn only_available_controls_are_interactive() {
        assert!(ControlState::Available.is_interactive());
        assert!(!ControlState::Pending.is_interactive());
        assert!(!ControlState::Used.is_interactive());
    }
}
