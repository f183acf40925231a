//! Wire types exchanged with the Game Server.
//!
//! The activation request body is
//!
//! ```json
//! { "item_name": "TARGET", "target_digit": 3 }
//! ```
//!
//! with `target_digit` set to `null` for items that take no digit. The reply
//! is either `{ "error": "..." }` or a success body. Two success shapes are
//! accepted: a flat `{ "effect": "..." }` and the nested
//! `{ "success": true, "result": { "effect": "..." }, "item": "..." }`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memo::is_truthy;
use crate::types::{Digit, ItemKey};

/// Body of one item activation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseItemRequest {
    /// Item being used.
    pub item_name: String,
    /// Target digit, `null` when the item takes none.
    pub target_digit: Option<u8>,
}

impl UseItemRequest {
    /// Build a request for `key`, optionally carrying a target digit.
    #[must_use]
    pub fn new(key: &ItemKey, digit: Option<Digit>) -> Self {
        Self {
            item_name: key.as_str().to_string(),
            target_digit: digit.map(Digit::value),
        }
    }
}

/// Raw activation reply as the server sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UseItemResponse {
    /// Rejection reason; a truthy value takes precedence over everything else.
    #[serde(default)]
    pub error: Option<Value>,
    /// Flat effect description.
    #[serde(default)]
    pub effect: Option<Value>,
    /// Nested effect payload.
    #[serde(default)]
    pub result: Option<EffectPayload>,
    /// Success flag, informational only.
    #[serde(default)]
    pub success: Option<bool>,
    /// Echo of the item name, informational only.
    #[serde(default)]
    pub item: Option<String>,
}

impl UseItemResponse {
    /// Whether the body carries a truthy `error`.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.error.as_ref().is_some_and(is_truthy)
    }
}

/// Nested `result` object of a success reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EffectPayload {
    /// Effect description.
    #[serde(default)]
    pub effect: Option<Value>,
}

/// Interpreted activation reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemReply {
    /// The server refused the activation.
    Rejected {
        /// Human-readable reason.
        reason: String,
    },
    /// The item was applied.
    Applied {
        /// Effect description, if the server gave one.
        effect: Option<String>,
    },
}

impl From<UseItemResponse> for ItemReply {
    fn from(resp: UseItemResponse) -> Self {
        if let Some(reason) = truthy_text(resp.error) {
            return Self::Rejected { reason };
        }
        let effect = truthy_text(resp.effect)
            .or_else(|| resp.result.and_then(|r| truthy_text(r.effect)));
        Self::Applied { effect }
    }
}

/// Display text of a truthy JSON value. Strings are taken as-is, anything
/// else is rendered as JSON.
fn truthy_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        other if is_truthy(&other) => Some(other.to_string()),
        _ => None,
    }
}

/// Authoritative play state, refetched after an item changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Current turn number.
    #[serde(default)]
    pub turn: u32,
    /// Rendered guess history lines.
    #[serde(default)]
    pub history: Vec<String>,
    /// Items the player can still use, when the server reports them.
    #[serde(default)]
    pub remaining_items: Option<Vec<String>>,
    /// Whether a DOUBLE follow-up call is pending.
    #[serde(default)]
    pub double_call_available: bool,
}

/// Reply of the DOUBLE call status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DoubleCallStatus {
    /// Whether a second consecutive call is allowed.
    #[serde(default)]
    pub double_call_available: bool,
}
