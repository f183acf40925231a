//! Digit memos: per-digit annotations that survive reloads.
//!
//! The [`MemoMap`] is stored as one JSON record under a fixed key:
//!
//! ```json
//! { "3": true, "7": true }
//! ```
//!
//! Key presence with a truthy value means "annotated". The record is
//! discarded (not overwritten) when the page address carries the reset
//! marker, which the server sets when a new round begins.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::address;
use crate::config::MemoConfig;
use crate::error::{NumeronError, Result};
use crate::ports::{AddressBar, KeyValueStore, MemoIndicator};
use crate::types::Digit;

// ---------------------------------------------------------------------------
// MemoMap
// ---------------------------------------------------------------------------

/// Set of annotated digits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoMap {
    annotated: BTreeSet<Digit>,
}

impl MemoMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `digit` is annotated.
    #[must_use]
    pub fn contains(&self, digit: Digit) -> bool {
        self.annotated.contains(&digit)
    }

    /// Flip `digit` and return its new state.
    pub fn toggle(&mut self, digit: Digit) -> bool {
        if self.annotated.remove(&digit) {
            false
        } else {
            self.annotated.insert(digit);
            true
        }
    }

    /// Number of annotated digits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.annotated.len()
    }

    /// Whether no digit is annotated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.annotated.is_empty()
    }

    /// Annotated digits in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Digit> + '_ {
        self.annotated.iter().copied()
    }

    /// Drop every annotation.
    pub fn clear(&mut self) {
        self.annotated.clear();
    }

    /// Serialize to the stored JSON record.
    ///
    /// # Errors
    /// Returns [`NumeronError::Serialization`] if encoding fails.
    pub fn to_record(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| NumeronError::Serialization(e.to_string()))
    }

    /// Decode a stored JSON record.
    ///
    /// The record must be a JSON object. Keys `"0"`..`"9"` with a truthy
    /// value are annotated; falsy values and any other key are ignored.
    ///
    /// # Errors
    /// Returns [`NumeronError::MalformedPersistedState`] if the text is not
    /// a JSON object.
    pub fn from_record(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| NumeronError::MalformedPersistedState(e.to_string()))?;
        let Value::Object(entries) = value else {
            return Err(NumeronError::MalformedPersistedState(
                "memo record is not a JSON object".to_string(),
            ));
        };

        let mut map = Self::new();
        for (key, marker) in &entries {
            match key.parse::<Digit>() {
                Ok(digit) if key.len() == 1 => {
                    if is_truthy(marker) {
                        map.annotated.insert(digit);
                    }
                }
                _ => debug!(key = %key, "Ignoring non-digit memo key"),
            }
        }
        Ok(map)
    }
}

impl FromIterator<Digit> for MemoMap {
    fn from_iter<I: IntoIterator<Item = Digit>>(iter: I) -> Self {
        Self {
            annotated: iter.into_iter().collect(),
        }
    }
}

impl Serialize for MemoMap {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.annotated.len()))?;
        for digit in &self.annotated {
            map.serialize_entry(&digit.to_string(), &true)?;
        }
        map.end()
    }
}

/// JavaScript truthiness of a JSON value.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// MemoStore
// ---------------------------------------------------------------------------

/// Where the store keeps its record and which address flag resets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoSettings {
    /// Storage key of the record.
    pub storage_key: String,
    /// Address query parameter carrying the reset marker.
    pub reset_param: String,
}

impl Default for MemoSettings {
    fn default() -> Self {
        Self::from(&MemoConfig::default())
    }
}

impl From<&MemoConfig> for MemoSettings {
    fn from(config: &MemoConfig) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            reset_param: config.reset_param.clone(),
        }
    }
}

/// Result of [`MemoStore::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A record was found; this many digits are annotated.
    Restored(usize),
    /// No record was stored.
    Empty,
    /// A record was stored but could not be read; the map is empty.
    Discarded,
}

/// Result of [`MemoStore::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The reset marker was present; memos were wiped.
    Reset,
    /// No marker; the stored record was loaded.
    Restored(RestoreOutcome),
}

/// Owner of the memo map, its durable record and its indicators.
///
/// For every digit the indicator always reflects the current map: every
/// mutation re-renders the digits it touches.
#[derive(Debug)]
pub struct MemoStore<S, V> {
    map: MemoMap,
    storage: S,
    indicator: V,
    settings: MemoSettings,
}

impl<S: KeyValueStore, V: MemoIndicator> MemoStore<S, V> {
    /// Create a store with an empty map. Nothing is read until
    /// [`initialize`](Self::initialize) or [`restore`](Self::restore).
    pub fn new(storage: S, indicator: V, settings: MemoSettings) -> Self {
        Self {
            map: MemoMap::new(),
            storage,
            indicator,
            settings,
        }
    }

    /// Current annotations.
    #[must_use]
    pub fn map(&self) -> &MemoMap {
        &self.map
    }

    /// Whether `digit` is annotated.
    #[must_use]
    pub fn is_annotated(&self, digit: Digit) -> bool {
        self.map.contains(digit)
    }

    /// The indicator this store renders into.
    #[must_use]
    pub fn indicator(&self) -> &V {
        &self.indicator
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Flip `digit`, re-render it and persist the whole map.
    ///
    /// Returns the digit's new state.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written. The in-memory map
    /// and the indicator keep the new state.
    pub fn toggle(&mut self, digit: Digit) -> Result<bool> {
        let annotated = self.map.toggle(digit);
        self.refresh_indicator(digit);
        self.persist()?;
        Ok(annotated)
    }

    /// Re-render one digit from the current map.
    pub fn refresh_indicator(&mut self, digit: Digit) {
        self.indicator.render(digit, self.map.contains(digit));
    }

    /// Re-render all ten digits.
    pub fn refresh_all(&mut self) {
        for digit in Digit::ALL {
            self.refresh_indicator(digit);
        }
    }

    /// Write the whole map under the storage key, replacing any old record.
    ///
    /// # Errors
    /// Returns an error if encoding or the storage write fails.
    pub fn persist(&mut self) -> Result<()> {
        let record = self.map.to_record()?;
        self.storage.set(&self.settings.storage_key, &record)?;
        debug!(annotated = self.map.len(), "Persisted memo record");
        Ok(())
    }

    /// Load the stored record and re-render all digits.
    ///
    /// Missing, unreadable or malformed records leave the map empty. This
    /// never fails.
    pub fn restore(&mut self) -> RestoreOutcome {
        self.map.clear();
        let outcome = match self.storage.get(&self.settings.storage_key) {
            Ok(None) => RestoreOutcome::Empty,
            Ok(Some(raw)) => match MemoMap::from_record(&raw) {
                Ok(map) => {
                    self.map = map;
                    RestoreOutcome::Restored(self.map.len())
                }
                Err(e) => {
                    warn!(error = %e, "Discarding malformed memo record");
                    RestoreOutcome::Discarded
                }
            },
            Err(e) => {
                warn!(error = %e, "Memo record could not be read, starting empty");
                RestoreOutcome::Discarded
            }
        };
        self.refresh_all();
        debug!(?outcome, "Restored memo record");
        outcome
    }

    /// Clear every annotation, delete the stored record and re-render.
    ///
    /// # Errors
    /// Returns an error if the record cannot be removed. The in-memory map
    /// and indicators are cleared regardless.
    pub fn reset(&mut self) -> Result<()> {
        self.map.clear();
        self.refresh_all();
        let removed = self.storage.remove(&self.settings.storage_key)?;
        info!(removed, "Memo record reset");
        Ok(())
    }

    /// Page-load entry point.
    ///
    /// If the address carries the reset marker, reset and strip the marker
    /// from the visible address (other parameters kept, no history entry).
    /// Otherwise restore the stored record.
    ///
    /// # Errors
    /// Returns an error only if a requested reset cannot remove the record.
    /// The marker is stripped before that error is returned.
    pub fn initialize(&mut self, address_bar: &mut impl AddressBar) -> Result<InitOutcome> {
        let location = address_bar.location();
        if address::reset_requested(&location, &self.settings.reset_param) {
            let reset = self.reset();
            address_bar.replace_state(address::strip_param(&location, &self.settings.reset_param));
            reset?;
            Ok(InitOutcome::Reset)
        } else {
            Ok(InitOutcome::Restored(self.restore()))
        }
    }
}
