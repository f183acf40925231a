//! Shared fixtures for the Numeron benchmarks.

use numeron_core::memo::{MemoSettings, MemoStore};
use numeron_core::ports::IndicatorBoard;
use numeron_core::storage::MemoryStorage;
use numeron_core::types::Digit;

/// A memo store over fresh in-memory storage.
#[must_use]
pub fn memory_store() -> MemoStore<MemoryStorage, IndicatorBoard> {
    MemoStore::new(
        MemoryStorage::new(),
        IndicatorBoard::new(),
        MemoSettings::default(),
    )
}

/// A stored record with every digit below `count` annotated.
#[must_use]
pub fn record_with(count: u8) -> String {
    let entries: Vec<String> = Digit::ALL
        .iter()
        .take(usize::from(count))
        .map(|d| format!("\"{d}\":true"))
        .collect();
    format!("{{{}}}", entries.join(","))
}
