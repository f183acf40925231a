//! Reset-marker handling on the page address.
//!
//! The server appends `?memo_reset=true` when a new guessing round starts.
//! The marker is read once at page load, then removed from the visible
//! address so a manual reload does not fire it again. Every other query
//! segment is kept byte-for-byte.

use url::form_urlencoded;
use url::Url;

use crate::ports::AddressBar;

/// Value of the reset parameter that requests a reset.
pub const RESET_VALUE: &str = "true";

/// Whether the first occurrence of `param` in `url` carries [`RESET_VALUE`].
#[must_use]
pub fn reset_requested(url: &Url, param: &str) -> bool {
    url.query_pairs()
        .find(|(name, _)| name == param)
        .is_some_and(|(_, value)| value == RESET_VALUE)
}

/// Return `url` with every occurrence of `param` removed.
///
/// Remaining segments are not re-encoded. The `?` is dropped when nothing
/// is left, and the fragment is kept.
#[must_use]
pub fn strip_param(url: &Url, param: &str) -> Url {
    let mut stripped = url.clone();
    let Some(query) = url.query() else {
        return stripped;
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|segment| !segment.is_empty() && !segment_names(segment, param))
        .collect();

    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.set_query(Some(&kept.join("&")));
    }
    stripped
}

fn segment_names(segment: &str, param: &str) -> bool {
    form_urlencoded::parse(segment.as_bytes())
        .next()
        .is_some_and(|(name, _)| name == param)
}

/// In-process [`AddressBar`].
///
/// Records every `replace_state` call. `history_len` only grows on
/// [`navigate`](Self::navigate), never on a replace.
#[derive(Debug, Clone)]
pub struct BrowserAddress {
    current: Url,
    history_len: usize,
    replacements: Vec<Url>,
}

impl BrowserAddress {
    /// Start at `url` with a single history entry.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            current: url,
            history_len: 1,
            replacements: Vec::new(),
        }
    }

    /// Parse and start at `raw`.
    ///
    /// # Errors
    /// Returns the parse error if `raw` is not an absolute URL.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Url::parse(raw).map(Self::new)
    }

    /// Navigate to `url`, adding a history entry.
    pub fn navigate(&mut self, url: Url) {
        self.current = url;
        self.history_len += 1;
    }

    /// Number of history entries.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Every address passed to `replace_state`, oldest first.
    #[must_use]
    pub fn replacements(&self) -> &[Url] {
        &self.replacements
    }
}

impl AddressBar for BrowserAddress {
    fn location(&self) -> Url {
        self.current.clone()
    }

    fn replace_state(&mut self, url: Url) {
        self.replacements.push(url.clone());
        self.current = url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    #[test]
    fn detects_marker() {
        assert!(reset_requested(&url("http://g/?memo_reset=true"), "memo_reset"));
        assert!(reset_requested(&url("http://g/?a=1&memo_reset=true#h"), "memo_reset"));
    }

    #[test]
    fn ignores_other_values_and_names() {
        assert!(!reset_requested(&url("http://g/?memo_reset=false"), "memo_reset"));
        assert!(!reset_requested(&url("http://g/?memo_reset=TRUE"), "memo_reset"));
        assert!(!reset_requested(&url("http://g/?memo=true"), "memo_reset"));
        assert!(!reset_requested(&url("http://g/"), "memo_reset"));
    }

    #[test]
    fn first_occurrence_decides() {
        assert!(!reset_requested(
            &url("http://g/?memo_reset=no&memo_reset=true"),
            "memo_reset"
        ));
    }

    #[test]
    fn strip_keeps_other_params_verbatim() {
        let stripped = strip_param(
            &url("http://g/play?x=a%20b&memo_reset=true&y=%E3%81%82+z"),
            "memo_reset",
        );
        assert_eq!(stripped.as_str(), "http://g/play?x=a%20b&y=%E3%81%82+z");
    }

    #[test]
    fn strip_removes_question_mark_when_empty() {
        let stripped = strip_param(&url("http://g/play?memo_reset=true#board"), "memo_reset");
        assert_eq!(stripped.as_str(), "http://g/play#board");
    }

    #[test]
    fn strip_removes_every_occurrence() {
        let stripped = strip_param(
            &url("http://g/?memo_reset=true&a=1&memo_reset=false"),
            "memo_reset",
        );
        assert_eq!(stripped.query(), Some("a=1"));
    }

    #[test]
    fn replace_does_not_grow_history() {
        let mut bar = BrowserAddress::parse("http://g/?memo_reset=true").expect("parse");
        bar.replace_state(url("http://g/"));
        assert_eq!(bar.history_len(), 1);
        assert_eq!(bar.replacements().len(), 1);
        bar.navigate(url("http://g/stats"));
        assert_eq!(bar.history_len(), 2);
    }
}
