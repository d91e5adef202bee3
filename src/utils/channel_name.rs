//! Channel name normalization
//!
//! Template lists and remote feeds spell the same channel in different ways
//! ("CCTV 5", "CCTV5HD", "CCTV-5体育[1920*1080]"). [`normalize`] folds these
//! variants onto a single [`ChannelKey`] so the two lists can be joined.
//! Non-CCTV names are only stripped of bracketed tags and trimmed.

use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static BRACKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("valid bracket regex"));
static CJK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x{4e00}-\x{9fa5}]+").expect("valid CJK regex"));
static RESOLUTION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\*\d+\]").expect("valid resolution tag regex"));

/// Normalized channel identity used to match template and feed entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChannelKey(String);

impl ChannelKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ChannelKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChannelKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a display name into a [`ChannelKey`].
///
/// Total and deterministic: malformed input degrades to a best-effort (possibly
/// empty) key rather than an error.
pub fn normalize(name: &str) -> ChannelKey {
    let stripped = BRACKET_TAG.replace_all(name, "");
    if !stripped.to_lowercase().contains("cctv") {
        return ChannelKey(stripped.trim().to_string());
    }

    let mut tokens = stripped.split_whitespace();
    let first = tokens.next().unwrap_or_default();
    let station = if first.eq_ignore_ascii_case("cctv") {
        // "CCTV 5" -> "CCTV5"
        format!("{first}{}", tokens.next().unwrap_or_default())
    } else {
        first.to_string()
    };

    let without_cjk = CJK_RUN.replace_all(&station, "");
    let mut key = RESOLUTION_TAG.replace_all(&without_cjk, "").into_owned();

    if !key.contains('-') {
        key = key.replace("CCTV", "CCTV-");
    }
    if ends_with_hd(&key) {
        key.truncate(key.len() - 2);
    }

    ChannelKey(key.trim().to_string())
}

fn ends_with_hd(s: &str) -> bool {
    let mut tail = s.chars().rev();
    matches!(
        (tail.next(), tail.next()),
        (Some(d), Some(h)) if d.eq_ignore_ascii_case(&'d') && h.eq_ignore_ascii_case(&'h')
    )
}
