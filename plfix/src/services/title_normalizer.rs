//! Title normalization
//!
//! Two normalizers with different jobs:
//! - [`normalize_title`] builds the match key used by the title index. It is
//!   aggressive (case-fold, punctuation and stopwords removed) and idempotent.
//! - [`search_query_title`] cleans a raw entry title before it is sent to the
//!   catalog search. It keeps case and punctuation so the query still reads
//!   like the original title.

use regex::Regex;
use std::sync::OnceLock;

/// Tokens dropped from match keys
pub const STOPWORDS: &[&str] = &[
    "official",
    "audio",
    "video",
    "lyrics",
    "mv",
    "hd",
    "hq",
    "remaster",
    "remastered",
];

fn bracketed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").expect("valid bracket pattern")
    })
}

fn search_bracketed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s*\[[^\]]+\]|\s*\([^)]+\)").expect("valid bracket pattern")
    })
}

fn search_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(official|audio|video|lyrics|mv)\b").expect("valid keyword pattern")
    })
}

/// Match key for the title index
///
/// Strips bracketed/parenthetical segments, case-folds, replaces punctuation
/// with spaces, drops [`STOPWORDS`] and collapses whitespace. Distinct titles
/// may share a key; the result may be empty.
pub fn normalize_title(raw: &str) -> String {
    let stripped = bracketed().replace_all(raw, " ");
    let folded: String = stripped
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title cleaned for a catalog search query
///
/// Removes bracketed/parenthetical text and the words
/// official/audio/video/lyrics/mv (any case), then collapses whitespace.
pub fn search_query_title(raw: &str) -> String {
    let without_brackets = search_bracketed().replace_all(raw, "");
    let without_keywords = search_keywords().replace_all(&without_brackets, "");
    without_keywords.split_whitespace().collect::<Vec<_>>().join(" ")
}
