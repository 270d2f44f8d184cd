//! arXiv identifier normalization.
//!
//! The same rule applies to requested ids, payload ids and response entry
//! ids, so a paper is cached once regardless of how it was named.

use once_cell::sync::Lazy;
use regex::Regex;

static VERSION_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v\d+$").expect("valid version regex"));

const ARXIV_PREFIX: &str = "arxiv:";

/// Canonical form of an arXiv identifier.
///
/// `arXiv:1706.03762`, ` 1706.03762v7 ` and
/// `http://arxiv.org/abs/1706.03762v7` all map to `1706.03762`. Old-style ids
/// keep their archive (`hep-th/9901001`).
pub fn canonical_id(raw: &str) -> String {
    let mut id = raw.trim();
    if let Some(tail) = id.split_once("/abs/").map(|(_, tail)| tail) {
        id = tail;
    }
    if id.len() >= ARXIV_PREFIX.len()
        && id.is_char_boundary(ARXIV_PREFIX.len())
        && id[..ARXIV_PREFIX.len()].eq_ignore_ascii_case(ARXIV_PREFIX)
    {
        id = id[ARXIV_PREFIX.len()..].trim_start();
    }
    let id = id.trim_end_matches('/');
    VERSION_SUFFIX.replace(id, "").into_owned()
}

/// Canonical id from an Atom entry URL; `None` for entries that are not
/// papers (the API reports errors as entries without an `/abs/` path).
pub fn id_from_entry_url(url: &str) -> Option<String> {
    let (_, tail) = url.trim().split_once("/abs/")?;
    let id = canonical_id(tail);
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
