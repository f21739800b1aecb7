//! Infohash validation and magnet helpers.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static INFOHASH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap());

static BTIH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)xt=urn:btih:([0-9a-f]{40})").unwrap());

/// Return the lowercased infohash if `value` is a 40-character hex string.
pub fn normalize_infohash(value: &str) -> Option<String> {
    let value = value.trim();
    if INFOHASH_RE.is_match(value) {
        Some(value.to_lowercase())
    } else {
        None
    }
}

/// Extract a hex infohash from a magnet URI (or any URL carrying `xt=urn:btih:`).
pub fn extract_btih(magnet: &str) -> Option<String> {
    BTIH_RE
        .captures(magnet)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Minimal magnet URI for an infohash.
pub fn magnet_uri(hash: &str) -> String {
    format!("magnet:?xt=urn:btih:{}", hash.to_lowercase())
}
