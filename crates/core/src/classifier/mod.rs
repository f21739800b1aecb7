//! Release name classification.
//!
//! Extracts quality, codec, audio, source and HDR tags from free-text
//! release names. Each dimension runs an ordered list of checks where the
//! first match wins. Long unambiguous markers (`bluray`, `web-dl`) are
//! matched as substrings; short ones (`cam`, `ts`, `sd`, `hdr`) only as
//! standalone tokens so that `Camera` or `Wednesday` do not trigger them.

mod audio;
mod codec;
mod hdr;
mod quality;
mod source;

pub use audio::Audio;
pub use codec::Codec;
pub use hdr::Hdr;
pub use quality::Quality;
pub use source::Source;

use serde::{Deserialize, Serialize};

/// A release name prepared for matching.
#[derive(Debug, Clone)]
pub(crate) struct ReleaseText {
    lower: String,
    tokens: Vec<String>,
}

impl ReleaseText {
    pub(crate) fn new(title: &str) -> Self {
        let lower = title.to_lowercase();
        let tokens = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        Self { lower, tokens }
    }

    /// Case-insensitive substring match.
    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.lower.contains(needle)
    }

    pub(crate) fn contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.contains(n))
    }

    /// Match a whole delimiter-bounded token.
    pub(crate) fn has_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Match a token optionally followed by a channel count (`aac2`, `flac5`).
    pub(crate) fn has_channel_token(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| match t.strip_prefix(token) {
            Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
            None => false,
        })
    }

    pub(crate) fn has_any_token(&self, tokens: &[&str]) -> bool {
        tokens.iter().any(|t| self.has_token(t))
    }

    /// Copy of this text with the given tokens removed.
    pub(crate) fn without_tokens(&self, excluded: &[&str]) -> Self {
        let tokens: Vec<String> = self
            .tokens
            .iter()
            .filter(|t| !excluded.contains(&t.as_str()))
            .cloned()
            .collect();
        Self {
            lower: tokens.join("."),
            tokens,
        }
    }
}

/// All five tag dimensions for one release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseTags {
    pub quality: Quality,
    pub codec: Codec,
    pub audio: Audio,
    pub source: Source,
    pub hdr: Hdr,
}

/// Classify a release name along every dimension.
pub fn classify(title: &str) -> ReleaseTags {
    ReleaseTags {
        quality: Quality::parse(title),
        codec: Codec::parse(title),
        audio: Audio::parse(title),
        source: Source::parse(title),
        hdr: Hdr::parse(title),
    }
}
