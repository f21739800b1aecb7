use serde::{Deserialize, Serialize};

use super::ReleaseText;

/// Video resolution class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Uhd4k,
    FullHd,
    Hd,
    Sd,
    Unknown,
}

impl Quality {
    pub fn parse(title: &str) -> Self {
        let text = ReleaseText::new(title);

        if text.contains("2160p") || text.has_any_token(&["4k", "uhd"]) {
            Quality::Uhd4k
        } else if text.contains_any(&["1080p", "1080i"]) {
            Quality::FullHd
        } else if text.contains("720p") {
            Quality::Hd
        } else if text.contains_any(&["480p", "576p"]) || text.has_token("sd") {
            Quality::Sd
        } else {
            Quality::Unknown
        }
    }

    /// Ranking key, higher is better. Unknown sorts lowest.
    pub fn sort_order(&self) -> u8 {
        match self {
            Quality::Uhd4k => 4,
            Quality::FullHd => 3,
            Quality::Hd => 2,
            Quality::Sd => 1,
            Quality::Unknown => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4K",
            Quality::FullHd => "1080p",
            Quality::Hd => "720p",
            Quality::Sd => "SD",
            Quality::Unknown => "Unknown",
        }
    }
}
