use serde::{Deserialize, Serialize};

use super::ReleaseText;

/// Release source / rip type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Remux,
    Bluray,
    WebDl,
    Webrip,
    Hdrip,
    Hdtv,
    Screener,
    Dvdrip,
    Telesync,
    Cam,
    Unknown,
}

impl Source {
    pub fn parse(title: &str) -> Self {
        let text = ReleaseText::new(title);

        // WEBRip before WEB-DL: "WEB-Rip" also carries a standalone "web" token.
        if text.contains("remux") {
            Source::Remux
        } else if text.contains_any(&["bluray", "blu-ray", "bdrip", "brrip"]) {
            Source::Bluray
        } else if text.contains_any(&["webrip", "web-rip"]) {
            Source::Webrip
        } else if text.contains_any(&["web-dl", "webdl"]) || text.has_token("web") {
            Source::WebDl
        } else if text.contains("hdrip") {
            Source::Hdrip
        } else if text.contains("hdtv") {
            Source::Hdtv
        } else if text.contains_any(&["screener", "dvdscr"]) || text.has_token("scr") {
            Source::Screener
        } else if text.contains("dvdrip") || text.has_any_token(&["dvd", "dvd5", "dvd9"]) {
            Source::Dvdrip
        } else if text.contains_any(&["telesync", "hdts"]) || text.has_token("ts") {
            Source::Telesync
        } else if text.contains_any(&["camrip", "hdcam"]) || text.has_token("cam") {
            Source::Cam
        } else {
            Source::Unknown
        }
    }

    /// Ranking key, higher is better. Unknown sorts lowest.
    pub fn quality_tier(&self) -> u8 {
        match self {
            Source::Remux => 10,
            Source::Bluray => 9,
            Source::WebDl => 8,
            Source::Webrip => 7,
            Source::Hdrip => 6,
            Source::Hdtv => 5,
            Source::Dvdrip => 4,
            Source::Screener => 3,
            Source::Telesync => 2,
            Source::Cam => 1,
            Source::Unknown => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Remux => "Remux",
            Source::Bluray => "BluRay",
            Source::WebDl => "WEB-DL",
            Source::Webrip => "WEBRip",
            Source::Hdrip => "HDRip",
            Source::Hdtv => "HDTV",
            Source::Screener => "Screener",
            Source::Dvdrip => "DVDRip",
            Source::Telesync => "Telesync",
            Source::Cam => "CAM",
            Source::Unknown => "Unknown",
        }
    }
}
