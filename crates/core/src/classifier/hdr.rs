use serde::{Deserialize, Serialize};

use super::ReleaseText;

/// Dynamic range format of the video content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hdr {
    DolbyVision,
    Hdr10Plus,
    Hdr10,
    Hlg,
    Sdr,
}

impl Hdr {
    pub fn parse(title: &str) -> Self {
        let text = ReleaseText::new(title);
        // HDRip is a rip label, not HDR content.
        let content = text.without_tokens(&["hdrip"]);

        if content.contains_any(&["dolby.vision", "dolbyvision"])
            || content.has_any_token(&["dv", "dovi"])
        {
            Hdr::DolbyVision
        } else if text.contains_any(&["hdr10+", "hdr10plus"]) {
            Hdr::Hdr10Plus
        } else if content.contains("hdr10") || content.has_token("hdr") {
            Hdr::Hdr10
        } else if content.has_token("hlg") {
            Hdr::Hlg
        } else {
            Hdr::Sdr
        }
    }

    pub fn is_hdr(&self) -> bool {
        !matches!(self, Hdr::Sdr)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Hdr::DolbyVision => "Dolby Vision",
            Hdr::Hdr10Plus => "HDR10+",
            Hdr::Hdr10 => "HDR10",
            Hdr::Hlg => "HLG",
            Hdr::Sdr => "SDR",
        }
    }
}
