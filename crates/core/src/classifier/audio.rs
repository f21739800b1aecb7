use serde::{Deserialize, Serialize};

use super::ReleaseText;

/// Audio format, ordered by detection priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audio {
    Atmos,
    DtsHdMa,
    TrueHd,
    Eac3,
    Dts,
    Ac3,
    Aac,
    Flac,
    Unknown,
}

impl Audio {
    pub fn parse(title: &str) -> Self {
        let text = ReleaseText::new(title);

        if text.has_token("atmos") {
            Audio::Atmos
        } else if text.contains_any(&["dts-hd", "dtshd", "dts.hd", "dts hd"]) {
            Audio::DtsHdMa
        } else if text.contains("truehd") {
            Audio::TrueHd
        } else if text.contains_any(&["eac3", "e-ac-3", "e-ac3", "dd+", "ddp5", "ddp2", "ddp7"])
            || text.has_token("ddp")
        {
            Audio::Eac3
        } else if text.has_token("dts") {
            Audio::Dts
        } else if text.contains_any(&["ac3", "dd5.1", "dd2.0", "dd7.1"]) || text.has_token("dd") {
            Audio::Ac3
        } else if text.has_channel_token("aac") {
            Audio::Aac
        } else if text.has_channel_token("flac") {
            Audio::Flac
        } else {
            Audio::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Audio::Atmos => "Atmos",
            Audio::DtsHdMa => "DTS-HD MA",
            Audio::TrueHd => "TrueHD",
            Audio::Eac3 => "E-AC3",
            Audio::Dts => "DTS",
            Audio::Ac3 => "AC3",
            Audio::Aac => "AAC",
            Audio::Flac => "FLAC",
            Audio::Unknown => "Unknown",
        }
    }
}
