use serde::{Deserialize, Serialize};

use super::ReleaseText;

/// Video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Av1,
    Hevc,
    Avc,
    Xvid,
    Unknown,
}

impl Codec {
    pub fn parse(title: &str) -> Self {
        let text = ReleaseText::new(title);

        if text.has_token("av1") {
            Codec::Av1
        } else if text.contains_any(&["x265", "h265", "h.265", "hevc"]) {
            Codec::Hevc
        } else if text.contains_any(&["x264", "h264", "h.264"]) || text.has_token("avc") {
            Codec::Avc
        } else if text.contains_any(&["xvid", "divx"]) {
            Codec::Xvid
        } else {
            Codec::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Codec::Av1 => "AV1",
            Codec::Hevc => "HEVC",
            Codec::Avc => "AVC",
            Codec::Xvid => "XviD",
            Codec::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codecs() {
        assert_eq!(Codec::parse("Movie.2024.1080p.AV1"), Codec::Av1);
        assert_eq!(Codec::parse("Movie.2024.1080p.x265"), Codec::Hevc);
        assert_eq!(Codec::parse("Movie.2024.1080p.H.265"), Codec::Hevc);
        assert_eq!(Codec::parse("Movie.2024.1080p.HEVC.10bit"), Codec::Hevc);
        assert_eq!(Codec::parse("Movie.2024.1080p.x264"), Codec::Avc);
        assert_eq!(Codec::parse("Movie.2024.1080p.AVC"), Codec::Avc);
        assert_eq!(Codec::parse("Movie.2004.DVDRip.XviD"), Codec::Xvid);
    }

    #[test]
    fn test_avc_requires_standalone_token() {
        assert_eq!(Codec::parse("The.Havc.Incident.2024"), Codec::Unknown);
        assert_eq!(Codec::parse("Advanced.Warfare.1080p"), Codec::Unknown);
    }
}
