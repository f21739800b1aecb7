//! Lenient JSON field helpers for third-party APIs that mix strings and numbers.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Unsigned(u64),
    Float(f64),
    Text(String),
}

/// Accept `123`, `123.0`, `"123"`, `null` or a missing field; anything unparseable is 0.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Unsigned(n)) => n,
        Some(NumberOrString::Float(f)) if f > 0.0 => f as u64,
        Some(NumberOrString::Float(_)) => 0,
        Some(NumberOrString::Text(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

/// `lenient_u64` clamped to `u32`.
pub(crate) fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_u64(deserializer).map(|n| n.min(u32::MAX as u64) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_u64")]
        size: u64,
        #[serde(default, deserialize_with = "lenient_u32")]
        seeders: u32,
    }

    #[test]
    fn test_lenient_numbers() {
        let row: Row = serde_json::from_str(r#"{"size": "1048576", "seeders": 12}"#).unwrap();
        assert_eq!(row.size, 1_048_576);
        assert_eq!(row.seeders, 12);

        let row: Row = serde_json::from_str(r#"{"size": null, "seeders": -3}"#).unwrap();
        assert_eq!(row.size, 0);
        assert_eq!(row.seeders, 0);

        let row: Row = serde_json::from_str(r#"{"seeders": "n/a"}"#).unwrap();
        assert_eq!(row.size, 0);
        assert_eq!(row.seeders, 0);
    }
}
