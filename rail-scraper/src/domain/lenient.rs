//! Tolerant field decoding for cache files written by other tools.
//!
//! Older files keep raw API values: labels may be numbers, and absent
//! values may be written as `null` instead of being left out.

use serde::{Deserialize, Deserializer};

/// A platform or track label. Sent as text ("IV") or as a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawLabel {
    Text(String),
    Number(i64),
}

impl RawLabel {
    pub fn into_string(self) -> String {
        match self {
            RawLabel::Text(s) => s,
            RawLabel::Number(n) => n.to_string(),
        }
    }
}

/// Decode an optional label, accepting text or a number.
pub(crate) fn deserialize_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawLabel>::deserialize(deserializer)?;
    Ok(raw.map(RawLabel::into_string))
}

/// Decode a value, treating `null` like a missing field.
pub(crate) fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "deserialize_label")]
        track: Option<String>,
        #[serde(default, deserialize_with = "deserialize_null_default")]
        name: String,
        #[serde(default, deserialize_with = "deserialize_null_default")]
        stops: Vec<u32>,
    }

    #[test]
    fn labels_accept_text_and_numbers() {
        let row: Row = serde_json::from_str(r#"{"track": 7}"#).unwrap();
        assert_eq!(row.track.as_deref(), Some("7"));

        let row: Row = serde_json::from_str(r#"{"track": "IV"}"#).unwrap();
        assert_eq!(row.track.as_deref(), Some("IV"));

        let row: Row = serde_json::from_str(r#"{"track": null}"#).unwrap();
        assert_eq!(row.track, None);
    }

    #[test]
    fn null_reads_as_default() {
        let row: Row = serde_json::from_str(r#"{"name": null, "stops": null}"#).unwrap();
        assert_eq!(row.name, "");
        assert!(row.stops.is_empty());

        let row: Row = serde_json::from_str(r#"{"name": "Sukiennice", "stops": [1]}"#).unwrap();
        assert_eq!(row.name, "Sukiennice");
        assert_eq!(row.stops, vec![1]);
    }
}
