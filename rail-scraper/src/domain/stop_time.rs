//! Stop time normalization.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

/// A stop time as the upstream (or an older cache file) may encode it.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawStopTime {
    Text(String),
    Parts {
        hour: u32,
        minute: u32,
        #[serde(default)]
        second: u32,
    },
}

impl RawStopTime {
    /// Normalize to `HH:MM:SS`.
    ///
    /// Text that is neither a time of day nor an ISO datetime is kept
    /// verbatim rather than dropped.
    pub fn normalize(self) -> String {
        match self {
            RawStopTime::Parts {
                hour,
                minute,
                second,
            } => format!("{hour:02}:{minute:02}:{second:02}"),
            RawStopTime::Text(text) => normalize_text(text),
        }
    }
}

fn normalize_text(text: String) -> String {
    let trimmed = text.trim();

    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
            return t.format("%H:%M:%S").to_string();
        }
    }

    if let Ok(dt) = trimmed.parse::<NaiveDateTime>() {
        return dt.time().format("%H:%M:%S").to_string();
    }

    // Offsets such as "+02:00" follow the seconds in full ISO timestamps.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return dt.time().format("%H:%M:%S").to_string();
    }

    text
}

pub(crate) fn deserialize_stop_time<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawStopTime>::deserialize(deserializer)?;
    Ok(raw.map(RawStopTime::normalize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parts_are_zero_padded() {
        let t = RawStopTime::Parts {
            hour: 7,
            minute: 3,
            second: 9,
        };
        assert_eq!(t.normalize(), "07:03:09");
    }

    #[test]
    fn iso_datetimes_keep_time_of_day() {
        let t = RawStopTime::Text("2025-06-02T08:15:00".to_string());
        assert_eq!(t.normalize(), "08:15:00");

        let t = RawStopTime::Text("2025-06-02T08:15:30+02:00".to_string());
        assert_eq!(t.normalize(), "08:15:30");
    }

    #[test]
    fn unknown_text_is_kept() {
        let t = RawStopTime::Text("po 24:00".to_string());
        assert_eq!(t.normalize(), "po 24:00");
    }
}
