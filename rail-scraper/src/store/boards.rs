//! Cached departure boards.
//!
//! A board records which trains a station's departure list named on one
//! date. With the board cached and every named train cache-resident, a
//! station/date pair can be resolved without any request.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::domain::{StationId, TrainId, parse_numeric_id};

use super::keys::NormalizeStats;

/// Identifies one departure board: a station on a date.
///
/// Written as `"<station>@<YYYY-MM-DD>"` when used as a JSON key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct BoardKey {
    pub station: StationId,
    pub date: NaiveDate,
}

impl BoardKey {
    pub fn new(station: StationId, date: NaiveDate) -> Self {
        Self { station, date }
    }
}

impl fmt::Display for BoardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.station, self.date.format("%Y-%m-%d"))
    }
}

/// Error returned when parsing a malformed board key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid board key {0:?}")]
pub struct InvalidBoardKey(String);

impl FromStr for BoardKey {
    type Err = InvalidBoardKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidBoardKey(s.to_string());
        let (station, date) = s.split_once('@').ok_or_else(invalid)?;
        let station = parse_numeric_id(station).ok_or_else(invalid)?;
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
        Ok(BoardKey::new(StationId::new(station), date))
    }
}

impl Serialize for BoardKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BoardKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

pub type BoardMap = BTreeMap<BoardKey, Vec<TrainId>>;

/// Parse raw board entries, dropping malformed ones and merging duplicate
/// spellings of the same key.
pub(crate) fn normalize_boards(
    raw: BTreeMap<String, serde_json::Value>,
) -> (BoardMap, NormalizeStats) {
    let mut out = BoardMap::new();
    let mut stats = NormalizeStats::default();

    for (key, value) in raw {
        let parsed = key
            .parse::<BoardKey>()
            .map_err(|e| e.to_string())
            .and_then(|k| {
                serde_json::from_value::<Vec<TrainId>>(value)
                    .map(|ids| (k, ids))
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok((board, ids)) => {
                if out.contains_key(&board) {
                    stats.duplicates += 1;
                } else {
                    out.insert(board, ids);
                }
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping unreadable board entry");
                stats.dropped += 1;
            }
        }
    }

    stats.kept = out.len();
    (out, stats)
}
