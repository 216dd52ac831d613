//! Key normalization for loaded collections.
//!
//! A cache file maps id strings to objects. The same id may appear under
//! several spellings when files written by different tools are mixed, and
//! some legacy entries omit the id inside the object. Every entry is keyed
//! by the id inside the object; the map key only fills it in when missing.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::{Station, StationId, Train, TrainId, parse_numeric_id};

/// An entry that carries its own canonical id.
pub(crate) trait Keyed: DeserializeOwned {
    type Id: Ord + Copy + std::fmt::Display;

    /// Name of the id field inside the JSON object.
    const ID_FIELD: &'static str;

    fn id(&self) -> Self::Id;

    /// Whether `self` should replace `existing` when both share an id.
    fn supersedes(&self, _existing: &Self) -> bool {
        false
    }
}

impl Keyed for Station {
    type Id = StationId;
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> StationId {
        self.id
    }
}

impl Keyed for Train {
    type Id = TrainId;
    const ID_FIELD: &'static str = "train_id";

    fn id(&self) -> TrainId {
        self.train_id
    }

    /// A full route always wins over a stub.
    fn supersedes(&self, existing: &Self) -> bool {
        existing.is_stub() && !self.is_stub()
    }
}

/// Counts from one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Entries kept in the output.
    pub kept: usize,
    /// Entries merged into another entry with the same canonical id.
    pub duplicates: usize,
    /// Entries dropped because no id could be determined or they did not parse.
    pub dropped: usize,
}

/// Normalize raw `key -> object` entries into a map keyed by canonical id.
pub(crate) fn normalize<T: Keyed>(
    raw: BTreeMap<String, serde_json::Value>,
) -> (BTreeMap<T::Id, T>, NormalizeStats) {
    let mut out: BTreeMap<T::Id, T> = BTreeMap::new();
    let mut stats = NormalizeStats::default();

    for (key, mut value) in raw {
        if let serde_json::Value::Object(fields) = &mut value {
            let has_id = fields.get(T::ID_FIELD).is_some_and(|v| !v.is_null());
            if !has_id && let Some(id) = parse_numeric_id(&key) {
                fields.insert(T::ID_FIELD.to_string(), id.into());
            }
        }

        let entry: T = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping unreadable cache entry");
                stats.dropped += 1;
                continue;
            }
        };

        let id = entry.id();
        if parse_numeric_id(&key).is_some_and(|k| k.to_string() != id.to_string()) {
            warn!(key = %key, id = %id, "Cache key disagrees with entry id, using entry id");
        }

        match out.get(&id) {
            Some(existing) => {
                stats.duplicates += 1;
                if entry.supersedes(existing) {
                    out.insert(id, entry);
                }
            }
            None => {
                out.insert(id, entry);
            }
        }
    }

    stats.kept = out.len();
    (out, stats)
}
