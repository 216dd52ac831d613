//! Lenient parsing of upstream numeric identifiers.
//!
//! Older cache files store the same id as `61358`, `"61358"` or `61358.0`
//! depending on which tool wrote them. All of these map to one canonical
//! integer.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, Visitor};

/// Parse a numeric id from its textual form.
///
/// Accepts surrounding whitespace, leading zeros, a leading `+`, and a float
/// spelling with an all-zero fractional part. Returns `None` for anything
/// else, including negative numbers.
///
/// # Examples
///
/// ```
/// use rail_scraper::domain::parse_numeric_id;
///
/// assert_eq!(parse_numeric_id("61358"), Some(61358));
/// assert_eq!(parse_numeric_id(" 061358 "), Some(61358));
/// assert_eq!(parse_numeric_id("61358.0"), Some(61358));
/// assert_eq!(parse_numeric_id("61358.5"), None);
/// assert_eq!(parse_numeric_id("abc"), None);
/// ```
pub fn parse_numeric_id(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(frac) = frac_part
        && !frac.bytes().all(|b| b == b'0')
    {
        return None;
    }

    int_part.parse().ok()
}

struct NumericIdVisitor<T>(PhantomData<T>);

impl<T: From<u64>> Visitor<'_> for NumericIdVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer id or its decimal string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        Ok(T::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        u64::try_from(v)
            .map(T::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<T, E> {
        if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
            Ok(T::from(v as u64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        parse_numeric_id(v)
            .map(T::from)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Deserialize an id that may be encoded as an integer, float, or string.
pub(crate) fn deserialize_numeric_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<u64>,
{
    deserializer.deserialize_any(NumericIdVisitor(PhantomData))
}
