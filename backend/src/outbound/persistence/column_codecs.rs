//! Conversions between column values and domain values.
//!
//! Encode helpers turn nested domain collections into JSONB and unsigned
//! counters into signed integers. Decode helpers reverse this and surface
//! malformed rows as [`RepositoryError::Query`] rather than panicking.

use std::fmt::Display;
use std::str::FromStr;

use pagination::PageRequest;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::ports::RepositoryError;

pub(super) fn to_json<T: Serialize + ?Sized>(
    value: &T,
    column: &str,
) -> Result<Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|err| RepositoryError::query(format!("encode {column}: {err}")))
}

pub(super) fn from_json<T: DeserializeOwned>(
    value: Value,
    column: &str,
) -> Result<T, RepositoryError> {
    serde_json::from_value(value)
        .map_err(|err| RepositoryError::query(format!("decode {column}: {err}")))
}

/// Parse a closed enumeration stored as its wire name.
pub(super) fn parse_text<T>(value: &str, column: &str) -> Result<T, RepositoryError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|err| RepositoryError::query(format!("decode {column}: {err}")))
}

pub(super) fn to_u32(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::query(format!("decode {column}: {value} out of range")))
}

pub(super) fn i32_to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::query(format!("decode {column}: {value} out of range")))
}

pub(super) fn u32_to_i32(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::query(format!("encode {column}: {value} out of range")))
}

pub(super) fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

/// `(offset, limit)` of a page request as SQL integers.
pub(super) fn page_window(page: PageRequest) -> (i64, i64) {
    (
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
        i64::from(page.limit()),
    )
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
pub(super) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.trim().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
