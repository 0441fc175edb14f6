//! Deserializers for optional query-string values.
//!
//! Filter structs flatten [`PaginationParams`](crate::PaginationParams), which makes
//! serde buffer every value as a string. These helpers parse those strings and
//! treat empty values (`?classroom_id=`) as absent.
//!
//! [`deserialize_nullable`] is for JSON update bodies, where an absent field
//! and an explicit `null` mean different things.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| {
        let trimmed = s.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }))
}

pub fn deserialize_optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(deserializer)?
        .map(|s| Uuid::parse_str(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Accepts `YYYY-MM-DD`.
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(deserializer)?
        .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(serde::de::Error::custom))
        .transpose()
}

/// Accepts `true`/`false`/`1`/`0`.
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match non_empty(deserializer)?.as_deref() {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid boolean: {}",
            other
        ))),
    }
}

/// Parses any `FromStr` value, e.g. the status enums used as filters.
pub fn deserialize_optional_parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    non_empty(deserializer)?
        .map(|s| s.parse::<T>().map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(deserializer)
}

/// Absent field: `None` (with `#[serde(default)]`). `null`: `Some(None)`.
/// A value: `Some(Some(value))`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Filters {
        #[serde(default, deserialize_with = "deserialize_optional_uuid")]
        id: Option<Uuid>,
        #[serde(default, deserialize_with = "deserialize_optional_date")]
        from: Option<NaiveDate>,
        #[serde(default, deserialize_with = "deserialize_optional_bool")]
        upcoming: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_optional_string")]
        search: Option<String>,
        #[serde(default, deserialize_with = "deserialize_optional_parsed")]
        count: Option<u32>,
    }

    #[test]
    fn test_empty_values_are_none() {
        let f: Filters =
            serde_json::from_str(r#"{"id":"","from":"","upcoming":"","search":"  "}"#).unwrap();
        assert!(f.id.is_none());
        assert!(f.from.is_none());
        assert!(f.upcoming.is_none());
        assert!(f.search.is_none());
    }

    #[test]
    fn test_missing_values_are_none() {
        let f: Filters = serde_json::from_str("{}").unwrap();
        assert!(f.id.is_none() && f.from.is_none() && f.upcoming.is_none());
    }

    #[test]
    fn test_values_are_parsed() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"id":"{}","from":"2024-09-02","upcoming":"true","search":" Ada "}}"#,
            id
        );
        let f: Filters = serde_json::from_str(&json).unwrap();
        assert_eq!(f.id, Some(id));
        assert_eq!(f.from, NaiveDate::from_ymd_opt(2024, 9, 2));
        assert_eq!(f.upcoming, Some(true));
        assert_eq!(f.search.as_deref(), Some("Ada"));
        assert_eq!(f.count, None);

        let f: Filters = serde_json::from_str(r#"{"count":"7"}"#).unwrap();
        assert_eq!(f.count, Some(7));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(serde_json::from_str::<Filters>(r#"{"id":"nope"}"#).is_err());
        assert!(serde_json::from_str::<Filters>(r#"{"from":"02/09/2024"}"#).is_err());
        assert!(serde_json::from_str::<Filters>(r#"{"upcoming":"maybe"}"#).is_err());
        assert!(serde_json::from_str::<Filters>(r#"{"count":"-1"}"#).is_err());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "deserialize_nullable")]
        parent_id: Option<Option<Uuid>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_from_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.parent_id, None);

        let cleared: Patch = serde_json::from_str(r#"{"parent_id":null}"#).unwrap();
        assert_eq!(cleared.parent_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"parent_id":"{}"}}"#, id)).unwrap();
        assert_eq!(set.parent_id, Some(Some(id)));
    }
}
