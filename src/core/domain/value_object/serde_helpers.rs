//! Serde helpers for custom (de)serialization.

use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Serialization for `Option<SystemTime>` as seconds since UNIX epoch (or `null`).
pub mod optional_system_time {
    use super::*;

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(time) => {
                let duration = time
                    .duration_since(UNIX_EPOCH)
                    .map_err(|_| serde::ser::Error::custom("SystemTime before UNIX epoch"))?;
                serializer.serialize_u64(duration.as_secs())
            }
            None => serializer.serialize_none(),
        }
    }
}

/// Converts epoch seconds into a `SystemTime`; zero or negative means unset.
pub(crate) fn epoch(secs: Option<u64>) -> Option<SystemTime> {
    secs.filter(|s| *s > 0)
        .map(|s| UNIX_EPOCH + Duration::from_secs(s))
}

/// Tolerant field deserializers for raw API records.
///
/// Proxmox reports the same field as a number, a numeric string or a
/// 0/1 flag depending on the endpoint and version. None of these ever fail:
/// a value of the wrong shape deserializes as `None`.
pub mod lenient {
    use super::*;

    /// Reads a finite number from a number, numeric string or boolean.
    pub(crate) fn number(value: &Value) -> Option<f64> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }?;
        n.is_finite().then_some(n)
    }

    pub(crate) fn flag(value: &Value) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "0" | "false" | "no" | "off" | "" => Some(false),
                _ => None,
            },
            other => number(other).map(|n| n != 0.0),
        }
    }

    pub(crate) fn text(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Splits a list given either as a JSON array or a delimited string.
    pub(crate) fn items(value: &Value) -> Vec<String> {
        match value {
            Value::Array(items) => items.iter().filter_map(text).collect(),
            Value::String(s) => s
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(&Value::deserialize(deserializer)?))
    }

    /// Non-negative integers; fractions are truncated.
    pub fn u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(&Value::deserialize(deserializer)?)
            .filter(|n| *n >= 0.0)
            .map(|n| n as u64))
    }

    pub fn u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(u64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
    }

    pub fn bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(flag(&Value::deserialize(deserializer)?))
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text(&Value::deserialize(deserializer)?).filter(|s| !s.trim().is_empty()))
    }

    pub fn list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(items(&Value::deserialize(deserializer)?))
    }
}
