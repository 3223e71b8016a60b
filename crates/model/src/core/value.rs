use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

/// A scalar stored in an offset field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum OffsetValue {
    String(String),
    Int(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(DateTime<Utc>),
}

impl OffsetValue {
    /// Converts a JSON node into an offset value.
    ///
    /// `null` has no offset representation; arrays and objects are kept
    /// as their serialized JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(OffsetValue::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(OffsetValue::Int(i)),
                None => n.as_f64().map(OffsetValue::Float),
            },
            serde_json::Value::String(s) => Some(OffsetValue::String(s.clone())),
            other => Some(OffsetValue::String(other.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OffsetValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            OffsetValue::Int(i) => Some(*i),
            OffsetValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            OffsetValue::Int(i) => Some(*i as f64),
            OffsetValue::Float(f) => Some(*f),
            OffsetValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interprets the value as an instant.
    ///
    /// Integers are epoch milliseconds, strings are RFC 3339.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            OffsetValue::Timestamp(ts) => Some(*ts),
            OffsetValue::Int(millis) => Utc.timestamp_millis_opt(*millis).single(),
            OffsetValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Total ordering used for boundary comparisons.
    ///
    /// When either side is a timestamp both sides are compared as instants,
    /// numbers compare numerically, and anything else falls back to the
    /// rendered string.
    pub fn compare(&self, other: &OffsetValue) -> Ordering {
        use OffsetValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (Timestamp(_), _) | (_, Timestamp(_)) => {
                match (self.as_timestamp(), other.as_timestamp()) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => self.to_string().cmp(&other.to_string()),
                }
            }
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self.to_string().cmp(&other.to_string()),
            },
        }
    }
}

impl fmt::Display for OffsetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetValue::String(s) => write!(f, "{s}"),
            OffsetValue::Int(i) => write!(f, "{i}"),
            OffsetValue::Float(v) => write!(f, "{v}"),
            OffsetValue::Boolean(b) => write!(f, "{b}"),
            OffsetValue::Timestamp(ts) => {
                write!(f, "{}", ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

impl From<&str> for OffsetValue {
    fn from(value: &str) -> Self {
        OffsetValue::String(value.to_string())
    }
}

impl From<String> for OffsetValue {
    fn from(value: String) -> Self {
        OffsetValue::String(value)
    }
}

impl From<i64> for OffsetValue {
    fn from(value: i64) -> Self {
        OffsetValue::Int(value)
    }
}

impl From<f64> for OffsetValue {
    fn from(value: f64) -> Self {
        OffsetValue::Float(value)
    }
}

impl From<bool> for OffsetValue {
    fn from(value: bool) -> Self {
        OffsetValue::Boolean(value)
    }
}

impl From<DateTime<Utc>> for OffsetValue {
    fn from(value: DateTime<Utc>) -> Self {
        OffsetValue::Timestamp(value)
    }
}
