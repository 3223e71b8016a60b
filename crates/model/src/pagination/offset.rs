use crate::core::value::OffsetValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Resumable position of a polled stream.
///
/// An offset is an immutable snapshot: every operation that changes a field
/// returns a fresh value. Two fields carry meaning for boundary filtering:
///
/// * [`Offset::TIMESTAMP_KEY`] is the primary boundary value,
/// * [`Offset::KEY_KEY`] is the secondary identity used to break ties.
///
/// Any other field is free-form and only used for request templating.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset {
    fields: BTreeMap<String, OffsetValue>,
}

impl Offset {
    pub const KEY_KEY: &'static str = "key";
    pub const TIMESTAMP_KEY: &'static str = "timestamp";

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an offset out of plain string pairs, as found in configuration.
    pub fn from_strings<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), OffsetValue::String(v.into())))
            .collect()
    }

    /// Returns a copy of this offset with `key` set to `value`.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<OffsetValue>) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(key.into(), value.into());
        Self { fields }
    }

    /// Returns a copy of this offset with every field of `other` laid over it.
    pub fn merged(&self, other: &Offset) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { fields }
    }

    /// Returns a copy of this offset whose timestamp and key are those of
    /// `other`, absent ones included. Free-form fields are kept.
    pub fn with_boundary_of(&self, other: &Offset) -> Self {
        let mut fields = self.fields.clone();
        for key in [Self::TIMESTAMP_KEY, Self::KEY_KEY] {
            match other.fields.get(key) {
                Some(value) => {
                    fields.insert(key.to_string(), value.clone());
                }
                None => {
                    fields.remove(key);
                }
            }
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&OffsetValue> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The secondary identity of the last delivered record, rendered as text.
    pub fn key(&self) -> Option<String> {
        self.get(Self::KEY_KEY).map(ToString::to_string)
    }

    /// The primary boundary value exactly as stored.
    pub fn boundary(&self) -> Option<&OffsetValue> {
        self.get(Self::TIMESTAMP_KEY)
    }

    /// The primary boundary value interpreted as an instant.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.boundary().and_then(OffsetValue::as_timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OffsetValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, OffsetValue)> for Offset {
    fn from_iter<T: IntoIterator<Item = (String, OffsetValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (k, v)) in self.fields.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_field_leaves_original_untouched() {
        let original = Offset::from_strings([("k", "v")]);
        let next = original.with_field(Offset::KEY_KEY, "abc");

        assert_eq!(original.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(next.key().as_deref(), Some("abc"));
    }

    #[test]
    fn merged_prefers_other() {
        let base = Offset::from_strings([("a", "1"), ("b", "2")]);
        let over = Offset::empty().with_field("b", 3_i64);
        let merged = base.merged(&over);

        assert_eq!(merged.get("a"), Some(&OffsetValue::from("1")));
        assert_eq!(merged.get("b"), Some(&OffsetValue::Int(3)));
    }

    #[test]
    fn with_boundary_of_replaces_only_boundary_fields() {
        let moved = Offset::from_strings([("timestamp", "1"), ("key", "a"), ("cursor", "p3")]);
        let kept = Offset::from_strings([("timestamp", "2"), ("cursor", "p1")]);
        let guarded = moved.with_boundary_of(&kept);

        assert_eq!(guarded.boundary(), Some(&OffsetValue::from("2")));
        assert_eq!(guarded.key(), None);
        assert_eq!(guarded.get("cursor"), Some(&OffsetValue::from("p3")));
    }

    #[test]
    fn timestamp_accessor_parses_strings() {
        let offset = Offset::from_strings([(Offset::TIMESTAMP_KEY, "2020-01-01T00:00:00Z")]);
        assert_eq!(
            offset.timestamp().map(|ts| ts.timestamp()),
            Some(1_577_836_800)
        );
    }

    #[test]
    fn display_is_sorted() {
        let offset = Offset::from_strings([("b", "2"), ("a", "1")]);
        assert_eq!(offset.to_string(), "{a=1, b=2}");
    }
}
