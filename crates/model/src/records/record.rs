use crate::{core::value::OffsetValue, pagination::offset::Offset};
use chrono::{DateTime, Utc};

/// A single logical item extracted from an HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: Option<String>,
    pub value: serde_json::Value,
    pub timestamp: Option<DateTime<Utc>>,
    /// The position this record represents once delivered.
    pub offset: Offset,
}

impl Record {
    pub fn new(value: serde_json::Value) -> Self {
        Record {
            key: None,
            value,
            timestamp: None,
            offset: Offset::empty(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.offset = self.offset.with_field(Offset::KEY_KEY, key.clone());
        self.key = Some(key);
        self
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.offset = self.offset.with_field(Offset::TIMESTAMP_KEY, ts);
        self.timestamp = Some(ts);
        self
    }

    pub fn with_offset_field(mut self, key: impl Into<String>, value: impl Into<OffsetValue>) -> Self {
        self.offset = self.offset.with_field(key, value);
        self
    }

    /// Primary boundary value carried by this record.
    pub fn boundary(&self) -> Option<&OffsetValue> {
        self.offset.boundary()
    }
}
