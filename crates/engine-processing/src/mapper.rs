use crate::error::MapperError;
use chrono::SecondsFormat;
use model::records::{batch::LogRecord, record::Record};
use serde_json::{Map, Value, json};

/// Converts an admitted record into what the log stores.
pub trait RecordMapper: Send + Sync {
    fn map(&self, record: &Record) -> Result<LogRecord, MapperError>;
}

/// Wraps each record in a JSON envelope carrying its key, timestamp and
/// offset next to the original value.
#[derive(Debug, Clone)]
pub struct SchemedRecordMapper {
    topic: String,
}

impl SchemedRecordMapper {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

impl RecordMapper for SchemedRecordMapper {
    fn map(&self, record: &Record) -> Result<LogRecord, MapperError> {
        let offset: Map<String, Value> = record
            .offset
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();

        let envelope = json!({
            "key": record.key,
            "timestamp": record
                .timestamp
                .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            "offset": offset,
            "value": record.value,
        });

        Ok(LogRecord {
            topic: self.topic.clone(),
            key: record.key.clone(),
            value: serde_json::to_vec(&envelope)?,
            timestamp: record.timestamp,
        })
    }
}

/// Stores the key as is and the value as text: strings verbatim, anything
/// else as compact JSON. A `null` value has no text form and is rejected.
#[derive(Debug, Clone)]
pub struct StringKvRecordMapper {
    topic: String,
}

impl StringKvRecordMapper {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

impl RecordMapper for StringKvRecordMapper {
    fn map(&self, record: &Record) -> Result<LogRecord, MapperError> {
        let value = match &record.value {
            Value::Null => {
                return Err(MapperError::Invalid(format!(
                    "record {} has a null value",
                    record.key.as_deref().unwrap_or("<unkeyed>")
                )));
            }
            Value::String(s) => s.clone().into_bytes(),
            other => serde_json::to_vec(other)?,
        };

        Ok(LogRecord {
            topic: self.topic.clone(),
            key: record.key.clone(),
            value,
            timestamp: record.timestamp,
        })
    }
}
