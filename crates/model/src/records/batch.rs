use crate::pagination::offset::Offset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record in the shape the downstream log stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub topic: String,
    pub key: Option<String>,
    pub value: Vec<u8>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl LogRecord {
    pub fn size_bytes(&self) -> usize {
        self.value.len() + self.key.as_ref().map_or(0, String::len)
    }
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub records: Vec<LogRecord>, // already filtered and mapped
    pub cursor: Offset,          // offset the iteration started from
    pub next: Offset,            // offset to commit with this batch
    pub manifest: Manifest,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub record_count: usize,
    pub byte_count: usize,
}

pub fn manifest_for(records: &[LogRecord]) -> Manifest {
    Manifest {
        record_count: records.len(),
        byte_count: records.iter().map(LogRecord::size_bytes).sum(),
    }
}

impl Batch {
    pub fn new(id: impl Into<String>, records: Vec<LogRecord>, cursor: Offset, next: Offset) -> Self {
        let manifest = manifest_for(&records);
        Batch {
            id: id.into(),
            records,
            cursor,
            next,
            manifest,
            ts: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.manifest.byte_count
    }
}
