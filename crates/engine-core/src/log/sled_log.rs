use crate::{error::LogError, log::LogSink};
use async_trait::async_trait;
use model::{
    pagination::offset::Offset,
    records::batch::{Batch, LogRecord},
};
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::path::Path;
use tracing::debug;

/// Log persisted in a sled tree.
///
/// Layout per topic and worker:
///
/// * `rec:<topic>:<worker>:<seq>` one entry per record, `seq` zero padded,
/// * `off:<topic>:<worker>` committed offset,
/// * `seq:<topic>:<worker>` next record sequence number,
/// * `bat:<topic>:<worker>` id of the last appended batch.
pub struct SledLog {
    db: sled::Db,
    topic: String,
}

impl SledLog {
    pub fn open(path: impl AsRef<Path>, topic: impl Into<String>) -> Result<Self, LogError> {
        let db = sled::open(path)?;
        Ok(Self {
            db,
            topic: topic.into(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[inline]
    fn rec_prefix(&self, worker: &str) -> String {
        format!("rec:{}:{}:", self.topic, worker)
    }

    #[inline]
    fn off_key(&self, worker: &str) -> String {
        format!("off:{}:{}", self.topic, worker)
    }

    #[inline]
    fn seq_key(&self, worker: &str) -> String {
        format!("seq:{}:{}", self.topic, worker)
    }

    #[inline]
    fn bat_key(&self, worker: &str) -> String {
        format!("bat:{}:{}", self.topic, worker)
    }

    /// Records appended by `worker`, in append order.
    pub fn records(&self, worker: &str) -> Result<Vec<LogRecord>, LogError> {
        let mut records = Vec::new();
        for item in self.db.scan_prefix(self.rec_prefix(worker)) {
            let (_key, value) = item?;
            records.push(bincode::deserialize(&value)?);
        }
        Ok(records)
    }

    /// Committed offsets of every worker that wrote to this topic.
    pub fn committed_offsets(&self) -> Result<Vec<(String, Offset)>, LogError> {
        let prefix = format!("off:{}:", self.topic);
        let mut offsets = Vec::new();
        for item in self.db.scan_prefix(&prefix) {
            let (key, value) = item?;
            let worker = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            offsets.push((worker, bincode::deserialize(&value)?));
        }
        Ok(offsets)
    }

    /// Forgets the committed offset of `worker`; records are kept.
    pub fn reset_offset(&self, worker: &str) -> Result<bool, LogError> {
        let removed = self.db.remove(self.off_key(worker))?.is_some();
        self.db.remove(self.bat_key(worker))?;
        self.db.flush()?;
        Ok(removed)
    }
}

#[async_trait]
impl LogSink for SledLog {
    async fn append(&self, worker: &str, batch: &Batch) -> Result<(), LogError> {
        let rec_prefix = self.rec_prefix(worker);
        let off_key = self.off_key(worker);
        let seq_key = self.seq_key(worker);
        let bat_key = self.bat_key(worker);

        let offset_bytes = bincode::serialize(&batch.next)?;
        let record_bytes = batch
            .records
            .iter()
            .map(bincode::serialize)
            .collect::<Result<Vec<_>, _>>()?;

        let result = self.db.transaction::<_, _, LogError>(|tx_db| {
            // A batch id is derived from its offsets, so seeing the same id
            // again means this exact window was already stored.
            if let Some(last) = tx_db.get(&bat_key)?
                && last.as_ref() == batch.id.as_bytes()
            {
                return Ok(false);
            }

            let mut seq = match tx_db.get(&seq_key)? {
                Some(bytes) => {
                    let raw: [u8; 8] = bytes.as_ref().try_into().map_err(|_| {
                        ConflictableTransactionError::Abort(LogError::Corrupt {
                            key: seq_key.clone(),
                        })
                    })?;
                    u64::from_be_bytes(raw)
                }
                None => 0,
            };

            for bytes in &record_bytes {
                tx_db.insert(format!("{rec_prefix}{seq:020}").as_bytes(), bytes.as_slice())?;
                seq += 1;
            }

            tx_db.insert(seq_key.as_bytes(), &seq.to_be_bytes()[..])?;
            tx_db.insert(off_key.as_bytes(), offset_bytes.as_slice())?;
            tx_db.insert(bat_key.as_bytes(), batch.id.as_bytes())?;
            Ok(true)
        });

        let stored = match result {
            Ok(stored) => stored,
            Err(TransactionError::Abort(e)) => return Err(e),
            Err(TransactionError::Storage(e)) => return Err(LogError::Storage(e)),
        };

        if stored {
            self.db.flush_async().await?;
            debug!(worker, batch_id = %batch.id, records = batch.records.len(), "Appended batch");
        } else {
            debug!(worker, batch_id = %batch.id, "Batch already appended, skipping");
        }

        Ok(())
    }

    async fn committed_offset(&self, worker: &str) -> Result<Offset, LogError> {
        match self.db.get(self.off_key(worker))? {
            Some(bytes) => Ok(bincode::deserialize(&bytes)?),
            None => Ok(Offset::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::OffsetValue;
    use tempfile::tempdir;

    fn record(value: &str) -> LogRecord {
        LogRecord {
            topic: "events".into(),
            key: Some(value.to_string()),
            value: value.as_bytes().to_vec(),
            timestamp: None,
        }
    }

    fn batch(id: &str, values: &[&str], next: Offset) -> Batch {
        Batch::new(
            id,
            values.iter().map(|v| record(v)).collect(),
            Offset::empty(),
            next,
        )
    }

    #[tokio::test]
    async fn empty_log_has_empty_offset() {
        let dir = tempdir().unwrap();
        let log = SledLog::open(dir.path(), "events").unwrap();

        assert!(log.committed_offset("worker-0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_stores_records_and_offset_together() {
        let dir = tempdir().unwrap();
        let log = SledLog::open(dir.path(), "events").unwrap();
        let next = Offset::empty().with_field("timestamp", 10_i64);

        log.append("worker-0", &batch("b1", &["a", "b"], next.clone()))
            .await
            .unwrap();
        log.append(
            "worker-0",
            &batch("b2", &["c"], next.with_field("timestamp", 11_i64)),
        )
        .await
        .unwrap();

        let values: Vec<_> = log
            .records("worker-0")
            .unwrap()
            .into_iter()
            .map(|r| String::from_utf8(r.value).unwrap())
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
        assert_eq!(
            log.committed_offset("worker-0").await.unwrap().get("timestamp"),
            Some(&OffsetValue::Int(11))
        );
    }

    #[tokio::test]
    async fn repeated_batch_is_not_duplicated() {
        let dir = tempdir().unwrap();
        let log = SledLog::open(dir.path(), "events").unwrap();
        let b = batch("same", &["a"], Offset::from_strings([("k", "1")]));

        log.append("worker-0", &b).await.unwrap();
        log.append("worker-0", &b).await.unwrap();

        assert_eq!(log.records("worker-0").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offsets_survive_reopen_and_are_per_worker() {
        let dir = tempdir().unwrap();
        {
            let log = SledLog::open(dir.path(), "events").unwrap();
            log.append("worker-0", &batch("b1", &["a"], Offset::from_strings([("k", "0")])))
                .await
                .unwrap();
            log.append("worker-1", &batch("b1", &["b"], Offset::from_strings([("k", "1")])))
                .await
                .unwrap();
        }

        let log = SledLog::open(dir.path(), "events").unwrap();
        assert_eq!(
            log.committed_offset("worker-1").await.unwrap().get("k"),
            Some(&OffsetValue::from("1"))
        );
        assert_eq!(log.committed_offsets().unwrap().len(), 2);

        assert!(log.reset_offset("worker-0").unwrap());
        assert!(log.committed_offset("worker-0").await.unwrap().is_empty());
        assert_eq!(log.records("worker-0").unwrap().len(), 1);
    }
}
