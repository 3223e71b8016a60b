use model::{pagination::offset::Offset, records::record::Record};

pub mod timestamp;

pub use timestamp::OffsetTimestampFilterFactory;

/// Decides which parsed records are new with respect to an offset.
pub trait RecordFilter: Send {
    fn admits(&self, record: &Record) -> bool;

    /// The admitted record furthest along the stream, which the next offset
    /// follows. Without an ordering of its own that is the last one.
    fn furthest<'a>(&self, admitted: &'a [Record]) -> Option<&'a Record> {
        admitted.last()
    }

    /// Whether `offset` lies before the boundary this filter was built from.
    fn is_behind(&self, _offset: &Offset) -> bool {
        false
    }
}

/// Builds a filter from the offset an iteration started from. Filters are
/// pure functions of that offset and the record.
pub trait RecordFilterFactory: Send + Sync {
    fn create(&self, offset: &Offset) -> Box<dyn RecordFilter>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFilterFactory;

struct Passthrough;

impl RecordFilter for Passthrough {
    fn admits(&self, _record: &Record) -> bool {
        true
    }
}

impl RecordFilterFactory for PassthroughFilterFactory {
    fn create(&self, _offset: &Offset) -> Box<dyn RecordFilter> {
        Box::new(Passthrough)
    }
}

/// Keeps the admitted records, in order, and returns how many were dropped.
pub fn retain_admitted(filter: &dyn RecordFilter, records: Vec<Record>) -> (Vec<Record>, usize) {
    let total = records.len();
    let admitted: Vec<Record> = records.into_iter().filter(|r| filter.admits(r)).collect();
    let dropped = total - admitted.len();
    (admitted, dropped)
}
