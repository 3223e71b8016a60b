use crate::filter::{RecordFilter, RecordFilterFactory};
use engine_config::registry::TieBreak;
use model::{core::value::OffsetValue, pagination::offset::Offset, records::record::Record};
use std::cmp::Ordering;

/// Admits records strictly past the offset boundary.
///
/// Records sharing the boundary value are resolved by the configured
/// tie-break: `none` drops them, `key` admits those whose key sorts after
/// the offset key.
#[derive(Debug, Clone, Copy)]
pub struct OffsetTimestampFilterFactory {
    tiebreak: TieBreak,
}

impl OffsetTimestampFilterFactory {
    pub fn new(tiebreak: TieBreak) -> Self {
        Self { tiebreak }
    }
}

impl RecordFilterFactory for OffsetTimestampFilterFactory {
    fn create(&self, offset: &Offset) -> Box<dyn RecordFilter> {
        Box::new(OffsetTimestampFilter {
            boundary: offset.boundary().cloned(),
            key: offset.key(),
            tiebreak: self.tiebreak,
        })
    }
}

struct OffsetTimestampFilter {
    boundary: Option<OffsetValue>,
    key: Option<String>,
    tiebreak: TieBreak,
}

impl RecordFilter for OffsetTimestampFilter {
    fn admits(&self, record: &Record) -> bool {
        let Some(boundary) = &self.boundary else {
            return true;
        };
        let Some(value) = record.boundary() else {
            return false;
        };

        match value.compare(boundary) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => match self.tiebreak {
                TieBreak::None => false,
                TieBreak::Key => match (&self.key, &record.key) {
                    (None, _) => true,
                    (Some(_), None) => false,
                    (Some(last), Some(key)) => compare_keys(key, last) == Ordering::Greater,
                },
            },
        }
    }

    fn furthest<'a>(&self, admitted: &'a [Record]) -> Option<&'a Record> {
        admitted.iter().max_by(|a, b| self.order(a, b))
    }

    fn is_behind(&self, offset: &Offset) -> bool {
        offset
            .boundary()
            .and_then(|value| self.position(value, offset.key().as_deref()))
            == Some(Ordering::Less)
    }
}

impl OffsetTimestampFilter {
    /// Orders a `(boundary, key)` position against this filter's boundary.
    /// Keys only count under the `key` tie-break.
    fn position(&self, value: &OffsetValue, key: Option<&str>) -> Option<Ordering> {
        let boundary = self.boundary.as_ref()?;
        Some(match value.compare(boundary) {
            Ordering::Equal => match (self.tiebreak, &self.key, key) {
                (TieBreak::Key, Some(last), Some(key)) => compare_keys(key, last),
                _ => Ordering::Equal,
            },
            other => other,
        })
    }

    /// Stream order of two records; equal records keep response order.
    fn order(&self, a: &Record, b: &Record) -> Ordering {
        match (a.boundary(), b.boundary()) {
            (Some(x), Some(y)) => x.compare(y).then_with(|| match (self.tiebreak, &a.key, &b.key) {
                (TieBreak::Key, Some(x), Some(y)) => compare_keys(x, y),
                _ => Ordering::Equal,
            }),
            (x, y) => x.is_some().cmp(&y.is_some()),
        }
    }
}

/// Integer keys compare numerically, anything else lexicographically.
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::retain_admitted;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn at(millis: i64, key: &str) -> Record {
        Record::new(json!({ "id": key }))
            .with_key(key)
            .with_timestamp(Utc.timestamp_millis_opt(millis).unwrap())
    }

    fn keys(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| format!("{}{}", r.timestamp.unwrap().timestamp_millis(), r.key.as_deref().unwrap()))
            .collect()
    }

    fn window() -> Vec<Record> {
        vec![
            at(100, "a"),
            at(100, "b"),
            at(100, "c"),
            at(101, "d"),
            at(102, "e"),
        ]
    }

    fn offset() -> Offset {
        Offset::empty()
            .with_field(Offset::TIMESTAMP_KEY, Utc.timestamp_millis_opt(100).unwrap())
            .with_field(Offset::KEY_KEY, "b")
    }

    #[test]
    fn key_tiebreak_admits_later_keys_at_boundary() {
        let filter = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&offset());
        let (admitted, dropped) = retain_admitted(filter.as_ref(), window());

        assert_eq!(keys(&admitted), vec!["100c", "101d", "102e"]);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn no_tiebreak_drops_boundary_records() {
        let filter = OffsetTimestampFilterFactory::new(TieBreak::None).create(&offset());
        let (admitted, _) = retain_admitted(filter.as_ref(), window());

        assert_eq!(keys(&admitted), vec!["101d", "102e"]);
    }

    #[test]
    fn offset_without_timestamp_admits_all() {
        let filter = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&Offset::empty());
        assert!(filter.admits(&Record::new(json!(null))));
        assert!(filter.admits(&at(1, "x")));
    }

    #[test]
    fn record_without_timestamp_is_dropped_once_a_boundary_exists() {
        let filter = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&offset());
        assert!(!filter.admits(&Record::new(json!(1)).with_key("z")));
    }

    #[test]
    fn boundary_from_configuration_string_is_understood() {
        let offset = Offset::from_strings([("timestamp", "1970-01-01T00:00:00.100Z"), ("key", "9")]);
        let filter = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&offset);

        assert!(!filter.admits(&at(100, "10").with_key("8")));
        assert!(filter.admits(&at(100, "10")));
        assert!(filter.admits(&at(101, "1")));
    }

    #[test]
    fn offsets_before_the_boundary_are_behind() {
        let keyed = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&offset());
        let at_boundary = |key: &str| offset().with_field(Offset::KEY_KEY, key);
        let earlier = offset().with_field(Offset::TIMESTAMP_KEY, Utc.timestamp_millis_opt(99).unwrap());

        assert!(keyed.is_behind(&earlier));
        assert!(keyed.is_behind(&at_boundary("a")));
        assert!(!keyed.is_behind(&at_boundary("b")));
        assert!(!keyed.is_behind(&at_boundary("c")));

        let unkeyed = OffsetTimestampFilterFactory::new(TieBreak::None).create(&offset());
        assert!(unkeyed.is_behind(&earlier));
        assert!(!unkeyed.is_behind(&at_boundary("a")));

        let open = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&Offset::empty());
        assert!(!open.is_behind(&earlier));
    }

    #[test]
    fn furthest_record_follows_boundary_then_key() {
        let keyed = OffsetTimestampFilterFactory::new(TieBreak::Key).create(&Offset::empty());
        let page = vec![at(101, "d"), at(100, "c"), at(101, "a")];
        assert_eq!(keyed.furthest(&page).and_then(|r| r.key.as_deref()), Some("d"));

        let unkeyed = OffsetTimestampFilterFactory::new(TieBreak::None).create(&Offset::empty());
        assert_eq!(unkeyed.furthest(&page).and_then(|r| r.key.as_deref()), Some("a"));
        assert!(unkeyed.furthest(&[]).is_none());
    }

    #[test]
    fn numeric_keys_compare_numerically() {
        assert_eq!(compare_keys("10", "9"), Ordering::Greater);
        assert_eq!(compare_keys("b", "ab"), Ordering::Greater);
    }
}
