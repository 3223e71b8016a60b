use crate::{
    error::ParseError,
    http::response::{HttpResponseParser, ParsedResponse},
};
use chrono::{DateTime, TimeZone, Utc};
use model::{
    core::value::OffsetValue, http::response::HttpResponse, pagination::offset::Offset,
    records::record::Record,
};
use serde_json::Value;
use tracing::debug;

const KEY_SEPARATOR: &str = "+";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonParserConfig {
    /// Selects the list of items; an object is treated as a single item.
    pub list_pointer: String,
    /// Selects the record value inside each item.
    pub record_pointer: String,
    /// Joined with `+` to build the record key. Empty means hashed keys.
    pub key_pointers: Vec<String>,
    pub timestamp_pointer: Option<String>,
    /// `(offset field, pointer)` pairs copied into each record offset.
    pub offset_pointers: Vec<(String, String)>,
    /// `(offset field, header name)` pairs read from the response headers.
    pub offset_headers: Vec<(String, String)>,
}

impl Default for JsonParserConfig {
    fn default() -> Self {
        Self {
            list_pointer: "/".to_string(),
            record_pointer: "/".to_string(),
            key_pointers: Vec::new(),
            timestamp_pointer: None,
            offset_pointers: Vec::new(),
            offset_headers: Vec::new(),
        }
    }
}

pub struct JsonResponseParser {
    config: JsonParserConfig,
}

impl JsonResponseParser {
    pub fn new(config: JsonParserConfig) -> Self {
        Self { config }
    }

    fn items<'a>(&self, body: &'a Value) -> Result<Vec<&'a Value>, ParseError> {
        match select(body, &self.config.list_pointer)? {
            Value::Array(items) => Ok(items.iter().collect()),
            Value::Null => Ok(Vec::new()),
            item => Ok(vec![item]),
        }
    }

    fn record(&self, item: &Value) -> Result<Record, ParseError> {
        let value = select(item, &self.config.record_pointer)?.clone();

        let key = if self.config.key_pointers.is_empty() {
            blake3::hash(value.to_string().as_bytes()).to_hex().to_string()
        } else {
            self.config
                .key_pointers
                .iter()
                .map(|pointer| select(item, pointer).map(render))
                .collect::<Result<Vec<_>, _>>()?
                .join(KEY_SEPARATOR)
        };

        let mut record = Record::new(value).with_key(key);

        if let Some(pointer) = &self.config.timestamp_pointer {
            record = record.with_timestamp(parse_timestamp(select(item, pointer)?)?);
        }

        for (field, pointer) in &self.config.offset_pointers {
            if let Some(value) = OffsetValue::from_json(select(item, pointer)?) {
                record = record.with_offset_field(field.as_str(), value);
            }
        }

        Ok(record)
    }

    fn header_offset(&self, response: &HttpResponse) -> Offset {
        self.config
            .offset_headers
            .iter()
            .filter_map(|(field, header)| {
                response
                    .headers
                    .get(header)
                    .map(|value| (field.clone(), OffsetValue::from(value)))
            })
            .collect()
    }
}

impl HttpResponseParser for JsonResponseParser {
    fn parse(&self, response: &HttpResponse) -> Result<ParsedResponse, ParseError> {
        let header_offset = self.header_offset(response);

        let records = if response.body.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            let body: Value = serde_json::from_slice(&response.body)
                .map_err(|err| ParseError::InvalidBody(err.to_string()))?;
            self.items(&body)?
                .into_iter()
                .map(|item| self.record(item))
                .collect::<Result<Vec<_>, _>>()?
        };

        debug!(records = records.len(), headers = %header_offset, "Parsed response");

        Ok(ParsedResponse {
            records,
            header_offset,
        })
    }
}

/// Resolves a JSON pointer; `/` and the empty string select the whole node.
fn select<'a>(node: &'a Value, pointer: &str) -> Result<&'a Value, ParseError> {
    let pointer = pointer.trim();
    if pointer.is_empty() || pointer == "/" {
        return Ok(node);
    }
    node.pointer(pointer).ok_or_else(|| ParseError::PointerNotFound {
        pointer: pointer.to_string(),
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ParseError> {
    let invalid = || ParseError::InvalidTimestamp {
        value: render(value),
    };

    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .ok_or_else(invalid),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                s.parse::<i64>()
                    .ok()
                    .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
                    .ok_or_else(invalid)
            } else {
                DateTime::parse_from_rfc3339(s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| invalid())
            }
        }
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parser(config: JsonParserConfig) -> JsonResponseParser {
        JsonResponseParser::new(config)
    }

    fn items_config() -> JsonParserConfig {
        JsonParserConfig {
            list_pointer: "/items".to_string(),
            key_pointers: vec!["/id".to_string()],
            timestamp_pointer: Some("/updated".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_records_in_order_with_last_offset() {
        let body = json!({
            "items": [
                {"id": 1, "updated": "2020-01-01T00:00:00Z"},
                {"id": 2, "updated": 1577836801000_i64}
            ]
        });
        let parsed = parser(items_config())
            .parse(&HttpResponse::new(200, body.to_string()))
            .unwrap();

        let keys: Vec<_> = parsed.records.iter().filter_map(|r| r.key.clone()).collect();
        assert_eq!(keys, vec!["1", "2"]);

        let next = parsed.next_offset().unwrap();
        assert_eq!(next.key().as_deref(), Some("2"));
        assert_eq!(
            next.timestamp().map(|ts| ts.timestamp_millis()),
            Some(1_577_836_801_000)
        );
    }

    #[test]
    fn composite_keys_are_joined() {
        let config = JsonParserConfig {
            key_pointers: vec!["/a".to_string(), "/b".to_string()],
            ..Default::default()
        };
        let parsed = parser(config)
            .parse(&HttpResponse::new(200, r#"{"a": "x", "b": 7}"#))
            .unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].key.as_deref(), Some("x+7"));
    }

    #[test]
    fn missing_key_pointer_hashes_the_value() {
        let parsed = parser(JsonParserConfig::default())
            .parse(&HttpResponse::new(200, r#"[{"a": 1}, {"a": 1}, {"a": 2}]"#))
            .unwrap();

        let keys: Vec<_> = parsed.records.iter().map(|r| r.key.clone().unwrap()).collect();
        assert_eq!(keys[0], keys[1]);
        assert_ne!(keys[0], keys[2]);
        assert_eq!(keys[0].len(), 64);
    }

    #[test]
    fn offset_pointers_and_headers_feed_the_next_offset() {
        let config = JsonParserConfig {
            list_pointer: "/data".to_string(),
            offset_pointers: vec![("page".to_string(), "/page".to_string())],
            offset_headers: vec![("cursor".to_string(), "X-Next-Cursor".to_string())],
            ..Default::default()
        };
        let response = HttpResponse::new(200, r#"{"data": [{"page": 3}]}"#)
            .with_header("x-next-cursor", "abc");

        let next = parser(config).parse(&response).unwrap().next_offset().unwrap();
        assert_eq!(next.get("page"), Some(&OffsetValue::Int(3)));
        assert_eq!(next.get("cursor"), Some(&OffsetValue::from("abc")));
    }

    #[test]
    fn empty_list_keeps_offset() {
        let parsed = parser(items_config())
            .parse(&HttpResponse::new(200, r#"{"items": []}"#))
            .unwrap();

        assert!(parsed.records.is_empty());
        assert_eq!(parsed.next_offset(), None);
    }

    #[test]
    fn header_offset_survives_an_empty_page() {
        let config = JsonParserConfig {
            offset_headers: vec![("cursor".to_string(), "X-Next-Cursor".to_string())],
            ..Default::default()
        };
        let response = HttpResponse::new(200, "[]").with_header("X-Next-Cursor", "p2");

        let parsed = parser(config).parse(&response).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.header_offset, Offset::from_strings([("cursor", "p2")]));
        assert_eq!(parsed.next_offset(), Some(parsed.header_offset.clone()));
    }

    #[test]
    fn malformed_body_rejects_the_batch() {
        let err = parser(items_config())
            .parse(&HttpResponse::new(200, "{not json"))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidBody(_)));
    }

    #[test]
    fn one_bad_timestamp_rejects_the_batch() {
        let body = json!({"items": [
            {"id": 1, "updated": "2020-01-01T00:00:00Z"},
            {"id": 2, "updated": "yesterday"}
        ]});
        let err = parser(items_config())
            .parse(&HttpResponse::new(200, body.to_string()))
            .unwrap_err();

        assert_eq!(
            err,
            ParseError::InvalidTimestamp {
                value: "yesterday".to_string()
            }
        );
    }

    #[test]
    fn missing_list_is_reported() {
        let err = parser(items_config())
            .parse(&HttpResponse::new(200, r#"{"other": []}"#))
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::PointerNotFound {
                pointer: "/items".to_string()
            }
        );
    }
}
