use crate::error::ParseError;
use model::{
    http::response::HttpResponse, pagination::offset::Offset, records::record::Record,
};

pub mod json;
pub mod status_code;

/// Records extracted from one response, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub records: Vec<Record>,
    /// Offset fields read from the response headers, whatever the records.
    pub header_offset: Offset,
}

impl ParsedResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Position after every parsed record: the last one laid over the
    /// header fields. `None` leaves the current offset untouched.
    pub fn next_offset(&self) -> Option<Offset> {
        match self.records.last() {
            Some(last) => Some(self.header_offset.merged(&last.offset)),
            None if !self.header_offset.is_empty() => Some(self.header_offset.clone()),
            None => None,
        }
    }
}

pub trait HttpResponseParser: Send + Sync {
    fn parse(&self, response: &HttpResponse) -> Result<ParsedResponse, ParseError>;
}
