use crate::{
    error::ParseError,
    http::response::{HttpResponseParser, ParsedResponse},
};
use model::http::response::HttpResponse;
use std::ops::RangeInclusive;
use tracing::{debug, warn};

const MAX_BODY_PREVIEW: usize = 256;

/// Classifies responses by status before handing successful ones to the
/// wrapped parser.
pub struct StatusCodeFilterResponseParser {
    delegate: Box<dyn HttpResponseParser>,
    skip_codes: Vec<RangeInclusive<u16>>,
}

impl StatusCodeFilterResponseParser {
    pub fn new(delegate: Box<dyn HttpResponseParser>, skip_codes: Vec<RangeInclusive<u16>>) -> Self {
        Self {
            delegate,
            skip_codes,
        }
    }

    pub fn default_skip_codes() -> Vec<RangeInclusive<u16>> {
        vec![300..=399]
    }

    fn skips(&self, status: u16) -> bool {
        self.skip_codes.iter().any(|range| range.contains(&status))
    }
}

impl HttpResponseParser for StatusCodeFilterResponseParser {
    fn parse(&self, response: &HttpResponse) -> Result<ParsedResponse, ParseError> {
        if response.is_success() {
            return self.delegate.parse(response);
        }

        if self.skips(response.status) {
            debug!(status = response.status, "Skipping response");
            return Ok(ParsedResponse::empty());
        }

        let mut body = response.body_text();
        if body.len() > MAX_BODY_PREVIEW {
            let cut = (0..=MAX_BODY_PREVIEW)
                .rev()
                .find(|idx| body.is_char_boundary(*idx))
                .unwrap_or(0);
            body.truncate(cut);
        }
        warn!(status = response.status, "Unexpected response status");

        Err(ParseError::UnexpectedStatus {
            status: response.status,
            body,
        })
    }
}
