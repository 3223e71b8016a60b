use model::http::method::InvalidMethodError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unterminated placeholder starting at position {position}")]
    Unterminated { position: usize },

    #[error("Empty placeholder name at position {position}")]
    EmptyPlaceholder { position: usize },
}

/// Errors raised while configuring a request factory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestFactoryError {
    #[error(transparent)]
    InvalidMethod(#[from] InvalidMethodError),

    #[error("Malformed {part} template '{template}': {source}")]
    Template {
        part: RequestPart,
        template: String,
        #[source]
        source: TemplateError,
    },

    #[error("The {part} template references undeclared offset field '{placeholder}'")]
    UndeclaredPlaceholder {
        part: RequestPart,
        placeholder: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart {
    Url,
    Headers,
    QueryParams,
    Body,
}

impl std::fmt::Display for RequestPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestPart::Url => write!(f, "url"),
            RequestPart::Headers => write!(f, "headers"),
            RequestPart::QueryParams => write!(f, "query params"),
            RequestPart::Body => write!(f, "body"),
        }
    }
}
