use crate::request::{
    error::{RequestFactoryError, RequestPart},
    kv::{break_down_headers, break_down_query_params},
    template::Template,
};
use model::{
    http::{auth::HttpAuthenticator, method::HttpMethod, request::HttpRequest},
    pagination::offset::Offset,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::{debug, info};

const AUTHORIZATION: &str = "Authorization";

/// Builds the request for the next poll out of the current offset.
pub trait HttpRequestFactory: Send + Sync {
    /// Seeds the current offset: a non-empty stored offset takes precedence
    /// over the configured initial one.
    fn initialize_offset(&mut self, stored: &Offset);

    /// Replaces the current offset. Only called after the records that led
    /// to `offset` were handed to the log.
    fn advance_offset(&mut self, offset: Offset);

    fn current_offset(&self) -> &Offset;

    fn create_request(&self) -> HttpRequest;
}

#[derive(Debug, Clone)]
pub struct TemplateRequestConfig {
    pub method: String,
    pub url: String,
    pub headers: String,
    pub query_params: String,
    pub body: String,
    pub initial_offset: BTreeMap<String, String>,
    /// Reject placeholders that no offset producer declares.
    pub strict: bool,
    /// Offset fields produced downstream (response pointers, headers...).
    pub declared_fields: Vec<String>,
}

impl Default for TemplateRequestConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: String::new(),
            headers: String::new(),
            query_params: String::new(),
            body: String::new(),
            initial_offset: BTreeMap::new(),
            strict: false,
            declared_fields: Vec::new(),
        }
    }
}

pub struct TemplateRequestFactory {
    method: HttpMethod,
    url: Template,
    headers: Template,
    query_params: Template,
    body: Template,
    initial_offset: Offset,
    current: Offset,
    authenticator: Option<Arc<dyn HttpAuthenticator>>,
}

impl TemplateRequestFactory {
    pub fn new(config: TemplateRequestConfig) -> Result<Self, RequestFactoryError> {
        let method = config.method.parse::<HttpMethod>()?;
        let url = parse_part(RequestPart::Url, &config.url)?;
        let headers = parse_part(RequestPart::Headers, &config.headers)?;
        let query_params = parse_part(RequestPart::QueryParams, &config.query_params)?;
        let body = parse_part(RequestPart::Body, &config.body)?;
        let initial_offset = Offset::from_strings(config.initial_offset.clone());

        let factory = Self {
            method,
            url,
            headers,
            query_params,
            body,
            current: initial_offset.clone(),
            initial_offset,
            authenticator: None,
        };

        if config.strict {
            factory.check_declared(&config)?;
        }

        Ok(factory)
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn HttpAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    fn parts(&self) -> [(RequestPart, &Template); 4] {
        [
            (RequestPart::Url, &self.url),
            (RequestPart::Headers, &self.headers),
            (RequestPart::QueryParams, &self.query_params),
            (RequestPart::Body, &self.body),
        ]
    }

    fn check_declared(&self, config: &TemplateRequestConfig) -> Result<(), RequestFactoryError> {
        let declared: BTreeSet<&str> = config
            .initial_offset
            .keys()
            .map(String::as_str)
            .chain(config.declared_fields.iter().map(String::as_str))
            .chain([Offset::KEY_KEY, Offset::TIMESTAMP_KEY])
            .collect();

        for (part, template) in self.parts() {
            if let Some((name, _)) = template
                .placeholders()
                .find(|(name, has_default)| !has_default && !declared.contains(name))
            {
                return Err(RequestFactoryError::UndeclaredPlaceholder {
                    part,
                    placeholder: name.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl HttpRequestFactory for TemplateRequestFactory {
    fn initialize_offset(&mut self, stored: &Offset) {
        if stored.is_empty() {
            info!(offset = %self.initial_offset, "No stored offset, starting from initial offset");
            self.current = self.initial_offset.clone();
        } else {
            info!(offset = %stored, "Resuming from stored offset");
            self.current = stored.clone();
        }
    }

    fn advance_offset(&mut self, offset: Offset) {
        self.current = offset;
    }

    fn current_offset(&self) -> &Offset {
        &self.current
    }

    fn create_request(&self) -> HttpRequest {
        let offset = &self.current;
        let mut headers = break_down_headers(&self.headers.apply(offset));

        if let Some(authenticator) = &self.authenticator
            && !headers.contains(AUTHORIZATION)
            && let Some(value) = authenticator.authorization_header()
        {
            headers.append(AUTHORIZATION, value);
        }

        let request = HttpRequest::new(self.method, self.url.apply(offset))
            .with_headers(headers)
            .with_query(break_down_query_params(&self.query_params.apply(offset)))
            .with_body(self.body.apply(offset));

        debug!(method = %request.method, url = %request.url, offset = %offset, "Built request");
        request
    }
}

fn parse_part(part: RequestPart, source: &str) -> Result<Template, RequestFactoryError> {
    Template::parse(source).map_err(|source_err| RequestFactoryError::Template {
        part,
        template: source.to_string(),
        source: source_err,
    })
}
