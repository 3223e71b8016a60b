use crate::error::RuntimeError;
use connectors::http::{
    auth::{BasicAuthenticator, HttpAuthenticator, NoneAuthenticator},
    client::{ClientTimeouts, HttpClient, ReqwestClient},
    response::{
        HttpResponseParser,
        json::{JsonParserConfig, JsonResponseParser},
        status_code::StatusCodeFilterResponseParser,
    },
};
use engine_config::{
    error::ConfigError,
    registry::{AuthKind, ClientKind, FilterKind, MapperKind, ParserKind, RequestFactoryKind, ThrottlerKind},
    settings::{
        ConnectorConfig, REQUEST_BODY, REQUEST_HEADERS, REQUEST_METHOD, REQUEST_PARAMS,
        REQUEST_URL,
    },
};
use engine_processing::{
    filter::{OffsetTimestampFilterFactory, PassthroughFilterFactory, RecordFilterFactory},
    mapper::{RecordMapper, SchemedRecordMapper, StringKvRecordMapper},
    producer::live::PollingComponents,
    throttle::{AdaptiveThrottler, FixedThrottler, Throttler},
};
use planner::request::{
    error::{RequestFactoryError, RequestPart},
    factory::{HttpRequestFactory, TemplateRequestConfig, TemplateRequestFactory},
};
use std::sync::Arc;

/// Offset field distinguishing workers when more than one polls.
pub const PARTITION_FIELD: &str = "partition";

pub fn worker_id(index: usize) -> String {
    format!("worker-{index}")
}

/// Stateless components, built once and shared by every worker.
#[derive(Clone)]
pub struct SharedComponents {
    pub client: Arc<dyn HttpClient>,
    pub authenticator: Arc<dyn HttpAuthenticator>,
    pub parser: Arc<dyn HttpResponseParser>,
    pub filter_factory: Arc<dyn RecordFilterFactory>,
    pub mapper: Arc<dyn RecordMapper>,
}

pub fn create_shared(config: &ConnectorConfig) -> Result<SharedComponents, RuntimeError> {
    Ok(SharedComponents {
        client: create_client(config)?,
        authenticator: create_authenticator(config),
        parser: create_parser(config),
        filter_factory: create_filter_factory(config),
        mapper: create_mapper(config),
    })
}

/// Builds the components of worker `index`. Fails on any configuration
/// problem so that nothing starts polling with a broken setup.
pub fn create_components(
    config: &ConnectorConfig,
    index: usize,
    shared: &SharedComponents,
) -> Result<PollingComponents, ConfigError> {
    Ok(PollingComponents {
        request_factory: create_request_factory(config, index, shared.authenticator.clone())?,
        throttler: create_throttler(config),
        client: shared.client.clone(),
        parser: shared.parser.clone(),
        filter_factory: shared.filter_factory.clone(),
        mapper: shared.mapper.clone(),
        request_timeout: config.client.connect_timeout + config.client.read_timeout,
    })
}

pub fn create_client(config: &ConnectorConfig) -> Result<Arc<dyn HttpClient>, RuntimeError> {
    match config.client.kind {
        ClientKind::Reqwest => Ok(Arc::new(ReqwestClient::new(ClientTimeouts {
            connect: config.client.connect_timeout,
            read: config.client.read_timeout,
        })?)),
    }
}

fn create_authenticator(config: &ConnectorConfig) -> Arc<dyn HttpAuthenticator> {
    match config.auth.kind {
        AuthKind::None => Arc::new(NoneAuthenticator),
        AuthKind::Basic => Arc::new(BasicAuthenticator::new(&config.auth.user, &config.auth.password)),
    }
}

fn create_parser(config: &ConnectorConfig) -> Arc<dyn HttpResponseParser> {
    let response = &config.response;
    let json = JsonResponseParser::new(JsonParserConfig {
        list_pointer: response.list_pointer.clone(),
        record_pointer: response.record_pointer.clone(),
        key_pointers: response.key_pointers.clone(),
        timestamp_pointer: response.timestamp_pointer.clone(),
        offset_pointers: response.offset_pointers.clone(),
        offset_headers: response.offset_headers.clone(),
    });

    match response.parser {
        ParserKind::Json => Arc::new(json),
        ParserKind::StatusCodeFilter => Arc::new(StatusCodeFilterResponseParser::new(
            Box::new(json),
            response.skip_codes.clone(),
        )),
    }
}

fn create_filter_factory(config: &ConnectorConfig) -> Arc<dyn RecordFilterFactory> {
    match config.filter.kind {
        FilterKind::Passthrough => Arc::new(PassthroughFilterFactory),
        FilterKind::OffsetTimestamp => {
            Arc::new(OffsetTimestampFilterFactory::new(config.filter.tiebreak))
        }
    }
}

fn create_mapper(config: &ConnectorConfig) -> Arc<dyn RecordMapper> {
    match config.mapper {
        MapperKind::Schemed => Arc::new(SchemedRecordMapper::new(config.topic.as_str())),
        MapperKind::StringKv => Arc::new(StringKvRecordMapper::new(config.topic.as_str())),
    }
}

fn create_throttler(config: &ConnectorConfig) -> Box<dyn Throttler> {
    let throttle = &config.throttle;
    match throttle.kind {
        ThrottlerKind::Fixed => Box::new(FixedThrottler::new(throttle.interval)),
        ThrottlerKind::Adaptive => Box::new(AdaptiveThrottler::new(
            throttle.catchup_interval,
            throttle.interval,
            throttle.backoff_factor,
        )),
    }
}

fn create_request_factory(
    config: &ConnectorConfig,
    index: usize,
    authenticator: Arc<dyn HttpAuthenticator>,
) -> Result<Box<dyn HttpRequestFactory>, ConfigError> {
    let request = &config.request;
    let mut initial_offset = request.initial_offset.clone();
    let mut declared_fields = config.response.declared_offset_fields();

    if config.workers > 1 {
        initial_offset
            .entry(PARTITION_FIELD.to_string())
            .or_insert_with(|| index.to_string());
        declared_fields.push(PARTITION_FIELD.to_string());
    }

    match request.factory {
        RequestFactoryKind::Template => {
            let factory = TemplateRequestFactory::new(TemplateRequestConfig {
                method: request.method.to_string(),
                url: request.url.clone(),
                headers: request.headers.clone(),
                query_params: request.query_params.clone(),
                body: request.body.clone(),
                initial_offset,
                strict: request.strict,
                declared_fields,
            })
            .map_err(into_config_error)?
            .with_authenticator(authenticator);
            Ok(Box::new(factory))
        }
    }
}

fn into_config_error(err: RequestFactoryError) -> ConfigError {
    match err {
        RequestFactoryError::InvalidMethod(err) => {
            ConfigError::invalid(REQUEST_METHOD, &err.0, err.to_string())
        }
        RequestFactoryError::Template {
            part,
            template,
            source,
        } => ConfigError::Template {
            key: part_key(part).to_string(),
            value: template,
            source,
        },
        RequestFactoryError::UndeclaredPlaceholder { part, placeholder } => {
            ConfigError::UndeclaredPlaceholder {
                key: part_key(part).to_string(),
                placeholder,
            }
        }
    }
}

fn part_key(part: RequestPart) -> &'static str {
    match part {
        RequestPart::Url => REQUEST_URL,
        RequestPart::Headers => REQUEST_HEADERS,
        RequestPart::QueryParams => REQUEST_PARAMS,
        RequestPart::Body => REQUEST_BODY,
    }
}
