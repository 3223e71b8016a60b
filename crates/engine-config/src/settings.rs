use crate::{
    error::ConfigError,
    properties::{load_properties, parse_properties},
    registry::{
        AuthKind, ClientKind, ComponentKind, FilterKind, MapperKind, ParserKind,
        RequestFactoryKind, ThrottlerKind, TieBreak, resolve,
    },
};
use model::http::method::HttpMethod;
use planner::request::kv::{break_down_map, break_down_pairs};
use std::{
    collections::{BTreeMap, HashMap},
    ops::RangeInclusive,
    path::Path,
    str::FromStr,
    time::Duration,
};
use tracing::debug;

pub const TOPIC: &str = "log.topic";
pub const TOPIC_ALIAS: &str = "kafka.topic";
pub const WORKERS: &str = "connector.workers";

pub const REQUEST_URL: &str = "http.request.url";
pub const REQUEST_METHOD: &str = "http.request.method";
pub const REQUEST_HEADERS: &str = "http.request.headers";
pub const REQUEST_PARAMS: &str = "http.request.params";
pub const REQUEST_BODY: &str = "http.request.body";
pub const REQUEST_STRICT: &str = "http.request.template.strict";
pub const OFFSET_INITIAL: &str = "http.offset.initial";

pub const CLIENT_CONNECT_TIMEOUT: &str = "http.client.connection.timeout.millis";
pub const CLIENT_READ_TIMEOUT: &str = "http.client.read.timeout.millis";

pub const AUTH_USER: &str = "http.auth.user";
pub const AUTH_PASSWORD: &str = "http.auth.password";

pub const TIMER_INTERVAL: &str = "http.timer.interval.millis";
pub const TIMER_CATCHUP_INTERVAL: &str = "http.timer.catchup.interval.millis";
pub const TIMER_BACKOFF_FACTOR: &str = "http.timer.backoff.factor";

pub const RESPONSE_SKIP_CODES: &str = "http.response.policy.codes.skip";
pub const RESPONSE_LIST_POINTER: &str = "http.response.list.pointer";
pub const RESPONSE_RECORD_POINTER: &str = "http.response.record.pointer";
pub const RESPONSE_KEY_POINTER: &str = "http.response.record.key.pointer";
pub const RESPONSE_TIMESTAMP_POINTER: &str = "http.response.record.timestamp.pointer";
pub const RESPONSE_OFFSET_POINTER: &str = "http.response.record.offset.pointer";
pub const RESPONSE_OFFSET_HEADERS: &str = "http.response.offset.headers";

const KNOWN_KEYS: &[&str] = &[
    TOPIC,
    TOPIC_ALIAS,
    WORKERS,
    REQUEST_URL,
    REQUEST_METHOD,
    REQUEST_HEADERS,
    REQUEST_PARAMS,
    REQUEST_BODY,
    REQUEST_STRICT,
    OFFSET_INITIAL,
    CLIENT_CONNECT_TIMEOUT,
    CLIENT_READ_TIMEOUT,
    AUTH_USER,
    AUTH_PASSWORD,
    TIMER_INTERVAL,
    TIMER_CATCHUP_INTERVAL,
    TIMER_BACKOFF_FACTOR,
    RESPONSE_SKIP_CODES,
    RESPONSE_LIST_POINTER,
    RESPONSE_RECORD_POINTER,
    RESPONSE_KEY_POINTER,
    RESPONSE_TIMESTAMP_POINTER,
    RESPONSE_OFFSET_POINTER,
    RESPONSE_OFFSET_HEADERS,
    RequestFactoryKind::KEY,
    ClientKind::KEY,
    AuthKind::KEY,
    ThrottlerKind::KEY,
    ParserKind::KEY,
    FilterKind::KEY,
    TieBreak::KEY,
    MapperKind::KEY,
];

#[derive(Debug, Clone)]
pub struct RequestSettings {
    pub factory: RequestFactoryKind,
    pub method: HttpMethod,
    pub url: String,
    pub headers: String,
    pub query_params: String,
    pub body: String,
    pub initial_offset: BTreeMap<String, String>,
    pub strict: bool,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub kind: ClientKind,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub kind: AuthKind,
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("kind", &self.kind)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ThrottleSettings {
    pub kind: ThrottlerKind,
    pub interval: Duration,
    pub catchup_interval: Duration,
    pub backoff_factor: f64,
}

#[derive(Debug, Clone)]
pub struct ResponseSettings {
    pub parser: ParserKind,
    pub skip_codes: Vec<RangeInclusive<u16>>,
    pub list_pointer: String,
    pub record_pointer: String,
    pub key_pointers: Vec<String>,
    pub timestamp_pointer: Option<String>,
    pub offset_pointers: Vec<(String, String)>,
    pub offset_headers: Vec<(String, String)>,
}

impl ResponseSettings {
    /// Offset fields the parser adds on top of `key` and `timestamp`.
    pub fn declared_offset_fields(&self) -> Vec<String> {
        self.offset_pointers
            .iter()
            .chain(&self.offset_headers)
            .map(|(field, _)| field.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FilterSettings {
    pub kind: FilterKind,
    pub tiebreak: TieBreak,
}

/// Fully validated connector configuration.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub topic: String,
    pub workers: usize,
    pub request: RequestSettings,
    pub client: ClientSettings,
    pub auth: AuthSettings,
    pub throttle: ThrottleSettings,
    pub response: ResponseSettings,
    pub filter: FilterSettings,
    pub mapper: MapperKind,
}

impl ConnectorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_map(&load_properties(path)?)
    }

    pub fn from_properties(content: &str) -> Result<Self, ConfigError> {
        Self::from_map(&parse_properties(content)?)
    }

    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let props = Props { map };

        for key in map.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            debug!(key = %key, "Ignoring unknown property");
        }

        let topic = props
            .get(TOPIC)
            .or_else(|| props.get(TOPIC_ALIAS))
            .ok_or_else(|| ConfigError::Missing {
                key: TOPIC.to_string(),
            })?
            .to_string();

        let workers: usize = props.parse(WORKERS, 1)?;
        if workers == 0 {
            return Err(ConfigError::invalid(WORKERS, "0", "at least one worker is required"));
        }

        let config = ConnectorConfig {
            topic,
            workers,
            request: request_settings(&props)?,
            client: ClientSettings {
                kind: props.kind()?,
                connect_timeout: props.millis(CLIENT_CONNECT_TIMEOUT, 2000)?,
                read_timeout: props.millis(CLIENT_READ_TIMEOUT, 2000)?,
            },
            auth: AuthSettings {
                kind: props.kind()?,
                user: props.string(AUTH_USER),
                password: props.string(AUTH_PASSWORD),
            },
            throttle: throttle_settings(&props)?,
            response: response_settings(&props)?,
            filter: FilterSettings {
                kind: props.kind()?,
                tiebreak: props.kind()?,
            },
            mapper: props.kind()?,
        };

        debug!(config = ?config, "Loaded connector configuration");
        Ok(config)
    }
}

fn request_settings(props: &Props) -> Result<RequestSettings, ConfigError> {
    let url = props
        .get(REQUEST_URL)
        .ok_or_else(|| ConfigError::Missing {
            key: REQUEST_URL.to_string(),
        })?
        .to_string();

    let method = match props.get(REQUEST_METHOD) {
        Some(raw) => HttpMethod::from_str(raw)
            .map_err(|err| ConfigError::invalid(REQUEST_METHOD, raw, err.to_string()))?,
        None => HttpMethod::Get,
    };

    Ok(RequestSettings {
        factory: props.kind()?,
        method,
        url,
        headers: props.string(REQUEST_HEADERS),
        query_params: props.string(REQUEST_PARAMS),
        body: props.string(REQUEST_BODY),
        initial_offset: break_down_map(&props.string(OFFSET_INITIAL), &[',']),
        strict: props.parse(REQUEST_STRICT, false)?,
    })
}

fn throttle_settings(props: &Props) -> Result<ThrottleSettings, ConfigError> {
    let interval = props.millis(TIMER_INTERVAL, 60_000)?;
    let catchup_interval = props.millis(TIMER_CATCHUP_INTERVAL, 2_000)?;
    let backoff_factor: f64 = props.parse(TIMER_BACKOFF_FACTOR, 2.0)?;

    if !backoff_factor.is_finite() || backoff_factor < 1.0 {
        return Err(ConfigError::invalid(
            TIMER_BACKOFF_FACTOR,
            &backoff_factor.to_string(),
            "must be a finite number >= 1.0",
        ));
    }
    if catchup_interval > interval {
        return Err(ConfigError::invalid(
            TIMER_CATCHUP_INTERVAL,
            &catchup_interval.as_millis().to_string(),
            format!("must not exceed {TIMER_INTERVAL} ({})", interval.as_millis()),
        ));
    }

    Ok(ThrottleSettings {
        kind: props.kind()?,
        interval,
        catchup_interval,
        backoff_factor,
    })
}

fn response_settings(props: &Props) -> Result<ResponseSettings, ConfigError> {
    let skip_codes = match props.get(RESPONSE_SKIP_CODES) {
        Some(raw) => parse_status_ranges(raw)
            .map_err(|reason| ConfigError::invalid(RESPONSE_SKIP_CODES, raw, reason))?,
        None => vec![300..=399],
    };

    Ok(ResponseSettings {
        parser: props.kind()?,
        skip_codes,
        list_pointer: props.get(RESPONSE_LIST_POINTER).unwrap_or("/").to_string(),
        record_pointer: props.get(RESPONSE_RECORD_POINTER).unwrap_or("/").to_string(),
        key_pointers: props
            .string(RESPONSE_KEY_POINTER)
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
        timestamp_pointer: props.get(RESPONSE_TIMESTAMP_POINTER).map(str::to_string),
        offset_pointers: break_down_pairs(&props.string(RESPONSE_OFFSET_POINTER), &[',', ';']),
        offset_headers: break_down_pairs(&props.string(RESPONSE_OFFSET_HEADERS), &[',', ';']),
    })
}

/// Parses `300..399,404` style status code lists.
pub fn parse_status_ranges(raw: &str) -> Result<Vec<RangeInclusive<u16>>, String> {
    let parse_code = |s: &str| {
        s.trim()
            .parse::<u16>()
            .ok()
            .filter(|code| (100..=599).contains(code))
            .ok_or_else(|| format!("'{}' is not an HTTP status code", s.trim()))
    };

    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.split_once("..") {
            Some((start, end)) => {
                let (start, end) = (parse_code(start)?, parse_code(end)?);
                if start > end {
                    return Err(format!("range '{token}' is empty"));
                }
                Ok(start..=end)
            }
            None => parse_code(token).map(|code| code..=code),
        })
        .collect()
}

/// Read access over the raw map; blank values count as absent.
struct Props<'a> {
    map: &'a HashMap<String, String>,
}

impl Props<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse()
                .map_err(|err: T::Err| ConfigError::invalid(key, raw, err.to_string())),
            None => Ok(default),
        }
    }

    fn millis(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        self.parse(key, default).map(Duration::from_millis)
    }

    fn kind<K: ComponentKind>(&self) -> Result<K, ConfigError> {
        resolve(self.get(K::KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> HashMap<String, String> {
        HashMap::from([
            ("kafka.topic".to_string(), "events".to_string()),
            ("http.request.url".to_string(), "http://localhost/items".to_string()),
        ])
    }

    fn with(extra: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map = minimal();
        map.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        map
    }

    #[test]
    fn defaults_are_applied() {
        let config = ConnectorConfig::from_map(&minimal()).unwrap();

        assert_eq!(config.topic, "events");
        assert_eq!(config.workers, 1);
        assert_eq!(config.request.factory, RequestFactoryKind::Template);
        assert_eq!(config.request.method, HttpMethod::Get);
        assert!(config.request.initial_offset.is_empty());
        assert!(!config.request.strict);
        assert_eq!(config.client.kind, ClientKind::Reqwest);
        assert_eq!(config.client.read_timeout, Duration::from_millis(2000));
        assert_eq!(config.auth.kind, AuthKind::None);
        assert_eq!(config.throttle.kind, ThrottlerKind::Adaptive);
        assert_eq!(config.throttle.interval, Duration::from_secs(60));
        assert_eq!(config.throttle.catchup_interval, Duration::from_secs(2));
        assert_eq!(config.response.parser, ParserKind::StatusCodeFilter);
        assert_eq!(config.response.skip_codes, vec![300..=399]);
        assert_eq!(config.response.list_pointer, "/");
        assert_eq!(config.filter.kind, FilterKind::Passthrough);
        assert_eq!(config.filter.tiebreak, TieBreak::None);
        assert_eq!(config.mapper, MapperKind::Schemed);
    }

    #[test]
    fn initial_offset_is_broken_down() {
        let config =
            ConnectorConfig::from_map(&with(&[("http.offset.initial", "k=v")])).unwrap();
        assert_eq!(
            config.request.initial_offset,
            BTreeMap::from([("k".to_string(), "v".to_string())])
        );

        let config = ConnectorConfig::from_map(&with(&[(
            "http.offset.initial",
            "timestamp=2020-01-01T00:00:00Z, key=7",
        )]))
        .unwrap();
        assert_eq!(config.request.initial_offset.len(), 2);
        assert_eq!(config.request.initial_offset["key"], "7");
    }

    #[test]
    fn missing_required_keys_are_reported() {
        let err = ConnectorConfig::from_map(&HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key } if key == "log.topic"));

        let err = ConnectorConfig::from_map(&HashMap::from([(
            "log.topic".to_string(),
            "t".to_string(),
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing { key } if key == "http.request.url"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            ("http.request.method", "FETCH"),
            ("http.timer.backoff.factor", "0.5"),
            ("http.timer.interval.millis", "soon"),
            ("http.response.policy.codes.skip", "399..300"),
            ("connector.workers", "0"),
            ("http.request.template.strict", "maybe"),
        ];

        for (key, value) in cases {
            let err = ConnectorConfig::from_map(&with(&[(key, value)])).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { key: k, .. } if k == key),
                "{key}={value} gave {err}"
            );
        }
    }

    #[test]
    fn unknown_component_is_fatal() {
        let err = ConnectorConfig::from_map(&with(&[("http.throttler", "random")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownComponent { key, .. } if key == "http.throttler"));
    }

    #[test]
    fn response_lists_are_parsed() {
        let config = ConnectorConfig::from_map(&with(&[
            ("http.response.record.key.pointer", "/id, /region"),
            ("http.response.record.offset.pointer", "page=/meta/page"),
            ("http.response.offset.headers", "cursor=X-Next;etag=ETag"),
            ("http.response.policy.codes.skip", "300..399, 404"),
        ]))
        .unwrap();

        assert_eq!(config.response.key_pointers, vec!["/id", "/region"]);
        assert_eq!(
            config.response.declared_offset_fields(),
            vec!["page", "cursor", "etag"]
        );
        assert_eq!(config.response.skip_codes, vec![300..=399, 404..=404]);
    }

    #[test]
    fn loads_properties_text() {
        let config = ConnectorConfig::from_properties(
            "log.topic=events\nhttp.request.url=http://h/x\nhttp.auth.type=basic\n\
             http.auth.user=u\nhttp.auth.password=hunter2\n",
        )
        .unwrap();

        assert_eq!(config.auth.kind, AuthKind::Basic);
        assert_eq!(config.auth.user, "u");
        assert_eq!(config.auth.password, "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
