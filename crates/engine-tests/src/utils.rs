#![allow(dead_code)]

use engine_config::ConnectorConfig;
use engine_core::log::LogSink;
use engine_core::metrics::Metrics;
use engine_processing::producer::live::PollingCycle;
use engine_runtime::execution::factory;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ScriptedClient;

/// Properties shared by every scenario: records keyed by `/id`, stamped by
/// `/ts`, no pacing between polls.
pub const BASE_PROPERTIES: &str = "log.topic=events
http.request.url=http://api.test/items?since=${timestamp}&after=${key}
http.response.record.key.pointer=/id
http.response.record.timestamp.pointer=/ts
http.throttler=fixed
http.timer.interval.millis=0
http.timer.catchup.interval.millis=0
";

pub fn config(extra: &str) -> ConnectorConfig {
    ConnectorConfig::from_properties(&format!("{BASE_PROPERTIES}{extra}"))
        .expect("valid test configuration")
}

/// Page body with one `{id, ts}` object per entry.
pub fn page(items: &[(&str, i64)]) -> String {
    let items: Vec<_> = items
        .iter()
        .map(|(id, ts)| serde_json::json!({ "id": id, "ts": ts }))
        .collect();
    serde_json::Value::Array(items).to_string()
}

/// Builds worker 0 of `config` around `client` and seeds it from `log`.
pub async fn cycle(
    config: &ConnectorConfig,
    client: Arc<ScriptedClient>,
    log: Arc<dyn LogSink>,
) -> PollingCycle {
    let mut shared = factory::create_shared(config).expect("shared components");
    shared.client = client;
    let components = factory::create_components(config, 0, &shared).expect("components");

    PollingCycle::resume(
        factory::worker_id(0),
        components,
        log,
        Metrics::new(),
        CancellationToken::new(),
    )
    .await
    .expect("resume")
}

pub fn keys(records: &[model::records::batch::LogRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.key.clone())
        .collect()
}
