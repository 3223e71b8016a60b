#[cfg(test)]
mod tests {
    use crate::{
        ScriptedClient, Step,
        utils::{config, cycle, keys, page},
    };
    use connectors::error::TransportError;
    use engine_config::registry::{
        AuthKind, FilterKind, MapperKind, ParserKind, RequestFactoryKind, ThrottlerKind,
    };
    use engine_core::log::{LogSink, memory::MemoryLog};
    use engine_processing::{
        error::IterationError,
        producer::{IterationOutcome, Stage},
    };
    use engine_runtime::execution::{
        executor::{self, ConnectorExecutor},
        factory,
    };
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use tracing_test::traced_test;

    // Scenario: a first run commits two records sharing a timestamp; a
    // second run against the same log directory replays an overlapping page.
    // Expected Outcome: only records after the committed (timestamp, key)
    // are appended, and the restarted request resumes from that offset.
    #[traced_test]
    #[tokio::test]
    async fn restart_resumes_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(
            "http.record.filter.factory=offset-timestamp\n\
             http.record.filter.tiebreak=key\n",
        );

        let cancel = CancellationToken::new();
        let client = ScriptedClient::cancelling(
            vec![Step::json(&page(&[("a", 100), ("b", 100)]))],
            cancel.clone(),
        );
        let log = executor::open_log(Some(dir.path()), &config.topic).unwrap();
        let summary = ConnectorExecutor::new(config.clone(), log.clone(), cancel)
            .unwrap()
            .with_client(client)
            .execute()
            .await
            .unwrap();

        assert_eq!(summary.metrics.records_emitted, 2);
        assert_eq!(keys(&log.records("worker-0").unwrap()), ["a", "b"]);
        drop(log);

        let cancel = CancellationToken::new();
        let client = ScriptedClient::cancelling(
            vec![Step::json(&page(&[("a", 100), ("b", 100), ("c", 100), ("d", 101)]))],
            cancel.clone(),
        );
        let log = executor::open_log(Some(dir.path()), &config.topic).unwrap();
        let summary = ConnectorExecutor::new(config, log.clone(), cancel)
            .unwrap()
            .with_client(client.clone())
            .execute()
            .await
            .unwrap();

        assert_eq!(summary.metrics.records_emitted, 2);
        assert_eq!(summary.metrics.records_filtered, 2);
        assert_eq!(keys(&log.records("worker-0").unwrap()), ["a", "b", "c", "d"]);
        assert_eq!(
            client.urls()[0],
            "http://api.test/items?since=1970-01-01T00:00:00.100Z&after=b"
        );

        let committed = log.committed_offset("worker-0").await.unwrap();
        assert_eq!(committed.key().as_deref(), Some("d"));
    }

    // Scenario: the third request stalls past the client timeouts.
    // Expected Outcome: iteration 3 fails at the request stage with the
    // offset of iteration 2 kept; iteration 4 retries the same window.
    #[traced_test]
    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_offset_and_retries() {
        let config = config(
            "http.client.connection.timeout.millis=50\n\
             http.client.read.timeout.millis=50\n",
        );
        let client = ScriptedClient::new(vec![
            Step::json(&page(&[("a", 100)])),
            Step::json(&page(&[("b", 200)])),
            Step::Stall(std::time::Duration::from_secs(10)),
            Step::json(&page(&[("c", 300)])),
        ]);
        let log = Arc::new(MemoryLog::new());
        let mut cycle = cycle(&config, client.clone(), log.clone()).await;

        assert_eq!(cycle.tick().await.records(), 1);
        assert_eq!(cycle.tick().await.records(), 1);
        let after_second = cycle.current_offset().clone();

        let outcome = cycle.tick().await;
        assert!(matches!(
            outcome,
            IterationOutcome::Failed {
                stage: Stage::Request,
                error: IterationError::Transport(TransportError::Timeout { .. }),
            }
        ));
        assert_eq!(*cycle.current_offset(), after_second);
        assert_eq!(log.committed_offset("worker-0").await.unwrap(), after_second);

        assert_eq!(cycle.tick().await.records(), 1);
        assert_eq!(cycle.current_offset().key().as_deref(), Some("c"));

        let urls = client.urls();
        assert_eq!(urls[2], urls[3]);
        assert_eq!(keys(&log.records("worker-0").await), ["a", "b", "c"]);
        assert_eq!(cycle.stats().failures, 1);
    }

    // Scenario: after a page is committed the backend serves an older,
    // stale page and then the original page again.
    // Expected Outcome: neither poll moves the committed offset backwards
    // and nothing is appended twice.
    #[traced_test]
    #[tokio::test]
    async fn stale_page_never_rewinds_offset() {
        let config = config(
            "http.record.filter.factory=offset-timestamp\n\
             http.record.filter.tiebreak=key\n",
        );
        let client = ScriptedClient::new(vec![
            Step::json(&page(&[("a", 100), ("b", 200)])),
            Step::json(&page(&[("a", 100)])),
            Step::json(&page(&[("a", 100), ("b", 200)])),
            Step::json(&page(&[("b", 200), ("c", 300)])),
        ]);
        let log = Arc::new(MemoryLog::new());
        let mut cycle = cycle(&config, client.clone(), log.clone()).await;

        assert_eq!(cycle.tick().await.records(), 2);
        let committed = cycle.current_offset().clone();

        assert!(matches!(cycle.tick().await, IterationOutcome::Empty));
        assert!(matches!(cycle.tick().await, IterationOutcome::Empty));
        assert_eq!(*cycle.current_offset(), committed);
        assert_eq!(log.committed_offset("worker-0").await.unwrap(), committed);

        assert_eq!(cycle.tick().await.records(), 1);
        assert_eq!(keys(&log.records("worker-0").await), ["a", "b", "c"]);

        let urls = client.urls();
        assert_eq!(urls[1], urls[3]);
        assert!(urls[1].ends_with("after=b"));
    }

    // Scenario: the first request is refused by the backend.
    // Expected Outcome: the iteration fails at the request stage, nothing
    // is committed, and the next poll asks for the same window.
    #[traced_test]
    #[tokio::test]
    async fn refused_connection_is_retried() {
        let config = config("");
        let client = ScriptedClient::new(vec![
            Step::Fail(TransportError::Connect {
                url: "http://api.test/items".to_string(),
                message: "connection refused".to_string(),
            }),
            Step::json(&page(&[("a", 100)])),
        ]);
        let log = Arc::new(MemoryLog::new());
        let mut cycle = cycle(&config, client.clone(), log.clone()).await;

        assert!(matches!(
            cycle.tick().await,
            IterationOutcome::Failed {
                stage: Stage::Request,
                error: IterationError::Transport(TransportError::Connect { .. }),
            }
        ));
        assert!(cycle.current_offset().is_empty());
        assert!(log.committed_offset("worker-0").await.unwrap().is_empty());

        assert_eq!(cycle.tick().await.records(), 1);
        let urls = client.urls();
        assert_eq!(urls[0], urls[1]);
        assert_eq!(cycle.stats().failures, 1);
    }

    async fn replay_boundary(tiebreak: &str) -> Vec<String> {
        let config = config(&format!(
            "http.record.filter.factory=offset-timestamp\nhttp.record.filter.tiebreak={tiebreak}\n"
        ));
        let client = ScriptedClient::new(vec![
            Step::json(&page(&[("a", 100), ("b", 100)])),
            Step::json(&page(&[("a", 100), ("b", 100), ("c", 100), ("d", 101), ("e", 102)])),
        ]);
        let log = Arc::new(MemoryLog::new());
        let mut cycle = cycle(&config, client, log.clone()).await;

        cycle.tick().await;
        cycle.tick().await;

        keys(&log.records("worker-0").await).split_off(2)
    }

    // Scenario: committed offset {timestamp: 100, key: b}; the next page
    // repeats the boundary timestamp.
    // Expected Outcome: the key tie-break admits c at the boundary, none
    // admits only strictly later records.
    #[traced_test]
    #[tokio::test]
    async fn filter_boundary_by_tiebreak() {
        assert_eq!(replay_boundary("key").await, ["c", "d", "e"]);
        assert_eq!(replay_boundary("none").await, ["d", "e"]);
    }

    // Expected Outcome: records reach the log in response order and the
    // next offset comes from the last of them.
    #[traced_test]
    #[tokio::test]
    async fn records_keep_response_order() {
        let config = config("");
        let client = ScriptedClient::new(vec![Step::json(&page(&[
            ("z", 300),
            ("a", 100),
            ("m", 200),
        ]))]);
        let log = Arc::new(MemoryLog::new());
        let mut cycle = cycle(&config, client, log.clone()).await;

        assert_eq!(cycle.tick().await.records(), 3);
        assert_eq!(keys(&log.records("worker-0").await), ["z", "a", "m"]);
        assert_eq!(cycle.current_offset().key().as_deref(), Some("m"));
    }

    // Scenario: nothing committed yet, initial offset k=v.
    // Expected Outcome: the first request renders v wherever ${k} appears.
    #[traced_test]
    #[tokio::test]
    async fn cold_start_uses_initial_offset() {
        let config = config(
            "http.offset.initial=k=v\n\
             http.request.url=http://api.test/items/${k}?k=${k}\n\
             http.request.headers=X-Cursor=${k}\n",
        );
        let client = ScriptedClient::new(Vec::new());
        let mut cycle = cycle(&config, client.clone(), Arc::new(MemoryLog::new())).await;

        assert!(matches!(cycle.tick().await, IterationOutcome::Empty));

        let requests = client.requests();
        let request = &requests[0];
        assert_eq!(request.url, "http://api.test/items/v?k=v");
        assert_eq!(request.headers.get("X-Cursor"), Some("v"));
    }

    // Scenario: a committed offset exists for the worker.
    // Expected Outcome: it wins over the configured initial offset.
    #[traced_test]
    #[tokio::test]
    async fn committed_offset_wins_over_initial() {
        let config = config(
            "http.offset.initial=k=v\n\
             http.request.url=http://api.test/items?k=${k}\n",
        );
        let log = Arc::new(MemoryLog::new());
        log.seed_offset(
            "worker-0",
            model::pagination::offset::Offset::from_strings([("k", "w")]),
        )
        .await;
        let client = ScriptedClient::new(Vec::new());
        let mut cycle = cycle(&config, client.clone(), log).await;

        cycle.tick().await;
        assert_eq!(client.urls()[0], "http://api.test/items?k=w");
    }

    // Expected Outcome: a minimal configuration resolves every component
    // to its default and sends no Authorization header.
    #[traced_test]
    #[tokio::test]
    async fn minimal_configuration_defaults() {
        let config = engine_config::ConnectorConfig::from_properties(
            "kafka.topic=events\nhttp.request.url=http://api.test/items\n",
        )
        .unwrap();

        assert_eq!(config.topic, "events");
        assert_eq!(config.workers, 1);
        assert_eq!(config.request.factory, RequestFactoryKind::Template);
        assert_eq!(config.throttle.kind, ThrottlerKind::Adaptive);
        assert_eq!(config.response.parser, ParserKind::StatusCodeFilter);
        assert_eq!(config.filter.kind, FilterKind::Passthrough);
        assert_eq!(config.mapper, MapperKind::Schemed);
        assert_eq!(config.auth.kind, AuthKind::None);
        assert!(config.request.initial_offset.is_empty());

        let shared = factory::create_shared(&config).unwrap();
        let components = factory::create_components(&config, 0, &shared).unwrap();
        assert!(components.request_factory.current_offset().is_empty());

        let request = components.request_factory.create_request();
        assert!(!request.headers.contains("Authorization"));
        assert_eq!(request.url, "http://api.test/items");
    }
}
