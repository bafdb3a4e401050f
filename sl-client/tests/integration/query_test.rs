use std::time::Duration;

use serde_json::json;
use sl_client::client::SemanticLayerClient;
use sl_client::error::ErrorKind;
use sl_client::models::{QueryId, QueryStatus};
use sl_client::params::{GroupBySpec, QueryParameters};
use sl_client::runtime::TokioRuntime;
use sl_client::test_utils::arrow::{encode_base64, encoded_page, id_value_batch, ids};
use sl_client::test_utils::columnar::MockColumnarTransport;
use sl_client::test_utils::config::test_client_config;
use sl_client::test_utils::metadata::{MockMetadataTransport, QueryScript};
use sl_config::shared::{ClientConfig, TimeoutBudget};
use sl_telemetry::tracing::init_test_tracing;

type TestClient = SemanticLayerClient<MockMetadataTransport, MockColumnarTransport, TokioRuntime>;

async fn open_client(config: &ClientConfig, script: QueryScript) -> (TestClient, MockMetadataTransport) {
    let metadata = MockMetadataTransport::new(script);
    let mut client = SemanticLayerClient::new(
        config,
        metadata.clone(),
        MockColumnarTransport::new(Vec::new()),
        TokioRuntime,
    );
    client.open_session().await.unwrap();

    (client, metadata)
}

#[tokio::test(start_paused = true)]
async fn test_simple_adhoc_query() {
    init_test_tracing();
    let script = QueryScript::new("q-simple", vec![encoded_page(&[1, 2, 3])]);
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let table = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap();

    assert_eq!(ids(table.batches()), vec![1, 2, 3]);
    assert_eq!(table.num_columns(), 2);

    let requests = metadata.requests().await;
    assert_eq!(requests[0].operation_name.as_deref(), Some("createQuery"));
    assert_eq!(
        requests[0].variables,
        json!({
            "environmentId": 123,
            "savedQuery": null,
            "metrics": [{"name": "revenue"}],
            "groupBy": null,
            "where": [],
            "orderBy": [],
            "limit": null,
            "readCache": true
        })
    );
    assert_eq!(
        requests[1].variables,
        json!({"environmentId": 123, "queryId": "q-simple", "pageNum": 1})
    );
    assert_eq!(requests.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poll_timeout_preserves_last_status() {
    init_test_tracing();
    let config = ClientConfig {
        timeout: TimeoutBudget::from_total(Duration::from_millis(1)),
        ..test_client_config()
    };
    let script = QueryScript::new("q-slow", vec![]).with_statuses(vec![QueryStatus::Compiled]);
    let (client, metadata) = open_client(&config, script).await;

    let err = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RetryTimeout);
    assert_eq!(err.last_status(), Some(QueryStatus::Compiled));
    assert_eq!(err.query_id(), Some(&QueryId::new("q-slow")));
    assert_eq!(err.timeout(), Some(Duration::from_millis(1)));
    assert_eq!(metadata.probes().await, 1);
    assert!(metadata.extra_page_fetches().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_four_page_result_fetches_each_remaining_page_once() {
    init_test_tracing();
    let pages = vec![
        encoded_page(&[1, 2]),
        encoded_page(&[3, 4]),
        encoded_page(&[5, 6]),
        encoded_page(&[7, 8]),
    ];
    let script = QueryScript::new("q-paged", pages)
        .with_statuses(vec![QueryStatus::Pending, QueryStatus::Running, QueryStatus::Successful]);
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let table = client
        .query(&QueryParameters::adhoc(["revenue"]).with_group_by(["country"]))
        .await
        .unwrap();

    assert_eq!(ids(table.batches()), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(table.num_rows(), 8);
    assert_eq!(metadata.probes().await, 3);
    assert_eq!(metadata.extra_page_fetches().await, vec![2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_page_completion_keeps_page_order() {
    init_test_tracing();
    let pages = vec![
        encoded_page(&[1]),
        encoded_page(&[2]),
        encoded_page(&[3]),
        encoded_page(&[4]),
    ];
    let script = QueryScript::new("q-racy", pages)
        .with_page_delay(2, Duration::from_millis(300))
        .with_page_delay(3, Duration::from_millis(200))
        .with_page_delay(4, Duration::from_millis(100));
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let started = tokio::time::Instant::now();
    let table = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap();

    assert_eq!(ids(table.batches()), vec![1, 2, 3, 4]);
    assert_eq!(metadata.extra_page_fetches().await, vec![2, 3, 4]);
    // The fetches overlap, so the slowest page bounds the total wait.
    assert!(started.elapsed() < Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn test_schema_mismatch_across_pages_fails() {
    init_test_tracing();
    let pages = vec![
        encoded_page(&[1]),
        encode_base64(&id_value_batch(&[2], &[0.5])),
    ];
    let (client, _) = open_client(&test_client_config(), QueryScript::new("q-mixed", pages)).await;

    let err = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
}

#[tokio::test(start_paused = true)]
async fn test_unknown_status_keeps_polling() {
    init_test_tracing();
    let script = QueryScript::new("q-new", vec![encoded_page(&[1])])
        .with_statuses(vec![QueryStatus::Unknown, QueryStatus::Successful]);
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let table = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap();

    assert_eq!(ids(table.batches()), vec![1]);
    assert_eq!(metadata.probes().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_fetches_are_aggregated() {
    init_test_tracing();
    let pages = vec![
        encoded_page(&[1]),
        encoded_page(&[2]),
        encoded_page(&[3]),
        encoded_page(&[4]),
    ];
    let script = QueryScript::new("q-flaky", pages)
        .with_failing_page(2)
        .with_failing_page(4);
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let err = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kinds(), vec![ErrorKind::Transport, ErrorKind::Transport]);
    for page_err in err.errors() {
        assert_eq!(page_err.query_id(), Some(&QueryId::new("q-flaky")));
    }
    assert_eq!(metadata.extra_page_fetches().await, vec![2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_is_not_retried() {
    init_test_tracing();
    let script = QueryScript::new("q-bad", vec![])
        .with_statuses(vec![QueryStatus::Failed])
        .with_error("column `x` does not exist");
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let err = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailed);
    assert!(err.to_string().contains("column `x` does not exist"));
    assert_eq!(metadata.probes().await, 1);
}

#[tokio::test]
async fn test_compile_saved_query() {
    init_test_tracing();
    let script = QueryScript::new("q", vec![]).with_compiled_sql("SELECT 42");
    let (client, metadata) = open_client(&test_client_config(), script).await;

    let sql = client
        .compile_sql(
            &QueryParameters::saved("weekly_revenue")
                .with_order_by(["-metric_time"])
                .with_where(["{{ Dimension('order__country') }} = 'NL'"])
                .with_read_cache(false),
        )
        .await
        .unwrap();

    assert_eq!(sql, "SELECT 42");

    let requests = metadata.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].variables,
        json!({
            "environmentId": 123,
            "savedQuery": "weekly_revenue",
            "metrics": null,
            "groupBy": null,
            "where": [{"sql": "{{ Dimension('order__country') }} = 'NL'"}],
            "orderBy": [{
                "groupBy": {"name": "metric_time", "timeGranularity": null},
                "descending": true
            }],
            "limit": null,
            "readCache": false
        })
    );
}

#[tokio::test]
async fn test_group_by_grains_are_sent_uppercased() {
    init_test_tracing();
    let script = QueryScript::new("q", vec![]);
    let (client, metadata) = open_client(&test_client_config(), script).await;

    client
        .compile_sql(
            &QueryParameters::adhoc(["revenue"])
                .with_group_by([GroupBySpec::time_dimension("metric_time", "day")])
                .with_order_by(["-revenue"]),
        )
        .await
        .unwrap();

    let requests = metadata.requests().await;
    assert_eq!(
        requests[0].variables["groupBy"],
        json!([{"name": "metric_time", "timeGranularity": "DAY"}])
    );
    assert_eq!(
        requests[0].variables["orderBy"],
        json!([{"metric": {"name": "revenue"}, "descending": true}])
    );
}
