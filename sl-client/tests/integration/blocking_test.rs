use futures::executor::block_on;
use serde_json::json;
use sl_client::client::{Backend, BlockingSemanticLayerClient, Operation};
use sl_client::error::ErrorKind;
use sl_client::models::{QueryId, QueryStatus};
use sl_client::params::{DimensionValuesParameters, QueryParameters};
use sl_client::test_utils::arrow::{encode_ipc, encoded_page, id_name_batch, ids};
use sl_client::test_utils::columnar::MockColumnarTransport;
use sl_client::test_utils::config::test_client_config;
use sl_client::test_utils::metadata::{MockMetadataTransport, QueryScript};
use sl_config::shared::{ClientConfig, TimeoutBudget};
use sl_telemetry::tracing::init_test_tracing;
use std::time::Duration;

fn open_client(
    config: &ClientConfig,
    script: QueryScript,
    columnar: MockColumnarTransport,
) -> (
    BlockingSemanticLayerClient<MockMetadataTransport, MockColumnarTransport>,
    MockMetadataTransport,
) {
    let metadata = MockMetadataTransport::new(script);
    let mut client = BlockingSemanticLayerClient::new(config, metadata.clone(), columnar);
    client.open_session().unwrap();

    (client, metadata)
}

#[test]
fn test_blocking_query_matches_async_semantics() {
    init_test_tracing();
    let pages = vec![encoded_page(&[1]), encoded_page(&[2, 3]), encoded_page(&[4])];
    let script = QueryScript::new("q-blocking", pages)
        .with_statuses(vec![QueryStatus::Running, QueryStatus::Successful]);
    let (client, metadata) = open_client(
        &test_client_config(),
        script,
        MockColumnarTransport::new(Vec::new()),
    );

    let table = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .unwrap();

    assert_eq!(ids(table.batches()), vec![1, 2, 3, 4]);
    assert_eq!(block_on(metadata.probes()), 2);
    assert_eq!(block_on(metadata.extra_page_fetches()), vec![2, 3]);
}

#[test]
fn test_blocking_poll_timeout() {
    init_test_tracing();
    let config = ClientConfig {
        timeout: TimeoutBudget::from_total(Duration::from_millis(5)),
        ..test_client_config()
    };
    let script = QueryScript::new("q-stuck", vec![]).with_statuses(vec![QueryStatus::Running]);
    let (client, _) = open_client(&config, script, MockColumnarTransport::new(Vec::new()));

    let err = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .unwrap_err();

    assert!(err.kind().is_timeout());
    assert_eq!(err.last_status(), Some(QueryStatus::Running));
    assert_eq!(err.query_id(), Some(&QueryId::new("q-stuck")));
}

#[test]
fn test_blocking_session_discipline() {
    init_test_tracing();
    let mut client = BlockingSemanticLayerClient::new(
        &test_client_config(),
        MockMetadataTransport::new(QueryScript::new("q", vec![])),
        MockColumnarTransport::new(Vec::new()),
    );

    let err = client.metrics().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);

    client.open_session().unwrap();
    assert!(client.has_session());
    client.close_session().unwrap();
    assert!(!client.has_session());
}

#[test]
fn test_blocking_columnar_and_metadata_operations() {
    init_test_tracing();
    let columnar = MockColumnarTransport::new(encode_ipc(&id_name_batch(&[5], &["nl"])));
    let script = QueryScript::new("q", vec![])
        .with_compiled_sql("SELECT 1")
        .with_listing(
            "getMetrics",
            json!({"metrics": [{"name": "revenue", "type": "SIMPLE"}]}),
        )
        .with_listing(
            "getMeasures",
            json!({"measures": [{"name": "order_total", "agg": "SUM"}]}),
        );
    let (mut client, _) = open_client(&test_client_config(), script, columnar.clone());

    let mut metrics = client.metrics().unwrap();
    let measures = client.load_measures(&mut metrics[0]).unwrap();
    assert_eq!(measures[0].name, "order_total");

    assert_eq!(
        client
            .compile_sql(&QueryParameters::adhoc(["revenue"]))
            .unwrap(),
        "SELECT 1"
    );

    let values = client
        .dimension_values(&DimensionValuesParameters::new("country", ["revenue"]))
        .unwrap();
    assert_eq!(ids(values.batches()), vec![5]);

    client
        .set_route(Operation::Query, Backend::Columnar)
        .unwrap();
    let table = client
        .query(&QueryParameters::adhoc(["revenue"]))
        .unwrap();
    assert_eq!(ids(table.batches()), vec![5]);
    assert_eq!(block_on(columnar.queries()).len(), 2);
}
