use sl_client::client::{Backend, Operation, SemanticLayerClient};
use sl_client::error::ErrorKind;
use sl_client::params::{DimensionValuesParameters, GroupBySpec, OrderByGroupBy, QueryParameters};
use sl_client::runtime::TokioRuntime;
use sl_client::test_utils::arrow::{encode_ipc, id_name_batch, ids};
use sl_client::test_utils::columnar::MockColumnarTransport;
use sl_client::test_utils::config::test_client_config;
use sl_client::test_utils::metadata::{MockMetadataTransport, QueryScript};
use sl_client::transport::{ColumnarStatusCode, ColumnarTransportError};
use sl_telemetry::tracing::init_test_tracing;

async fn open_client(
    columnar: &MockColumnarTransport,
) -> (
    SemanticLayerClient<MockMetadataTransport, MockColumnarTransport, TokioRuntime>,
    MockMetadataTransport,
) {
    let metadata = MockMetadataTransport::new(QueryScript::new("q", vec![]));
    let mut client = SemanticLayerClient::new(
        &test_client_config(),
        metadata.clone(),
        columnar.clone(),
        TokioRuntime,
    );
    client.open_session().await.unwrap();

    (client, metadata)
}

#[tokio::test]
async fn test_query_routed_to_columnar_backend() {
    init_test_tracing();
    let columnar =
        MockColumnarTransport::new(encode_ipc(&id_name_batch(&[10, 20], &["nl", "de"])));
    let (mut client, metadata) = open_client(&columnar).await;
    client
        .set_route(Operation::Query, Backend::Columnar)
        .unwrap();

    let table = client
        .query(
            &QueryParameters::adhoc(["revenue", "orders"])
                .with_group_by([
                    GroupBySpec::dimension("order__country"),
                    GroupBySpec::time_dimension("metric_time", "MONTH"),
                ])
                .with_order_by([OrderByGroupBy::new("metric_time")
                    .with_grain("MONTH")
                    .descending()])
                .with_limit(10),
        )
        .await
        .unwrap();

    assert_eq!(ids(table.batches()), vec![10, 20]);
    assert!(metadata.requests().await.is_empty());
    assert_eq!(
        columnar.queries().await,
        vec![concat!(
            "SELECT * FROM {{ semantic_layer.query(",
            "group_by=[Dimension(\"order__country\"),TimeDimension(\"metric_time\",\"month\")],",
            "limit=10,",
            "metrics=[\"revenue\",\"orders\"],",
            "order_by=[Dimension(\"metric_time\").grain(\"month\").descending(True)],",
            "read_cache=True) }}"
        )]
    );
}

#[tokio::test]
async fn test_dimension_values() {
    init_test_tracing();
    let columnar = MockColumnarTransport::new(encode_ipc(&id_name_batch(&[1], &["nl"])));
    let (client, metadata) = open_client(&columnar).await;

    let table = client
        .dimension_values(&DimensionValuesParameters::new(
            "order__country",
            ["revenue"],
        ))
        .await
        .unwrap();

    assert_eq!(table.num_rows(), 1);
    assert!(metadata.requests().await.is_empty());
    assert_eq!(
        columnar.queries().await,
        vec![
            "SELECT * FROM {{ semantic_layer.dimension_values(group_by=\"order__country\",metrics=[\"revenue\"]) }}"
        ]
    );
}

#[tokio::test]
async fn test_dimension_values_requires_group_by() {
    init_test_tracing();
    let columnar = MockColumnarTransport::new(Vec::new());
    let (client, _) = open_client(&columnar).await;

    let err = client
        .dimension_values(&DimensionValuesParameters::new("", ["revenue"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidQuery);
    assert!(columnar.queries().await.is_empty());
}

#[tokio::test]
async fn test_columnar_errors_are_mapped() {
    init_test_tracing();
    let columnar = MockColumnarTransport::failing(ColumnarTransportError::new(
        ColumnarStatusCode::InvalidArgument,
        "metric `missing` does not exist",
    ));
    let (mut client, _) = open_client(&columnar).await;
    client
        .set_route(Operation::Query, Backend::Columnar)
        .unwrap();

    let err = client
        .query(&QueryParameters::adhoc(["missing"]))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailed);
    assert_eq!(err.detail(), Some("metric `missing` does not exist"));
}
