use sl_client::client::{Backend, Operation, SemanticLayerClient};
use sl_client::error::ErrorKind;
use sl_client::params::{DimensionValuesParameters, QueryParameters};
use sl_client::runtime::TokioRuntime;
use sl_client::test_utils::columnar::MockColumnarTransport;
use sl_client::test_utils::config::test_client_config;
use sl_client::test_utils::metadata::{MockMetadataTransport, QueryScript};
use sl_telemetry::tracing::init_test_tracing;

fn transports() -> (MockMetadataTransport, MockColumnarTransport) {
    (
        MockMetadataTransport::new(QueryScript::new("q", vec![])),
        MockColumnarTransport::new(Vec::new()),
    )
}

#[tokio::test]
async fn test_every_operation_requires_a_session() {
    init_test_tracing();
    let (metadata, columnar) = transports();
    let client = SemanticLayerClient::new(
        &test_client_config(),
        metadata.clone(),
        columnar.clone(),
        TokioRuntime,
    );
    let params = QueryParameters::adhoc(["revenue"]);
    let metrics = vec!["revenue".to_string()];

    let errors = vec![
        client.metrics().await.unwrap_err(),
        client.dimensions(&metrics).await.unwrap_err(),
        client.measures(&metrics).await.unwrap_err(),
        client.entities(&metrics).await.unwrap_err(),
        client.saved_queries().await.unwrap_err(),
        client.compile_sql(&params).await.unwrap_err(),
        client.query(&params).await.unwrap_err(),
        client
            .dimension_values(&DimensionValuesParameters::new("country", ["revenue"]))
            .await
            .unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.kind(), ErrorKind::Session);
    }
    assert!(metadata.requests().await.is_empty());
    assert!(columnar.queries().await.is_empty());
}

#[tokio::test]
async fn test_session_opens_and_closes_both_backends() {
    init_test_tracing();
    let (metadata, columnar) = transports();
    let mut client = SemanticLayerClient::new(
        &test_client_config(),
        metadata.clone(),
        columnar.clone(),
        TokioRuntime,
    );

    client.open_session().await.unwrap();
    assert!(client.has_session());

    let err = client.open_session().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);

    client.close_session().await.unwrap();
    assert!(!client.has_session());

    assert_eq!(metadata.opened().await, 1);
    assert_eq!(metadata.closed().await, 1);
    assert_eq!(columnar.opened().await, 1);
    assert_eq!(columnar.closed().await, 1);

    let err = client.metrics().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Session);
}

#[tokio::test]
async fn test_closing_without_session_reports_both_backends() {
    init_test_tracing();
    let (metadata, columnar) = transports();
    let mut client =
        SemanticLayerClient::new(&test_client_config(), metadata, columnar, TokioRuntime);

    let err = client.close_session().await.unwrap_err();

    assert_eq!(err.kinds(), vec![ErrorKind::Session, ErrorKind::Session]);
}

#[tokio::test]
async fn test_invalid_routes_are_rejected() {
    init_test_tracing();
    let (metadata, columnar) = transports();
    let mut client =
        SemanticLayerClient::new(&test_client_config(), metadata, columnar, TokioRuntime);

    let err = client
        .set_route(Operation::CompileSql, Backend::Columnar)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    assert_eq!(client.routes().route(Operation::CompileSql), Backend::Metadata);
}
