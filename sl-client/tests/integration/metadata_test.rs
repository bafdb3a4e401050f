use serde_json::json;
use sl_client::client::SemanticLayerClient;
use sl_client::error::ErrorKind;
use sl_client::models::{DimensionType, EntityType, ExportDestinationType, MetricType};
use sl_client::runtime::TokioRuntime;
use sl_client::test_utils::columnar::MockColumnarTransport;
use sl_client::test_utils::config::test_client_config;
use sl_client::test_utils::metadata::{MockMetadataTransport, QueryScript};
use sl_config::shared::ClientConfig;
use sl_telemetry::tracing::init_test_tracing;

fn listing_script() -> QueryScript {
    QueryScript::new("q", vec![])
        .with_listing(
            "getMetrics",
            json!({"metrics": [
                {
                    "name": "revenue",
                    "description": "Total revenue",
                    "type": "SIMPLE",
                    "label": "Revenue",
                    "requiresMetricTime": false,
                    "queryableGranularities": ["DAY", "WEEK"]
                },
                {
                    "name": "churn",
                    "type": "SOMETHING_FROM_THE_FUTURE"
                }
            ]}),
        )
        .with_listing(
            "getDimensions",
            json!({"dimensions": [{
                "name": "country",
                "qualifiedName": "order__country",
                "type": "CATEGORICAL"
            }]}),
        )
        .with_listing(
            "getEntities",
            json!({"entities": [{"name": "order", "type": "PRIMARY"}]}),
        )
        .with_listing(
            "getMeasures",
            json!({"measures": [{"name": "order_total", "agg": "SUM"}]}),
        )
        .with_listing(
            "getSavedQueries",
            json!({"savedQueries": [{
                "name": "weekly_revenue",
                "queryParams": {
                    "metrics": [{"name": "revenue"}],
                    "groupBy": [{"name": "metric_time", "grain": "WEEK"}],
                    "where": null
                },
                "exports": [{
                    "name": "weekly_export",
                    "config": {"alias": null, "schema": "analytics", "exportAs": "TABLE"}
                }]
            }]}),
        )
}

async fn open_client(
    config: &ClientConfig,
) -> (
    SemanticLayerClient<MockMetadataTransport, MockColumnarTransport, TokioRuntime>,
    MockMetadataTransport,
) {
    let metadata = MockMetadataTransport::new(listing_script());
    let mut client = SemanticLayerClient::new(
        config,
        metadata.clone(),
        MockColumnarTransport::new(Vec::new()),
        TokioRuntime,
    );
    client.open_session().await.unwrap();

    (client, metadata)
}

#[tokio::test]
async fn test_list_metadata() {
    init_test_tracing();
    let (client, metadata) = open_client(&test_client_config()).await;
    let names = vec!["revenue".to_string()];

    let metrics = client.metrics().await.unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].metric_type, MetricType::Simple);
    assert_eq!(metrics[1].metric_type, MetricType::Unknown);

    let dimensions = client.dimensions(&names).await.unwrap();
    assert_eq!(dimensions[0].dimension_type, DimensionType::Categorical);

    let entities = client.entities(&names).await.unwrap();
    assert_eq!(entities[0].entity_type, EntityType::Primary);

    let measures = client.measures(&names).await.unwrap();
    assert_eq!(measures[0].name, "order_total");

    let saved_queries = client.saved_queries().await.unwrap();
    assert_eq!(saved_queries[0].name, "weekly_revenue");
    assert_eq!(
        saved_queries[0].exports[0].config.export_as,
        ExportDestinationType::Table
    );

    assert_eq!(
        metadata.operations().await,
        vec![
            "getMetrics",
            "getDimensions",
            "getEntities",
            "getMeasures",
            "getSavedQueries"
        ]
    );
}

#[tokio::test]
async fn test_lazy_metadata_defers_nested_objects() {
    init_test_tracing();
    let config = ClientConfig {
        lazy_metadata: true,
        ..test_client_config()
    };
    let (client, metadata) = open_client(&config).await;

    let mut metrics = client.metrics().await.unwrap();
    let revenue = &mut metrics[0];
    assert!(revenue.dimensions.is_none());

    let dimensions = revenue.load_dimensions(&client).await.unwrap();
    assert_eq!(dimensions[0].qualified_name, "order__country");
    let entities = revenue.load_entities(&client).await.unwrap();
    assert_eq!(entities[0].name, "order");

    // Loaded objects are kept on the metric.
    revenue.load_dimensions(&client).await.unwrap();

    let requests = metadata.requests().await;
    assert_eq!(requests.len(), 3);
    assert!(!requests[0].query.contains("fragmentDimension"));
    assert_eq!(
        requests[1].variables,
        json!({"environmentId": 123, "metrics": [{"name": "revenue"}]})
    );
}

#[tokio::test]
async fn test_eager_metadata_requests_nested_objects() {
    init_test_tracing();
    let (client, metadata) = open_client(&test_client_config()).await;

    client.metrics().await.unwrap();

    let requests = metadata.requests().await;
    assert!(requests[0].query.contains("...fragmentMetric"));
    assert!(requests[0].query.contains("fragment fragmentDimension on Dimension"));
    assert_eq!(requests[0].variables, json!({"environmentId": 123}));
}

#[tokio::test]
async fn test_unscripted_operation_is_transport_error() {
    init_test_tracing();
    let metadata = MockMetadataTransport::new(QueryScript::new("q", vec![]));
    let mut client = SemanticLayerClient::new(
        &test_client_config(),
        metadata,
        MockColumnarTransport::new(Vec::new()),
        TokioRuntime,
    );
    client.open_session().await.unwrap();

    let err = client.metrics().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}
