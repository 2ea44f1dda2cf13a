//! HTTP contract tests for the concrete backend clients.
//!
//! Each test mounts a `wiremock` server standing in for the provider API and
//! checks request shape, response parsing, and error mapping through the
//! invoker.

use std::time::Duration;

use scholar_dispatch::backends::{AdsClient, SemanticScholarClient};
use scholar_dispatch::invoker::invoke;
use scholar_dispatch::{BackendClient, BackendConfig, BackendFailureKind, ClientError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn ads_sends_bearer_token_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/search/query"))
        .and(header("authorization", "Bearer secret-token"))
        .and(query_param("q", "dark matter"))
        .and(query_param("rows", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"numFound": 2, "docs": [
                {"bibcode": "2019ApJ...1A", "doi": ["10.1/a"], "title": ["Halo profiles"], "year": "2019"},
                {"bibcode": "2020MNRAS..2B", "title": ["Subhalo counts"]}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdsClient::new(format!("{}/v1/search/query", server.uri()), "secret-token")
        .expect("client")
        .with_rows(10);
    let docs = client
        .search("dark matter", Duration::from_secs(5))
        .await
        .expect("search");

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].doc_id.as_deref(), Some("10.1/a"));
    assert_eq!(docs[0].year, Some(2019));
    assert_eq!(docs[1].doc_id.as_deref(), Some("2020MNRAS..2B"));
}

#[tokio::test]
async fn ads_server_error_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = AdsClient::new(server.uri(), "t").expect("client");
    let err = client.search("q", Duration::from_secs(5)).await.unwrap_err();
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn ads_garbage_body_is_malformed_through_invoker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = AdsClient::new(server.uri(), "t").expect("client");
    let backend = BackendConfig::new("ads", 1);
    let err = invoke(&backend, &client, "q").await.unwrap_err();
    assert_eq!(err.kind, BackendFailureKind::Malformed);
}

#[tokio::test]
async fn slow_provider_times_out_through_invoker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = SemanticScholarClient::new(server.uri(), None).expect("client");
    let backend = BackendConfig::new("semanticScholar", 1).with_timeout_seconds(0.1);
    let err = invoke(&backend, &client, "q").await.unwrap_err();
    assert_eq!(err.kind, BackendFailureKind::Timeout);
}

#[tokio::test]
async fn semantic_scholar_sends_api_key_and_parses_papers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(header("x-api-key", "s2-key"))
        .and(query_param("query", "galaxy mergers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "data": [
                {"paperId": "p1", "title": "Mergers I", "externalIds": {"DOI": "10.2/m1"}, "year": 2015, "citationCount": 30},
                {"paperId": "p2", "title": "Mergers II", "externalIds": null}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SemanticScholarClient::new(
        format!("{}/graph/v1/paper/search", server.uri()),
        Some("s2-key".into()),
    )
    .expect("client");
    let backend = BackendConfig::new("semanticScholar", 3).with_min_results(5);
    let invocation = invoke(&backend, &client, "galaxy mergers").await.expect("invoke");

    assert!(invocation.below_threshold);
    assert_eq!(invocation.results.len(), 2);
    assert_eq!(invocation.results[0].doc_id, "10.2/m1");
    assert_eq!(invocation.results[0].citation_count, Some(30));
    assert_eq!(invocation.results[1].doc_id, "p2");
    assert_eq!(invocation.results[1].rank, 2);
}

#[tokio::test]
async fn unreachable_provider_is_unavailable() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let client = SemanticScholarClient::new("http://127.0.0.1:9/search", None).expect("client");
    let backend = BackendConfig::new("semanticScholar", 1).with_timeout_seconds(5.0);
    let err = invoke(&backend, &client, "q").await.unwrap_err();
    assert_eq!(err.kind, BackendFailureKind::Unavailable);
}
