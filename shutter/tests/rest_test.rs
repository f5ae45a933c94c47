//! Integration tests for the provider REST client and the cached gateway,
//! run against a local mock server.

use std::time::Duration;

use serde_json::json;
use shutter::*;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn photo_json(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "urls": {
            "regular": format!("https://images.example/{id}?w=1080"),
            "small": format!("https://images.example/{id}?w=400")
        },
        "alt_description": "a mountain lake",
        "user": { "name": "Ansel", "username": "ansel" },
        "likes": 12
    })
}

fn client(server: &MockServer) -> UnsplashHttpClient {
    UnsplashHttpClient::new(&server.uri(), "test-key", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_photos_sends_mapped_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .and(header("authorization", "Client-ID test-key"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "20"))
        .and(query_param("order_by", "popular"))
        .and(query_param("color", "teal"))
        .and(query_param_is_missing("orientation"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([photo_json("a"), photo_json("b")]))
                .insert_header("x-total", "42"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let filters = FilterSet::new(OrderBy::Views, Color::Teal, Orientation::All);
    let page = client(&server)
        .list_photos(&PageRequest::new(2, 20, filters))
        .await
        .unwrap();

    assert_eq!(page.total, 42);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, "a");
    assert_eq!(page.items[0].author.as_ref().unwrap().username, "ansel");
}

#[tokio::test]
async fn test_list_photos_accepts_results_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [photo_json("x")], "total": 7 })),
        )
        .mount(&server)
        .await;

    let page = client(&server)
        .list_photos(&PageRequest::new(1, 20, FilterSet::default()))
        .await
        .unwrap();
    assert_eq!(page.total, 7);
    assert_eq!(page.items[0].id, "x");
}

#[tokio::test]
async fn test_provider_error_body_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "errors": ["Rate Limit Exceeded"] })),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .list_photos(&PageRequest::new(1, 20, FilterSet::default()))
        .await
        .unwrap_err();
    match err {
        ShutterError::Http { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "Rate Limit Exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_gateway_caches_identical_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([photo_json("a")])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = UpstreamGateway::with_ttl_cache(client(&server), Duration::from_secs(60));
    let request = PageRequest::new(1, 20, FilterSet::default());
    let first = gateway.list(&request).await.unwrap();
    let second = gateway.list(&request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_gateway_maps_malformed_payload_to_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = UpstreamGateway::with_ttl_cache(client(&server), Duration::from_secs(60));
    let request = PageRequest::new(1, 20, FilterSet::default());
    for _ in 0..2 {
        let err = gateway.list(&request).await.unwrap_err();
        assert!(matches!(err, ShutterError::Upstream(ref m) if m.contains("malformed")));
    }
}
