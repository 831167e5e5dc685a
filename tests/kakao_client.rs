use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use location_analysis::gateway::{
    AmenityCategory, AmenityGateway, GatewayError, GeocodeGateway, KakaoClient,
};
use location_analysis::geo::Coordinate;

const SEOUL: Coordinate = Coordinate {
    latitude: 37.5665,
    longitude: 126.978,
};

fn client(server: &MockServer) -> KakaoClient {
    KakaoClient::new(&server.uri(), "test-key", Duration::from_secs(2))
        .expect("failed to build test KakaoClient")
}

fn cafe() -> &'static AmenityCategory {
    AmenityCategory::by_code("CE7").expect("CE7 is a known category")
}

#[tokio::test]
async fn reverse_geocode_reads_road_and_lot_address() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/geo/coord2address.json"))
        .and(header("Authorization", "KakaoAK test-key"))
        .and(query_param("x", "126.978"))
        .and(query_param("y", "37.5665"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": {"total_count": 1},
            "documents": [{
                "road_address": {"address_name": "서울특별시 중구 세종대로 110"},
                "address": {"address_name": "서울 중구 태평로1가 31"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let address = client(&server).reverse_geocode(SEOUL).await.unwrap();

    assert_eq!(address.road_address.as_deref(), Some("서울특별시 중구 세종대로 110"));
    assert_eq!(address.lot_address.as_deref(), Some("서울 중구 태평로1가 31"));
}

#[tokio::test]
async fn reverse_geocode_without_road_address_falls_back_to_lot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/geo/coord2address.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{
                "road_address": null,
                "address": {"address_name": "서울 종로구 세종로 1-68"}
            }]
        })))
        .mount(&server)
        .await;

    let address = client(&server).reverse_geocode(SEOUL).await.unwrap();

    assert!(address.road_address.is_none());
    assert_eq!(address.best(), Some("서울 종로구 세종로 1-68"));
}

#[tokio::test]
async fn reverse_geocode_with_no_documents_is_a_payload_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/geo/coord2address.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .mount(&server)
        .await;

    let result = client(&server).reverse_geocode(SEOUL).await;

    assert!(
        matches!(result, Err(GatewayError::Payload(_))),
        "expected Payload error, got: {result:?}"
    );
}

#[tokio::test]
async fn category_search_parses_places() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/search/category.json"))
        .and(query_param("category_group_code", "CE7"))
        .and(query_param("radius", "500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [
                {"place_name": "시청 카페", "x": "126.9785", "y": "37.5670"},
                {"place_name": "광장 카페", "x": "126.9790", "y": "37.5660"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let places = client(&server).search_category(SEOUL, cafe(), 500).await.unwrap();

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].name, "시청 카페");
    assert_eq!(places[0].coordinate, Coordinate::new(37.5670, 126.9785));
}

#[tokio::test]
async fn category_search_rejects_malformed_coordinates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/search/category.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "documents": [{"place_name": "broken", "x": "east", "y": "37.5670"}]
        })))
        .mount(&server)
        .await;

    let result = client(&server).search_category(SEOUL, cafe(), 500).await;

    assert!(matches!(result, Err(GatewayError::Payload(_))), "got: {result:?}");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/search/category.json"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = client(&server).search_category(SEOUL, cafe(), 500).await;

    assert!(matches!(result, Err(GatewayError::Status(429))), "got: {result:?}");
}

#[tokio::test]
async fn slow_upstream_hits_client_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/local/geo/coord2address.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"documents": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = KakaoClient::new(&server.uri(), "test-key", Duration::from_millis(100)).unwrap();
    let result = client.reverse_geocode(SEOUL).await;

    assert!(matches!(result, Err(GatewayError::Http(_))), "got: {result:?}");
}
