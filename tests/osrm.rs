//! Integration tests for `OsrmClient` using wiremock HTTP mocks.

use controle_tecnicos::services::routing::{OsrmClient, OsrmConfig, RoutingService};
use controle_tecnicos::types::Coordinates;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OsrmClient {
    OsrmClient::new(OsrmConfig::new(base_url)).expect("client construction should not fail")
}

fn sao_paulo() -> Coordinates {
    Coordinates { lat: -23.55, lon: -46.63 }
}

fn campinas() -> Coordinates {
    Coordinates { lat: -22.9, lon: -47.06 }
}

#[tokio::test]
async fn distance_is_reported_in_kilometres() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/route/v1/driving/-46.63,-23.55;-47.06,-22.9"))
        .and(query_param("overview", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "Ok",
            "routes": [{ "distance": 95321.4, "duration": 4210.0 }],
            "waypoints": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let km = client
        .distance_km(sao_paulo(), campinas())
        .await
        .expect("route should succeed");

    assert!((km - 95.3214).abs() < 1e-9);
}

#[tokio::test]
async fn no_route_is_infinite_distance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/route/v1/driving/-46.63,-23.55;-47.06,-22.9"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": "NoRoute",
            "message": "Impossible route between points"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let km = client
        .distance_km(sao_paulo(), campinas())
        .await
        .expect("no route is not an error");

    assert!(km.is_infinite());
}

#[tokio::test]
async fn empty_routes_is_infinite_distance() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "Ok",
            "routes": []
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let km = client.distance_km(sao_paulo(), campinas()).await.expect("route should succeed");

    assert_eq!(km, f64::INFINITY);
}

#[tokio::test]
async fn malformed_body_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    assert!(client.distance_km(sao_paulo(), campinas()).await.is_err());
}
