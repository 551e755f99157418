//! End-to-end `POST /calcular` against wiremock-backed geocoding and routing.

use std::io::Write;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use controle_tecnicos::config::Config;
use controle_tecnicos::handlers::{build_app, AppState};
use controle_tecnicos::services::matching::MatchEngine;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_place(server: &MockServer, query: &str, lat: &str, lon: &str) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "lat": lat,
            "lon": lon
        }])))
        .mount(server)
        .await;
}

async fn mount_route(server: &MockServer, route: &str, meters: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/route/v1/driving/{}", route)))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": "Ok",
            "routes": [{ "distance": meters }]
        })))
        .mount(server)
        .await;
}

fn roster_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "NOME,TELEFONE,ENDEREÇO/RESIDENCIA").unwrap();
    writeln!(file, "Bruno,2222,\"Rua B, 20, Campinas - SP\"").unwrap();
    writeln!(file, "Carla,3333,").unwrap();
    writeln!(file, "Ana,1111,\"Rua A, 10, Santos - SP\"").unwrap();
    file.flush().unwrap();
    file
}

fn calcular(address: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/calcular")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::json!({ "endereco": address }).to_string()))
        .unwrap()
}

#[tokio::test]
async fn picks_the_closest_technician_by_road_distance() {
    let geocoder = MockServer::start().await;
    let router = MockServer::start().await;

    mount_place(&geocoder, "Av Paulista, 1000, Sao Paulo - SP, Brasil", "-23.56", "-46.65").await;
    mount_place(&geocoder, "Rua B, 20, Campinas - SP, Brasil", "-22.9", "-47.06").await;
    mount_place(&geocoder, "Rua A, 10, Santos - SP, Brasil", "-23.96", "-46.33").await;

    mount_route(&router, "-47.06,-22.9;-46.65,-23.56", 95_000.0).await;
    mount_route(&router, "-46.33,-23.96;-46.65,-23.56", 72_000.0).await;

    let roster = roster_file();
    let config = Config {
        roster_path: roster.path().to_path_buf(),
        nominatim_url: geocoder.uri(),
        photon_url: None,
        osrm_url: router.uri(),
        ..Config::default()
    };
    let engine = MatchEngine::from_config(&config).expect("engine");
    let app = build_app(AppState::new(engine), None);

    let response = app
        .oneshot(calcular("Av Paulista, 1000, Sao Paulo - SP"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");

    let tecnico = &json["tecnico"];
    assert_eq!(tecnico["NOME"], "Ana");
    assert_eq!(tecnico["TELEFONE"], "1111");
    assert_eq!(tecnico["ENDEREÇO/RESIDENCIA"], "Rua A, 10, Santos - SP");
    assert_eq!(tecnico["coords"]["lat"], -23.96);
    assert_eq!(tecnico["coords"]["lon"], -46.33);
    assert_eq!(tecnico["distanceKm"], "72.00");
    assert_eq!(tecnico["price"], "187.20");
}

#[tokio::test]
async fn unknown_service_address_is_rejected() {
    let geocoder = MockServer::start().await;
    let router = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&geocoder)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&router)
        .await;

    let roster = roster_file();
    let config = Config {
        roster_path: roster.path().to_path_buf(),
        nominatim_url: geocoder.uri(),
        photon_url: None,
        osrm_url: router.uri(),
        ..Config::default()
    };
    let app = build_app(AppState::new(MatchEngine::from_config(&config).expect("engine")), None);

    let response = app.oneshot(calcular("lugar nenhum")).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["error"]["code"], "address_unresolvable");
}

#[tokio::test]
async fn geocoder_outage_is_a_bad_gateway() {
    let geocoder = MockServer::start().await;
    let router = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>Service Unavailable</html>"))
        .expect(1)
        .mount(&geocoder)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&router)
        .await;

    let roster = roster_file();
    let config = Config {
        roster_path: roster.path().to_path_buf(),
        nominatim_url: geocoder.uri(),
        photon_url: None,
        osrm_url: router.uri(),
        ..Config::default()
    };
    let app = build_app(AppState::new(MatchEngine::from_config(&config).expect("engine")), None);

    let response = app
        .oneshot(calcular("Av Paulista, 1000, Sao Paulo - SP"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json parse");
    assert_eq!(json["error"]["code"], "upstream_unavailable");
}
