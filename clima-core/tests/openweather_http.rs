//! HTTP-level tests for the OpenWeatherMap provider and IP geolocation,
//! served by a local wiremock server.

use clima_core::{
    Coordinate, GeoLocator, LocationError, WeatherError, WeatherIcon, WeatherProvider, WeatherQuery,
    location::{IpLocationSource, Permission},
    provider::openweather::OpenWeatherProvider,
};
use std::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url(format!("{}/data/2.5/weather", server.uri()))
}

#[tokio::test]
async fn city_query_sends_q_and_appid() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 290},
            "name": "Paris",
            "weather": [{"id": 800}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = WeatherQuery::by_city("Paris", "KEY");
    let record = provider(&server).fetch(&query).await.unwrap();

    assert_eq!(record.city_name, "Paris");
    assert_eq!(record.temperature_kelvin, 290.0);
    assert_eq!(record.icon(), WeatherIcon::Clear);
}

#[tokio::test]
async fn coordinate_query_sends_lat_lon() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("lat", "51.5"))
        .and(query_param("lon", "-0.12"))
        .and(query_param("appid", "KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "main": {"temp": 283.7},
            "name": "London",
            "weather": [{"id": 521}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = WeatherQuery::by_coordinate(Coordinate::new(51.5, -0.12), "KEY");
    let record = provider(&server).fetch(&query).await.unwrap();

    assert_eq!(record.city_name, "London");
    assert_eq!(record.icon(), WeatherIcon::Rain);
}

#[tokio::test]
async fn unknown_city_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let query = WeatherQuery::by_city("Nowhere", "KEY");
    let err = provider(&server).fetch(&query).await.unwrap_err();
    assert!(matches!(err, WeatherError::Parse(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let base_url = format!("http://127.0.0.1:{port}/data/2.5/weather");
    let query = WeatherQuery::by_city("Paris", "KEY");
    let err = OpenWeatherProvider::with_base_url(base_url)
        .fetch(&query)
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherError::Network(_)));
}

#[tokio::test]
async fn ip_location_success_yields_coordinate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 48.8566,
            "lon": 2.3522
        })))
        .mount(&server)
        .await;

    let url = format!("{}/json/", server.uri());
    let source = IpLocationSource::with_url(url, Permission::Granted);
    let coordinate = GeoLocator::new(source).request_once().await.unwrap();

    assert_eq!(coordinate, Some(Coordinate::new(48.8566, 2.3522)));
}

#[tokio::test]
async fn ip_location_failure_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "reserved range"
        })))
        .mount(&server)
        .await;

    let url = format!("{}/json/", server.uri());
    let source = IpLocationSource::with_url(url, Permission::Granted);
    let err = GeoLocator::new(source).request_once().await.unwrap_err();

    assert_eq!(err, LocationError::Unavailable("reserved range".into()));
}
