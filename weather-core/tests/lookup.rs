//! Lookup service tests against a mock OpenWeather endpoint.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use tokio::sync::mpsc;
use weather_core::{
    ConditionCategory, ErrorKind, OpenWeatherProvider, WeatherRequest, WeatherService,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEATHER_PATH: &str = "/data/2.5/weather";

fn body(city: &str, country: &str, temp: f64, code: i32) -> serde_json::Value {
    json!({
        "name": city,
        "main": {
            "temp": temp,
            "feels_like": temp - 0.4,
            "temp_min": temp - 3.0,
            "temp_max": temp + 2.0
        },
        "weather": [{"id": code}],
        "sys": {"country": country}
    })
}

fn service_for(server: &MockServer) -> WeatherService {
    let provider = OpenWeatherProvider::new("TEST_KEY".to_string())
        .with_base_url(format!("{}{WEATHER_PATH}", server.uri()));
    WeatherService::new(Arc::new(provider))
}

#[tokio::test]
async fn coordinate_lookup_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("lat", "37.77"))
        .and(query_param("lon", "-122.42"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "TEST_KEY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "San Francisco",
            "main": {"temp": 18.3, "feels_like": 17.9, "temp_min": 15.0, "temp_max": 20.1},
            "weather": [{"id": 800}],
            "sys": {"country": "US"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let weather = svc
        .lookup(&WeatherRequest::coordinate(37.77, -122.42))
        .await
        .unwrap();

    assert_eq!(weather.city_name, "San Francisco");
    assert_eq!(weather.country, "US");
    assert_eq!(weather.temperature_string(), "18");
    assert_eq!(weather.feels_like_temperature_string(), "18");
    assert_eq!(weather.minimum_temperature_string(), "15");
    assert_eq!(weather.maximum_temperature_string(), "20");
    assert_eq!(weather.category(), ConditionCategory::Clear);
}

#[tokio::test]
async fn city_name_is_sent_once_with_percent_twenty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", "New York"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("New York", "US", 12.0, 500)))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let weather = svc.lookup(&WeatherRequest::city(" New  York ")).await.unwrap();
    assert_eq!(weather.category(), ConditionCategory::Rain);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let query = requests[0].url.query().unwrap_or_default();
    assert!(query.starts_with("q=New%20York&"), "query was {query}");
    assert!(query.contains("units=metric"));
}

#[tokio::test]
async fn blank_city_issues_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("X", "XX", 1.0, 800)))
        .expect(0)
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = svc.subscribe(move |w| {
        let _ = tx.send(w.clone());
    });

    assert!(svc.fetch_current_weather(WeatherRequest::city("")).is_none());
    assert!(svc.fetch_current_weather(WeatherRequest::city(" \t ")).is_none());
    let err = svc.lookup(&WeatherRequest::city("   ")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert!(rx.try_recv().is_err());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn not_found_is_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let err = svc.lookup(&WeatherRequest::city("Atlantis")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    let msg = err.to_string();
    assert!(msg.contains("404"), "Error should mention 404 status: {msg}");
    assert!(msg.contains("city not found"));

    assert!(svc.lookup_or_log(&WeatherRequest::city("Atlantis")).await.is_none());
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_failure() {
    let provider = OpenWeatherProvider::new("TEST_KEY".to_string())
        .with_base_url("http://127.0.0.1:1/weather");
    let svc = WeatherService::new(Arc::new(provider));

    let err = svc.lookup(&WeatherRequest::city("Oslo")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

#[tokio::test]
async fn empty_weather_array_is_decode_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Oslo",
            "main": {"temp": 1.0, "feels_like": 1.0, "temp_min": 1.0, "temp_max": 1.0},
            "weather": [],
            "sys": {"country": "NO"}
        })))
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let err = svc.lookup(&WeatherRequest::city("Oslo")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[tokio::test]
async fn malformed_body_is_decode_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let err = svc.lookup(&WeatherRequest::city("Oslo")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
}

#[tokio::test]
async fn overlapping_lookups_deliver_their_own_results() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("lat", "37.77"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body("San Francisco", "US", 18.3, 800))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("q", "Istanbul"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body("Istanbul", "TR", 25.0, 802)))
        .expect(1)
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let mut latest = svc.latest();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = svc.subscribe(move |w| {
        let _ = tx.send(w.clone());
    });

    let slow = svc
        .fetch_current_weather(WeatherRequest::coordinate(37.77, -122.42))
        .unwrap();
    let fast = svc
        .fetch_current_weather(WeatherRequest::city("Istanbul"))
        .unwrap();
    fast.await.unwrap();
    slow.await.unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();

    // Completion order, not issue order.
    assert_eq!(first.city_name, "Istanbul");
    assert_eq!(first.country, "TR");
    assert_eq!(first.category(), ConditionCategory::Cloudy);
    assert_eq!(second.city_name, "San Francisco");
    assert_eq!(second.country, "US");
    assert_eq!(second.category(), ConditionCategory::Clear);

    assert!(latest.has_changed().unwrap());
    let last = latest.borrow_and_update().clone().unwrap();
    assert_eq!(last.city_name, "San Francisco");
}

#[tokio::test]
async fn shutdown_cancels_slow_lookup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body("Oslo", "NO", 3.0, 600))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let svc = service_for(&server);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = svc.subscribe(move |w| {
        let _ = tx.send(w.clone());
    });

    let handle = svc.fetch_current_weather(WeatherRequest::city("Oslo")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    svc.shutdown();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("cancelled lookup should finish promptly")
        .unwrap();

    assert!(rx.try_recv().is_err());
    assert!(svc.latest().borrow().is_none());
}
