use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use tourism_marketplace::adapters::postgrest::client::PostgrestStore;
use tourism_marketplace::domain::booking::{Booking, BookingStatus};
use tourism_marketplace::domain::listing::Lodging;
use tourism_marketplace::error::MarketError;
use tourism_marketplace::http::{AppState, router};
use tourism_marketplace::ports::store::{Query, Row, TableStore};
use tourism_marketplace::repository::Repository;

use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "anon-key";

fn store(server: &MockServer) -> Arc<PostgrestStore> {
    Arc::new(PostgrestStore::new(&server.uri(), KEY, Duration::from_secs(5)).unwrap())
}

fn lodging_row(id: &str) -> Value {
    json!({
        "id": id,
        "user_id": "prov-1",
        "titulo": "Casa X",
        "descripcion": "",
        "precio_noche": 100000,
        "ubicacion": "Guatapé",
        "capacidad": 4,
        "imagenes": [],
        "disponible": true,
        "created_at": "2025-01-01T10:00:00+00:00",
        "updated_at": "2025-01-01T10:00:00+00:00"
    })
}

fn booking_row(id: &str, estado: &str) -> Value {
    json!({
        "id": id,
        "tipo_servicio": "alojamiento",
        "servicio_id": "aloj-1",
        "user_id": "turista-1",
        "fecha_inicio": "2025-01-01",
        "fecha_fin": "2025-01-04",
        "cantidad_personas": 2,
        "precio_total": 300000,
        "estado": estado,
        "notas": null,
        "created_at": "2025-01-01T10:00:00+00:00",
        "updated_at": "2025-01-01T10:00:00+00:00"
    })
}

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[tokio::test]
async fn select_sends_credentials_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/alojamientos"))
        .and(header("apikey", KEY))
        .and(header("authorization", "Bearer anon-key"))
        .and(query_param("select", "*"))
        .and(query_param("disponible", "eq.true"))
        .and(query_param("capacidad", "gte.3"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([lodging_row("a1")])))
        .expect(1)
        .mount(&server)
        .await;

    let query = Query::new()
        .eq("disponible", true)
        .gte("capacidad", 3)
        .newest_first();
    let rows = store(&server).select("alojamientos", &query).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["titulo"], "Casa X");
}

#[tokio::test]
async fn repository_decodes_backend_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/alojamientos"))
        .and(query_param("id", "eq.a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([lodging_row("a1")])))
        .mount(&server)
        .await;

    let repo: Repository<Lodging> = Repository::new(store(&server));
    let lodging = repo.get("a1").await.unwrap();
    assert_eq!(lodging.capacity, 4);
    assert!((lodging.price_per_night - 100_000.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn missing_row_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/reservas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let repo: Repository<Booking> = Repository::new(store(&server));
    assert!(repo.find_by_id("ghost").await.unwrap().is_none());
    assert!(matches!(
        repo.get("ghost").await.unwrap_err(),
        MarketError::NotFound { .. }
    ));
}

#[tokio::test]
async fn insert_asks_for_the_stored_row() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/alojamientos"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({ "titulo": "Casa X" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([lodging_row("nuevo")])))
        .expect(1)
        .mount(&server)
        .await;

    let inserted = store(&server)
        .insert("alojamientos", row(json!({ "titulo": "Casa X" })))
        .await
        .unwrap();
    assert_eq!(inserted["id"], "nuevo");
}

#[tokio::test]
async fn status_update_patches_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservas"))
        .and(query_param("id", "eq.r1"))
        .and(body_partial_json(json!({ "estado": "confirmada" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([booking_row("r1", "confirmada")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo: Repository<Booking> = Repository::new(store(&server));
    let booking = repo
        .update_status("r1", BookingStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn update_of_missing_row_is_a_storage_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/reservas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = store(&server)
        .update("reservas", "ghost", row(json!({ "estado": "cancelada" })))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Storage { .. }));
}

#[tokio::test]
async fn delete_targets_one_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/resenas"))
        .and(query_param("id", "eq.r9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).delete("resenas", "r9").await.unwrap();
}

#[tokio::test]
async fn backend_message_becomes_storage_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/alimentos"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "42703",
            "message": "column alimentos.precios does not exist"
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .select("alimentos", &Query::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Storage { .. }));
    assert!(err.to_string().contains("precios does not exist"));
}

#[tokio::test]
async fn malformed_backend_body_is_a_storage_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/alimentos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = store(&server)
        .select("alimentos", &Query::new())
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Storage { .. }));
}

#[tokio::test]
async fn backend_failure_is_a_server_error_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/alojamientos"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let app = router(
        AppState::new(store(&server), "test"),
        Duration::from_secs(60),
    );
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/alojamientos")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}
