//! Integration tests for the HTTP API endpoints.
//!
//! Uses axum's oneshot pattern (via tower::ServiceExt), so no TCP binding needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fiscal_core::{config::EngineConfig, params::SimulationParameters};
use fiscal_server::server::{create_router, AppState};

fn app_with(config: EngineConfig) -> axum::Router {
    create_router(Arc::new(AppState { config }))
}

fn app() -> axum::Router {
    app_with(EngineConfig::default_test())
}

/// Parse response body as JSON.
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: String) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn params_json(anos: u32) -> String {
    serde_json::to_string(&SimulationParameters { anos, ..SimulationParameters::default() })
        .unwrap()
}

// ── GET ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn default_parameters_are_complete() {
    let resp = app()
        .oneshot(Request::get("/api/parametros-default").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    for field in ["anos", "tc_base", "tc_coef_z", "iva_mi_base", "subsidio_diesel_venta", "iehd_activo"] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    // Names the parameter editor reads.
    for field in ["cv_base", "gasto_corriente_base", "gasolina_precio_importacion_base", "diesel_precio_venta_domestico"] {
        assert!(json[field].is_number(), "missing legacy {field}");
    }

    // Posting the defaults back must be accepted as-is.
    let params = SimulationParameters::from_json(&json.to_string()).unwrap();
    assert_eq!(params, SimulationParameters::default());
}

#[tokio::test]
async fn served_defaults_with_an_edited_legacy_field_simulate() {
    let resp = app()
        .oneshot(Request::get("/api/parametros-default").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut params = body_json(resp.into_body()).await;
    params["anos"] = serde_json::json!(2);
    params["cv_base"] = serde_json::json!(4.2e9);
    params["cv_coef_z"] = serde_json::json!(0.0);

    let resp = app()
        .oneshot(post_json("/api/simular", params.to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    let first = &json["resultados"][0];
    let conceptos = first["ing_conceptos_varios"].as_f64().unwrap();
    assert!((conceptos - 4_200.0).abs() < 1e-6, "edited cv_base ignored: {conceptos}");
}

#[tokio::test]
async fn scenarios_are_listed() {
    let resp = app()
        .oneshot(Request::get("/api/escenarios").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    let keys: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["clave"].as_str().unwrap())
        .collect();
    assert!(keys.contains(&"crisis_commodities"));
    assert_eq!(keys.len(), 8);
}

// ── POST /api/simular ────────────────────────────────────────────────

#[tokio::test]
async fn simulate_returns_one_result_per_year() {
    let resp = app()
        .oneshot(post_json("/api/simular", params_json(4)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;

    let resultados = json["resultados"].as_array().unwrap();
    assert_eq!(resultados.len(), 4);
    assert_eq!(resultados[0]["ano"], 2021);
    assert!(resultados[0]["deficit_superavit"].is_number());
    assert!(!json["pasos"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn simulate_rejects_invalid_horizon_with_detail() {
    let resp = app()
        .oneshot(post_json("/api/simular", params_json(21)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp.into_body()).await;
    assert!(json["detail"].as_str().unwrap().contains("anos"));
}

#[tokio::test]
async fn simulate_rejects_malformed_body() {
    let resp = app()
        .oneshot(post_json("/api/simular", "{\"anos\": ".to_string()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp.into_body()).await;
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn simulate_reports_computation_failure_as_500() {
    let runaway = SimulationParameters {
        anos: 2,
        pib_inicial: 1e308,
        crecimiento_pib: 100.0,
        ..SimulationParameters::default()
    };
    let resp = app()
        .oneshot(post_json("/api/simular", serde_json::to_string(&runaway).unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(resp.into_body()).await;
    assert!(json["detail"].as_str().unwrap().contains("'pib'"));
}

// ── POST /api/simular-monte-carlo ────────────────────────────────────

#[tokio::test]
async fn monte_carlo_returns_distributions() {
    let resp = app()
        .oneshot(post_json(
            "/api/simular-monte-carlo?num_simulaciones=40&semilla=12",
            params_json(3),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;

    assert_eq!(json["num_simulaciones"], 40);
    assert_eq!(json["semilla"], 12);
    assert_eq!(json["metodo"], "Monte Carlo (Box-Muller, 40 iteraciones)");
    let years = json["resultados_estadisticos"].as_array().unwrap();
    assert_eq!(years.len(), 3);
    assert!(years[0]["deuda_pib_ratio"]["percentil_95"].is_number());
    assert_eq!(years[0]["distribucion_rin"].as_array().unwrap().len(), 40);
    assert_eq!(json["simulacion_representativa"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn monte_carlo_seed_is_reproducible() {
    let run = || async {
        let resp = app()
            .oneshot(post_json(
                "/api/simular-monte-carlo?num_simulaciones=25&semilla=4",
                params_json(2),
            ))
            .await
            .unwrap();
        body_json(resp.into_body()).await
    };
    assert_eq!(run().await, run().await);
}

#[tokio::test]
async fn monte_carlo_rejects_out_of_range_iterations() {
    let resp = app_with(EngineConfig::default())
        .oneshot(post_json("/api/simular-monte-carlo?num_simulaciones=10", params_json(2)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp.into_body()).await;
    assert!(json["detail"].as_str().unwrap().contains("num_simulaciones"));
}

#[tokio::test]
async fn monte_carlo_rejects_non_numeric_iterations() {
    let resp = app()
        .oneshot(post_json("/api/simular-monte-carlo?num_simulaciones=muchas", params_json(2)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(resp.into_body()).await;
    assert!(json["detail"].is_string());
}
