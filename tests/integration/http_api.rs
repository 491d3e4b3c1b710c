//! JSON API flows through the Axum router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use crash::api::build_router;
use crash::config::{CrashPointDisclosure, EngineConfig, ServerConfig};
use crash::engine::sampler::{CrashPointSampler, ScriptedSource};
use crash::engine::scheduler::ManualScheduler;
use crash::engine::RoundEngine;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn router(config: EngineConfig, draws: Vec<f64>) -> (Router, ManualScheduler) {
    let ticks = ManualScheduler::new();
    let engine = RoundEngine::new(config, Arc::new(ticks.clone()))
        .with_sampler(CrashPointSampler::new(ScriptedSource::new(draws)));
    let app = build_router(Arc::new(engine), &ServerConfig::default()).unwrap();
    (app, ticks)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_full_round_over_http() {
    let (app, ticks) = router(EngineConfig::default(), vec![0.9, 0.5]);

    let (status, started) = call(&app, "POST", "/api/crash/start", Some(json!({"bet": 50}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["message"], "Round started");
    assert_eq!(started["bet"].as_f64().unwrap(), 50.0);
    assert!(started.get("crashPoint").is_none());

    let (status, again) = call(&app, "POST", "/api/crash/start", Some(json!({"bet": 5}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(again["code"], "RoundAlreadyActive");

    for _ in 0..5 {
        ticks.fire();
    }
    let (_, state) = call(&app, "GET", "/api/crash/state", None).await;
    assert_eq!(state["gameState"], "running");
    assert_eq!(state["multiplier"].as_f64().unwrap(), 1.05);
    assert!(state["crashPoint"].is_null());

    let (status, cashout) = call(&app, "POST", "/api/crash/cashout", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cashout["winnings"].as_f64().unwrap(), 52.5);
    assert_eq!(cashout["multiplier"].as_f64().unwrap(), 1.05);

    let (status, twice) = call(&app, "POST", "/api/crash/cashout", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(twice["code"], "AlreadyLockedIn");

    ticks.fire_until_idle(1_000);
    let (_, state) = call(&app, "GET", "/api/crash/state", None).await;
    assert_eq!(state["gameState"], "crashed");
    assert_eq!(state["crashPoint"].as_f64().unwrap(), 4.25);
    assert_eq!(state["cashedOut"], true);
    assert_eq!(state["winnings"].as_f64().unwrap(), 52.5);
    assert_eq!(state["cashoutMultiplier"].as_f64().unwrap(), 1.05);
    assert_eq!(state["history"], json!([4.25]));
    assert_eq!(state["bet"].as_f64().unwrap(), 50.0);
}

#[tokio::test]
async fn test_invalid_bet_falls_back_to_default() {
    let (app, ticks) = router(EngineConfig::default(), vec![0.0, 0.0, 0.0]);

    let (_, started) = call(&app, "POST", "/api/crash/start", Some(json!({"bet": -3}))).await;
    assert_eq!(started["bet"].as_f64().unwrap(), 10.0);
    ticks.fire();

    let (_, started) = call(&app, "POST", "/api/crash/start", Some(json!({"bet": "lots"}))).await;
    assert_eq!(started["bet"].as_f64().unwrap(), 10.0);
    ticks.fire();

    let (_, started) = call(&app, "POST", "/api/crash/start", Some(json!({"wager": 7.5}))).await;
    assert_eq!(started["bet"].as_f64().unwrap(), 7.5);
}

#[tokio::test]
async fn test_always_disclosure_exposes_crash_point() {
    let config = EngineConfig {
        crash_point_disclosure: CrashPointDisclosure::Always,
        ..EngineConfig::default()
    };
    let (app, _ticks) = router(config, vec![0.5, 0.25]);

    let (_, started) = call(&app, "POST", "/api/crash/start", None).await;
    assert_eq!(started["crashPoint"].as_f64().unwrap(), 1.25);

    let (_, state) = call(&app, "GET", "/api/crash/state", None).await;
    assert_eq!(state["gameState"], "running");
    assert_eq!(state["crashPoint"].as_f64().unwrap(), 1.25);
}

#[tokio::test]
async fn test_instant_crash_over_http() {
    let (app, ticks) = router(EngineConfig::default(), vec![0.0]);
    call(&app, "POST", "/api/crash/start", Some(json!({"bet": 10}))).await;
    ticks.fire();

    let (status, body) = call(&app, "POST", "/api/crash/cashout", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "NoActiveRound");

    let (_, state) = call(&app, "GET", "/api/crash/state", None).await;
    assert_eq!(state["gameState"], "crashed");
    assert_eq!(state["winnings"].as_f64().unwrap(), 0.0);
    assert_eq!(state["multiplier"].as_f64().unwrap(), 1.01);
}

#[tokio::test]
async fn test_oversized_bet_cannot_overflow_cash_out() {
    let (app, ticks) = router(EngineConfig::default(), vec![0.9, 0.5]);

    let (status, started) = call(&app, "POST", "/api/crash/start", Some(json!({"bet": 7.5e28}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["bet"].as_f64().unwrap(), 10.0);

    for _ in 0..6 {
        ticks.fire();
    }
    let (status, cashout) = call(&app, "POST", "/api/crash/cashout", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cashout["winnings"].as_f64().unwrap(), 10.6);
    assert_eq!(cashout["multiplier"].as_f64().unwrap(), 1.06);
}
