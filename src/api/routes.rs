//! Crash API route handlers.
//!
//! All endpoints return JSON. The engine is shared via `Arc<RoundEngine>`;
//! every engine call is synchronous and returns immediately.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::engine::RoundEngine;
use crate::types::{CrashError, RoundSnapshot};

pub type AppState = Arc<RoundEngine>;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default, alias = "wager")]
    pub bet: Option<f64>,
}

impl StartRequest {
    fn wager(&self) -> Option<Decimal> {
        self.bet.and_then(Decimal::from_f64)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub message: String,
    pub round_id: Uuid,
    pub bet: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crash_point: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CashoutResponse {
    pub message: String,
    pub winnings: Decimal,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Round rejections map to `400 Bad Request`.
#[derive(Debug)]
pub struct ApiError(pub CrashError);

impl From<CrashError> for ApiError {
    fn from(e: CrashError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/crash/start
///
/// A missing or malformed body is treated as "no wager given".
pub async fn start_round(
    State(engine): State<AppState>,
    body: Option<Json<StartRequest>>,
) -> Result<Json<StartResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let started = engine.start(request.wager())?;
    Ok(Json(StartResponse {
        message: "Round started".into(),
        round_id: started.round_id,
        bet: started.wager,
        crash_point: started.crash_point,
    }))
}

/// POST /api/crash/cashout
pub async fn cash_out(State(engine): State<AppState>) -> Result<Json<CashoutResponse>, ApiError> {
    let lock_in = engine.attempt_lock_in()?;
    Ok(Json(CashoutResponse {
        message: "Cashed out".into(),
        winnings: lock_in.payout,
        multiplier: lock_in.multiplier,
    }))
}

/// GET /api/crash/state
pub async fn get_state(State(engine): State<AppState>) -> Json<RoundSnapshot> {
    Json(engine.snapshot())
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
