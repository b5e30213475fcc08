use crate::state::State;
use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use scannerpro::quote::{iso_timestamp, Status};
use serde::Serialize;

pub const ENDPOINTS: &[&str] = &[
    "/api/bulk-quotes?universe=popular",
    "/api/fmp/quote/{ticker}",
    "/api/fmp/batch-quotes?tickers=AAPL,MSFT,...",
    "/api/fmp/realtime-quotes?tickers=AAPL,MSFT,...",
    "/api/test",
];

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: Status,
    pub message: String,
    pub timestamp: String,
    pub api_provider: String,
    pub environment: String,
    pub endpoints: Vec<String>,
    pub universes: Vec<String>,
}

pub async fn get_health(AxumState(state): AxumState<State>) -> Response {
    let health = Health {
        status: Status::Success,
        message: "FMP API Proxy is working with real-time data!".to_string(),
        timestamp: iso_timestamp(Utc::now()),
        api_provider: "Financial Modeling Prep (FMP)".to_string(),
        environment: state.environment.clone(),
        endpoints: ENDPOINTS.iter().map(|endpoint| endpoint.to_string()).collect(),
        universes: state.fetcher.registry().names(),
    };

    (StatusCode::OK, Json(health)).into_response()
}
