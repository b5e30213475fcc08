use crate::state::State;
use axum::{
    extract::{Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use scannerpro::quote::Status;
use scannerpro::universe::DEFAULT_UNIVERSE;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Deserialize)]
pub struct QueryParameters {
    universe: Option<String>,
}

#[derive(Serialize, Debug)]
struct BulkQuotesError {
    status: Status,
    message: String,
    universe: String,
}

pub async fn fetch(
    AxumState(state): AxumState<State>,
    Query(parameters): Query<QueryParameters>,
) -> Response {
    let universe = parameters
        .universe
        .unwrap_or(DEFAULT_UNIVERSE.to_string());

    info!("Bulk quotes requested for {} universe", universe);

    match state.fetcher.fetch_universe(&universe).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            error!("Bulk quotes error: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BulkQuotesError {
                    status: Status::Error,
                    message: format!("Error in FMP bulk quotes: {}", err),
                    universe,
                }),
            )
                .into_response()
        }
    }
}
