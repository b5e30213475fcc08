use crate::responses::{error_response, upstream_error, ErrorResponse};
use crate::state::State;
use axum::{
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use scannerpro::fetcher::{BATCH_QUOTES_LIMIT, REALTIME_QUOTES_LIMIT};
use scannerpro::quote::{parse_tickers, QuoteDetail, Status};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DEFAULT_TICKER: &str = "AAPL";

const DEFAULT_TICKERS: &str = "AAPL,MSFT,NVDA,GOOGL,TSLA";

#[derive(Deserialize)]
pub struct QuoteParameters {
    ticker: Option<String>,
}

#[derive(Deserialize)]
pub struct TickersParameters {
    tickers: Option<String>,
}

#[derive(Serialize, Debug)]
struct QuoteResponse {
    status: Status,
    quote: QuoteDetail,
}

pub async fn get_quote(
    AxumState(state): AxumState<State>,
    Query(parameters): Query<QuoteParameters>,
) -> Response {
    let ticker = parameters.ticker.unwrap_or(DEFAULT_TICKER.to_string());

    quote_response(&state, &ticker).await
}

pub async fn get_quote_by_path(
    AxumState(state): AxumState<State>,
    Path(ticker): Path<String>,
) -> Response {
    quote_response(&state, &ticker).await
}

async fn quote_response(state: &State, ticker: &str) -> Response {
    match state.fetcher.fetch_quote(ticker).await {
        Ok(Some(quote)) => {
            info!(
                "Real-time quote: {} = {} ({:+.2}%)",
                quote.ticker, quote.price, quote.change
            );
            (
                StatusCode::OK,
                Json(QuoteResponse {
                    status: Status::Success,
                    quote,
                }),
            )
                .into_response()
        }
        Ok(None) => {
            let message = format!("No real-time data found for {}", ticker);
            (StatusCode::OK, Json(ErrorResponse::new(message))).into_response()
        }
        Err(err) => {
            warn!("Quote error for {}: {}", ticker, err);
            upstream_error(
                &err,
                &format!("Error fetching real-time quote for {}", ticker),
            )
        }
    }
}

pub async fn get_batch(
    AxumState(state): AxumState<State>,
    Query(parameters): Query<TickersParameters>,
) -> Response {
    let tickers = parse_tickers(
        parameters.tickers.as_deref().unwrap_or(DEFAULT_TICKERS),
        BATCH_QUOTES_LIMIT,
    );

    if tickers.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No tickers provided".to_string());
    }

    match state.fetcher.fetch_batch(&tickers).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            warn!("Batch quotes error: {}", err);
            upstream_error(&err, "Error in FMP batch quotes")
        }
    }
}

pub async fn get_realtime(
    AxumState(state): AxumState<State>,
    Query(parameters): Query<TickersParameters>,
) -> Response {
    let tickers = parse_tickers(
        parameters.tickers.as_deref().unwrap_or(DEFAULT_TICKERS),
        REALTIME_QUOTES_LIMIT,
    );

    if tickers.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "No tickers provided".to_string());
    }

    info!("Fetching REAL-TIME quotes for: {}", tickers.join(", "));

    match state.fetcher.fetch_realtime(&tickers).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            warn!("Real-time quotes error: {}", err);
            upstream_error(&err, "Error in FMP real-time quotes")
        }
    }
}
