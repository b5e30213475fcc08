use crate::bulk_quotes;
use crate::health;
use crate::quotes;
use crate::responses::{not_found, preflight};
use crate::state::State;
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn create_app(state: State) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::get_health).options(preflight))
        .route("/api/test", get(health::get_health).options(preflight))
        .route(
            "/api/bulk-quotes",
            get(bulk_quotes::fetch)
                .post(bulk_quotes::fetch)
                .options(preflight),
        )
        .route("/api/fmp/quote", get(quotes::get_quote).options(preflight))
        .route(
            "/api/fmp/quote/{ticker}",
            get(quotes::get_quote_by_path).options(preflight),
        )
        .route(
            "/api/fmp/batch-quotes",
            get(quotes::get_batch).options(preflight),
        )
        .route(
            "/api/fmp/realtime-quotes",
            get(quotes::get_realtime).options(preflight),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
