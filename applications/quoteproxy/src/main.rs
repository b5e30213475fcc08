use quoteproxy::{create_app, State};
use scannerpro::logger::init_tracing;
use scannerpro::Config;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("quoteproxy=info,scannerpro=info,tower_http=info");

    let config = Config::from_env()?;

    let state = State::from_config(&config)?;

    let app = create_app(state);

    let listener = TcpListener::bind(("0.0.0.0", config.server_port)).await?;

    info!("FMP API proxy serving at port {}", config.server_port);

    axum::serve(listener, app).await?;

    Ok(())
}
