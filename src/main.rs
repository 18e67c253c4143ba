mod api;
mod client;
mod config;
mod error;
mod metrics;
mod orchestrator;
mod session;
mod signer;
mod state;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::client::ShopeeClient;
use crate::config::{Config, TREND_WINDOW_DAYS};
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::state::StoreRegistry;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    info!(
        base_url = %cfg.api_base_url,
        partner_id = %cfg.partner_id,
        trend_window_days = TREND_WINDOW_DAYS,
        "starting seller dashboard pipeline"
    );

    let client = Arc::new(ShopeeClient::new(&cfg)?);
    // The registry starts empty, stores arrive over the API.
    let registry = StoreRegistry::new();
    info!("No stores registered yet; link one via POST /stores before requesting a dashboard");
    let orchestrator = Arc::new(Orchestrator::new(client, registry));

    let app = router(ApiState::new(orchestrator));
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
