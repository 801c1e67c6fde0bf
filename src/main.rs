mod api;
mod batch;
mod bootstrap;
mod config;
mod error;
mod ledger;
mod middleware;
mod orders;
mod reconcile;
mod server;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::info;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,disburse=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first so RUST_LOG from it is honoured
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting batch disbursement engine");

    let config = config::Config::from_env()?;
    if config.ledger_api_key.is_empty() {
        tracing::warn!("⚠️  LEDGER_API_KEY not set - ledger calls will be rejected");
    }

    let state = bootstrap::initialize_app_state(&config).await?;

    let app = server::create_app(state, &config).await;

    server::run_server(app, &config.bind_address).await?;

    Ok(())
}
