mod accounts;
mod app;
mod bootstrap;
mod config;
mod db;
mod error;
mod ledger;
mod state;
mod transactions;
mod users;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::state::AppState;

/// `RUST_LOG` picks the filter; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ledger=debug,axum=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.with_target(false).json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::init(config).await?;
    bootstrap::seed_genesis(&state).await?;

    app::serve(app::build_app(state)).await
}
