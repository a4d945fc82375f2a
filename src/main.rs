use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use booking_system::config::AppConfig;
use booking_system::db::BookingStore;
use booking_system::shutdown::shutdown_signal;
use booking_system::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store = BookingStore::open(&config.database_url)?;
    tracing::info!("opened booking store at {}", config.database_url);

    let state = Arc::new(AppState::new(store));
    let app = booking_system::router(Arc::clone(&state), &config.api_prefix);

    let addr = config.bind_addr();
    tracing::info!("starting server on {addr} (api root: {:?})", config.api_prefix);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(state) {
        Ok(state) => {
            state.store.close()?;
            tracing::info!("booking store closed");
        }
        Err(_) => tracing::warn!("booking store still in use at shutdown, dropping without close"),
    }

    Ok(())
}
