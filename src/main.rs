use mimalloc::MiMalloc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use salewallet::db::WalletStorage;
use salewallet::service::sweeper;
use salewallet::{AppState, Config, mail, wallet_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database.url,
        public_url = %cfg.server.public_url,
        upload_dir = %cfg.server.upload_dir.display(),
        loglevel = %cfg.loglevel
    );

    let storage = WalletStorage::connect(&cfg.database.url).await?;
    storage.init_schema().await?;
    tokio::fs::create_dir_all(cfg.server.upload_dir.join("suggestions")).await?;

    if cfg.server.sweep_interval_secs > 0 {
        sweeper::spawn(
            storage.clone(),
            Duration::from_secs(cfg.server.sweep_interval_secs),
        );
    } else {
        warn!("verification token sweeper disabled");
    }

    let mailer = mail::build_mailer(&cfg.mail)?;
    let addr = cfg.server.listen_addr.clone();
    let state = AppState::new(storage, cfg, mailer);
    let app = wallet_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
