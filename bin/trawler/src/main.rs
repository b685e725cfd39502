//! Process entry point: config, logging, component wiring, and a clean
//! ctrl-c shutdown of the scan loop.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use analysis::TrendFunnel;
use common::{Config, Notifier, NullNotifier};
use engine::{BinanceData, ScanScheduler, ScannerFileConfig};
use history::SqliteHistory;
use notify::TelegramNotifier;
use paper::PaperGateway;
use trader::PositionManager;

#[tokio::main]
async fn main() -> common::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let env = Config::from_env();
    let scanner = ScannerFileConfig::load(&env.scanner_config_path)?;

    let pool = SqlitePool::connect(&env.database_url).await?;
    let history = Arc::new(SqliteHistory::new(pool).await?);

    let notifier: Arc<dyn Notifier> = match (&env.telegram_token, env.telegram_chat_id) {
        (Some(token), Some(chat_id)) => {
            info!(chat_id, "telegram notifications enabled");
            Arc::new(TelegramNotifier::new(token, chat_id))
        }
        _ => Arc::new(NullNotifier),
    };

    let market = Arc::new(BinanceData::new());
    let gateway = Arc::new(PaperGateway::new());
    let manager = PositionManager::new(scanner.trader, gateway, history, notifier);
    let funnel = TrendFunnel::new(scanner.funnel, market.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = ScanScheduler::new(
        scanner.scheduler,
        funnel,
        scanner.score,
        manager,
        market,
        None,
        shutdown_rx,
    );

    let handle = tokio::spawn(scheduler.run());

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);
    let _ = handle.await;

    Ok(())
}
