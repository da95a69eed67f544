//! FIX broker gateway - headless runner
//!
//! Runs the gateway against the in-process paper venue, optionally submits a
//! demo order, and prints order notifications as JSON until Ctrl+C.
//!
//! # Usage
//! ```sh
//! FIX_SETTINGS_PATH=fix.toml DEMO_SYMBOL=AAPL cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `FIX_SETTINGS_PATH` - Session settings file (default: fix.toml)
//! - `PAPER_AUTO_RESPOND`, `PAPER_FILL_PRICE`, `PAPER_BUYING_POWER` - Paper venue behaviour
//! - `DEMO_SYMBOL`, `DEMO_SIZE` - Demo order submitted after logon

use anyhow::{Context, Result};
use clap::Parser;
use fixbroker::application::FixGateway;
use fixbroker::config::{GatewayEnvConfig, SessionSettings};
use fixbroker::infrastructure::PaperVenue;
use rust_decimal::Decimal;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

const LOGON_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(author, version, about = "FIX broker gateway (paper venue)", long_about = None)]
struct Cli {
    /// Session settings file, overrides FIX_SETTINGS_PATH
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Submit a market buy for this symbol after logon, overrides DEMO_SYMBOL
    #[arg(long)]
    symbol: Option<String>,

    /// Demo order size, overrides DEMO_SIZE
    #[arg(long)]
    size: Option<Decimal>,

    /// Do not let the paper venue answer orders
    #[arg(long)]
    manual: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("fixbroker {} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = GatewayEnvConfig::from_env()?;
    if let Some(path) = cli.settings {
        config.settings_path = path;
    }
    if cli.symbol.is_some() {
        config.demo_symbol = cli.symbol;
    }
    if let Some(size) = cli.size {
        config.demo_size = size;
    }
    if cli.manual {
        config.paper.auto_respond = false;
    }

    let settings = SessionSettings::from_toml_file(&config.settings_path).with_context(|| {
        format!(
            "Failed to load session settings from {}",
            config.settings_path.display()
        )
    })?;
    info!(
        "Configuration loaded: settings={}, auto_respond={}, fill_price={}",
        config.settings_path.display(),
        config.paper.auto_respond,
        config.paper.fill_price
    );

    let venue = Arc::new(PaperVenue::new(config.paper.clone()));
    let gateway = FixGateway::start(settings, venue).context("Failed to start gateway")?;

    if !gateway.wait_for_logon(LOGON_TIMEOUT) {
        warn!("No logon within {:?}", LOGON_TIMEOUT);
    }
    info!("Cash: {}", gateway.cash());

    if let Some(symbol) = config.demo_symbol.as_deref() {
        let order = gateway
            .buy(symbol, config.demo_size)
            .context("Failed to submit demo order")?;
        info!("Demo order submitted: {}", order.id);
    }

    info!("Gateway running. Press Ctrl+C to shutdown.");

    print_notifications_until(&gateway, tokio::signal::ctrl_c()).await?;

    info!("Shutdown signal received. Stopping session...");
    gateway.stop();
    gateway.join();

    for (symbol, position) in gateway.positions() {
        info!("Position {}: {} @ {}", symbol, position.size, position.price);
    }

    Ok(())
}

/// Drain notifications as JSON on every tick until `shutdown` resolves.
async fn print_notifications_until<F>(gateway: &FixGateway, shutdown: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                while let Some(order) = gateway.poll_notification() {
                    println!("{}", serde_json::to_string(&order)?);
                }
            }
            signal = &mut shutdown => {
                signal?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixbroker::config::{
        ACCOUNT, DESTINATION, PaperVenueConfig, SENDER_COMP_ID, TARGET_COMP_ID, TARGET_SUB_ID,
    };
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_shutdown_spanning_several_ticks_is_observed() {
        let settings = SessionSettings::new()
            .with(SENDER_COMP_ID, "BROKER")
            .with(TARGET_COMP_ID, "VENUE")
            .with(DESTINATION, "NYSE")
            .with(ACCOUNT, "ACC-1")
            .with(TARGET_SUB_ID, "DESK1");
        let venue = Arc::new(PaperVenue::new(PaperVenueConfig::manual()));
        let gateway = FixGateway::start(settings, venue).unwrap();
        assert!(gateway.wait_for_logon(Duration::from_secs(5)));
        gateway.buy("X", dec!(1)).unwrap();

        let shutdown = async {
            tokio::time::sleep(POLL_INTERVAL * 3).await;
            Ok::<(), std::io::Error>(())
        };
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            print_notifications_until(&gateway, shutdown),
        )
        .await;

        assert!(matches!(result, Ok(Ok(()))));
        assert!(gateway.poll_notification().is_none());
    }
}
