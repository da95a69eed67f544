//! Gateway configuration parsing from environment variables.
//!
//! - `FIX_SETTINGS_PATH`: TOML file with the `[session]` table (default `fix.toml`)
//! - `PAPER_AUTO_RESPOND`: paper venue acknowledges and fills orders (default true)
//! - `PAPER_FILL_PRICE`: fill price for orders sent without a price (default 100)
//! - `PAPER_BUYING_POWER`: buying power broadcast after logon (default 100000)
//! - `DEMO_SYMBOL` / `DEMO_SIZE`: optional order submitted by the server at startup

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Paper venue behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct PaperVenueConfig {
    pub auto_respond: bool,
    pub fill_price: Decimal,
    pub buying_power: Option<Decimal>,
}

impl Default for PaperVenueConfig {
    fn default() -> Self {
        Self {
            auto_respond: true,
            fill_price: Decimal::from(100),
            buying_power: Some(Decimal::from(100_000)),
        }
    }
}

impl PaperVenueConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            auto_respond: parse_bool("PAPER_AUTO_RESPOND", true),
            fill_price: parse_decimal("PAPER_FILL_PRICE", "100")?,
            buying_power: Some(parse_decimal("PAPER_BUYING_POWER", "100000")?),
        })
    }

    /// Silent venue: nothing is answered unless injected by the caller
    pub fn manual() -> Self {
        Self {
            auto_respond: false,
            fill_price: Decimal::from(100),
            buying_power: None,
        }
    }
}

/// Top-level gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayEnvConfig {
    pub settings_path: PathBuf,
    pub paper: PaperVenueConfig,
    pub demo_symbol: Option<String>,
    pub demo_size: Decimal,
}

impl GatewayEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            settings_path: PathBuf::from(
                env::var("FIX_SETTINGS_PATH").unwrap_or_else(|_| "fix.toml".to_string()),
            ),
            paper: PaperVenueConfig::from_env()?,
            demo_symbol: env::var("DEMO_SYMBOL").ok().filter(|s| !s.is_empty()),
            demo_size: parse_decimal("DEMO_SIZE", "100")?,
        })
    }
}

fn parse_decimal(key: &str, default: &str) -> Result<Decimal> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Decimal::from_str(raw.trim()).context(format!("Failed to parse {}", key))
}

fn parse_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<bool>()
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::{Mutex, OnceLock};

    // Global lock to prevent race conditions when modifying environment variables in tests
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn get_env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn test_gateway_config_defaults() {
        let _guard = get_env_lock().lock().unwrap();
        let config = GatewayEnvConfig::from_env().expect("Should parse with defaults");

        assert!(config.paper.fill_price > Decimal::ZERO);
        assert!(config.demo_size > Decimal::ZERO);
    }

    #[test]
    fn test_paper_config_from_env() {
        let _guard = get_env_lock().lock().unwrap();
        unsafe {
            env::set_var("PAPER_FILL_PRICE", "42.5");
            env::set_var("PAPER_AUTO_RESPOND", "false");
        }

        let config = PaperVenueConfig::from_env().unwrap();
        assert_eq!(config.fill_price, dec!(42.5));
        assert!(!config.auto_respond);

        unsafe {
            env::set_var("PAPER_FILL_PRICE", "not-a-number");
        }
        assert!(PaperVenueConfig::from_env().is_err());

        // Cleanup
        unsafe {
            env::remove_var("PAPER_FILL_PRICE");
            env::remove_var("PAPER_AUTO_RESPOND");
        }
    }

    #[test]
    fn test_manual_venue_is_silent() {
        let config = PaperVenueConfig::manual();
        assert!(!config.auto_respond);
        assert!(config.buying_power.is_none());
    }
}
