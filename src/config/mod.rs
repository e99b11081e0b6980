//! Configuration management for the arb desk.
//!
//! Loads settings from environment variables and config files.

use anyhow::{Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tracked instruments and venue profiles
    #[serde(default)]
    pub market: MarketConfig,
    /// Opportunity scanning parameters
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// Position ledger parameters
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Quote source polling parameters
    #[serde(default)]
    pub source: SourceConfig,
}

/// An instrument tracked by the desk, with its CoinGecko identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSpec {
    /// Display symbol (e.g., "ETH")
    pub symbol: String,
    /// CoinGecko coin id (e.g., "ethereum")
    pub coingecko_id: String,
}

/// Per-venue quote projection profile.
///
/// Venue prices are derived from one reference price per instrument; the
/// liquidity factor captures the persistent discount/premium observed on
/// that venue and the spread ratio its typical bid-ask width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueProfile {
    pub name: String,
    #[serde(default = "default_liquidity_factor")]
    pub liquidity_factor: Decimal,
    #[serde(default = "default_venue_spread_ratio")]
    pub spread_ratio: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentSpec>,
    #[serde(default = "default_venues")]
    pub venues: Vec<VenueProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Minimum cross-venue spread ratio to consider (filters noise below
    /// realistic execution cost)
    #[serde(default = "default_min_spread_ratio")]
    pub min_spread_ratio: Decimal,
    /// Net profit (in quote currency) an opportunity must clear to be
    /// flagged executable
    #[serde(default = "default_executable_threshold")]
    pub executable_threshold: Decimal,
    /// Opportunity time-to-live in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: i64,
    /// Notional trade size per instrument (units of the instrument)
    #[serde(default = "default_sizes")]
    pub sizes: HashMap<String, Decimal>,
    /// Fallback notional size for instruments without an override
    #[serde(default = "default_size")]
    pub default_size: Decimal,
    /// Execution cost per venue (quote currency, one leg)
    #[serde(default = "default_venue_costs")]
    pub venue_costs: HashMap<String, Decimal>,
    /// Fallback execution cost for unknown venues
    #[serde(default = "default_venue_cost")]
    pub default_venue_cost: Decimal,
    /// Cost of moving funds between the two venues
    #[serde(default = "default_transfer_cost")]
    pub transfer_cost: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Leverage applied when the caller does not specify one
    #[serde(default = "default_leverage")]
    pub default_leverage: u8,
    /// Maximum leverage accepted by `open()`
    #[serde(default = "default_max_leverage")]
    pub max_leverage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Seconds between quote fetches in the run loop
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Quotes older than this are discarded before scanning
    #[serde(default = "default_max_quote_age")]
    pub max_quote_age_secs: i64,
}

// Default value functions

fn default_instruments() -> Vec<InstrumentSpec> {
    [
        ("ETH", "ethereum"),
        ("USDC", "usd-coin"),
        ("DAI", "dai"),
    ]
    .into_iter()
    .map(|(symbol, id)| InstrumentSpec {
        symbol: symbol.to_string(),
        coingecko_id: id.to_string(),
    })
    .collect()
}

fn default_venues() -> Vec<VenueProfile> {
    [
        ("ethereum", Decimal::ONE),
        ("base", Decimal::new(998, 3)),     // 0.998
        ("arbitrum", Decimal::new(999, 3)), // 0.999
    ]
    .into_iter()
    .map(|(name, factor)| VenueProfile {
        name: name.to_string(),
        liquidity_factor: factor,
        spread_ratio: default_venue_spread_ratio(),
    })
    .collect()
}

fn default_liquidity_factor() -> Decimal {
    Decimal::ONE
}

fn default_venue_spread_ratio() -> Decimal {
    Decimal::new(2, 4) // 0.0002 bid-ask width
}

fn default_min_spread_ratio() -> Decimal {
    Decimal::new(1, 3) // 0.001 (0.1%)
}

fn default_executable_threshold() -> Decimal {
    Decimal::ONE // 1.0 quote currency unit
}

fn default_ttl_secs() -> i64 {
    60
}

fn default_sizes() -> HashMap<String, Decimal> {
    HashMap::from([
        ("ETH".to_string(), Decimal::new(1, 1)), // 0.1 ETH
        ("USDC".to_string(), Decimal::new(100, 0)),
        ("DAI".to_string(), Decimal::new(100, 0)),
    ])
}

fn default_size() -> Decimal {
    Decimal::ONE
}

fn default_venue_costs() -> HashMap<String, Decimal> {
    HashMap::from([
        ("ethereum".to_string(), Decimal::new(5, 0)),
        ("base".to_string(), Decimal::new(5, 1)), // 0.5
        ("arbitrum".to_string(), Decimal::ONE),
    ])
}

fn default_venue_cost() -> Decimal {
    Decimal::new(2, 0)
}

fn default_transfer_cost() -> Decimal {
    Decimal::new(3, 0)
}

fn default_leverage() -> u8 {
    1
}

fn default_max_leverage() -> u8 {
    20
}

fn default_poll_interval() -> u64 {
    30
}

fn default_max_quote_age() -> i64 {
    30
}

impl ScannerConfig {
    /// Notional trade size for an instrument, falling back to the default.
    pub fn size_for(&self, instrument: &str) -> Decimal {
        self.sizes
            .get(instrument)
            .copied()
            .unwrap_or(self.default_size)
    }

    /// Opportunity validity window.
    pub fn ttl(&self) -> Duration {
        Duration::seconds(self.ttl_secs)
    }
}

impl SourceConfig {
    /// Maximum accepted quote age.
    pub fn max_quote_age(&self) -> Duration {
        Duration::seconds(self.max_quote_age_secs)
    }
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("arbdesk").required(false))
            .add_source(config::Environment::default().separator("__").prefix("ARB"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.market.instruments.is_empty(),
            "at least one instrument must be configured"
        );

        anyhow::ensure!(
            self.market.venues.len() >= 2,
            "cross-venue scanning requires at least two venues"
        );

        for venue in &self.market.venues {
            anyhow::ensure!(
                venue.liquidity_factor > Decimal::ZERO,
                "liquidity_factor for venue {} must be positive",
                venue.name
            );
            anyhow::ensure!(
                venue.spread_ratio >= Decimal::ZERO && venue.spread_ratio < Decimal::ONE,
                "spread_ratio for venue {} must be in [0, 1)",
                venue.name
            );
        }

        anyhow::ensure!(
            self.scanner.min_spread_ratio >= Decimal::ZERO,
            "min_spread_ratio must be non-negative"
        );

        anyhow::ensure!(
            self.scanner.executable_threshold >= Decimal::ZERO,
            "executable_threshold must be non-negative"
        );

        anyhow::ensure!(self.scanner.ttl_secs > 0, "ttl_secs must be positive");

        anyhow::ensure!(
            self.scanner.default_size > Decimal::ZERO
                && self.scanner.sizes.values().all(|s| *s > Decimal::ZERO),
            "trade sizes must be positive"
        );

        anyhow::ensure!(
            self.ledger.default_leverage >= 1
                && self.ledger.default_leverage <= self.ledger.max_leverage,
            "default_leverage must be >= 1 and <= max_leverage"
        );

        anyhow::ensure!(
            self.source.poll_interval_secs > 0,
            "poll_interval_secs must be positive"
        );

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            market: MarketConfig::default(),
            scanner: ScannerConfig::default(),
            ledger: LedgerConfig::default(),
            source: SourceConfig::default(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            venues: default_venues(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_spread_ratio: default_min_spread_ratio(),
            executable_threshold: default_executable_threshold(),
            ttl_secs: default_ttl_secs(),
            sizes: default_sizes(),
            default_size: default_size(),
            venue_costs: default_venue_costs(),
            default_venue_cost: default_venue_cost(),
            transfer_cost: default_transfer_cost(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_leverage: default_leverage(),
            max_leverage: default_max_leverage(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_quote_age_secs: default_max_quote_age(),
        }
    }
}
