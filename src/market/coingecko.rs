//! CoinGecko-backed quote source.
//!
//! Fetches one USD reference price per instrument from the CoinGecko
//! simple-price endpoint, then projects per-venue bid/ask quotes using the
//! configured venue profiles. The liquidity factor captures the persistent
//! discount/premium a venue trades at relative to the reference price; the
//! spread ratio its typical bid-ask width.

use super::source::QuoteSource;
use super::types::PriceQuote;
use crate::config::{InstrumentSpec, MarketConfig, VenueProfile};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

/// Per-coin price entry in the simple-price response.
#[derive(Debug, Clone, Deserialize)]
struct SimplePrice {
    usd: Decimal,
}

/// Quote source backed by the public CoinGecko API.
pub struct CoinGeckoSource {
    http: Client,
    base_url: String,
    instruments: Vec<InstrumentSpec>,
    venues: Vec<VenueProfile>,
}

impl CoinGeckoSource {
    /// Create a new source from the market configuration.
    pub fn new(market: &MarketConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            instruments: market.instruments.clone(),
            venues: market.venues.clone(),
        })
    }

    /// Override the API base URL (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Project per-venue bid/ask quotes from one reference price.
    fn project_quotes(&self, symbol: &str, reference: Decimal) -> Vec<PriceQuote> {
        self.venues
            .iter()
            .map(|venue| {
                let venue_price = reference * venue.liquidity_factor;
                let half_spread = venue_price * venue.spread_ratio / Decimal::TWO;
                PriceQuote::new(
                    symbol,
                    &venue.name,
                    venue_price - half_spread,
                    venue_price + half_spread,
                )
            })
            .collect()
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoSource {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    #[instrument(skip(self))]
    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>> {
        let ids: Vec<&str> = self
            .instruments
            .iter()
            .map(|i| i.coingecko_id.as_str())
            .collect();
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            ids.join(",")
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch CoinGecko prices")?;

        let prices: HashMap<String, SimplePrice> = response
            .json()
            .await
            .context("Failed to parse CoinGecko price response")?;

        let mut quotes = Vec::new();
        for spec in &self.instruments {
            match prices.get(&spec.coingecko_id) {
                Some(price) if price.usd > Decimal::ZERO => {
                    quotes.extend(self.project_quotes(&spec.symbol, price.usd));
                }
                _ => {
                    warn!(symbol = %spec.symbol, id = %spec.coingecko_id, "No price in response");
                }
            }
        }

        debug!(
            instruments = self.instruments.len(),
            quotes = quotes.len(),
            "Projected venue quotes"
        );

        Ok(quotes)
    }
}
