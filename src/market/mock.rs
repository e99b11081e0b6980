//! Static quote source for tests and offline paper runs.

use super::source::QuoteSource;
use super::types::PriceQuote;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal_macros::dec;

/// Replays a fixed quote set, restamped to the fetch time.
pub struct StaticSource {
    quotes: Vec<PriceQuote>,
}

impl StaticSource {
    /// Create a source that serves the given quotes.
    pub fn new(quotes: Vec<PriceQuote>) -> Self {
        Self { quotes }
    }

    /// A small sample book for paper runs. The ETH spread is exaggerated so
    /// a default-config scan surfaces an executable opportunity.
    pub fn sample() -> Self {
        Self::new(vec![
            PriceQuote::new("ETH", "ethereum", dec!(1998), dec!(2000)),
            PriceQuote::new("ETH", "base", dec!(2120), dec!(2122)),
            PriceQuote::new("ETH", "arbitrum", dec!(1999.5), dec!(2001.5)),
            PriceQuote::new("USDC", "ethereum", dec!(0.9999), dec!(1.0001)),
            PriceQuote::new("USDC", "base", dec!(0.9998), dec!(1.0002)),
        ])
    }
}

#[async_trait]
impl QuoteSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>> {
        let now = Utc::now();
        Ok(self
            .quotes
            .iter()
            .cloned()
            .map(|mut q| {
                q.observed_at = now;
                q
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_quotes_are_restamped() {
        let source = StaticSource::sample();
        let quotes = source.fetch_quotes().await.unwrap();

        assert!(!quotes.is_empty());
        let now = Utc::now();
        assert!(quotes.iter().all(|q| q.age(now) < Duration::seconds(1)));
    }
}
