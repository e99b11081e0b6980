//! Price quote types shared by quote sources and the scanner.

use crate::utils::decimal::safe_div;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// A bid/ask observation for one instrument on one venue.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    /// Instrument symbol (e.g., "ETH")
    pub instrument: String,
    /// Venue the quote was observed on
    pub venue: String,
    pub bid: Decimal,
    pub ask: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl PriceQuote {
    /// Create a quote observed now.
    pub fn new(instrument: &str, venue: &str, bid: Decimal, ask: Decimal) -> Self {
        Self {
            instrument: instrument.to_string(),
            venue: venue.to_string(),
            bid,
            ask,
            observed_at: Utc::now(),
        }
    }

    /// Mid price between bid and ask.
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// Bid-ask spread as a ratio of the mid price.
    pub fn spread_ratio(&self) -> Decimal {
        safe_div(self.ask - self.bid, self.mid())
    }

    /// Age of the quote relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.observed_at
    }
}

/// Drop quotes older than `max_age`.
///
/// Staleness is a caller-side policy: the scanner itself accepts whatever
/// snapshot it is handed.
pub fn discard_stale(
    quotes: Vec<PriceQuote>,
    max_age: Duration,
    now: DateTime<Utc>,
) -> Vec<PriceQuote> {
    let before = quotes.len();
    let fresh: Vec<PriceQuote> = quotes
        .into_iter()
        .filter(|q| q.age(now) <= max_age)
        .collect();

    if fresh.len() < before {
        debug!(
            dropped = before - fresh.len(),
            kept = fresh.len(),
            "Discarded stale quotes"
        );
    }

    fresh
}
