//! Source-agnostic trait for quote providers.

use super::types::PriceQuote;
use anyhow::Result;
use async_trait::async_trait;

/// A provider of per-venue bid/ask quotes.
///
/// Implementations own all network I/O and freshness concerns; consumers
/// receive a flat snapshot and apply their own staleness policy (see
/// [`discard_stale`](super::discard_stale)).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Short source name for logging.
    fn name(&self) -> &'static str;

    /// Fetch the current quote snapshot for every tracked instrument.
    async fn fetch_quotes(&self) -> Result<Vec<PriceQuote>>;
}
