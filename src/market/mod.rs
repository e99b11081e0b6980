//! Market data types and quote sources.
//!
//! The desk never fetches prices on its own; everything downstream consumes
//! `PriceQuote` batches produced by a `QuoteSource` implementation.

mod coingecko;
mod mock;
mod source;
mod types;

pub use coingecko::CoinGeckoSource;
pub use mock::StaticSource;
pub use source::QuoteSource;
pub use types::{discard_stale, PriceQuote};

#[cfg(test)]
pub(crate) use source::MockQuoteSource;
