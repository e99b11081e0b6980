//! # Arb Desk
//!
//! Cross-venue arbitrage scanning and leveraged position tracking over an
//! externally supplied price feed.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `market`: Price quote types and quote sources (CoinGecko, static)
//! - `strategy`: Opportunity scanning, cost/confidence policies, trade signals
//! - `ledger`: Leveraged position lifecycle and mark-to-market
//! - `utils`: Shared decimal arithmetic
//!
//! The scanner and the ledger are synchronous, single-owner in-memory
//! structures; they perform no network I/O and no persistence. A host that
//! shares one instance across tasks must serialize access (one mutex per
//! store is sufficient, since no operation blocks internally).

pub mod config;
pub mod ledger;
pub mod market;
pub mod strategy;
pub mod utils;

pub use config::Config;
