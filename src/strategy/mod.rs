//! Trading strategy components.
//!
//! Contains the core logic for:
//! - Opportunity scanning over cross-venue quote snapshots
//! - Pluggable execution-cost and confidence policies
//! - Trade signals bridging external strategies into the position ledger

mod confidence;
mod cost;
mod scanner;
mod signals;

pub use confidence::{ConfidencePolicy, TieredConfidence};
pub use cost::{CostModel, FlatCostModel};
pub use scanner::{ArbitrageOpportunity, OpportunityId, OpportunityScanner, ScanError};
pub use signals::{SignalBook, SignalDraft, SignalError, SignalId, TradeSignal};

use crate::market::{discard_stale, QuoteSource};
use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::debug;

/// One polling cycle: fetch a snapshot, drop stale quotes, scan.
///
/// This is the entry point the CLI loop drives; staleness is applied here
/// because the scanner itself accepts whatever snapshot it is handed.
pub async fn scan_cycle(
    source: &dyn QuoteSource,
    scanner: &mut OpportunityScanner,
    max_quote_age: Duration,
) -> Result<Vec<ArbitrageOpportunity>> {
    let quotes = source.fetch_quotes().await?;
    debug!(
        source = source.name(),
        quotes = quotes.len(),
        "Fetched quote snapshot"
    );

    let fresh = discard_stale(quotes, max_quote_age, Utc::now());
    Ok(scanner.scan(&fresh))
}
