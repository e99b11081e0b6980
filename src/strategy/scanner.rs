//! Cross-venue arbitrage opportunity scanner.
//!
//! Each scan takes a flat snapshot of per-venue quotes, crosses every venue
//! pair per instrument in both directions, and keeps the directions where
//! the sell-side bid clears the buy-side ask by more than the configured
//! spread floor and the estimated execution cost. Generated opportunities
//! are retained in an id-keyed store until they expire or are executed.

use crate::config::ScannerConfig;
use crate::market::PriceQuote;
use crate::strategy::confidence::{ConfidencePolicy, TieredConfidence};
use crate::strategy::cost::{CostModel, FlatCostModel};
use crate::utils::decimal::to_basis_points;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Scanner-assigned opportunity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OpportunityId(pub u64);

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Precondition violations reported by `execute`.
///
/// A rejected call leaves the store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("opportunity {0} not found")]
    NotFound(OpportunityId),
    #[error("opportunity {0} has expired")]
    Expired(OpportunityId),
    #[error("opportunity {0} did not clear the executable threshold")]
    NotExecutable(OpportunityId),
}

/// Reasons for rejecting a venue-pair direction during evaluation.
#[derive(Debug, Clone, Copy)]
enum RejectReason {
    BadQuote,
    NoCross,
    ThinSpread,
    UnprofitableNet,
}

/// A profitable cross-venue spread, net of estimated execution cost.
///
/// Immutable after creation; eligible for removal once `expires_at` passes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageOpportunity {
    pub id: OpportunityId,
    pub instrument: String,
    /// Venue to buy on, at its ask
    pub buy_venue: String,
    pub buy_price: Decimal,
    /// Venue to sell on, at its bid
    pub sell_venue: String,
    pub sell_price: Decimal,
    /// Notional size in instrument units
    pub size: Decimal,
    pub spread_ratio: Decimal,
    pub profit_pct: Decimal,
    pub gross_profit: Decimal,
    pub estimated_cost: Decimal,
    pub net_profit: Decimal,
    pub executable: bool,
    /// Heuristic confidence score, 0-95
    pub confidence: u8,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Returns true if the validity window has passed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Scans quote snapshots for executable cross-venue spreads.
pub struct OpportunityScanner {
    config: ScannerConfig,
    cost_model: Box<dyn CostModel>,
    confidence: Box<dyn ConfidencePolicy>,
    opportunities: HashMap<OpportunityId, ArbitrageOpportunity>,
    next_id: u64,
}

impl OpportunityScanner {
    /// Create a scanner with the table-driven cost model and tiered
    /// confidence policy derived from the configuration.
    pub fn new(config: ScannerConfig) -> Self {
        let cost_model = Box::new(FlatCostModel::from_config(&config));
        Self {
            config,
            cost_model,
            confidence: Box::new(TieredConfidence::default()),
            opportunities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Replace the cost model.
    pub fn with_cost_model(mut self, cost_model: Box<dyn CostModel>) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Replace the confidence policy.
    pub fn with_confidence_policy(mut self, policy: Box<dyn ConfidencePolicy>) -> Self {
        self.confidence = policy;
        self
    }

    /// Scan a quote snapshot and return opportunities ranked by net profit.
    ///
    /// Expired entries from previous scans are pruned first; everything
    /// generated here is retained for later `execute` lookups.
    #[instrument(skip(self, quotes))]
    pub fn scan(&mut self, quotes: &[PriceQuote]) -> Vec<ArbitrageOpportunity> {
        self.prune_expired();

        let mut by_instrument: BTreeMap<&str, Vec<&PriceQuote>> = BTreeMap::new();
        for quote in quotes {
            by_instrument
                .entry(quote.instrument.as_str())
                .or_default()
                .push(quote);
        }

        let now = Utc::now();
        let mut batch = Vec::new();
        let mut rejected_bad_quote = 0usize;
        let mut rejected_no_cross = 0usize;
        let mut rejected_thin_spread = 0usize;
        let mut rejected_unprofitable = 0usize;

        for (instrument, venue_quotes) in &by_instrument {
            for i in 0..venue_quotes.len() {
                for j in (i + 1)..venue_quotes.len() {
                    let directions = [
                        (venue_quotes[i], venue_quotes[j]),
                        (venue_quotes[j], venue_quotes[i]),
                    ];
                    for (buy, sell) in directions {
                        match self.evaluate(instrument, buy, sell, now) {
                            Ok(opp) => {
                                self.opportunities.insert(opp.id, opp.clone());
                                batch.push(opp);
                            }
                            Err(RejectReason::BadQuote) => rejected_bad_quote += 1,
                            Err(RejectReason::NoCross) => rejected_no_cross += 1,
                            Err(RejectReason::ThinSpread) => rejected_thin_spread += 1,
                            Err(RejectReason::UnprofitableNet) => rejected_unprofitable += 1,
                        }
                    }
                }
            }
        }

        batch.sort_by(|a, b| b.net_profit.cmp(&a.net_profit).then(a.id.cmp(&b.id)));

        info!(
            quotes = quotes.len(),
            found = batch.len(),
            rejected_bad_quote,
            rejected_no_cross,
            rejected_thin_spread,
            rejected_unprofitable,
            "Scan complete"
        );

        batch
    }

    /// Evaluate one buy/sell direction for a venue pair.
    fn evaluate(
        &mut self,
        instrument: &str,
        buy: &PriceQuote,
        sell: &PriceQuote,
        now: DateTime<Utc>,
    ) -> Result<ArbitrageOpportunity, RejectReason> {
        if buy.ask <= Decimal::ZERO || sell.bid <= Decimal::ZERO {
            return Err(RejectReason::BadQuote);
        }
        if sell.bid <= buy.ask {
            return Err(RejectReason::NoCross);
        }

        let spread_ratio = (sell.bid - buy.ask) / buy.ask;
        if spread_ratio <= self.config.min_spread_ratio {
            return Err(RejectReason::ThinSpread);
        }

        let size = self.config.size_for(instrument);
        let gross_profit = (sell.bid - buy.ask) * size;
        let estimated_cost = self.cost_model.estimate(&buy.venue, &sell.venue);
        let net_profit = gross_profit - estimated_cost;
        if net_profit <= Decimal::ZERO {
            return Err(RejectReason::UnprofitableNet);
        }

        let executable = net_profit > self.config.executable_threshold;
        let confidence = self.confidence.score(net_profit, spread_ratio);

        let id = OpportunityId(self.next_id);
        self.next_id += 1;

        debug!(
            %id,
            instrument,
            buy_venue = %buy.venue,
            sell_venue = %sell.venue,
            spread_bps = %to_basis_points(spread_ratio),
            net_profit = %net_profit,
            executable,
            "Opportunity detected"
        );

        Ok(ArbitrageOpportunity {
            id,
            instrument: instrument.to_string(),
            buy_venue: buy.venue.clone(),
            buy_price: buy.ask,
            sell_venue: sell.venue.clone(),
            sell_price: sell.bid,
            size,
            spread_ratio,
            profit_pct: spread_ratio * dec!(100),
            gross_profit,
            estimated_cost,
            net_profit,
            executable,
            confidence,
            created_at: now,
            expires_at: now + self.config.ttl(),
        })
    }

    /// Validate an opportunity for execution and consume it.
    ///
    /// The returned opportunity is removed from the store; settlement
    /// belongs to the execution collaborator, and a repeat `execute` on the
    /// same id reports `NotFound`.
    pub fn execute(&mut self, id: OpportunityId) -> Result<ArbitrageOpportunity, ScanError> {
        let opp = self.opportunities.get(&id).ok_or(ScanError::NotFound(id))?;
        if opp.is_expired() {
            return Err(ScanError::Expired(id));
        }
        if !opp.executable {
            return Err(ScanError::NotExecutable(id));
        }

        let opp = self
            .opportunities
            .remove(&id)
            .ok_or(ScanError::NotFound(id))?;

        info!(
            %id,
            instrument = %opp.instrument,
            buy_venue = %opp.buy_venue,
            sell_venue = %opp.sell_venue,
            net_profit = %opp.net_profit,
            "Opportunity released for execution"
        );

        Ok(opp)
    }

    /// Get a retained opportunity by id.
    pub fn get(&self, id: OpportunityId) -> Option<&ArbitrageOpportunity> {
        self.opportunities.get(&id)
    }

    /// Remove opportunities past their validity window. Returns the number
    /// removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.opportunities.len();
        self.opportunities.retain(|_, opp| !opp.is_expired_at(now));

        let removed = before - self.opportunities.len();
        if removed > 0 {
            debug!(removed, "Pruned expired opportunities");
        }
        removed
    }

    /// Number of retained opportunities.
    pub fn len(&self) -> usize {
        self.opportunities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty()
    }
}
