//! Execution cost estimation for cross-venue round trips.

use crate::config::ScannerConfig;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Estimates the total cost of buying on one venue and selling on another.
pub trait CostModel: Send + Sync {
    fn estimate(&self, buy_venue: &str, sell_venue: &str) -> Decimal;
}

/// Table-driven cost model: one execution cost per venue plus a flat
/// transfer cost for moving funds between the two legs.
#[derive(Debug, Clone)]
pub struct FlatCostModel {
    venue_costs: HashMap<String, Decimal>,
    default_venue_cost: Decimal,
    transfer_cost: Decimal,
}

impl FlatCostModel {
    pub fn new(
        venue_costs: HashMap<String, Decimal>,
        default_venue_cost: Decimal,
        transfer_cost: Decimal,
    ) -> Self {
        Self {
            venue_costs,
            default_venue_cost,
            transfer_cost,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            config.venue_costs.clone(),
            config.default_venue_cost,
            config.transfer_cost,
        )
    }

    fn venue_cost(&self, venue: &str) -> Decimal {
        self.venue_costs
            .get(venue)
            .copied()
            .unwrap_or(self.default_venue_cost)
    }
}

impl CostModel for FlatCostModel {
    fn estimate(&self, buy_venue: &str, sell_venue: &str) -> Decimal {
        self.venue_cost(buy_venue) + self.venue_cost(sell_venue) + self.transfer_cost
    }
}
