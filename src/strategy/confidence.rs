//! Confidence scoring for detected opportunities.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Scores how likely an opportunity is to survive until execution, 0-100.
pub trait ConfidencePolicy: Send + Sync {
    fn score(&self, net_profit: Decimal, spread_ratio: Decimal) -> u8;
}

/// Tiered lookup heuristic: larger net profit and wider spreads score
/// higher. This is a coarse prior, not a calibrated estimate; swap the
/// policy out when a real model exists.
#[derive(Debug, Clone)]
pub struct TieredConfidence {
    base: u8,
    cap: u8,
}

impl TieredConfidence {
    pub fn new(base: u8, cap: u8) -> Self {
        Self { base, cap }
    }
}

impl Default for TieredConfidence {
    fn default() -> Self {
        Self { base: 50, cap: 95 }
    }
}

impl ConfidencePolicy for TieredConfidence {
    fn score(&self, net_profit: Decimal, spread_ratio: Decimal) -> u8 {
        let profit_bonus: u8 = if net_profit > dec!(10) {
            20
        } else if net_profit > dec!(5) {
            10
        } else {
            0
        };

        let spread_bonus: u8 = if spread_ratio > dec!(0.015) {
            20
        } else if spread_ratio > dec!(0.01) {
            10
        } else {
            0
        };

        self.base
            .saturating_add(profit_bonus)
            .saturating_add(spread_bonus)
            .min(self.cap)
    }
}
