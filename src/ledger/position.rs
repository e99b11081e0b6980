//! Position model and per-position PnL arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger-assigned position identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PositionId(pub u64);

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Signed price movement in the position's favor.
    pub fn price_delta(&self, entry: Decimal, current: Decimal) -> Decimal {
        match self {
            Side::Long => current - entry,
            Side::Short => entry - current,
        }
    }
}

/// Lifecycle state of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionState {
    Open,
    Closed,
}

/// Which protective threshold fired on a price tick.
///
/// When one tick satisfies both thresholds, stop-loss wins: the triggers are
/// evaluated in a fixed order rather than independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectiveTrigger {
    StopLoss,
    TakeProfit,
}

/// A leveraged position against a reference price feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub id: PositionId,
    pub instrument: String,
    pub side: Side,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub leverage: u8,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,

    // PnL (updated on each mark, frozen at close)
    pub unrealized_pnl: Decimal,
    pub pnl_pct: Decimal,
    pub realized_pnl: Decimal,

    pub state: PositionState,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.state == PositionState::Open
    }

    /// Leveraged PnL for a favorable price movement `delta`.
    fn pnl(&self, delta: Decimal) -> Decimal {
        delta * self.size * Decimal::from(self.leverage)
    }

    /// Recompute unrealized PnL against a new reference price.
    pub(crate) fn mark(&mut self, current_price: Decimal) {
        let delta = self.side.price_delta(self.entry_price, current_price);
        self.current_price = current_price;
        self.unrealized_pnl = self.pnl(delta);
        self.pnl_pct = delta / self.entry_price * dec!(100) * Decimal::from(self.leverage);
    }

    /// Settle the position at `exit_price` and freeze it.
    pub(crate) fn settle(&mut self, exit_price: Decimal, now: DateTime<Utc>) {
        let delta = self.side.price_delta(self.entry_price, exit_price);
        self.current_price = exit_price;
        self.realized_pnl = self.pnl(delta);
        self.pnl_pct = delta / self.entry_price * dec!(100) * Decimal::from(self.leverage);
        self.unrealized_pnl = Decimal::ZERO;
        self.state = PositionState::Closed;
        self.closed_at = Some(now);
    }

    /// Protective threshold hit by `price`, if any. Stop-loss is checked
    /// before take-profit.
    pub fn protective_trigger(&self, price: Decimal) -> Option<ProtectiveTrigger> {
        if let Some(stop) = self.stop_loss {
            let hit = match self.side {
                Side::Long => price <= stop,
                Side::Short => price >= stop,
            };
            if hit {
                return Some(ProtectiveTrigger::StopLoss);
            }
        }

        if let Some(target) = self.take_profit {
            let hit = match self.side {
                Side::Long => price >= target,
                Side::Short => price <= target,
            };
            if hit {
                return Some(ProtectiveTrigger::TakeProfit);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_position(side: Side, stop_loss: Option<Decimal>, take_profit: Option<Decimal>) -> Position {
        Position {
            id: PositionId(1),
            instrument: "EUR/USD".to_string(),
            side,
            size: dec!(2),
            entry_price: dec!(100),
            current_price: dec!(100),
            leverage: 3,
            stop_loss,
            take_profit,
            unrealized_pnl: Decimal::ZERO,
            pnl_pct: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            state: PositionState::Open,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn test_price_delta_by_side() {
        assert_eq!(Side::Long.price_delta(dec!(100), dec!(110)), dec!(10));
        assert_eq!(Side::Short.price_delta(dec!(100), dec!(110)), dec!(-10));
        assert_eq!(Side::Short.price_delta(dec!(100), dec!(90)), dec!(10));
    }

    #[test]
    fn test_mark_applies_leverage() {
        let mut pos = test_position(Side::Long, None, None);
        pos.mark(dec!(110));

        assert_eq!(pos.unrealized_pnl, dec!(60)); // (110-100)*2*3
        assert_eq!(pos.pnl_pct, dec!(30)); // 10% * 3x
    }

    #[test]
    fn test_stop_loss_direction_per_side() {
        let long = test_position(Side::Long, Some(dec!(95)), None);
        assert_eq!(long.protective_trigger(dec!(94)), Some(ProtectiveTrigger::StopLoss));
        assert_eq!(long.protective_trigger(dec!(96)), None);

        let short = test_position(Side::Short, Some(dec!(105)), None);
        assert_eq!(short.protective_trigger(dec!(106)), Some(ProtectiveTrigger::StopLoss));
        assert_eq!(short.protective_trigger(dec!(104)), None);
    }

    #[test]
    fn test_take_profit_direction_per_side() {
        let long = test_position(Side::Long, None, Some(dec!(110)));
        assert_eq!(long.protective_trigger(dec!(110)), Some(ProtectiveTrigger::TakeProfit));

        let short = test_position(Side::Short, None, Some(dec!(90)));
        assert_eq!(short.protective_trigger(dec!(89)), Some(ProtectiveTrigger::TakeProfit));
    }

    #[test]
    fn test_stop_loss_wins_when_both_fire() {
        // Inverted thresholds so one tick satisfies both: the fixed
        // evaluation order must pick the stop.
        let pos = test_position(Side::Long, Some(dec!(100)), Some(dec!(90)));
        assert_eq!(pos.protective_trigger(dec!(95)), Some(ProtectiveTrigger::StopLoss));
    }
}
