//! The position ledger: an id-keyed store with exclusive write access.

use super::position::{Position, PositionId, PositionState, Side};
use crate::config::LedgerConfig;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

/// Precondition violations reported to the caller.
///
/// A rejected call leaves the ledger unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("position {0} not found")]
    NotFound(PositionId),
    #[error("position size must be positive, got {0}")]
    InvalidSize(Decimal),
    #[error("leverage must be between 1 and {max}, got {got}")]
    InvalidLeverage { got: u8, max: u8 },
    #[error("entry price must be positive, got {0}")]
    InvalidPrice(Decimal),
    #[error("position {0} is already closed")]
    AlreadyClosed(PositionId),
}

/// Parameters for opening a position.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub instrument: String,
    pub side: Side,
    pub size: Decimal,
    pub leverage: u8,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
}

/// Tracks open and closed leveraged positions against a reference price feed.
pub struct PositionLedger {
    config: LedgerConfig,
    positions: HashMap<PositionId, Position>,
    next_id: u64,
}

impl PositionLedger {
    /// Create an empty ledger.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            positions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Leverage applied when the caller does not specify one.
    pub fn default_leverage(&self) -> u8 {
        self.config.default_leverage
    }

    /// Open a new position.
    pub fn open(&mut self, req: OpenRequest) -> Result<&Position, LedgerError> {
        if req.size <= Decimal::ZERO {
            return Err(LedgerError::InvalidSize(req.size));
        }
        if req.leverage < 1 || req.leverage > self.config.max_leverage {
            return Err(LedgerError::InvalidLeverage {
                got: req.leverage,
                max: self.config.max_leverage,
            });
        }
        if req.entry_price <= Decimal::ZERO {
            return Err(LedgerError::InvalidPrice(req.entry_price));
        }

        let id = PositionId(self.next_id);
        self.next_id += 1;

        let position = Position {
            id,
            instrument: req.instrument,
            side: req.side,
            size: req.size,
            entry_price: req.entry_price,
            current_price: req.entry_price,
            leverage: req.leverage,
            stop_loss: req.stop_loss,
            take_profit: req.take_profit,
            unrealized_pnl: Decimal::ZERO,
            pnl_pct: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            state: PositionState::Open,
            opened_at: Utc::now(),
            closed_at: None,
        };

        info!(
            position = %id,
            instrument = %position.instrument,
            side = ?position.side,
            size = %position.size,
            entry_price = %position.entry_price,
            leverage = position.leverage,
            "Opened position"
        );

        Ok(self.positions.entry(id).or_insert(position))
    }

    /// Recompute a position's unrealized PnL against `current_price`.
    ///
    /// Marking a closed position is a no-op, not an error. If the tick
    /// crosses the position's stop-loss or take-profit, the position is
    /// closed at that price (stop-loss checked first).
    pub fn mark_to_market(
        &mut self,
        id: PositionId,
        current_price: Decimal,
    ) -> Result<&Position, LedgerError> {
        let trigger = {
            let pos = self
                .positions
                .get_mut(&id)
                .ok_or(LedgerError::NotFound(id))?;
            if pos.is_open() {
                pos.mark(current_price);
                pos.protective_trigger(current_price)
            } else {
                None
            }
        };

        if let Some(trigger) = trigger {
            info!(position = %id, ?trigger, price = %current_price, "Protective trigger hit");
            return self.close(id, current_price);
        }

        self.positions.get(&id).ok_or(LedgerError::NotFound(id))
    }

    /// Mark every open position whose instrument has a price in `prices`.
    ///
    /// Returns the ids of positions closed by protective triggers during
    /// the sweep.
    pub fn mark_all(&mut self, prices: &HashMap<String, Decimal>) -> Vec<PositionId> {
        let mut open_ids: Vec<PositionId> = self
            .positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.id)
            .collect();
        open_ids.sort();

        let mut closed = Vec::new();
        for id in open_ids {
            let price = match self
                .positions
                .get(&id)
                .and_then(|p| prices.get(&p.instrument))
            {
                Some(price) => *price,
                None => continue,
            };

            if let Ok(pos) = self.mark_to_market(id, price) {
                if !pos.is_open() {
                    closed.push(id);
                }
            }
        }

        closed
    }

    /// Close a position at `exit_price`.
    pub fn close(&mut self, id: PositionId, exit_price: Decimal) -> Result<&Position, LedgerError> {
        let pos = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(id))?;
        if !pos.is_open() {
            return Err(LedgerError::AlreadyClosed(id));
        }

        pos.settle(exit_price, Utc::now());

        info!(
            position = %id,
            instrument = %pos.instrument,
            exit_price = %exit_price,
            realized_pnl = %pos.realized_pnl,
            "Closed position"
        );

        Ok(&*pos)
    }

    /// Get a position by id.
    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    /// List positions, optionally filtered by state, most recently opened
    /// first.
    pub fn list(&self, state: Option<PositionState>) -> Vec<&Position> {
        let mut positions: Vec<&Position> = self
            .positions
            .values()
            .filter(|p| state.map_or(true, |s| p.state == s))
            .collect();
        positions.sort_by(|a, b| b.opened_at.cmp(&a.opened_at).then(b.id.cmp(&a.id)));
        positions
    }

    /// Total notional exposure of open positions.
    pub fn open_exposure(&self) -> Decimal {
        self.positions
            .values()
            .filter(|p| p.is_open())
            .map(|p| p.current_price * p.size * Decimal::from(p.leverage))
            .sum()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_ledger() -> PositionLedger {
        PositionLedger::new(LedgerConfig::default())
    }

    fn open_request(side: Side) -> OpenRequest {
        OpenRequest {
            instrument: "ETH".to_string(),
            side,
            size: dec!(2),
            leverage: 3,
            entry_price: dec!(100),
            stop_loss: None,
            take_profit: None,
        }
    }

    // =========================================================================
    // Open Precondition Tests
    // =========================================================================

    #[test]
    fn test_open_rejects_non_positive_size() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            size: Decimal::ZERO,
            ..open_request(Side::Long)
        };

        assert_eq!(ledger.open(req), Err(LedgerError::InvalidSize(Decimal::ZERO)));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_open_rejects_zero_leverage() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            leverage: 0,
            ..open_request(Side::Long)
        };

        assert_eq!(
            ledger.open(req),
            Err(LedgerError::InvalidLeverage { got: 0, max: 20 })
        );
    }

    #[test]
    fn test_open_rejects_leverage_above_max() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            leverage: 21,
            ..open_request(Side::Long)
        };

        assert!(matches!(
            ledger.open(req),
            Err(LedgerError::InvalidLeverage { got: 21, .. })
        ));
    }

    #[test]
    fn test_open_rejects_non_positive_entry_price() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            entry_price: dec!(-1),
            ..open_request(Side::Long)
        };

        assert_eq!(ledger.open(req), Err(LedgerError::InvalidPrice(dec!(-1))));
    }

    #[test]
    fn test_open_initializes_at_entry() {
        let mut ledger = test_ledger();
        let pos = ledger.open(open_request(Side::Long)).unwrap();

        assert_eq!(pos.current_price, dec!(100));
        assert_eq!(pos.unrealized_pnl, Decimal::ZERO);
        assert_eq!(pos.state, PositionState::Open);
        assert!(pos.closed_at.is_none());
    }

    // =========================================================================
    // Mark-to-Market Tests
    // =========================================================================

    #[test]
    fn test_long_unrealized_pnl() {
        let mut ledger = test_ledger();
        let id = ledger.open(open_request(Side::Long)).unwrap().id;

        let pos = ledger.mark_to_market(id, dec!(110)).unwrap();
        assert_eq!(pos.unrealized_pnl, dec!(60)); // (110-100)*2*3
    }

    #[test]
    fn test_short_unrealized_pnl_symmetric() {
        let mut ledger = test_ledger();
        let id = ledger.open(open_request(Side::Short)).unwrap().id;

        let pos = ledger.mark_to_market(id, dec!(90)).unwrap();
        assert_eq!(pos.unrealized_pnl, dec!(60)); // (100-90)*2*3
    }

    #[test]
    fn test_mark_unknown_position() {
        let mut ledger = test_ledger();
        assert_eq!(
            ledger.mark_to_market(PositionId(9), dec!(100)),
            Err(LedgerError::NotFound(PositionId(9)))
        );
    }

    #[test]
    fn test_mark_closed_position_is_noop() {
        let mut ledger = test_ledger();
        let id = ledger.open(open_request(Side::Long)).unwrap().id;
        ledger.close(id, dec!(105)).unwrap();

        let pos = ledger.mark_to_market(id, dec!(50)).unwrap();
        assert_eq!(pos.current_price, dec!(105)); // frozen at exit
        assert_eq!(pos.realized_pnl, dec!(30));
    }

    #[test]
    fn test_stop_loss_closes_at_tick_price() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            stop_loss: Some(dec!(95)),
            ..open_request(Side::Long)
        };
        let id = ledger.open(req).unwrap().id;

        let pos = ledger.mark_to_market(id, dec!(94)).unwrap();
        assert_eq!(pos.state, PositionState::Closed);
        assert_eq!(pos.realized_pnl, dec!(-36)); // (94-100)*2*3
        assert!(pos.closed_at.is_some());
    }

    #[test]
    fn test_take_profit_closes_at_tick_price() {
        let mut ledger = test_ledger();
        // Short take-profit sits below entry
        let req = OpenRequest {
            take_profit: Some(dec!(90)),
            ..open_request(Side::Short)
        };
        let id = ledger.open(req).unwrap().id;

        let pos = ledger.mark_to_market(id, dec!(88)).unwrap();
        assert_eq!(pos.state, PositionState::Closed);
        assert_eq!(pos.realized_pnl, dec!(72)); // (100-88)*2*3
    }

    #[test]
    fn test_mark_inside_thresholds_stays_open() {
        let mut ledger = test_ledger();
        let req = OpenRequest {
            stop_loss: Some(dec!(95)),
            take_profit: Some(dec!(110)),
            ..open_request(Side::Long)
        };
        let id = ledger.open(req).unwrap().id;

        let pos = ledger.mark_to_market(id, dec!(104)).unwrap();
        assert_eq!(pos.state, PositionState::Open);
    }

    // =========================================================================
    // Close Tests
    // =========================================================================

    #[test]
    fn test_close_settles_realized_pnl() {
        let mut ledger = test_ledger();
        let id = ledger.open(open_request(Side::Long)).unwrap().id;

        let pos = ledger.close(id, dec!(110)).unwrap();
        assert_eq!(pos.state, PositionState::Closed);
        assert_eq!(pos.realized_pnl, dec!(60));
        assert_eq!(pos.unrealized_pnl, Decimal::ZERO);
        assert_eq!(pos.pnl_pct, dec!(30));
    }

    #[test]
    fn test_close_twice_fails_and_preserves_pnl() {
        let mut ledger = test_ledger();
        let id = ledger.open(open_request(Side::Long)).unwrap().id;
        ledger.close(id, dec!(110)).unwrap();

        assert_eq!(
            ledger.close(id, dec!(50)),
            Err(LedgerError::AlreadyClosed(id))
        );
        let pos = ledger.get(id).unwrap();
        assert_eq!(pos.realized_pnl, dec!(60)); // untouched by the failed close
        assert_eq!(pos.current_price, dec!(110));
    }

    #[test]
    fn test_close_unknown_position() {
        let mut ledger = test_ledger();
        assert_eq!(
            ledger.close(PositionId(4), dec!(100)),
            Err(LedgerError::NotFound(PositionId(4)))
        );
    }

    // =========================================================================
    // Listing and Sweep Tests
    // =========================================================================

    #[test]
    fn test_list_most_recent_first() {
        let mut ledger = test_ledger();
        let first = ledger.open(open_request(Side::Long)).unwrap().id;
        let second = ledger.open(open_request(Side::Short)).unwrap().id;

        let all = ledger.list(None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second);
        assert_eq!(all[1].id, first);
    }

    #[test]
    fn test_list_filters_by_state() {
        let mut ledger = test_ledger();
        let open_id = ledger.open(open_request(Side::Long)).unwrap().id;
        let closed_id = ledger.open(open_request(Side::Short)).unwrap().id;
        ledger.close(closed_id, dec!(100)).unwrap();

        let open = ledger.list(Some(PositionState::Open));
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, open_id);

        let closed = ledger.list(Some(PositionState::Closed));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, closed_id);
    }

    #[test]
    fn test_mark_all_reports_only_triggered() {
        let mut ledger = test_ledger();
        let stopped = ledger
            .open(OpenRequest {
                stop_loss: Some(dec!(95)),
                ..open_request(Side::Long)
            })
            .unwrap()
            .id;
        let surviving = ledger.open(open_request(Side::Long)).unwrap().id;
        let unpriced = ledger
            .open(OpenRequest {
                instrument: "DAI".to_string(),
                ..open_request(Side::Long)
            })
            .unwrap()
            .id;

        let prices = HashMap::from([("ETH".to_string(), dec!(94))]);
        let closed = ledger.mark_all(&prices);

        assert_eq!(closed, vec![stopped]);
        assert!(ledger.get(surviving).unwrap().is_open());
        // No price for DAI: position left unmarked
        assert_eq!(ledger.get(unpriced).unwrap().current_price, dec!(100));
    }

    #[test]
    fn test_open_exposure_counts_open_only() {
        let mut ledger = test_ledger();
        ledger.open(open_request(Side::Long)).unwrap();
        let closed_id = ledger.open(open_request(Side::Short)).unwrap().id;
        ledger.close(closed_id, dec!(100)).unwrap();

        // 100 * 2 * 3 for the single open position
        assert_eq!(ledger.open_exposure(), dec!(600));
    }
}
