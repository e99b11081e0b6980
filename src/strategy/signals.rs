//! Trade signal book.
//!
//! Signals are produced by an external strategy collaborator; the book
//! stores them, expires them, and turns an executed signal into a ledger
//! position carrying the signal's protective levels.

use crate::ledger::{LedgerError, OpenRequest, PositionId, PositionLedger, Side};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Book-assigned signal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SignalId(pub u64);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failures reported by signal execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("signal {0} not found")]
    NotFound(SignalId),
    #[error("signal {0} has expired")]
    Expired(SignalId),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A signal draft as supplied by the producing strategy.
#[derive(Debug, Clone)]
pub struct SignalDraft {
    pub instrument: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Producer-stated confidence, 0-100
    pub confidence: u8,
    pub reason: String,
    pub ttl: Duration,
}

/// A published signal awaiting execution or expiry.
#[derive(Debug, Clone, Serialize)]
pub struct TradeSignal {
    pub id: SignalId,
    pub instrument: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub confidence: u8,
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TradeSignal {
    /// Returns true if the validity window has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Id-keyed store of published trade signals.
pub struct SignalBook {
    signals: HashMap<SignalId, TradeSignal>,
    next_id: u64,
}

impl SignalBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            signals: HashMap::new(),
            next_id: 1,
        }
    }

    /// Publish a signal into the book.
    pub fn publish(&mut self, draft: SignalDraft) -> &TradeSignal {
        let id = SignalId(self.next_id);
        self.next_id += 1;

        let now = Utc::now();
        let signal = TradeSignal {
            id,
            instrument: draft.instrument,
            side: draft.side,
            entry_price: draft.entry_price,
            stop_loss: draft.stop_loss,
            take_profit: draft.take_profit,
            confidence: draft.confidence,
            reason: draft.reason,
            created_at: now,
            expires_at: now + draft.ttl,
        };

        info!(
            signal = %id,
            instrument = %signal.instrument,
            side = ?signal.side,
            entry_price = %signal.entry_price,
            confidence = signal.confidence,
            "Published signal"
        );

        self.signals.entry(id).or_insert(signal)
    }

    /// Active (unexpired) signals, highest confidence first.
    ///
    /// Expired signals are pruned as a side effect.
    pub fn active(&mut self) -> Vec<&TradeSignal> {
        self.prune_expired();

        let mut signals: Vec<&TradeSignal> = self.signals.values().collect();
        signals.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.id.cmp(&b.id)));
        signals
    }

    /// Remove expired signals. Returns the number removed.
    pub fn prune_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.signals.len();
        self.signals.retain(|_, s| now <= s.expires_at);

        let removed = before - self.signals.len();
        if removed > 0 {
            debug!(removed, "Pruned expired signals");
        }
        removed
    }

    /// Execute a signal: open a ledger position at the signal's entry price
    /// with its protective levels attached.
    ///
    /// The signal is consumed on success. A rejected open (invalid size,
    /// leverage out of range) leaves the signal in the book.
    pub fn execute(
        &mut self,
        id: SignalId,
        size: Decimal,
        leverage: Option<u8>,
        ledger: &mut PositionLedger,
    ) -> Result<PositionId, SignalError> {
        let signal = self.signals.get(&id).ok_or(SignalError::NotFound(id))?;
        if signal.is_expired() {
            return Err(SignalError::Expired(id));
        }

        let req = OpenRequest {
            instrument: signal.instrument.clone(),
            side: signal.side,
            size,
            leverage: leverage.unwrap_or_else(|| ledger.default_leverage()),
            entry_price: signal.entry_price,
            stop_loss: Some(signal.stop_loss),
            take_profit: Some(signal.take_profit),
        };

        let position_id = ledger.open(req)?.id;
        self.signals.remove(&id);

        info!(signal = %id, position = %position_id, "Signal executed");
        Ok(position_id)
    }

    /// Get a signal by id.
    pub fn get(&self, id: SignalId) -> Option<&TradeSignal> {
        self.signals.get(&id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

impl Default for SignalBook {
    fn default() -> Self {
        Self::new()
    }
}
