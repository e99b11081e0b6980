//! Leveraged position lifecycle tracking.
//!
//! The ledger owns every position it creates and is the only writer:
//! - `open` validates preconditions and admits a position
//! - `mark_to_market` recomputes unrealized PnL and fires protective triggers
//! - `close` settles realized PnL and freezes the position
//!
//! Positions move `Open -> Closed` exactly once; there is no re-opening.

mod book;
mod position;

pub use book::{LedgerError, OpenRequest, PositionLedger};
pub use position::{Position, PositionId, PositionState, ProtectiveTrigger, Side};
