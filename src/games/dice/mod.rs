//! Dice roll-off.
//!
//! Each participant rolls two dice in roster order, one at a time. The
//! lowest total wins. When several share the lowest total, only they roll
//! again, until a single lowest total remains.
//!
//! Supports 2-7 participants.

mod game;

pub use game::{resolve_round, DicePlayer, DiceState, DiceStep, RoundOutcome, PALETTE};
