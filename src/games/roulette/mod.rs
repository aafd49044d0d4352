//! Roulette wheel.
//!
//! After a countdown the wheel spins towards a target angle drawn at spin
//! start, decelerating over the last part of the spin. The pointer is fixed
//! at the top and the wheel turns clockwise under it, so the winning
//! segment is read off the complement of the final angle.
//!
//! Supports 2-10 participants.

mod game;

pub use game::{eased_progress, winner_index, RouletteState, PALETTE};
