//! Game engines.
//!
//! Each game owns its record type and a driver loop:
//! - `dice`: lowest total of two dice wins, ties roll again
//! - `roulette`: eased wheel spin, pointer picks the segment
//! - `horse`: random-walk race to a fixed distance, first or last wins
//! - `ladder`: lane race with obstacles and lane swaps

pub mod dice;
pub mod horse;
pub mod ladder;
pub mod roulette;
