//! Horse race.
//!
//! Every tick each horse still running takes a random speed change and
//! covers `speed * stride`. A horse reaching the finish records its elapsed
//! race time. Once every horse is home the winner is the fastest finisher
//! (`RaceMode::First`) or the slowest (`RaceMode::Last`).

mod game;

pub use game::{pick_winner, Horse, HorseState, RaceMode, PALETTE};
