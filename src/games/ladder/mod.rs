//! Ladder race.
//!
//! Participants climb side by side in lanes. Lanes get swapped at random
//! and by obstacles placed on the map, so a participant's lane at the
//! finish, not their starting lane, decides the outcome: whoever occupies
//! the lane marked [`LaneResult::Win`] when it crosses the finish line
//! wins.
//!
//! ## Modules
//!
//! - `map`: obstacle layout and the lane results vector
//! - `game`: runners, status effects, the tick and the driver loop
//!
//! Supports 2-10 participants.

mod game;
mod map;

pub use game::{LadderState, Runner, StatusEffects, PALETTE};
pub use map::{generate_results, LadderMap, LaneResult, Obstacle, ObstacleKind};
