//! Match storage and driver-loop handles.
//!
//! - `cell`: a match record behind its lock, typed `Match` handles for
//!   callers and weak `LiveMatch` handles for driver loops
//! - `sessions`: the bounded identity -> match store with eviction

pub mod cell;
pub mod sessions;

pub use cell::{LiveMatch, Match, MatchCell};
pub use sessions::{GameStore, SessionKey};
