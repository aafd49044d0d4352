//! # rust-party
//!
//! Time-paced simulation engines for browser party mini-games.
//!
//! ## Design Principles
//!
//! 1. **Server-Driven**: Every match runs as its own tokio task that
//!    advances the record tick by tick. Clients only poll snapshots.
//!
//! 2. **Explicit State**: Each game's record is a typed struct inside the
//!    [`GameState`] sum type. No ad hoc field presence checks.
//!
//! 3. **Injected Collaborators**: The store, configuration and randomness
//!    are passed in, never ambient. Tests swap in scripted randomness and a
//!    paused clock.
//!
//! ## Architecture
//!
//! - **Cancellable Loops**: A driver loop re-checks its run's cancel flag
//!   and the record's existence at every tick boundary, so resets and
//!   evictions never leak a running task.
//!
//! - **Short Locks**: Each match has its own lock, held only for a single
//!   tick's mutation, never across a sleep.
//!
//! ## Modules
//!
//! - `core`: Participants, RNG, configuration, errors, cancellation, state
//! - `rules`: `GameVariant` and `Simulation` traits for game implementations
//! - `games`: Dice, roulette, horse race and ladder engines
//! - `store`: Identity -> match store and driver-loop handles
//! - `arena`: Facade wiring store, configuration and RNG together

pub mod core;
pub mod rules;
pub mod games;
pub mod store;
pub mod arena;

// Re-export commonly used types
pub use crate::core::{
    Participant, MIN_PARTICIPANTS,
    GameRng, RandomSource, ScriptedRng,
    ArenaConfig, DiceConfig, RouletteConfig, HorseConfig, LadderConfig, StoreConfig,
    GameError, Result,
    CancelFlag, GameState,
};

pub use crate::rules::{GameKind, GameVariant, Simulation};

pub use crate::games::dice::{DicePlayer, DiceState};
pub use crate::games::roulette::RouletteState;
pub use crate::games::horse::{Horse, HorseState, RaceMode};
pub use crate::games::ladder::{LadderMap, LadderState, LaneResult, Obstacle, ObstacleKind, Runner, StatusEffects};

pub use crate::store::{GameStore, LiveMatch, Match, MatchCell, SessionKey};

pub use crate::arena::Arena;
