//! Core building blocks: participants, randomness, configuration, errors,
//! cancellation and the match record sum type.
//!
//! Nothing here knows how a particular game plays; games build on these.

pub mod participant;
pub mod rng;
pub mod config;
pub mod error;
pub mod cancel;
pub mod state;

pub use participant::{Participant, MIN_PARTICIPANTS};
pub use rng::{GameRng, RandomSource, ScriptedRng};
pub use config::{ArenaConfig, DiceConfig, HorseConfig, LadderConfig, RouletteConfig, StoreConfig};
pub use error::{GameError, Result};
pub use cancel::CancelFlag;
pub use state::GameState;
