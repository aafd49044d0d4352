//! Error type shared by every engine.

use crate::rules::GameKind;

/// Errors returned synchronously by match operations.
///
/// Driver loops never surface these: a loop that hits one ends its match
/// and logs instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Starting or shrinking a roster below the minimum.
    #[error("at least {min} participants are required, found {found}")]
    NotEnoughParticipants { min: usize, found: usize },

    /// Growing a roster past the game's capacity.
    #[error("at most {max} participants are allowed")]
    TooManyParticipants { max: usize },

    /// A participant name that is empty after trimming.
    #[error("participant name must not be empty")]
    EmptyName,

    /// A participant index outside the roster.
    #[error("participant index {index} is out of range for {len} participants")]
    IndexOutOfRange { index: usize, len: usize },

    /// `start` on a match whose driver loop is still running.
    #[error("the {kind} match is already running")]
    AlreadyRunning { kind: GameKind },

    /// Roster edits while the driver loop owns the roster.
    #[error("the {kind} roster cannot change while the match is running")]
    RosterLocked { kind: GameKind },

    /// A record that does not hold the expected game.
    #[error("the record does not hold a {expected} match")]
    WrongKind { expected: GameKind },

    /// Internal invariants broken mid-tick.
    #[error("inconsistent match state: {detail}")]
    CorruptState { detail: String },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GameError>;
