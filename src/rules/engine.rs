//! Traits every game implements.
//!
//! Games implement `GameVariant` to describe their record:
//! - How it is projected out of the `GameState` sum type
//! - Its roster and status flags
//! - What reset means
//!
//! and `Simulation` to define how a run is prepared and driven.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::core::config::ArenaConfig;
use crate::core::error::{GameError, Result};
use crate::core::participant::{Participant, MIN_PARTICIPANTS};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::store::LiveMatch;

/// The four game types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Dice,
    Roulette,
    HorseRace,
    Ladder,
}

impl GameKind {
    /// Every kind, in display order.
    pub const ALL: [GameKind; 4] = [
        GameKind::Dice,
        GameKind::Roulette,
        GameKind::HorseRace,
        GameKind::Ladder,
    ];

    /// Name used in URLs and serialized records.
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::Roulette => "roulette",
            GameKind::HorseRace => "horse_race",
            GameKind::Ladder => "ladder",
        }
    }

    /// Inverse of [`GameKind::slug`].
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameKind::Dice => "dice",
            GameKind::Roulette => "roulette",
            GameKind::HorseRace => "horse race",
            GameKind::Ladder => "ladder",
        };
        f.write_str(name)
    }
}

/// A game record that lives inside [`GameState`].
///
/// ## Implementation Notes
///
/// - `project`/`project_mut`: Return `None` for other variants
/// - `push_participant`: The game picks the color and any lane
/// - `remove_participant`: Called with an index already validated
/// - `reset`: Must leave `running` and `finished` false
pub trait GameVariant: Clone + Send + Sized + 'static {
    /// Which game this is.
    const KIND: GameKind;

    /// Roster capacity.
    const MAX_PARTICIPANTS: usize;

    /// A fresh record with the game's default roster.
    fn new_match(rng: &mut dyn RandomSource) -> Self;

    /// Borrow this variant out of the sum type.
    fn project(state: &GameState) -> Option<&Self>;

    /// Mutably borrow this variant out of the sum type.
    fn project_mut(state: &mut GameState) -> Option<&mut Self>;

    /// Wrap into the sum type.
    fn into_state(self) -> GameState;

    /// Is a driver loop advancing this record?
    fn is_running(&self) -> bool;

    /// Has a winner been resolved?
    fn is_finished(&self) -> bool;

    /// Roster size.
    fn participant_count(&self) -> usize;

    /// Identity of one roster entry.
    fn participant(&self, index: usize) -> Option<&Participant>;

    /// Mutable identity of one roster entry.
    fn participant_mut(&mut self, index: usize) -> Option<&mut Participant>;

    /// Append a participant with an already validated name.
    fn push_participant(&mut self, name: String, rng: &mut dyn RandomSource);

    /// Remove the participant at a valid index.
    fn remove_participant(&mut self, index: usize, rng: &mut dyn RandomSource);

    /// Return to the pre-start state, keeping the roster.
    fn reset(&mut self, rng: &mut dyn RandomSource);

    /// The resolved winner, if any.
    fn winner(&self) -> Option<&Participant>;
}

/// A game with a time-paced driver loop.
pub trait Simulation: GameVariant {
    /// Pacing and tuning for the loop.
    type Config: Clone + Send + Sync + 'static;

    /// Select this game's config from the arena config.
    fn config(arena: &ArenaConfig) -> &Self::Config;

    /// Validate the roster, then reset the record for a fresh run and mark
    /// it running.
    ///
    /// Must not mutate anything when validation fails.
    fn prepare(&mut self, config: &Self::Config, rng: &mut dyn RandomSource) -> Result<()>;

    /// The driver loop.
    ///
    /// Runs until the record resolves, the run is cancelled, or the record
    /// disappears. Never panics on a vanished record; it just returns.
    fn drive(
        live: LiveMatch<Self>,
        rng: Box<dyn RandomSource>,
        config: Self::Config,
    ) -> impl Future<Output = ()> + Send;
}

/// Reject rosters too small to start.
pub fn require_participants(count: usize) -> Result<()> {
    if count < MIN_PARTICIPANTS {
        return Err(GameError::NotEnoughParticipants {
            min: MIN_PARTICIPANTS,
            found: count,
        });
    }
    Ok(())
}
