//! The per-match record as a tagged sum type.
//!
//! ## GameState
//!
//! One variant per game. The store holds exactly one `GameState` per
//! (client, game) pair, and snapshots are clones of it. Serializes as
//! `{"game": "<kind>", ...fields}` so a web layer can return it directly.

use serde::{Deserialize, Serialize};

use super::participant::Participant;
use crate::games::dice::DiceState;
use crate::games::horse::HorseState;
use crate::games::ladder::LadderState;
use crate::games::roulette::RouletteState;
use crate::rules::{GameKind, GameVariant};

/// Complete state of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameState {
    Dice(DiceState),
    Roulette(RouletteState),
    HorseRace(HorseState),
    Ladder(LadderState),
}

impl GameState {
    /// Which game this record holds.
    #[must_use]
    pub fn kind(&self) -> GameKind {
        match self {
            GameState::Dice(_) => GameKind::Dice,
            GameState::Roulette(_) => GameKind::Roulette,
            GameState::HorseRace(_) => GameKind::HorseRace,
            GameState::Ladder(_) => GameKind::Ladder,
        }
    }

    /// Is a driver loop advancing this record?
    #[must_use]
    pub fn is_running(&self) -> bool {
        match self {
            GameState::Dice(s) => s.is_running(),
            GameState::Roulette(s) => s.is_running(),
            GameState::HorseRace(s) => s.is_running(),
            GameState::Ladder(s) => s.is_running(),
        }
    }

    /// Has a winner been resolved?
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match self {
            GameState::Dice(s) => s.is_finished(),
            GameState::Roulette(s) => s.is_finished(),
            GameState::HorseRace(s) => s.is_finished(),
            GameState::Ladder(s) => s.is_finished(),
        }
    }

    /// The resolved winner, if any.
    #[must_use]
    pub fn winner(&self) -> Option<&Participant> {
        match self {
            GameState::Dice(s) => s.winner(),
            GameState::Roulette(s) => s.winner(),
            GameState::HorseRace(s) => s.winner(),
            GameState::Ladder(s) => s.winner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::GameRng;

    #[test]
    fn test_kind_and_flags() {
        let mut rng = GameRng::new(1);
        for kind in GameKind::ALL {
            let state = match kind {
                GameKind::Dice => DiceState::new_match(&mut rng).into_state(),
                GameKind::Roulette => RouletteState::new_match(&mut rng).into_state(),
                GameKind::HorseRace => HorseState::new_match(&mut rng).into_state(),
                GameKind::Ladder => LadderState::new_match(&mut rng).into_state(),
            };
            assert_eq!(state.kind(), kind);
            assert!(!state.is_running());
            assert!(!state.is_finished());
            assert!(state.winner().is_none());
        }
    }

    #[test]
    fn test_projection_rejects_other_variants() {
        let mut rng = GameRng::new(1);
        let mut state = DiceState::new_match(&mut rng).into_state();
        assert!(DiceState::project(&state).is_some());
        assert!(RouletteState::project(&state).is_none());
        assert!(LadderState::project_mut(&mut state).is_none());
    }

    #[test]
    fn test_tagged_serialization() {
        let mut rng = GameRng::new(1);
        let state = HorseState::new_match(&mut rng).into_state();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["game"], "horse_race");

        let back: GameState = serde_json::from_value(json).unwrap();
        assert_eq!(back.kind(), GameKind::HorseRace);
    }
}
