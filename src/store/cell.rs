//! Shared match records and the handles used to reach them.
//!
//! ## MatchCell
//!
//! One match record behind a lock, plus the cancel flag of its current run.
//!
//! ## Match
//!
//! Typed handle used by callers: roster edits, start, reset, snapshots.
//!
//! ## LiveMatch
//!
//! Weak handle owned by a driver loop. Every access re-checks that the
//! record still exists and that the run was not cancelled, so an evicted or
//! reset match makes its loop exit quietly at the next tick boundary.
//!
//! Lock order is always state, then run flag. No lock is held across an
//! `.await`.

use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::cancel::CancelFlag;
use crate::core::error::{GameError, Result};
use crate::core::participant::{validate_name, Participant, MIN_PARTICIPANTS};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{GameKind, GameVariant, Simulation};

/// One match record and the cancel flag of its current run.
#[derive(Debug)]
pub struct MatchCell {
    state: Mutex<GameState>,
    run: Mutex<CancelFlag>,
}

impl MatchCell {
    /// Wrap a record.
    #[must_use]
    pub fn new(state: GameState) -> Self {
        Self {
            state: Mutex::new(state),
            run: Mutex::new(CancelFlag::new()),
        }
    }

    /// Which game the record holds.
    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.state.lock().kind()
    }

    /// Clone of the current record.
    #[must_use]
    pub fn snapshot(&self) -> GameState {
        self.state.lock().clone()
    }

    /// Stop the current run, if any.
    pub fn cancel_run(&self) {
        self.run.lock().cancel();
    }
}

/// Typed handle to a match in the store.
pub struct Match<S> {
    cell: Arc<MatchCell>,
    _kind: PhantomData<fn() -> S>,
}

impl<S> Clone for Match<S> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            _kind: PhantomData,
        }
    }
}

impl<S: GameVariant> Match<S> {
    /// Attach to a cell. Fails if the cell holds another game.
    pub fn attach(cell: Arc<MatchCell>) -> Result<Self> {
        if cell.kind() != S::KIND {
            return Err(GameError::WrongKind { expected: S::KIND });
        }
        Ok(Self {
            cell,
            _kind: PhantomData,
        })
    }

    /// Wrap a cell fetched under a key of kind `S::KIND`.
    ///
    /// Typed access still re-checks the variant on every call.
    pub(crate) fn from_store(cell: Arc<MatchCell>) -> Self {
        Self {
            cell,
            _kind: PhantomData,
        }
    }

    /// The underlying cell.
    #[must_use]
    pub fn cell(&self) -> &Arc<MatchCell> {
        &self.cell
    }

    /// Read the record.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R> {
        let guard = self.cell.state.lock();
        let out = S::project(&guard).map(f);
        out.ok_or(GameError::WrongKind { expected: S::KIND })
    }

    /// Mutate the record.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut guard = self.cell.state.lock();
        let out = S::project_mut(&mut guard).map(f);
        out.ok_or(GameError::WrongKind { expected: S::KIND })
    }

    /// Clone of the typed record.
    pub fn snapshot(&self) -> Result<S> {
        self.read(S::clone)
    }

    /// Mutate the roster while no run owns it.
    fn edit_roster<R>(&self, f: impl FnOnce(&mut S) -> Result<R>) -> Result<R> {
        self.update(|state| {
            if state.is_running() {
                return Err(GameError::RosterLocked { kind: S::KIND });
            }
            f(state)
        })?
    }

    /// Append a participant; returns its index.
    pub fn add_participant(&self, name: &str, rng: &mut dyn RandomSource) -> Result<usize> {
        let name = validate_name(name)?;
        self.edit_roster(|state| {
            let count = state.participant_count();
            if count >= S::MAX_PARTICIPANTS {
                return Err(GameError::TooManyParticipants {
                    max: S::MAX_PARTICIPANTS,
                });
            }
            if state.is_finished() {
                state.reset(rng);
            }
            state.push_participant(name, rng);
            Ok(count)
        })
    }

    /// Rename the participant at `index`.
    pub fn rename_participant(&self, index: usize, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.edit_roster(|state| {
            let len = state.participant_count();
            let participant = state
                .participant_mut(index)
                .ok_or(GameError::IndexOutOfRange { index, len })?;
            participant.name = name;
            Ok(())
        })
    }

    /// Remove the participant at `index`. At least two always remain.
    ///
    /// A finished result refers to roster indices, so it is cleared first.
    pub fn remove_participant(&self, index: usize, rng: &mut dyn RandomSource) -> Result<Participant> {
        self.edit_roster(|state| {
            let len = state.participant_count();
            if len <= MIN_PARTICIPANTS {
                return Err(GameError::NotEnoughParticipants {
                    min: MIN_PARTICIPANTS,
                    found: len - 1,
                });
            }
            let removed = state
                .participant(index)
                .cloned()
                .ok_or(GameError::IndexOutOfRange { index, len })?;
            if state.is_finished() {
                state.reset(rng);
            }
            state.remove_participant(index, rng);
            Ok(removed)
        })
    }

    /// Cancel any live run and return the record to its pre-start state.
    pub fn reset(&self, rng: &mut dyn RandomSource) -> Result<()> {
        let mut guard = self.cell.state.lock();
        let state = S::project_mut(&mut guard).ok_or(GameError::WrongKind { expected: S::KIND })?;
        self.cell.run.lock().cancel();
        state.reset(rng);
        debug!(kind = %S::KIND, "match reset");
        Ok(())
    }

    /// Stop the current run without touching the record.
    pub fn cancel(&self) {
        self.cell.cancel_run();
    }

    /// Validate, prepare and spawn the driver loop.
    ///
    /// Must be called from within a tokio runtime. Validation failures
    /// leave the record untouched.
    pub fn start(&self, config: S::Config, mut rng: Box<dyn RandomSource>) -> Result<JoinHandle<()>>
    where
        S: Simulation,
    {
        let cancel = {
            let mut guard = self.cell.state.lock();
            let state = S::project_mut(&mut guard).ok_or(GameError::WrongKind { expected: S::KIND })?;
            if state.is_running() {
                return Err(GameError::AlreadyRunning { kind: S::KIND });
            }
            state.prepare(&config, rng.as_mut())?;

            let mut run = self.cell.run.lock();
            run.cancel();
            *run = CancelFlag::new();
            run.clone()
        };

        info!(kind = %S::KIND, "match started");
        let live = LiveMatch::new(Arc::downgrade(&self.cell), cancel);
        Ok(tokio::spawn(S::drive(live, rng, config)))
    }
}

/// A driver loop's view of its match.
pub struct LiveMatch<S> {
    cell: Weak<MatchCell>,
    cancel: CancelFlag,
    _kind: PhantomData<fn() -> S>,
}

impl<S: GameVariant> LiveMatch<S> {
    fn new(cell: Weak<MatchCell>, cancel: CancelFlag) -> Self {
        Self {
            cell,
            cancel,
            _kind: PhantomData,
        }
    }

    /// Mutate the record if this run is still current.
    ///
    /// Returns `None` when the record is gone, the run was cancelled, or
    /// the record no longer holds this game. The loop should then return.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        let cell = self.cell.upgrade()?;
        let mut guard = cell.state.lock();
        // Checked under the state lock so a concurrent reset cannot be
        // overwritten by a stale tick.
        if self.cancel.is_cancelled() {
            return None;
        }
        let out = S::project_mut(&mut guard).map(f);
        out
    }

    /// Is this run still current?
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && self.cell.strong_count() > 0
    }

    /// Sleep for one pacing step; `false` if the run ended meanwhile.
    pub async fn pause(&self, duration: Duration) -> bool {
        tokio::time::sleep(duration).await;
        self.is_live()
    }

    /// Log and stop: the record vanished or was reset under the loop.
    pub fn exit_quietly(&self) {
        debug!(kind = %S::KIND, "driver loop exiting, match gone or cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::GameRng;
    use crate::games::dice::DiceState;
    use crate::games::roulette::RouletteState;

    fn dice_match() -> Match<DiceState> {
        let mut rng = GameRng::new(1);
        let cell = Arc::new(MatchCell::new(DiceState::new_match(&mut rng).into_state()));
        Match::attach(cell).unwrap()
    }

    #[test]
    fn test_attach_checks_kind() {
        let m = dice_match();
        let result = Match::<RouletteState>::attach(Arc::clone(m.cell()));
        assert!(matches!(result, Err(GameError::WrongKind { expected: GameKind::Roulette })));
    }

    #[test]
    fn test_roster_edits() {
        let m = dice_match();
        let mut rng = GameRng::new(2);

        let index = m.add_participant("  Dana ", &mut rng).unwrap();
        assert_eq!(index, 4);
        assert_eq!(m.read(|s| s.players[4].participant.name.clone()).unwrap(), "Dana");

        m.rename_participant(0, "Ari").unwrap();
        assert_eq!(m.read(|s| s.players[0].participant.name.clone()).unwrap(), "Ari");

        assert_eq!(m.rename_participant(9, "x"), Err(GameError::IndexOutOfRange { index: 9, len: 5 }));
        assert_eq!(m.rename_participant(0, " "), Err(GameError::EmptyName));

        let removed = m.remove_participant(0, &mut rng).unwrap();
        assert_eq!(removed.name, "Ari");
        assert_eq!(m.read(|s| s.participant_count()).unwrap(), 4);
    }

    #[test]
    fn test_roster_capacity_and_floor() {
        let m = dice_match();
        let mut rng = GameRng::new(2);

        for i in 0..3 {
            m.add_participant(&format!("Extra {}", i), &mut rng).unwrap();
        }
        assert_eq!(
            m.add_participant("One too many", &mut rng),
            Err(GameError::TooManyParticipants { max: 7 })
        );

        while m.read(|s| s.participant_count()).unwrap() > 2 {
            m.remove_participant(0, &mut rng).unwrap();
        }
        assert_eq!(
            m.remove_participant(0, &mut rng),
            Err(GameError::NotEnoughParticipants { min: 2, found: 1 })
        );
    }

    #[test]
    fn test_roster_locked_while_running() {
        let m = dice_match();
        let mut rng = GameRng::new(2);
        m.update(|s| s.running = true).unwrap();

        assert_eq!(
            m.add_participant("Late", &mut rng),
            Err(GameError::RosterLocked { kind: GameKind::Dice })
        );
        assert_eq!(
            m.remove_participant(0, &mut rng),
            Err(GameError::RosterLocked { kind: GameKind::Dice })
        );

        m.reset(&mut rng).unwrap();
        assert!(m.add_participant("Late", &mut rng).is_ok());
    }

    #[test]
    fn test_roster_change_clears_finished_result() {
        let m = dice_match();
        let mut rng = GameRng::new(2);
        m.update(|s| {
            s.finished = true;
            s.winner = Some(3);
            s.players[3].total = 2;
        })
        .unwrap();

        m.remove_participant(3, &mut rng).unwrap();
        m.read(|s| {
            assert_eq!(s.is_finished(), s.winner().is_some());
            assert!(!s.finished);
            assert!(s.players.iter().all(|p| p.total == 0));
        })
        .unwrap();

        m.update(|s| {
            s.finished = true;
            s.winner = Some(0);
        })
        .unwrap();
        m.add_participant("Late", &mut rng).unwrap();
        assert_eq!(m.read(|s| (s.finished, s.winner)).unwrap(), (false, None));
    }

    #[test]
    fn test_rename_keeps_finished_result() {
        let m = dice_match();
        m.update(|s| {
            s.finished = true;
            s.winner = Some(1);
        })
        .unwrap();

        m.rename_participant(1, "Champ").unwrap();
        assert_eq!(m.read(|s| s.winner().map(|p| p.name.clone())).unwrap(), Some("Champ".to_string()));
    }

    #[test]
    fn test_live_match_stops_after_cancel_or_drop() {
        let m = dice_match();
        let flag = CancelFlag::new();
        let live: LiveMatch<DiceState> = LiveMatch::new(Arc::downgrade(m.cell()), flag.clone());

        assert_eq!(live.update(|s| s.round_number), Some(1));
        assert!(live.is_live());

        flag.cancel();
        assert!(!live.is_live());
        assert_eq!(live.update(|s| s.round_number), None);

        let m2 = dice_match();
        let live2: LiveMatch<DiceState> = LiveMatch::new(Arc::downgrade(m2.cell()), CancelFlag::new());
        drop(m2);
        assert!(!live2.is_live());
        assert_eq!(live2.update(|s| s.round_number), None);
    }
}
