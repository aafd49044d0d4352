//! Dice roll-off implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::{ArenaConfig, DiceConfig};
use crate::core::error::Result;
use crate::core::participant::{default_roster, Participant};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{require_participants, GameKind, GameVariant, Simulation};
use crate::store::LiveMatch;

/// Participant colors, assigned by roster slot.
pub const PALETTE: [&str; 7] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#ffeaa7", "#fd79a8", "#fdcb6e",
];

/// One participant and their latest roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePlayer {
    #[serde(flatten)]
    pub participant: Participant,
    /// First die face (0 = not rolled this round).
    pub die1: u8,
    /// Second die face (0 = not rolled this round).
    pub die2: u8,
    /// Sum of both faces.
    pub total: u8,
}

impl DicePlayer {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            die1: 0,
            die2: 0,
            total: 0,
        }
    }

    fn clear_roll(&mut self) {
        self.die1 = 0;
        self.die2 = 0;
        self.total = 0;
    }
}

/// Dice match record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiceState {
    pub players: Vec<DicePlayer>,
    pub running: bool,
    pub finished: bool,
    /// Index into `players` once resolved.
    pub winner: Option<usize>,
    /// Position within the active set of whoever rolls next.
    pub current_turn: usize,
    /// A roll is in flight (the dice are tumbling).
    pub rolling: bool,
    /// 1-based round counter; each tie-break is a new round.
    pub round_number: u32,
    pub is_tie_breaker: bool,
    /// Indices still competing during a tie-break.
    pub tie_breaker_players: Vec<usize>,
}

/// What the driver does next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiceStep {
    /// Roll for the participant at this roster index.
    Roll(usize),
    /// The match is over or was stopped.
    Done,
}

/// Outcome of a completed round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A single lowest total.
    Winner(usize),
    /// Several participants share the lowest total.
    Tie(Vec<usize>),
}

/// Lowest total wins; returns every index holding it when tied.
///
/// `active` must not be empty.
pub fn resolve_round(players: &[DicePlayer], active: &[usize]) -> RoundOutcome {
    let min_total = active.iter().map(|&i| players[i].total).min().unwrap_or(0);
    let lowest: Vec<usize> = active
        .iter()
        .copied()
        .filter(|&i| players[i].total == min_total)
        .collect();

    match lowest.as_slice() {
        [single] => RoundOutcome::Winner(*single),
        _ => RoundOutcome::Tie(lowest),
    }
}

impl DiceState {
    /// Fresh record for a roster.
    #[must_use]
    pub fn with_roster(roster: Vec<Participant>) -> Self {
        Self {
            players: roster.into_iter().map(DicePlayer::new).collect(),
            running: false,
            finished: false,
            winner: None,
            current_turn: 0,
            rolling: false,
            round_number: 1,
            is_tie_breaker: false,
            tie_breaker_players: Vec::new(),
        }
    }

    /// Roster indices competing this round.
    #[must_use]
    pub fn active_players(&self) -> Vec<usize> {
        if self.is_tie_breaker {
            self.tie_breaker_players.clone()
        } else {
            (0..self.players.len()).collect()
        }
    }

    /// Roster index of whoever rolls next, if the round is not complete.
    #[must_use]
    pub fn current_player(&self) -> Option<usize> {
        self.active_players().get(self.current_turn).copied()
    }

    fn clear_progress(&mut self) {
        self.running = false;
        self.finished = false;
        self.winner = None;
        self.current_turn = 0;
        self.rolling = false;
        self.round_number = 1;
        self.is_tie_breaker = false;
        self.tie_breaker_players.clear();
        for player in &mut self.players {
            player.clear_roll();
        }
    }

    fn declare_winner(&mut self, index: usize) {
        self.winner = Some(index);
        self.finished = true;
        self.running = false;
        self.rolling = false;
    }

    /// Start a tie-break round among `tied`.
    fn begin_tie_break(&mut self, tied: Vec<usize>) {
        for &i in &tied {
            self.players[i].clear_roll();
        }
        self.tie_breaker_players = tied;
        self.is_tie_breaker = true;
        self.current_turn = 0;
        self.round_number += 1;
    }

    /// Advance the state machine up to the next roll.
    ///
    /// Resolves completed rounds (declaring a winner or opening a
    /// tie-break) and returns whose turn it is. `rng` is only drawn from
    /// when `max_rounds` forces a decision on a standing tie.
    pub fn next_step(&mut self, config: &DiceConfig, rng: &mut dyn RandomSource) -> DiceStep {
        loop {
            if !self.running || self.finished {
                return DiceStep::Done;
            }

            let active = self.active_players();
            if active.is_empty() {
                self.running = false;
                return DiceStep::Done;
            }
            if let Some(&index) = active.get(self.current_turn) {
                return DiceStep::Roll(index);
            }

            match resolve_round(&self.players, &active) {
                RoundOutcome::Winner(index) => {
                    self.declare_winner(index);
                }
                RoundOutcome::Tie(tied) => {
                    let capped = config.max_rounds.is_some_and(|cap| self.round_number >= cap);
                    if capped {
                        let index = tied[rng.pick(tied.len())];
                        debug!(round = self.round_number, "tie-break cap reached, drawing winner");
                        self.declare_winner(index);
                    } else {
                        debug!(round = self.round_number, tied = tied.len(), "tie, rolling again");
                        self.begin_tie_break(tied);
                    }
                }
            }
        }
    }

    /// Record both faces for a participant.
    pub fn record_roll(&mut self, index: usize, die1: u8, die2: u8) {
        if let Some(player) = self.players.get_mut(index) {
            player.die1 = die1;
            player.die2 = die2;
            player.total = die1.saturating_add(die2);
        }
        self.rolling = false;
    }
}

impl GameVariant for DiceState {
    const KIND: GameKind = GameKind::Dice;
    const MAX_PARTICIPANTS: usize = 7;

    fn new_match(_rng: &mut dyn RandomSource) -> Self {
        Self::with_roster(default_roster("Player", 4, &PALETTE))
    }

    fn project(state: &GameState) -> Option<&Self> {
        match state {
            GameState::Dice(s) => Some(s),
            _ => None,
        }
    }

    fn project_mut(state: &mut GameState) -> Option<&mut Self> {
        match state {
            GameState::Dice(s) => Some(s),
            _ => None,
        }
    }

    fn into_state(self) -> GameState {
        GameState::Dice(self)
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn participant_count(&self) -> usize {
        self.players.len()
    }

    fn participant(&self, index: usize) -> Option<&Participant> {
        self.players.get(index).map(|p| &p.participant)
    }

    fn participant_mut(&mut self, index: usize) -> Option<&mut Participant> {
        self.players.get_mut(index).map(|p| &mut p.participant)
    }

    fn push_participant(&mut self, name: String, _rng: &mut dyn RandomSource) {
        let slot = self.players.len();
        self.players
            .push(DicePlayer::new(Participant::from_palette(name, &PALETTE, slot)));
    }

    fn remove_participant(&mut self, index: usize, _rng: &mut dyn RandomSource) {
        self.players.remove(index);
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        self.clear_progress();
    }

    fn winner(&self) -> Option<&Participant> {
        self.winner.and_then(|i| self.participant(i))
    }
}

impl Simulation for DiceState {
    type Config = DiceConfig;

    fn config(arena: &ArenaConfig) -> &DiceConfig {
        &arena.dice
    }

    fn prepare(&mut self, _config: &DiceConfig, _rng: &mut dyn RandomSource) -> Result<()> {
        require_participants(self.players.len())?;
        self.clear_progress();
        self.running = true;
        Ok(())
    }

    fn drive(
        live: LiveMatch<Self>,
        rng: Box<dyn RandomSource>,
        config: DiceConfig,
    ) -> impl Future<Output = ()> + Send {
        run_dice(live, rng, config)
    }
}

async fn run_dice(live: LiveMatch<DiceState>, mut rng: Box<dyn RandomSource>, config: DiceConfig) {
    loop {
        let Some(step) = live.update(|s| s.next_step(&config, rng.as_mut())) else {
            live.exit_quietly();
            return;
        };

        let index = match step {
            DiceStep::Roll(index) => index,
            DiceStep::Done => break,
        };

        if live.update(|s| s.rolling = true).is_none() || !live.pause(config.roll_delay).await {
            live.exit_quietly();
            return;
        }

        let die1 = rng.roll(1, 6) as u8;
        let die2 = rng.roll(1, 6) as u8;
        if live.update(|s| s.record_roll(index, die1, die2)).is_none() {
            live.exit_quietly();
            return;
        }
        debug!(player = index, die1, die2, "dice landed");

        if !live.pause(config.reveal_delay).await || live.update(|s| s.current_turn += 1).is_none() {
            live.exit_quietly();
            return;
        }
    }

    if let Some(Some(name)) = live.update(|s| s.winner().map(|p| p.name.clone())) {
        info!(winner = %name, "dice match finished");
    }
}
