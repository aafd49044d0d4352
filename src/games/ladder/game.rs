//! Ladder race implementation.
//!
//! ## Tick
//!
//! Runners are processed in roster order. For each runner:
//!
//! 1. Count down active effects. A spinner forces a lane swap every
//!    `spinner_period` ticks while it has swaps left.
//! 2. Away from the finish, maybe change lanes with a random neighbour.
//! 3. Climb one step.
//! 4. Hit any obstacle bound to the runner's lane on the level reached.
//!
//! After every runner has moved, the race ends if the occupant of the
//! winning lane has crossed the finish line.
//!
//! Lanes are always a permutation of `0..n`: every lane change is a swap
//! between two occupants.

use std::future::Future;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use super::map::{generate_results, LadderMap, LaneResult, Obstacle, ObstacleKind};
use crate::core::config::{ArenaConfig, LadderConfig};
use crate::core::error::{GameError, Result};
use crate::core::participant::{default_roster, Participant};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{require_participants, GameKind, GameVariant, Simulation};
use crate::store::LiveMatch;

/// Runner colors, assigned by roster slot.
pub const PALETTE: [&str; 10] = [
    "#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#ffeaa7", "#fd79a8", "#fdcb6e", "#6c5ce7",
    "#a29bfe", "#e17055",
];

/// Remaining ticks of each status effect (0 = inactive).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    pub spinner: u32,
    /// Forced swaps the current spinner may still make.
    pub spinner_swaps: u32,
    pub rocket: u32,
    pub lightning: u32,
    pub tornado: u32,
    pub freeze: u32,
}

impl StatusEffects {
    /// Effects currently showing.
    #[must_use]
    pub fn active(&self) -> SmallVec<[ObstacleKind; 5]> {
        let timers = [
            (ObstacleKind::Spinner, self.spinner),
            (ObstacleKind::Rocket, self.rocket),
            (ObstacleKind::Lightning, self.lightning),
            (ObstacleKind::Tornado, self.tornado),
            (ObstacleKind::Freeze, self.freeze),
        ];
        timers
            .into_iter()
            .filter(|&(_, ticks)| ticks > 0)
            .map(|(kind, _)| kind)
            .collect()
    }

    /// Count the non-spinner timers down by one tick.
    fn decay(&mut self) {
        self.rocket = self.rocket.saturating_sub(1);
        self.lightning = self.lightning.saturating_sub(1);
        self.tornado = self.tornado.saturating_sub(1);
        self.freeze = self.freeze.saturating_sub(1);
    }

    fn set(&mut self, kind: ObstacleKind, ticks: u32) {
        match kind {
            ObstacleKind::Spinner => self.spinner = ticks,
            ObstacleKind::Rocket => self.rocket = ticks,
            ObstacleKind::Lightning => self.lightning = ticks,
            ObstacleKind::Tornado => self.tornado = ticks,
            ObstacleKind::Freeze => self.freeze = ticks,
        }
    }
}

/// One climber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Runner {
    #[serde(flatten)]
    pub participant: Participant,
    /// Lane currently occupied.
    pub lane: usize,
    pub position: f64,
    /// Nominal speed, shown to clients. Movement uses the fixed step.
    pub speed: f64,
    pub effects: StatusEffects,
}

impl Runner {
    fn new(participant: Participant, lane: usize) -> Self {
        Self {
            participant,
            lane,
            position: 0.0,
            speed: 1.0,
            effects: StatusEffects::default(),
        }
    }

    fn return_to_start(&mut self, lane: usize) {
        self.lane = lane;
        self.position = 0.0;
        self.speed = 1.0;
        self.effects = StatusEffects::default();
    }
}

/// Ladder match record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LadderState {
    pub players: Vec<Runner>,
    pub map: LadderMap,
    /// Outcome per lane, fixed before the race.
    pub results: Vec<LaneResult>,
    pub running: bool,
    pub finished: bool,
    /// Index into `players` of whoever held the winning lane at the finish.
    pub winner: Option<usize>,
}

impl LadderState {
    /// Fresh record for a roster; lanes follow roster order.
    pub fn with_roster(roster: Vec<Participant>, rng: &mut dyn RandomSource) -> Self {
        let results = generate_results(roster.len(), rng);
        Self {
            players: roster
                .into_iter()
                .enumerate()
                .map(|(lane, p)| Runner::new(p, lane))
                .collect(),
            map: LadderMap::default(),
            results,
            running: false,
            finished: false,
            winner: None,
        }
    }

    /// Lane outcomes the next race will use.
    #[must_use]
    pub fn preview(&self) -> &[LaneResult] {
        &self.results
    }

    /// The lane marked as the win.
    #[must_use]
    pub fn win_lane(&self) -> Option<usize> {
        self.results.iter().position(|r| *r == LaneResult::Win)
    }

    /// Put every runner back on its own lane at the bottom.
    fn line_up(&mut self) {
        for (lane, runner) in self.players.iter_mut().enumerate() {
            runner.return_to_start(lane);
        }
    }

    fn redraw_results(&mut self, rng: &mut dyn RandomSource) {
        self.results = generate_results(self.players.len(), rng);
    }

    /// Verify the lane and results invariants the tick relies on.
    fn check_layout(&self) -> Result<()> {
        let n = self.players.len();
        if self.results.len() != n {
            return Err(GameError::CorruptState {
                detail: format!("{} lane results for {} runners", self.results.len(), n),
            });
        }
        if self.results.iter().filter(|r| **r == LaneResult::Win).count() != 1 {
            return Err(GameError::CorruptState {
                detail: "results must hold exactly one win".to_string(),
            });
        }

        let mut seen = vec![false; n];
        for runner in &self.players {
            match seen.get_mut(runner.lane) {
                Some(slot) if !*slot => *slot = true,
                _ => {
                    return Err(GameError::CorruptState {
                        detail: format!("lane {} is out of range or shared", runner.lane),
                    })
                }
            }
        }
        Ok(())
    }

    /// Move runner `index` into `lane`, sending its occupant the other way.
    fn swap_into(&mut self, index: usize, lane: usize) {
        let from = self.players[index].lane;
        if let Some(other) = self.players.iter_mut().find(|r| r.lane == lane) {
            other.lane = from;
        }
        self.players[index].lane = lane;
    }

    /// Swap runner `index` with a uniformly random other lane.
    fn random_swap(&mut self, index: usize, rng: &mut dyn RandomSource) {
        let n = self.players.len();
        if n < 2 {
            return;
        }
        let own = self.players[index].lane;
        let drawn = rng.pick(n - 1);
        let lane = if drawn >= own { drawn + 1 } else { drawn };
        self.swap_into(index, lane);
    }

    /// Reassign every lane at random.
    fn shuffle_lanes(&mut self, rng: &mut dyn RandomSource) {
        let lanes = rng.permutation(self.players.len());
        for (runner, lane) in self.players.iter_mut().zip(lanes) {
            runner.lane = lane;
        }
    }

    fn hit(
        &mut self,
        index: usize,
        obstacle: Obstacle,
        near_finish: bool,
        rng: &mut dyn RandomSource,
        config: &LadderConfig,
    ) {
        match obstacle.kind {
            ObstacleKind::Spinner => {
                self.players[index].effects.spinner_swaps = config.spinner_swaps;
            }
            ObstacleKind::Tornado if !near_finish => {
                self.shuffle_lanes(rng);
            }
            _ => {}
        }
        self.players[index].effects.set(obstacle.kind, config.effect_ticks);
        debug!(runner = index, kind = ?obstacle.kind, lane = obstacle.lane, "obstacle hit");
    }

    /// Advance one runner.
    fn step_runner(&mut self, index: usize, rng: &mut dyn RandomSource, config: &LadderConfig) {
        let near_finish = self.players[index].position >= config.finish_line - config.finish_margin;

        let effects = &mut self.players[index].effects;
        let mut forced_swap = false;
        if effects.spinner > 0 {
            effects.spinner -= 1;
            let period = config.spinner_period.max(1);
            if !near_finish && effects.spinner_swaps > 0 && effects.spinner % period == 0 {
                effects.spinner_swaps -= 1;
                forced_swap = true;
            }
        }
        effects.decay();
        if forced_swap {
            self.random_swap(index, rng);
        }

        self.players[index].speed = 1.0;
        if !near_finish && rng.chance(config.lane_change_chance) {
            self.random_swap(index, rng);
        }

        self.players[index].position += config.step;
        let position = self.players[index].position;
        let level = position.floor() as usize;
        if level >= self.map.len() || position - (level as f64) >= 1.0 {
            return;
        }

        let obstacles: SmallVec<[Obstacle; 2]> = self.map.obstacles_at(level).iter().copied().collect();
        for obstacle in obstacles {
            // A tornado may have moved this runner off the lane since the last hit
            if self.players[index].lane == obstacle.lane {
                self.hit(index, obstacle, near_finish, rng, config);
            }
        }
    }

    /// One tick of the race.
    ///
    /// Returns the winner's index on the tick the race ends. Fails without
    /// moving anyone when the lane layout is inconsistent.
    pub fn tick(&mut self, rng: &mut dyn RandomSource, config: &LadderConfig) -> Result<Option<usize>> {
        self.check_layout()?;

        for index in 0..self.players.len() {
            self.step_runner(index, rng, config);
        }

        let Some(win_lane) = self.win_lane() else {
            return Ok(None);
        };
        let winner = self
            .players
            .iter()
            .position(|r| r.lane == win_lane && r.position >= config.finish_line);
        if let Some(index) = winner {
            self.winner = Some(index);
            self.finished = true;
            self.running = false;
        }
        Ok(winner)
    }

    /// End the race early without a winner.
    pub fn abort(&mut self) {
        self.running = false;
        self.finished = false;
        self.winner = None;
    }
}

impl GameVariant for LadderState {
    const KIND: GameKind = GameKind::Ladder;
    const MAX_PARTICIPANTS: usize = 10;

    fn new_match(rng: &mut dyn RandomSource) -> Self {
        Self::with_roster(default_roster("Player", 5, &PALETTE), rng)
    }

    fn project(state: &GameState) -> Option<&Self> {
        match state {
            GameState::Ladder(s) => Some(s),
            _ => None,
        }
    }

    fn project_mut(state: &mut GameState) -> Option<&mut Self> {
        match state {
            GameState::Ladder(s) => Some(s),
            _ => None,
        }
    }

    fn into_state(self) -> GameState {
        GameState::Ladder(self)
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
        self.players.get(index).map(|r| &r.participant)
    }

    fn participant_mut(&mut self, index: usize) -> Option<&mut Participant> {
        self.players.get_mut(index).map(|r| &mut r.participant)
    }

    fn push_participant(&mut self, name: String, rng: &mut dyn RandomSource) {
        let slot = self.players.len();
        self.players
            .push(Runner::new(Participant::from_palette(name, &PALETTE, slot), slot));
        self.redraw_results(rng);
    }

    fn remove_participant(&mut self, index: usize, rng: &mut dyn RandomSource) {
        self.players.remove(index);
        for (lane, runner) in self.players.iter_mut().enumerate() {
            runner.lane = lane;
        }
        self.redraw_results(rng);
    }

    fn reset(&mut self, rng: &mut dyn RandomSource) {
        self.abort();
        self.line_up();
        self.redraw_results(rng);
    }

    fn winner(&self) -> Option<&Participant> {
        self.winner.and_then(|i| self.participant(i))
    }
}

impl Simulation for LadderState {
    type Config = LadderConfig;

    fn config(arena: &ArenaConfig) -> &LadderConfig {
        &arena.ladder
    }

    fn prepare(&mut self, config: &LadderConfig, rng: &mut dyn RandomSource) -> Result<()> {
        require_participants(self.players.len())?;
        self.abort();
        self.line_up();
        self.map = LadderMap::generate(self.players.len(), config, rng);
        // Keep the previewed results when they still fit the roster
        if self.results.len() != self.players.len() || self.win_lane().is_none() {
            self.redraw_results(rng);
        }
        self.running = true;
        Ok(())
    }

    fn drive(
        live: LiveMatch<Self>,
        rng: Box<dyn RandomSource>,
        config: LadderConfig,
    ) -> impl Future<Output = ()> + Send {
        run_ladder(live, rng, config)
    }
}

async fn run_ladder(live: LiveMatch<LadderState>, mut rng: Box<dyn RandomSource>, config: LadderConfig) {
    loop {
        let tick = live.update(|s| match s.tick(rng.as_mut(), &config) {
            Ok(outcome) => Ok(outcome.map(|w| (w, s.players[w].participant.name.clone()))),
            Err(err) => {
                s.abort();
                Err(err)
            }
        });

        match tick {
            None => {
                live.exit_quietly();
                return;
            }
            Some(Ok(None)) => {}
            Some(Ok(Some((index, name)))) => {
                info!(winner = %name, index, "ladder race finished");
                return;
            }
            Some(Err(err)) => {
                warn!(error = %err, "ladder race aborted");
                return;
            }
        }

        if !live.pause(config.tick).await {
            live.exit_quietly();
            return;
        }
    }
}
