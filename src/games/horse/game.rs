//! Horse race implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::config::{ArenaConfig, HorseConfig};
use crate::core::error::{GameError, Result};
use crate::core::participant::{default_roster, Participant};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{require_participants, GameKind, GameVariant, Simulation};
use crate::store::{LiveMatch, Match};

/// Horse colors, assigned by roster slot.
pub const PALETTE: [&str; 10] = [
    "#FF0000", "#00FF00", "#0080FF", "#FFFF00", "#FF8000", "#FF00FF", "#00FFFF", "#8000FF",
    "#FF0080", "#80FF00",
];

/// Which finisher wins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaceMode {
    /// Earliest finish time wins.
    #[default]
    First,
    /// Latest finish time wins.
    Last,
}

impl std::fmt::Display for RaceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RaceMode::First => write!(f, "first"),
            RaceMode::Last => write!(f, "last"),
        }
    }
}

/// One runner on the track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    #[serde(flatten)]
    pub participant: Participant,
    /// Distance covered, `0..=distance`.
    pub position: f64,
    pub speed: f64,
    /// Elapsed race seconds when the finish was crossed.
    pub finish_time: Option<f64>,
}

impl Horse {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            position: 0.0,
            speed: 0.0,
            finish_time: None,
        }
    }

    fn clear_progress(&mut self) {
        self.position = 0.0;
        self.speed = 0.0;
        self.finish_time = None;
    }

    /// Has this horse crossed the finish?
    #[must_use]
    pub fn is_home(&self) -> bool {
        self.finish_time.is_some()
    }
}

/// Winner by finish time; `None` until every horse is home.
///
/// Equal times go to the lowest index in both modes.
pub fn pick_winner(horses: &[Horse], mode: RaceMode) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, horse) in horses.iter().enumerate() {
        let time = horse.finish_time?;
        let better = match best {
            None => true,
            Some((_, best_time)) => match mode {
                RaceMode::First => time < best_time,
                RaceMode::Last => time > best_time,
            },
        };
        if better {
            best = Some((index, time));
        }
    }
    best.map(|(index, _)| index)
}

/// Horse race record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HorseState {
    pub players: Vec<Horse>,
    pub mode: RaceMode,
    pub running: bool,
    pub finished: bool,
    /// The countdown is over and the horses are moving.
    pub started: bool,
    /// Index into `players` once resolved.
    pub winner: Option<usize>,
    /// Elapsed race seconds at the latest tick.
    pub race_time: f64,
}

impl HorseState {
    /// Fresh record for a roster.
    #[must_use]
    pub fn with_roster(roster: Vec<Participant>) -> Self {
        Self {
            players: roster.into_iter().map(Horse::new).collect(),
            mode: RaceMode::First,
            running: false,
            finished: false,
            started: false,
            winner: None,
            race_time: 0.0,
        }
    }

    fn clear_progress(&mut self) {
        self.running = false;
        self.finished = false;
        self.started = false;
        self.winner = None;
        self.race_time = 0.0;
        for horse in &mut self.players {
            horse.clear_progress();
        }
    }

    /// One tick at `elapsed` race seconds.
    ///
    /// Returns the winner's index on the tick the last horse finishes.
    pub fn advance(&mut self, elapsed: f64, rng: &mut dyn RandomSource, config: &HorseConfig) -> Option<usize> {
        self.race_time = elapsed;

        for horse in self.players.iter_mut().filter(|h| !h.is_home()) {
            let delta = rng.uniform(config.speed_delta_min, config.speed_delta_max);
            horse.speed = (horse.speed + delta).clamp(config.min_speed, config.max_speed);
            horse.position += horse.speed * config.stride;

            if horse.position >= config.distance {
                horse.position = config.distance;
                horse.finish_time = Some(elapsed);
            }
        }

        let winner = pick_winner(&self.players, self.mode)?;
        self.winner = Some(winner);
        self.finished = true;
        self.running = false;
        Some(winner)
    }
}

impl Match<HorseState> {
    /// Choose whether the first or last finisher wins.
    ///
    /// Rejected while a race is running.
    pub fn set_mode(&self, mode: RaceMode) -> Result<()> {
        self.update(|state| {
            if state.running {
                return Err(GameError::AlreadyRunning {
                    kind: GameKind::HorseRace,
                });
            }
            state.mode = mode;
            Ok(())
        })?
    }
}

impl GameVariant for HorseState {
    const KIND: GameKind = GameKind::HorseRace;
    const MAX_PARTICIPANTS: usize = 10;

    fn new_match(_rng: &mut dyn RandomSource) -> Self {
        Self::with_roster(default_roster("Horse", 4, &PALETTE))
    }

    fn project(state: &GameState) -> Option<&Self> {
        match state {
            GameState::HorseRace(s) => Some(s),
            _ => None,
        }
    }

    fn project_mut(state: &mut GameState) -> Option<&mut Self> {
        match state {
            GameState::HorseRace(s) => Some(s),
            _ => None,
        }
    }

    fn into_state(self) -> GameState {
        GameState::HorseRace(self)
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
        self.players.get(index).map(|h| &h.participant)
    }

    fn participant_mut(&mut self, index: usize) -> Option<&mut Participant> {
        self.players.get_mut(index).map(|h| &mut h.participant)
    }

    fn push_participant(&mut self, name: String, _rng: &mut dyn RandomSource) {
        let slot = self.players.len();
        self.players
            .push(Horse::new(Participant::from_palette(name, &PALETTE, slot)));
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

impl Simulation for HorseState {
    type Config = HorseConfig;

    fn config(arena: &ArenaConfig) -> &HorseConfig {
        &arena.horse
    }

    fn prepare(&mut self, _config: &HorseConfig, _rng: &mut dyn RandomSource) -> Result<()> {
        require_participants(self.players.len())?;
        self.clear_progress();
        self.running = true;
        Ok(())
    }

    fn drive(
        live: LiveMatch<Self>,
        rng: Box<dyn RandomSource>,
        config: HorseConfig,
    ) -> impl Future<Output = ()> + Send {
        run_race(live, rng, config)
    }
}

async fn run_race(live: LiveMatch<HorseState>, mut rng: Box<dyn RandomSource>, config: HorseConfig) {
    if !live.pause(config.countdown).await || live.update(|s| s.started = true).is_none() {
        live.exit_quietly();
        return;
    }
    debug!("gates open");

    let started = Instant::now();
    loop {
        if !live.pause(config.tick).await {
            live.exit_quietly();
            return;
        }
        let elapsed = started.elapsed().as_secs_f64();
        let tick = live.update(|s| {
            s.advance(elapsed, rng.as_mut(), &config)
                .map(|winner| (s.mode, s.players[winner].participant.name.clone()))
        });
        match tick {
            None => {
                live.exit_quietly();
                return;
            }
            Some(None) => {}
            Some(Some((mode, name))) => {
                info!(winner = %name, %mode, race_time = elapsed, "horse race finished");
                return;
            }
        }
    }
}
