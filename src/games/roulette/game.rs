//! Roulette implementation.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::config::{ArenaConfig, RouletteConfig};
use crate::core::error::Result;
use crate::core::participant::{default_roster, Participant};
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{require_participants, GameKind, GameVariant, Simulation};
use crate::store::LiveMatch;

/// Segment colors, assigned by roster slot.
pub const PALETTE: [&str; 10] = [
    "#FF0000", "#00FF00", "#0080FF", "#FFFF00", "#FF8000", "#FF00FF", "#00FFFF", "#8000FF",
    "#FF0080", "#80FF00",
];

/// Slope of the linear fast phase.
const FAST_SLOPE: f64 = 0.8;

/// Fraction of the final angle reached after `progress` of the spin.
///
/// Linear at slope 0.8 for the first `fast_phase` of the spin, then a
/// quartic ease-out covering the remainder. Continuous, monotone, and
/// `1.0` at `progress >= 1`.
#[must_use]
pub fn eased_progress(progress: f64, fast_phase: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    if p < fast_phase {
        return p * FAST_SLOPE;
    }
    let base = fast_phase * FAST_SLOPE;
    let r = if fast_phase < 1.0 {
        (p - fast_phase) / (1.0 - fast_phase)
    } else {
        1.0
    };
    base + (1.0 - base) * (1.0 - (1.0 - r).powi(4))
}

/// Segment under the pointer for a final wheel angle.
///
/// Segment `i` spans `[i * 360/n, (i+1) * 360/n)` measured against the
/// wheel's rotation. A floating edge landing on `n` wraps to segment 0.
#[must_use]
pub fn winner_index(final_angle: f64, participants: usize) -> usize {
    if participants == 0 {
        return 0;
    }
    let segment = 360.0 / participants as f64;
    let normalized = (360.0 - final_angle.rem_euclid(360.0)).rem_euclid(360.0);
    let index = (normalized / segment).floor() as usize;
    if index >= participants {
        0
    } else {
        index
    }
}

/// Roulette match record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouletteState {
    pub players: Vec<Participant>,
    pub running: bool,
    pub finished: bool,
    /// The wheel is moving.
    pub spinning: bool,
    /// Current wheel angle in degrees; only increases during a spin.
    pub spin_angle: f64,
    /// Index into `players`, set together with `finished`.
    pub winner: Option<usize>,
    /// Drawn final angle, hidden until the wheel lands on it.
    #[serde(skip)]
    target: Option<f64>,
}

impl RouletteState {
    /// Fresh record for a roster.
    #[must_use]
    pub fn with_roster(players: Vec<Participant>) -> Self {
        Self {
            players,
            running: false,
            finished: false,
            spinning: false,
            spin_angle: 0.0,
            winner: None,
            target: None,
        }
    }

    fn clear_progress(&mut self) {
        self.running = false;
        self.finished = false;
        self.spinning = false;
        self.spin_angle = 0.0;
        self.winner = None;
        self.target = None;
    }

    /// Begin the spin towards `target` degrees.
    pub fn begin_spin(&mut self, target: f64) {
        self.target = Some(target);
        self.spinning = true;
        self.spin_angle = 0.0;
    }

    /// Sample the angle after `progress` of the spin. Never moves backwards.
    pub fn sample(&mut self, progress: f64, fast_phase: f64) {
        if let Some(target) = self.target {
            let angle = target * eased_progress(progress, fast_phase);
            self.spin_angle = self.spin_angle.max(angle);
        }
    }

    /// Snap to the target and stop the wheel. Returns the segment it landed on.
    pub fn land(&mut self) -> usize {
        if let Some(target) = self.target {
            self.spin_angle = target;
        }
        self.spinning = false;
        winner_index(self.spin_angle, self.players.len())
    }

    /// Publish the result.
    pub fn declare_winner(&mut self, index: usize) {
        self.winner = Some(index);
        self.finished = true;
        self.running = false;
        self.target = None;
    }
}

impl GameVariant for RouletteState {
    const KIND: GameKind = GameKind::Roulette;
    const MAX_PARTICIPANTS: usize = 10;

    fn new_match(_rng: &mut dyn RandomSource) -> Self {
        Self::with_roster(default_roster("Player", 4, &PALETTE))
    }

    fn project(state: &GameState) -> Option<&Self> {
        match state {
            GameState::Roulette(s) => Some(s),
            _ => None,
        }
    }

    fn project_mut(state: &mut GameState) -> Option<&mut Self> {
        match state {
            GameState::Roulette(s) => Some(s),
            _ => None,
        }
    }

    fn into_state(self) -> GameState {
        GameState::Roulette(self)
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
        self.players.get(index)
    }

    fn participant_mut(&mut self, index: usize) -> Option<&mut Participant> {
        self.players.get_mut(index)
    }

    fn push_participant(&mut self, name: String, _rng: &mut dyn RandomSource) {
        let slot = self.players.len();
        self.players.push(Participant::from_palette(name, &PALETTE, slot));
    }

    fn remove_participant(&mut self, index: usize, _rng: &mut dyn RandomSource) {
        self.players.remove(index);
    }

    fn reset(&mut self, _rng: &mut dyn RandomSource) {
        self.clear_progress();
    }

    fn winner(&self) -> Option<&Participant> {
        self.winner.and_then(|i| self.players.get(i))
    }
}

impl Simulation for RouletteState {
    type Config = RouletteConfig;

    fn config(arena: &ArenaConfig) -> &RouletteConfig {
        &arena.roulette
    }

    fn prepare(&mut self, _config: &RouletteConfig, _rng: &mut dyn RandomSource) -> Result<()> {
        require_participants(self.players.len())?;
        self.clear_progress();
        self.running = true;
        Ok(())
    }

    fn drive(
        live: LiveMatch<Self>,
        rng: Box<dyn RandomSource>,
        config: RouletteConfig,
    ) -> impl Future<Output = ()> + Send {
        run_roulette(live, rng, config)
    }
}

async fn run_roulette(
    live: LiveMatch<RouletteState>,
    mut rng: Box<dyn RandomSource>,
    config: RouletteConfig,
) {
    if !live.pause(config.countdown).await {
        live.exit_quietly();
        return;
    }

    let target = rng.roll(config.min_angle, config.max_angle) as f64;
    if live.update(|s| s.begin_spin(target)).is_none() {
        live.exit_quietly();
        return;
    }
    debug!(target, "wheel spinning");

    let started = Instant::now();
    let duration = config.spin_duration.as_secs_f64();
    loop {
        let progress = if duration > 0.0 {
            started.elapsed().as_secs_f64() / duration
        } else {
            1.0
        };
        if progress >= 1.0 {
            break;
        }
        if live.update(|s| s.sample(progress, config.fast_phase)).is_none() {
            live.exit_quietly();
            return;
        }
        let cadence = if progress < config.fast_phase {
            config.fast_interval
        } else {
            config.slow_interval
        };
        if !live.pause(cadence).await {
            live.exit_quietly();
            return;
        }
    }

    let Some(index) = live.update(RouletteState::land) else {
        live.exit_quietly();
        return;
    };

    if !live.pause(config.reveal_delay).await {
        live.exit_quietly();
        return;
    }

    if let Some(Some(name)) = live.update(|s| {
        s.declare_winner(index);
        s.winner().map(|p| p.name.clone())
    }) {
        info!(winner = %name, index, "roulette finished");
    }
}
