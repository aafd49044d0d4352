//! Engine configuration.
//!
//! Each game has its own config carrying the pacing and tuning constants of
//! its driver loop. `ArenaConfig` bundles them with the store limits and an
//! optional master seed.
//!
//! Defaults reproduce the live game. Tests usually keep the defaults and run
//! under tokio's paused clock instead of shrinking durations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dice roll-off pacing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiceConfig {
    /// How long a participant shows as "rolling" before the faces land.
    pub roll_delay: Duration,

    /// Pause after the faces land before the next turn.
    pub reveal_delay: Duration,

    /// Tie-break safety cap (`None` = unbounded).
    /// Reaching it with a tie still standing draws the winner at random
    /// from the tied participants.
    pub max_rounds: Option<u32>,
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            roll_delay: Duration::from_secs(2),
            reveal_delay: Duration::from_secs(1),
            max_rounds: None,
        }
    }
}

impl DiceConfig {
    /// Cap the number of rounds (the first round included).
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = Some(rounds);
        self
    }
}

/// Roulette spin timing and easing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouletteConfig {
    /// Countdown before the wheel starts moving.
    pub countdown: Duration,

    /// Length of the spin animation.
    pub spin_duration: Duration,

    /// Final angle range in whole degrees, `min..=max`.
    pub min_angle: i64,
    pub max_angle: i64,

    /// Fraction of the spin spent in the linear fast phase.
    pub fast_phase: f64,

    /// Sample cadence during the fast phase.
    pub fast_interval: Duration,

    /// Sample cadence during deceleration.
    pub slow_interval: Duration,

    /// Pause between the wheel stopping and the result.
    pub reveal_delay: Duration,
}

impl Default for RouletteConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_millis(3500),
            spin_duration: Duration::from_secs(5),
            min_angle: 2160,
            max_angle: 3599,
            fast_phase: 0.7,
            fast_interval: Duration::from_millis(30),
            slow_interval: Duration::from_millis(80),
            reveal_delay: Duration::from_secs(1),
        }
    }
}

impl RouletteConfig {
    /// Set the spin length.
    #[must_use]
    pub fn with_spin_duration(mut self, duration: Duration) -> Self {
        self.spin_duration = duration;
        self
    }
}

/// Horse race motion model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HorseConfig {
    /// Countdown before the gates open.
    pub countdown: Duration,

    /// Simulation tick.
    pub tick: Duration,

    /// Track length.
    pub distance: f64,

    /// Per-tick speed change range, `[min, max)`.
    pub speed_delta_min: f64,
    pub speed_delta_max: f64,

    /// Speed clamp.
    pub min_speed: f64,
    pub max_speed: f64,

    /// Distance covered per unit of speed per tick.
    pub stride: f64,
}

impl Default for HorseConfig {
    fn default() -> Self {
        Self {
            countdown: Duration::from_millis(3500),
            tick: Duration::from_millis(100),
            distance: 100.0,
            speed_delta_min: -0.8,
            speed_delta_max: 1.5,
            min_speed: 0.2,
            max_speed: 2.5,
            stride: 0.3,
        }
    }
}

impl HorseConfig {
    /// Upper bound on ticks any horse needs to finish.
    ///
    /// The speed floor guarantees progress every tick, so the race always
    /// terminates within this many ticks.
    #[must_use]
    pub fn max_ticks(&self) -> u64 {
        (self.distance / (self.min_speed * self.stride)).ceil() as u64
    }
}

/// Ladder map shape and tick rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Simulation tick.
    pub tick: Duration,

    /// Number of levels in the map.
    pub levels: usize,

    /// Levels eligible for obstacles, `first..=last`.
    pub first_obstacle_level: usize,
    pub last_obstacle_level: usize,

    /// Obstacles per lane are the participant count clamped to this range.
    pub min_obstacles_per_lane: usize,
    pub max_obstacles_per_lane: usize,

    /// Position increment per tick.
    pub step: f64,

    /// Finish line (past the last level so obstacles resolve first).
    pub finish_line: f64,

    /// Distance before the finish inside which lanes stop changing.
    pub finish_margin: f64,

    /// Per-tick probability of an organic lane change.
    pub lane_change_chance: f64,

    /// Ticks every status effect lasts.
    pub effect_ticks: u32,

    /// Forced swaps granted by a spinner.
    pub spinner_swaps: u32,

    /// A spinner swaps when its countdown is a multiple of this.
    pub spinner_period: u32,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(150),
            levels: 90,
            first_obstacle_level: 8,
            last_obstacle_level: 81,
            min_obstacles_per_lane: 3,
            max_obstacles_per_lane: 5,
            step: 1.1,
            finish_line: 102.0,
            finish_margin: 2.5,
            lane_change_chance: 0.3,
            effect_ticks: 10,
            spinner_swaps: 8,
            spinner_period: 3,
        }
    }
}

impl LadderConfig {
    /// Obstacles placed on each lane for a roster of `participants`.
    #[must_use]
    pub fn obstacles_per_lane(&self, participants: usize) -> usize {
        participants.clamp(self.min_obstacles_per_lane, self.max_obstacles_per_lane)
    }

    /// Set the organic lane-change probability.
    #[must_use]
    pub fn with_lane_change_chance(mut self, chance: f64) -> Self {
        self.lane_change_chance = chance;
        self
    }
}

/// Limits of the identity -> match store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum live records before the least-recently-active is evicted.
    pub max_sessions: usize,

    /// Inactivity after which a record expires.
    pub session_timeout: Duration,

    /// Housekeeping period.
    pub cleanup_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: 500,
            session_timeout: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl StoreConfig {
    /// Set the capacity bound.
    #[must_use]
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        assert!(max > 0, "Store must hold at least 1 session");
        self.max_sessions = max;
        self
    }

    /// Set the inactivity timeout.
    #[must_use]
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }
}

/// Complete arena configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub dice: DiceConfig,
    pub roulette: RouletteConfig,
    pub horse: HorseConfig,
    pub ladder: LadderConfig,
    pub store: StoreConfig,

    /// Master seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl ArenaConfig {
    /// Fix the master seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the dice config.
    #[must_use]
    pub fn with_dice(mut self, dice: DiceConfig) -> Self {
        self.dice = dice;
        self
    }

    /// Replace the roulette config.
    #[must_use]
    pub fn with_roulette(mut self, roulette: RouletteConfig) -> Self {
        self.roulette = roulette;
        self
    }

    /// Replace the horse race config.
    #[must_use]
    pub fn with_horse(mut self, horse: HorseConfig) -> Self {
        self.horse = horse;
        self
    }

    /// Replace the ladder config.
    #[must_use]
    pub fn with_ladder(mut self, ladder: LadderConfig) -> Self {
        self.ladder = ladder;
        self
    }

    /// Replace the store limits.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }
}
