//! Random number generation for the simulation engines.
//!
//! ## Key Features
//!
//! - **Injectable**: Engines only see the object-safe [`RandomSource`] trait
//! - **Seeded**: [`GameRng`] produces the same sequence from the same seed
//! - **Forkable**: Every match gets its own independent stream
//! - **Scriptable**: [`ScriptedRng`] replays fixed values for tests
//!
//! ## Usage
//!
//! ```
//! use rust_party::core::{GameRng, RandomSource};
//!
//! let mut master = GameRng::new(42);
//!
//! // Fork a stream for one match
//! let mut match_rng = master.fork();
//!
//! let die = match_rng.roll(1, 6);
//! assert!((1..=6).contains(&die));
//! ```

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform randomness consumed by the driver loops.
///
/// Object-safe so a match can own a `Box<dyn RandomSource>` that tests
/// replace with scripted values.
pub trait RandomSource: Send {
    /// Uniform integer in `low..=high`.
    fn roll(&mut self, low: i64, high: i64) -> i64;

    /// Uniform real in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool {
        self.uniform(0.0, 1.0) < probability
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from an empty range");
        self.roll(0, len as i64 - 1) as usize
    }

    /// Uniformly random permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut out: Vec<usize> = (0..len).collect();
        // Fisher-Yates
        for i in (1..len).rev() {
            let j = self.pick(i + 1);
            out.swap(i, j);
        }
        out
    }

    /// `count` distinct values from `low..=high`, in draw order.
    ///
    /// Returns fewer values when the range is smaller than `count`.
    fn sample_distinct(&mut self, low: i64, high: i64, count: usize) -> Vec<i64> {
        let mut pool: Vec<i64> = (low..=high).collect();
        let take = count.min(pool.len());
        for i in 0..take {
            let j = i + self.pick(pool.len() - i);
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

/// Seeded RNG with forking for per-match streams.
///
/// Uses ChaCha8 for speed while maintaining high quality randomness.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// Create an RNG seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent stream.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self.seed.wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self::new(fork_seed)
    }
}

impl RandomSource for GameRng {
    fn roll(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability.clamp(0.0, 1.0))
    }

    fn pick(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut out: Vec<usize> = (0..len).collect();
        out.shuffle(&mut self.inner);
        out
    }

    fn sample_distinct(&mut self, low: i64, high: i64, count: usize) -> Vec<i64> {
        if high < low {
            return Vec::new();
        }
        let span = (high - low + 1) as usize;
        rand::seq::index::sample(&mut self.inner, span, count.min(span))
            .into_iter()
            .map(|offset| low + offset as i64)
            .collect()
    }
}

/// Replays queued values, then falls back to a seeded [`GameRng`].
///
/// Queued values are returned verbatim: bounds are not checked, so a test
/// can force any outcome (e.g. a roulette angle outside the normal draw).
#[derive(Clone, Debug)]
pub struct ScriptedRng {
    ints: VecDeque<i64>,
    reals: VecDeque<f64>,
    fallback: GameRng,
}

impl ScriptedRng {
    /// Empty script with a fallback seeded from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            ints: VecDeque::new(),
            reals: VecDeque::new(),
            fallback: GameRng::new(seed),
        }
    }

    /// Queue integers returned by `roll` (and `pick`, which rolls).
    #[must_use]
    pub fn with_ints(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.ints.extend(values);
        self
    }

    /// Queue reals returned by `uniform` (and `chance`, which draws one).
    #[must_use]
    pub fn with_reals(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.reals.extend(values);
        self
    }

    /// Number of queued values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.ints.len() + self.reals.len()
    }
}

impl RandomSource for ScriptedRng {
    fn roll(&mut self, low: i64, high: i64) -> i64 {
        match self.ints.pop_front() {
            Some(value) => value,
            None => self.fallback.roll(low, high),
        }
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        match self.reals.pop_front() {
            Some(value) => value,
            None => self.fallback.uniform(low, high),
        }
    }
}
