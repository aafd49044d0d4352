//! Entry point for the web layer.
//!
//! An [`Arena`] owns the match store, the configuration and a master RNG.
//! Every call names the client and, through the type parameter, the game:
//!
//! ```no_run
//! use rust_party::arena::Arena;
//! use rust_party::core::ArenaConfig;
//! use rust_party::games::dice::DiceState;
//!
//! # async fn demo() -> rust_party::core::Result<()> {
//! let arena = Arena::new(ArenaConfig::default());
//! arena.add_participant::<DiceState>("client-1", "Mina")?;
//! arena.start::<DiceState>("client-1")?;
//! # Ok(())
//! # }
//! ```
//!
//! Every match gets its own RNG stream forked from the master, so matches
//! never share mutable state.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::config::ArenaConfig;
use crate::core::error::Result;
use crate::core::participant::Participant;
use crate::core::rng::{GameRng, RandomSource};
use crate::core::state::GameState;
use crate::games::horse::{HorseState, RaceMode};
use crate::games::ladder::{LadderState, LaneResult};
use crate::rules::{GameKind, GameVariant, Simulation};
use crate::store::{GameStore, Match, SessionKey};

/// Store, configuration and randomness for every live match.
pub struct Arena {
    config: ArenaConfig,
    store: Arc<GameStore>,
    rng: Mutex<GameRng>,
}

impl Arena {
    /// Create an arena. Seeds the master RNG from `config.seed`, or from
    /// entropy when unset.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => GameRng::new(seed),
            None => GameRng::from_entropy(),
        };
        let store = Arc::new(GameStore::new(config.store.clone()));
        Self {
            config,
            store,
            rng: Mutex::new(rng),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<GameStore> {
        &self.store
    }

    /// Independent stream for one operation or run.
    fn fork_rng(&self) -> GameRng {
        self.rng.lock().fork()
    }

    /// The client's match of game `S`, created with defaults if absent.
    pub fn open<S: GameVariant>(&self, client: &str) -> Match<S> {
        let mut rng = self.fork_rng();
        self.store.open::<S>(client, &mut rng)
    }

    /// The client's match of game `S`, if one exists.
    pub fn find<S: GameVariant>(&self, client: &str) -> Option<Match<S>> {
        self.store.find::<S>(client)
    }

    /// Append a participant; returns its index.
    pub fn add_participant<S: GameVariant>(&self, client: &str, name: &str) -> Result<usize> {
        let mut rng = self.fork_rng();
        let index = self.open::<S>(client).add_participant(name, &mut rng)?;
        debug!(client, kind = %S::KIND, index, "participant added");
        Ok(index)
    }

    pub fn rename_participant<S: GameVariant>(&self, client: &str, index: usize, name: &str) -> Result<()> {
        self.open::<S>(client).rename_participant(index, name)
    }

    /// Remove a participant; returns who was removed.
    pub fn remove_participant<S: GameVariant>(&self, client: &str, index: usize) -> Result<Participant> {
        let mut rng = self.fork_rng();
        let removed = self.open::<S>(client).remove_participant(index, &mut rng)?;
        debug!(client, kind = %S::KIND, index, "participant removed");
        Ok(removed)
    }

    /// Stop any live run and return the match to its pre-start state.
    pub fn reset<S: GameVariant>(&self, client: &str) -> Result<()> {
        let mut rng = self.fork_rng();
        self.open::<S>(client).reset(&mut rng)
    }

    /// Start the client's match with a freshly forked RNG stream.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<S: Simulation>(&self, client: &str) -> Result<JoinHandle<()>> {
        let rng = Box::new(self.fork_rng());
        self.start_with::<S>(client, rng)
    }

    /// Start the client's match drawing from `rng`.
    pub fn start_with<S: Simulation>(&self, client: &str, rng: Box<dyn RandomSource>) -> Result<JoinHandle<()>> {
        let config = S::config(&self.config).clone();
        let handle = self.open::<S>(client).start(config, rng)?;
        info!(client, kind = %S::KIND, "run scheduled");
        Ok(handle)
    }

    /// Current record of the client's match, if one exists.
    #[must_use]
    pub fn snapshot(&self, client: &str, kind: GameKind) -> Option<GameState> {
        self.store
            .get(&SessionKey::new(client, kind))
            .map(|cell| cell.snapshot())
    }

    /// Drop the client's match, stopping its run.
    pub fn discard(&self, client: &str, kind: GameKind) -> bool {
        self.store.remove(&SessionKey::new(client, kind))
    }

    /// Choose the horse race's winning criterion.
    pub fn set_horse_mode(&self, client: &str, mode: RaceMode) -> Result<()> {
        self.open::<HorseState>(client).set_mode(mode)
    }

    /// Lane outcomes the next ladder race will use.
    pub fn ladder_preview(&self, client: &str) -> Result<Vec<LaneResult>> {
        self.open::<LadderState>(client).read(|s| s.preview().to_vec())
    }

    /// Periodically drop idle matches until the arena is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_housekeeping(&self) -> JoinHandle<()> {
        self.store.spawn_housekeeping()
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("config", &self.config)
            .field("matches", &self.store.len())
            .finish()
    }
}
