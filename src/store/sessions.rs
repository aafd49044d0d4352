//! Identity -> match store.
//!
//! Keyed by (client identity, game kind). The map's membership is the only
//! contended structure: it sits behind one mutex, while each match's
//! interior has its own lock inside [`MatchCell`].
//!
//! ## Eviction
//!
//! - Records idle longer than `session_timeout` expire.
//! - Inserting a new key at capacity first drops expired records, then the
//!   least-recently-active one.
//! - Every removal cancels the record's driver loop.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::cell::{Match, MatchCell};
use crate::core::config::StoreConfig;
use crate::core::rng::RandomSource;
use crate::core::state::GameState;
use crate::rules::{GameKind, GameVariant};

/// Store key: one record per client per game.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub client: String,
    pub kind: GameKind,
}

impl SessionKey {
    /// Create a key.
    pub fn new(client: impl Into<String>, kind: GameKind) -> Self {
        Self {
            client: client.into(),
            kind,
        }
    }
}

struct StoreEntry {
    cell: Arc<MatchCell>,
    last_activity: Instant,
}

/// Bounded store of live matches.
pub struct GameStore {
    config: StoreConfig,
    entries: Mutex<FxHashMap<SessionKey, StoreEntry>>,
}

impl GameStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Store limits.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Is the store empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Is there a record for this key?
    #[must_use]
    pub fn contains(&self, key: &SessionKey) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Fetch the record for `key`, creating it with `init` if absent.
    ///
    /// Touches the record's last-activity time.
    pub fn open_with(&self, key: SessionKey, init: impl FnOnce() -> GameState) -> Arc<MatchCell> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.get_mut(&key) {
            entry.last_activity = now;
            return Arc::clone(&entry.cell);
        }

        if entries.len() >= self.config.max_sessions {
            Self::evict_expired_locked(&mut entries, now, &self.config);
        }
        if entries.len() >= self.config.max_sessions {
            Self::evict_oldest_locked(&mut entries);
        }

        let cell = Arc::new(MatchCell::new(init()));
        debug!(client = %key.client, kind = %key.kind, "match record created");
        entries.insert(
            key,
            StoreEntry {
                cell: Arc::clone(&cell),
                last_activity: now,
            },
        );
        cell
    }

    /// Typed create-if-absent.
    pub fn open<S: GameVariant>(&self, client: &str, rng: &mut dyn RandomSource) -> Match<S> {
        let key = SessionKey::new(client, S::KIND);
        let cell = self.open_with(key, || S::new_match(rng).into_state());
        Match::from_store(cell)
    }

    /// Typed fetch; touches last-activity.
    pub fn find<S: GameVariant>(&self, client: &str) -> Option<Match<S>> {
        self.get(&SessionKey::new(client, S::KIND)).map(Match::from_store)
    }

    /// Fetch a record by key; touches last-activity.
    pub fn get(&self, key: &SessionKey) -> Option<Arc<MatchCell>> {
        let mut entries = self.entries.lock();
        let entry = entries.get_mut(key)?;
        entry.last_activity = Instant::now();
        Some(Arc::clone(&entry.cell))
    }

    /// Drop a record and cancel its loop. Returns whether it existed.
    pub fn remove(&self, key: &SessionKey) -> bool {
        let removed = self.entries.lock().remove(key);
        match removed {
            Some(entry) => {
                entry.cell.cancel_run();
                true
            }
            None => false,
        }
    }

    /// Drop every record idle past the timeout. Returns how many.
    pub fn evict_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        Self::evict_expired_locked(&mut entries, Instant::now(), &self.config)
    }

    fn evict_expired_locked(
        entries: &mut FxHashMap<SessionKey, StoreEntry>,
        now: Instant,
        config: &StoreConfig,
    ) -> usize {
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = now.duration_since(entry.last_activity) <= config.session_timeout;
            if !keep {
                entry.cell.cancel_run();
                debug!(client = %key.client, kind = %key.kind, "match record expired");
            }
            keep
        });
        before - entries.len()
    }

    fn evict_oldest_locked(entries: &mut FxHashMap<SessionKey, StoreEntry>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_activity)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            if let Some(entry) = entries.remove(&key) {
                entry.cell.cancel_run();
                warn!(client = %key.client, kind = %key.kind, "store at capacity, evicted oldest record");
            }
        }
    }

    /// Run `evict_expired` every `cleanup_interval` until the store is
    /// dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_housekeeping(self: &Arc<Self>) -> JoinHandle<()> {
        let store: Weak<Self> = Arc::downgrade(self);
        let period = self.config.cleanup_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let evicted = store.evict_expired();
                if evicted > 0 {
                    debug!(evicted, "housekeeping evicted expired records");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::rng::GameRng;
    use crate::games::dice::DiceState;
    use crate::games::ladder::LadderState;

    #[test]
    fn test_open_is_create_if_absent() {
        let store = GameStore::new(StoreConfig::default());
        let mut rng = GameRng::new(1);

        let a = store.open::<DiceState>("alice", &mut rng);
        let again = store.open::<DiceState>("alice", &mut rng);
        assert!(Arc::ptr_eq(a.cell(), again.cell()));
        assert_eq!(store.len(), 1);

        // Same client, different game: separate record
        let _ladder = store.open::<LadderState>("alice", &mut rng);
        assert_eq!(store.len(), 2);

        assert!(store.find::<DiceState>("bob").is_none());
        assert!(store.find::<DiceState>("alice").is_some());
    }

    #[test]
    fn test_remove_cancels() {
        let store = GameStore::new(StoreConfig::default());
        let mut rng = GameRng::new(1);
        let _m = store.open::<DiceState>("alice", &mut rng);

        let key = SessionKey::new("alice", GameKind::Dice);
        assert!(store.contains(&key));
        assert!(store.remove(&key));
        assert!(!store.remove(&key));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_evicts_least_recent() {
        let store = GameStore::new(StoreConfig::default().with_max_sessions(2));
        let mut rng = GameRng::new(1);

        store.open::<DiceState>("a", &mut rng);
        tokio::time::advance(Duration::from_secs(1)).await;
        store.open::<DiceState>("b", &mut rng);
        tokio::time::advance(Duration::from_secs(1)).await;

        // Touch "a" so "b" becomes the oldest
        assert!(store.find::<DiceState>("a").is_some());
        tokio::time::advance(Duration::from_secs(1)).await;

        store.open::<DiceState>("c", &mut rng);
        assert_eq!(store.len(), 2);
        assert!(store.find::<DiceState>("a").is_some());
        assert!(store.find::<DiceState>("b").is_none());
        assert!(store.find::<DiceState>("c").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_expired() {
        let config = StoreConfig::default().with_session_timeout(Duration::from_secs(10));
        let store = GameStore::new(config);
        let mut rng = GameRng::new(1);

        store.open::<DiceState>("old", &mut rng);
        tokio::time::advance(Duration::from_secs(8)).await;
        store.open::<DiceState>("new", &mut rng);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(store.evict_expired(), 1);
        assert!(store.find::<DiceState>("old").is_none());
        assert!(store.find::<DiceState>("new").is_some());
    }
}
