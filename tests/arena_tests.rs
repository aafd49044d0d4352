//! Store-level behavior seen through the arena: isolation between
//! clients, capacity, expiry and cancellation of orphaned loops.

use std::time::Duration;

use rust_party::core::{ArenaConfig, StoreConfig};
use rust_party::games::dice::DiceState;
use rust_party::games::ladder::LadderState;
use rust_party::games::roulette::RouletteState;
use rust_party::{Arena, GameKind, GameState};

#[tokio::test(start_paused = true)]
async fn test_matches_are_isolated() {
    let arena = Arena::new(ArenaConfig::default().with_seed(41));
    let a = arena.start::<DiceState>("alice").unwrap();
    let b = arena.start::<RouletteState>("alice").unwrap();
    let c = arena.start::<DiceState>("bob").unwrap();

    arena.reset::<DiceState>("bob").unwrap();
    a.await.unwrap();
    b.await.unwrap();
    c.await.unwrap();

    assert!(arena.snapshot("alice", GameKind::Dice).unwrap().is_finished());
    assert!(arena.snapshot("alice", GameKind::Roulette).unwrap().is_finished());
    let bob = arena.snapshot("bob", GameKind::Dice).unwrap();
    assert!(!bob.is_finished() && !bob.is_running());
    assert_eq!(arena.store().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_eviction_stops_loop() {
    let store = StoreConfig::default().with_max_sessions(1);
    let arena = Arena::new(ArenaConfig::default().with_seed(42).with_store(store));

    let first = arena.start::<LadderState>("first").unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Inserting a second client evicts the first and its loop ends
    arena.open::<DiceState>("second");
    first.await.unwrap();
    assert!(arena.snapshot("first", GameKind::Ladder).is_none());
    assert_eq!(arena.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_housekeeping_expires_idle_matches() {
    let store = StoreConfig {
        cleanup_interval: Duration::from_secs(5),
        ..StoreConfig::default().with_session_timeout(Duration::from_secs(10))
    };
    let arena = Arena::new(ArenaConfig::default().with_seed(43).with_store(store));
    let _housekeeping = arena.spawn_housekeeping();

    arena.open::<DiceState>("idle");
    tokio::time::sleep(Duration::from_secs(6)).await;
    arena.open::<DiceState>("busy");
    tokio::time::sleep(Duration::from_secs(10)).await;

    // At the 15s sweep "idle" had been quiet for 15s, "busy" for 9s
    assert!(arena.find::<DiceState>("idle").is_none());
    assert!(arena.find::<DiceState>("busy").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_serializes_tagged() {
    let arena = Arena::new(ArenaConfig::default().with_seed(44));
    arena.start::<DiceState>("c").unwrap().await.unwrap();

    let snapshot = arena.snapshot("c", GameKind::Dice).unwrap();
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["game"], "dice");
    assert_eq!(json["finished"], true);
    assert_eq!(json["players"].as_array().unwrap().len(), 4);
    assert!(json["players"][0]["name"].is_string());

    let back: GameState = serde_json::from_value(json).unwrap();
    assert_eq!(back.winner(), snapshot.winner());
}
