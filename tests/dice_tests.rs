//! Dice roll-off driven end to end on a paused clock.

use std::time::Duration;

use rust_party::core::{ArenaConfig, DiceConfig, GameError, ScriptedRng};
use rust_party::games::dice::DiceState;
use rust_party::{Arena, GameKind, GameState};
use tokio::time::Instant;

fn arena_with_two(config: ArenaConfig) -> Arena {
    let arena = Arena::new(config.with_seed(5));
    arena.remove_participant::<DiceState>("c", 3).unwrap();
    arena.remove_participant::<DiceState>("c", 2).unwrap();
    arena
}

fn dice(arena: &Arena) -> DiceState {
    match arena.snapshot("c", GameKind::Dice) {
        Some(GameState::Dice(state)) => state,
        other => panic!("expected a dice record, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_lower_total_wins() {
    let arena = arena_with_two(ArenaConfig::default());
    let rng = ScriptedRng::new(0).with_ints([3, 2, 4, 4]);

    let started = Instant::now();
    arena.start_with::<DiceState>("c", Box::new(rng)).unwrap().await.unwrap();

    let state = dice(&arena);
    assert!(state.finished);
    assert!(!state.running);
    assert!(!state.is_tie_breaker);
    assert_eq!(state.winner, Some(0));
    assert_eq!(state.players[0].total, 5);
    assert_eq!(state.players[1].total, 8);
    assert_eq!(state.players[0].participant.name, "Player 1");

    // Two turns of roll delay plus reveal delay
    assert!(started.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_rolling_flag_is_observable() {
    let arena = arena_with_two(ArenaConfig::default());
    let handle = arena.start::<DiceState>("c").unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    let state = dice(&arena);
    assert!(state.running);
    assert!(state.rolling);
    assert_eq!(state.current_player(), Some(0));

    handle.await.unwrap();
    let state = dice(&arena);
    assert!(state.finished && !state.rolling);
}

#[tokio::test(start_paused = true)]
async fn test_tie_break_round() {
    let arena = arena_with_two(ArenaConfig::default());
    // 6 vs 6, then 2 vs 7
    let rng = ScriptedRng::new(0).with_ints([3, 3, 2, 4, 1, 1, 3, 4]);
    arena.start_with::<DiceState>("c", Box::new(rng)).unwrap().await.unwrap();

    let state = dice(&arena);
    assert_eq!(state.winner, Some(0));
    assert!(state.is_tie_breaker);
    assert_eq!(state.tie_breaker_players, vec![0, 1]);
    assert_eq!(state.round_number, 2);
}

#[tokio::test(start_paused = true)]
async fn test_round_cap_draws_among_tied() {
    let config = ArenaConfig::default().with_dice(DiceConfig::default().with_max_rounds(1));
    let arena = arena_with_two(config);
    // 2 vs 2, then the draw picks index 1
    let rng = ScriptedRng::new(0).with_ints([1, 1, 1, 1, 1]);
    arena.start_with::<DiceState>("c", Box::new(rng)).unwrap().await.unwrap();

    let state = dice(&arena);
    assert!(state.finished);
    assert_eq!(state.winner, Some(1));
    assert_eq!(state.round_number, 1);
}

#[tokio::test(start_paused = true)]
async fn test_start_is_validated() {
    let arena = Arena::new(ArenaConfig::default().with_seed(1));
    let handle = arena.start::<DiceState>("c").unwrap();

    assert_eq!(
        arena.start::<DiceState>("c").unwrap_err(),
        GameError::AlreadyRunning { kind: GameKind::Dice }
    );
    assert_eq!(
        arena.add_participant::<DiceState>("c", "Late").unwrap_err(),
        GameError::RosterLocked { kind: GameKind::Dice }
    );

    handle.await.unwrap();
    assert!(dice_finished(&arena));

    // A finished match can be started again
    arena.start::<DiceState>("c").unwrap().await.unwrap();
    assert!(dice_finished(&arena));
}

fn dice_finished(arena: &Arena) -> bool {
    arena
        .snapshot("c", GameKind::Dice)
        .is_some_and(|s| s.is_finished() && s.winner().is_some())
}

#[tokio::test(start_paused = true)]
async fn test_removing_the_winner_clears_the_result() {
    let arena = Arena::new(ArenaConfig::default().with_seed(5));
    // 8, 8, 8, 2
    let rng = ScriptedRng::new(0).with_ints([4, 4, 4, 4, 4, 4, 1, 1]);
    arena.start_with::<DiceState>("c", Box::new(rng)).unwrap().await.unwrap();
    assert_eq!(dice(&arena).winner, Some(3));

    arena.remove_participant::<DiceState>("c", 3).unwrap();
    let snapshot = arena.snapshot("c", GameKind::Dice).unwrap();
    assert_eq!(snapshot.is_finished(), snapshot.winner().is_some());

    let state = dice(&arena);
    assert!(!state.finished && state.winner.is_none());
    assert!(state.players.iter().all(|p| p.total == 0));
    assert_eq!(state.players.len(), 3);
}
