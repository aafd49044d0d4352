//! Ladder race driven end to end on a paused clock.

use std::time::Duration;

use rust_party::core::{ArenaConfig, GameError};
use rust_party::games::ladder::{LadderState, LaneResult};
use rust_party::{Arena, GameKind, GameState};

fn ladder(arena: &Arena, client: &str) -> LadderState {
    match arena.snapshot(client, GameKind::Ladder) {
        Some(GameState::Ladder(state)) => state,
        other => panic!("expected a ladder record, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_winner_holds_the_win_lane() {
    let arena = Arena::new(ArenaConfig::default().with_seed(31));
    for (i, client) in ["a", "b", "c", "d"].into_iter().enumerate() {
        for extra in 0..i {
            arena.add_participant::<LadderState>(client, &format!("Extra {}", extra)).unwrap();
        }
        let preview = arena.ladder_preview(client).unwrap();
        arena.start::<LadderState>(client).unwrap().await.unwrap();

        let state = ladder(&arena, client);
        assert_eq!(state.results, preview);
        assert_eq!(state.map.len(), 90);
        assert!(state.map.iter().all(|(_, o)| o.lane < state.players.len()));

        assert!(state.finished && !state.running);
        let winner = state.winner.expect("a finished race has a winner");
        assert_eq!(state.results[state.players[winner].lane], LaneResult::Win);
        assert!(state.players[winner].position >= 102.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_runners_climb_each_tick() {
    let arena = Arena::new(ArenaConfig::default().with_seed(32));
    let handle = arena.start::<LadderState>("c").unwrap();

    // First tick runs immediately, then one every 150ms
    tokio::time::sleep(Duration::from_millis(1000)).await;
    let state = ladder(&arena, "c");
    assert!(state.running);
    for runner in &state.players {
        assert!((runner.position - 7.0 * 1.1).abs() < 1e-9);
    }

    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_race() {
    let arena = Arena::new(ArenaConfig::default().with_seed(33));
    let handle = arena.start::<LadderState>("c").unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    arena.reset::<LadderState>("c").unwrap();
    handle.await.unwrap();

    let state = ladder(&arena, "c");
    assert!(!state.running && !state.finished);
    assert!(state.winner.is_none());
    for (lane, runner) in state.players.iter().enumerate() {
        assert_eq!(runner.lane, lane);
        assert_eq!(runner.position, 0.0);
        assert!(runner.effects.active().is_empty());
    }
    assert_eq!(state.results.iter().filter(|r| **r == LaneResult::Win).count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_roster_rules() {
    let arena = Arena::new(ArenaConfig::default().with_seed(34));

    for i in 0..5 {
        arena.add_participant::<LadderState>("c", &format!("Extra {}", i)).unwrap();
    }
    assert_eq!(
        arena.add_participant::<LadderState>("c", "Eleven").unwrap_err(),
        GameError::TooManyParticipants { max: 10 }
    );
    assert_eq!(
        arena.add_participant::<LadderState>("c", "   ").unwrap_err(),
        GameError::EmptyName
    );

    let removed = arena.remove_participant::<LadderState>("c", 0).unwrap();
    assert_eq!(removed.name, "Player 1");
    let state = ladder(&arena, "c");
    assert_eq!(state.players.len(), 9);
    assert_eq!(state.players[0].participant.name, "Player 2");
    assert!(state.players.iter().enumerate().all(|(i, r)| r.lane == i));
    assert_eq!(arena.ladder_preview("c").unwrap().len(), 9);

    assert_eq!(
        arena.remove_participant::<LadderState>("c", 20).unwrap_err(),
        GameError::IndexOutOfRange { index: 20, len: 9 }
    );
}
