//! Integration tests driving whole matches through the public engine API.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::io::Write;

use prismfall::game::{BoardService, Coord, MatchEvent, Phase, Placement, Side};
use prismfall::{Engine, EngineError, MatchConfig};

fn quiet(seed: u64) -> MatchConfig {
    MatchConfig {
        seed,
        tutorial_enabled: false,
        ..MatchConfig::default()
    }
}

fn run_autopilot(config: MatchConfig, ticks: u32) -> Engine {
    let mut engine = Engine::init(config).unwrap().with_autopilot();
    for _ in 0..ticks {
        engine.tick(0.5);
        if engine.is_finished() {
            break;
        }
    }
    engine
}

#[test]
fn test_autopilot_is_deterministic() {
    let a = run_autopilot(quiet(7), 1500).teardown();
    let b = run_autopilot(quiet(7), 1500).teardown();
    assert_eq!(a, b);
}

#[test]
fn test_autopilot_matches_across_seeds() {
    for seed in [1, 2, 3, 42, 1337] {
        let config = MatchConfig {
            required_volume_to_win: 200.0,
            ..quiet(seed)
        };
        let mut engine = run_autopilot(config, 4000);
        assert!(engine.check_invariants().is_empty(), "seed {seed}");

        let events = engine.drain_events();
        let summary = engine.teardown();
        assert!(summary.turns_played > 0, "seed {seed}: no turn was played");

        if engine.is_finished() {
            let outcome = summary.outcome.unwrap();
            let winner = match outcome {
                prismfall::Outcome::PlayerWin => summary.player_volume,
                prismfall::Outcome::OpponentWin => summary.opponent_volume,
            };
            assert!(winner >= 200.0, "seed {seed}");
            assert!(events.contains(&MatchEvent::MatchEnded { outcome }));
            assert_eq!(
                events.iter().filter(|e| **e == MatchEvent::FadeIn).count(),
                1,
                "seed {seed}"
            );
        }
    }
}

#[test]
fn test_player_turn_flow() {
    let mut engine = Engine::init(quiet(3)).unwrap();
    engine.drain_events();
    assert_eq!(engine.state().phase(), Phase::PlayerTurn);
    assert_eq!(engine.player_hand().len(), 4);

    let placement = engine.place_unit(0, Coord::new(3, 0)).unwrap();
    assert_eq!(placement, Placement::Placed);
    assert!(engine.board().is_occupied(Coord::new(3, 0)));
    assert_eq!(engine.player_hand().len(), 3);
    assert_eq!(engine.state().remaining_moves(Side::Player), 1);
    assert!(engine.drain_events().contains(&MatchEvent::UnitPlaced {
        side: Side::Player,
        coord: Coord::new(3, 0),
    }));

    engine.place_unit(0, Coord::new(3, 1)).unwrap();
    assert_eq!(engine.state().phase(), Phase::OpponentTurn);
    assert!(engine.drain_events().contains(&MatchEvent::PointerCapture { locked: true }));

    let err = engine.place_unit(0, Coord::new(3, 2)).unwrap_err();
    assert!(matches!(err, EngineError::OutOfTurn { side: Side::Player }));
}

#[test]
fn test_illegal_placement_changes_nothing() {
    let mut engine = Engine::init(quiet(5)).unwrap();
    let hand = engine.player_hand().len();

    let err = engine.place_unit(0, Coord::new(0, 0)).unwrap_err();
    assert!(matches!(err, EngineError::IllegalPlacement(_)));
    let err = engine.place_unit(0, Coord::new(40, 0)).unwrap_err();
    assert!(matches!(err, EngineError::NoSuchTile(_)));
    let err = engine.place_unit(9, Coord::new(3, 0)).unwrap_err();
    assert!(matches!(err, EngineError::NoSuchHandSlot(9)));

    assert_eq!(engine.player_hand().len(), hand);
    assert_eq!(engine.state().remaining_moves(Side::Player), 2);
    assert!(engine.board().list_occupied_tiles(Side::Player).is_empty());
}

#[test]
fn test_opponent_turn_hands_back() {
    let mut engine = Engine::init(quiet(9)).unwrap();
    engine.place_unit(0, Coord::new(4, 0)).unwrap();
    engine.place_unit(0, Coord::new(4, 5)).unwrap();
    assert_eq!(engine.state().phase(), Phase::OpponentTurn);

    for _ in 0..200 {
        engine.tick(0.5);
        if engine.state().phase() == Phase::PlayerTurn {
            break;
        }
    }

    assert_eq!(engine.state().phase(), Phase::PlayerTurn);
    assert_eq!(engine.state().turns_played(), 2);
    assert!(!engine.board().list_occupied_tiles(Side::Opponent).is_empty());
    assert!(engine.check_invariants().is_empty());
}

#[test]
fn test_card_draw_spends_a_move() {
    let mut engine = Engine::init(quiet(11)).unwrap();
    let drawn = engine.draw_card().unwrap();
    assert!(drawn.is_some());
    assert_eq!(engine.state().cards_in_hand(), 1);
    assert_eq!(engine.state().remaining_moves(Side::Player), 1);
}

#[test]
fn test_actions_after_teardown_fail() {
    let mut engine = Engine::init(quiet(13)).unwrap();
    engine.teardown();
    assert!(matches!(engine.draw_card(), Err(EngineError::MatchOver)));

    let elapsed = engine.scheduler().now();
    engine.tick(1.0);
    assert!((engine.scheduler().now() - elapsed).abs() < f64::EPSILON);
}

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"seed": 99, "max_player_moves": 3, "board": {{"rows": 8}}}}"#).unwrap();

    let config = MatchConfig::load(file.path()).unwrap();
    assert_eq!(config.seed, 99);
    assert_eq!(config.max_player_moves, 3);
    assert_eq!(config.board.rows, 8);
    assert_eq!(config.board.cols, 6);
    assert_eq!(config.max_opponent_moves, 2);

    let engine = Engine::init(config).unwrap();
    assert_eq!(engine.state().remaining_moves(Side::Player), 3);
    assert_eq!(engine.board().list_unoccupied_tiles(Side::Player).len(), 24);
}

#[test]
fn test_invalid_config_file_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"max_player_moves": 0}}"#).unwrap();
    assert!(matches!(MatchConfig::load(file.path()), Err(EngineError::Config(_))));

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    write!(garbage, "not json").unwrap();
    assert!(matches!(MatchConfig::load(garbage.path()), Err(EngineError::Config(_))));
}

#[test]
fn test_events_serialize() {
    let mut engine = Engine::init(quiet(17)).unwrap();
    engine.place_unit(0, Coord::new(3, 3)).unwrap();

    let events = engine.drain_events();
    assert!(!events.is_empty());
    for event in &events {
        let json = serde_json::to_string(event).unwrap();
        assert!(json.contains(r#""event":"#));
    }
}
