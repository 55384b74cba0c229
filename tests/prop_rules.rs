//! Property-based tests for the rule engine and the opponent's caches.
//!
//! Run with: cargo test --release prop_

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use terraclaim::board::Board;
use terraclaim::events::GameEvent;
use terraclaim::geometry::{orthogonal_neighbors, range2_cells};
use terraclaim::grid::{Coord, TerrainKind};
use terraclaim::invariants::check_invariants;
use terraclaim::opponent::TaskStatus;
use terraclaim::session::Session;
use terraclaim::turn::TurnState;

const LAYOUT: &str = "..^...
                      .#....
                      ..C..~
                      ......
                      ~...#.
                      ...T..";

const NATURE: [TerrainKind; 4] = [
    TerrainKind::Plains,
    TerrainKind::Forest,
    TerrainKind::Mountain,
    TerrainKind::Water,
];

/// Coordinates reaching one cell past each edge.
fn any_move() -> impl Strategy<Value = (i32, i32, usize, bool)> {
    (-1i32..7, -1i32..7, 0usize..TerrainKind::ALL.len(), any::<bool>())
}

fn check_caches(s: &Session) -> Result<(), TestCaseError> {
    let board = s.board();
    let opp = s.opponent();
    for kind in TerrainKind::HUMAN_PRIORITY {
        let set = opp.reachable(kind).unwrap();
        for cand in set.iter() {
            prop_assert!(board.validate(cand, kind), "stale {} at {}", kind, cand);
        }
        for &tile in opp.frontier() {
            for n in orthogonal_neighbors(tile) {
                prop_assert!(!board.validate(n, kind) || set.contains(n));
            }
            if kind != TerrainKind::City {
                for n in range2_cells(tile) {
                    prop_assert!(!board.validate(n, kind) || set.contains(n));
                }
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Arbitrary submit sequences keep the grid, claims and counters in step.
    #[test]
    fn prop_submits_preserve_invariants(moves in prop::collection::vec(any_move(), 1..60)) {
        let mut board = Board::from_layout(LAYOUT).unwrap();
        for (x, y, t, bypass) in moves {
            let c = Coord::new(x, y);
            let terrain = TerrainKind::ALL[t];
            board.submit_with(c, terrain, bypass);
            prop_assert!(check_invariants(&board).is_empty());
            prop_assert_eq!(board.is_filled(), board.unclaimed_count() == 0);
        }
    }

    /// A placement that does not validate leaves the board untouched.
    #[test]
    fn prop_rejected_submit_is_noop(
        setup in prop::collection::vec(any_move(), 0..30),
        probe in any_move()
    ) {
        let mut board = Board::from_layout(LAYOUT).unwrap();
        for (x, y, t, _) in setup {
            board.submit(Coord::new(x, y), TerrainKind::ALL[t]);
        }
        board.drain_events();

        let (x, y, t, bypass) = probe;
        let c = Coord::new(x, y);
        let terrain = TerrainKind::ALL[t];
        let before = board.clone();
        if !board.validate_with(c, terrain, bypass) {
            prop_assert!(!board.submit_with(c, terrain, bypass));
            prop_assert_eq!(board.grid(), before.grid());
            prop_assert_eq!(board.nature_score(), before.nature_score());
            prop_assert_eq!(board.human_score(), before.human_score());
            prop_assert_eq!(board.human_moves_per_turn(), before.human_moves_per_turn());
            prop_assert!(board.drain_events().is_empty());
        }
    }

    /// Mountain cascades never nest: a razed tile becomes Plains, which
    /// triggers nothing further.
    #[test]
    fn prop_mountain_cascade_is_shallow(
        setup in prop::collection::vec(any_move(), 0..30),
        x in 0i32..6,
        y in 0i32..6
    ) {
        let mut board = Board::from_layout(LAYOUT).unwrap();
        for (sx, sy, t, _) in setup {
            board.submit(Coord::new(sx, sy), TerrainKind::ALL[t]);
        }
        if board.submit(Coord::new(x, y), TerrainKind::Mountain) {
            prop_assert!(board.last_cascade_depth() <= 1);
            for n in orthogonal_neighbors(Coord::new(x, y)) {
                prop_assert!(!board.terrain_at(n).is_some_and(TerrainKind::is_human));
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever nature plays, the opponent's caches never offer an illegal
    /// move and never miss a legal one around the frontier; the game ends
    /// at most once.
    #[test]
    fn prop_opponent_caches_stay_consistent(
        seed in any::<u64>(),
        plays in prop::collection::vec((0i32..6, 0i32..6, 0usize..NATURE.len()), 1..25)
    ) {
        let board = Board::from_layout(LAYOUT).unwrap();
        let mut session = Session::with_board(board, Some(seed));
        let ends = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = std::rc::Rc::clone(&ends);
        session.subscribe(move |e: &GameEvent| {
            if matches!(e, GameEvent::GameEnded(_)) {
                counter.set(counter.get() + 1);
            }
        });
        session.start_game();
        check_caches(&session)?;

        for (x, y, t) in plays {
            if session.state() == TurnState::Ended {
                break;
            }
            session.place(Coord::new(x, y), NATURE[t]);
            check_caches(&session)?;

            session.end_player_turn();
            while session.step_opponent() == TaskStatus::Runnable {
                check_caches(&session)?;
            }
        }

        let ended = session.state() == TurnState::Ended;
        prop_assert_eq!(ends.get(), usize::from(ended));
        prop_assert_eq!(session.outcome().is_some(), ended);
    }
}
