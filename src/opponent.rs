//! Opponent decision engine (the Humans).
//!
//! The opponent keeps a *frontier* of human tiles that may still grow, and one
//! candidate set per human terrain kind holding cells that are legal next
//! placements. Both are caches over the [`Board`]: they are rebuilt from scratch
//! only in [`Opponent::initialise`], and afterwards patched from the
//! resource-added events each submit produces, touching only the frontier
//! neighborhood instead of rescanning the board.
//!
//! Placement is uniform random over a candidate set. The turn loop tries Farm,
//! then Mine, then City, and is written as an explicit step-driven task
//! ([`OpponentTurnTask`]) so a host can observe the board between moves.

use std::collections::HashMap;

use fastrand::Rng;
use tracing::debug;

use crate::board::Board;
use crate::events::GameEvent;
use crate::geometry::{orthogonal_neighbors, range2_cells};
use crate::grid::{ClaimStatus, Coord, TerrainKind};
use crate::turn::TurnState;

/// A set of coordinates with O(1) insert/remove and uniform random pick.
/// Iteration order is insertion order, perturbed only by removals.
#[derive(Clone, Debug, Default)]
pub struct CandidateSet {
    items: Vec<Coord>,
    index: HashMap<Coord, usize>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, c: Coord) -> bool {
        self.index.contains_key(&c)
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.items.iter().copied()
    }

    /// Returns false if `c` was already present.
    pub fn insert(&mut self, c: Coord) -> bool {
        if self.contains(c) {
            return false;
        }
        self.index.insert(c, self.items.len());
        self.items.push(c);
        true
    }

    pub fn remove(&mut self, c: Coord) -> bool {
        let Some(i) = self.index.remove(&c) else {
            return false;
        };
        self.items.swap_remove(i);
        if let Some(&moved) = self.items.get(i) {
            self.index.insert(moved, i);
        }
        true
    }

    pub fn retain(&mut self, mut keep: impl FnMut(Coord) -> bool) {
        self.items.retain(|&c| keep(c));
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i))
            .collect();
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Uniformly random member.
    pub fn pick(&self, rng: &mut Rng) -> Option<Coord> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items[rng.usize(..self.items.len())])
    }
}

/// Frontier and per-kind candidate sets.
#[derive(Clone, Debug, Default)]
pub struct Opponent {
    frontier: Vec<Coord>,
    city: CandidateSet,
    mine: CandidateSet,
    farm: CandidateSet,
}

impl Opponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the frontier with every City on the board and run the one full
    /// exploration.
    pub fn initialise(&mut self, board: &Board) {
        self.city.clear();
        self.mine.clear();
        self.farm.clear();
        self.frontier = board.city_coords();
        self.explore_and_cull_frontier(board);
        debug!(possible = self.possible_moves(), "opponent initialised");
    }

    pub fn frontier(&self) -> &[Coord] {
        &self.frontier
    }

    /// The candidate set for a human terrain kind.
    pub fn reachable(&self, kind: TerrainKind) -> Option<&CandidateSet> {
        match kind {
            TerrainKind::City => Some(&self.city),
            TerrainKind::Mine => Some(&self.mine),
            TerrainKind::Farm => Some(&self.farm),
            _ => None,
        }
    }

    fn reachable_mut(&mut self, kind: TerrainKind) -> Option<&mut CandidateSet> {
        match kind {
            TerrainKind::City => Some(&mut self.city),
            TerrainKind::Mine => Some(&mut self.mine),
            TerrainKind::Farm => Some(&mut self.farm),
            _ => None,
        }
    }

    pub fn possible_moves(&self) -> usize {
        self.city.len() + self.mine.len() + self.farm.len()
    }

    /// Add `c` to the `kind` set if the board accepts it there.
    fn offer(&mut self, board: &Board, c: Coord, kind: TerrainKind) {
        if board.validate(c, kind) {
            if let Some(set) = self.reachable_mut(kind) {
                set.insert(c);
            }
        }
    }

    /// Drop frontier tiles that can no longer grow and collect every legal
    /// placement around the rest.
    ///
    /// Candidates invalidated by earlier placements elsewhere (a Mountain
    /// razing the City they leaned on, a newly blocked range-2 path) are
    /// re-checked first, so the sets never offer an illegal move.
    pub fn explore_and_cull_frontier(&mut self, board: &Board) {
        for kind in TerrainKind::HUMAN_PRIORITY {
            if let Some(set) = self.reachable_mut(kind) {
                set.retain(|c| board.validate(c, kind));
            }
        }

        let mut i = 0;
        while i < self.frontier.len() {
            let tile = self.frontier[i];
            let still_human = board.terrain_at(tile).is_some_and(TerrainKind::is_human);
            if !still_human || is_surrounded(board, tile) {
                debug!(%tile, still_human, "frontier tile culled");
                self.frontier.remove(i);
                continue;
            }

            for n in orthogonal_neighbors(tile) {
                self.offer(board, n, TerrainKind::City);
                self.offer(board, n, TerrainKind::Mine);
                self.offer(board, n, TerrainKind::Farm);
            }
            // City only needs orthogonal contact, so range 2 is Mine/Farm only.
            for n in range2_cells(tile) {
                self.offer(board, n, TerrainKind::Mine);
                self.offer(board, n, TerrainKind::Farm);
            }
            i += 1;
        }
    }

    /// Patch the caches after `terrain` was committed at `coord`.
    pub fn on_resource_added(&mut self, board: &Board, coord: Coord, terrain: TerrainKind) {
        self.city.remove(coord);
        self.mine.remove(coord);
        self.farm.remove(coord);

        match terrain {
            TerrainKind::Mountain => {
                for n in orthogonal_neighbors(coord) {
                    self.offer(board, n, TerrainKind::Mine);
                }
            }
            TerrainKind::Water => {
                for n in orthogonal_neighbors(coord) {
                    self.offer(board, n, TerrainKind::Farm);
                }
            }
            TerrainKind::City | TerrainKind::Mine | TerrainKind::Farm => {
                if !self.frontier.contains(&coord) {
                    self.frontier.push(coord);
                }
                for n in orthogonal_neighbors(coord) {
                    self.offer(board, n, TerrainKind::City);
                }
            }
            other => {
                for kind in TerrainKind::HUMAN_PRIORITY {
                    self.offer(board, coord, kind);
                }
                // A cell reopened next to a culled human tile lets it grow again.
                if other == TerrainKind::Plains {
                    for n in orthogonal_neighbors(coord) {
                        let human = board.terrain_at(n).is_some_and(TerrainKind::is_human);
                        if human && !self.frontier.contains(&n) {
                            self.frontier.push(n);
                        }
                    }
                }
            }
        }

        self.explore_and_cull_frontier(board);
        debug!(possible = self.possible_moves(), "possible moves");
    }

    /// Feed a batch of board events through [`Opponent::on_resource_added`].
    pub fn observe(&mut self, board: &Board, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::ResourceAdded { coord, terrain } = *event {
                self.on_resource_added(board, coord, terrain);
            }
        }
    }

    /// Pick a random candidate for `kind`.
    pub fn choose(&self, kind: TerrainKind, rng: &mut Rng) -> Option<Coord> {
        self.reachable(kind)?.pick(rng)
    }

    /// Submit a random `kind` candidate. Returns whether a tile was placed.
    ///
    /// The caches are not patched here; feed the board's events back through
    /// [`Opponent::observe`] (the session does this after every submit).
    pub fn try_place_tile(&self, board: &mut Board, kind: TerrainKind, rng: &mut Rng) -> bool {
        match self.choose(kind, rng) {
            Some(c) => board.submit(c, kind),
            None => false,
        }
    }
}

/// All four orthogonal neighbors are occupied. Off-board neighbors are not.
fn is_surrounded(board: &Board, c: Coord) -> bool {
    orthogonal_neighbors(c)
        .into_iter()
        .all(|n| board.claim_at(n) == ClaimStatus::Occupied)
}

/// What the opponent's turn task needs from whoever owns the game.
pub trait TurnHost {
    fn turn_state(&self) -> TurnState;
    fn human_moves_per_turn(&self) -> u32;
    /// Run [`Opponent::explore_and_cull_frontier`] against the live board.
    fn explore(&mut self);
    /// Place one `kind` tile if any candidate exists.
    fn try_place(&mut self, kind: TerrainKind) -> bool;
    fn advance_turn(&mut self);
}

/// Where the task will resume on its next step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    /// Waiting for the opponent's turn.
    Waiting,
    /// Mid-turn with this many placements left.
    Placing { moves_left: u32 },
    Done,
}

/// Result of one [`OpponentTurnTask::step`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Not the opponent's turn; nothing happened.
    Suspended,
    /// Stopped at a yield point (after a placement or after ending its turn).
    Runnable,
    /// The game is over or the task was cancelled.
    Done,
}

/// The opponent's turn loop as a resumable state machine.
///
/// Each [`step`](OpponentTurnTask::step) runs to the next suspension point:
/// one placement, the end of a turn, or the check that it is not our turn.
#[derive(Debug)]
pub struct OpponentTurnTask {
    phase: TaskPhase,
    cancelled: bool,
}

impl Default for OpponentTurnTask {
    fn default() -> Self {
        Self::new()
    }
}

impl OpponentTurnTask {
    pub fn new() -> Self {
        Self {
            phase: TaskPhase::Waiting,
            cancelled: false,
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == TaskPhase::Done
    }

    /// Stop at the next step boundary without finishing the current turn.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn step<H: TurnHost>(&mut self, host: &mut H) -> TaskStatus {
        loop {
            if self.cancelled || host.turn_state() == TurnState::Ended {
                self.phase = TaskPhase::Done;
            }

            match self.phase {
                TaskPhase::Done => return TaskStatus::Done,
                TaskPhase::Waiting => {
                    if host.turn_state() != TurnState::OpponentTurn {
                        return TaskStatus::Suspended;
                    }
                    let moves_left = host.human_moves_per_turn();
                    host.explore();
                    self.phase = TaskPhase::Placing { moves_left };
                }
                TaskPhase::Placing { moves_left } => {
                    if moves_left > 0 {
                        let placed = TerrainKind::HUMAN_PRIORITY
                            .into_iter()
                            .any(|kind| host.try_place(kind));
                        if placed {
                            self.phase = TaskPhase::Placing {
                                moves_left: moves_left - 1,
                            };
                            return TaskStatus::Runnable;
                        }
                    }
                    if host.turn_state() != TurnState::Ended {
                        host.advance_turn();
                    }
                    self.phase = TaskPhase::Waiting;
                    return TaskStatus::Runnable;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_set_remove_keeps_index() {
        let mut set = CandidateSet::new();
        let a = Coord::new(0, 0);
        let b = Coord::new(1, 0);
        let c = Coord::new(2, 0);
        assert!(set.insert(a));
        assert!(set.insert(b));
        assert!(set.insert(c));
        assert!(!set.insert(b));

        assert!(set.remove(a));
        assert!(!set.contains(a));
        assert!(set.contains(c));
        assert!(set.remove(c));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![b]);
        assert!(!set.remove(c));
    }

    #[test]
    fn test_candidate_set_pick() {
        let mut rng = Rng::with_seed(7);
        let mut set = CandidateSet::new();
        assert_eq!(set.pick(&mut rng), None);
        set.insert(Coord::new(3, 3));
        assert_eq!(set.pick(&mut rng), Some(Coord::new(3, 3)));
    }

    #[test]
    fn test_candidate_set_pick_reaches_every_member() {
        let mut rng = Rng::with_seed(11);
        let mut set = CandidateSet::new();
        for x in 0..5 {
            set.insert(Coord::new(x, 0));
        }
        // Removing from the front moves the last element into slot 0.
        assert!(set.remove(Coord::new(0, 0)));
        assert!(set.remove(Coord::new(2, 0)));

        let mut seen = HashMap::new();
        for _ in 0..300 {
            let c = set.pick(&mut rng).unwrap();
            assert!(set.contains(c), "picked removed {c}");
            *seen.entry(c).or_insert(0) += 1;
        }
        assert_eq!(seen.len(), 3);
        for (c, hits) in seen {
            assert!(hits > 50, "{c} picked only {hits} times");
        }
    }

    #[test]
    fn test_initialise_finds_city_candidates() {
        let board = Board::from_layout(".....\n.....\n..C..\n.....\n.....").unwrap();
        let mut opp = Opponent::new();
        opp.initialise(&board);

        assert_eq!(opp.frontier(), &[Coord::new(2, 2)]);
        let city = opp.reachable(TerrainKind::City).unwrap();
        assert_eq!(city.len(), 4);
        for n in orthogonal_neighbors(Coord::new(2, 2)) {
            assert!(city.contains(n));
        }
        assert!(opp.reachable(TerrainKind::Mine).unwrap().is_empty());
        assert!(opp.reachable(TerrainKind::Forest).is_none());
    }

    #[test]
    fn test_surrounded_city_leaves_frontier() {
        let board = Board::from_layout(".T.\nTCT\n.T.").unwrap();
        let mut opp = Opponent::new();
        opp.initialise(&board);
        assert!(opp.frontier().is_empty());
        assert_eq!(opp.possible_moves(), 0);
    }

    #[test]
    fn test_observe_tracks_new_city() {
        let mut board = Board::from_layout(".....\n.....\n..C..\n.....\n.....").unwrap();
        let mut opp = Opponent::new();
        opp.initialise(&board);
        let mut rng = Rng::with_seed(3);

        assert!(opp.try_place_tile(&mut board, TerrainKind::City, &mut rng));
        let events = board.drain_events();
        opp.observe(&board, &events);

        assert_eq!(opp.frontier().len(), 2);
        let city = opp.reachable(TerrainKind::City).unwrap();
        assert_eq!(city.len(), 6);
        for c in city.iter() {
            assert!(board.validate(c, TerrainKind::City));
        }
    }

    /// Scripted host: every try for a kind in `placeable` succeeds until the
    /// budget of successes runs out.
    struct ScriptedHost {
        state: TurnState,
        moves: u32,
        placeable: Vec<TerrainKind>,
        successes: usize,
        log: Vec<String>,
    }

    impl TurnHost for ScriptedHost {
        fn turn_state(&self) -> TurnState {
            self.state
        }

        fn human_moves_per_turn(&self) -> u32 {
            self.moves
        }

        fn explore(&mut self) {
            self.log.push("explore".into());
        }

        fn try_place(&mut self, kind: TerrainKind) -> bool {
            let ok = self.successes > 0 && self.placeable.contains(&kind);
            if ok {
                self.successes -= 1;
                self.log.push(format!("place {kind}"));
            }
            ok
        }

        fn advance_turn(&mut self) {
            self.state = TurnState::PlayerTurn;
            self.log.push("advance".into());
        }
    }

    fn host(state: TurnState, moves: u32, placeable: &[TerrainKind], successes: usize) -> ScriptedHost {
        ScriptedHost {
            state,
            moves,
            placeable: placeable.to_vec(),
            successes,
            log: Vec::new(),
        }
    }

    #[test]
    fn test_task_waits_for_its_turn() {
        let mut h = host(TurnState::PlayerTurn, 2, &[TerrainKind::City], 5);
        let mut task = OpponentTurnTask::new();
        assert_eq!(task.step(&mut h), TaskStatus::Suspended);
        assert!(h.log.is_empty());
    }

    #[test]
    fn test_task_yields_once_per_move_then_ends_turn() {
        let mut h = host(TurnState::OpponentTurn, 2, &[TerrainKind::Mine, TerrainKind::City], 5);
        let mut task = OpponentTurnTask::new();

        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        assert_eq!(task.phase(), TaskPhase::Placing { moves_left: 1 });
        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        assert_eq!(task.phase(), TaskPhase::Placing { moves_left: 0 });
        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        assert_eq!(task.phase(), TaskPhase::Waiting);
        assert_eq!(task.step(&mut h), TaskStatus::Suspended);

        // Farm is tried first but unavailable, so Mine wins both times.
        assert_eq!(h.log, vec!["explore", "place mine", "place mine", "advance"]);
    }

    #[test]
    fn test_task_stops_early_when_nothing_fits() {
        let mut h = host(TurnState::OpponentTurn, 3, &[TerrainKind::Farm], 1);
        let mut task = OpponentTurnTask::new();
        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        assert_eq!(h.log, vec!["explore", "place farm", "advance"]);
        assert_eq!(h.state, TurnState::PlayerTurn);
    }

    #[test]
    fn test_task_observes_game_end_mid_turn() {
        let mut h = host(TurnState::OpponentTurn, 3, &[TerrainKind::City], 5);
        let mut task = OpponentTurnTask::new();
        assert_eq!(task.step(&mut h), TaskStatus::Runnable);
        h.state = TurnState::Ended;
        assert_eq!(task.step(&mut h), TaskStatus::Done);
        assert!(task.is_done());
        assert_eq!(h.log, vec!["explore", "place city"]);
    }

    #[test]
    fn test_cancelled_task_is_done() {
        let mut h = host(TurnState::OpponentTurn, 2, &[TerrainKind::City], 5);
        let mut task = OpponentTurnTask::new();
        task.cancel();
        assert_eq!(task.step(&mut h), TaskStatus::Done);
        assert!(h.log.is_empty());
    }
}
