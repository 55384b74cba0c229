//! Board rule engine: placement validation, cascading side effects, scoring
//! and termination.
//!
//! The [`Board`] owns the grid and the score counters. [`Board::submit`] is the
//! only way to change either after construction. Invalid placements are a
//! normal outcome, reported as `false`, never as an error.
//!
//! Side effects of a placement run synchronously inside the submit that caused
//! them:
//! - a Mountain turns orthogonally adjacent human tiles back into Plains
//! - a City absorbs any adjacent Forest that now touches two or more Cities
//! - Mines and Farms raise the humans' per-turn move budget, and losing one
//!   to Plains lowers it again (never below the starting budget)

use std::fmt;

use tracing::{info, trace};

use crate::constants::STARTING_HUMAN_MOVES;
use crate::events::GameEvent;
use crate::geometry::{in_bounds, is_path_clear_at_range2, orthogonal_neighbors, range2_offsets};
use crate::grid::{Cell, ClaimStatus, Coord, Grid, LayoutError, TerrainKind};

/// The single mutable source of truth for one game.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    nature_score: i32,
    human_score: i32,
    human_moves_per_turn: u32,
    /// Cells currently `Unclaimed`, maintained on every claim change.
    unclaimed: usize,
    /// Set once the play area has been filled; the board accepts no more submits.
    filled: bool,
    /// Deepest cascade nesting reached by the last top-level submit.
    cascade_depth: usize,
    events: Vec<GameEvent>,
}

impl Board {
    /// Wrap a grid as the starting position. Pre-placed terrain is taken as
    /// scenery: it does not score and triggers no cascades.
    pub fn new(grid: Grid) -> Self {
        let unclaimed = grid.count_claim(ClaimStatus::Unclaimed);
        Self {
            grid,
            nature_score: 0,
            human_score: 0,
            human_moves_per_turn: STARTING_HUMAN_MOVES,
            unclaimed,
            filled: false,
            cascade_depth: 0,
            events: Vec::new(),
        }
    }

    pub fn from_layout(text: &str) -> Result<Self, LayoutError> {
        Grid::parse(text).map(Board::new)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        self.grid.in_bounds(c)
    }

    pub fn terrain_at(&self, c: Coord) -> Option<TerrainKind> {
        self.grid.terrain(c)
    }

    pub fn claim_at(&self, c: Coord) -> ClaimStatus {
        self.grid.claim(c)
    }

    pub fn nature_score(&self) -> i32 {
        self.nature_score
    }

    pub fn human_score(&self) -> i32 {
        self.human_score
    }

    pub fn human_moves_per_turn(&self) -> u32 {
        self.human_moves_per_turn
    }

    pub fn unclaimed_count(&self) -> usize {
        self.unclaimed
    }

    /// True once the last unclaimed cell has been taken.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn last_cascade_depth(&self) -> usize {
        self.cascade_depth
    }

    /// Every City on the board, row-major.
    pub fn city_coords(&self) -> Vec<Coord> {
        self.grid.coords_of(TerrainKind::City)
    }

    /// Take the events queued since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether `terrain` may be placed at `c`.
    pub fn validate(&self, c: Coord, terrain: TerrainKind) -> bool {
        self.validate_with(c, terrain, false)
    }

    /// Like [`Board::validate`]; with `bypass_occupancy` any tracked cell
    /// counts as free, so cascades can overwrite committed tiles.
    pub fn validate_with(&self, c: Coord, terrain: TerrainKind, bypass_occupancy: bool) -> bool {
        let claim = self.grid.claim(c);
        let unclaimed = claim == ClaimStatus::Unclaimed;
        let bypassed = bypass_occupancy && claim != ClaimStatus::Untracked;
        let free = unclaimed || bypassed;

        match terrain {
            TerrainKind::Forest | TerrainKind::Mountain | TerrainKind::Water => free,
            TerrainKind::City => free && self.touches(c, TerrainKind::is_human),
            TerrainKind::Mine => {
                free && self.touches(c, |t| t == TerrainKind::Mountain) && self.humans_in_range2(c)
            }
            TerrainKind::Farm => {
                free && self.touches(c, |t| t == TerrainKind::Water) && self.humans_in_range2(c)
            }
            TerrainKind::Plains => true,
        }
    }

    /// Any orthogonal neighbor whose terrain satisfies `pred`.
    fn touches(&self, c: Coord, pred: impl Fn(TerrainKind) -> bool) -> bool {
        orthogonal_neighbors(c)
            .into_iter()
            .any(|n| self.grid.terrain(n).is_some_and(&pred))
    }

    /// Any human tile at range 2 with a clear path from `c`.
    fn humans_in_range2(&self, c: Coord) -> bool {
        range2_offsets().into_iter().any(|d| {
            let target = c + d;
            in_bounds(&self.grid, target)
                && self.grid.terrain(target).is_some_and(TerrainKind::is_human)
                && is_path_clear_at_range2(&self.grid, c, d)
        })
    }

    /// Place `terrain` at `c` if valid and resolve its side effects.
    /// Returns whether the board changed.
    pub fn submit(&mut self, c: Coord, terrain: TerrainKind) -> bool {
        self.submit_with(c, terrain, false)
    }

    pub fn submit_with(&mut self, c: Coord, terrain: TerrainKind, bypass_occupancy: bool) -> bool {
        self.cascade_depth = 0;
        let applied = self.place(c, terrain, bypass_occupancy, 0);
        if !applied {
            return false;
        }

        if !self.filled && self.unclaimed == 0 {
            self.filled = true;
            info!(
                nature = self.nature_score,
                humans = self.human_score,
                "play area filled"
            );
            self.events.push(GameEvent::PlayAreaFilled);
        }

        #[cfg(debug_assertions)]
        {
            let violations = crate::invariants::check_invariants(self);
            assert!(
                violations.is_empty(),
                "board invariants broken after submitting {terrain} at {c}: {violations:?}"
            );
        }

        true
    }

    fn place(&mut self, c: Coord, terrain: TerrainKind, bypass: bool, depth: usize) -> bool {
        if self.filled || !self.validate_with(c, terrain, bypass) {
            return false;
        }
        // Plains validates everywhere, but only tracked cells can hold it.
        let previous = match self.grid.get(c) {
            Some(cell) if cell.claim != ClaimStatus::Untracked => cell,
            _ => return false,
        };

        if depth > 0 {
            trace!(%c, %terrain, depth, "cascade");
        }
        self.cascade_depth = self.cascade_depth.max(depth);

        let cell = Cell::with_terrain(terrain);
        self.track_claim(previous.claim, cell.claim);
        self.grid.set(c, cell);

        match terrain {
            TerrainKind::Forest | TerrainKind::Water => self.add_nature(1),
            TerrainKind::Mountain => {
                self.add_nature(1);
                for n in orthogonal_neighbors(c) {
                    if self.grid.terrain(n).is_some_and(TerrainKind::is_human) {
                        self.place(n, TerrainKind::Plains, true, depth + 1);
                    }
                }
            }
            TerrainKind::City => {
                for n in orthogonal_neighbors(c) {
                    if self.grid.terrain(n) != Some(TerrainKind::Forest) {
                        continue;
                    }
                    let cities = orthogonal_neighbors(n)
                        .into_iter()
                        .filter(|&m| self.grid.terrain(m) == Some(TerrainKind::City))
                        .count();
                    if cities >= 2 {
                        self.place(n, TerrainKind::City, true, depth + 1);
                    }
                }
                self.add_human(1);
            }
            TerrainKind::Mine | TerrainKind::Farm => {
                self.human_moves_per_turn += 1;
                self.add_human(1);
            }
            TerrainKind::Plains => {
                if matches!(previous.terrain, Some(TerrainKind::Mine | TerrainKind::Farm)) {
                    self.human_moves_per_turn = self
                        .human_moves_per_turn
                        .saturating_sub(1)
                        .max(STARTING_HUMAN_MOVES);
                }
                if previous.terrain.is_some_and(TerrainKind::is_human) {
                    self.add_human(-1);
                }
            }
        }

        self.events.push(GameEvent::ResourceAdded { coord: c, terrain });
        true
    }

    fn track_claim(&mut self, before: ClaimStatus, after: ClaimStatus) {
        match (before == ClaimStatus::Unclaimed, after == ClaimStatus::Unclaimed) {
            (true, false) => self.unclaimed -= 1,
            (false, true) => self.unclaimed += 1,
            _ => {}
        }
    }

    fn add_nature(&mut self, delta: i32) {
        self.nature_score += delta;
        self.events
            .push(GameEvent::NatureScoreChanged(self.nature_score));
    }

    fn add_human(&mut self, delta: i32) {
        self.human_score += delta;
        self.events.push(GameEvent::HumanScoreChanged(self.human_score));
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grid)?;
        writeln!(
            f,
            "Nature: {}  Humans: {}  Human moves/turn: {}  Unclaimed: {}",
            self.nature_score, self.human_score, self.human_moves_per_turn, self.unclaimed
        )
    }
}
