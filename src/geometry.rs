//! Adjacency and range-2 geometry shared by the rule engine and the opponent.

use crate::constants::{ORTHOGONAL, RANGE2};
use crate::grid::{Coord, Grid};

/// The 4 orthogonal neighbors of `c` (Up, Right, Down, Left). May be off-board.
#[inline]
pub fn orthogonal_neighbors(c: Coord) -> [Coord; 4] {
    ORTHOGONAL.map(|d| c + d)
}

/// The 8 offsets at Manhattan distance 2.
#[inline]
pub fn range2_offsets() -> [Coord; 8] {
    RANGE2
}

/// The 8 cells at Manhattan distance 2 from `c`. May be off-board.
#[inline]
pub fn range2_cells(c: Coord) -> [Coord; 8] {
    RANGE2.map(|d| c + d)
}

#[inline]
pub fn in_bounds(grid: &Grid, c: Coord) -> bool {
    grid.in_bounds(c)
}

/// Whether a range-2 probe from `origin` along `offset` is unobstructed.
///
/// A straight double step is blocked by an occupied midpoint. A diagonal step
/// is blocked only when both cardinal cells it could pass through are
/// occupied; one free lane is enough. Off-board intermediates never block.
pub fn is_path_clear_at_range2(grid: &Grid, origin: Coord, offset: Coord) -> bool {
    debug_assert_eq!(offset.manhattan(), 2, "not a range-2 offset: {offset}");

    if offset.x == 0 || offset.y == 0 {
        let mid = origin + Coord::new(offset.x / 2, offset.y / 2);
        !grid.is_occupied(mid)
    } else {
        let via_x = origin + Coord::new(offset.x, 0);
        let via_y = origin + Coord::new(0, offset.y);
        !(grid.is_occupied(via_x) && grid.is_occupied(via_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orthogonal_order() {
        let n = orthogonal_neighbors(Coord::new(2, 2));
        assert_eq!(
            n,
            [
                Coord::new(2, 1),
                Coord::new(3, 2),
                Coord::new(2, 3),
                Coord::new(1, 2)
            ]
        );
    }

    #[test]
    fn test_range2_offsets_are_distinct_distance_two() {
        let offsets = range2_offsets();
        for (i, a) in offsets.iter().enumerate() {
            assert_eq!(a.manhattan(), 2);
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_straight_step_blocked_by_midpoint() {
        let grid = Grid::parse("...\n.C.\n...").unwrap();
        let origin = Coord::new(1, 0);
        assert!(!is_path_clear_at_range2(&grid, origin, Coord::new(0, 2)));
        assert!(is_path_clear_at_range2(&grid, Coord::new(0, 0), Coord::new(2, 0)));
    }

    #[test]
    fn test_diagonal_needs_both_lanes_blocked() {
        // From (0,0) to (1,1): lanes are (1,0) and (0,1).
        let one_lane = Grid::parse(".T.\n...\n...").unwrap();
        assert!(is_path_clear_at_range2(&one_lane, Coord::new(0, 0), Coord::new(1, 1)));

        let both_lanes = Grid::parse(".T.\nT..\n...").unwrap();
        assert!(!is_path_clear_at_range2(&both_lanes, Coord::new(0, 0), Coord::new(1, 1)));
    }

    #[test]
    fn test_off_board_intermediate_does_not_block() {
        let grid = Grid::parse("..\n..").unwrap();
        assert!(is_path_clear_at_range2(&grid, Coord::new(0, 0), Coord::new(-1, 1)));
        assert!(in_bounds(&grid, Coord::new(1, 1)));
        assert!(!in_bounds(&grid, Coord::new(2, 1)));
    }
}
