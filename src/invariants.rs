//! Board invariants - sanity checks that detect bugs.
//!
//! None of these can be triggered by a caller through the public API. If one
//! fires, the rule engine itself is wrong. The board runs the check after
//! every submit in debug builds; tests call it directly.

use std::fmt;

use crate::board::Board;
use crate::constants::STARTING_HUMAN_MOVES;
use crate::grid::{ClaimStatus, TerrainKind};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all board invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(board: &Board) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut unclaimed = 0usize;

    for (coord, cell) in board.grid().iter() {
        let committed = matches!(cell.terrain, Some(t) if t != TerrainKind::Plains);
        match cell.claim {
            ClaimStatus::Occupied if !committed => violations.push(InvariantViolation {
                message: format!("{coord} is occupied but holds {:?}", cell.terrain),
            }),
            ClaimStatus::Unclaimed if committed => violations.push(InvariantViolation {
                message: format!("{coord} is unclaimed but holds {:?}", cell.terrain),
            }),
            ClaimStatus::Untracked if cell.terrain.is_some() => {
                violations.push(InvariantViolation {
                    message: format!("{coord} is untracked but holds {:?}", cell.terrain),
                })
            }
            ClaimStatus::Unclaimed => unclaimed += 1,
            _ => {}
        }
    }

    if unclaimed != board.unclaimed_count() {
        violations.push(InvariantViolation {
            message: format!(
                "unclaimed counter is {} but the grid has {unclaimed} unclaimed cells",
                board.unclaimed_count()
            ),
        });
    }

    if board.human_moves_per_turn() < STARTING_HUMAN_MOVES {
        violations.push(InvariantViolation {
            message: format!(
                "human move budget {} is below the floor of {STARTING_HUMAN_MOVES}",
                board.human_moves_per_turn()
            ),
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;

    #[test]
    fn test_fresh_board_holds() {
        let board = Board::from_layout("#.C\n~^,\n...").unwrap();
        assert!(check_invariants(&board).is_empty());
    }

    #[test]
    fn test_holds_after_cascade() {
        let mut board = Board::from_layout("...\n.C.\n.M.").unwrap();
        board.submit(Coord::new(0, 1), TerrainKind::Mountain);
        assert!(check_invariants(&board).is_empty());
    }
}
