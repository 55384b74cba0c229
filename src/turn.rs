//! Turn controller: Init -> PlayerTurn <-> OpponentTurn -> Ended.

use std::fmt;

use tracing::{info, warn};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TurnState {
    #[default]
    Init,
    PlayerTurn,
    OpponentTurn,
    Ended,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TurnState::Init => "init",
            TurnState::PlayerTurn => "player",
            TurnState::OpponentTurn => "opponent",
            TurnState::Ended => "ended",
        };
        f.write_str(s)
    }
}

/// Owns the turn state. Every transition reports whether it happened so the
/// caller knows whether to publish the matching event.
#[derive(Debug, Default)]
pub struct TurnController {
    state: TurnState,
}

impl TurnController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state == TurnState::Ended
    }

    /// Init -> PlayerTurn. Returns false from any other state.
    pub fn start_game(&mut self) -> bool {
        if self.state != TurnState::Init {
            warn!(state = %self.state, "start_game ignored");
            return false;
        }
        self.state = TurnState::PlayerTurn;
        info!("game started");
        true
    }

    /// Toggle PlayerTurn <-> OpponentTurn. Refused (false) from Init and Ended.
    pub fn advance_turn(&mut self) -> bool {
        self.state = match self.state {
            TurnState::PlayerTurn => TurnState::OpponentTurn,
            TurnState::OpponentTurn => TurnState::PlayerTurn,
            other => {
                warn!(state = %other, "advance_turn ignored");
                return false;
            }
        };
        info!(state = %self.state, "turn advanced");
        true
    }

    /// Any state -> Ended. Returns false if the game had already ended, so
    /// game-end is only ever reported once.
    pub fn end_game(&mut self) -> bool {
        if self.is_ended() {
            return false;
        }
        self.state = TurnState::Ended;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut t = TurnController::new();
        assert_eq!(t.state(), TurnState::Init);
        assert!(!t.advance_turn());
        assert!(t.start_game());
        assert_eq!(t.state(), TurnState::PlayerTurn);
        assert!(!t.start_game());
        assert!(t.advance_turn());
        assert_eq!(t.state(), TurnState::OpponentTurn);
        assert!(t.advance_turn());
        assert_eq!(t.state(), TurnState::PlayerTurn);
        assert!(t.end_game());
        assert!(t.is_ended());
    }

    #[test]
    fn test_ended_is_terminal() {
        let mut t = TurnController::new();
        assert!(t.end_game());
        assert!(!t.end_game());
        assert!(!t.start_game());
        assert!(!t.advance_turn());
        assert_eq!(t.state(), TurnState::Ended);
    }
}
