//! Notifications fanned out to presentation layers and the opponent.
//!
//! The board queues events while a submit runs; the session drains the queue
//! afterwards and hands each event, in emission order, to every observer.

use crate::grid::{Coord, TerrainKind};
use crate::turn::TurnState;

/// Who came out ahead when the play area filled up.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Humans outscored nature.
    NatureLost,
    /// Nature held humans to a tie or better.
    HumansContained,
}

impl Outcome {
    pub fn from_scores(nature: i32, human: i32) -> Outcome {
        if nature < human {
            Outcome::NatureLost
        } else {
            Outcome::HumansContained
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Outcome::NatureLost => "Nature Lost!",
            Outcome::HumansContained => "Humans Contained!",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    NatureScoreChanged(i32),
    HumanScoreChanged(i32),
    /// A submit committed `terrain` at `coord` (cascaded submits included).
    ResourceAdded { coord: Coord, terrain: TerrainKind },
    /// No unclaimed cells remain. Raised once by the board.
    PlayAreaFilled,
    GameStarted,
    GameEnded(Outcome),
    TurnAdvanced(TurnState),
}

/// Receives every event a session publishes.
pub trait Observer {
    fn on_event(&mut self, event: &GameEvent);
}

impl<F: FnMut(&GameEvent)> Observer for F {
    fn on_event(&mut self, event: &GameEvent) {
        self(event)
    }
}
