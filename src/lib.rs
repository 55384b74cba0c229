//! Terraclaim: a turn-based territory game of Nature against Humans.
//!
//! Two factions take turns placing typed tiles on a bounded grid. Nature
//! plays Forest, Water and Mountain; the Humans, driven by an automated
//! opponent, grow Cities, Mines and Farms outward from their settlements.
//! Placements trigger cascades: mountains raze neighboring human tiles and
//! cities swallow forests they surround.
//!
//! ## Modules
//!
//! - [`constants`] - Offsets, budgets, glyphs and the default map
//! - [`grid`] - Coordinates, terrain, claim status and text layouts
//! - [`geometry`] - Adjacency, range-2 offsets and path obstruction
//! - [`board`] - Rule engine: validation, cascades, scoring, termination
//! - [`opponent`] - Incremental frontier search and the opponent's turn task
//! - [`turn`] - Turn state machine
//! - [`events`] - Game events and observers
//! - [`pieces`] - Nature's pieces and the dispenser
//! - [`session`] - One game with all of the above wired together
//! - [`protocol`] - Text command protocol
//! - [`invariants`] - Board sanity checks
//!
//! ## Example
//!
//! ```
//! use terraclaim::grid::{Coord, TerrainKind};
//! use terraclaim::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(&SessionConfig::blank(5, 5, Some(1))).unwrap();
//! session.start_game();
//!
//! // Nature drops a lake, then hands the turn to the opponent.
//! session.place(Coord::new(0, 0), TerrainKind::Water);
//! session.end_player_turn();
//! session.run_opponent_turn();
//!
//! println!("{}", session.board());
//! ```

pub mod board;
pub mod constants;
pub mod events;
pub mod geometry;
pub mod grid;
pub mod invariants;
pub mod opponent;
pub mod pieces;
pub mod protocol;
pub mod session;
pub mod turn;
