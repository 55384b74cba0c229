//! One game session: the board, the turn controller, the opponent and the
//! piece dispenser, owned together and wired through board events.
//!
//! Every submit, whether from the player or the opponent, is followed by a
//! dispatch that drains the board's event queue in order, patches the
//! opponent's caches on each resource-added event, ends the game when the play
//! area fills, and forwards everything to the subscribed observers.

use fastrand::Rng;
use tracing::info;

use crate::board::Board;
use crate::constants::{DEFAULT_LAYOUT, GLYPH_CITY, GLYPH_EMPTY};
use crate::events::{GameEvent, Observer, Outcome};
use crate::grid::{Coord, LayoutError, TerrainKind};
use crate::opponent::{Opponent, OpponentTurnTask, TaskStatus, TurnHost};
use crate::pieces::{Dispenser, Piece};
use crate::turn::{TurnController, TurnState};

/// Runtime settings for a session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Starting map as a text layout.
    pub layout: String,
    /// Seed for the opponent and dispenser; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_string(),
            seed: None,
        }
    }
}

impl SessionConfig {
    /// An open `width` x `height` field with one City in the middle.
    pub fn blank(width: usize, height: usize, seed: Option<u64>) -> Self {
        let mut layout = String::with_capacity((width + 1) * height);
        for y in 0..height {
            for x in 0..width {
                let centre = x == width / 2 && y == height / 2;
                layout.push(if centre { GLYPH_CITY } else { GLYPH_EMPTY });
            }
            layout.push('\n');
        }
        Self { layout, seed }
    }
}

/// Everything the opponent's turn task drives. Kept apart from the task so the
/// task can borrow it mutably while stepping.
struct GameCore {
    board: Board,
    turn: TurnController,
    opponent: Opponent,
    dispenser: Dispenser,
    rng: Rng,
    observers: Vec<Box<dyn Observer>>,
    outcome: Option<Outcome>,
}

impl GameCore {
    fn publish(&mut self, event: &GameEvent) {
        for observer in &mut self.observers {
            observer.on_event(event);
        }
    }

    /// Deliver queued board events until the queue stays empty.
    fn dispatch(&mut self) {
        loop {
            let events = self.board.drain_events();
            if events.is_empty() {
                break;
            }
            for event in &events {
                if let GameEvent::ResourceAdded { coord, terrain } = *event {
                    self.opponent.on_resource_added(&self.board, coord, terrain);
                }
                self.publish(event);
                if *event == GameEvent::PlayAreaFilled {
                    self.end_game();
                }
            }
        }
    }

    fn end_game(&mut self) -> bool {
        if !self.turn.end_game() {
            return false;
        }
        let outcome = Outcome::from_scores(self.board.nature_score(), self.board.human_score());
        self.outcome = Some(outcome);
        self.dispenser.dispose();
        info!(
            nature = self.board.nature_score(),
            humans = self.board.human_score(),
            "game over: {}",
            outcome.message()
        );
        self.publish(&GameEvent::GameEnded(outcome));
        true
    }
}

impl TurnHost for GameCore {
    fn turn_state(&self) -> TurnState {
        self.turn.state()
    }

    fn human_moves_per_turn(&self) -> u32 {
        self.board.human_moves_per_turn()
    }

    fn explore(&mut self) {
        self.opponent.explore_and_cull_frontier(&self.board);
    }

    fn try_place(&mut self, kind: TerrainKind) -> bool {
        let placed = self
            .opponent
            .try_place_tile(&mut self.board, kind, &mut self.rng);
        if placed {
            self.dispatch();
        }
        placed
    }

    fn advance_turn(&mut self) {
        if self.turn.advance_turn() {
            let state = self.turn.state();
            self.publish(&GameEvent::TurnAdvanced(state));
        }
    }
}

/// A single game from setup to end.
pub struct Session {
    core: GameCore,
    task: OpponentTurnTask,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Result<Self, LayoutError> {
        let board = Board::from_layout(&config.layout)?;
        Ok(Self::with_board(board, config.seed))
    }

    pub fn with_board(board: Board, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(Rng::new, Rng::with_seed);
        Self {
            core: GameCore {
                board,
                turn: TurnController::new(),
                opponent: Opponent::new(),
                dispenser: Dispenser::new(),
                rng,
                observers: Vec::new(),
                outcome: None,
            },
            task: OpponentTurnTask::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.core.observers.push(Box::new(observer));
    }

    pub fn board(&self) -> &Board {
        &self.core.board
    }

    pub fn opponent(&self) -> &Opponent {
        &self.core.opponent
    }

    pub fn dispenser(&self) -> &Dispenser {
        &self.core.dispenser
    }

    pub fn state(&self) -> TurnState {
        self.core.turn.state()
    }

    /// Set once the game has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.core.outcome
    }

    /// Init -> PlayerTurn: seeds the opponent's frontier and deals pieces.
    pub fn start_game(&mut self) -> bool {
        if !self.core.turn.start_game() {
            return false;
        }
        self.core.publish(&GameEvent::GameStarted);
        let core = &mut self.core;
        core.opponent.initialise(&core.board);
        core.dispenser.initialise(&mut core.rng);
        if core.board.unclaimed_count() == 0 {
            core.end_game();
        }
        true
    }

    /// Any state -> Ended. The opponent task stops at its next step.
    pub fn end_game(&mut self) -> bool {
        self.task.cancel();
        self.core.end_game()
    }

    pub fn validate(&self, c: Coord, terrain: TerrainKind) -> bool {
        self.core.board.validate(c, terrain)
    }

    /// Commit a single player tile. Only accepted on the player's turn.
    pub fn place(&mut self, c: Coord, terrain: TerrainKind) -> bool {
        if self.state() != TurnState::PlayerTurn {
            return false;
        }
        let placed = self.core.board.submit(c, terrain);
        if placed {
            self.core.dispatch();
        }
        placed
    }

    /// Validation result for each tile of the piece in hand dropped at `anchor`.
    pub fn preview_piece(&self, anchor: Coord) -> Vec<(Coord, TerrainKind, bool)> {
        self.core
            .dispenser
            .deployed()
            .map(|piece| {
                piece
                    .cells(anchor)
                    .map(|(c, t)| (c, t, self.core.board.validate(c, t)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop the piece in hand at `anchor`. The piece is used up if at least
    /// one of its tiles changed the board.
    pub fn place_piece(&mut self, anchor: Coord) -> bool {
        if self.state() != TurnState::PlayerTurn {
            return false;
        }
        let Some(piece) = self.core.dispenser.deployed() else {
            return false;
        };

        let mut any_placed = false;
        for (c, t) in piece.cells(anchor) {
            if self.core.board.submit(c, t) {
                any_placed = true;
                self.core.dispatch();
            }
        }

        if any_placed && !self.core.turn.is_ended() {
            let core = &mut self.core;
            core.dispenser.deploy_next(&mut core.rng);
        }
        any_placed
    }

    /// Replace the piece in hand.
    pub fn set_deployed_piece(&mut self, piece: Piece) {
        self.core.dispenser.force_deployed(piece);
    }

    /// PlayerTurn -> OpponentTurn.
    pub fn end_player_turn(&mut self) -> bool {
        if self.state() != TurnState::PlayerTurn {
            return false;
        }
        self.core.advance_turn();
        true
    }

    /// Advance the opponent's task to its next suspension point.
    pub fn step_opponent(&mut self) -> TaskStatus {
        self.task.step(&mut self.core)
    }

    /// Step the opponent until it hands the turn back or the game ends.
    pub fn run_opponent_turn(&mut self) -> TaskStatus {
        loop {
            let status = self.step_opponent();
            if status != TaskStatus::Runnable {
                return status;
            }
        }
    }
}
