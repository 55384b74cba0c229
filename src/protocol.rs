//! Line-oriented text protocol for playing a session from a terminal or a
//! front end.
//!
//! Each request is one line: an optional numeric id, a command, arguments.
//! Replies follow the GTP convention: `=id reply` on success, `?id message`
//! on failure, each followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `list_commands`, `known_command <cmd>`, `quit`
//! - `start` - Start the game (player moves first)
//! - `reset` - Throw the current game away and load the starting map again
//! - `show` - Print the board and counters
//! - `score` - Print the score counters
//! - `state` - Print whose turn it is
//! - `outcome` - Print the result once the game has ended
//! - `piece` - Show the piece in hand and the upcoming one
//! - `preview <x,y>` - Validate each tile of the piece in hand at an anchor
//! - `drop <x,y>` - Drop the piece in hand
//! - `place <terrain> <x,y>` - Place a single tile
//! - `validate <terrain> <x,y>` - Check a single tile without placing it
//! - `end` - End the player's turn and let the opponent move
//!
//! ## Example
//!
//! ```ignore
//! use terraclaim::protocol::ProtocolEngine;
//! use terraclaim::session::SessionConfig;
//! let mut engine = ProtocolEngine::new(SessionConfig::default()).unwrap();
//! engine.run(std::io::stdin().lock(), std::io::stdout()).unwrap();
//! ```

use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::grid::{Coord, CoordParseError, LayoutError, TerrainKind, TerrainParseError};
use crate::session::{Session, SessionConfig};
use crate::turn::TurnState;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "drop",
    "end",
    "known_command",
    "list_commands",
    "name",
    "outcome",
    "piece",
    "place",
    "preview",
    "quit",
    "reset",
    "score",
    "show",
    "start",
    "state",
    "validate",
    "version",
];

/// Why a command failed. The message becomes the `?` reply.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("missing argument")]
    MissingArgument,

    #[error(transparent)]
    Coord(#[from] CoordParseError),

    #[error(transparent)]
    Terrain(#[from] TerrainParseError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("game already started")]
    AlreadyStarted,

    #[error("not the player's turn (state: {0})")]
    NotPlayerTurn(TurnState),

    #[error("game is not over")]
    GameNotOver,

    #[error("no piece in hand")]
    NoPiece,

    #[error("illegal placement: {0}")]
    Rejected(String),
}

/// Protocol state: the session being played and the settings to rebuild it.
pub struct ProtocolEngine {
    config: SessionConfig,
    session: Session,
}

impl ProtocolEngine {
    pub fn new(config: SessionConfig) -> Result<Self, LayoutError> {
        let session = Session::new(&config)?;
        Ok(Self { config, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            match self.execute(&command, args) {
                Ok(reply) => writeln!(output, "={id_str} {reply}\n")?,
                Err(e) => writeln!(output, "?{id_str} {e}\n")?,
            }
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end == 0 {
            return (None, trimmed);
        }
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn arg<'a>(args: &[&'a str], i: usize) -> Result<&'a str, CommandError> {
        args.get(i).copied().ok_or(CommandError::MissingArgument)
    }

    fn coord_arg(args: &[&str], i: usize) -> Result<Coord, CommandError> {
        Ok(Self::arg(args, i)?.parse::<Coord>()?)
    }

    fn terrain_arg(args: &[&str], i: usize) -> Result<TerrainKind, CommandError> {
        Ok(Self::arg(args, i)?.parse::<TerrainKind>()?)
    }

    fn require_player_turn(&self) -> Result<(), CommandError> {
        match self.session.state() {
            TurnState::PlayerTurn => Ok(()),
            other => Err(CommandError::NotPlayerTurn(other)),
        }
    }

    fn score_line(&self) -> String {
        let b = self.session.board();
        format!(
            "nature {} humans {} moves {} unclaimed {}",
            b.nature_score(),
            b.human_score(),
            b.human_moves_per_turn(),
            b.unclaimed_count()
        )
    }

    /// Execute a command and return the reply text.
    pub fn execute(&mut self, command: &str, args: &[&str]) -> Result<String, CommandError> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let known = KNOWN_COMMANDS.contains(&Self::arg(args, 0)?.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "start" => {
                if self.session.start_game() {
                    Ok(self.session.state().to_string())
                } else {
                    Err(CommandError::AlreadyStarted)
                }
            }

            "reset" => {
                self.session = Session::new(&self.config)?;
                Ok(String::new())
            }

            "show" => Ok(format!("\n{}", self.session.board())),

            "score" => Ok(self.score_line()),

            "state" => Ok(self.session.state().to_string()),

            "outcome" => self
                .session
                .outcome()
                .map(|o| o.message().to_string())
                .ok_or(CommandError::GameNotOver),

            "piece" => {
                let dispenser = self.session.dispenser();
                let deployed = dispenser.deployed().ok_or(CommandError::NoPiece)?;
                let next = dispenser.next().map_or("-", |p| p.name());
                Ok(format!("\n{deployed}next: {next}"))
            }

            "preview" => {
                let anchor = Self::coord_arg(args, 0)?;
                let preview = self.session.preview_piece(anchor);
                if preview.is_empty() {
                    return Err(CommandError::NoPiece);
                }
                let lines: Vec<String> = preview
                    .iter()
                    .map(|(c, t, ok)| format!("{c} {t} {}", if *ok { "ok" } else { "blocked" }))
                    .collect();
                Ok(lines.join("\n"))
            }

            "drop" => {
                self.require_player_turn()?;
                let anchor = Self::coord_arg(args, 0)?;
                if self.session.dispenser().deployed().is_none() {
                    return Err(CommandError::NoPiece);
                }
                if self.session.place_piece(anchor) {
                    Ok(self.score_line())
                } else {
                    Err(CommandError::Rejected(format!("no tile fits at {anchor}")))
                }
            }

            "place" => {
                self.require_player_turn()?;
                let terrain = Self::terrain_arg(args, 0)?;
                let c = Self::coord_arg(args, 1)?;
                if self.session.place(c, terrain) {
                    Ok(self.score_line())
                } else {
                    Err(CommandError::Rejected(format!("{terrain} at {c}")))
                }
            }

            "validate" => {
                let terrain = Self::terrain_arg(args, 0)?;
                let c = Self::coord_arg(args, 1)?;
                Ok(self.session.validate(c, terrain).to_string())
            }

            "end" => {
                self.require_player_turn()?;
                self.session.end_player_turn();
                self.session.run_opponent_turn();
                Ok(format!("{} {}", self.session.state(), self.score_line()))
            }

            _ => Err(CommandError::UnknownCommand(command.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ProtocolEngine {
        ProtocolEngine::new(SessionConfig {
            layout: ".....\n.....\n..C..\n.....\n.....".to_string(),
            seed: Some(3),
        })
        .unwrap()
    }

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_known_command() {
        let mut e = engine();
        assert_eq!(e.execute("known_command", &["drop"]).unwrap(), "true");
        assert_eq!(e.execute("known_command", &["genmove"]).unwrap(), "false");
        assert!(matches!(
            e.execute("known_command", &[]),
            Err(CommandError::MissingArgument)
        ));
    }

    #[test]
    fn test_place_before_start_is_refused() {
        let mut e = engine();
        assert!(matches!(
            e.execute("place", &["forest", "0,0"]),
            Err(CommandError::NotPlayerTurn(TurnState::Init))
        ));
        e.execute("start", &[]).unwrap();
        assert!(matches!(
            e.execute("start", &[]),
            Err(CommandError::AlreadyStarted)
        ));
        assert_eq!(
            e.execute("place", &["forest", "0,0"]).unwrap(),
            "nature 1 humans 0 moves 2 unclaimed 23"
        );
    }

    #[test]
    fn test_bad_arguments() {
        let mut e = engine();
        assert!(matches!(
            e.execute("validate", &["lava", "0,0"]),
            Err(CommandError::Terrain(_))
        ));
        assert!(matches!(
            e.execute("validate", &["city", "zero"]),
            Err(CommandError::Coord(_))
        ));
        assert_eq!(e.execute("validate", &["city", "2,3"]).unwrap(), "true");
        assert_eq!(e.execute("validate", &["city", "0,0"]).unwrap(), "false");
        assert!(matches!(
            e.execute("genmove", &[]),
            Err(CommandError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_run_loop_replies() {
        let mut e = engine();
        let input = b"1 name\n# comment\n\nstart\n2 outcome\nquit\nname\n";
        let mut out = Vec::new();
        e.run(&input[..], &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "=1 terraclaim\n\n= player\n\n?2 game is not over\n\n= \n\n"
        );
    }

    #[test]
    fn test_extreme_anchors_are_off_board() {
        let mut e = engine();
        e.execute("start", &[]).unwrap();
        for anchor in ["2147483647,0", "-2147483648,2147483647"] {
            let preview = e.execute("preview", &[anchor]).unwrap();
            assert!(preview.lines().all(|l| l.ends_with("blocked")), "{preview}");
            assert!(matches!(
                e.execute("drop", &[anchor]),
                Err(CommandError::Rejected(_))
            ));
            assert_eq!(e.execute("validate", &["mine", anchor]).unwrap(), "false");
        }
        assert!(e.session().dispenser().deployed().is_some());
        assert_eq!(e.session().board().nature_score(), 0);
    }

    #[test]
    fn test_end_runs_opponent() {
        let mut e = engine();
        e.execute("start", &[]).unwrap();
        let reply = e.execute("end", &[]).unwrap();
        assert!(reply.starts_with("player"), "{reply}");
        assert_eq!(e.session().board().human_score(), 2);
    }
}
