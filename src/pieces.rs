//! Nature's placeable pieces and the dispenser that deals them.
//!
//! A piece is a small fixed shape of terrain tiles. Dropping it at an anchor
//! submits each tile at `anchor + offset`, row-major. The dispenser shows the
//! piece in hand (`deployed`) and the one after it (`next`).

use std::fmt;

use fastrand::Rng;

use crate::grid::TerrainKind::{Forest, Mountain, Water};
use crate::grid::{Coord, TerrainKind};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    name: &'static str,
    /// Offsets from the anchor, sorted row-major.
    tiles: &'static [(Coord, TerrainKind)],
}

pub const CATALOG: [Piece; 7] = [
    Piece {
        name: "grove",
        tiles: &[(Coord::new(0, 0), Forest)],
    },
    Piece {
        name: "pond",
        tiles: &[(Coord::new(0, 0), Water)],
    },
    Piece {
        name: "peak",
        tiles: &[(Coord::new(0, 0), Mountain)],
    },
    Piece {
        name: "woods",
        tiles: &[(Coord::new(0, 0), Forest), (Coord::new(1, 0), Forest)],
    },
    Piece {
        name: "stream",
        tiles: &[(Coord::new(0, 0), Water), (Coord::new(0, 1), Water)],
    },
    Piece {
        name: "marsh",
        tiles: &[(Coord::new(0, 0), Forest), (Coord::new(1, 0), Water)],
    },
    Piece {
        name: "thicket",
        tiles: &[
            (Coord::new(0, 0), Forest),
            (Coord::new(0, 1), Forest),
            (Coord::new(1, 1), Forest),
        ],
    },
];

impl Piece {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tiles(&self) -> &'static [(Coord, TerrainKind)] {
        self.tiles
    }

    /// Board cells this piece covers when dropped at `anchor`.
    pub fn cells(&self, anchor: Coord) -> impl Iterator<Item = (Coord, TerrainKind)> + '_ {
        self.tiles.iter().map(move |&(d, t)| (anchor + d, t))
    }

    pub fn random(rng: &mut Rng) -> Piece {
        CATALOG[rng.usize(..CATALOG.len())]
    }

    pub fn by_name(name: &str) -> Option<Piece> {
        CATALOG.into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.tiles.iter().map(|(d, _)| d.x).max().unwrap_or(0);
        let h = self.tiles.iter().map(|(d, _)| d.y).max().unwrap_or(0);
        writeln!(f, "{}:", self.name)?;
        for y in 0..=h {
            for x in 0..=w {
                let glyph = self
                    .tiles
                    .iter()
                    .find(|(d, _)| *d == Coord::new(x, y))
                    .map_or(' ', |(_, t)| t.glyph());
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Deals pieces one at a time, always showing the upcoming one.
#[derive(Clone, Debug, Default)]
pub struct Dispenser {
    deployed: Option<Piece>,
    next: Option<Piece>,
}

impl Dispenser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill both slots.
    pub fn initialise(&mut self, rng: &mut Rng) {
        self.next = Some(Piece::random(rng));
        self.deploy_next(rng);
    }

    /// Hand over the upcoming piece and draw a new one behind it.
    pub fn deploy_next(&mut self, rng: &mut Rng) {
        self.deployed = self.next.take();
        self.next = Some(Piece::random(rng));
    }

    /// Empty both slots (game over).
    pub fn dispose(&mut self) {
        self.deployed = None;
        self.next = None;
    }

    pub fn deployed(&self) -> Option<Piece> {
        self.deployed
    }

    pub fn next(&self) -> Option<Piece> {
        self.next
    }

    /// Replace the piece in hand; used by scripted setups.
    pub fn force_deployed(&mut self, piece: Piece) {
        self.deployed = Some(piece);
    }
}
