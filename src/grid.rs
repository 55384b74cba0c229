//! Grid storage: coordinates, terrain kinds, claim status and text layouts.
//!
//! The grid is plain data. It knows nothing about placement rules; the
//! [`crate::board::Board`] is the only thing that writes cells after setup.
//!
//! Layouts are written one row per line, top row first, using the glyphs in
//! [`crate::constants`]:
//!
//! ```text
//! ##....
//! #..C..
//! #.~^..
//! ```

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{
    GLYPH_CITY, GLYPH_EMPTY, GLYPH_FARM, GLYPH_FOREST, GLYPH_MINE, GLYPH_MOUNTAIN, GLYPH_PLAINS,
    GLYPH_UNTRACKED, GLYPH_WATER,
};

/// A cell address. Signed so that offset probes may step off the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan length of this coordinate seen as an offset.
    pub const fn manhattan(self) -> i32 {
        self.x.abs() + self.y.abs()
    }
}

/// Saturating: a probe stepping past `i32::MAX` or `i32::MIN` stays off-board.
impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x.saturating_add(rhs.x), self.y.saturating_add(rhs.y))
    }
}

impl Sub for Coord {
    type Output = Coord;

    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error parsing an `x,y` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate '{0}', expected x,y")]
pub struct CoordParseError(pub String);

impl FromStr for Coord {
    type Err = CoordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CoordParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(err)?;
        let x = x.trim().parse::<i32>().map_err(|_| err())?;
        let y = y.trim().parse::<i32>().map_err(|_| err())?;
        Ok(Coord::new(x, y))
    }
}

/// The fixed set of terrains a tile can carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TerrainKind {
    Plains,
    Forest,
    Mountain,
    Water,
    City,
    Mine,
    Farm,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 7] = [
        TerrainKind::Plains,
        TerrainKind::Forest,
        TerrainKind::Mountain,
        TerrainKind::Water,
        TerrainKind::City,
        TerrainKind::Mine,
        TerrainKind::Farm,
    ];

    /// Kinds the opponent places, in its placement priority order.
    pub const HUMAN_PRIORITY: [TerrainKind; 3] =
        [TerrainKind::Farm, TerrainKind::Mine, TerrainKind::City];

    pub const fn is_nature(self) -> bool {
        matches!(
            self,
            TerrainKind::Forest | TerrainKind::Mountain | TerrainKind::Water
        )
    }

    pub const fn is_human(self) -> bool {
        matches!(self, TerrainKind::City | TerrainKind::Mine | TerrainKind::Farm)
    }

    pub const fn glyph(self) -> char {
        match self {
            TerrainKind::Plains => GLYPH_PLAINS,
            TerrainKind::Forest => GLYPH_FOREST,
            TerrainKind::Mountain => GLYPH_MOUNTAIN,
            TerrainKind::Water => GLYPH_WATER,
            TerrainKind::City => GLYPH_CITY,
            TerrainKind::Mine => GLYPH_MINE,
            TerrainKind::Farm => GLYPH_FARM,
        }
    }

    pub fn from_glyph(c: char) -> Option<TerrainKind> {
        TerrainKind::ALL.into_iter().find(|t| t.glyph() == c)
    }

    pub const fn name(self) -> &'static str {
        match self {
            TerrainKind::Plains => "plains",
            TerrainKind::Forest => "forest",
            TerrainKind::Mountain => "mountain",
            TerrainKind::Water => "water",
            TerrainKind::City => "city",
            TerrainKind::Mine => "mine",
            TerrainKind::Farm => "farm",
        }
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown terrain '{0}'")]
pub struct TerrainParseError(pub String);

impl FromStr for TerrainKind {
    type Err = TerrainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        TerrainKind::ALL
            .into_iter()
            .find(|t| t.name() == lower)
            .ok_or_else(|| TerrainParseError(s.to_string()))
    }
}

/// Whether a cell is part of the play area and, if so, whether it is taken.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClaimStatus {
    /// Outside the tracked play area.
    Untracked,
    /// Free for placement.
    Unclaimed,
    /// Holds a committed non-Plains terrain.
    Occupied,
}

/// Terrain and claim status of one grid square.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub terrain: Option<TerrainKind>,
    pub claim: ClaimStatus,
}

impl Cell {
    pub const UNTRACKED: Cell = Cell {
        terrain: None,
        claim: ClaimStatus::Untracked,
    };

    pub const EMPTY: Cell = Cell {
        terrain: None,
        claim: ClaimStatus::Unclaimed,
    };

    /// A tracked cell holding `terrain`, with the claim status that terrain implies.
    pub const fn with_terrain(terrain: TerrainKind) -> Cell {
        let claim = match terrain {
            TerrainKind::Plains => ClaimStatus::Unclaimed,
            _ => ClaimStatus::Occupied,
        };
        Cell {
            terrain: Some(terrain),
            claim,
        }
    }

    pub const fn is_occupied(self) -> bool {
        matches!(self.claim, ClaimStatus::Occupied)
    }

    pub fn glyph(self) -> char {
        match (self.claim, self.terrain) {
            (ClaimStatus::Untracked, None) => GLYPH_UNTRACKED,
            (_, Some(t)) => t.glyph(),
            (_, None) => GLYPH_EMPTY,
        }
    }
}

/// Errors from [`Grid::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown glyph '{glyph}' at {x},{y}")]
    UnknownGlyph { glyph: char, x: usize, y: usize },

    #[error("layout is {width}x{height}, too large to address")]
    TooLarge { width: usize, height: usize },
}

/// A fixed-size rectangle of cells, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A fully tracked grid with no terrain anywhere.
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, Cell::EMPTY)
    }

    fn filled(width: i32, height: i32, cell: Cell) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![cell; cell_count(width, height)],
        }
    }

    /// Parse a text layout (top row first).
    pub fn parse(text: &str) -> Result<Grid, LayoutError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(LayoutError::Empty);
        };
        let width = first.chars().count();
        let too_large = || LayoutError::TooLarge {
            width,
            height: rows.len(),
        };
        let w = i32::try_from(width).map_err(|_| too_large())?;
        let h = i32::try_from(rows.len()).map_err(|_| too_large())?;

        let mut grid = Grid::filled(w, h, Cell::UNTRACKED);
        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(LayoutError::Ragged {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let cell = match glyph {
                    GLYPH_UNTRACKED => Cell::UNTRACKED,
                    GLYPH_EMPTY => Cell::EMPTY,
                    g => match TerrainKind::from_glyph(g) {
                        Some(t) => Cell::with_terrain(t),
                        None => return Err(LayoutError::UnknownGlyph { glyph, x, y }),
                    },
                };
                grid.set(Coord::new(x as i32, y as i32), cell);
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    fn idx(&self, c: Coord) -> Option<usize> {
        self.in_bounds(c)
            .then(|| c.y as usize * self.width as usize + c.x as usize)
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width && c.y < self.height
    }

    /// The cell at `c`, or `None` off the board.
    pub fn get(&self, c: Coord) -> Option<Cell> {
        self.idx(c).map(|i| self.cells[i])
    }

    /// Terrain at `c`; off-board probes read as no terrain.
    pub fn terrain(&self, c: Coord) -> Option<TerrainKind> {
        self.get(c).and_then(|cell| cell.terrain)
    }

    /// Claim status at `c`; off-board probes read as untracked.
    pub fn claim(&self, c: Coord) -> ClaimStatus {
        self.get(c).map_or(ClaimStatus::Untracked, |cell| cell.claim)
    }

    pub fn is_occupied(&self, c: Coord) -> bool {
        self.claim(c) == ClaimStatus::Occupied
    }

    /// Overwrite a cell. Off-board writes are ignored.
    pub(crate) fn set(&mut self, c: Coord, cell: Cell) {
        if let Some(i) = self.idx(c) {
            self.cells[i] = cell;
        }
    }

    /// Every cell with its coordinate, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Cell)> + '_ {
        let w = self.width.max(1) as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &cell)| (Coord::new((i % w) as i32, (i / w) as i32), cell))
    }

    pub fn count_claim(&self, claim: ClaimStatus) -> usize {
        self.cells.iter().filter(|c| c.claim == claim).count()
    }

    /// Coordinates holding `terrain`, row-major.
    pub fn coords_of(&self, terrain: TerrainKind) -> Vec<Coord> {
        self.iter()
            .filter(|(_, cell)| cell.terrain == Some(terrain))
            .map(|(c, _)| c)
            .collect()
    }
}

/// Cells in a `width` x `height` grid. Both sides are non-negative `i32`s, so
/// the product always fits a 64-bit `usize`.
fn cell_count(width: i32, height: i32) -> usize {
    width.max(0) as usize * height.max(0) as usize
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let ch = self.get(Coord::new(x, y)).map_or(GLYPH_UNTRACKED, Cell::glyph);
                write!(f, "{ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
