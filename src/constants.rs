//! Constants for board dimensions, turn budgets, offsets and glyphs.
//!
//! The terrain rule set is fixed, so everything a game needs to know about
//! geometry and starting conditions lives here rather than in a config file.
//! Runtime choices (map, seed) are made through [`crate::session::SessionConfig`].

use crate::grid::Coord;

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board width when no map is supplied.
pub const DEFAULT_WIDTH: i32 = 9;

/// Default board height when no map is supplied.
pub const DEFAULT_HEIGHT: i32 = 9;

/// Orthogonal neighbor offsets. Order: Up, Right, Down, Left.
///
/// Row 0 is the top row, so "up" decreases `y`.
pub const ORTHOGONAL: [Coord; 4] = [
    Coord::new(0, -1), // Up
    Coord::new(1, 0),  // Right
    Coord::new(0, 1),  // Down
    Coord::new(-1, 0), // Left
];

/// Offsets at Manhattan distance 2: four diagonal composites, then the
/// four straight double steps.
pub const RANGE2: [Coord; 8] = [
    Coord::new(1, -1),  // NE
    Coord::new(-1, 1),  // SW
    Coord::new(-1, -1), // NW
    Coord::new(1, 1),   // SE
    Coord::new(0, -2),  // 2 x Up
    Coord::new(2, 0),   // 2 x Right
    Coord::new(0, 2),   // 2 x Down
    Coord::new(-2, 0),  // 2 x Left
];

// =============================================================================
// Turn Budget
// =============================================================================

/// Human placements per opponent turn at the start of a game, and the floor
/// the budget never drops below.
pub const STARTING_HUMAN_MOVES: u32 = 2;

/// Opponent turns the `demo` self-play runs before giving up on a finish.
pub const DEMO_TURN_LIMIT: usize = 200;

// =============================================================================
// Layout Glyphs
// =============================================================================

/// Outside the tracked play area.
pub const GLYPH_UNTRACKED: char = '#';

/// Tracked cell with no terrain yet.
pub const GLYPH_EMPTY: char = '.';

pub const GLYPH_PLAINS: char = ',';
pub const GLYPH_FOREST: char = 'T';
pub const GLYPH_MOUNTAIN: char = '^';
pub const GLYPH_WATER: char = '~';
pub const GLYPH_CITY: char = 'C';
pub const GLYPH_MINE: char = 'M';
pub const GLYPH_FARM: char = 'F';

/// Map used when the CLI is given neither `--map` nor a custom size:
/// an open 9x9 field with a single settlement in the middle.
pub const DEFAULT_LAYOUT: &str = "\
.........
.........
.........
.........
....C....
.........
.........
.........
.........
";
