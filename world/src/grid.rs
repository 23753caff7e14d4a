//! Maze layouts and the per-session grid overlay.

use maze_chase_core::{CellCoord, CellKind};
use thiserror::Error;

const STANDARD_LAYOUT: &str = concat!(
    "###################\n",
    "#........#........#\n",
    "#o##.###.%.###.##o#\n",
    "#.##.###.#.###.##.#\n",
    "#.................#\n",
    "#.##.#.#####.#.##.#\n",
    "#....#...#...#....#\n",
    "####.###%#%###.####\n",
    "####.#...H...#.####\n",
    ".....#.#G-G#.#.....\n",
    "####.#.#G-G#.#.####\n",
    "####.#.#####.#.####\n",
    "#........#........#\n",
    "#.##.###.#.###.##.#\n",
    "#o.#.....P.....#.o#\n",
    "##.#.#.#####.#.#.##\n",
    "#....#...#...#....#\n",
    "#.######.#.######.#\n",
    "#...%.........%...#\n",
    "#.................#\n",
    "###################\n",
);

/// Largest number of adversary spawns a layout may declare.
pub const MAX_ADVERSARIES: usize = 4;

/// Reasons a textual layout is rejected.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The text holds no rows.
    #[error("layout is empty")]
    Empty,
    /// A row's width differs from the first row's.
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        /// Offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character outside the glyph set.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Column of the character.
        column: usize,
        /// Row of the character.
        row: usize,
    },
    /// The top or bottom row contains something other than wall.
    #[error("border cell at column {column}, row {row} must be a wall")]
    OpenBorder {
        /// Column of the open cell.
        column: usize,
        /// Row of the open cell.
        row: usize,
    },
    /// Exactly one side of a row is open, so the tunnel leads nowhere.
    #[error("row {row} is open on one edge only")]
    UnpairedTunnel {
        /// Offending row.
        row: usize,
    },
    /// The layout must place the player exactly once.
    #[error("layout needs exactly one player spawn, found {found}")]
    PlayerSpawnCount {
        /// Number of player spawns found.
        found: usize,
    },
    /// Too many adversary spawns.
    #[error("layout supports at most {MAX_ADVERSARIES} adversary spawns, found {found}")]
    TooManyAdversaries {
        /// Number of adversary spawns found.
        found: usize,
    },
    /// More than one designated home tile.
    #[error("layout declares {found} home tiles, expected at most one")]
    MultipleHomes {
        /// Number of home tiles found.
        found: usize,
    },
}

/// Validated, immutable maze description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
    player_spawn: CellCoord,
    adversary_spawns: Vec<CellCoord>,
    home: Option<CellCoord>,
}

impl Layout {
    /// Parses a layout from its textual form.
    ///
    /// Blank lines before and after the maze are ignored; every other line is a
    /// row and must have the same width.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        let first = lines.iter().position(|line| !line.trim().is_empty());
        let last = lines.iter().rposition(|line| !line.trim().is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return Err(LayoutError::Empty);
        };
        let lines = &lines[first..=last];

        let expected = lines[0].chars().count();
        let mut cells = Vec::with_capacity(expected * lines.len());
        let mut player_spawns = Vec::new();
        let mut adversary_spawns = Vec::new();
        let mut homes = Vec::new();

        for (row, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(LayoutError::Ragged {
                    row,
                    expected,
                    found,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                let cell = CellCoord::new(column as i32, row as i32);
                let kind = match glyph {
                    '#' => CellKind::Wall,
                    '%' => CellKind::BreakableWall,
                    ' ' => CellKind::Open,
                    '.' => CellKind::Collectible,
                    'o' => CellKind::PowerCollectible,
                    '-' => CellKind::AdversaryHome,
                    'H' => {
                        homes.push(cell);
                        CellKind::AdversaryHome
                    }
                    'P' => {
                        player_spawns.push(cell);
                        CellKind::PlayerSpawn
                    }
                    'G' => {
                        adversary_spawns.push(cell);
                        CellKind::AdversarySpawn
                    }
                    _ => return Err(LayoutError::UnknownGlyph { glyph, column, row }),
                };
                cells.push(kind);
            }
        }

        let columns = expected;
        let rows = lines.len();
        for row in [0, rows - 1] {
            for column in 0..columns {
                if cells[row * columns + column] != CellKind::Wall {
                    return Err(LayoutError::OpenBorder { column, row });
                }
            }
        }
        for row in 0..rows {
            let left = cells[row * columns] == CellKind::Wall;
            let right = cells[row * columns + columns - 1] == CellKind::Wall;
            if left != right {
                return Err(LayoutError::UnpairedTunnel { row });
            }
        }

        if player_spawns.len() != 1 {
            return Err(LayoutError::PlayerSpawnCount {
                found: player_spawns.len(),
            });
        }
        if adversary_spawns.len() > MAX_ADVERSARIES {
            return Err(LayoutError::TooManyAdversaries {
                found: adversary_spawns.len(),
            });
        }
        if homes.len() > 1 {
            return Err(LayoutError::MultipleHomes { found: homes.len() });
        }

        let home = homes
            .first()
            .copied()
            .or_else(|| adversary_spawns.first().copied());

        Ok(Self {
            columns: columns as u32,
            rows: rows as u32,
            cells,
            player_spawn: player_spawns[0],
            adversary_spawns,
            home,
        })
    }

    /// Built-in 19x21 maze with a central tunnel and four adversaries.
    #[must_use]
    pub fn standard() -> Self {
        Self::parse(STANDARD_LAYOUT).expect("standard layout is well formed")
    }

    /// Number of columns in the maze.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the maze.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile the player starts on.
    #[must_use]
    pub const fn player_spawn(&self) -> CellCoord {
        self.player_spawn
    }

    /// Tiles the adversaries start on, in reading order.
    #[must_use]
    pub fn adversary_spawns(&self) -> &[CellCoord] {
        &self.adversary_spawns
    }

    /// Tile eaten adversaries return to, if the maze has adversaries.
    #[must_use]
    pub const fn home(&self) -> Option<CellCoord> {
        self.home
    }
}

/// Mutable per-session copy of a layout's cells.
#[derive(Clone, Debug)]
pub struct GridMap {
    columns: u32,
    rows: u32,
    cells: Vec<CellKind>,
}

impl GridMap {
    /// Creates a pristine overlay of the provided layout.
    #[must_use]
    pub fn new(layout: &Layout) -> Self {
        Self {
            columns: layout.columns,
            rows: layout.rows,
            cells: layout.cells.clone(),
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Kind of the cell; anything outside the grid reads as a wall.
    #[must_use]
    pub fn cell_at(&self, cell: CellCoord) -> CellKind {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(CellKind::Wall)
    }

    /// Kind of the cell as seen by a moving entity.
    ///
    /// Identical to [`GridMap::cell_at`] except that tiles horizontally beyond
    /// the grid on a tunnel row read as open.
    #[must_use]
    pub fn passage_at(&self, cell: CellCoord) -> CellKind {
        if self.index(cell).is_some() {
            return self.cell_at(cell);
        }
        if self.is_tunnel_row(cell.row()) {
            CellKind::Open
        } else {
            CellKind::Wall
        }
    }

    /// Reports whether an entity may travel through the cell.
    #[must_use]
    pub fn is_passable(&self, cell: CellCoord, breach_capable: bool) -> bool {
        match self.passage_at(cell) {
            CellKind::Wall => false,
            CellKind::BreakableWall => breach_capable,
            _ => true,
        }
    }

    /// Reports whether the row's edge cells open onto a wrap-around tunnel.
    #[must_use]
    pub fn is_tunnel_row(&self, row: i32) -> bool {
        let Ok(row_index) = u32::try_from(row) else {
            return false;
        };
        if row_index >= self.rows || self.columns == 0 {
            return false;
        }
        let last = self.columns as i32 - 1;
        self.cell_at(CellCoord::new(0, row)) != CellKind::Wall
            && self.cell_at(CellCoord::new(last, row)) != CellKind::Wall
    }

    /// Removes a collectible, reporting which kind was consumed.
    pub fn consume(&mut self, cell: CellCoord) -> Option<CellKind> {
        let index = self.index(cell)?;
        let slot = self.cells.get_mut(index)?;
        if !slot.is_collectible() {
            return None;
        }
        let consumed = *slot;
        *slot = CellKind::Open;
        Some(consumed)
    }

    /// Opens a breakable wall. The caller checks breach eligibility.
    pub fn breach(&mut self, cell: CellCoord) -> bool {
        let Some(slot) = self.index(cell).and_then(|index| self.cells.get_mut(index)) else {
            return false;
        };
        if *slot != CellKind::BreakableWall {
            return false;
        }
        *slot = CellKind::Open;
        true
    }

    /// Reports whether any collectible of either kind remains.
    #[must_use]
    pub fn has_remaining_collectibles(&self) -> bool {
        self.cells.iter().any(|kind| kind.is_collectible())
    }

    /// Number of collectibles of either kind still in the maze.
    #[must_use]
    pub fn remaining_collectibles(&self) -> usize {
        self.cells.iter().filter(|kind| kind.is_collectible()).count()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        usize::try_from(row * self.columns + column).ok()
    }
}
