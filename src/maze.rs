//! Immutable maze topology produced by the generator.
//!
//! A [`Maze`] is a row-major grid of [`Cell`]s plus the single [`Exit`] carved into its boundary.
//! Once built it is never mutated, which lets the coordinator and the viewer share it behind an
//! [`Arc`](std::sync::Arc) without any locking.

use std::{collections::VecDeque, fmt};

use crate::{
    cell::{Cell, Direction},
    generator::{self, GenerationError},
};

/// Grid coordinate of a cell, row first.
///
/// This structure is the shared currency of positions across the crate: the generator places the
/// exit with it, explorers state where they stand with it and the coordinator records it in the
/// position table. Rows grow downwards and columns grow to the right, both starting at zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Zero-based row index.
    pub row: usize,
    /// Zero-based column index.
    pub column: usize,
}

impl Position {
    /// Creates a position from a row and a column.
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.row, self.column)
    }
}

/// The boundary cell and side through which the maze can be left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Exit {
    /// Boundary cell holding the exit.
    pub position: Position,
    /// Side of that cell whose wall was removed.
    pub side: Direction,
}

/// A fully generated maze.
///
/// Invariants upheld by [`MazeGenerator`](crate::generator::MazeGenerator): every boundary side is
/// walled except the exit, internal walls are mirrored on both adjacent cells, and every cell can
/// reach the exit cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    /// Number of rows.
    lines: usize,
    /// Number of columns.
    columns: usize,
    /// Row-major cell storage of length `lines * columns`.
    cells: Vec<Cell>,
    /// The carved exit.
    exit: Exit,
}

impl Maze {
    /// Assembles a maze from row-major cells.
    ///
    /// This function only checks the shape of its input: the dimensions, the length of the cell
    /// storage and the placement of the exit. It does not check that the walls form a perfect
    /// maze; that is the generator's job, and [`Maze::unreachable_cells`] can be used to verify it.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::TooSmall`] if either dimension is below two.
    /// - [`GenerationError::TooLarge`] if either dimension exceeds
    ///   [`MAX_DIMENSION`](crate::generator::MAX_DIMENSION).
    /// - [`GenerationError::CellCountMismatch`] if `cells` does not hold `lines * columns` entries.
    /// - [`GenerationError::ExitOutOfBounds`] if the exit does not lie inside the grid.
    pub fn new(
        lines: usize,
        columns: usize,
        cells: Vec<Cell>,
        exit: Exit,
    ) -> Result<Self, GenerationError> {
        let expected = generator::cell_count(lines, columns)?;
        if cells.len() != expected {
            return Err(GenerationError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }

        let maze = Self {
            lines,
            columns,
            cells,
            exit,
        };
        if !maze.contains(exit.position) {
            return Err(GenerationError::ExitOutOfBounds(exit.position));
        }

        Ok(maze)
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// The carved exit.
    #[must_use]
    pub const fn exit(&self) -> Exit {
        self.exit
    }

    /// Returns whether `position` lies inside the grid.
    #[must_use]
    pub const fn contains(&self, position: Position) -> bool {
        position.row < self.lines && position.column < self.columns
    }

    /// Returns the cell at `position`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<Cell> {
        self.contains(position)
            .then(|| self.cells.get(position.row * self.columns + position.column))
            .flatten()
            .copied()
    }

    /// Returns whether the cell at `position` is walled on `side`, or `None` outside the grid.
    #[must_use]
    pub fn is_wall(&self, position: Position, side: Direction) -> Option<bool> {
        self.cell(position).map(|cell| cell.has_wall(side))
    }

    /// Returns the in-bounds neighbour of `position` across `side`.
    ///
    /// This function ignores walls entirely, so a neighbour is returned even when the shared side
    /// is walled. It returns `None` when stepping across `side` would leave the grid.
    #[must_use]
    pub fn neighbour(&self, position: Position, side: Direction) -> Option<Position> {
        neighbour_within(self.lines, self.columns, position, side)
    }

    /// Iterates over every position of the grid in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.lines)
            .flat_map(move |row| (0..self.columns).map(move |column| Position::new(row, column)))
    }

    /// Returns every cell that cannot reach the exit cell through open sides.
    ///
    /// The search is a breadth-first flood fill from the exit cell, stepping only through sides
    /// that are open on both cells. A correctly generated maze yields an empty list.
    #[must_use]
    pub fn unreachable_cells(&self) -> Vec<Position> {
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([self.exit.position]);
        if let Some(seen) = visited.get_mut(self.index(self.exit.position)) {
            *seen = true;
        }

        while let Some(current) = queue.pop_front() {
            for side in Direction::ALL {
                if self.is_wall(current, side) != Some(false) {
                    continue;
                }
                let Some(next) = self.neighbour(current, side) else {
                    continue;
                };
                if self.is_wall(next, side.opposite()) != Some(false) {
                    continue;
                }
                if let Some(seen) = visited.get_mut(self.index(next)) {
                    if !*seen {
                        *seen = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        self.positions()
            .zip(visited)
            .filter_map(|(position, seen)| (!seen).then_some(position))
            .collect()
    }

    /// Row-major index of an in-bounds position.
    const fn index(&self, position: Position) -> usize {
        position.row * self.columns + position.column
    }
}

/// Returns the neighbour of `position` across `side` inside a `lines` by `columns` grid.
pub(crate) fn neighbour_within(
    lines: usize,
    columns: usize,
    position: Position,
    side: Direction,
) -> Option<Position> {
    let Position { row, column } = position;
    let next = match side {
        Direction::Up => Position::new(row.checked_sub(1)?, column),
        Direction::Down => Position::new(row + 1, column),
        Direction::Left => Position::new(row, column.checked_sub(1)?),
        Direction::Right => Position::new(row, column + 1),
    };

    (next.row < lines && next.column < columns).then_some(next)
}
