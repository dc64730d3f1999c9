//! Recursive-division maze generation.
//!
//! The generator carves walls into an initially open grid by repeatedly splitting rectangular
//! regions with a wall that has a single gap in it. Because every split leaves exactly one
//! passage between the two halves, the result is a perfect maze: every cell is reachable and
//! there is exactly one path between any two cells. After the carve, the outer border is walled,
//! one-sided walls are mirrored onto their neighbours, and one boundary side is opened as the exit.

use std::cmp::Ordering;

use rand::{rngs::SmallRng, Rng, SeedableRng as _};
use tracing::{debug, warn};

use crate::{
    cell::{Cell, Direction},
    maze::{self, Exit, Maze, Position},
};

/// Upper bound on exit positions tried before the last candidate is accepted as is.
pub const MAX_EXIT_ATTEMPTS: usize = 32;

/// Largest row or column count a maze may have.
///
/// This keeps the cell storage allocation reasonable and lets the viewer's `2n + 1` point grid
/// fit into the `u16` terminal geometry.
pub const MAX_DIMENSION: usize = 1024;

/// Errors raised while building a maze.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The requested grid cannot hold a maze.
    #[error("a maze needs at least 2x2 cells, got {lines}x{columns}")]
    TooSmall {
        /// Requested row count.
        lines: usize,
        /// Requested column count.
        columns: usize,
    },
    /// The requested grid is larger than [`MAX_DIMENSION`] along some axis, or its cell count
    /// does not fit in memory.
    #[error("a maze holds at most {max}x{max} cells, got {lines}x{columns}", max = MAX_DIMENSION)]
    TooLarge {
        /// Requested row count.
        lines: usize,
        /// Requested column count.
        columns: usize,
    },
    /// The cell storage does not match the grid dimensions.
    #[error("expected {expected} cells, got {actual}")]
    CellCountMismatch {
        /// Cells required by the dimensions.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },
    /// The exit does not lie inside the grid.
    #[error("exit {0} lies outside the grid")]
    ExitOutOfBounds(Position),
}

/// Checks that a `lines` by `columns` grid can hold a maze and returns its cell count.
///
/// # Errors
///
/// - [`GenerationError::TooSmall`] if either dimension is below two.
/// - [`GenerationError::TooLarge`] if either dimension exceeds [`MAX_DIMENSION`].
pub(crate) fn cell_count(lines: usize, columns: usize) -> Result<usize, GenerationError> {
    if lines < 2 || columns < 2 {
        return Err(GenerationError::TooSmall { lines, columns });
    }
    if lines > MAX_DIMENSION || columns > MAX_DIMENSION {
        return Err(GenerationError::TooLarge { lines, columns });
    }

    lines
        .checked_mul(columns)
        .ok_or(GenerationError::TooLarge { lines, columns })
}

/// Axis along which a region is split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Orientation {
    /// A horizontal wall splits the region into a top and a bottom half.
    Horizontal,
    /// A vertical wall splits the region into a left and a right half.
    Vertical,
}

/// Rectangular part of the grid still to be subdivided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Region {
    /// First row of the region.
    top: usize,
    /// First column of the region.
    left: usize,
    /// Row count, the region's height.
    height: usize,
    /// Column count, the region's width.
    width: usize,
}

/// Mutable cell grid used while a maze is being carved.
struct Grid {
    /// Number of rows.
    lines: usize,
    /// Number of columns.
    columns: usize,
    /// Row-major cells.
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid of `count` open cells, as returned by [`cell_count`].
    fn new(lines: usize, columns: usize, count: usize) -> Self {
        Self {
            lines,
            columns,
            cells: vec![Cell::OPEN; count],
        }
    }

    /// Returns the cell at `position`, if any.
    fn cell(&self, position: Position) -> Option<Cell> {
        (position.row < self.lines && position.column < self.columns)
            .then(|| self.cells.get(position.row * self.columns + position.column))
            .flatten()
            .copied()
    }

    /// Sets or clears one wall flag. Positions outside the grid are ignored.
    fn set_wall(&mut self, position: Position, side: Direction, walled: bool) {
        if position.row >= self.lines || position.column >= self.columns {
            return;
        }
        if let Some(cell) = self
            .cells
            .get_mut(position.row * self.columns + position.column)
        {
            cell.set_wall(side, walled);
        }
    }

    /// Walls the outward side of every boundary cell.
    fn attach_borders(&mut self) {
        let (last_row, last_column) = (self.lines - 1, self.columns - 1);
        for column in 0..self.columns {
            self.set_wall(Position::new(0, column), Direction::Up, true);
            self.set_wall(Position::new(last_row, column), Direction::Down, true);
        }
        for row in 0..self.lines {
            self.set_wall(Position::new(row, 0), Direction::Left, true);
            self.set_wall(Position::new(row, last_column), Direction::Right, true);
        }
    }

    /// Mirrors every wall onto the facing side of the neighbouring cell.
    ///
    /// Carving only marks one side of each wall; this pass makes every internal wall double-sided.
    fn upgrade_walls(&mut self) {
        for row in 0..self.lines {
            for column in 0..self.columns {
                let position = Position::new(row, column);
                let Some(cell) = self.cell(position) else {
                    continue;
                };
                for side in Direction::ALL {
                    if !cell.has_wall(side) {
                        continue;
                    }
                    if let Some(next) =
                        maze::neighbour_within(self.lines, self.columns, position, side)
                    {
                        self.set_wall(next, side.opposite(), true);
                    }
                }
            }
        }
    }
}

/// Maze generator driven by a random source.
///
/// The generator is deterministic for a given random source state, so seeding it with
/// [`MazeGenerator::seeded`] reproduces a maze exactly.
#[derive(Debug)]
pub struct MazeGenerator<R> {
    /// Source of every random decision made while carving.
    rng: R,
}

impl MazeGenerator<SmallRng> {
    /// Creates a generator with a small, seedable random source.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MazeGenerator<R> {
    /// Wraps an existing random source.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generates a `lines` by `columns` maze with a single exit.
    ///
    /// This function runs the whole pipeline on an open grid: recursive division, border
    /// attachment, wall upgrade and exit carving. The dimensions are checked before anything is
    /// allocated, so an unusable configuration is reported as an error rather than a panic. The
    /// finished maze is flood-filled from the exit and a warning is logged if any cell is cut off.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::TooSmall`] if either dimension is below two.
    /// - [`GenerationError::TooLarge`] if either dimension exceeds [`MAX_DIMENSION`].
    pub fn generate(&mut self, lines: usize, columns: usize) -> Result<Maze, GenerationError> {
        let count = cell_count(lines, columns)?;
        let mut grid = Grid::new(lines, columns, count);
        self.divide(
            &mut grid,
            Region {
                top: 0,
                left: 0,
                height: lines,
                width: columns,
            },
        );
        grid.attach_borders();
        grid.upgrade_walls();

        let side = self.exit_side();
        let exit = self.carve_exit(&mut grid, side);
        let maze = Maze::new(lines, columns, grid.cells, exit)?;

        let unreachable = maze.unreachable_cells();
        if !unreachable.is_empty() {
            warn!(count = unreachable.len(), "generated maze has unreachable cells");
        }
        debug!(lines, columns, exit = ?exit, "generated maze");

        Ok(maze)
    }

    /// Picks the split axis for a region: across the longer side, at random when square.
    fn orientation(&mut self, width: usize, height: usize) -> Orientation {
        match width.cmp(&height) {
            Ordering::Less => Orientation::Horizontal,
            Ordering::Greater => Orientation::Vertical,
            Ordering::Equal => {
                if self.rng.gen_bool(0.5) {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                }
            }
        }
    }

    /// Recursively splits `region` with single-gap walls.
    ///
    /// The wall is drawn on a random line strictly inside the region and a single random cell of
    /// it is left open. Horizontal walls are recorded on the `down` side of the cells above them
    /// and vertical walls on the `right` side of the cells to their left; the wall upgrade later
    /// mirrors them onto the facing cells.
    ///
    /// Regions narrower or shorter than two cells are left as they are.
    fn divide(&mut self, grid: &mut Grid, region: Region) {
        let orientation = self.orientation(region.width, region.height);
        if region.width < 2 || region.height < 2 {
            return;
        }

        let (first, second) = match orientation {
            Orientation::Horizontal => {
                let wall_row = region.top + self.rng.gen_range(0..region.height - 1);
                let gap = region.left + self.rng.gen_range(0..region.width);
                for column in (region.left..region.left + region.width).filter(|col| *col != gap)
                {
                    grid.set_wall(Position::new(wall_row, column), Direction::Down, true);
                }

                (
                    Region {
                        height: wall_row - region.top + 1,
                        ..region
                    },
                    Region {
                        top: wall_row + 1,
                        height: region.top + region.height - wall_row - 1,
                        ..region
                    },
                )
            }
            Orientation::Vertical => {
                let wall_column = region.left + self.rng.gen_range(0..region.width - 1);
                let gap = region.top + self.rng.gen_range(0..region.height);
                for row in (region.top..region.top + region.height).filter(|line| *line != gap) {
                    grid.set_wall(Position::new(row, wall_column), Direction::Right, true);
                }

                (
                    Region {
                        width: wall_column - region.left + 1,
                        ..region
                    },
                    Region {
                        left: wall_column + 1,
                        width: region.left + region.width - wall_column - 1,
                        ..region
                    },
                )
            }
        };

        self.divide(grid, first);
        self.divide(grid, second);
    }

    /// Picks the boundary side that will hold the exit.
    fn exit_side(&mut self) -> Direction {
        match self.rng.gen_range(0_u8..4) {
            1 => Direction::Down,
            2 => Direction::Left,
            3 => Direction::Right,
            _ => Direction::Up,
        }
    }

    /// Picks a random boundary cell along `side`.
    fn exit_candidate(&mut self, grid: &Grid, side: Direction) -> Position {
        match side {
            Direction::Up => Position::new(0, self.rng.gen_range(0..grid.columns)),
            Direction::Down => Position::new(grid.lines - 1, self.rng.gen_range(0..grid.columns)),
            Direction::Left => Position::new(self.rng.gen_range(0..grid.lines), 0),
            Direction::Right => Position::new(self.rng.gen_range(0..grid.lines), grid.columns - 1),
        }
    }

    /// Opens the boundary wall on `side` of a random cell along that side.
    ///
    /// Candidates whose other three sides are all walled are redrawn, up to
    /// [`MAX_EXIT_ATTEMPTS`] times; the last candidate is kept if none is better.
    fn carve_exit(&mut self, grid: &mut Grid, side: Direction) -> Exit {
        let mut position = self.exit_candidate(grid, side);
        let mut attempts = 1;
        while grid
            .cell(position)
            .is_some_and(|cell| cell.enclosed_except(side))
        {
            if attempts >= MAX_EXIT_ATTEMPTS {
                warn!(%position, %side, "no open exit candidate found, keeping enclosed cell");
                break;
            }
            debug!(%position, %side, "exit candidate is enclosed, retrying");
            position = self.exit_candidate(grid, side);
            attempts += 1;
        }

        grid.set_wall(position, side, false);
        Exit { position, side }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Returns the boundary sides of `maze` that are open.
    fn open_boundary_sides(maze: &Maze) -> Vec<(Position, Direction)> {
        let mut open = Vec::new();
        for position in maze.positions() {
            for side in Direction::ALL {
                if maze.neighbour(position, side).is_none()
                    && maze.is_wall(position, side) == Some(false)
                {
                    open.push((position, side));
                }
            }
        }
        open
    }

    /// Returns every internal pair whose facing wall flags disagree.
    fn unmirrored_walls(maze: &Maze) -> Vec<(Position, Direction)> {
        let mut mismatched = Vec::new();
        for position in maze.positions() {
            for side in Direction::ALL {
                if let Some(next) = maze.neighbour(position, side) {
                    if maze.is_wall(position, side) != maze.is_wall(next, side.opposite()) {
                        mismatched.push((position, side));
                    }
                }
            }
        }
        mismatched
    }

    /// Counts internal adjacencies open on both sides, each pair counted once.
    fn open_passages(maze: &Maze) -> usize {
        maze.positions()
            .flat_map(|position| {
                [Direction::Down, Direction::Right]
                    .into_iter()
                    .filter(move |side| {
                        maze.neighbour(position, *side).is_some()
                            && maze.is_wall(position, *side) == Some(false)
                    })
            })
            .count()
    }

    #[test]
    fn test_generate_rejects_small_grids() {
        let mut generator = MazeGenerator::seeded(7);

        assert_eq!(
            generator.generate(1, 5),
            Err(GenerationError::TooSmall {
                lines: 1,
                columns: 5
            })
        );
        assert_eq!(
            generator.generate(5, 0),
            Err(GenerationError::TooSmall {
                lines: 5,
                columns: 0
            })
        );
    }

    #[test]
    fn test_generate_rejects_oversized_grids() {
        let mut generator = MazeGenerator::seeded(1);

        assert_eq!(
            generator.generate(1 << 33, 1 << 33),
            Err(GenerationError::TooLarge {
                lines: 1 << 33,
                columns: 1 << 33
            })
        );
        assert_eq!(
            generator.generate(2, MAX_DIMENSION + 1),
            Err(GenerationError::TooLarge {
                lines: 2,
                columns: MAX_DIMENSION + 1
            })
        );
        assert_eq!(
            cell_count(usize::MAX, usize::MAX),
            Err(GenerationError::TooLarge {
                lines: usize::MAX,
                columns: usize::MAX
            })
        );
        assert_eq!(cell_count(MAX_DIMENSION, MAX_DIMENSION), Ok(1 << 20));
    }

    #[test]
    fn test_generate_default_size() {
        let maze = MazeGenerator::seeded(2018)
            .generate(21, 23)
            .expect("failed to generate maze");

        assert_eq!(maze.lines(), 21);
        assert_eq!(maze.columns(), 23);
        assert_eq!(
            open_boundary_sides(&maze),
            vec![(maze.exit().position, maze.exit().side)]
        );
        assert!(unmirrored_walls(&maze).is_empty());
        assert!(maze.unreachable_cells().is_empty());
    }

    #[test]
    fn test_same_seed_same_maze() {
        let first = MazeGenerator::seeded(42).generate(9, 13);
        let second = MazeGenerator::seeded(42).generate(9, 13);

        assert_eq!(first, second);
    }

    #[test]
    fn test_smallest_maze() {
        let maze = MazeGenerator::seeded(1)
            .generate(2, 2)
            .expect("failed to generate maze");

        assert_eq!(open_passages(&maze), 3);
        assert!(maze.unreachable_cells().is_empty());
    }

    #[test]
    fn test_orientation_follows_region_shape() {
        let mut generator = MazeGenerator::seeded(3);

        assert_eq!(generator.orientation(2, 5), Orientation::Horizontal);
        assert_eq!(generator.orientation(5, 2), Orientation::Vertical);
    }

    #[test]
    fn test_thin_regions_are_not_divided() {
        let mut generator = MazeGenerator::seeded(11);
        let mut grid = Grid::new(1, 6, 6);
        generator.divide(
            &mut grid,
            Region {
                top: 0,
                left: 0,
                height: 1,
                width: 6,
            },
        );
        assert!(grid.cells.iter().all(|cell| *cell == Cell::OPEN));

        let mut grid = Grid::new(6, 1, 6);
        generator.divide(
            &mut grid,
            Region {
                top: 0,
                left: 0,
                height: 6,
                width: 1,
            },
        );
        assert!(grid.cells.iter().all(|cell| *cell == Cell::OPEN));
    }

    #[test]
    fn test_division_line_has_single_gap() {
        let mut generator = MazeGenerator::seeded(5);
        let mut grid = Grid::new(2, 7, 2 * 7);
        generator.divide(
            &mut grid,
            Region {
                top: 0,
                left: 0,
                height: 2,
                width: 7,
            },
        );

        let vertical_walls: usize = grid
            .cells
            .iter()
            .filter(|cell| cell.has_wall(Direction::Right))
            .count();
        let horizontal_walls: usize = grid
            .cells
            .iter()
            .filter(|cell| cell.has_wall(Direction::Down))
            .count();

        // 19 internal edges, 13 of which stay open in a spanning tree of 14 cells.
        assert_eq!(vertical_walls + horizontal_walls, 6);
    }

    #[test]
    fn test_attach_borders_walls_every_outer_side() {
        let mut grid = Grid::new(3, 4, 3 * 4);
        grid.attach_borders();

        assert_eq!(
            grid.cell(Position::new(0, 0)),
            Some(Cell::with_walls(&[Direction::Up, Direction::Left]))
        );
        assert_eq!(
            grid.cell(Position::new(2, 3)),
            Some(Cell::with_walls(&[Direction::Down, Direction::Right]))
        );
        assert_eq!(
            grid.cell(Position::new(1, 2)),
            Some(Cell::OPEN),
            "interior cells stay open"
        );
    }

    #[test]
    fn test_upgrade_walls_mirrors_one_sided_walls() {
        let mut grid = Grid::new(2, 2, 2 * 2);
        grid.set_wall(Position::new(0, 0), Direction::Right, true);
        grid.set_wall(Position::new(1, 1), Direction::Up, true);
        grid.upgrade_walls();

        assert_eq!(
            grid.cell(Position::new(0, 1)),
            Some(Cell::with_walls(&[Direction::Left, Direction::Down]))
        );
        assert_eq!(
            grid.cell(Position::new(1, 0)),
            Some(Cell::OPEN),
            "cells without walled neighbours are untouched"
        );
    }

    #[test]
    fn test_carve_exit_skips_enclosed_candidates() {
        let mut generator = MazeGenerator::seeded(99);
        let mut grid = Grid::new(2, 3, 2 * 3);
        grid.attach_borders();
        // Top row: columns 0 and 2 are enclosed below and beside, column 1 is open below.
        for column in [0, 2] {
            for side in [Direction::Down, Direction::Left, Direction::Right] {
                grid.set_wall(Position::new(0, column), side, true);
            }
        }

        let exit = generator.carve_exit(&mut grid, Direction::Up);

        assert_eq!(exit.position, Position::new(0, 1));
        assert_eq!(exit.side, Direction::Up);
        assert_eq!(
            grid.cell(Position::new(0, 1))
                .map(|cell| cell.has_wall(Direction::Up)),
            Some(false)
        );
    }

    #[test]
    fn test_carve_exit_terminates_when_every_candidate_is_enclosed() {
        let mut generator = MazeGenerator::seeded(4);
        let mut grid = Grid::new(3, 2, 3 * 2);
        for cell in &mut grid.cells {
            *cell = Cell::CLOSED;
        }

        let exit = generator.carve_exit(&mut grid, Direction::Left);

        assert_eq!(exit.side, Direction::Left);
        assert_eq!(exit.position.column, 0);
        assert_eq!(
            grid.cell(exit.position)
                .map(|cell| cell.has_wall(Direction::Left)),
            Some(false)
        );
    }

    #[test]
    fn test_exit_side_covers_all_sides() {
        let mut generator = MazeGenerator::seeded(12);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let side = generator.exit_side();
            if !seen.contains(&side) {
                seen.push(side);
            }
        }
        seen.sort();

        assert_eq!(seen, Direction::ALL.to_vec());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_generated_mazes_hold_invariants(
            seed in any::<u64>(),
            lines in 2_usize..16,
            columns in 2_usize..16,
        ) {
            let maze = MazeGenerator::seeded(seed)
                .generate(lines, columns)
                .expect("failed to generate maze");
            let exit = maze.exit();

            prop_assert_eq!(open_boundary_sides(&maze), vec![(exit.position, exit.side)]);
            prop_assert!(unmirrored_walls(&maze).is_empty());
            prop_assert!(maze.unreachable_cells().is_empty());
            prop_assert_eq!(open_passages(&maze), lines * columns - 1);
        }
    }
}
