//! Rendering of maze and explorer snapshots.

use std::collections::BTreeMap;

use color_eyre::eyre::{OptionExt as _, Result};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        canvas::{Canvas, Context, Points},
        Block, BorderType, Borders, Clear,
    },
    Frame,
};

use crate::{
    cell::Direction,
    maze::{Maze, Position},
    App,
};

/// Narrowest the status line is allowed to get, in terminal cells.
const STATUS_MIN_WIDTH: usize = 48;

/// Renders one frame from fresh maze and position snapshots.
///
/// # Errors
///
/// This function may return errors from coordinate conversions when the maze does not fit the
/// `u16` terminal geometry, or from layout lookups.
pub(crate) fn draw(app: &App, frame: &mut Frame) -> Result<()> {
    clear(frame);

    let maze = app.view.maze();
    let positions = app.view.explorer_positions();
    let (grid_rows, grid_columns) = point_grid_size(&maze);

    let overall_layout = Layout::vertical([
        Constraint::Min(1),    // Maze and padding area
        Constraint::Length(3), // Status block
    ])
    .split(frame.area());

    let maze_content_area = *overall_layout
        .first()
        .ok_or_eyre("failed to get maze content area from layout")?;
    let status_full_area = *overall_layout
        .last()
        .ok_or_eyre("failed to get status area from layout")?;

    let status_area = centered(
        status_full_area,
        u16::try_from(grid_columns.max(STATUS_MIN_WIDTH))?,
    )?;

    let maze_area = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(grid_rows)?),
        Constraint::Min(1),
    ])
    .split(maze_content_area)
    .get(1)
    .copied()
    .ok_or_eyre("failed to get maze area from layout")?;
    let space = centered(maze_area, u16::try_from(grid_columns)?)?;

    let wall_coords = to_canvas_coords(&wall_points(&maze), grid_rows, grid_columns)?;
    let explorer_coords = to_canvas_coords(
        &explorer_points(positions.values().copied()),
        grid_rows,
        grid_columns,
    )?;

    frame.render_widget(points_canvas(space, &wall_coords, Color::Green), space);
    frame.render_widget(points_canvas(space, &explorer_coords, Color::Red), space);

    let status_block = Block::bordered()
        .title("(q) quit")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green))
        .border_type(BorderType::Plain)
        .borders(Borders::TOP);
    let status_line =
        Line::raw(status_text(&maze, &positions, app.scoreboard.escaped())).centered();

    frame.render_widget(status_line, status_block.inner(status_area));
    frame.render_widget(status_block, status_area);

    Ok(())
}

/// Clears the terminal screen by rendering a [`Clear`] widget.
pub(crate) fn clear(frame: &mut Frame) {
    let clear = Clear;
    frame.render_widget(clear, frame.area());
}

/// Returns the horizontal middle `width` cells of `area`.
fn centered(area: Rect, width: u16) -> Result<Rect> {
    Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(width),
        Constraint::Min(1),
    ])
    .split(area)
    .get(1)
    .copied()
    .ok_or_eyre("failed to get centered area from horizontal layout")
}

/// Builds a dot canvas spanning `space` with one point per terminal cell.
fn points_canvas<'coords>(
    space: Rect,
    coords: &'coords [(f64, f64)],
    color: Color,
) -> Canvas<'coords, impl Fn(&mut Context<'_>) + 'coords> {
    Canvas::default()
        .x_bounds([
            (-rounded_div::i32(space.width.into(), 2)).into(),
            (rounded_div::i32(space.width.into(), 2)).into(),
        ])
        .y_bounds([
            (-rounded_div::i32(space.height.into(), 2)).into(),
            (rounded_div::i32(space.height.into(), 2)).into(),
        ])
        .marker(Marker::Dot)
        .paint(move |ctx| {
            ctx.draw(&Points { coords, color });
        })
}

/// Size of the point grid as `(rows, columns)`.
///
/// Every cell becomes one point with a point of wall on each side, and neighbouring cells share
/// the wall point between them.
pub(crate) const fn point_grid_size(maze: &Maze) -> (usize, usize) {
    (2 * maze.lines() + 1, 2 * maze.columns() + 1)
}

/// Point-grid coordinates, as `(column, row)`, of every wall segment and wall corner.
pub(crate) fn wall_points(maze: &Maze) -> Vec<(usize, usize)> {
    let (grid_rows, grid_columns) = point_grid_size(maze);
    let mut points: Vec<(usize, usize)> = (0..grid_rows)
        .step_by(2)
        .flat_map(|row| (0..grid_columns).step_by(2).map(move |col| (col, row)))
        .collect();

    for position in maze.positions() {
        let Some(cell) = maze.cell(position) else {
            continue;
        };
        let (col, row) = cell_point(position);
        for side in Direction::ALL {
            if cell.has_wall(side) {
                points.push(match side {
                    Direction::Up => (col, row - 1),
                    Direction::Down => (col, row + 1),
                    Direction::Left => (col - 1, row),
                    Direction::Right => (col + 1, row),
                });
            }
        }
    }

    points.sort_unstable();
    points.dedup();
    points
}

/// Point-grid coordinates, as `(column, row)`, of the given explorer cells.
pub(crate) fn explorer_points<I>(positions: I) -> Vec<(usize, usize)>
where
    I: IntoIterator<Item = Position>,
{
    positions.into_iter().map(cell_point).collect()
}

/// Point-grid coordinate of a cell's centre.
const fn cell_point(position: Position) -> (usize, usize) {
    (2 * position.column + 1, 2 * position.row + 1)
}

/// Transforms point-grid coordinates to canvas coordinates.
///
/// Converts `(col, row)` pairs using coordinate[i] = (n - 1) / 2 - i for rows and coordinate[i] =
/// i - (n - 1) / 2 for columns, which centres the grid on the canvas origin.
///
/// # Errors
///
/// This function may return errors from coordinate conversion operations.
pub(crate) fn to_canvas_coords(
    points: &[(usize, usize)],
    grid_rows: usize,
    grid_columns: usize,
) -> Result<Vec<(f64, f64)>> {
    let rows_n = f64::from(u16::try_from(grid_rows)?);
    let cols_n = f64::from(u16::try_from(grid_columns)?);

    points
        .iter()
        .map(|&(col, row)| {
            let screen_y = (rows_n - 1.) / 2. - f64::from(u16::try_from(row)?);
            let screen_x = f64::from(u16::try_from(col)?) - (cols_n - 1.) / 2.;

            Ok((screen_x, screen_y))
        })
        .collect()
}

/// Text of the status line.
fn status_text(maze: &Maze, positions: &BTreeMap<String, Position>, escaped: usize) -> String {
    let exit = maze.exit();
    format!(
        "explorers {}  escaped {}  exit {} {}",
        positions.len(),
        escaped,
        exit.position,
        exit.side
    )
}
