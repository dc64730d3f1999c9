//! Wall-flag representation of a single maze cell and the four movement directions.

use std::{fmt, str::FromStr};

/// One of the four sides of a cell, which doubles as a movement direction.
///
/// The textual form of each variant (`up`, `down`, `left`, `right`) is the action keyword used by
/// explorers in movement queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Towards row zero.
    Up,
    /// Towards the last row.
    Down,
    /// Towards column zero.
    Left,
    /// Towards the last column.
    Right,
}

impl Direction {
    /// All four directions, in the order the wall upgrade visits them.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Returns the side facing this one from the neighbouring cell.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Returns the protocol keyword for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Bit used for this side inside a [`Cell`].
    const fn bit(self) -> u8 {
        match self {
            Self::Up => 0b0001,
            Self::Down => 0b0010,
            Self::Left => 0b0100,
            Self::Right => 0b1000,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a token does not name one of the four directions.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction token `{0}`")]
pub struct UnknownDirection(pub String);

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(UnknownDirection(other.to_owned())),
        }
    }
}

/// Wall flags of one grid cell.
///
/// Each of the four sides carries an independent flag. The flags are packed into a single byte so
/// the grid stays compact and a cell can be copied freely out of a shared maze.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Packed wall flags, one bit per [`Direction`].
    walls: u8,
}

impl Cell {
    /// A cell with no walls on any side.
    pub const OPEN: Self = Self { walls: 0 };

    /// A cell walled on every side.
    pub const CLOSED: Self = Self { walls: 0b1111 };

    /// Builds a cell walled on exactly the given sides.
    ///
    /// Sides may be repeated in `sides`; a repeated side is simply walled once.
    #[must_use]
    pub fn with_walls(sides: &[Direction]) -> Self {
        let mut cell = Self::OPEN;
        for side in sides {
            cell.set_wall(*side, true);
        }
        cell
    }

    /// Returns whether the given side is walled.
    #[must_use]
    pub const fn has_wall(self, side: Direction) -> bool {
        self.walls & side.bit() != 0
    }

    /// Sets or clears the wall flag on the given side.
    pub fn set_wall(&mut self, side: Direction, walled: bool) {
        if walled {
            self.walls |= side.bit();
        } else {
            self.walls &= !side.bit();
        }
    }

    /// Number of walled sides.
    #[must_use]
    pub const fn wall_count(self) -> u32 {
        self.walls.count_ones()
    }

    /// Returns whether every side other than `side` is walled.
    ///
    /// An exit carved on `side` of such a cell would lead nowhere, which is what the exit carving
    /// retry guards against.
    #[must_use]
    pub fn enclosed_except(self, side: Direction) -> bool {
        Direction::ALL
            .into_iter()
            .filter(|other| *other != side)
            .all(|other| self.has_wall(other))
    }
}
