//! Text encoding of movement queries and their replies.
//!
//! A query is a whitespace-delimited line whose first token is the action keyword, a direction,
//! followed by a position made of two integers. Replies are the bare words `exit`, `wall` and
//! `pass`.

use std::{fmt, str::FromStr};

use crate::{
    cell::{Direction, UnknownDirection},
    maze::Position,
};

/// Errors raised while decoding a query line.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The line holds no tokens at all.
    #[error("empty message")]
    Empty,
    /// Fewer than two coordinate tokens follow the action.
    #[error("action `{action}` is missing a position")]
    MissingPosition {
        /// The action keyword that was read.
        action: String,
    },
    /// A coordinate token is not a non-negative integer.
    #[error("invalid coordinate `{0}`")]
    InvalidCoordinate(String),
    /// More than two coordinate tokens follow the action.
    #[error("unexpected trailing tokens after position: `{0}`")]
    TrailingTokens(String),
}

/// A tokenised message: an action keyword and its parameters.
///
/// A message line is split on whitespace. The first token becomes the action and every following
/// token becomes a parameter, so runs of spaces and tabs never produce empty parameters. The
/// parameters can be read either as a token list or rejoined into a single string, depending on
/// what the consumer expects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// First token of the line.
    action: String,
    /// Remaining tokens in order.
    parameters: Vec<String>,
}

impl Message {
    /// The action keyword.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The parameters as a list of tokens.
    #[must_use]
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// The parameters rejoined into one string with single spaces.
    #[must_use]
    pub fn joined_parameters(&self) -> String {
        self.parameters.join(" ")
    }
}

impl FromStr for Message {
    type Err = ParseError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let mut tokens = content.split_whitespace();
        let action = tokens.next().ok_or(ParseError::Empty)?.to_owned();
        let parameters = tokens.map(str::to_owned).collect();

        Ok(Self { action, parameters })
    }
}

/// Order in which the two integers of a position parameter are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateOrder {
    /// `row column`.
    #[default]
    RowColumn,
    /// `column row`.
    ColumnRow,
}

impl CoordinateOrder {
    /// Reads a position from a parameter string in this order.
    ///
    /// # Errors
    ///
    /// - [`ParseError::MissingPosition`] if fewer than two tokens are present; `action` names the
    ///   query in the error.
    /// - [`ParseError::InvalidCoordinate`] if a token is not a non-negative integer.
    /// - [`ParseError::TrailingTokens`] if more than two tokens are present.
    pub fn decode(self, action: &str, parameters: &str) -> Result<Position, ParseError> {
        let mut tokens = parameters.split_whitespace();
        let (Some(first), Some(second)) = (tokens.next(), tokens.next()) else {
            return Err(ParseError::MissingPosition {
                action: action.to_owned(),
            });
        };
        let rest: Vec<&str> = tokens.collect();
        if !rest.is_empty() {
            return Err(ParseError::TrailingTokens(rest.join(" ")));
        }

        let first = parse_coordinate(first)?;
        let second = parse_coordinate(second)?;

        Ok(match self {
            Self::RowColumn => Position::new(first, second),
            Self::ColumnRow => Position::new(second, first),
        })
    }

    /// Writes a position in this order.
    #[must_use]
    pub fn encode(self, position: Position) -> String {
        match self {
            Self::RowColumn => format!("{} {}", position.row, position.column),
            Self::ColumnRow => format!("{} {}", position.column, position.row),
        }
    }
}

/// Parses a single coordinate token.
fn parse_coordinate(token: &str) -> Result<usize, ParseError> {
    token
        .parse()
        .map_err(|_err| ParseError::InvalidCoordinate(token.to_owned()))
}

/// The direction named by a query's action keyword.
///
/// Unknown keywords are kept rather than rejected: they never match a wall or the exit but the
/// query is otherwise served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Heading {
    /// One of the four directions.
    Known(Direction),
    /// Any other keyword.
    Unknown(String),
}

impl Heading {
    /// Returns the direction, if the keyword named one.
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        match self {
            Self::Known(direction) => Some(*direction),
            Self::Unknown(_) => None,
        }
    }
}

impl From<&str> for Heading {
    fn from(token: &str) -> Self {
        token
            .parse()
            .map_or_else(|UnknownDirection(other)| Self::Unknown(other), Self::Known)
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(direction) => formatter.write_str(direction.as_str()),
            Self::Unknown(token) => formatter.write_str(token),
        }
    }
}

/// A request to move in a direction from a stated position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    /// Requested direction.
    pub heading: Heading,
    /// Cell the explorer claims to stand on.
    pub position: Position,
}

impl Query {
    /// Creates a query for a known direction.
    #[must_use]
    pub const fn new(direction: Direction, position: Position) -> Self {
        Self {
            heading: Heading::Known(direction),
            position,
        }
    }

    /// Decodes a query line whose position is written in `order`.
    ///
    /// This function accepts any action keyword. Keywords that do not name a [`Direction`] end up
    /// as [`Heading::Unknown`], and it is up to the coordinator to decide how to serve them.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`] raised while tokenising the line or reading the position.
    pub fn parse(content: &str, order: CoordinateOrder) -> Result<Self, ParseError> {
        let message: Message = content.parse()?;
        let position = order.decode(message.action(), &message.joined_parameters())?;

        Ok(Self {
            heading: Heading::from(message.action()),
            position,
        })
    }

    /// Encodes the query as a line with the position written in `order`.
    #[must_use]
    pub fn encode(&self, order: CoordinateOrder) -> String {
        format!("{} {}", self.heading, order.encode(self.position))
    }
}

/// A reply sent back to an explorer.
///
/// A served query receives its replies in a fixed order: `exit` when applicable, then `wall`
/// when applicable, then always `pass`. A dropped query receives none of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Response {
    /// The explorer stands on the exit cell and faces the exit side.
    Exit,
    /// The explorer's cell is walled in the requested direction.
    Wall,
    /// Sent after every served query.
    Pass,
}

impl Response {
    /// The wire keyword of this reply.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::Wall => "wall",
            Self::Pass => "pass",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
