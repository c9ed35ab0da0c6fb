use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical movement directions for snake input.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns the opposite direction.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Unit offset applied to the head for one step.
    #[must_use]
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// Wire token for this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized direction token.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("unknown direction `{0}`")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(ParseDirectionError(other.to_owned())),
        }
    }
}

/// Returns whether a direction change is legal (no immediate 180° turns).
#[must_use]
pub fn direction_change_is_valid(current: Direction, next: Direction) -> bool {
    next != current.opposite()
}

/// One line of driver input.
///
/// Direction tokens are kept raw so that unknown ones reach the engine and
/// are ignored there, exactly like a malformed network request would be.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    Reset,
    Start,
    Restart,
    Pause,
    Direction(String),
    Tick(u32),
    State,
    HighScore,
    Quit,
}

/// Driver line that does not name a command.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseCommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(ParseCommandError::Empty);
        };
        let head = head.to_ascii_lowercase();

        let command = match head.as_str() {
            "reset" => Self::Reset,
            "start" => Self::Start,
            "restart" => Self::Restart,
            "pause" => Self::Pause,
            "state" => Self::State,
            "highscore" => Self::HighScore,
            "quit" | "exit" => Self::Quit,
            "dir" | "direction" => {
                let token = words.next().ok_or(ParseCommandError::BadArgument {
                    command: "direction",
                    expected: "a direction token",
                })?;
                Self::Direction(token.to_ascii_lowercase())
            }
            "tick" => match words.next() {
                None => Self::Tick(1),
                Some(count) => {
                    Self::Tick(count.parse().map_err(|_| ParseCommandError::BadArgument {
                        command: "tick",
                        expected: "a tick count",
                    })?)
                }
            },
            "up" | "down" | "left" | "right" => Self::Direction(head),
            _ => return Err(ParseCommandError::Unknown(head)),
        };

        if words.next().is_some() {
            return Err(ParseCommandError::BadArgument {
                command: "command",
                expected: "no trailing arguments",
            });
        }

        Ok(command)
    }
}
