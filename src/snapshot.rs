use serde::{Deserialize, Serialize};

use crate::game::GameStatus;
use crate::input::Direction;
use crate::snake::Position;

/// Immutable copy of everything a front end needs to draw one frame.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Body cells, head first.
    pub snake_body: Vec<Position>,
    pub food_position: Position,
    pub direction: Direction,
    pub score: u32,
    pub highscore: u32,
    pub game_state: GameStatus,
    pub grid_width: u16,
    pub grid_height: u16,
    pub cell_size: u16,
}

impl Snapshot {
    #[must_use]
    pub fn head(&self) -> Option<Position> {
        self.snake_body.first().copied()
    }
}
