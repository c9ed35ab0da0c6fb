use thiserror::Error;

/// Default number of columns.
pub const DEFAULT_GRID_WIDTH: u16 = 20;

/// Default number of rows.
pub const DEFAULT_GRID_HEIGHT: u16 = 20;

/// Smallest accepted grid dimension on either axis.
pub const MIN_GRID_DIMENSION: u16 = 3;

/// Display size of one cell in pixels, reported to front ends.
pub const CELL_SIZE: u16 = 20;

/// Number of segments the snake starts with after a reset.
pub const INITIAL_SNAKE_LENGTH: usize = 3;

/// Score granted per food eaten.
pub const FOOD_REWARD: u32 = 10;

/// Logical grid dimensions passed through the game as a named type.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GridSize {
    pub width: u16,
    pub height: u16,
}

impl GridSize {
    /// Returns the total number of cells in the grid.
    #[must_use]
    pub fn total_cells(self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Rejects grids too small to hold the initial snake and a food cell.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.width < MIN_GRID_DIMENSION || self.height < MIN_GRID_DIMENSION {
            return Err(ConfigError::GridTooSmall {
                width: self.width,
                height: self.height,
                min: MIN_GRID_DIMENSION,
            });
        }
        Ok(self)
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
        }
    }
}

/// Construction-time engine settings.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct EngineConfig {
    pub grid: GridSize,
    /// Fixed RNG seed for reproducible food placement.
    pub seed: Option<u64>,
}

/// Invalid engine configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("grid {width}x{height} is too small (minimum {min}x{min})")]
    GridTooSmall { width: u16, height: u16, min: u16 },
}
