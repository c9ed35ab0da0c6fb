use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{
    CELL_SIZE, ConfigError, EngineConfig, FOOD_REWARD, GridSize, INITIAL_SNAKE_LENGTH,
};
use crate::food::spawn_position;
use crate::input::Direction;
use crate::score::{HighScoreStore, ScoreError};
use crate::snake::{Position, Snake};
use crate::snapshot::Snapshot;

/// Current high-level gameplay state.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Idle,
    Playing,
    Paused,
    GameOver,
}

impl GameStatus {
    /// Wire token for this state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::GameOver => "game_over",
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum GameOverCause {
    Wall,
    SelfCollision,
    /// The snake covers every cell, so no food can be placed.
    BoardFilled,
}

/// What happened to the high score when a game ended.
#[derive(Debug)]
pub enum RecordOutcome {
    /// The final score did not beat the record.
    Unchanged,
    /// A new record was set and persisted.
    Saved(u32),
    /// A new record was set in memory but could not be persisted.
    SaveFailed { score: u32, error: ScoreError },
}

/// Result of one call to [`Engine::update`].
#[derive(Debug)]
pub enum TickOutcome {
    /// The engine was not playing; nothing changed.
    Skipped,
    Moved,
    Ate,
    GameOver {
        cause: GameOverCause,
        record: RecordOutcome,
    },
}

/// The single authoritative board: snake, food, score and lifecycle.
///
/// Every operation is infallible. Requests that make no sense in the current
/// state are ignored.
#[derive(Debug)]
pub struct Engine<S> {
    pub snake: Snake,
    pub food: Position,
    pub score: u32,
    pub status: GameStatus,
    high_score: u32,
    bounds: GridSize,
    rng: StdRng,
    store: S,
}

impl<S: HighScoreStore> Engine<S> {
    /// Builds an engine in the `Idle` state with a fresh board.
    ///
    /// The stored high score is read once here. An unreadable store is
    /// logged and treated as having no record.
    pub fn new(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        let bounds = config.grid.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let high_score = store.load().unwrap_or_else(|error| {
            warn!(%error, "could not load high score, starting from zero");
            0
        });

        let mut engine = Self {
            snake: initial_snake(bounds),
            food: Position::default(),
            score: 0,
            status: GameStatus::Idle,
            high_score,
            bounds,
            rng,
            store,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates a deterministic engine for tests and reproducible simulations.
    pub fn new_with_seed(bounds: GridSize, seed: u64, store: S) -> Result<Self, ConfigError> {
        Self::new(
            EngineConfig {
                grid: bounds,
                seed: Some(seed),
            },
            store,
        )
    }

    /// Reinitializes body, direction, score and food, and returns to `Idle`.
    ///
    /// The high score is kept.
    pub fn reset(&mut self) {
        self.snake = initial_snake(self.bounds);
        self.score = 0;
        self.status = GameStatus::Idle;
        if !self.place_food() {
            warn!("no free cell for food after reset");
        }
        debug!(head = ?self.snake.head(), food = ?self.food, "board reset");
    }

    /// Starts play from `Idle` or `GameOver`; ignored otherwise.
    pub fn start(&mut self) {
        if matches!(self.status, GameStatus::Idle | GameStatus::GameOver) {
            self.transition(GameStatus::Playing);
        }
    }

    /// Flips between `Playing` and `Paused`; ignored otherwise.
    pub fn toggle_pause(&mut self) {
        match self.status {
            GameStatus::Playing => self.transition(GameStatus::Paused),
            GameStatus::Paused => self.transition(GameStatus::Playing),
            GameStatus::Idle | GameStatus::GameOver => {}
        }
    }

    /// Queues `direction` for the next tick unless it reverses the snake.
    ///
    /// Accepted in every state; a request made while paused is applied on the
    /// first tick after resuming.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        let accepted = self.snake.buffer_direction(direction);
        if !accepted {
            debug!(%direction, current = %self.snake.direction(), "reversal ignored");
        }
        accepted
    }

    /// Like [`Engine::set_direction`], taking a wire token. Unknown tokens
    /// are ignored.
    pub fn set_direction_token(&mut self, token: &str) -> bool {
        match token.parse::<Direction>() {
            Ok(direction) => self.set_direction(direction),
            Err(error) => {
                debug!(%error, "direction request ignored");
                false
            }
        }
    }

    /// Advances the simulation by one tick while `Playing`.
    pub fn update(&mut self) -> TickOutcome {
        if self.status != GameStatus::Playing {
            return TickOutcome::Skipped;
        }

        self.snake.commit_direction();
        let new_head = self.snake.next_head_position();

        if let Some(cause) = self.collision_at(new_head) {
            return self.finish(cause);
        }

        self.snake.push_head(new_head);

        if new_head == self.food {
            self.score = self.score.saturating_add(FOOD_REWARD);
            debug!(score = self.score, length = self.snake.len(), "food eaten");
            if !self.place_food() {
                return self.finish(GameOverCause::BoardFilled);
            }
            return TickOutcome::Ate;
        }

        self.snake.pop_tail();
        TickOutcome::Moved
    }

    /// Returns an immutable copy of the full game state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake_body: self.snake.segments().copied().collect(),
            food_position: self.food,
            direction: self.snake.direction(),
            score: self.score,
            highscore: self.high_score,
            game_state: self.status,
            grid_width: self.bounds.width,
            grid_height: self.bounds.height,
            cell_size: CELL_SIZE,
        }
    }

    /// Best score seen by this engine or loaded from the store.
    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    #[must_use]
    pub fn bounds(&self) -> GridSize {
        self.bounds
    }

    /// Returns the high-score store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn collision_at(&self, position: Position) -> Option<GameOverCause> {
        if !position.is_within_bounds(self.bounds) {
            return Some(GameOverCause::Wall);
        }
        if self.snake.collides_with_body(position) {
            return Some(GameOverCause::SelfCollision);
        }
        None
    }

    fn finish(&mut self, cause: GameOverCause) -> TickOutcome {
        self.transition(GameStatus::GameOver);
        info!(?cause, score = self.score, "game over");
        let record = self.record_high_score();
        TickOutcome::GameOver { cause, record }
    }

    fn record_high_score(&mut self) -> RecordOutcome {
        if self.score <= self.high_score {
            return RecordOutcome::Unchanged;
        }

        self.high_score = self.score;
        match self.store.save(self.score) {
            Ok(()) => {
                info!(high_score = self.high_score, "new high score");
                RecordOutcome::Saved(self.score)
            }
            Err(error) => {
                warn!(%error, high_score = self.high_score, "failed to save high score");
                RecordOutcome::SaveFailed {
                    score: self.score,
                    error,
                }
            }
        }
    }

    fn place_food(&mut self) -> bool {
        match spawn_position(&mut self.rng, self.bounds, &self.snake) {
            Some(position) => {
                self.food = position;
                true
            }
            None => false,
        }
    }

    fn transition(&mut self, next: GameStatus) {
        debug!(from = self.status.as_str(), to = next.as_str(), "status change");
        self.status = next;
    }
}

/// Horizontal starting snake, head in the centre column facing right.
///
/// On grids too narrow for the centred body the head shifts right until
/// the tail fits.
fn initial_snake(bounds: GridSize) -> Snake {
    let min_head_x = i32::try_from(INITIAL_SNAKE_LENGTH - 1).unwrap_or(i32::MAX);
    let head = Position {
        x: (i32::from(bounds.width) / 2).max(min_head_x),
        y: i32::from(bounds.height) / 2,
    };
    Snake::new(head, Direction::Right, INITIAL_SNAKE_LENGTH)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::config::{EngineConfig, GridSize};
    use crate::input::Direction;
    use crate::score::{HighScoreStore, MemoryStore, ScoreError};
    use crate::snake::{Position, Snake};

    use super::{Engine, GameOverCause, GameStatus, RecordOutcome, TickOutcome};

    fn engine(width: u16, height: u16, seed: u64) -> Engine<MemoryStore> {
        Engine::new_with_seed(GridSize { width, height }, seed, MemoryStore::default())
            .expect("grid should be valid")
    }

    fn playing(width: u16, height: u16, seed: u64) -> Engine<MemoryStore> {
        let mut engine = engine(width, height, seed);
        engine.start();
        engine
    }

    #[test]
    fn reset_places_centred_snake_facing_right() {
        let engine = engine(20, 20, 1);

        let body: Vec<Position> = engine.snake.segments().copied().collect();
        assert_eq!(
            body,
            vec![
                Position::new(10, 10),
                Position::new(9, 10),
                Position::new(8, 10)
            ]
        );
        assert_eq!(engine.snake.direction(), Direction::Right);
        assert_eq!(engine.snake.next_direction(), Direction::Right);
        assert_eq!(engine.status, GameStatus::Idle);
        assert_eq!(engine.score, 0);
        assert!(!engine.snake.occupies(engine.food));
    }

    #[test]
    fn reset_is_valid_on_every_small_grid() {
        for width in 3..=9 {
            for height in 3..=9 {
                let bounds = GridSize { width, height };
                let engine = engine(width, height, u64::from(width * 31 + height));

                let cells: HashSet<Position> = engine.snake.segments().copied().collect();
                assert_eq!(engine.snake.len(), 3, "{width}x{height}");
                assert_eq!(cells.len(), 3, "{width}x{height}");
                assert!(cells.iter().all(|cell| cell.is_within_bounds(bounds)));
                assert!(engine.food.is_within_bounds(bounds));
                assert!(!cells.contains(&engine.food));
            }
        }
    }

    #[test]
    fn too_small_grid_is_rejected() {
        let result = Engine::new(
            EngineConfig {
                grid: GridSize {
                    width: 20,
                    height: 2,
                },
                seed: None,
            },
            MemoryStore::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn reset_restores_idle_board_and_keeps_high_score() {
        let mut engine = Engine::new_with_seed(
            GridSize {
                width: 10,
                height: 10,
            },
            5,
            MemoryStore::with_high_score(70),
        )
        .expect("grid should be valid");
        engine.start();
        engine.set_direction(Direction::Up);
        engine.update();
        engine.score = 30;

        engine.reset();

        assert_eq!(engine.status, GameStatus::Idle);
        assert_eq!(engine.score, 0);
        assert_eq!(engine.snake.head(), Position::new(5, 5));
        assert_eq!(engine.snake.direction(), Direction::Right);
        assert_eq!(engine.high_score(), 70);
    }

    #[test]
    fn start_only_leaves_idle_or_game_over() {
        let mut engine = engine(10, 10, 2);
        engine.start();
        assert_eq!(engine.status, GameStatus::Playing);

        engine.toggle_pause();
        engine.start();
        assert_eq!(engine.status, GameStatus::Paused);

        engine.status = GameStatus::GameOver;
        engine.start();
        assert_eq!(engine.status, GameStatus::Playing);
    }

    #[test]
    fn toggle_pause_ignored_outside_play() {
        let mut engine = engine(10, 10, 3);
        engine.toggle_pause();
        assert_eq!(engine.status, GameStatus::Idle);

        engine.status = GameStatus::GameOver;
        engine.toggle_pause();
        assert_eq!(engine.status, GameStatus::GameOver);
    }

    #[test]
    fn reversal_and_unknown_tokens_are_ignored() {
        let mut engine = playing(10, 10, 4);

        assert!(!engine.set_direction_token("left"));
        assert_eq!(engine.snake.next_direction(), Direction::Right);

        assert!(!engine.set_direction_token("invalid"));
        assert_eq!(engine.snake.next_direction(), Direction::Right);

        assert!(engine.set_direction_token("up"));
        assert_eq!(engine.snake.next_direction(), Direction::Up);
    }

    #[test]
    fn update_is_a_no_op_unless_playing() {
        for status in [GameStatus::Idle, GameStatus::Paused, GameStatus::GameOver] {
            let mut engine = engine(10, 10, 6);
            engine.status = status;
            let before = engine.snapshot();

            assert!(matches!(engine.update(), TickOutcome::Skipped));
            assert_eq!(engine.snapshot(), before, "{status:?}");
        }
    }

    #[test]
    fn snake_moves_one_cell_per_tick() {
        let mut engine = playing(10, 10, 7);
        engine.food = Position::new(0, 0);

        assert!(matches!(engine.update(), TickOutcome::Moved));

        let body: Vec<Position> = engine.snake.segments().copied().collect();
        assert_eq!(
            body,
            vec![Position::new(6, 5), Position::new(5, 5), Position::new(4, 5)]
        );
    }

    #[test]
    fn eating_food_scores_and_grows() {
        let mut engine = playing(10, 10, 8);
        let head = engine.snake.head();
        engine.food = head.step(Direction::Right);

        assert!(matches!(engine.update(), TickOutcome::Ate));

        assert_eq!(engine.score, 10);
        assert_eq!(engine.snake.len(), 4);
        assert_eq!(engine.snake.head(), head.step(Direction::Right));
        assert!(!engine.snake.occupies(engine.food));
    }

    #[test]
    fn snake_collision_with_wall_sets_game_over() {
        let mut engine = playing(20, 20, 9);
        engine.snake = Snake::from_segments(
            vec![
                Position::new(19, 5),
                Position::new(18, 5),
                Position::new(17, 5),
            ],
            Direction::Right,
        );
        engine.food = Position::new(0, 0);
        let before = engine.snake.clone();

        let outcome = engine.update();

        assert!(matches!(
            outcome,
            TickOutcome::GameOver {
                cause: GameOverCause::Wall,
                record: RecordOutcome::Unchanged
            }
        ));
        assert_eq!(engine.status, GameStatus::GameOver);
        assert_eq!(engine.snake, before);
        assert_eq!(engine.food, Position::new(0, 0));
    }

    #[test]
    fn snake_collision_with_self_sets_game_over() {
        let mut engine = playing(6, 6, 10);
        engine.snake = Snake::from_segments(
            vec![
                Position::new(2, 2),
                Position::new(1, 2),
                Position::new(1, 3),
                Position::new(2, 3),
                Position::new(3, 3),
                Position::new(3, 2),
            ],
            Direction::Down,
        );

        let outcome = engine.update();

        assert!(matches!(
            outcome,
            TickOutcome::GameOver {
                cause: GameOverCause::SelfCollision,
                ..
            }
        ));
        assert_eq!(engine.status, GameStatus::GameOver);
    }

    #[test]
    fn head_may_follow_into_vacating_tail() {
        let mut engine = playing(6, 6, 11);
        engine.snake = Snake::from_segments(
            vec![
                Position::new(1, 1),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(1, 2),
            ],
            Direction::Down,
        );
        engine.food = Position::new(5, 5);

        assert!(matches!(engine.update(), TickOutcome::Moved));
        assert_eq!(engine.status, GameStatus::Playing);
        assert_eq!(engine.snake.head(), Position::new(1, 2));
        assert_eq!(engine.snake.len(), 4);
    }

    #[test]
    fn high_score_only_grows_and_is_saved_once_per_record() {
        let mut engine = playing(10, 10, 12);
        engine.food = engine.snake.head().step(Direction::Right);
        engine.update();
        engine.snake = Snake::from_segments(
            vec![Position::new(9, 0), Position::new(8, 0)],
            Direction::Right,
        );

        let outcome = engine.update();
        assert!(matches!(
            outcome,
            TickOutcome::GameOver {
                record: RecordOutcome::Saved(10),
                ..
            }
        ));
        assert_eq!(engine.high_score(), 10);

        engine.reset();
        engine.start();
        engine.set_direction(Direction::Up);
        let mut outcome = engine.update();
        while matches!(outcome, TickOutcome::Moved | TickOutcome::Ate) {
            outcome = engine.update();
        }

        assert_eq!(engine.status, GameStatus::GameOver);
        assert!(engine.high_score() >= 10);
        assert_eq!(engine.high_score(), engine.store().stored());
        assert_eq!(engine.snapshot().highscore, engine.high_score());
    }

    #[test]
    fn failed_save_keeps_record_in_memory() {
        let mut engine = Engine::new_with_seed(
            GridSize {
                width: 10,
                height: 10,
            },
            13,
            MemoryStore::failing(),
        )
        .expect("grid should be valid");
        engine.start();
        engine.score = 40;
        engine.snake = Snake::from_segments(vec![Position::new(9, 9)], Direction::Right);

        let outcome = engine.update();

        assert!(matches!(
            outcome,
            TickOutcome::GameOver {
                record: RecordOutcome::SaveFailed { score: 40, .. },
                ..
            }
        ));
        assert_eq!(engine.high_score(), 40);
        assert_eq!(engine.status, GameStatus::GameOver);
    }

    #[test]
    fn pause_and_resume_preserve_the_board() {
        let mut engine = playing(10, 10, 14);
        engine.update();
        let before = engine.snapshot();

        engine.toggle_pause();
        assert_eq!(engine.status, GameStatus::Paused);
        engine.toggle_pause();

        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn direction_queued_while_paused_applies_after_resume() {
        let mut engine = playing(10, 10, 15);
        engine.food = Position::new(0, 0);
        engine.toggle_pause();

        engine.set_direction(Direction::Down);
        engine.update();
        assert_eq!(engine.snake.head(), Position::new(5, 5));
        assert_eq!(engine.snake.direction(), Direction::Right);

        engine.toggle_pause();
        engine.update();
        assert_eq!(engine.snake.head(), Position::new(5, 6));
        assert_eq!(engine.snake.direction(), Direction::Down);
    }

    #[test]
    fn filling_the_board_ends_the_game() {
        let mut engine = playing(3, 3, 16);
        engine.snake = Snake::from_segments(
            vec![
                Position::new(2, 1),
                Position::new(2, 0),
                Position::new(1, 0),
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 1),
                Position::new(1, 2),
                Position::new(0, 2),
            ],
            Direction::Down,
        );
        engine.food = Position::new(2, 2);

        let outcome = engine.update();

        assert!(matches!(
            outcome,
            TickOutcome::GameOver {
                cause: GameOverCause::BoardFilled,
                record: RecordOutcome::Saved(10)
            }
        ));
        assert_eq!(engine.snake.len(), 9);
        assert_eq!(engine.score, 10);
        assert_eq!(engine.status, GameStatus::GameOver);
    }

    #[test]
    fn unreadable_store_starts_from_zero() {
        struct BrokenStore;

        impl HighScoreStore for BrokenStore {
            fn load(&self) -> Result<u32, ScoreError> {
                Err(ScoreError::Unavailable)
            }

            fn save(&mut self, _score: u32) -> Result<(), ScoreError> {
                Err(ScoreError::Unavailable)
            }
        }

        let engine = Engine::new(EngineConfig::default(), BrokenStore).expect("default grid");
        assert_eq!(engine.high_score(), 0);
    }

    #[test]
    fn stored_record_is_loaded_at_construction() {
        let engine = Engine::new(EngineConfig::default(), MemoryStore::with_high_score(120))
            .expect("default grid");
        assert_eq!(engine.high_score(), 120);
        assert_eq!(engine.snapshot().highscore, 120);
    }
}
