use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::config::{ConfigError, EngineConfig};
use crate::game::{Engine, RecordOutcome, TickOutcome};
use crate::score::HighScoreStore;
use crate::snapshot::Snapshot;

/// One long-lived game shared by concurrent callers.
///
/// Each operation holds the lock for its whole read-modify-write and returns
/// the resulting state, so callers never observe a half-applied tick.
#[derive(Debug)]
pub struct GameSession<S> {
    engine: Mutex<Engine<S>>,
}

impl<S: HighScoreStore> GameSession<S> {
    pub fn new(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        Ok(Self::from_engine(Engine::new(config, store)?))
    }

    #[must_use]
    pub fn from_engine(engine: Engine<S>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    pub fn reset(&self) -> Snapshot {
        self.with_engine(Engine::reset)
    }

    pub fn start(&self) -> Snapshot {
        self.with_engine(Engine::start)
    }

    /// Fresh board, immediately playing.
    pub fn restart(&self) -> Snapshot {
        self.with_engine(|engine| {
            engine.reset();
            engine.start();
        })
    }

    pub fn toggle_pause(&self) -> Snapshot {
        self.with_engine(Engine::toggle_pause)
    }

    /// Queues a direction given as a wire token; unknown tokens are ignored.
    pub fn set_direction(&self, token: &str) -> Snapshot {
        self.with_engine(|engine| {
            engine.set_direction_token(token);
        })
    }

    /// Runs one tick and reports a high score that could not be persisted.
    pub fn update(&self) -> Snapshot {
        self.with_engine(|engine| {
            if let TickOutcome::GameOver {
                record: RecordOutcome::SaveFailed { score, error },
                ..
            } = engine.update()
            {
                warn!(score, %error, "high score kept in memory only");
            }
        })
    }

    #[must_use]
    pub fn state(&self) -> Snapshot {
        self.lock().snapshot()
    }

    #[must_use]
    pub fn high_score(&self) -> u32 {
        self.lock().high_score()
    }

    /// Consumes the session and returns the engine.
    pub fn into_inner(self) -> Engine<S> {
        self.engine.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_engine(&self, operation: impl FnOnce(&mut Engine<S>)) -> Snapshot {
        let mut engine = self.lock();
        operation(&mut *engine);
        engine.snapshot()
    }

    fn lock(&self) -> MutexGuard<'_, Engine<S>> {
        // Every operation leaves the engine consistent before it can panic,
        // so a poisoned lock still guards a usable board.
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
