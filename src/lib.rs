//! Grid-based Snake game engine.
//!
//! The [`game::Engine`] owns the board and advances it one tick at a time.
//! Callers that share one engine between request handlers wrap it in a
//! [`session::GameSession`], which serializes every operation and hands back
//! an immutable [`snapshot::Snapshot`].

pub mod config;
pub mod food;
pub mod game;
pub mod input;
pub mod score;
pub mod session;
pub mod snake;
pub mod snapshot;
