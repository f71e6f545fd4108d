//! Core game logic module for Snake
//!
//! This module contains all the game logic without any I/O or rendering dependencies.
//! The engine is driven by commands and ticks; anything that draws or schedules
//! only reads its state.

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::{Command, Direction};
pub use config::{GameConfig, Speed};
pub use engine::{GameEngine, TickOutcome};
pub use state::{CollisionType, GameOutcome, GameState, Phase, Position, Snake};
