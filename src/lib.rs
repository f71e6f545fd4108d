//! Grid Snake - a single-player snake game for the terminal
//!
//! This library provides:
//! - Core game logic (game module): the tick state machine and its commands
//! - A single owned tick source (scheduler module)
//! - Keyboard mapping (input module) and TUI rendering (render module)
//! - The interactive session tying them together (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
pub mod scheduler;
