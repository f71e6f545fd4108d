use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::state::Position;

/// Tick speed tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    /// 160ms per tick
    Easy,
    /// 120ms per tick
    #[default]
    Normal,
    /// 80ms per tick
    Hard,
}

impl Speed {
    /// Get the tick interval for this speed
    pub fn tick_interval(&self) -> Duration {
        match self {
            Self::Easy => Duration::from_millis(160),
            Self::Normal => Duration::from_millis(120),
            Self::Hard => Duration::from_millis(80),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Hard => "Hard",
        }
    }
}

/// Configuration for the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub grid_width: usize,
    /// Height of the game grid
    pub grid_height: usize,
    /// Starting cell of the snake; derived from the grid size when absent
    pub start: Option<Position>,
    /// Initial tick speed
    pub speed: Speed,
    /// Seed for food placement; random when absent
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            start: None,
            speed: Speed::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: GameConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }

    /// Cell the snake starts on after every reset
    pub fn start_position(&self) -> Position {
        self.start.unwrap_or_else(|| {
            Position::new(
                (self.grid_width * 2 / 5) as i32,
                (self.grid_height / 2) as i32,
            )
        })
    }

    pub fn cell_count(&self) -> usize {
        self.grid_width * self.grid_height
    }

    /// Check that the grid is usable and the start cell lies on it
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.grid_width > 0 && self.grid_height > 0,
            "grid must be at least 1x1, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            self.cell_count() >= 2,
            "grid must have room for food next to the snake, got {}x{}",
            self.grid_width,
            self.grid_height
        );
        ensure!(
            i32::try_from(self.grid_width).is_ok() && i32::try_from(self.grid_height).is_ok(),
            "grid {}x{} is too large",
            self.grid_width,
            self.grid_height
        );

        let start = self.start_position();
        ensure!(
            start.x >= 0
                && start.y >= 0
                && (start.x as usize) < self.grid_width
                && (start.y as usize) < self.grid_height,
            "start cell ({}, {}) is outside the {}x{} grid",
            start.x,
            start.y,
            self.grid_width,
            self.grid_height
        );

        Ok(())
    }
}
