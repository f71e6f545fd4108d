use anyhow::{Context, Result};
use clap::Parser;
use grid_snake::game::{GameConfig, Speed};
use grid_snake::modes::HumanMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grid_snake")]
#[command(version, about = "Single-player grid snake for the terminal")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    width: Option<usize>,

    /// Grid height
    #[arg(long)]
    height: Option<usize>,

    /// Initial tick speed
    #[arg(long, value_enum)]
    speed: Option<Speed>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    /// Merge the config file (if any) with command line overrides
    fn resolve_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };

        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        config.validate().context("Invalid game configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let mut human_mode = HumanMode::new(config);
    human_mode.run().await?;

    Ok(())
}
