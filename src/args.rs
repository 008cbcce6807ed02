use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "maze-quest", about = "Escape ever larger generated mazes")]
pub struct Args {
    /// SQLite database holding best time and statistics
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Keep everything in memory; nothing is saved
    #[arg(long, global = true, conflicts_with = "db")]
    pub ephemeral: bool,

    /// Seed for reproducible mazes
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play levels interactively (default)
    Play,
    /// Print a single generated maze
    Generate {
        /// Grid size, odd and at least 5
        #[arg(long, default_value_t = 11)]
        size: usize,
    },
    /// Show stored statistics
    Stats,
    /// Clear stored statistics
    ResetStats,
}
