mod app;
mod session;
mod stats;

pub use app::MazeGame;
pub use session::{
    BASE_MAZE_SIZE, GameSession, GameStatus, MAZE_SIZE_STEP, StepOutcome, maze_size_for_level,
};
pub use stats::{HISTORY_LIMIT, StatsTracker};
