use std::rc::Rc;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::info;

use crate::{
    error::GameError,
    maze::Direction,
    rating::{DefaultRating, RatingPolicy},
    storage::{KeyValueStore, models::LevelResult},
};

use super::{
    session::{GameSession, GameStatus, StepOutcome},
    stats::StatsTracker,
};

/// Owns the session and the statistics and routes level outcomes between them.
///
/// Wins become [`LevelResult`]s, losses are counted, and resetting mid-level
/// is treated as abandonment and not recorded.
pub struct MazeGame<R = StdRng> {
    session: GameSession<R>,
    stats: StatsTracker,
    rating: Box<dyn RatingPolicy>,
}

impl MazeGame<StdRng> {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        Self::with_parts(
            GameSession::new(store.clone()),
            StatsTracker::new(store),
            Box::new(DefaultRating),
        )
    }
}

impl<R: Rng> MazeGame<R> {
    pub fn with_parts(
        session: GameSession<R>,
        stats: StatsTracker,
        rating: Box<dyn RatingPolicy>,
    ) -> Self {
        Self {
            session,
            stats,
            rating,
        }
    }

    pub fn session(&self) -> &GameSession<R> {
        &self.session
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        self.session.start_level()
    }

    pub fn tick(&mut self, dt: Duration) {
        self.session.tick(dt);
    }

    /// Move the player; escaping the maze records the level result.
    pub fn step(&mut self, direction: Direction) -> Result<StepOutcome, GameError> {
        let outcome = self.session.step(direction)?;
        if outcome == StepOutcome::Escaped {
            self.record_victory();
        }
        Ok(outcome)
    }

    /// Declare the level won without walking to the exit.
    pub fn win(&mut self) -> Result<LevelResult, GameError> {
        self.session.win()?;
        Ok(self.record_victory())
    }

    pub fn lose(&mut self) -> Result<(), GameError> {
        self.session.lose()?;
        self.stats.record_loss();
        Ok(())
    }

    pub fn next_level(&mut self) -> Result<(), GameError> {
        self.session.next_level()
    }

    pub fn retry(&mut self) -> Result<(), GameError> {
        self.session.retry()
    }

    pub fn reset(&mut self) {
        if self.session.status() == GameStatus::Playing {
            info!("Level {} abandoned", self.session.level());
        }
        self.session.reset_game();
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.session.toggle_mute()
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset_stats();
    }

    fn record_victory(&mut self) -> LevelResult {
        let level = self.session.level();
        let size = self.session.maze_size();
        let time = self.session.elapsed().as_secs();
        let par_time = self.rating.par_time(level, size);
        let stars = self.rating.stars(time, par_time);

        let result = LevelResult::completed_now(
            level,
            size,
            time,
            self.session.moves(),
            par_time,
            stars,
        );
        info!(
            "Level {} cleared in {}s, {} moves, {} star(s)",
            level, time, result.moves, stars
        );

        self.stats.add_result(result.clone());
        result
    }
}
