//! Level progression and timing.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::{
    error::GameError,
    maze::{self, Direction, Maze, Position},
    storage::{BEST_TIME_KEY, KeyValueStore, models::UNSET_TIME},
};

/// Grid size of the first level.
pub const BASE_MAZE_SIZE: usize = 11;
/// Growth of the grid per level. Even, so every size stays odd.
pub const MAZE_SIZE_STEP: usize = 4;

/// Grid size for a 1-based level: 11, 15, 19, ...
pub fn maze_size_for_level(level: u32) -> usize {
    BASE_MAZE_SIZE + (level.max(1) as usize - 1) * MAZE_SIZE_STEP
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Idle,
    Playing,
    GameOver,
    Victory,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GameStatus::Idle => "idle",
            GameStatus::Playing => "playing",
            GameStatus::GameOver => "game over",
            GameStatus::Victory => "victory",
        };
        write!(f, "{}", s)
    }
}

/// What happened when the player tried to move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    Blocked,
    /// The move reached the exit and the level is won.
    Escaped,
}

/// State machine for one player's run through successive levels.
pub struct GameSession<R = StdRng> {
    status: GameStatus,
    level: u32,
    maze_size: usize,
    elapsed: Duration,
    best_time: u64,
    muted: bool,
    maze: Option<Maze>,
    player: Position,
    moves: u32,
    store: Rc<dyn KeyValueStore>,
    rng: R,
}

impl GameSession<StdRng> {
    /// Create an idle session with an entropy-seeded generator.
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        let seed: u64 = rand::random();
        info!("Maze generator seed: {}", seed);
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_rng(store: Rc<dyn KeyValueStore>, rng: R) -> Self {
        let best_time = load_best_time(store.as_ref());

        Self {
            status: GameStatus::Idle,
            level: 1,
            maze_size: maze_size_for_level(1),
            elapsed: Duration::ZERO,
            best_time,
            muted: false,
            maze: None,
            player: Position::new(1, 1),
            moves: 0,
            store,
            rng,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn maze_size(&self) -> usize {
        self.maze_size
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Best completion time in seconds, [`UNSET_TIME`] until a level is won.
    pub fn best_time(&self) -> u64 {
        self.best_time
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn maze(&self) -> Option<&Maze> {
        self.maze.as_ref()
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Enter `Playing` on a freshly generated maze for the current level.
    pub fn start_level(&mut self) -> Result<(), GameError> {
        let size = maze_size_for_level(self.level);
        let maze = maze::generate_with(size, &mut self.rng)?;

        self.status = GameStatus::Playing;
        self.elapsed = Duration::ZERO;
        self.maze_size = size;
        self.player = maze.entrance();
        self.moves = 0;
        self.maze = Some(maze);

        info!("Level {} started ({}x{})", self.level, size, size);
        Ok(())
    }

    pub fn win(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Playing, "win")?;
        self.status = GameStatus::Victory;

        let time = self.elapsed.as_secs();
        info!("Level {} won in {}s", self.level, time);

        if time < self.best_time {
            self.best_time = time;
            info!("New best time: {}s", time);
            if let Err(e) = self.store.set(BEST_TIME_KEY, &time.to_string()) {
                warn!("Failed to save best time: {:#}", e);
            }
        }

        Ok(())
    }

    pub fn lose(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Playing, "lose")?;
        self.status = GameStatus::GameOver;
        info!("Level {} lost after {}s", self.level, self.elapsed.as_secs());
        Ok(())
    }

    pub fn next_level(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::Victory, "advance")?;
        self.level += 1;
        self.start_level()
    }

    /// Replay the current level on a new maze after a loss.
    pub fn retry(&mut self) -> Result<(), GameError> {
        self.require(GameStatus::GameOver, "retry")?;
        info!("Retrying level {}", self.level);
        self.start_level()
    }

    pub fn reset_game(&mut self) {
        self.status = GameStatus::Idle;
        self.level = 1;
        self.maze_size = maze_size_for_level(1);
        self.elapsed = Duration::ZERO;
        self.maze = None;
        self.player = Position::new(1, 1);
        self.moves = 0;
        info!("Game reset");
    }

    /// Advance the level clock. Time only accrues while playing.
    pub fn tick(&mut self, dt: Duration) {
        if self.status == GameStatus::Playing {
            self.elapsed = self.elapsed.saturating_add(dt);
        }
    }

    pub fn step(&mut self, direction: Direction) -> Result<StepOutcome, GameError> {
        self.require(GameStatus::Playing, "move")?;

        let Some(maze) = self.maze.as_ref() else {
            return Ok(StepOutcome::Blocked);
        };

        let target = self
            .player
            .neighbor(direction, maze.size())
            .filter(|&p| maze.is_passage(p));

        let Some(target) = target else {
            return Ok(StepOutcome::Blocked);
        };

        let escaped = target == maze.exit();
        self.player = target;
        self.moves += 1;

        if escaped {
            self.win()?;
            return Ok(StepOutcome::Escaped);
        }

        Ok(StepOutcome::Moved)
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    fn require(&self, expected: GameStatus, action: &'static str) -> Result<(), GameError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                status: self.status,
            })
        }
    }
}

fn load_best_time(store: &dyn KeyValueStore) -> u64 {
    match store.get(BEST_TIME_KEY) {
        Ok(Some(text)) => text.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring malformed best time {:?}", text);
            UNSET_TIME
        }),
        Ok(None) => UNSET_TIME,
        Err(e) => {
            warn!("Failed to load best time: {:#}", e);
            UNSET_TIME
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FailingStore, MemoryStore};

    fn session_with(store: Rc<dyn KeyValueStore>) -> GameSession {
        GameSession::with_rng(store, StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_maze_size_for_level() {
        assert_eq!(maze_size_for_level(1), 11);
        assert_eq!(maze_size_for_level(2), 15);
        assert_eq!(maze_size_for_level(5), 27);
        for level in 1..40 {
            assert_eq!(maze_size_for_level(level) % 2, 1);
            assert!(maze_size_for_level(level + 1) > maze_size_for_level(level));
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session_with(Rc::new(MemoryStore::new()));

        assert_eq!(session.status(), GameStatus::Idle);
        assert_eq!(session.level(), 1);
        assert_eq!(session.maze_size(), 11);
        assert_eq!(session.best_time(), UNSET_TIME);
        assert!(session.maze().is_none());
        assert!(!session.muted());
    }

    #[test]
    fn test_best_time_loaded_from_store() {
        let store = Rc::new(MemoryStore::new());
        store.set(BEST_TIME_KEY, "42").unwrap();
        assert_eq!(session_with(store.clone()).best_time(), 42);

        store.set(BEST_TIME_KEY, "forty-two").unwrap();
        assert_eq!(session_with(store).best_time(), UNSET_TIME);
    }

    #[test]
    fn test_start_level_generates_maze() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        session.tick(Duration::from_secs(5));
        assert_eq!(session.elapsed(), Duration::ZERO);

        session.start_level().unwrap();

        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.elapsed(), Duration::ZERO);
        let maze = session.maze().unwrap();
        assert_eq!(maze.size(), 11);
        assert_eq!(session.player(), maze.entrance());
    }

    #[test]
    fn test_win_requires_playing() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        assert_eq!(
            session.win(),
            Err(GameError::InvalidTransition {
                action: "win",
                status: GameStatus::Idle
            })
        );
        assert_eq!(session.status(), GameStatus::Idle);
        assert!(session.lose().is_err());
        assert!(session.next_level().is_err());
        assert!(session.retry().is_err());
    }

    #[test]
    fn test_win_records_and_persists_best_time() {
        let store = Rc::new(MemoryStore::new());
        let mut session = session_with(store.clone());

        session.start_level().unwrap();
        session.tick(Duration::from_millis(30_400));
        session.win().unwrap();

        assert_eq!(session.status(), GameStatus::Victory);
        assert_eq!(session.best_time(), 30);
        assert_eq!(store.get(BEST_TIME_KEY).unwrap().as_deref(), Some("30"));

        session.next_level().unwrap();
        session.tick(Duration::from_secs(45));
        session.win().unwrap();
        assert_eq!(session.best_time(), 30);
        assert_eq!(store.get(BEST_TIME_KEY).unwrap().as_deref(), Some("30"));
    }

    #[test]
    fn test_best_time_survives_write_failure() {
        let mut session = session_with(Rc::new(FailingStore::default()));

        session.start_level().unwrap();
        session.tick(Duration::from_secs(12));
        session.win().unwrap();

        assert_eq!(session.status(), GameStatus::Victory);
        assert_eq!(session.best_time(), 12);
    }

    #[test]
    fn test_next_level_grows_maze() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        session.start_level().unwrap();
        session.win().unwrap();
        session.next_level().unwrap();

        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.level(), 2);
        assert_eq!(session.maze_size(), 15);
        assert_eq!(session.maze().map(Maze::size), Some(15));
    }

    #[test]
    fn test_lose_then_retry_same_level() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        session.start_level().unwrap();
        session.win().unwrap();
        session.next_level().unwrap();
        session.tick(Duration::from_secs(9));
        session.lose().unwrap();

        assert_eq!(session.status(), GameStatus::GameOver);
        assert!(session.next_level().is_err());

        session.retry().unwrap();
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.level(), 2);
        assert_eq!(session.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_reset_from_every_state() {
        let mut session = session_with(Rc::new(MemoryStore::new()));

        session.start_level().unwrap();
        session.reset_game();
        assert_eq!((session.status(), session.level()), (GameStatus::Idle, 1));

        session.start_level().unwrap();
        session.lose().unwrap();
        session.reset_game();
        assert_eq!((session.status(), session.level()), (GameStatus::Idle, 1));

        session.start_level().unwrap();
        session.win().unwrap();
        session.next_level().unwrap();
        session.win().unwrap();
        assert_eq!(session.level(), 2);
        session.reset_game();
        assert_eq!((session.status(), session.level()), (GameStatus::Idle, 1));
        assert_eq!(session.maze_size(), 11);
        assert!(session.maze().is_none());
    }

    #[test]
    fn test_step_blocked_by_wall() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        assert!(session.step(Direction::Up).is_err());

        session.start_level().unwrap();
        // (0, 1) is on the outer ring
        assert_eq!(session.step(Direction::Up).unwrap(), StepOutcome::Blocked);
        assert_eq!(session.player(), Position::new(1, 1));
        assert_eq!(session.moves(), 0);
    }

    #[test]
    fn test_walking_to_exit_wins() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        session.start_level().unwrap();

        let maze = session.maze().unwrap().clone();
        let path = maze.shortest_path(maze.entrance(), maze.exit()).unwrap();
        let (last, steps) = path.split_last().unwrap();

        for pair in steps.windows(2) {
            let dir = Direction::between(pair[0], pair[1]).unwrap();
            assert_eq!(session.step(dir).unwrap(), StepOutcome::Moved);
        }
        let final_dir = Direction::between(steps[steps.len() - 1], *last).unwrap();
        assert_eq!(session.step(final_dir).unwrap(), StepOutcome::Escaped);

        assert_eq!(session.status(), GameStatus::Victory);
        assert_eq!(session.player(), maze.exit());
        assert_eq!(session.moves() as usize, path.len() - 1);
        assert!(session.step(Direction::Up).is_err());
    }

    #[test]
    fn test_toggle_mute() {
        let mut session = session_with(Rc::new(MemoryStore::new()));
        assert!(session.toggle_mute());
        assert!(!session.toggle_mute());
    }
}
