use thiserror::Error;

use crate::game::GameStatus;

/// Contract violations reported by the maze generator and the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Maze sizes must be odd and at least [`crate::maze::MIN_MAZE_SIZE`].
    #[error("invalid maze size {0}: must be odd and at least 5")]
    InvalidMazeSize(usize),
    /// An action was requested from a status that does not allow it.
    #[error("cannot {action} while {status}")]
    InvalidTransition {
        action: &'static str,
        status: GameStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            GameError::InvalidMazeSize(4).to_string(),
            "invalid maze size 4: must be odd and at least 5"
        );
        let err = GameError::InvalidTransition {
            action: "win",
            status: GameStatus::Idle,
        };
        assert_eq!(err.to_string(), "cannot win while idle");
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = GameError::InvalidMazeSize(6).into();
        assert!(err.downcast_ref::<GameError>().is_some());
    }
}
