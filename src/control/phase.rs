//! Game phase and the command transition table

use crate::game::{Direction, is_valid_board_size};
use crate::ipc::Command;

/// Top-level phase of the game loop
///
/// The discriminants are the values published in shared memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum GamePhase {
    #[default]
    Menu = 0,
    Playing = 1,
    Paused = 2,
    GameOver = 3,
    Quit = 4,
}

impl GamePhase {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(GamePhase::Menu),
            1 => Some(GamePhase::Playing),
            2 => Some(GamePhase::Paused),
            3 => Some(GamePhase::GameOver),
            4 => Some(GamePhase::Quit),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == GamePhase::Quit
    }
}

/// What the orchestrator should do with a command in a given phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Not valid in this phase; drop it silently
    Ignore,
    /// Reset the round and enter `Playing`
    StartRound,
    /// Remember the direction for the next step
    QueueDirection(Direction),
    Quit,
    /// Rebuild the board at the new size, then start a round
    ResizeAndStart { width: u8, height: u8 },
}

/// Map a remote command onto the phase transition table
///
/// | Phase    | StartGame | Move*   | RestartGame | QuitGame | ChangeBoardSize   |
/// |----------|-----------|---------|-------------|----------|-------------------|
/// | Menu     | start     | ignored | ignored     | quit     | resize (if valid) |
/// | Playing  | ignored   | queue   | start       | quit     | ignored           |
/// | Paused   | ignored   | ignored | ignored     | quit     | ignored           |
/// | GameOver | start     | ignored | start       | quit     | ignored           |
///
/// `Quit` ignores everything.
pub fn transition(phase: GamePhase, command: Command) -> Transition {
    use GamePhase::*;

    if phase == Quit {
        return Transition::Ignore;
    }

    match command {
        Command::None => Transition::Ignore,
        Command::QuitGame => Transition::Quit,
        Command::StartGame => match phase {
            Menu | GameOver => Transition::StartRound,
            _ => Transition::Ignore,
        },
        Command::RestartGame => match phase {
            Playing | GameOver => Transition::StartRound,
            _ => Transition::Ignore,
        },
        Command::MoveUp | Command::MoveDown | Command::MoveLeft | Command::MoveRight => {
            match (phase, command.direction()) {
                (Playing, Some(direction)) => Transition::QueueDirection(direction),
                _ => Transition::Ignore,
            }
        }
        Command::ChangeBoardSize { width, height } => {
            if phase == Menu && is_valid_board_size(width, height) {
                Transition::ResizeAndStart { width, height }
            } else {
                Transition::Ignore
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASES: [GamePhase; 5] = [
        GamePhase::Menu,
        GamePhase::Playing,
        GamePhase::Paused,
        GamePhase::GameOver,
        GamePhase::Quit,
    ];

    #[test]
    fn test_start_game() {
        assert_eq!(
            transition(GamePhase::Menu, Command::StartGame),
            Transition::StartRound
        );
        assert_eq!(
            transition(GamePhase::GameOver, Command::StartGame),
            Transition::StartRound
        );
        assert_eq!(
            transition(GamePhase::Playing, Command::StartGame),
            Transition::Ignore
        );
        assert_eq!(
            transition(GamePhase::Paused, Command::StartGame),
            Transition::Ignore
        );
    }

    #[test]
    fn test_restart_game() {
        assert_eq!(
            transition(GamePhase::Playing, Command::RestartGame),
            Transition::StartRound
        );
        assert_eq!(
            transition(GamePhase::GameOver, Command::RestartGame),
            Transition::StartRound
        );
        assert_eq!(
            transition(GamePhase::Menu, Command::RestartGame),
            Transition::Ignore
        );
        assert_eq!(
            transition(GamePhase::Paused, Command::RestartGame),
            Transition::Ignore
        );
    }

    #[test]
    fn test_moves_only_queue_while_playing() {
        assert_eq!(
            transition(GamePhase::Playing, Command::MoveLeft),
            Transition::QueueDirection(Direction::Left)
        );
        for phase in [GamePhase::Menu, GamePhase::Paused, GamePhase::GameOver] {
            assert_eq!(transition(phase, Command::MoveUp), Transition::Ignore);
        }
    }

    #[test]
    fn test_quit_from_every_live_phase() {
        for phase in &PHASES[..4] {
            assert_eq!(transition(*phase, Command::QuitGame), Transition::Quit);
        }
    }

    #[test]
    fn test_quit_phase_is_terminal() {
        assert!(GamePhase::Quit.is_terminal());
        for command in [
            Command::StartGame,
            Command::RestartGame,
            Command::QuitGame,
            Command::MoveUp,
            Command::ChangeBoardSize {
                width: 10,
                height: 10,
            },
        ] {
            assert_eq!(transition(GamePhase::Quit, command), Transition::Ignore);
        }
    }

    #[test]
    fn test_board_resize_bounds() {
        let resize = |width, height| Command::ChangeBoardSize { width, height };

        assert_eq!(
            transition(GamePhase::Menu, resize(10, 15)),
            Transition::ResizeAndStart {
                width: 10,
                height: 15
            }
        );
        assert_eq!(
            transition(GamePhase::Menu, resize(5, 100)),
            Transition::ResizeAndStart {
                width: 5,
                height: 100
            }
        );
        assert_eq!(transition(GamePhase::Menu, resize(3, 3)), Transition::Ignore);
        assert_eq!(transition(GamePhase::Menu, resize(10, 101)), Transition::Ignore);
        assert_eq!(transition(GamePhase::Menu, resize(4, 50)), Transition::Ignore);

        // valid size, wrong phase
        assert_eq!(
            transition(GamePhase::Playing, resize(10, 15)),
            Transition::Ignore
        );
        assert_eq!(
            transition(GamePhase::GameOver, resize(10, 15)),
            Transition::Ignore
        );
    }

    #[test]
    fn test_none_is_ignored_everywhere() {
        for phase in PHASES {
            assert_eq!(transition(phase, Command::None), Transition::Ignore);
        }
    }

    #[test]
    fn test_phase_bytes() {
        for phase in PHASES {
            assert_eq!(GamePhase::from_u8(phase.as_u8()), Some(phase));
        }
        assert_eq!(GamePhase::from_u8(5), None);
    }
}
