//! Owner of the authoritative game state
//!
//! Every tick takes at most one remote command from the mailbox, applies it
//! through the transition table, advances the snake when enough time has
//! accumulated, and hands a fresh snapshot to the publisher. All of this
//! happens on the caller's thread; the IPC threads only ever see the mailbox
//! and the publisher's buffer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{IpcConfig, TimingConfig};
use crate::game::{Action, Direction, GameEngine, GameState, StepResult};
use crate::input::KeyAction;
use crate::ipc::{Command, CommandMailbox, CommandServer, GameSnapshot, SnapshotPublisher};
use crate::metrics::GameMetrics;

use super::phase::{GamePhase, Transition, transition};

/// The two IPC channels plus the mailbox that joins them to the game loop
pub struct IpcEndpoints {
    mailbox: Arc<CommandMailbox>,
    server: Option<CommandServer>,
    publisher: SnapshotPublisher,
}

impl IpcEndpoints {
    /// Bring up whichever channels `config` enables
    ///
    /// A channel that fails to start is logged and left disabled; the game
    /// runs either way.
    pub fn start(config: &IpcConfig) -> Self {
        let mailbox = Arc::new(CommandMailbox::new());

        let server = if config.command_channel {
            let mut server = CommandServer::new(&config.socket_path);
            let sink = Arc::clone(&mailbox);
            match server.start(move |command| sink.post(command)) {
                Ok(()) => Some(server),
                Err(err) => {
                    warn!(error = %err, "command channel disabled");
                    None
                }
            }
        } else {
            None
        };

        let publisher = if config.shared_memory {
            let mut publisher = SnapshotPublisher::create(&config.shm_name);
            match publisher.start() {
                Ok(()) => publisher,
                Err(err) => {
                    warn!(error = %err, "snapshot writer could not start");
                    SnapshotPublisher::disabled()
                }
            }
        } else {
            SnapshotPublisher::disabled()
        };

        Self {
            mailbox,
            server,
            publisher,
        }
    }

    /// No socket and no shared memory; commands can still be posted directly
    pub fn detached() -> Self {
        Self {
            mailbox: Arc::new(CommandMailbox::new()),
            server: None,
            publisher: SnapshotPublisher::disabled(),
        }
    }

    pub fn mailbox(&self) -> &Arc<CommandMailbox> {
        &self.mailbox
    }

    pub fn publisher(&self) -> &SnapshotPublisher {
        &self.publisher
    }

    pub fn command_channel_active(&self) -> bool {
        self.server.as_ref().is_some_and(CommandServer::is_running)
    }

    pub fn shared_memory_active(&self) -> bool {
        self.publisher.is_initialized()
    }

    /// Stop the server, then the writer
    pub fn shutdown(&mut self) {
        if let Some(mut server) = self.server.take() {
            server.stop();
        }
        self.publisher.stop();
    }
}

pub struct Orchestrator {
    engine: GameEngine,
    state: GameState,
    phase: GamePhase,
    pending_direction: Option<Direction>,
    accumulator: Duration,
    last_tick: Instant,
    metrics: GameMetrics,
    ipc: IpcEndpoints,
}

impl Orchestrator {
    /// Start in `Menu` with a freshly reset board
    pub fn new(mut engine: GameEngine, ipc: IpcEndpoints) -> Self {
        let state = engine.reset();

        Self {
            engine,
            state,
            phase: GamePhase::Menu,
            pending_direction: None,
            accumulator: Duration::ZERO,
            last_tick: Instant::now(),
            metrics: GameMetrics::new(),
            ipc,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn board_size(&self) -> (u8, u8) {
        (self.state.board.width(), self.state.board.height())
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    pub fn refresh_metrics(&mut self) {
        if self.phase == GamePhase::Playing {
            self.metrics.sample_clock();
        }
    }

    pub fn ipc(&self) -> &IpcEndpoints {
        &self.ipc
    }

    pub fn mailbox(&self) -> Arc<CommandMailbox> {
        Arc::clone(&self.ipc.mailbox)
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Run one loop iteration as if `elapsed` had passed since the last one
    ///
    /// Returns the step result if the snake moved.
    pub fn tick(&mut self, elapsed: Duration) -> Option<StepResult> {
        let command = self.ipc.mailbox.take();
        if command != Command::None {
            self.apply_command(command);
        }

        let stepped = if self.phase == GamePhase::Playing {
            self.accumulator += elapsed;
            let delay = self.engine.step_delay(&self.state);

            if self.accumulator >= delay {
                let result = self.advance();
                self.accumulator -= delay;
                if self.accumulator > delay {
                    self.accumulator = Duration::ZERO;
                }
                Some(result)
            } else {
                None
            }
        } else {
            self.accumulator = Duration::ZERO;
            None
        };

        self.publish();
        stepped
    }

    /// [`Orchestrator::tick`] with the wall-clock time since the previous call
    pub fn tick_now(&mut self) -> Option<StepResult> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.tick(elapsed)
    }

    /// Apply a remote command; returns what the transition table decided
    pub fn apply_command(&mut self, command: Command) -> Transition {
        let decided = transition(self.phase, command);
        let applied = decided != Transition::Ignore;

        if applied {
            debug!(?command, phase = ?self.phase, "applying command");
        } else {
            debug!(?command, phase = ?self.phase, "command ignored");
        }

        self.metrics.on_command(applied);
        self.perform(decided);
        decided
    }

    /// Apply a local key press
    pub fn apply_key(&mut self, key: KeyAction) {
        use GamePhase::*;

        match (self.phase, key) {
            (Quit, _) => {}
            (_, KeyAction::Quit) => self.perform(Transition::Quit),
            (Menu, _) => self.perform(Transition::StartRound),
            (Playing, KeyAction::Move(direction)) => self.pending_direction = Some(direction),
            (Playing, KeyAction::TogglePause) => self.phase = Paused,
            (Playing, KeyAction::Restart) => self.perform(Transition::StartRound),
            (Paused, KeyAction::TogglePause) => self.phase = Playing,
            (GameOver, KeyAction::Restart) => self.perform(Transition::StartRound),
            (GameOver, _) => self.phase = Menu,
            _ => {}
        }
    }

    /// Snapshot of the current state and phase
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::capture(&self.state, self.phase)
    }

    /// Blocking loop with fixed sleeps, until `Quit` or `stop` is raised
    pub fn run_until(&mut self, stop: &AtomicBool, timing: &TimingConfig) {
        self.last_tick = Instant::now();

        while !self.is_finished() && !stop.load(Ordering::Acquire) {
            self.tick_now();

            if self.phase != GamePhase::Playing {
                thread::sleep(timing.idle_sleep());
            }
            thread::sleep(timing.tick_sleep());
        }

        info!(
            phase = ?self.phase,
            games = self.metrics.games_played,
            high_score = self.metrics.high_score,
            commands_applied = self.metrics.commands_applied,
            commands_ignored = self.metrics.commands_ignored,
            "game loop finished"
        );
    }

    /// Stop both IPC channels
    pub fn shutdown(&mut self) {
        self.ipc.shutdown();
    }

    fn perform(&mut self, decided: Transition) {
        match decided {
            Transition::Ignore => {}
            Transition::StartRound => self.start_round(),
            Transition::QueueDirection(direction) => self.pending_direction = Some(direction),
            Transition::Quit => {
                info!("quit requested");
                self.phase = GamePhase::Quit;
            }
            Transition::ResizeAndStart { width, height } => {
                info!(width, height, "board resized");
                self.engine.resize(width, height);
                self.start_round();
            }
        }
    }

    fn start_round(&mut self) {
        self.state = self.engine.reset();
        self.phase = GamePhase::Playing;
        self.pending_direction = None;
        self.accumulator = Duration::ZERO;
        self.metrics.on_round_start();
        debug!(
            width = self.state.board.width(),
            height = self.state.board.height(),
            "round started"
        );
    }

    fn advance(&mut self) -> StepResult {
        let action = Action::from(self.pending_direction.take());
        let result = self.engine.step(&mut self.state, action);

        if result.terminated {
            self.phase = GamePhase::GameOver;
            self.metrics.on_round_over(self.state.score);
            info!(
                score = self.state.score,
                collision = ?result.info.collision_type,
                "game over"
            );
        }

        result
    }

    fn publish(&self) {
        if self.ipc.publisher.is_initialized() {
            self.ipc.publisher.publish(&self.snapshot());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Position};

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            GameEngine::with_seed(GameConfig::default(), 7),
            IpcEndpoints::detached(),
        )
    }

    fn long() -> Duration {
        Duration::from_secs(1)
    }

    #[test]
    fn test_starts_in_menu_with_a_board() {
        let orch = orchestrator();
        assert_eq!(orch.phase(), GamePhase::Menu);
        assert_eq!(orch.board_size(), (20, 20));
        assert_eq!(orch.snapshot().phase, GamePhase::Menu);
        assert_eq!(orch.snapshot().snake_length, 3);
    }

    #[test]
    fn test_start_command_is_taken_on_next_tick() {
        let mut orch = orchestrator();
        orch.mailbox().post(Command::StartGame);
        assert_eq!(orch.phase(), GamePhase::Menu);

        orch.tick(Duration::ZERO);
        assert_eq!(orch.phase(), GamePhase::Playing);
        assert_eq!(orch.mailbox().peek(), crate::ipc::Opcode::None);
    }

    #[test]
    fn test_only_latest_command_is_seen() {
        let mut orch = orchestrator();
        let mailbox = orch.mailbox();
        mailbox.post(Command::StartGame);
        mailbox.post(Command::QuitGame);

        orch.tick(Duration::ZERO);
        assert_eq!(orch.phase(), GamePhase::Quit);
        assert_eq!(orch.metrics().commands_applied, 1);
    }

    #[test]
    fn test_no_step_before_delay() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);
        let head = orch.state().snake.head();

        assert!(orch.tick(Duration::from_millis(150)).is_none());
        assert_eq!(orch.state().snake.head(), head);

        // 150 + 60 crosses the 200 ms delay of speed level 1
        assert!(orch.tick(Duration::from_millis(60)).is_some());
        assert_eq!(orch.state().snake.head(), head.moved_in_direction(Direction::Right));
    }

    #[test]
    fn test_queued_direction_is_used_once() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);
        let head = orch.state().snake.head();

        assert_eq!(
            orch.apply_command(Command::MoveUp),
            Transition::QueueDirection(Direction::Up)
        );
        orch.tick(long());
        assert_eq!(orch.state().snake.head(), head.moved_in_direction(Direction::Up));
        assert_eq!(orch.pending_direction(), None);
        assert_eq!(orch.state().snake.direction(), Direction::Up);
    }

    #[test]
    fn test_reversal_is_left_to_the_engine() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);
        let head = orch.state().snake.head();

        assert_eq!(
            orch.apply_command(Command::MoveLeft),
            Transition::QueueDirection(Direction::Left)
        );
        orch.tick(long());
        assert_eq!(orch.state().snake.head(), head.moved_in_direction(Direction::Right));
    }

    #[test]
    fn test_wall_hit_ends_round() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);

        let mut result = None;
        for _ in 0..20 {
            result = orch.tick(long());
            if orch.phase() == GamePhase::GameOver {
                break;
            }
        }

        assert!(result.is_some_and(|r| r.terminated));
        assert_eq!(orch.phase(), GamePhase::GameOver);
        assert_eq!(orch.metrics().games_played, 1);

        // game over does not step any more
        assert!(orch.tick(long()).is_none());
    }

    #[test]
    fn test_restart_resets_score() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);
        orch.state.score = 40;
        orch.state.snake.grow();

        orch.apply_command(Command::RestartGame);
        assert_eq!(orch.phase(), GamePhase::Playing);
        assert_eq!(orch.state().score, 0);
        assert_eq!(orch.state().snake.len(), 3);
    }

    #[test]
    fn test_resize_from_menu() {
        let mut orch = orchestrator();

        orch.apply_command(Command::ChangeBoardSize {
            width: 3,
            height: 3,
        });
        assert_eq!(orch.board_size(), (20, 20));
        assert_eq!(orch.phase(), GamePhase::Menu);

        orch.apply_command(Command::ChangeBoardSize {
            width: 10,
            height: 15,
        });
        assert_eq!(orch.board_size(), (10, 15));
        assert_eq!(orch.phase(), GamePhase::Playing);
        assert_eq!(orch.state().snake.head(), Position::new(5, 7));
    }

    #[test]
    fn test_paused_accepts_only_quit() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);
        orch.apply_key(KeyAction::TogglePause);
        assert_eq!(orch.phase(), GamePhase::Paused);

        let head = orch.state().snake.head();
        for command in [Command::StartGame, Command::RestartGame, Command::MoveUp] {
            assert_eq!(orch.apply_command(command), Transition::Ignore);
        }
        orch.tick(long());
        assert_eq!(orch.state().snake.head(), head);
        assert_eq!(orch.metrics().commands_ignored, 3);

        orch.apply_command(Command::QuitGame);
        assert!(orch.is_finished());
    }

    #[test]
    fn test_local_keys_follow_phase() {
        let mut orch = orchestrator();

        orch.apply_key(KeyAction::Other);
        assert_eq!(orch.phase(), GamePhase::Playing);

        orch.apply_key(KeyAction::Move(Direction::Down));
        assert_eq!(orch.pending_direction(), Some(Direction::Down));

        orch.apply_key(KeyAction::TogglePause);
        orch.apply_key(KeyAction::Move(Direction::Up));
        assert_eq!(orch.pending_direction(), Some(Direction::Down));
        orch.apply_key(KeyAction::TogglePause);
        assert_eq!(orch.phase(), GamePhase::Playing);

        orch.phase = GamePhase::GameOver;
        orch.apply_key(KeyAction::Other);
        assert_eq!(orch.phase(), GamePhase::Menu);

        orch.apply_key(KeyAction::Quit);
        assert_eq!(orch.phase(), GamePhase::Quit);
        orch.apply_key(KeyAction::Other);
        assert_eq!(orch.phase(), GamePhase::Quit);
    }

    #[test]
    fn test_accumulator_does_not_burst() {
        let mut orch = orchestrator();
        orch.apply_command(Command::StartGame);

        // A long stall produces one step, not a burst of catch-up steps.
        assert!(orch.tick(Duration::from_millis(5000)).is_some());
        assert!(orch.tick(Duration::ZERO).is_none());
    }

    #[test]
    fn test_run_until_stops_on_quit() {
        let mut orch = orchestrator();
        orch.mailbox().post(Command::QuitGame);

        let stop = AtomicBool::new(false);
        orch.run_until(&stop, &TimingConfig::default());
        assert!(orch.is_finished());
    }

    #[test]
    fn test_run_until_honours_stop_flag() {
        let mut orch = orchestrator();
        let stop = AtomicBool::new(true);
        orch.run_until(&stop, &TimingConfig::default());
        assert_eq!(orch.phase(), GamePhase::Menu);
    }
}
