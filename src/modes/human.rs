use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::config::TimingConfig;
use crate::control::{GamePhase, Orchestrator};
use crate::input::{InputHandler, KeyAction};
use crate::render::{Renderer, Scene};

/// Local terminal play, with the IPC channels running alongside
pub struct HumanMode {
    orchestrator: Orchestrator,
    renderer: Renderer,
    input_handler: InputHandler,
    tick_interval: Duration,
}

impl HumanMode {
    pub fn new(orchestrator: Orchestrator, timing: &TimingConfig) -> Self {
        Self {
            orchestrator,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            tick_interval: timing.tick_sleep().max(Duration::from_millis(1)),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;
        self.orchestrator.shutdown();

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        // One orchestrator tick per interval; it decides when the snake moves
        let mut tick_timer = interval(self.tick_interval);
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick
                _ = tick_timer.tick() => {
                    self.orchestrator.tick_now();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.orchestrator.refresh_metrics();
                    let scene = Scene::of(&self.orchestrator);
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &scene);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = &mut ctrl_c => {
                    self.orchestrator.apply_key(KeyAction::Quit);
                }
            }

            if self.orchestrator.phase() == GamePhase::Quit {
                break;
            }
        }

        info!(
            games = self.orchestrator.metrics().games_played,
            high_score = self.orchestrator.metrics().high_score,
            "session ended"
        );

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            self.orchestrator.apply_key(action);
        }
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}
