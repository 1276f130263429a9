use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::config::TimingConfig;
use crate::control::Orchestrator;

/// No terminal: the game is driven entirely over the command socket
pub struct HeadlessMode {
    orchestrator: Orchestrator,
    timing: TimingConfig,
    stop: Arc<AtomicBool>,
}

impl HeadlessMode {
    pub fn new(orchestrator: Orchestrator, timing: TimingConfig) -> Self {
        Self {
            orchestrator,
            timing,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends the loop from another task or thread
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Run the blocking loop until `QuitGame` arrives or Ctrl+C is pressed
    pub async fn run(self) -> Result<Orchestrator> {
        let Self {
            mut orchestrator,
            timing,
            stop,
        } = self;

        info!("headless mode running, waiting for commands");

        let interrupt = {
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupted, stopping game loop");
                    stop.store(true, Ordering::Release);
                }
            })
        };

        let game_loop = tokio::task::spawn_blocking(move || {
            orchestrator.run_until(&stop, &timing);
            orchestrator.shutdown();
            orchestrator
        });

        let orchestrator = game_loop.await.context("Game loop task failed")?;
        interrupt.abort();
        Ok(orchestrator)
    }
}
