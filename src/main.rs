use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use snake_ipc::config::AppConfig;
use snake_ipc::control::{IpcEndpoints, Orchestrator};
use snake_ipc::game::{GameEngine, MAX_BOARD_DIMENSION, MIN_BOARD_DIMENSION, is_valid_board_size};
use snake_ipc::logging::{LogTarget, init_logging};
use snake_ipc::modes::{HeadlessMode, HumanMode};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "snake_ipc")]
#[command(version, about = "Terminal Snake with a command socket and shared-memory state")]
struct Cli {
    /// Game mode
    #[arg(long, default_value = "human")]
    mode: Mode,

    /// Grid width
    #[arg(long)]
    width: Option<u8>,

    /// Grid height
    #[arg(long)]
    height: Option<u8>,

    /// Path of the command socket
    #[arg(long)]
    socket_path: Option<PathBuf>,

    /// Name of the shared-memory object, e.g. /snake_game_shm
    #[arg(long)]
    shm_name: Option<String>,

    /// Do not open the command socket
    #[arg(long)]
    no_command_channel: bool,

    /// Do not publish snapshots to shared memory
    #[arg(long)]
    no_shared_memory: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file (human mode discards them otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Play snake with keyboard controls
    Human,
    /// No terminal UI; drive the game over the command socket
    Headless,
}

impl Cli {
    /// Merge command-line overrides into the file configuration
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(width) = self.width {
            config.game.board_width = width;
        }
        if let Some(height) = self.height {
            config.game.board_height = height;
        }
        if let Some(path) = &self.socket_path {
            config.ipc.socket_path = path.clone();
        }
        if let Some(name) = &self.shm_name {
            config.ipc.shm_name = name.clone();
        }
        if self.no_command_channel {
            config.ipc.command_channel = false;
        }
        if self.no_shared_memory {
            config.ipc.shared_memory = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_target = match (&cli.log_file, cli.mode) {
        (Some(path), _) => LogTarget::File(path),
        (None, Mode::Human) => LogTarget::Discard,
        (None, Mode::Headless) => LogTarget::Stderr,
    };
    init_logging(log_target)?;

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let (width, height) = (config.game.board_width, config.game.board_height);
    if !is_valid_board_size(width, height) {
        bail!(
            "Board size {width}x{height} is out of range; both edges must be within {MIN_BOARD_DIMENSION}..={MAX_BOARD_DIMENSION}"
        );
    }

    info!(width, height, socket = %config.ipc.socket_path.display(), shm = %config.ipc.shm_name, "starting");

    let engine = match cli.seed {
        Some(seed) => GameEngine::with_seed(config.game.clone(), seed),
        None => GameEngine::new(config.game.clone()),
    };
    let orchestrator = Orchestrator::new(engine, IpcEndpoints::start(&config.ipc));

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Human => {
            let mut human_mode = HumanMode::new(orchestrator, &config.timing);
            human_mode.run().await?;
        }
        Mode::Headless => {
            HeadlessMode::new(orchestrator, config.timing.clone())
                .run()
                .await?;
        }
    }

    Ok(())
}
