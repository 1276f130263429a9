//! Application configuration: game rules, IPC endpoints, loop timing

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::game::GameConfig;

pub const DEFAULT_SOCKET_PATH: &str = "/tmp/snake_game.sock";
pub const DEFAULT_SHM_NAME: &str = "/snake_game_shm";

/// Where the command socket and the shared-memory object live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    pub socket_path: PathBuf,
    /// POSIX shared-memory name, with its leading slash
    pub shm_name: String,
    pub command_channel: bool,
    pub shared_memory: bool,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            shm_name: DEFAULT_SHM_NAME.to_string(),
            command_channel: true,
            shared_memory: true,
        }
    }
}

/// Sleeps of the blocking game loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Sleep after every tick
    pub tick_sleep_ms: u64,
    /// Extra sleep while not playing
    pub idle_sleep_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_sleep_ms: 1,
            idle_sleep_ms: 10,
        }
    }
}

impl TimingConfig {
    pub fn tick_sleep(&self) -> Duration {
        Duration::from_millis(self.tick_sleep_ms)
    }

    pub fn idle_sleep(&self) -> Duration {
        Duration::from_millis(self.idle_sleep_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub ipc: IpcConfig,
    pub timing: TimingConfig,
}

impl AppConfig {
    /// Load from a JSON file; missing sections and fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults when `path` is `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
