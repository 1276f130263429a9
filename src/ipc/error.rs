use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::command::Opcode;

/// Failures while bringing up or running an IPC endpoint
#[derive(Debug, Error)]
pub enum IpcError {
    #[error("command server already running on {}", .0.display())]
    AlreadyRunning(PathBuf),

    #[error("failed to bind command socket {}: {source}", .path.display())]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("shared memory {name}: {operation} failed: {source}")]
    SharedMemory {
        name: String,
        operation: &'static str,
        #[source]
        source: nix::Error,
    },
}

/// Failures while reading one command off a client connection
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("connection closed before an opcode was received")]
    Empty,

    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    #[error("short payload for {opcode:?}: expected {expected} bytes")]
    ShortPayload { opcode: Opcode, expected: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures while unpacking a shared-memory snapshot
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("buffer too small: expected {expected} bytes, got {actual}")]
    BufferTooSmall { expected: usize, actual: usize },

    #[error("invalid {field} value {value}")]
    InvalidField { field: &'static str, value: u8 },
}
