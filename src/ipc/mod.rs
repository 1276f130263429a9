//! Inter-process interface: command socket in, shared-memory snapshots out
//!
//! Both endpoints run on their own threads and meet the game loop only
//! through [`CommandMailbox`] and [`SnapshotPublisher::publish`].

pub mod client;
pub mod command;
pub mod error;
pub mod layout;
pub mod mailbox;
pub mod publisher;
pub mod server;
pub mod shm;
pub mod worker;

pub use client::{send_command, send_raw};
pub use command::{ACK, Command, Opcode};
pub use error::{DecodeError, IpcError, LayoutError};
pub use layout::{Coordinate, GameSnapshot, MAX_SNAKE_LENGTH, REGION_SIZE, SNAPSHOT_SIZE};
pub use mailbox::CommandMailbox;
pub use publisher::SnapshotPublisher;
pub use server::CommandServer;
pub use shm::SharedRegion;
pub use worker::StoppableThread;
