//! Snake IPC - a terminal Snake game that other processes can drive and watch
//!
//! This library provides:
//! - Core game logic (game module)
//! - Command socket, mailbox and shared-memory snapshots (ipc module)
//! - The phase state machine and game loop (control module)
//! - TUI rendering and keyboard input (render, input modules)
//! - Human and headless execution modes (modes module)

pub mod config;
pub mod control;
pub mod game;
pub mod input;
pub mod ipc;
pub mod logging;
pub mod metrics;
pub mod modes;
pub mod render;
