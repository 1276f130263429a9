//! Core game logic module for Snake
//!
//! This module contains all the game rules without any I/O or rendering dependencies.
//! The orchestrator drives it one step at a time from the game-loop thread.

pub mod action;
pub mod config;
pub mod engine;
pub mod sensors;
pub mod state;

// Re-export commonly used types
pub use action::{Action, Direction};
pub use config::{GameConfig, MAX_BOARD_DIMENSION, MIN_BOARD_DIMENSION, is_valid_board_size};
pub use engine::{GameEngine, StepInfo, StepResult};
pub use sensors::{SENSOR_COUNT, SensorReadings, sensor_readings};
pub use state::{Board, CollisionType, FoodKind, GameState, Position, Snake};
