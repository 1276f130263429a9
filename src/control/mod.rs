//! Command dispatch and the game loop
//!
//! [`phase`] is the pure transition table; [`orchestrator`] applies it to the
//! owned game state once per tick and publishes the result.

pub mod orchestrator;
pub mod phase;

pub use orchestrator::{IpcEndpoints, Orchestrator};
pub use phase::{GamePhase, Transition, transition};
