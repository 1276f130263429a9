//! Single-slot hand-off from the command server to the game loop
//!
//! The opcode lives in one atomic byte: every post overwrites it and the game
//! loop swaps it back to `None` when it takes it, so between two takes only
//! the latest post is visible. The resize payload does not fit that word and
//! is kept behind its own mutex.

use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

use super::command::{Command, Opcode};

#[derive(Debug, Default)]
pub struct CommandMailbox {
    pending: AtomicU8,
    board_size: Mutex<Option<(u8, u8)>>,
}

impl CommandMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is pending with `command`
    ///
    /// Safe to call from any thread.
    pub fn post(&self, command: Command) {
        if let Command::ChangeBoardSize { width, height } = command {
            *self.board_size.lock() = Some((width, height));
        }
        self.pending
            .store(command.opcode().as_byte(), Ordering::Release);
    }

    /// Take the pending command, leaving `None` behind
    pub fn take(&self) -> Command {
        let byte = self
            .pending
            .swap(Opcode::None.as_byte(), Ordering::AcqRel);

        let opcode = match Opcode::from_byte(byte) {
            Ok(opcode) => opcode,
            Err(_) => return Command::None,
        };

        if let Some(command) = Command::from_opcode(opcode) {
            return command;
        }

        match self.board_size.lock().take() {
            Some((width, height)) => Command::ChangeBoardSize { width, height },
            None => Command::None,
        }
    }

    /// Look at the pending opcode without consuming it
    pub fn peek(&self) -> Opcode {
        Opcode::from_byte(self.pending.load(Ordering::Acquire)).unwrap_or(Opcode::None)
    }
}
