//! Wire codec for the command channel
//!
//! A client sends one opcode byte, followed by `width, height` when the opcode
//! is `ChangeBoardSize`. The server answers with a single [`ACK`] byte meaning
//! "the bytes decoded", never "the command was applied".

use std::io::{self, Read, Write};

use super::error::DecodeError;
use crate::game::Direction;

/// Byte written back after a command decoded successfully
pub const ACK: u8 = 1;

/// Opcode byte values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    None = 0,
    StartGame = 1,
    MoveUp = 2,
    MoveDown = 3,
    MoveLeft = 4,
    MoveRight = 5,
    RestartGame = 6,
    QuitGame = 7,
    ChangeBoardSize = 8,
}

impl Opcode {
    /// Highest defined opcode
    pub const MAX: u8 = Opcode::ChangeBoardSize as u8;

    pub fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        let opcode = match byte {
            0 => Opcode::None,
            1 => Opcode::StartGame,
            2 => Opcode::MoveUp,
            3 => Opcode::MoveDown,
            4 => Opcode::MoveLeft,
            5 => Opcode::MoveRight,
            6 => Opcode::RestartGame,
            7 => Opcode::QuitGame,
            8 => Opcode::ChangeBoardSize,
            other => return Err(DecodeError::UnknownOpcode(other)),
        };
        Ok(opcode)
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Number of payload bytes that follow the opcode
    pub fn payload_len(self) -> usize {
        match self {
            Opcode::ChangeBoardSize => 2,
            _ => 0,
        }
    }
}

/// A decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Command {
    #[default]
    None,
    StartGame,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    RestartGame,
    QuitGame,
    ChangeBoardSize {
        width: u8,
        height: u8,
    },
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::None => Opcode::None,
            Command::StartGame => Opcode::StartGame,
            Command::MoveUp => Opcode::MoveUp,
            Command::MoveDown => Opcode::MoveDown,
            Command::MoveLeft => Opcode::MoveLeft,
            Command::MoveRight => Opcode::MoveRight,
            Command::RestartGame => Opcode::RestartGame,
            Command::QuitGame => Opcode::QuitGame,
            Command::ChangeBoardSize { .. } => Opcode::ChangeBoardSize,
        }
    }

    /// Build a payload-free command from its opcode
    ///
    /// Returns `None` for `ChangeBoardSize`, which needs its payload.
    pub fn from_opcode(opcode: Opcode) -> Option<Self> {
        let command = match opcode {
            Opcode::None => Command::None,
            Opcode::StartGame => Command::StartGame,
            Opcode::MoveUp => Command::MoveUp,
            Opcode::MoveDown => Command::MoveDown,
            Opcode::MoveLeft => Command::MoveLeft,
            Opcode::MoveRight => Command::MoveRight,
            Opcode::RestartGame => Command::RestartGame,
            Opcode::QuitGame => Command::QuitGame,
            Opcode::ChangeBoardSize => return None,
        };
        Some(command)
    }

    /// Direction requested by a `Move*` command
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Command::MoveUp => Some(Direction::Up),
            Command::MoveDown => Some(Direction::Down),
            Command::MoveLeft => Some(Direction::Left),
            Command::MoveRight => Some(Direction::Right),
            _ => None,
        }
    }

    /// Wire bytes for this command
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = vec![self.opcode().as_byte()];
        if let Command::ChangeBoardSize { width, height } = *self {
            bytes.extend_from_slice(&[width, height]);
        }
        bytes
    }
}

/// Read exactly one command from `reader`
///
/// The reader's own timeout bounds each read. A partial payload is reported
/// as [`DecodeError::ShortPayload`] and nothing is returned.
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command, DecodeError> {
    let mut opcode_byte = [0u8; 1];
    if let Err(err) = reader.read_exact(&mut opcode_byte) {
        return Err(match err.kind() {
            io::ErrorKind::UnexpectedEof => DecodeError::Empty,
            _ => DecodeError::Io(err),
        });
    }

    let opcode = Opcode::from_byte(opcode_byte[0])?;

    if let Some(command) = Command::from_opcode(opcode) {
        return Ok(command);
    }

    let mut payload = [0u8; 2];
    reader
        .read_exact(&mut payload)
        .map_err(|_| DecodeError::ShortPayload {
            opcode,
            expected: payload.len(),
        })?;

    Ok(Command::ChangeBoardSize {
        width: payload[0],
        height: payload[1],
    })
}

/// Write the encoded command to `writer`
pub fn write_command<W: Write>(writer: &mut W, command: Command) -> io::Result<()> {
    writer.write_all(&command.encode())?;
    writer.flush()
}

/// Write the single acknowledgement byte
pub fn write_ack<W: Write>(writer: &mut W) -> io::Result<()> {
    writer.write_all(&[ACK])?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_every_known_opcode() {
        let expected = [
            Command::None,
            Command::StartGame,
            Command::MoveUp,
            Command::MoveDown,
            Command::MoveLeft,
            Command::MoveRight,
            Command::RestartGame,
            Command::QuitGame,
        ];

        for (byte, command) in expected.iter().enumerate() {
            let mut reader = Cursor::new(vec![byte as u8]);
            assert_eq!(read_command(&mut reader).unwrap(), *command);
        }
    }

    #[test]
    fn test_decode_board_size() {
        let mut reader = Cursor::new(vec![8, 10, 15]);
        assert_eq!(
            read_command(&mut reader).unwrap(),
            Command::ChangeBoardSize {
                width: 10,
                height: 15
            }
        );
    }

    #[test]
    fn test_short_payload_is_discarded() {
        let mut reader = Cursor::new(vec![8, 10]);
        let err = read_command(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ShortPayload {
                opcode: Opcode::ChangeBoardSize,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_empty_connection() {
        let mut reader = Cursor::new(Vec::new());
        assert!(matches!(
            read_command(&mut reader),
            Err(DecodeError::Empty)
        ));
    }

    #[test]
    fn test_encode_matches_wire_format() {
        assert_eq!(Command::StartGame.encode(), vec![1]);
        assert_eq!(Command::QuitGame.encode(), vec![7]);
        assert_eq!(
            Command::ChangeBoardSize {
                width: 3,
                height: 200
            }
            .encode(),
            vec![8, 3, 200]
        );
    }

    #[test]
    fn test_directions() {
        assert_eq!(Command::MoveLeft.direction(), Some(Direction::Left));
        assert_eq!(Command::StartGame.direction(), None);
    }

    #[test]
    fn test_ack_byte() {
        let mut out = Vec::new();
        write_ack(&mut out).unwrap();
        assert_eq!(out, vec![1]);
    }

    proptest! {
        #[test]
        fn known_opcodes_round_trip(byte in 0u8..=Opcode::MAX, width in any::<u8>(), height in any::<u8>()) {
            let mut reader = Cursor::new(vec![byte, width, height]);
            let command = read_command(&mut reader).unwrap();
            prop_assert_eq!(command.opcode().as_byte(), byte);
            prop_assert_eq!(&command.encode()[..], &reader.get_ref()[..1 + command.opcode().payload_len()]);
        }

        #[test]
        fn unknown_opcodes_are_rejected(byte in (Opcode::MAX + 1)..=u8::MAX) {
            let mut reader = Cursor::new(vec![byte, 10, 10]);
            let rejected = matches!(read_command(&mut reader), Err(DecodeError::UnknownOpcode(b)) if b == byte);
            prop_assert!(rejected);
        }
    }
}
