//! Byte layout of the shared-memory region
//!
//! Native endianness, matching a C reader of the same structs:
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Region header (8 bytes)                                      │
//! │  ├─ +0  write-in-progress flag: u8 (+3 padding)              │
//! │  └─ +4  version: u32                                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Snapshot (4164 bytes, at +8)                                 │
//! │  ├─ +0  board width u8      +1  board height u8              │
//! │  ├─ +2  score u16           +4  speed u8     +5 phase u8     │
//! │  ├─ +6  food x u8           +7  food y u8    +8 food kind u8 │
//! │  ├─ +9  head x u8           +10 head y u8    (+11 padding)   │
//! │  ├─ +12 snake length u16    (+14 padding)                    │
//! │  ├─ +16 sensors: 12 × f32                                    │
//! │  ├─ +64 direction u8                                         │
//! │  └─ +65 body: MAX_SNAKE_LENGTH × (x u8, y u8)  (+3 padding)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`pack_snapshot`] and [`unpack_snapshot`] are the only code that knows
//! these offsets.

use crate::control::GamePhase;
use crate::game::{
    Direction, FoodKind, GameState, Position, SENSOR_COUNT, SensorReadings, sensor_readings,
};

use super::error::LayoutError;

/// Capacity of the body array in a snapshot
pub const MAX_SNAKE_LENGTH: usize = 2048;

pub const WRITING_FLAG_OFFSET: usize = 0;
pub const VERSION_OFFSET: usize = 4;
pub const SNAPSHOT_OFFSET: usize = 8;

const BOARD_WIDTH: usize = 0;
const BOARD_HEIGHT: usize = 1;
const SCORE: usize = 2;
const SPEED: usize = 4;
const PHASE: usize = 5;
const FOOD_X: usize = 6;
const FOOD_Y: usize = 7;
const FOOD_KIND: usize = 8;
const HEAD_X: usize = 9;
const HEAD_Y: usize = 10;
const SNAKE_LENGTH: usize = 12;
const SENSORS: usize = 16;
const DIRECTION: usize = SENSORS + SENSOR_COUNT * 4;
const BODY: usize = DIRECTION + 1;

/// Bytes in front of the body array
pub const SNAPSHOT_SCALARS_SIZE: usize = BODY;
/// Size of one packed snapshot, padded to 4-byte alignment
pub const SNAPSHOT_SIZE: usize = (BODY + MAX_SNAKE_LENGTH * 2).next_multiple_of(4);
/// Size of the whole shared-memory region
pub const REGION_SIZE: usize = SNAPSHOT_OFFSET + SNAPSHOT_SIZE;

/// A cell as stored in shared memory
///
/// Only the low byte of each axis is kept, so a head that left the board at
/// `-1` reads back as 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Coordinate {
    pub x: u8,
    pub y: u8,
}

impl Coordinate {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

impl From<Position> for Coordinate {
    fn from(pos: Position) -> Self {
        Self {
            x: pos.x as u8,
            y: pos.y as u8,
        }
    }
}

/// Point-in-time copy of the game published to external readers
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub board_width: u8,
    pub board_height: u8,
    pub score: u16,
    pub speed: u8,
    pub phase: GamePhase,
    pub food: Coordinate,
    pub food_kind: FoodKind,
    pub snake_head: Coordinate,
    /// Logical length; may exceed the body capacity
    pub snake_length: u16,
    pub sensors: SensorReadings,
    pub direction: Direction,
    pub snake_body: [Coordinate; MAX_SNAKE_LENGTH],
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            board_width: 0,
            board_height: 0,
            score: 0,
            speed: 0,
            phase: GamePhase::Menu,
            food: Coordinate::default(),
            food_kind: FoodKind::Apple,
            snake_head: Coordinate::default(),
            snake_length: 0,
            sensors: [0.0; SENSOR_COUNT],
            direction: Direction::Up,
            snake_body: [Coordinate::default(); MAX_SNAKE_LENGTH],
        }
    }
}

impl GameSnapshot {
    /// Capture the authoritative state of the current round
    pub fn capture(state: &GameState, phase: GamePhase) -> Self {
        let mut snapshot = Self {
            board_width: state.board.width(),
            board_height: state.board.height(),
            score: state.score,
            speed: state.speed,
            phase,
            food: state.board.food.into(),
            food_kind: state.board.food_kind,
            snake_head: state.snake.head().into(),
            snake_length: u16::try_from(state.snake.len()).unwrap_or(u16::MAX),
            sensors: sensor_readings(state),
            direction: state.snake.direction(),
            ..Self::default()
        };

        for (slot, segment) in snapshot.snake_body.iter_mut().zip(state.snake.segments()) {
            *slot = (*segment).into();
        }

        snapshot
    }

    /// Number of body entries that are actually stored
    pub fn stored_length(&self) -> usize {
        usize::from(self.snake_length).min(MAX_SNAKE_LENGTH)
    }

    pub fn body(&self) -> &[Coordinate] {
        &self.snake_body[..self.stored_length()]
    }
}

/// Serialize `snapshot` into the front of `out`
///
/// Writes every scalar field and only the first
/// `min(snake_length, MAX_SNAKE_LENGTH)` body entries. Returns how many bytes
/// of `out` carry data; the rest of the snapshot area is left untouched.
pub fn pack_snapshot(snapshot: &GameSnapshot, out: &mut [u8]) -> Result<usize, LayoutError> {
    if out.len() < SNAPSHOT_SIZE {
        return Err(LayoutError::BufferTooSmall {
            expected: SNAPSHOT_SIZE,
            actual: out.len(),
        });
    }

    out[..BODY].fill(0);
    out[BOARD_WIDTH] = snapshot.board_width;
    out[BOARD_HEIGHT] = snapshot.board_height;
    out[SCORE..SCORE + 2].copy_from_slice(&snapshot.score.to_ne_bytes());
    out[SPEED] = snapshot.speed;
    out[PHASE] = snapshot.phase.as_u8();
    out[FOOD_X] = snapshot.food.x;
    out[FOOD_Y] = snapshot.food.y;
    out[FOOD_KIND] = snapshot.food_kind.as_u8();
    out[HEAD_X] = snapshot.snake_head.x;
    out[HEAD_Y] = snapshot.snake_head.y;
    out[SNAKE_LENGTH..SNAKE_LENGTH + 2].copy_from_slice(&snapshot.snake_length.to_ne_bytes());

    for (i, value) in snapshot.sensors.iter().enumerate() {
        let at = SENSORS + i * 4;
        out[at..at + 4].copy_from_slice(&value.to_ne_bytes());
    }

    out[DIRECTION] = snapshot.direction.as_u8();

    let stored = snapshot.stored_length();
    for (i, coordinate) in snapshot.body().iter().enumerate() {
        let at = BODY + i * 2;
        out[at] = coordinate.x;
        out[at + 1] = coordinate.y;
    }

    Ok(BODY + stored * 2)
}

/// Deserialize a snapshot produced by [`pack_snapshot`]
pub fn unpack_snapshot(bytes: &[u8]) -> Result<GameSnapshot, LayoutError> {
    if bytes.len() < SNAPSHOT_SIZE {
        return Err(LayoutError::BufferTooSmall {
            expected: SNAPSHOT_SIZE,
            actual: bytes.len(),
        });
    }

    let invalid = |field, value| LayoutError::InvalidField { field, value };

    let phase = GamePhase::from_u8(bytes[PHASE]).ok_or_else(|| invalid("phase", bytes[PHASE]))?;
    let food_kind =
        FoodKind::from_u8(bytes[FOOD_KIND]).ok_or_else(|| invalid("food kind", bytes[FOOD_KIND]))?;
    let direction =
        Direction::from_u8(bytes[DIRECTION]).ok_or_else(|| invalid("direction", bytes[DIRECTION]))?;

    let mut snapshot = GameSnapshot {
        board_width: bytes[BOARD_WIDTH],
        board_height: bytes[BOARD_HEIGHT],
        score: u16::from_ne_bytes([bytes[SCORE], bytes[SCORE + 1]]),
        speed: bytes[SPEED],
        phase,
        food: Coordinate::new(bytes[FOOD_X], bytes[FOOD_Y]),
        food_kind,
        snake_head: Coordinate::new(bytes[HEAD_X], bytes[HEAD_Y]),
        snake_length: u16::from_ne_bytes([bytes[SNAKE_LENGTH], bytes[SNAKE_LENGTH + 1]]),
        direction,
        ..GameSnapshot::default()
    };

    for (i, value) in snapshot.sensors.iter_mut().enumerate() {
        let at = SENSORS + i * 4;
        *value = f32::from_ne_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    }

    let stored = snapshot.stored_length();
    for (i, slot) in snapshot.snake_body[..stored].iter_mut().enumerate() {
        let at = BODY + i * 2;
        *slot = Coordinate::new(bytes[at], bytes[at + 1]);
    }

    Ok(snapshot)
}
