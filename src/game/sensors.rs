//! Distance sensors exposed to external consumers
//!
//! Twelve values, in this order:
//! - 0..4: wall distance looking Up, Down, Left, Right
//! - 4..8: food distance in the same four directions
//! - 8..12: body distance in the same four directions
//!
//! Each value is `1 / d` where `d` is the number of cells from the head to the
//! first hit, or `0.0` if nothing is hit within `max(width, height)` cells.

use super::action::Direction;
use super::state::{GameState, Position};

/// Number of sensor values in a reading
pub const SENSOR_COUNT: usize = 12;

pub type SensorReadings = [f32; SENSOR_COUNT];

/// Compute the sensor vector for the current state
pub fn sensor_readings(state: &GameState) -> SensorReadings {
    let mut readings = [0.0; SENSOR_COUNT];
    let food = state.board.food;

    for (i, direction) in Direction::ALL.into_iter().enumerate() {
        readings[i] = probe(state, direction, |pos| state.board.is_wall(pos));
        readings[4 + i] = probe(state, direction, |pos| pos == food);
        readings[8 + i] = probe(state, direction, |pos| state.snake.occupies(pos));
    }

    readings
}

fn probe(state: &GameState, direction: Direction, hit: impl Fn(Position) -> bool) -> f32 {
    let range = i32::from(state.board.width().max(state.board.height()));
    let mut pos = state.snake.head();

    for distance in 1..=range {
        pos = pos.moved_in_direction(direction);
        if hit(pos) {
            return 1.0 / distance as f32;
        }
    }

    0.0
}
