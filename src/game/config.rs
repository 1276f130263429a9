use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest board edge accepted from a resize request
pub const MIN_BOARD_DIMENSION: u8 = 5;
/// Largest board edge accepted from a resize request
pub const MAX_BOARD_DIMENSION: u8 = 100;

/// Returns true if both edges lie within `[MIN_BOARD_DIMENSION, MAX_BOARD_DIMENSION]`
pub fn is_valid_board_size(width: u8, height: u8) -> bool {
    let range = MIN_BOARD_DIMENSION..=MAX_BOARD_DIMENSION;
    range.contains(&width) && range.contains(&height)
}

/// Configuration for the game rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Width of the game grid
    pub board_width: u8,
    /// Height of the game grid
    pub board_height: u8,
    /// Initial length of the snake
    pub initial_snake_length: u16,

    /// Points awarded per food
    pub score_per_food: u16,
    /// Speed level goes up each time the score is a multiple of this
    pub speed_increase_interval: u16,
    /// Highest reachable speed level
    pub max_speed: u8,

    /// Step delay at speed level 1
    pub initial_delay_ms: u16,
    /// Delay removed per speed level
    pub delay_decrease_per_level: u16,
    /// Floor for the step delay
    pub min_delay_ms: u16,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: 20,
            board_height: 20,
            initial_snake_length: 3,
            score_per_food: 10,
            speed_increase_interval: 50,
            max_speed: 10,
            initial_delay_ms: 200,
            delay_decrease_per_level: 15,
            min_delay_ms: 10,
        }
    }
}

impl GameConfig {
    /// Create a new configuration with custom grid size
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            board_width: width,
            board_height: height,
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }

    /// Time between two steps at the given speed level
    pub fn step_delay(&self, speed: u8) -> Duration {
        let levels = u32::from(speed.max(1) - 1);
        let reduction = levels * u32::from(self.delay_decrease_per_level);
        let delay = u32::from(self.initial_delay_ms)
            .saturating_sub(reduction)
            .max(u32::from(self.min_delay_ms));
        Duration::from_millis(u64::from(delay))
    }
}
