use super::{
    action::{Action, Direction},
    config::GameConfig,
    state::{Board, CollisionType, FoodKind, GameState, Position, Snake},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::Duration;

/// Random probes tried before falling back to a scan of free cells
const FOOD_PLACEMENT_ATTEMPTS: usize = 64;

/// Information about a step
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// Whether the snake ate food this step
    pub ate_food: bool,
    /// Type of collision if one occurred
    pub collision_type: Option<CollisionType>,
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Whether the round has ended
    pub terminated: bool,
    /// Additional information about the step
    pub info: StepInfo,
}

/// The game engine that handles all game logic
///
/// Owns its random generator so that every engine (and every test) can be
/// seeded independently.
pub struct GameEngine {
    config: GameConfig,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create an engine with a deterministic food sequence
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Change the board size used by subsequent resets
    pub fn resize(&mut self, width: u8, height: u8) {
        self.config.board_width = width;
        self.config.board_height = height;
    }

    /// Start a fresh round
    pub fn reset(&mut self) -> GameState {
        let mut board = Board::new(self.config.board_width, self.config.board_height);
        let center = Position::new(
            i32::from(self.config.board_width / 2),
            i32::from(self.config.board_height / 2),
        );

        let snake = Snake::new(
            center,
            Direction::Right,
            usize::from(self.config.initial_snake_length),
        );

        self.place_food_avoiding(&mut board, &snake);

        GameState::new(snake, board)
    }

    /// Delay between steps for the current speed level
    pub fn step_delay(&self, state: &GameState) -> Duration {
        self.config.step_delay(state.speed)
    }

    /// Execute one step of the game
    pub fn step(&mut self, state: &mut GameState, action: Action) -> StepResult {
        if !state.is_alive {
            return StepResult {
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    collision_type: None,
                },
            };
        }

        let requested = match action {
            Action::Move(direction) => direction,
            Action::Continue => state.snake.direction(),
        };

        state.snake.advance(requested);
        state.steps += 1;

        if let Some(collision_type) = self.check_collision(state) {
            state.is_alive = false;

            return StepResult {
                terminated: true,
                info: StepInfo {
                    ate_food: false,
                    collision_type: Some(collision_type),
                },
            };
        }

        let ate_food = state.board.is_food_at(state.snake.head());

        if ate_food {
            state.snake.grow();
            state.score = state.score.saturating_add(self.config.score_per_food);
            self.place_food_avoiding(&mut state.board, &state.snake);

            let interval = self.config.speed_increase_interval;
            if interval > 0 && state.score % interval == 0 && state.speed < self.config.max_speed
            {
                state.speed += 1;
            }
        }

        StepResult {
            terminated: false,
            info: StepInfo {
                ate_food,
                collision_type: None,
            },
        }
    }

    /// Check if the head is on a wall or on the body
    fn check_collision(&self, state: &GameState) -> Option<CollisionType> {
        if state.board.is_wall(state.snake.head()) {
            return Some(CollisionType::Wall);
        }

        if state.snake.check_self_collision() {
            return Some(CollisionType::SelfCollision);
        }

        None
    }

    /// Put food on any cell of the board
    pub fn place_food(&mut self, board: &mut Board) {
        board.food = self.random_cell(board);
        board.food_kind = FoodKind::random(&mut self.rng);
    }

    /// Put food on a cell the snake does not occupy
    ///
    /// Leaves the food where it was if the snake covers the whole board.
    pub fn place_food_avoiding(&mut self, board: &mut Board, snake: &Snake) {
        board.food_kind = FoodKind::random(&mut self.rng);

        for _ in 0..FOOD_PLACEMENT_ATTEMPTS {
            let pos = self.random_cell(board);
            if !snake.occupies(pos) {
                board.food = pos;
                return;
            }
        }

        let free: Vec<Position> = (0..i32::from(board.height()))
            .flat_map(|y| (0..i32::from(board.width())).map(move |x| Position::new(x, y)))
            .filter(|pos| !snake.occupies(*pos))
            .collect();

        if !free.is_empty() {
            board.food = free[self.rng.gen_range(0..free.len())];
        }
    }

    fn random_cell(&mut self, board: &Board) -> Position {
        let x = self.rng.gen_range(0..board.width().max(1));
        let y = self.rng.gen_range(0..board.height().max(1));
        Position::new(i32::from(x), i32::from(y))
    }
}
