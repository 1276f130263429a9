use rand::Rng;
use std::collections::VecDeque;

use super::action::Direction;

/// A position on the game grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position in a direction
    pub fn moved_in_direction(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx, dy)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at the front
    body: VecDeque<Position>,
    /// Current direction of movement
    direction: Direction,
    /// Keep the tail on the next move
    growing: bool,
}

impl Snake {
    /// Create a new snake with given starting position and direction
    pub fn new(head: Position, direction: Direction, length: usize) -> Self {
        let (dx, dy) = direction.delta();
        let body = (0..length.max(1) as i32)
            .map(|i| head.moved_by(-dx * i, -dy * i))
            .collect();

        Self {
            body,
            direction,
            growing: false,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// All segments, head first
    pub fn segments(&self) -> impl Iterator<Item = &Position> + '_ {
        self.body.iter()
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body.iter().skip(1).any(|segment| *segment == pos)
    }

    /// Check if any segment, head included, occupies `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Move one cell towards `requested`
    ///
    /// A request for the exact opposite of the current heading is ignored and
    /// the snake keeps going straight.
    pub fn advance(&mut self, requested: Direction) {
        if !self.direction.is_opposite(requested) {
            self.direction = requested;
        }

        let new_head = self.head().moved_in_direction(self.direction);
        self.body.push_front(new_head);

        if self.growing {
            self.growing = false;
        } else {
            self.body.pop_back();
        }
    }

    /// Keep the tail on the next call to `advance`
    pub fn grow(&mut self) {
        self.growing = true;
    }

    /// True if the head shares a cell with another segment
    pub fn check_self_collision(&self) -> bool {
        self.collides_with_body(self.head())
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (should never happen in practice)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Kind of food currently on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FoodKind {
    Apple = 0,
    Cherry = 1,
    Banana = 2,
    Grape = 3,
    Orange = 4,
}

impl FoodKind {
    pub const ALL: [FoodKind; 5] = [
        FoodKind::Apple,
        FoodKind::Cherry,
        FoodKind::Banana,
        FoodKind::Grape,
        FoodKind::Orange,
    ];

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

/// The playing field and what lies on it
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    width: u8,
    height: u8,
    pub food: Position,
    pub food_kind: FoodKind,
}

impl Board {
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            food: Position::new(0, 0),
            food_kind: FoodKind::Apple,
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// True for every cell outside the grid
    pub fn is_wall(&self, pos: Position) -> bool {
        pos.x < 0 || pos.y < 0 || pos.x >= i32::from(self.width) || pos.y >= i32::from(self.height)
    }

    pub fn is_food_at(&self, pos: Position) -> bool {
        self.food == pos
    }
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionType {
    /// Snake hit a wall
    Wall,
    /// Snake hit itself
    SelfCollision,
}

/// Complete state of one round
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub board: Board,
    pub score: u16,
    pub speed: u8,
    pub steps: u32,
    pub is_alive: bool,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake, board: Board) -> Self {
        Self {
            snake,
            board,
            score: 0,
            speed: 1,
            steps: 0,
            is_alive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_position_movement() {
        let pos = Position::new(5, 5);
        assert_eq!(pos.moved_by(1, 0), Position::new(6, 5));
        assert_eq!(pos.moved_by(-1, 0), Position::new(4, 5));
        assert_eq!(pos.moved_by(0, 1), Position::new(5, 6));
        assert_eq!(pos.moved_by(0, -1), Position::new(5, 4));
    }

    #[test]
    fn test_snake_creation() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        let body: Vec<_> = snake.segments().copied().collect();
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(5, 5));
        assert_eq!(body[1], Position::new(4, 5));
        assert_eq!(body[2], Position::new(3, 5));
    }

    #[test]
    fn test_snake_movement() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3);

        snake.advance(Direction::Right);
        assert_eq!(snake.len(), 3);
        assert_eq!(snake.head(), Position::new(6, 5));

        snake.grow();
        snake.advance(Direction::Down);
        assert_eq!(snake.len(), 4);
        assert_eq!(snake.head(), Position::new(6, 6));
        assert_eq!(snake.direction(), Direction::Down);

        // growth applies once
        snake.advance(Direction::Down);
        assert_eq!(snake.len(), 4);
    }

    #[test]
    fn test_reversal_is_ignored() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        snake.advance(Direction::Left);
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.head(), Position::new(6, 5));
    }

    #[test]
    fn test_collision_detection() {
        let snake = Snake::new(Position::new(5, 5), Direction::Right, 3);
        assert!(!snake.collides_with_body(Position::new(5, 5))); // head
        assert!(snake.collides_with_body(Position::new(4, 5))); // body
        assert!(!snake.collides_with_body(Position::new(10, 10))); // empty
        assert!(!snake.check_self_collision());
    }

    #[test]
    fn test_self_collision_after_loop() {
        let mut snake = Snake::new(Position::new(5, 5), Direction::Right, 5);
        snake.advance(Direction::Down);
        snake.advance(Direction::Left);
        snake.advance(Direction::Up);
        assert!(snake.check_self_collision());
    }

    #[test]
    fn test_bounds_checking() {
        let board = Board::new(20, 20);

        assert!(!board.is_wall(Position::new(0, 0)));
        assert!(!board.is_wall(Position::new(19, 19)));
        assert!(board.is_wall(Position::new(-1, 0)));
        assert!(board.is_wall(Position::new(20, 0)));
        assert!(board.is_wall(Position::new(0, 20)));
    }

    #[test]
    fn test_food_kind_ordinals() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let kind = FoodKind::random(&mut rng);
            assert_eq!(FoodKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(FoodKind::from_u8(5), None);
    }
}
