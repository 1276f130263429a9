use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::control::{GamePhase, Orchestrator};
use crate::game::{FoodKind, GameState, Position};
use crate::metrics::GameMetrics;

/// Everything one frame needs, borrowed from the orchestrator
pub struct Scene<'a> {
    pub state: &'a GameState,
    pub phase: GamePhase,
    pub metrics: &'a GameMetrics,
    pub command_channel: bool,
    pub shared_memory: bool,
}

impl<'a> Scene<'a> {
    pub fn of(orchestrator: &'a Orchestrator) -> Self {
        Self {
            state: orchestrator.state(),
            phase: orchestrator.phase(),
            metrics: orchestrator.metrics(),
            command_channel: orchestrator.ipc().command_channel_active(),
            shared_memory: orchestrator.ipc().shared_memory_active(),
        }
    }
}

fn food_style(kind: FoodKind) -> (&'static str, Color) {
    match kind {
        FoodKind::Apple => ("● ", Color::Red),
        FoodKind::Cherry => ("♦ ", Color::LightRed),
        FoodKind::Banana => ("◗ ", Color::Yellow),
        FoodKind::Grape => ("✿ ", Color::Magenta),
        FoodKind::Orange => ("◉ ", Color::LightYellow),
    }
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, scene: &Scene<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        frame.render_widget(self.render_stats(scene), chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        match scene.phase {
            GamePhase::Menu => frame.render_widget(self.render_menu(scene), game_area),
            GamePhase::Playing => frame.render_widget(self.render_grid(scene.state), game_area),
            GamePhase::Paused => {
                frame.render_widget(self.render_grid(scene.state), game_area);
                let overlay = centered(game_area, 24, 3);
                frame.render_widget(Clear, overlay);
                frame.render_widget(self.render_paused(), overlay);
            }
            GamePhase::GameOver | GamePhase::Quit => {
                frame.render_widget(self.render_game_over(scene), game_area)
            }
        }

        frame.render_widget(self.render_controls(scene), chunks[2]);
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'_> {
        let mut lines = Vec::new();
        let head = state.snake.head();
        let (food_symbol, food_color) = food_style(state.board.food_kind);

        for y in 0..i32::from(state.board.height()) {
            let mut spans = Vec::new();

            for x in 0..i32::from(state.board.width()) {
                let pos = Position::new(x, y);

                let cell = if pos == head {
                    // Snake head - distinct color
                    Span::styled(
                        "■ ",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if state.snake.occupies(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Green))
                } else if state.board.is_food_at(pos) {
                    Span::styled(
                        food_symbol,
                        Style::default().fg(food_color).add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::styled(". ", Style::default().fg(Color::DarkGray))
                };

                spans.push(cell);
            }

            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .border_style(Style::default().fg(Color::White))
                    .title(" Snake "),
            )
            .alignment(Alignment::Center)
    }

    fn render_stats(&self, scene: &Scene<'_>) -> Paragraph<'_> {
        let label = Style::default().fg(Color::Yellow);
        let value = Style::default().fg(Color::White);

        let text = vec![Line::from(vec![
            Span::styled("Score: ", label),
            Span::styled(
                scene.state.score.to_string(),
                value.add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Speed: ", label),
            Span::styled(scene.state.speed.to_string(), value),
            Span::raw("    "),
            Span::styled("Time: ", label),
            Span::styled(scene.metrics.clock_label(), value),
            Span::raw("    "),
            Span::styled("Best: ", label),
            Span::styled(scene.metrics.high_score.to_string(), value),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_menu(&self, scene: &Scene<'_>) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "S N A K E",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(format!(
                "Board {}×{}",
                scene.state.board.width(),
                scene.state.board.height()
            )),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Press any key to start",
                Style::default().fg(Color::Gray),
            )]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Green)),
        )
    }

    fn render_paused(&self) -> Paragraph<'_> {
        Paragraph::new(Line::from(Span::styled(
            "|| PAUSED ||",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
    }

    fn render_game_over(&self, scene: &Scene<'_>) -> Paragraph<'_> {
        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                "GAME OVER",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    scene.state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(format!("Games played: {}", scene.metrics.games_played)),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to restart, any key for menu or ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "Q",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
    }

    fn render_controls(&self, scene: &Scene<'_>) -> Paragraph<'_> {
        let status = |on: bool| {
            if on {
                Span::styled("on", Style::default().fg(Color::Green))
            } else {
                Span::styled("off", Style::default().fg(Color::DarkGray))
            }
        };

        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" move | "),
            Span::styled("P", Style::default().fg(Color::Cyan)),
            Span::raw(" pause | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit | socket "),
            status(scene.command_channel),
            Span::raw(" | shm "),
            status(scene.shared_memory),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A `width`×`height` rectangle in the middle of `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
