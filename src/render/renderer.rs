use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::game::{GameOutcome, GameState, Phase, Position, Speed};
use crate::metrics::GameMetrics;

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, state: &GameState, speed: Speed, metrics: &GameMetrics) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Game area
                Constraint::Length(3), // Footer
            ])
            .split(frame.area());

        let stats = self.render_stats(state, speed, metrics);
        frame.render_widget(stats, chunks[0]);

        // Center the game grid horizontally
        let game_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(10),
                Constraint::Percentage(80),
                Constraint::Percentage(10),
            ])
            .split(chunks[1])[1];

        frame.render_widget(self.render_grid(state), game_area);

        if let Some(outcome) = state.outcome {
            let popup = centered_rect(36, 8, game_area);
            frame.render_widget(Clear, popup);
            frame.render_widget(self.render_game_over(state, outcome), popup);
        }

        frame.render_widget(self.render_controls(), chunks[2]);
    }

    fn render_grid(&self, state: &GameState) -> Paragraph<'static> {
        let mut lines = Vec::with_capacity(state.grid_height);

        for y in 0..state.grid_height {
            let mut spans = Vec::with_capacity(state.grid_width);

            for x in 0..state.grid_width {
                let pos = Position::new(x as i32, y as i32);

                let cell = if pos == state.snake.head() {
                    Span::styled(
                        "■ ",
                        Style::default()
                            .fg(Color::LightBlue)
                            .add_modifier(Modifier::BOLD),
                    )
                } else if state.snake.occupies(pos) {
                    Span::styled("□ ", Style::default().fg(Color::Blue))
                } else if state.food == Some(pos) {
                    Span::styled(
                        "O ",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
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

    fn render_stats(
        &self,
        state: &GameState,
        speed: Speed,
        metrics: &GameMetrics,
    ) -> Paragraph<'static> {
        let (status, status_color) = match state.phase() {
            Phase::Idle if state.ticks == 0 => ("READY", Color::Green),
            Phase::Idle => ("PAUSED", Color::Yellow),
            Phase::Active => ("PLAYING", Color::Green),
            Phase::Over => ("OVER", Color::Red),
        };

        let text = vec![Line::from(vec![
            Span::styled("Score: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                state.score.to_string(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("    "),
            Span::styled("Speed: ", Style::default().fg(Color::Yellow)),
            Span::styled(speed.as_str(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Time: ", Style::default().fg(Color::Yellow)),
            Span::styled(metrics.format_time(), Style::default().fg(Color::White)),
            Span::raw("    "),
            Span::styled("Best: ", Style::default().fg(Color::Yellow)),
            Span::styled(
                metrics.best_score.to_string(),
                Style::default().fg(Color::White),
            ),
            Span::raw("    "),
            Span::styled(
                status,
                Style::default()
                    .fg(status_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }

    fn render_game_over(&self, state: &GameState, outcome: GameOutcome) -> Paragraph<'static> {
        let (title, color) = match outcome {
            GameOutcome::Collision(_) => ("GAME OVER", Color::Red),
            GameOutcome::BoardFilled => ("BOARD CLEARED", Color::Green),
        };

        let text = vec![
            Line::from(""),
            Line::from(vec![Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Final Score: ", Style::default().fg(Color::Yellow)),
                Span::styled(
                    state.score.to_string(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled(
                    "R",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to play again", Style::default().fg(Color::Gray)),
            ]),
        ];

        Paragraph::new(text).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
    }

    fn render_controls(&self) -> Paragraph<'static> {
        let text = vec![Line::from(vec![
            Span::styled("↑↓←→", Style::default().fg(Color::Cyan)),
            Span::raw(" or "),
            Span::styled("WASD", Style::default().fg(Color::Cyan)),
            Span::raw(" move | "),
            Span::styled("Space", Style::default().fg(Color::Cyan)),
            Span::raw(" play/pause | "),
            Span::styled("R", Style::default().fg(Color::Green)),
            Span::raw(" reset | "),
            Span::styled("1-3", Style::default().fg(Color::Cyan)),
            Span::raw(" speed | "),
            Span::styled("Q", Style::default().fg(Color::Red)),
            Span::raw(" quit"),
        ])];

        Paragraph::new(text).alignment(Alignment::Center)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// A `width` x `height` rect centred in `area`, clipped to it
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{CollisionType, Direction, Snake};
    use ratatui::{Terminal, backend::TestBackend};

    fn draw(state: &GameState) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| Renderer::new().render(frame, state, Speed::Hard, &GameMetrics::new()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    fn count(screen: &[String], symbol: &str) -> usize {
        screen.iter().map(|row| row.matches(symbol).count()).sum()
    }

    fn sample_state() -> GameState {
        let snake = Snake::from_cells(vec![
            Position::new(5, 5),
            Position::new(4, 5),
            Position::new(3, 5),
        ])
        .unwrap();
        GameState::new(snake, Some(Position::new(12, 7)), Direction::Right, 20, 20)
    }

    #[test]
    fn test_head_and_body_drawn_distinctly() {
        let screen = draw(&sample_state());

        assert_eq!(count(&screen, "■"), 1);
        assert_eq!(count(&screen, "□"), 2);
    }

    #[test]
    fn test_header_shows_score_and_speed() {
        let mut state = sample_state();
        state.score = 7;
        let screen = draw(&state);

        assert!(screen[0..3].iter().any(|row| row.contains("Score: 7")));
        assert!(screen[0..3].iter().any(|row| row.contains("Speed: Hard")));
        assert!(screen[0..3].iter().any(|row| row.contains("READY")));
    }

    #[test]
    fn test_game_over_overlay() {
        let mut state = sample_state();
        state.score = 3;
        state.game_over = true;
        state.outcome = Some(GameOutcome::Collision(CollisionType::Wall));
        let screen = draw(&state);

        assert!(screen.iter().any(|row| row.contains("GAME OVER")));
        assert!(screen.iter().any(|row| row.contains("Final Score: 3")));
    }

    #[test]
    fn test_board_cleared_overlay() {
        let mut state = sample_state();
        state.game_over = true;
        state.outcome = Some(GameOutcome::BoardFilled);
        state.food = None;
        let screen = draw(&state);

        assert!(screen.iter().any(|row| row.contains("BOARD CLEARED")));
        assert!(!screen.iter().any(|row| row.contains("GAME OVER")));
    }

    #[test]
    fn test_no_overlay_while_playing() {
        let mut state = sample_state();
        state.running = true;
        let screen = draw(&state);

        assert!(!screen.iter().any(|row| row.contains("Final Score")));
        assert!(screen[0..3].iter().any(|row| row.contains("PLAYING")));
    }

    #[test]
    fn test_centered_rect_clips() {
        let area = Rect::new(0, 0, 10, 4);
        assert_eq!(centered_rect(36, 8, area), area);
        assert_eq!(centered_rect(4, 2, area), Rect::new(3, 1, 4, 2));
    }
}
