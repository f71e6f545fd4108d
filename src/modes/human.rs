use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use log::info;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stdout, stdout};
use std::time::Duration;
use tokio::time::interval;

use crate::game::{Command, GameConfig, GameEngine, Phase, TickOutcome};
use crate::input::{InputHandler, KeyAction};
use crate::metrics::GameMetrics;
use crate::render::Renderer;
use crate::scheduler::TickScheduler;

/// Render at 30 FPS (33ms per frame)
const RENDER_INTERVAL: Duration = Duration::from_millis(33);

/// An interactive game in the terminal.
///
/// Draws on stdout so that stderr stays free for log output.
pub struct HumanMode {
    engine: GameEngine,
    scheduler: TickScheduler,
    metrics: GameMetrics,
    renderer: Renderer,
    input_handler: InputHandler,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig) -> Self {
        Self {
            engine: GameEngine::new(config),
            scheduler: TickScheduler::new(),
            metrics: GameMetrics::new(),
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        let config = self.engine.config();
        info!(
            "starting {}x{} game at {} speed",
            config.grid_width,
            config.grid_height,
            self.engine.speed().as_str()
        );

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        info!(
            "quit after {} games, best score {}",
            self.metrics.games_played, self.metrics.best_score
        );

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut render_timer = interval(RENDER_INTERVAL);

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => self.handle_event(event),
                        Some(Err(err)) => {
                            return Err(err).context("Failed to read terminal event");
                        }
                        None => self.should_quit = true,
                    }
                }

                // Game logic tick; pending while the game isn't active
                _ = self.scheduler.tick() => {
                    self.update_game();
                }

                // Render frame
                _ = render_timer.tick() => {
                    self.metrics.update(self.engine.phase() == Phase::Active);
                    terminal.draw(|frame| {
                        self.renderer.render(
                            frame,
                            self.engine.state(),
                            self.engine.speed(),
                            &self.metrics,
                        );
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            let action = self.input_handler.handle_key_event(key);
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: KeyAction) {
        match action {
            KeyAction::Command(command) => {
                // Tally a game abandoned mid-way before it is replaced
                if command == Command::Reset
                    && self.engine.phase() != Phase::Over
                    && self.engine.state().ticks > 0
                {
                    self.metrics.on_game_over(self.engine.state().score);
                }

                self.engine.apply(command);

                match command {
                    Command::Reset => {
                        info!("game reset");
                        self.metrics.on_game_start();
                    }
                    Command::TogglePlay => info!("phase now {:?}", self.engine.phase()),
                    Command::Turn(_) => {}
                }
            }
            KeyAction::SetSpeed(speed) => {
                info!("speed set to {}", speed.as_str());
                self.engine.set_speed(speed);
            }
            KeyAction::Quit => {
                self.should_quit = true;
            }
            KeyAction::None => {}
        }

        self.scheduler.sync(self.engine.phase(), self.engine.speed());
    }

    fn update_game(&mut self) {
        let outcome = self.engine.tick();

        match outcome {
            TickOutcome::Collided(collision) => {
                let score = self.engine.state().score;
                info!("game over ({:?}), score {}", collision, score);
                self.metrics.on_game_over(score);
            }
            TickOutcome::BoardFilled => {
                let score = self.engine.state().score;
                info!("board cleared, score {}", score);
                self.metrics.on_game_over(score);
            }
            TickOutcome::Moved | TickOutcome::Ate | TickOutcome::Skipped => {}
        }

        self.scheduler.sync(self.engine.phase(), self.engine.speed());
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, Position, Speed};
    use crossterm::event::{KeyCode, KeyEvent, KeyEventState, KeyModifiers};

    fn seeded_mode() -> HumanMode {
        HumanMode::new(GameConfig {
            seed: Some(17),
            ..GameConfig::default()
        })
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_game_initialization() {
        let mode = seeded_mode();
        assert_eq!(mode.engine.phase(), Phase::Idle);
        assert_eq!(mode.engine.state().score, 0);
        assert!(!mode.scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_pause_arms_and_disarms_scheduler() {
        let mut mode = seeded_mode();

        mode.handle_event(key(KeyCode::Char(' ')));
        assert_eq!(mode.engine.phase(), Phase::Active);
        assert!(mode.scheduler.is_active());

        mode.handle_event(key(KeyCode::Enter));
        assert_eq!(mode.engine.phase(), Phase::Idle);
        assert!(!mode.scheduler.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_change_while_playing() {
        let mut mode = seeded_mode();
        mode.handle_event(key(KeyCode::Char(' ')));
        assert_eq!(mode.scheduler.period(), Some(Speed::Normal.tick_interval()));

        mode.handle_event(key(KeyCode::Char('3')));
        assert_eq!(mode.engine.speed(), Speed::Hard);
        assert_eq!(mode.scheduler.period(), Some(Speed::Hard.tick_interval()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduled_ticks_move_snake() {
        let mut mode = seeded_mode();
        mode.handle_event(key(KeyCode::Up));
        mode.handle_event(key(KeyCode::Char(' ')));

        mode.scheduler.tick().await;
        mode.update_game();

        assert_eq!(mode.engine.state().snake.head(), Position::new(8, 9));
        assert_eq!(mode.engine.state().direction, Direction::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_game_over_stops_scheduler() {
        let mut mode = seeded_mode();
        mode.handle_event(key(KeyCode::Up));
        mode.handle_event(key(KeyCode::Char(' ')));

        // Ten cells from the top wall; the eleventh tick hits it
        for _ in 0..11 {
            if mode.engine.phase() != Phase::Active {
                break;
            }
            mode.scheduler.tick().await;
            mode.update_game();
        }

        assert_eq!(mode.engine.phase(), Phase::Over);
        assert!(!mode.scheduler.is_active());
        assert_eq!(mode.metrics.games_played, 1);

        // Play is refused until a reset
        mode.handle_event(key(KeyCode::Char(' ')));
        assert!(!mode.scheduler.is_active());

        mode.handle_event(key(KeyCode::Char('r')));
        assert_eq!(mode.engine.phase(), Phase::Idle);
        assert_eq!(mode.engine.state().snake.cells(), &[Position::new(8, 10)]);
        assert_eq!(mode.metrics.games_played, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_while_playing_stops_scheduler() {
        let mut mode = seeded_mode();
        mode.handle_event(key(KeyCode::Char(' ')));
        mode.scheduler.tick().await;
        mode.update_game();

        mode.handle_event(key(KeyCode::Char('R')));
        assert_eq!(mode.engine.phase(), Phase::Idle);
        assert!(!mode.scheduler.is_active());
        assert_eq!(mode.metrics.games_played, 1);
    }

    #[test]
    fn test_key_release_ignored() {
        let mut mode = seeded_mode();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };

        mode.handle_event(Event::Key(release));
        assert!(!mode.should_quit);

        mode.handle_event(key(KeyCode::Char('q')));
        assert!(mode.should_quit);
    }
}
