use super::{
    action::{Command, Direction},
    config::{GameConfig, Speed},
    state::{CollisionType, GameOutcome, GameState, Phase, Position, Snake},
};
use log::{debug, info, trace};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Random draws before food placement falls back to scanning the free cells
const MAX_FOOD_SAMPLES: usize = 64;

/// What a single call to [`GameEngine::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game was not active; nothing changed
    Skipped,
    /// Moved one cell without eating
    Moved,
    /// Ate food and grew by one cell
    Ate,
    /// Hit a wall or itself; the move was rejected and the game is over
    Collided(CollisionType),
    /// Ate the last free cell's food; the game is over and won
    BoardFilled,
}

/// The game engine that owns the state and handles all game logic
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    speed: Speed,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new game engine with the given configuration.
    ///
    /// Food placement is seeded from `config.seed` when set, from entropy otherwise.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::build(config, rng)
    }

    /// Create an engine with deterministic food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed))
    }

    /// Create an engine resuming from an arbitrary state
    pub fn with_state(config: GameConfig, state: GameState, seed: u64) -> Self {
        Self {
            speed: config.speed,
            config,
            state,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn build(config: GameConfig, rng: StdRng) -> Self {
        let mut engine = Self {
            speed: config.speed,
            state: GameState::new(
                Snake::new(config.start_position()),
                None,
                Direction::Right,
                config.grid_width,
                config.grid_height,
            ),
            config,
            rng,
        };
        engine.reset();
        engine
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn speed(&self) -> Speed {
        self.speed
    }

    /// Change the tick speed. Survives resets.
    pub fn set_speed(&mut self, speed: Speed) {
        self.speed = speed;
    }

    /// Reset the game to initial state, whatever the current phase
    pub fn reset(&mut self) {
        let mut state = GameState::new(
            Snake::new(self.config.start_position()),
            None,
            Direction::Right,
            self.config.grid_width,
            self.config.grid_height,
        );
        state.food = spawn_food(&mut self.rng, &state);
        self.state = state;
    }

    /// Buffer a turn for the next tick. Reversals are silently ignored.
    pub fn set_direction(&mut self, requested: Direction) {
        if requested.is_opposite(self.state.direction) {
            trace!("ignoring reversal to {:?}", requested);
            return;
        }
        self.state.pending_direction = requested;
    }

    /// Flip between playing and paused. Does nothing once the game is over.
    pub fn toggle_play(&mut self) {
        if self.state.game_over {
            return;
        }
        self.state.running = !self.state.running;
    }

    /// Route a command to its handler
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Turn(direction) => self.set_direction(direction),
            Command::TogglePlay => self.toggle_play(),
            Command::Reset => self.reset(),
        }
    }

    /// Advance the game by one cell
    pub fn tick(&mut self) -> TickOutcome {
        if self.state.phase() != Phase::Active {
            return TickOutcome::Skipped;
        }

        self.state.direction = self.state.pending_direction;
        self.state.ticks += 1;

        let new_head = self
            .state
            .snake
            .head()
            .moved_in_direction(self.state.direction);

        if let Some(collision_type) = check_collision(&self.state, new_head) {
            debug!(
                "{:?} collision at ({}, {}) after {} ticks",
                collision_type, new_head.x, new_head.y, self.state.ticks
            );
            self.finish(GameOutcome::Collision(collision_type));
            return TickOutcome::Collided(collision_type);
        }

        let ate_food = self.state.food == Some(new_head);
        self.state.snake.advance(new_head, ate_food);

        if !ate_food {
            trace!("head -> ({}, {})", new_head.x, new_head.y);
            return TickOutcome::Moved;
        }

        self.state.score += 1;
        self.state.food = spawn_food(&mut self.rng, &self.state);

        match self.state.food {
            Some(food) => {
                debug!(
                    "ate food, score {}; next food at ({}, {})",
                    self.state.score, food.x, food.y
                );
                TickOutcome::Ate
            }
            None => {
                info!("board filled with score {}", self.state.score);
                self.finish(GameOutcome::BoardFilled);
                TickOutcome::BoardFilled
            }
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        self.state.game_over = true;
        self.state.running = false;
        self.state.outcome = Some(outcome);
    }
}

/// Check if the new head position causes a collision.
///
/// The whole current body counts, including a tail that would move away this tick.
fn check_collision(state: &GameState, pos: Position) -> Option<CollisionType> {
    if !state.is_in_bounds(pos) {
        return Some(CollisionType::Wall);
    }

    if state.is_occupied_by_snake(pos) {
        return Some(CollisionType::SelfCollision);
    }

    None
}

/// Pick a cell uniformly at random among those not covered by the snake.
///
/// Returns `None` when the snake covers the whole board.
fn spawn_food<R: Rng>(rng: &mut R, state: &GameState) -> Option<Position> {
    if state.free_cells() == 0 {
        return None;
    }

    for _ in 0..MAX_FOOD_SAMPLES {
        let x = rng.gen_range(0..state.grid_width) as i32;
        let y = rng.gen_range(0..state.grid_height) as i32;
        let pos = Position::new(x, y);

        if !state.is_occupied_by_snake(pos) {
            return Some(pos);
        }
    }

    debug!(
        "no free cell after {} samples, scanning {} free cells",
        MAX_FOOD_SAMPLES,
        state.free_cells()
    );

    let free: Vec<Position> = (0..state.grid_height)
        .flat_map(|y| (0..state.grid_width).map(move |x| Position::new(x as i32, y as i32)))
        .filter(|pos| !state.is_occupied_by_snake(*pos))
        .collect();

    free.choose(rng).copied()
}
