use super::direction::Direction;
use super::levels::LevelSchedule;
use super::snake::Snake;
use crate::consts;
use rand::{seq::IteratorRandom, Rng};
use ratatui::layout::{Position, Rect, Size};
use std::time::Duration;

/// The game engine proper: a single-threaded state machine advanced one
/// atomic tick at a time by whatever is driving it.
///
/// Input never touches the snake directly; it only queues a direction
/// intent, which is committed at the next tick boundary.  Rendering pulls a
/// read-only [`Snapshot`] and never mutates anything.  The engine is generic
/// over its random number generator so that tests can drive it with a
/// seeded one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Engine<R = rand::rngs::ThreadRng> {
    pub(super) rng: R,

    /// Number of cells along each side of the (square) board
    pub(super) side: u16,

    pub(super) schedule: LevelSchedule,
    pub(super) snake: Snake,

    /// The food cell, never coinciding with a snake cell.  `None` only when
    /// the snake has filled the entire board.
    pub(super) food: Option<Position>,

    /// The committed direction of travel; `None` until the game starts
    pub(super) heading: Option<Direction>,

    /// A direction intent queued by input, committed at the next tick
    pub(super) queued: Option<Direction>,

    pub(super) phase: Phase,
    pub(super) score: u32,
    pub(super) level: u32,

    /// Fruits eaten on the current level
    pub(super) food_eaten: u32,

    /// Current tick period
    pub(super) speed: Duration,
}

impl<R: Rng> Engine<R> {
    pub(super) fn new_with_rng(side: u16, rng: R) -> Engine<R> {
        let schedule = LevelSchedule::default();
        let mut engine = Engine {
            rng,
            side,
            schedule,
            snake: Snake::new(Position::new(side / 2, side / 2)),
            food: None,
            heading: None,
            queued: None,
            phase: Phase::Idle,
            score: 0,
            level: 1,
            food_eaten: 0,
            speed: schedule.speed_for(1),
        };
        engine.place_food();
        engine
    }

    /// Begin play: the snake starts moving east.  No-op unless idle.
    pub(super) fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.heading = Some(Direction::East);
            self.queued = None;
            self.phase = Phase::Running;
        }
    }

    /// Queue a direction intent from input.  An intent that exactly reverses
    /// the committed direction is discarded, so the snake can never fold
    /// back onto its own neck within a single tick.
    pub(super) fn queue_direction(&mut self, direction: Direction) {
        if self.phase != Phase::Running {
            return;
        }
        if self.heading.is_some_and(|h| h.reverse() == direction) {
            return;
        }
        self.queued = Some(direction);
    }

    pub(super) fn pause(&mut self) {
        if self.phase == Phase::Running {
            self.phase = Phase::Paused;
        }
    }

    pub(super) fn resume(&mut self) {
        if self.phase == Phase::Paused {
            self.phase = Phase::Running;
        }
    }

    /// Advance the game by one step: commit the queued direction, move the
    /// head, resolve collisions, then food, then the level quota.  No-op
    /// unless running.
    pub(super) fn tick(&mut self) {
        if self.phase != Phase::Running {
            return;
        }
        if let Some(direction) = self.queued.take() {
            self.heading = Some(direction);
        }
        let Some(heading) = self.heading else {
            return;
        };
        // A wall hit leaves the score and the snake exactly as they were.
        let Some(head) = heading.advance(self.snake.head(), self.side) else {
            self.game_over();
            return;
        };
        // Self-collision is checked before insertion, tail included.
        if self.snake.occupies(head) {
            self.game_over();
            return;
        }
        self.snake.push_head(head);
        if self.food == Some(head) {
            self.score += consts::FOOD_POINTS;
            self.food_eaten += 1;
            self.place_food();
            if self.food_eaten >= self.schedule.food_per_level {
                self.level_up();
            }
        } else {
            self.snake.pop_tail();
        }
    }

    /// Resolve a [`Phase::LevelBreak`] or [`Phase::Completed`] notification.
    /// Continuing from a level break resumes play; continuing after winning
    /// starts a fresh game.  Quitting either ends the game.
    pub(super) fn acknowledge(&mut self, ack: Ack) {
        match (self.phase, ack) {
            (Phase::LevelBreak(_), Ack::Continue) => self.phase = Phase::Running,
            (Phase::Completed, Ack::Continue) => {
                self.restart();
                self.start();
            }
            (Phase::LevelBreak(_) | Phase::Completed, Ack::Quit) => self.game_over(),
            _ => (),
        }
    }

    /// Reset everything except the board size and the schedule.  The high
    /// score is the persistence collaborator's business, not ours.
    pub(super) fn restart(&mut self) {
        self.snake.reset(self.center());
        self.heading = None;
        self.queued = None;
        self.phase = Phase::Idle;
        self.score = 0;
        self.level = 1;
        self.food_eaten = 0;
        self.speed = self.schedule.speed_for(1);
        self.place_food();
    }

    fn level_up(&mut self) {
        if self.schedule.is_final(self.level) {
            self.phase = Phase::Completed;
        } else {
            let cleared = self.level;
            self.level += 1;
            self.food_eaten = 0;
            self.speed = self.schedule.speed_for(self.level);
            self.snake.reset(self.center());
            self.place_food();
            self.phase = Phase::LevelBreak(cleared);
        }
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
    }

    /// Place the food on a uniformly random cell not occupied by the snake.
    /// Rejection sampling is the fast path; if the board is nearly full the
    /// sampling is cut off after side² attempts and the food is chosen from
    /// the enumerated free cells instead, so placement always terminates.
    pub(super) fn place_food(&mut self) {
        self.food = None;
        if self.snake.len() >= usize::from(self.side) * usize::from(self.side) {
            return;
        }
        let attempts = u32::from(self.side) * u32::from(self.side);
        for _ in 0..attempts {
            let pos = Position::new(
                self.rng.random_range(0..self.side),
                self.rng.random_range(0..self.side),
            );
            if !self.snake.occupies(pos) {
                self.food = Some(pos);
                return;
            }
        }
        let snake = &self.snake;
        let rng = &mut self.rng;
        self.food = Rect::from((Position::ORIGIN, Size::new(self.side, self.side)))
            .positions()
            .filter(|&pos| !snake.occupies(pos))
            .choose(rng);
    }

    fn center(&self) -> Position {
        Position::new(self.side / 2, self.side / 2)
    }
}

impl<R> Engine<R> {
    /// Read-only view of the game for the rendering collaborator
    pub(super) fn snapshot(&self) -> Snapshot {
        Snapshot {
            snake: self.snake.iter().collect(),
            food: self.food,
            heading: self.heading,
            score: self.score,
            level: self.level,
            food_eaten: self.food_eaten,
            running: matches!(self.phase, Phase::Running | Phase::Paused),
            paused: self.phase == Phase::Paused,
        }
    }
}

/// Where the engine is in its lifecycle.
///
/// `Idle → Running ⇄ Paused`; running play ends in `GameOver`, pauses at a
/// `LevelBreak` awaiting acknowledgment, or (once the last level's quota is
/// met) ends in `Completed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Phase {
    /// Waiting for the first start
    Idle,
    Running,
    Paused,
    /// The contained level was just cleared; play resumes on acknowledgment
    LevelBreak(u32),
    GameOver,
    /// Every level has been cleared
    Completed,
}

/// The player's answer to a `LevelBreak`/`Completed` notification
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Ack {
    Continue,
    Quit,
}

/// What the rendering collaborator gets to see: cells head-first, plus the
/// counters shown in the status bar.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Snapshot {
    pub(super) snake: Vec<Position>,
    pub(super) food: Option<Position>,
    pub(super) heading: Option<Direction>,
    pub(super) score: u32,
    pub(super) level: u32,
    pub(super) food_eaten: u32,
    pub(super) running: bool,
    pub(super) paused: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;
    use std::collections::VecDeque;

    const RNG_SEED: u64 = 0x0123456789ABCDEF;

    fn engine() -> Engine<ChaCha12Rng> {
        Engine::new_with_rng(20, ChaCha12Rng::seed_from_u64(RNG_SEED))
    }

    #[test]
    fn new_engine() {
        let game = engine();
        assert_eq!(game.phase, Phase::Idle);
        assert_eq!(game.score, 0);
        assert_eq!(game.level, 1);
        assert_eq!(game.food_eaten, 0);
        assert_eq!(game.speed, Duration::from_millis(150));
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.snake.head(), Position::new(10, 10));
        assert_eq!(game.heading, None);
        let food = game.food.expect("food should be placed");
        assert!(!game.snake.occupies(food));
    }

    #[test]
    fn start_heads_east() {
        let mut game = engine();
        game.start();
        assert_eq!(game.phase, Phase::Running);
        assert_eq!(game.heading, Some(Direction::East));
    }

    #[test]
    fn start_is_noop_while_running() {
        let mut game = engine();
        game.start();
        game.heading = Some(Direction::North);
        game.start();
        assert_eq!(game.heading, Some(Direction::North));
        assert_eq!(game.phase, Phase::Running);
    }

    #[test]
    fn growth_only_on_food() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.snake.head(), Position::new(11, 10));
        assert_eq!(game.snake.len(), 2);
        assert_eq!(game.score, 10);
        assert_eq!(game.food_eaten, 1);
        let food = game.food.expect("food should be replaced");
        assert!(!game.snake.occupies(food));
        game.food = Some(Position::new(0, 0));
        game.tick();
        assert_eq!(game.snake.head(), Position::new(12, 10));
        assert_eq!(game.snake.len(), 2);
        assert_eq!(game.score, 10);
        assert_eq!(game.food_eaten, 1);
    }

    #[test]
    fn wall_collision_ends_game_unchanged() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(0, 0));
        for _ in 0..9 {
            game.tick();
        }
        assert_eq!(game.phase, Phase::Running);
        assert_eq!(game.snake.head(), Position::new(19, 10));
        game.tick();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(game.snake.head(), Position::new(19, 10));
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.score, 0);
    }

    #[test]
    fn self_collision_ends_game() {
        let mut game = engine();
        game.start();
        game.snake.cells = VecDeque::from([
            Position::new(5, 5),
            Position::new(5, 6),
            Position::new(5, 7),
        ]);
        game.heading = Some(Direction::South);
        game.food = Some(Position::new(0, 0));
        game.tick();
        assert_eq!(game.phase, Phase::GameOver);
        assert_eq!(
            game.snake.iter().collect::<Vec<_>>(),
            [
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(5, 7),
            ]
        );
    }

    #[test]
    fn empty_adjacent_cell_is_safe() {
        let mut game = engine();
        game.start();
        game.snake.cells = VecDeque::from([
            Position::new(5, 5),
            Position::new(5, 6),
            Position::new(5, 7),
        ]);
        game.heading = Some(Direction::North);
        game.food = Some(Position::new(0, 0));
        game.tick();
        assert_eq!(game.phase, Phase::Running);
        assert_eq!(
            game.snake.iter().collect::<Vec<_>>(),
            [
                Position::new(5, 4),
                Position::new(5, 5),
                Position::new(5, 6),
            ]
        );
    }

    #[test]
    fn reversal_is_discarded() {
        let mut game = engine();
        game.start();
        game.queue_direction(Direction::West);
        assert_eq!(game.queued, None);
        game.queue_direction(Direction::North);
        assert_eq!(game.queued, Some(Direction::North));
        game.queue_direction(Direction::South);
        assert_eq!(game.queued, Some(Direction::South));
    }

    #[test]
    fn queued_direction_commits_at_tick() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(0, 0));
        game.queue_direction(Direction::North);
        game.tick();
        assert_eq!(game.heading, Some(Direction::North));
        assert_eq!(game.snake.head(), Position::new(10, 9));
    }

    #[test]
    fn input_ignored_unless_running() {
        let mut game = engine();
        game.queue_direction(Direction::North);
        assert_eq!(game.queued, None);
        game.start();
        game.pause();
        game.queue_direction(Direction::North);
        assert_eq!(game.queued, None);
    }

    #[test]
    fn quota_triggers_level_break() {
        let mut game = engine();
        game.start();
        game.level = 3;
        game.food_eaten = 11;
        game.speed = game.schedule.speed_for(3);
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.phase, Phase::LevelBreak(3));
        assert_eq!(game.level, 4);
        assert_eq!(game.food_eaten, 0);
        assert_eq!(game.speed, Duration::from_millis(105));
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.snake.head(), Position::new(10, 10));
        assert_eq!(game.score, 10);
        let food = game.food.expect("food should be replaced");
        assert!(!game.snake.occupies(food));
        // ticks are suspended until the break is acknowledged
        game.tick();
        assert_eq!(game.snake.head(), Position::new(10, 10));
        game.acknowledge(Ack::Continue);
        assert_eq!(game.phase, Phase::Running);
    }

    #[test]
    fn quitting_level_break_ends_game() {
        let mut game = engine();
        game.start();
        game.level = 3;
        game.food_eaten = 11;
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.phase, Phase::LevelBreak(3));
        game.acknowledge(Ack::Quit);
        assert_eq!(game.phase, Phase::GameOver);
    }

    #[test]
    fn final_quota_completes_game() {
        let mut game = engine();
        game.start();
        game.level = 10;
        game.food_eaten = 11;
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.phase, Phase::Completed);
        assert_eq!(game.level, 10);
        assert_eq!(game.score, 10);
    }

    #[test]
    fn continuing_after_completion_starts_fresh() {
        let mut game = engine();
        game.start();
        game.level = 10;
        game.food_eaten = 11;
        game.score = 990;
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.phase, Phase::Completed);
        game.acknowledge(Ack::Continue);
        assert_eq!(game.phase, Phase::Running);
        assert_eq!(game.score, 0);
        assert_eq!(game.level, 1);
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.heading, Some(Direction::East));
    }

    #[test]
    fn quitting_after_completion_ends_game() {
        let mut game = engine();
        game.start();
        game.level = 10;
        game.food_eaten = 11;
        game.food = Some(Position::new(11, 10));
        game.tick();
        game.acknowledge(Ack::Quit);
        assert_eq!(game.phase, Phase::GameOver);
    }

    #[test]
    fn pause_suspends_ticks() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(0, 0));
        game.pause();
        assert_eq!(game.phase, Phase::Paused);
        let snap = game.snapshot();
        assert!(snap.running);
        assert!(snap.paused);
        game.tick();
        assert_eq!(game.snake.head(), Position::new(10, 10));
        game.resume();
        assert_eq!(game.phase, Phase::Running);
        game.tick();
        assert_eq!(game.snake.head(), Position::new(11, 10));
    }

    #[test]
    fn restart_resets_game_state() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(11, 10));
        game.tick();
        assert_eq!(game.score, 10);
        game.restart();
        assert_eq!(game.phase, Phase::Idle);
        assert_eq!(game.score, 0);
        assert_eq!(game.level, 1);
        assert_eq!(game.food_eaten, 0);
        assert_eq!(game.speed, Duration::from_millis(150));
        assert_eq!(game.snake.len(), 1);
        assert_eq!(game.snake.head(), Position::new(10, 10));
        assert_eq!(game.heading, None);
        let food = game.food.expect("food should be placed");
        assert!(!game.snake.occupies(food));
    }

    #[test]
    fn food_never_lands_on_snake() {
        let mut game = Engine::new_with_rng(4, ChaCha12Rng::seed_from_u64(RNG_SEED));
        game.snake.cells = VecDeque::from([
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(3, 0),
            Position::new(3, 1),
            Position::new(2, 1),
            Position::new(1, 1),
            Position::new(0, 1),
            Position::new(0, 2),
            Position::new(1, 2),
            Position::new(2, 2),
            Position::new(3, 2),
            Position::new(3, 3),
            Position::new(2, 3),
        ]);
        for _ in 0..50 {
            game.place_food();
            let food = game.food.expect("two cells are still free");
            assert!(!game.snake.occupies(food));
        }
    }

    #[test]
    fn no_food_on_a_full_board() {
        let mut game = Engine::new_with_rng(2, ChaCha12Rng::seed_from_u64(RNG_SEED));
        game.snake.cells = VecDeque::from([
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(1, 1),
            Position::new(0, 1),
        ]);
        game.place_food();
        assert_eq!(game.food, None);
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut game = engine();
        game.start();
        game.food = Some(Position::new(11, 10));
        game.tick();
        let snap = game.snapshot();
        assert_eq!(
            snap.snake,
            [Position::new(11, 10), Position::new(10, 10)]
        );
        assert_eq!(snap.heading, Some(Direction::East));
        assert_eq!(snap.score, 10);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.food_eaten, 1);
        assert!(snap.running);
        assert!(!snap.paused);
    }
}
