mod direction;
mod engine;
mod levels;
mod modal;
mod snake;
use self::direction::Direction;
use self::engine::{Ack, Engine, Phase};
use self::modal::{Choice, LevelModal, Notice};
use crate::app::Screen;
use crate::command::Command;
use crate::consts;
use crate::highscore::HighScoreStore;
use crate::util::{center_rect, get_display_area};
use crossterm::event::{poll, read, Event};
use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Margin, Position, Rect, Size},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Widget},
    Frame,
};
use std::io;
use std::time::Instant;

/// The playing screen: owns the engine, drives it once per tick period, and
/// wires it to its input, rendering, persistence, and notification
/// collaborators.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct PlayScreen<R = rand::rngs::ThreadRng> {
    engine: Engine<R>,
    store: HighScoreStore,

    /// Best score seen so far, loaded from the store at startup
    high_score: u32,

    /// The level-break/completion pop-up, when one is up
    modal: Option<LevelModal>,

    /// Has the current game's final score already been offered to the store?
    scored: bool,

    next_tick: Option<Instant>,
}

impl PlayScreen<rand::rngs::ThreadRng> {
    pub(crate) fn new(side: u16, store: HighScoreStore) -> Self {
        PlayScreen::new_with_rng(side, store, rand::rng())
    }
}

impl<R: Rng> PlayScreen<R> {
    pub(crate) fn new_with_rng(side: u16, store: HighScoreStore, rng: R) -> PlayScreen<R> {
        // A failed read just means there is no record to beat yet.
        let high_score = store.load().unwrap_or_default();
        PlayScreen {
            engine: Engine::new_with_rng(side, rng),
            store,
            high_score,
            modal: None,
            scored: false,
            next_tick: None,
        }
    }

    /// Wait for the next key event or tick deadline, whichever comes first,
    /// and act on it.  Ticks never overlap: each pass schedules at most one,
    /// and the deadline is only rearmed after the tick has fully resolved.
    pub(crate) fn process_input(&mut self) -> io::Result<Option<Screen>> {
        if self.engine.phase == Phase::Running {
            if self.next_tick.is_none() {
                self.next_tick = Some(Instant::now() + self.engine.speed);
            }
            let when = self.next_tick.expect("next_tick should be Some");
            let wait = when.saturating_duration_since(Instant::now());
            if wait.is_zero() || !poll(wait)? {
                self.advance();
                self.next_tick = None;
                Ok(None)
            } else {
                Ok(self.handle_event(read()?))
            }
        } else {
            Ok(self.handle_event(read()?))
        }
    }

    fn advance(&mut self) {
        self.engine.tick();
        self.sync();
    }

    /// Bring the collaborators in line with the engine's phase: raise the
    /// level modal and settle the high score when a game ends.
    fn sync(&mut self) {
        match self.engine.phase {
            Phase::LevelBreak(level) => {
                if self.modal.is_none() {
                    self.modal = Some(LevelModal::new(Notice::LevelCleared(level)));
                }
            }
            Phase::Completed => {
                self.settle_score();
                if self.modal.is_none() {
                    self.modal = Some(LevelModal::new(Notice::AllLevelsCleared));
                }
            }
            Phase::GameOver => self.settle_score(),
            Phase::Idle | Phase::Running | Phase::Paused => (),
        }
    }

    /// Offer the finished game's score to the store.  Persistence is
    /// best-effort: a failed write costs the saved record, never the
    /// session.
    fn settle_score(&mut self) {
        if self.scored {
            return;
        }
        self.scored = true;
        let score = self.engine.score;
        if score > self.high_score {
            self.high_score = score;
            let _ = self.store.save(score);
        }
    }

    fn handle_event(&mut self, event: Event) -> Option<Screen> {
        if event == Event::FocusLost {
            self.engine.pause();
            self.next_tick = None;
            return None;
        }
        let cmd = Command::from_key_event(event.as_key_press_event()?)?;
        if cmd == Command::Quit {
            return Some(Screen::Quit);
        }
        if let Some(modal) = self.modal.as_mut() {
            match modal.handle_command(cmd)? {
                Choice::Continue => {
                    let replay = self.engine.phase == Phase::Completed;
                    self.modal = None;
                    self.engine.acknowledge(Ack::Continue);
                    if replay {
                        self.scored = false;
                    }
                }
                Choice::Quit => {
                    self.modal = None;
                    self.engine.acknowledge(Ack::Quit);
                    self.sync();
                }
            }
            return None;
        }
        match (self.engine.phase, cmd) {
            (Phase::Running, Command::Up) => self.engine.queue_direction(Direction::North),
            (Phase::Running, Command::Down) => self.engine.queue_direction(Direction::South),
            (Phase::Running, Command::Left) => self.engine.queue_direction(Direction::West),
            (Phase::Running, Command::Right) => self.engine.queue_direction(Direction::East),
            (Phase::Running, Command::Space | Command::Esc) => {
                self.engine.pause();
                self.next_tick = None;
            }
            (Phase::Paused, Command::Space | Command::Esc) => self.engine.resume(),
            (Phase::Paused, Command::R) => self.restart(),
            (Phase::Idle, Command::Space | Command::Enter) => self.engine.start(),
            (Phase::GameOver, Command::Space) => {
                self.restart();
                self.engine.start();
            }
            (Phase::GameOver, Command::R) => self.restart(),
            (Phase::Idle | Phase::Paused | Phase::GameOver, Command::Q) => {
                return Some(Screen::Quit);
            }
            _ => (),
        }
        None
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.modal = None;
        self.scored = false;
        self.next_tick = None;
    }
}

impl<R> PlayScreen<R> {
    pub(crate) fn draw(&self, frame: &mut Frame<'_>) {
        frame.render_widget(self, frame.area());
    }
}

impl<R> Widget for &PlayScreen<R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = self.engine.snapshot();
        let display = get_display_area(area);
        let block_side = self.engine.side.saturating_add(2);
        let [status_area, board_area, msg1_area, msg2_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(block_side),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(display);

        let score = snap.score;
        let high = self.high_score.max(score);
        let level = snap.level;
        let max_level = consts::MAX_LEVEL;
        let eaten = snap.food_eaten;
        let quota = consts::FOOD_PER_LEVEL;
        Line::styled(
            format!(
                " Score: {score}   High Score: {high}   Level: {level}/{max_level}   Food: {eaten}/{quota}"
            ),
            consts::STATUS_BAR_STYLE,
        )
        .render(status_area, buf);

        let [board_area] = Layout::horizontal([block_side])
            .flex(Flex::Center)
            .areas(board_area);
        Block::bordered().render(board_area, buf);
        let mut canvas = Canvas {
            area: board_area.inner(Margin::new(1, 1)),
            buf: &mut *buf,
        };
        if let Some(food) = snap.food {
            canvas.draw_cell(food, consts::FOOD_SYMBOL, consts::FOOD_STYLE);
        }
        for &pos in snap.snake.get(1..).unwrap_or_default() {
            canvas.draw_cell(pos, consts::SNAKE_BODY_SYMBOL, consts::SNAKE_STYLE);
        }
        // Draw the head last so that, on a self-collision, the collision
        // glyph overwrites the body cell that was hit.
        if let Some(&head) = snap.snake.first() {
            if self.engine.phase == Phase::GameOver {
                canvas.draw_cell(head, consts::COLLISION_SYMBOL, consts::COLLISION_STYLE);
            } else {
                canvas.draw_cell(head, head_symbol(snap.heading), consts::SNAKE_STYLE);
            }
        }

        match self.engine.phase {
            Phase::Running | Phase::LevelBreak(_) | Phase::Completed => (),
            Phase::Idle => {
                Span::from(" Press Space to start").render(msg1_area, buf);
                Span::from(" Steer with the arrow keys, wasd, or hjkl").render(msg2_area, buf);
            }
            Phase::Paused => {
                Span::from(" — PAUSED —").render(msg1_area, buf);
                Line::from_iter([
                    Span::raw(" Resume ("),
                    Span::styled("Space", consts::KEY_STYLE),
                    Span::raw(") — Restart ("),
                    Span::styled("r", consts::KEY_STYLE),
                    Span::raw(") — Quit ("),
                    Span::styled("q", consts::KEY_STYLE),
                    Span::raw(")"),
                ])
                .render(msg2_area, buf);
            }
            Phase::GameOver => {
                Span::from(" — GAME OVER —").render(msg1_area, buf);
                Line::from_iter([
                    Span::raw(" Choose One: Play Again ("),
                    Span::styled("Space", consts::KEY_STYLE),
                    Span::raw(") — Quit ("),
                    Span::styled("q", consts::KEY_STYLE),
                    Span::raw(")"),
                ])
                .render(msg2_area, buf);
            }
        }

        if let Some(modal) = &self.modal {
            let modal_area = center_rect(
                display,
                Size {
                    width: LevelModal::WIDTH,
                    height: LevelModal::HEIGHT,
                },
            );
            modal.render(modal_area, buf);
        }
    }
}

fn head_symbol(heading: Option<Direction>) -> char {
    match heading {
        Some(Direction::North) => consts::SNAKE_HEAD_NORTH_SYMBOL,
        Some(Direction::South) => consts::SNAKE_HEAD_SOUTH_SYMBOL,
        Some(Direction::East) => consts::SNAKE_HEAD_EAST_SYMBOL,
        Some(Direction::West) => consts::SNAKE_HEAD_WEST_SYMBOL,
        None => consts::SNAKE_HEAD_IDLE_SYMBOL,
    }
}

#[derive(Debug, Eq, PartialEq)]
struct Canvas<'a> {
    area: Rect,
    buf: &'a mut Buffer,
}

impl Canvas<'_> {
    fn draw_cell(&mut self, pos: Position, symbol: char, style: Style) {
        let Some(x) = self.area.x.checked_add(pos.x) else {
            return;
        };
        let Some(y) = self.area.y.checked_add(pos.y) else {
            return;
        };
        if !self.area.contains(Position { x, y }) {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(symbol);
            cell.set_style(Style::reset().patch(style));
        }
    }
}
