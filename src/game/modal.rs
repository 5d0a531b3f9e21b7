use crate::command::Command;
use crate::consts;
use crate::util::EnumExt;
use enum_map::Enum;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        block::{Block, Padding},
        Clear, Widget,
    },
};

/// The notification a [`LevelModal`] presents
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum Notice {
    /// The contained level was cleared
    LevelCleared(u32),

    /// The final level was cleared
    AllLevelsCleared,
}

/// A pop-up announcing a cleared level (or a won game).  The engine does not
/// tick while one is shown; dismissing it yields the player's choice.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct LevelModal {
    notice: Notice,

    /// The currently-selected choice
    selection: Choice,
}

impl LevelModal {
    /// The height that should be used for the `Rect` passed to
    /// `LevelModal::render()`
    pub(super) const HEIGHT: u16 = 7;

    /// The width that should be used for the `Rect` passed to
    /// `LevelModal::render()`
    pub(super) const WIDTH: u16 = 34;

    pub(super) fn new(notice: Notice) -> LevelModal {
        LevelModal {
            notice,
            selection: Choice::min(),
        }
    }

    /// Handle an input command.  Returns `Some` if the player made a choice.
    pub(super) fn handle_command(&mut self, cmd: Command) -> Option<Choice> {
        match cmd {
            Command::Enter | Command::Space => return Some(self.selection),
            Command::Q => return Some(Choice::Quit),
            Command::Up => {
                if let Some(c) = self.selection.prev() {
                    self.selection = c;
                }
            }
            Command::Down => {
                if let Some(c) = self.selection.next() {
                    self.selection = c;
                }
            }
            _ => (),
        }
        None
    }

    fn title(&self) -> String {
        match self.notice {
            Notice::LevelCleared(level) => format!(" LEVEL {level} CLEARED "),
            Notice::AllLevelsCleared => String::from(" ALL LEVELS CLEARED "),
        }
    }

    fn body(&self) -> [String; 2] {
        match self.notice {
            Notice::LevelCleared(_) => [
                String::from("The next level is faster, and"),
                String::from("the snake resets to length 1."),
            ],
            Notice::AllLevelsCleared => {
                let max = consts::MAX_LEVEL;
                [
                    format!("You have beaten all {max} levels."),
                    String::from("Thanks for playing!"),
                ]
            }
        }
    }

    /// Render a choice as a `Line`.  If `selected` is `true`, this choice is
    /// the currently-selected/active one.
    fn choice_line(&self, choice: Choice, selected: bool) -> Line<'static> {
        let mut line = Line::default();
        if selected {
            line.push_span("» ");
        } else {
            line.push_span("  ");
        }
        let (label, key) = match (self.notice, choice) {
            (Notice::LevelCleared(_), Choice::Continue) => ("Continue", "Enter"),
            (Notice::LevelCleared(_), Choice::Quit) => ("Give Up", "q"),
            (Notice::AllLevelsCleared, Choice::Continue) => ("Play Again", "Enter"),
            (Notice::AllLevelsCleared, Choice::Quit) => ("Quit", "q"),
        };
        line.push_span(label);
        line.push_span(" (");
        line.push_span(Span::styled(key, consts::KEY_STYLE));
        line.push_span(")");
        if selected {
            line = line.style(consts::MENU_SELECTION_STYLE);
        }
        line
    }
}

impl Widget for &LevelModal {
    /*
     * ┌─────── LEVEL 3 CLEARED ────────┐
     * │ The next level is faster, and  │
     * │ the snake resets to length 1.  │
     * │                                │
     * │ » Continue (Enter)             │
     * │   Give Up (q)                  │
     * └────────────────────────────────┘
     */

    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        let block = Block::bordered()
            .title(self.title())
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1))
            .style(Style::reset());
        let inner = block.inner(area);
        block.render(area, buf);
        let [line1, line2] = self.body();
        let mut rows = inner.rows();
        if let Some(row) = rows.next() {
            Line::from(line1).render(row, buf);
        }
        if let Some(row) = rows.next() {
            Line::from(line2).render(row, buf);
        }
        let _ = rows.next();
        for (choice, row) in Choice::iter().zip(rows) {
            self.choice_line(choice, self.selection == choice)
                .render(row, buf);
        }
    }
}

/// The choices offered by the modal
#[derive(Clone, Copy, Debug, Enum, Eq, PartialEq)]
pub(super) enum Choice {
    /// Go on to the next level (or, after winning, play a fresh game)
    Continue,

    /// Stop here; ends the game
    Quit,
}
