use ratatui::layout::Position;
use std::collections::VecDeque;

/// Snake state.
///
/// All positions are relative to the top-left corner of the board.  The
/// cells are stored head-first; the body never contains duplicates, and it
/// is never empty.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(super) struct Snake {
    pub(super) cells: VecDeque<Position>,
}

impl Snake {
    /// Create a one-cell snake with its head at `head`
    pub(super) fn new(head: Position) -> Snake {
        Snake {
            cells: VecDeque::from([head]),
        }
    }

    /// Return the position of the snake's head
    pub(super) fn head(&self) -> Position {
        self.cells
            .front()
            .copied()
            .expect("snake should never be empty")
    }

    /// Iterate over the cells of the snake, head first
    pub(super) fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells.iter().copied()
    }

    pub(super) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Does any cell of the snake (tail included) lie at `pos`?
    pub(super) fn occupies(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    /// Advance the snake by placing a new head cell at `pos`.  Unless the
    /// snake is growing this tick, the caller must follow up with
    /// [`Snake::pop_tail()`].
    pub(super) fn push_head(&mut self, pos: Position) {
        self.cells.push_front(pos);
    }

    /// Remove the tail cell
    pub(super) fn pop_tail(&mut self) {
        let _ = self.cells.pop_back();
    }

    /// Shrink the snake back to a single cell at `head`
    pub(super) fn reset(&mut self, head: Position) {
        self.cells.clear();
        self.cells.push_front(head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grow_and_shrink() {
        let mut snake = Snake::new(Position::new(5, 5));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(5, 5));
        snake.push_head(Position::new(6, 5));
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.head(), Position::new(6, 5));
        assert!(snake.occupies(Position::new(5, 5)));
        snake.push_head(Position::new(7, 5));
        snake.pop_tail();
        assert_eq!(snake.len(), 2);
        assert!(!snake.occupies(Position::new(5, 5)));
        assert_eq!(
            snake.iter().collect::<Vec<_>>(),
            [Position::new(7, 5), Position::new(6, 5)]
        );
        snake.reset(Position::new(2, 2));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(2, 2));
    }
}
