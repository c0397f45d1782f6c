//! [`History`]: a process-wide, append-only log of positions, consulted by
//! the search collaborator for the threefold-repetition rule.

use crate::chess::position::Position;

/// An ordered sequence of positions reached so far in the game.
///
/// `History` holds full [`Position`] values, not just their hashes: the
/// threefold-repetition predicate must compare candidates by structural
/// equality (see [`Position::is_same_position`]) rather than by hash alone,
/// to avoid treating a Zobrist collision as a repetition.
#[derive(Clone, Default)]
pub struct History {
    positions: Vec<Position>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `position` as the most recent position reached.
    pub fn add(&mut self, position: Position) {
        self.positions.push(position);
    }

    /// Empties the history, e.g. when starting a new game.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// The most recently added position, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Position> {
        self.positions.last()
    }

    /// How many positions in the history are the same position as
    /// `candidate`, by structural equality. A candidate that would be the
    /// third occurrence (this count is 2, counting two prior occurrences)
    /// triggers the threefold-repetition rule.
    #[must_use]
    pub fn repetition_count(&self, candidate: &Position) -> u32 {
        u32::try_from(
            self.positions
                .iter()
                .filter(|position| position.is_same_position(candidate))
                .count(),
        )
        .expect("history is far smaller than u32::MAX")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::core::{MoveList, Square};
    use crate::chess::position::Position;

    #[test]
    fn threefold_by_knight_shuffle() {
        let mut position = Position::starting();
        let mut history = History::new();
        history.add(position);

        let moves = ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"];
        for uci in moves {
            let start = Square::try_from(&uci[0..2]).unwrap();
            let end = Square::try_from(&uci[2..4]).unwrap();
            let mut candidates = MoveList::new();
            position.pseudo_legal_moves(&mut candidates);
            let mv = *candidates
                .iter()
                .find(|candidate| candidate.start() == start && candidate.end() == end)
                .expect("knight shuffle moves are always pseudo-legal here");
            assert!(position.make_move(mv));
            history.add(position);
        }

        assert_eq!(history.repetition_count(&position), 3);
    }

    #[test]
    fn clear_empties_history() {
        let mut history = History::new();
        history.add(Position::starting());
        history.clear();
        assert_eq!(history.current(), None);
    }
}
