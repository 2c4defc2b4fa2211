use crate::board::{Piece, Square};

/// The single square a pawn may capture onto en passant, valid for exactly
/// one reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnPassantTracker {
    target: Option<Square>,
}

impl EnPassantTracker {
    pub fn new() -> Self {
        Self { target: None }
    }

    pub fn target(&self) -> Option<Square> {
        self.target
    }

    pub fn clear(&mut self) {
        self.target = None;
    }

    /// Runs after every applied move. Only a fresh two-rank pawn push sets a
    /// target; anything else clears it.
    pub fn recompute(&mut self, moved: Piece, from: Square, to: Square) {
        let rank_diff = (to.row as i32 - from.row as i32).abs();
        self.target = if moved == Piece::Pawn && from.col == to.col && rank_diff == 2 {
            Some(Square {
                row: (from.row + to.row) / 2,
                col: to.col,
            })
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    #[test]
    fn test_double_push_sets_target() {
        let mut tracker = EnPassantTracker::new();
        tracker.recompute(Piece::Pawn, sq("e2"), sq("e4"));
        assert_eq!(tracker.target(), Some(sq("e3")));

        tracker.recompute(Piece::Pawn, sq("d7"), sq("d5"));
        assert_eq!(tracker.target(), Some(Square { row: 2, col: 3 }));
    }

    #[test]
    fn test_other_moves_clear_target() {
        let mut tracker = EnPassantTracker::new();
        tracker.recompute(Piece::Pawn, sq("e2"), sq("e4"));
        tracker.recompute(Piece::Pawn, sq("e7"), sq("e6"));
        assert_eq!(tracker.target(), None);

        tracker.recompute(Piece::Pawn, sq("e2"), sq("e4"));
        tracker.recompute(Piece::Knight, sq("g8"), sq("f6"));
        assert_eq!(tracker.target(), None);

        tracker.recompute(Piece::Pawn, sq("e2"), sq("e4"));
        tracker.recompute(Piece::King, sq("e1"), sq("g1"));
        assert_eq!(tracker.target(), None);
    }
}
