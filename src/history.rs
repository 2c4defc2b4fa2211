use std::sync::{Mutex, MutexGuard};

use log::warn;

use crate::board::Board;
use crate::check::is_in_check;
use crate::oracle::{Outcome, RulesOracle};

/// Suffix appended to history entries for en-passant captures.
pub const EN_PASSANT_MARK: &str = "e.p.";

/// Append-only log of applied move tokens. Every access takes the lock, and
/// reads hand out copies, so a render thread never sees a half-written entry.
#[derive(Debug, Default)]
pub struct MoveHistory {
    moves: Mutex<Vec<String>>,
}

/// The square-pair part of a history entry, without display annotations.
pub fn token_body(entry: &str) -> &str {
    entry.split_whitespace().next().unwrap_or("")
}

impl MoveHistory {
    pub fn new() -> Self {
        Self {
            moves: Mutex::new(Vec::new()),
        }
    }

    // A panic while holding the lock cannot leave the Vec half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.moves.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_move(&self, token: impl Into<String>) {
        self.lock().push(token.into());
    }

    pub fn get_history(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn clear_history(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Replays the log from the standard start and renders numbered SAN
    /// lines, e.g. `"1. e4 e5"`. Moves that leave the opponent mated get `#`,
    /// checks get `+`. An entry the oracle cannot decode is shown verbatim and
    /// the replay continues from the unchanged position.
    pub fn move_history_san<O: RulesOracle>(&self, oracle: &O) -> Vec<String> {
        let raw_moves = self.get_history();
        let mut position = oracle.start_position();
        let mut plies = Vec::with_capacity(raw_moves.len());

        for entry in &raw_moves {
            plies.push(render_ply(oracle, &mut position, entry));
        }

        plies
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
            .collect()
    }

    /// Placement after the first `count` recorded moves, replayed from the
    /// standard start. Undecodable entries are skipped.
    pub fn board_after<O: RulesOracle>(&self, oracle: &O, count: usize) -> Board {
        let raw_moves = self.get_history();
        let mut position = oracle.start_position();
        for entry in raw_moves.iter().take(count) {
            let token = token_body(entry);
            match oracle.decode(&position, token) {
                Ok(mv) => {
                    if let Err(e) = oracle.apply(&mut position, &mv) {
                        warn!("skipping history entry {:?}: {}", entry, e);
                    }
                }
                Err(e) => warn!("skipping history entry {:?}: {}", entry, e),
            }
        }
        oracle.board(&position)
    }
}

fn render_ply<O: RulesOracle>(oracle: &O, position: &mut O::Position, entry: &str) -> String {
    let mv = match oracle.decode(position, token_body(entry)) {
        Ok(mv) => mv,
        Err(_) => return entry.to_string(),
    };

    let mut san = oracle.encode_san(position, &mv);
    if oracle.apply(position, &mv).is_err() {
        return entry.to_string();
    }

    if let Outcome::Checkmate { .. } = oracle.outcome(position) {
        san.push('#');
    } else if is_in_check(&oracle.board(position), oracle.turn(position)) {
        san.push('+');
    }
    san
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, Piece, Square};
    use crate::oracle::ShakmatyOracle;
    use std::sync::Arc;
    use std::thread;

    fn history_of(tokens: &[&str]) -> MoveHistory {
        let history = MoveHistory::new();
        for token in tokens {
            history.add_move(*token);
        }
        history
    }

    #[test]
    fn test_add_and_get() {
        let history = history_of(&["e2e4", "e7e5"]);
        assert_eq!(history.get_history(), vec!["e2e4", "e7e5"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_clear() {
        let history = history_of(&["d2d4"]);
        history.clear_history();
        assert!(history.get_history().is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_get_history_is_a_copy() {
        let history = history_of(&["e2e4"]);
        let mut copy = history.get_history();
        copy.push("junk".to_string());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_san_lines() {
        let oracle = ShakmatyOracle::new();
        let history = history_of(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        assert_eq!(
            history.move_history_san(&oracle),
            vec!["1. e4 e5", "2. Nf3 Nc6", "3. Bb5"]
        );

        let history = history_of(&["e2e4", "e7e5"]);
        assert_eq!(history.move_history_san(&oracle), vec!["1. e4 e5"]);
    }

    #[test]
    fn test_san_invalid_entry_is_literal() {
        let oracle = ShakmatyOracle::new();
        let history = history_of(&["invalid"]);
        assert_eq!(history.move_history_san(&oracle), vec!["1. invalid"]);

        // The position is unchanged, so the next entry is still White's e4
        let history = history_of(&["e2e5", "e2e4"]);
        assert_eq!(history.move_history_san(&oracle), vec!["1. e2e5 e4"]);
    }

    #[test]
    fn test_san_check_and_mate_marks() {
        let oracle = ShakmatyOracle::new();
        let history = history_of(&["e2e4", "f7f6", "d2d4", "g7g5", "d1h5"]);
        assert_eq!(
            history.move_history_san(&oracle),
            vec!["1. e4 f6", "2. d4 g5", "3. Qh5#"]
        );

        let history = history_of(&["e2e4", "d7d6", "f1b5"]);
        assert_eq!(history.move_history_san(&oracle), vec!["1. e4 d6", "2. Bb5+"]);
    }

    #[test]
    fn test_annotated_entry_decodes() {
        let oracle = ShakmatyOracle::new();
        let history = history_of(&["e2e4", "a7a6", "e4e5", "d7d5", "e5d6 e.p."]);
        let lines = history.move_history_san(&oracle);
        assert_eq!(lines[2], "3. exd6");
    }

    #[test]
    fn test_board_after() {
        let oracle = ShakmatyOracle::new();
        let history = history_of(&["e2e4", "e7e5"]);
        assert_eq!(history.board_after(&oracle, 0), Board::new_standard());

        let board = history.board_after(&oracle, 1);
        let e4 = Square::from_algebraic("e4").unwrap();
        assert_eq!(board.get_piece_at(e4), Some((Piece::Pawn, Color::White)));
        let e5 = Square::from_algebraic("e5").unwrap();
        assert_eq!(board.get_piece_at(e5), None);
    }

    #[test]
    fn test_concurrent_appends() {
        let history = Arc::new(MoveHistory::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..100 {
                        history.add_move("e2e4");
                        let _ = history.get_history();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(history.len(), 400);
    }
}
