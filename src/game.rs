use std::sync::Arc;

use log::{debug, info, warn};

use crate::board::{Board, Color, Piece, Square};
use crate::en_passant::EnPassantTracker;
use crate::error::{OracleError, Rejection};
use crate::history::{token_body, MoveHistory, EN_PASSANT_MARK};
use crate::oracle::{Outcome, RulesOracle, ShakmatyOracle};

/// Result of a successfully applied move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Entry appended to the history.
    pub record: String,
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub color: Color,
    pub castling: bool,
    pub en_passant: bool,
}

/// One game session: board, side to move, en-passant target and history.
/// All mutation goes through [`Game::attempt`], which either commits every
/// part of a move or none of it.
pub struct Game<O: RulesOracle = ShakmatyOracle> {
    board: Board,
    turn: Color,
    en_passant: EnPassantTracker,
    history: Arc<MoveHistory>,
    oracle: O,
    // Number of history entries shown while browsing; None means live.
    browse: Option<usize>,
    // Draw the board from Black's side.
    flipped: bool,
}

impl Game<ShakmatyOracle> {
    pub fn new() -> Self {
        Game::with_oracle(ShakmatyOracle::new())
    }
}

impl Default for Game<ShakmatyOracle> {
    fn default() -> Self {
        Game::new()
    }
}

impl<O: RulesOracle> Game<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            board: Board::new_standard(),
            turn: Color::White,
            en_passant: EnPassantTracker::new(),
            history: Arc::new(MoveHistory::new()),
            oracle,
            browse: None,
            flipped: false,
        }
    }

    /// Starts from an arbitrary placement with an empty history.
    pub fn with_board(oracle: O, board: Board, turn: Color) -> Self {
        let mut game = Game::with_oracle(oracle);
        game.board = board;
        game.turn = turn;
        game
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant.target()
    }

    /// Shared handle for readers on other threads.
    pub fn history(&self) -> Arc<MoveHistory> {
        Arc::clone(&self.history)
    }

    pub fn fen(&self) -> String {
        self.board.to_placement(self.turn, self.en_passant.target())
    }

    pub fn history_san(&self) -> Vec<String> {
        self.history.move_history_san(&self.oracle)
    }

    /// Outcome of the live position, or `Ongoing` if the oracle cannot read it.
    pub fn outcome(&self) -> Outcome {
        self.oracle
            .position_from_fen(&self.fen())
            .map(|position| self.oracle.outcome(&position))
            .unwrap_or(Outcome::Ongoing)
    }

    pub fn reset(&mut self) {
        self.board = Board::new_standard();
        self.turn = Color::White;
        self.en_passant.clear();
        self.history.clear_history();
        self.browse = None;
        info!("game reset");
    }

    /// Applies the move if legal for the side to move. Every failure is `false`
    /// and leaves the session untouched.
    pub fn try_move(&mut self, from_row: i32, from_col: i32, to_row: i32, to_col: i32) -> bool {
        match self.attempt(from_row, from_col, to_row, to_col) {
            Ok(_) => true,
            Err(rejection) => {
                debug!(
                    "rejected move ({}, {}) -> ({}, {}): {}",
                    from_row, from_col, to_row, to_col, rejection
                );
                false
            }
        }
    }

    /// Like [`Game::try_move`], with the reason for a rejection.
    pub fn attempt(
        &mut self,
        from_row: i32,
        from_col: i32,
        to_row: i32,
        to_col: i32,
    ) -> Result<AppliedMove, Rejection> {
        let (from, to) = match (Square::new(from_row, from_col), Square::new(to_row, to_col)) {
            (Some(from), Some(to)) => (from, to),
            _ => return Err(Rejection::OutOfBounds),
        };
        if from == to {
            return Err(Rejection::SameSquare);
        }
        let (piece, color) = self.board.get_piece_at(from).ok_or(Rejection::EmptySource)?;
        if color != self.turn {
            return Err(Rejection::WrongColor {
                owner: color,
                turn: self.turn,
            });
        }

        let position = self.oracle.position_from_fen(&self.fen())?;

        let token = promotion_token(from, to, Some(piece));

        let normal_error = match self.play(&position, &token) {
            Ok((after, mv)) => {
                let en_passant = self.oracle.is_en_passant(&mv);
                let record = self.oracle.encode_token(&mv);
                return Ok(self.commit(after, record, from, to, piece, en_passant));
            }
            Err(e) => e,
        };

        // Castling: a king stepping two files along its rank
        if piece == Piece::King && from.row == to.row && (to.col as i32 - from.col as i32).abs() == 2 {
            let rank = 8 - color.home_row();
            let castle_token = if to.col > from.col {
                format!("e{}g{}", rank, rank)
            } else {
                format!("e{}c{}", rank, rank)
            };
            if let Ok((after, mv)) = self.play(&position, &castle_token) {
                let record = self.oracle.encode_token(&mv);
                return Ok(self.commit(after, record, from, to, piece, false));
            }
        }

        // En passant: a pawn moving diagonally onto an empty square
        if piece == Piece::Pawn
            && from.row != to.row
            && from.col != to.col
            && self.board.get_piece_at(to).is_none()
        {
            if self.en_passant.target() == Some(to) {
                if let Ok((after, mv)) = self.play(&position, &token) {
                    let record = self.oracle.encode_token(&mv);
                    return Ok(self.commit(after, record, from, to, piece, true));
                }
            } else if let Ok((after, mv)) = self.play(&position, &token) {
                let en_passant = self.oracle.is_en_passant(&mv);
                let record = self.oracle.encode_token(&mv);
                return Ok(self.commit(after, record, from, to, piece, en_passant));
            }
        }

        Err(normal_error.into())
    }

    /// Parses a square-pair token such as `e2e4` (an engine's best move) and
    /// applies it with [`Game::try_move`]. Any promotion suffix is ignored in
    /// favour of the automatic queen.
    pub fn apply_token(&mut self, token: &str) -> bool {
        match parse_token(token.trim()) {
            Some((from, to)) => self.try_move(from.row as i32, from.col as i32, to.row as i32, to.col as i32),
            None => false,
        }
    }

    /// Replaces the session with a game replayed from the standard start.
    /// Tokens the oracle rejects are skipped. Returns how many were applied.
    pub fn load_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) -> usize {
        self.reset();
        let mut position = self.oracle.start_position();
        let mut board = Board::new_standard();
        let mut applied = 0;

        for token in tokens {
            let token = token_body(token.as_ref());
            let (from, to) = match parse_token(token) {
                Some(squares) => squares,
                None => {
                    warn!("load: skipping malformed {:?}", token);
                    continue;
                }
            };
            let moving = board.get_piece_at(from);
            let token = promotion_token(from, to, moving.map(|(piece, _)| piece));
            let mv = match self.oracle.decode(&position, &token) {
                Ok(mv) => mv,
                Err(e) => {
                    warn!("load: skipping {:?}: {}", token, e);
                    continue;
                }
            };
            if let Err(e) = self.oracle.apply(&mut position, &mv) {
                warn!("load: skipping {:?}: {}", token, e);
                continue;
            }

            match moving {
                Some((piece, _)) => self.en_passant.recompute(piece, from, to),
                None => self.en_passant.clear(),
            }

            let mut record = self.oracle.encode_token(&mv);
            if self.oracle.is_en_passant(&mv) {
                record = format!("{} {}", record, EN_PASSANT_MARK);
            }
            self.history.add_move(record);
            board = self.oracle.board(&position);
            applied += 1;
        }

        self.board = board;
        self.turn = self.oracle.turn(&position);
        info!("loaded {} of {} moves", applied, tokens.len());
        applied
    }

    /// Steps the view one move back. Entering browse mode shows the position
    /// before the last move.
    pub fn browse_back(&mut self) {
        let len = self.history.len();
        if len == 0 {
            return;
        }
        self.browse = match self.browse {
            None => Some(len - 1),
            Some(0) => Some(0),
            Some(shown) => Some(shown - 1),
        };
    }

    /// Steps the view one move forward, returning to live at the end.
    pub fn browse_forward(&mut self) {
        if let Some(shown) = self.browse {
            self.browse = if shown + 1 >= self.history.len() {
                None
            } else {
                Some(shown + 1)
            };
        }
    }

    pub fn browse_live(&mut self) {
        self.browse = None;
    }

    /// Number of history entries currently shown, or `None` when live.
    pub fn browsing(&self) -> Option<usize> {
        self.browse
    }

    pub fn toggle_orientation(&mut self) {
        self.flipped = !self.flipped;
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// The displayed board as text, drawn in the current orientation.
    pub fn render(&self) -> String {
        self.displayed_board().render(self.flipped)
    }

    /// The board to render: live, or replayed up to the browse position.
    pub fn displayed_board(&self) -> Board {
        match self.browse {
            None => self.board.clone(),
            Some(count) => self.history.board_after(&self.oracle, count),
        }
    }

    fn play(&self, position: &O::Position, token: &str) -> Result<(O::Position, O::Move), OracleError> {
        let mv = self.oracle.decode(position, token)?;
        let mut after = position.clone();
        self.oracle.apply(&mut after, &mv)?;
        Ok((after, mv))
    }

    fn commit(
        &mut self,
        after: O::Position,
        record: String,
        from: Square,
        to: Square,
        piece: Piece,
        en_passant: bool,
    ) -> AppliedMove {
        let color = self.turn;
        let castling = piece == Piece::King && (to.col as i32 - from.col as i32).abs() == 2;
        self.board = self.oracle.board(&after);

        let record = if en_passant {
            // The captured pawn sits behind the destination, on the mover's side
            if let Some(captured) = to.offset(-color.forward(), 0) {
                self.board.set(captured, None);
            }
            format!("{} {}", record, EN_PASSANT_MARK)
        } else {
            record
        };

        self.history.add_move(record.clone());
        self.en_passant.recompute(piece, from, to);
        self.turn = self.turn.opposite();
        self.browse = None;
        info!("{} played {}", color, record);

        AppliedMove {
            record,
            from,
            to,
            piece,
            color,
            castling,
            en_passant,
        }
    }
}

/// Splits `e2e4` or `e7e8q` into its squares. Anything longer, or a fifth
/// character that is not a promotion piece, is malformed.
fn parse_token(token: &str) -> Option<(Square, Square)> {
    if !(4..=5).contains(&token.len()) {
        return None;
    }
    if !matches!(token.get(4..), Some("" | "q" | "r" | "b" | "n")) {
        return None;
    }
    let from = token.get(0..2).and_then(Square::from_algebraic)?;
    let to = token.get(2..4).and_then(Square::from_algebraic)?;
    Some((from, to))
}

/// Square-pair token for a move. A pawn reaching the last rank always
/// becomes a queen.
fn promotion_token(from: Square, to: Square, piece: Option<Piece>) -> String {
    if piece == Some(Piece::Pawn) && (to.row == 0 || to.row == 7) {
        format!("{}{}q", from, to)
    } else {
        format!("{}{}", from, to)
    }
}
