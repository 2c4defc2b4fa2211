//! The rules oracle: the component that actually knows chess.
//!
//! The game session never decides legality itself. It describes the position
//! as a FEN string, asks the oracle to decode a square-pair token against it,
//! and copies the oracle's resulting placement back into its own [`Board`].
//! [`RulesOracle`] is the seam; [`ShakmatyOracle`] is the production
//! implementation backed by the `shakmaty` crate.

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, File, Position, Rank, Role};

use crate::board::{Board, Color, Piece, Square};
use crate::error::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate { winner: Color },
    Stalemate,
    Draw,
}

/// Capability interface over an external chess-rules implementation.
pub trait RulesOracle {
    type Position: Clone;
    type Move;

    fn start_position(&self) -> Self::Position;

    /// Materialises a position from a full FEN string.
    fn position_from_fen(&self, fen: &str) -> Result<Self::Position, OracleError>;

    /// Decodes a square-pair token (`e2e4`, `e7e8q`) into a legal move.
    fn decode(&self, position: &Self::Position, token: &str) -> Result<Self::Move, OracleError>;

    fn apply(&self, position: &mut Self::Position, mv: &Self::Move) -> Result<(), OracleError>;

    fn encode_san(&self, position: &Self::Position, mv: &Self::Move) -> String;

    /// Canonical square-pair token for `mv`, as stored in the move history.
    fn encode_token(&self, mv: &Self::Move) -> String;

    fn is_en_passant(&self, mv: &Self::Move) -> bool;

    fn outcome(&self, position: &Self::Position) -> Outcome;

    fn turn(&self, position: &Self::Position) -> Color;

    /// Exports the placement for re-sync into a [`Board`].
    fn board(&self, position: &Self::Position) -> Board;

    fn legal_tokens(&self, position: &Self::Position) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyOracle;

impl ShakmatyOracle {
    pub fn new() -> Self {
        ShakmatyOracle
    }
}

fn to_shakmaty_square(square: Square) -> shakmaty::Square {
    shakmaty::Square::from_coords(File::new(square.col as u32), Rank::new(7 - square.row as u32))
}

fn from_role(role: Role) -> Piece {
    match role {
        Role::Pawn => Piece::Pawn,
        Role::Knight => Piece::Knight,
        Role::Bishop => Piece::Bishop,
        Role::Rook => Piece::Rook,
        Role::Queen => Piece::Queen,
        Role::King => Piece::King,
    }
}

fn from_color(color: shakmaty::Color) -> Color {
    match color {
        shakmaty::Color::White => Color::White,
        shakmaty::Color::Black => Color::Black,
    }
}

impl RulesOracle for ShakmatyOracle {
    type Position = Chess;
    type Move = shakmaty::Move;

    fn start_position(&self) -> Chess {
        Chess::default()
    }

    fn position_from_fen(&self, fen: &str) -> Result<Chess, OracleError> {
        let invalid = |reason: String| OracleError::InvalidPosition {
            fen: fen.to_string(),
            reason,
        };
        let parsed = Fen::from_ascii(fen.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))
    }

    fn decode(&self, position: &Chess, token: &str) -> Result<shakmaty::Move, OracleError> {
        let uci = Uci::from_ascii(token.as_bytes())
            .map_err(|_| OracleError::MalformedToken(token.to_string()))?;
        uci.to_move(position)
            .map_err(|_| OracleError::IllegalMove(token.to_string()))
    }

    fn apply(&self, position: &mut Chess, mv: &shakmaty::Move) -> Result<(), OracleError> {
        if !position.is_legal(mv) {
            return Err(OracleError::IllegalMove(self.encode_token(mv)));
        }
        position.play_unchecked(mv);
        Ok(())
    }

    fn encode_san(&self, position: &Chess, mv: &shakmaty::Move) -> String {
        San::from_move(position, mv).to_string()
    }

    fn encode_token(&self, mv: &shakmaty::Move) -> String {
        Uci::from_standard(mv).to_string()
    }

    fn is_en_passant(&self, mv: &shakmaty::Move) -> bool {
        mv.is_en_passant()
    }

    fn outcome(&self, position: &Chess) -> Outcome {
        if position.is_checkmate() {
            Outcome::Checkmate {
                winner: from_color(position.turn()).opposite(),
            }
        } else if position.is_stalemate() {
            Outcome::Stalemate
        } else if position.is_insufficient_material() {
            Outcome::Draw
        } else {
            Outcome::Ongoing
        }
    }

    fn turn(&self, position: &Chess) -> Color {
        from_color(position.turn())
    }

    fn board(&self, position: &Chess) -> Board {
        let mut board = Board::empty();
        let placement = position.board();
        for row in 0..8 {
            for col in 0..8 {
                let square = Square { row, col };
                let cell = placement
                    .piece_at(to_shakmaty_square(square))
                    .map(|p| (from_role(p.role), from_color(p.color)));
                board.set(square, cell);
            }
        }
        board
    }

    fn legal_tokens(&self, position: &Chess) -> Vec<String> {
        position
            .legal_moves()
            .iter()
            .map(|mv| self.encode_token(mv))
            .collect()
    }
}
