pub mod board;
pub mod check;
pub mod config;
pub mod en_passant;
pub mod engine;
pub mod error;
pub mod game;
pub mod history;
pub mod oracle;

pub use board::{Board, Color, Piece, Square};
pub use game::{AppliedMove, Game};
pub use history::MoveHistory;
pub use oracle::{Outcome, RulesOracle, ShakmatyOracle};
