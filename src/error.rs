use std::path::PathBuf;
use thiserror::Error;

use crate::board::Color;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid position {fen:?}: {reason}")]
    InvalidPosition { fen: String, reason: String },
    #[error("malformed move token {0:?}")]
    MalformedToken(String),
    #[error("illegal move {0:?}")]
    IllegalMove(String),
}

/// Why a move was not applied. `Game::try_move` collapses all of these to `false`.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("square outside the board")]
    OutOfBounds,
    #[error("source and destination are the same square")]
    SameSquare,
    #[error("no piece on the source square")]
    EmptySource,
    #[error("piece belongs to {owner}, but it is {turn} to move")]
    WrongColor { owner: Color, turn: Color },
    #[error("rules oracle refused the move: {0}")]
    Oracle(#[from] OracleError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("engine i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine closed its output before answering {0:?}")]
    Closed(String),
    #[error("engine returned no usable best move")]
    NoBestMove,
    #[error("no legal move in position {0:?}")]
    NoLegalMove(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
