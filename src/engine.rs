use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::oracle::RulesOracle;

/// Anything that can suggest a move for a position.
pub trait MoveSource {
    /// Best move for `fen` as a square-pair token such as `e2e4`.
    fn best_move(&mut self, fen: &str, depth: u32) -> Result<String, EngineError>;
}

/// Extracts the move from a `bestmove e2e4 ponder e7e5` line.
pub fn parse_bestmove(line: &str) -> Option<String> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }
    let mv = parts.next()?;
    if mv.len() < 4 || mv == "(none)" {
        return None;
    }
    Some(mv.to_string())
}

/// An external engine process spoken to over UCI. Calls block until the
/// engine answers.
pub struct UciEngine {
    name: String,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    pub fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EngineError::Spawn {
                path: config.path.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| EngineError::Closed("stdin".to_string()))?;
        let stdout = child.stdout.take().ok_or_else(|| EngineError::Closed("stdout".to_string()))?;

        let mut engine = UciEngine {
            name: config.name.clone(),
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci")?;
        engine.read_until("uciok")?;
        for command in config.setoption_commands() {
            engine.send(&command)?;
        }
        engine.send("isready")?;
        engine.read_until("readyok")?;

        info!("engine {} ready", engine.name);
        Ok(engine)
    }

    pub fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("> {}", command);
        writeln!(self.stdin, "{}", command)?;
        self.stdin.flush()?;
        Ok(())
    }

    fn read_line(&mut self, waiting_for: &str) -> Result<String, EngineError> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(EngineError::Closed(waiting_for.to_string()));
        }
        let line = line.trim_end().to_string();
        debug!("< {}", line);
        Ok(line)
    }

    fn read_until(&mut self, token: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line(token)?.contains(token) {
                return Ok(());
            }
        }
    }
}

impl MoveSource for UciEngine {
    fn best_move(&mut self, fen: &str, depth: u32) -> Result<String, EngineError> {
        self.send(&format!("position fen {}", fen))?;
        self.send(&format!("go depth {}", depth))?;
        loop {
            let line = self.read_line("bestmove")?;
            if line.starts_with("bestmove") {
                return parse_bestmove(&line).ok_or(EngineError::NoBestMove);
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        if let Err(e) = self.child.kill() {
            warn!("failed to stop engine {}: {}", self.name, e);
        }
        let _ = self.child.wait();
    }
}

/// Opponent used when no engine is configured: a uniformly random legal move.
pub struct RandomMover<O: RulesOracle> {
    oracle: O,
    rng: StdRng,
}

impl<O: RulesOracle> RandomMover<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(oracle: O, seed: u64) -> Self {
        Self {
            oracle,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<O: RulesOracle> MoveSource for RandomMover<O> {
    fn best_move(&mut self, fen: &str, _depth: u32) -> Result<String, EngineError> {
        let position = self
            .oracle
            .position_from_fen(fen)
            .map_err(|_| EngineError::NoLegalMove(fen.to_string()))?;
        self.oracle
            .legal_tokens(&position)
            .choose(&mut self.rng)
            .cloned()
            .ok_or_else(|| EngineError::NoLegalMove(fen.to_string()))
    }
}
