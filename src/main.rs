use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use terminal_chess::config::{Config, EngineConfig, DEFAULT_CONFIG_PATH};
use terminal_chess::engine::{MoveSource, RandomMover, UciEngine};
use terminal_chess::{Game, Outcome, ShakmatyOracle};

const HELP: &str = "commands: <move e.g. e2e4> | engine | board | fen | history | back | forward | live | flip | reset | load <moves...> | help | quit";

struct Session {
    game: Game,
    opponent: Box<dyn MoveSource>,
    depth: u32,
    // Set when the configured engine replies on its own
    automove: Option<EngineConfig>,
}

impl Session {
    fn new(config: Config) -> Self {
        let fallback = || -> Box<dyn MoveSource> { Box::new(RandomMover::new(ShakmatyOracle::new())) };
        let (opponent, depth, automove) = match &config.engine {
            Some(engine_config) => match UciEngine::spawn(engine_config) {
                Ok(engine) => {
                    let opponent: Box<dyn MoveSource> = Box::new(engine);
                    let automove = engine_config.automove.then(|| engine_config.clone());
                    (opponent, engine_config.depth, automove)
                }
                Err(e) => {
                    warn!("engine unavailable, falling back to random moves: {}", e);
                    (fallback(), 1, None)
                }
            },
            None => (fallback(), 1, None),
        };

        Session {
            game: Game::new(),
            opponent,
            depth,
            automove,
        }
    }

    fn engine_move(&mut self) -> String {
        match self.opponent.best_move(&self.game.fen(), self.depth) {
            Ok(token) if self.game.apply_token(&token) => format!("engine played {}", token),
            Ok(token) => format!("engine suggested an illegal move: {}", token),
            Err(e) => format!("engine error: {}", e),
        }
    }

    fn handle_command(&mut self, command: &str) -> Option<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Some(String::new());
        }

        let reply = match parts[0] {
            "quit" => return None,
            "help" => HELP.to_string(),
            "board" => self.game.render(),
            "fen" => self.game.fen(),
            "history" => self.game.history_san().join("\n"),
            "engine" => self.engine_move(),
            "reset" => {
                self.game.reset();
                "new game".to_string()
            }
            "back" => {
                self.game.browse_back();
                self.game.render()
            }
            "forward" => {
                self.game.browse_forward();
                self.game.render()
            }
            "flip" => {
                self.game.toggle_orientation();
                self.game.render()
            }
            "live" => {
                self.game.browse_live();
                self.game.render()
            }
            "load" => {
                let applied = self.game.load_tokens(&parts[1..]);
                format!("loaded {} of {} moves", applied, parts.len() - 1)
            }
            token => {
                if !self.game.apply_token(token) {
                    "move failed".to_string()
                } else if self.automove.as_ref().is_some_and(|engine| engine.plays(self.game.turn())) {
                    self.engine_move()
                } else {
                    format!("{} to move", self.game.turn())
                }
            }
        };

        let reply = match self.game.outcome() {
            Outcome::Checkmate { winner } => format!("{}\ncheckmate, {} wins", reply, winner),
            Outcome::Stalemate => format!("{}\nstalemate", reply),
            Outcome::Draw => format!("{}\ndraw", reply),
            Outcome::Ongoing => reply,
        };
        Some(reply)
    }
}

fn load_config() -> Result<Config> {
    match env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("loading {}", path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load(DEFAULT_CONFIG_PATH).with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH))
        }
        None => Ok(Config::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    info!("starting terminal chess");

    let mut session = Session::new(load_config()?);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    write!(stdout, "{}", session.game.render())?;
    writeln!(stdout, "{}", HELP)?;
    stdout.flush()?;

    for line in stdin.lock().lines() {
        let line = line?;
        match session.handle_command(line.trim()) {
            Some(reply) => writeln!(stdout, "{}", reply)?,
            None => break,
        }
        stdout.flush()?;
    }
    Ok(())
}
