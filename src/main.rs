//! # Cairn Main Entry Point
//!
//! Headless driver: builds or loads a game, then reads text commands from a
//! script file or stdin and prints the messages each one produces.

use cairn::{
    inventory_lines, spell_lines, CairnResult, Command, GameConfig, GameState, GeneratorKind,
    InputHandler, InputResolution, MessageKind, MessageLog, PlayerIntent, RenderSnapshot,
    StatusReadout, TurnOutcome, HELP_TEXT, TARGET_PROMPT,
};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

/// Command line arguments for the Cairn driver.
#[derive(Parser, Debug)]
#[command(name = "cairn")]
#[command(about = "Headless driver for the Cairn roguelike core")]
#[command(version)]
struct Args {
    /// Random seed for the game
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grow cellular-automata caves instead of rooms
    #[arg(long)]
    caves: bool,

    /// JSON game configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read commands from this file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Save the game here when the session ends
    #[arg(long)]
    save: Option<PathBuf>,

    /// Resume a saved game
    #[arg(long)]
    load: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> CairnResult<()> {
    let args = Args::parse();
    initialize_logging(&args.log_level);
    log::info!("Starting Cairn v{}", cairn::VERSION);

    let mut state = start_game(&args)?;
    let input: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_session(&mut state, input, &mut out)?;

    if let Some(path) = &args.save {
        state.save_to_file(path)?;
        writeln!(out, "Saved to {}", path.display())?;
    }
    Ok(())
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
        tracing::debug!("Tracing subscriber installed");
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
            .format_target(false)
            .init();
    }
}

/// Loads a saved game or starts a new one from the CLI settings.
fn start_game(args: &Args) -> CairnResult<GameState> {
    if let Some(path) = &args.load {
        return GameState::load_from_file(path);
    }

    let mut config = match &args.config {
        Some(path) => GameConfig::from_json_file(path)?,
        None => GameConfig::new(rand::random()),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
        config.generation.seed = seed;
    }
    if args.caves {
        config.generation.kind = GeneratorKind::Caves;
    }
    log::info!("Seed {}", config.seed);
    GameState::new_game(config)
}

/// Tracks which log lines have already been printed.
#[derive(Debug, Default)]
struct MessageCursor {
    seen: usize,
    last_count: u32,
}

impl MessageCursor {
    /// Lines added or restacked since the last call.
    ///
    /// `seen` counts every line ever logged, including ones the log dropped.
    fn fresh(&mut self, log: &MessageLog) -> Vec<String> {
        let messages = log.messages();
        let dropped = log.dropped();
        let mut lines = Vec::new();
        let previous = self
            .seen
            .checked_sub(1)
            .and_then(|i| i.checked_sub(dropped))
            .and_then(|i| messages.get(i));
        if let Some(previous) = previous {
            if previous.count != self.last_count {
                lines.push(previous.full_text());
            }
        }
        let unseen = self.seen.saturating_sub(dropped);
        lines.extend(messages.iter().skip(unseen).map(|m| m.full_text()));

        self.seen = dropped + messages.len();
        self.last_count = messages.last().map_or(0, |m| m.count);
        lines
    }
}

enum Flow {
    Continue,
    Quit,
}

fn run_session<R: BufRead, W: Write>(state: &mut GameState, input: R, out: &mut W) -> CairnResult<()> {
    let mut handler = InputHandler::new();
    let mut cursor = MessageCursor::default();
    print_lines(out, &cursor.fresh(&state.message_log))?;

    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                writeln!(out, "{}", error)?;
                continue;
            }
        };

        match execute(state, &mut handler, command, out) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(error) => {
                log::error!("Command failed: {}", error);
                state
                    .message_log
                    .add(format!("Error: {}", error), MessageKind::Error);
            }
        }
        print_lines(out, &cursor.fresh(&state.message_log))?;

        if state.is_game_over() {
            writeln!(out, "Game over.")?;
            break;
        }
        if state.actor(state.player_id)?.level.requires_level_up() {
            writeln!(out, "You can level up: levelup con|str")?;
        }
    }
    Ok(())
}

fn execute<W: Write>(
    state: &mut GameState,
    handler: &mut InputHandler,
    command: Command,
    out: &mut W,
) -> CairnResult<Flow> {
    match command {
        Command::Intent(intent) => play_intent(state, handler, intent, out)?,
        Command::LevelUp(choice) => {
            if let Err(error) = state.apply_level_up(choice) {
                state.message_log.add(error.to_string(), MessageKind::Invalid);
            }
        }
        Command::ShowMap => {
            let snapshot = RenderSnapshot::capture(state)?;
            writeln!(out, "{}", snapshot.to_ascii())?;
            print_lines(out, &snapshot.status.lines())?;
        }
        Command::ShowInventory => {
            print_lines(out, &inventory_lines(state)?)?;
            writeln!(out, "Spells:")?;
            print_lines(out, &spell_lines(state)?)?;
        }
        Command::ShowStatus => print_lines(out, &StatusReadout::from_state(state)?.lines())?,
        Command::Save(path) => {
            state.save_to_file(&path)?;
            writeln!(out, "Saved to {}", path.display())?;
        }
        Command::Help => writeln!(out, "{}", HELP_TEXT)?,
        Command::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

fn play_intent<W: Write>(
    state: &mut GameState,
    handler: &mut InputHandler,
    intent: PlayerIntent,
    out: &mut W,
) -> CairnResult<()> {
    match handler.resolve(intent, state)? {
        InputResolution::Act(action) => {
            if let TurnOutcome::GameOver = state.play_turn(action)? {
                log::info!("Session over after {} turns", state.turn_number);
            }
        }
        InputResolution::NeedsTarget => {
            state.message_log.add(TARGET_PROMPT, MessageKind::NeedsTarget);
        }
        InputResolution::Cancelled => {}
        InputResolution::Described(text) => writeln!(out, "{}", text)?,
        InputResolution::Invalid(reason) => state.message_log.add(reason, MessageKind::Invalid),
    }
    Ok(())
}

fn print_lines<W: Write>(out: &mut W, lines: &[String]) -> CairnResult<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    Ok(())
}
