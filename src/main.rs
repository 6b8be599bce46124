// src/main.rs
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use opening_trainer::{Color, OpeningBook, Outcome, Square, Trainer, MOVE_BUDGET};

const DEFAULT_REPORT_FILENAME: &str = "training_report.json";
const DEFAULT_OPENINGS_FILE: &str = "openings.json";

// --- Session Report ---

#[derive(Debug, Serialize)]
struct SessionReport {
    player_color: Color,
    outcome: Outcome,
    opening_name: Option<String>,
    opening_eco: Option<String>,
    moves: Vec<String>,
    final_position: String,
}

#[derive(Debug)]
enum ReportError {
    Serialization(serde_json::Error),
    Io(String, io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialization(e) => write!(f, "Serialization error: {}", e),
            ReportError::Io(file, e) => write!(f, "I/O error with file '{}': {}", file, e),
        }
    }
}

impl Error for ReportError {}

fn save_report(report: &SessionReport, filename: &str) -> Result<(), ReportError> {
    let json_data =
        serde_json::to_string_pretty(report).map_err(ReportError::Serialization)?;
    fs::write(filename, json_data).map_err(|e| ReportError::Io(filename.to_string(), e))
}

// --- Input Parsing ---

#[derive(Debug)]
enum CommandError {
    InvalidArgument(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidArgument(s) => write!(f, "{}", s),
        }
    }
}

impl Error for CommandError {}

#[derive(Debug)]
enum UserInput {
    Move(Square, Square),
    Command(Command),
}

#[derive(Debug)]
enum Command {
    History,
    Skip,
    Help,
    Quit,
}

/// Parses user input into a UserInput variant or returns a CommandError.
fn parse_user_input(input: &str) -> Result<UserInput, CommandError> {
    let trimmed = input.trim();
    match trimmed.to_lowercase().as_str() {
        "history" => return Ok(UserInput::Command(Command::History)),
        "skip" => return Ok(UserInput::Command(Command::Skip)),
        "help" | "?" => return Ok(UserInput::Command(Command::Help)),
        "quit" | "exit" => return Ok(UserInput::Command(Command::Quit)),
        _ => {}
    }

    if trimmed.len() != 4 || !trimmed.is_ascii() {
        return Err(CommandError::InvalidArgument(format!(
            "Invalid input '{}': expected a move like e2e4 or a command (try 'help').",
            trimmed
        )));
    }
    let from = Square::parse(&trimmed[0..2]).ok_or_else(|| {
        CommandError::InvalidArgument(format!("Invalid 'from' square: {}", &trimmed[0..2]))
    })?;
    let to = Square::parse(&trimmed[2..4]).ok_or_else(|| {
        CommandError::InvalidArgument(format!("Invalid 'to' square: {}", &trimmed[2..4]))
    })?;
    Ok(UserInput::Move(from, to))
}

/// Formats the move history as numbered pairs ("1. e4 e5  2. Nf3 ...").
fn format_history(history: &[String]) -> String {
    let mut out = String::new();
    for (i, pair) in history.chunks(2).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(&format!("{}. {}", i + 1, pair.join(" ")));
    }
    out
}

fn read_trimmed_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    match io::stdin().read_line(&mut line)? {
        0 => Ok(None), // EOF
        _ => Ok(Some(line.trim().to_string())),
    }
}

// --- Session Flow ---

fn load_book() -> OpeningBook {
    if Path::new(DEFAULT_OPENINGS_FILE).exists() {
        match OpeningBook::load(DEFAULT_OPENINGS_FILE) {
            Ok(book) => {
                println!("Loaded openings from '{}'.", DEFAULT_OPENINGS_FILE);
                return book;
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not use '{}' ({}). Falling back to the built-in openings.",
                    DEFAULT_OPENINGS_FILE, e
                );
            }
        }
    }
    OpeningBook::builtin()
}

/// Prints the end-of-session screen and writes the JSON report.
fn finish_session(trainer: &Trainer<StdRng>, outcome: Outcome) {
    println!("------------------------------------------");
    match &outcome {
        Outcome::Success => {
            println!("=== SUCCESS: You stayed in book. ===");
        }
        Outcome::Failure { played, expected } => {
            println!("=== OUT OF BOOK ===");
            println!("You played {} where the opening continues {}.", played, expected);
        }
        Outcome::Skip => {
            println!("=== SESSION SKIPPED ===");
        }
    }

    if let Some(line) = trainer.active_line() {
        println!("\nOpening: {} ({})", line.name, line.eco);
        println!("  {}", line.description);
        println!("  Book line: {}", line.moves.join(" "));
    }
    let history = trainer.session().history();
    if !history.is_empty() {
        println!("  You played: {}", format_history(history));
    }

    let report = SessionReport {
        player_color: trainer.player_color(),
        outcome,
        opening_name: trainer.active_line().map(|l| l.name.clone()),
        opening_eco: trainer.active_line().map(|l| l.eco.clone()),
        moves: history.to_vec(),
        final_position: trainer.session().position().to_fen(),
    };
    match save_report(&report, DEFAULT_REPORT_FILENAME) {
        Ok(()) => println!("Session report saved to '{}'.", DEFAULT_REPORT_FILENAME),
        Err(e) => eprintln!("Error: failed to save session report: {}", e),
    }
}

/// Runs one training session. Returns false when the user asked to quit.
fn run_session(book: OpeningBook, player_color: Color) -> Result<bool, Box<dyn Error>> {
    let mut trainer = Trainer::new(book, player_color, StdRng::from_os_rng());

    println!("\nYou play {}. Stay in book for {} moves.", player_color, MOVE_BUDGET);
    if let Some(opening_move) = trainer.start() {
        println!("Computer opens with {}.", opening_move);
    }

    'session: loop {
        println!("------------------------------------------");
        println!("{}", trainer.session().position());
        let history = trainer.session().history();
        if !history.is_empty() {
            println!("History: {}", format_history(history));
        }
        println!("Move {}/{}", trainer.full_moves(), MOVE_BUDGET);

        print!("Enter move (e.g. e2e4) or command: ");
        io::stdout().flush()?;
        let input = match read_trimmed_line() {
            Ok(Some(line)) => line,
            Ok(None) => {
                println!("\nEnd of input detected. Quitting.");
                return Ok(false);
            }
            Err(e) => {
                eprintln!("Error reading input: {}. Try again or use 'quit'.", e);
                continue 'session;
            }
        };
        if input.is_empty() {
            continue 'session;
        }

        match parse_user_input(&input) {
            Ok(UserInput::Move(from, to)) => match trainer.play(from, to) {
                Ok(report) => {
                    if let Some(reply) = &report.reply {
                        println!("Computer plays {}.", reply);
                    }
                    if let Some(outcome) = report.outcome {
                        finish_session(&trainer, outcome);
                        break 'session;
                    }
                }
                Err(e) => {
                    println!("Error making move: {}", e);
                }
            },
            Ok(UserInput::Command(command)) => match command {
                Command::History => {
                    let history = trainer.session().history();
                    if history.is_empty() {
                        println!("No moves played yet.");
                    } else {
                        println!("History: {}", format_history(history));
                    }
                }
                Command::Skip => {
                    finish_session(&trainer, Outcome::Skip);
                    break 'session;
                }
                Command::Help => print_help(),
                Command::Quit => {
                    println!("Exiting session.");
                    return Ok(false);
                }
            },
            Err(e) => {
                println!("Input Error: {}", e);
            }
        }
    }

    Ok(true)
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("==============================");
    println!("|   Opening Trainer (CLI)    |");
    println!("==============================");
    print_help();

    let book = load_book();

    loop {
        print!("\nPlay as (white/black) or quit: ");
        io::stdout().flush()?;
        let choice = match read_trimmed_line()? {
            Some(line) => line.to_lowercase(),
            None => break,
        };
        let player_color = match choice.as_str() {
            "white" | "w" => Color::White,
            "black" | "b" => Color::Black,
            "quit" | "exit" => break,
            "" => continue,
            other => {
                println!("Unrecognized choice '{}'. Enter white, black or quit.", other);
                continue;
            }
        };

        if !run_session(book.clone(), player_color)? {
            break;
        }
    }

    println!("\nTraining session finished.");
    Ok(())
}

/// Prints available commands.
fn print_help() {
    println!("\nAvailable Commands:");
    println!("  <move>       Enter a move as origin and destination squares (e.g. e2e4).");
    println!("  history      Show the moves played so far.");
    println!("  skip         Abandon this opening and pick a new color.");
    println!("  help         Show this help message.");
    println!("  quit / exit  Leave the trainer.");
    println!();
}
