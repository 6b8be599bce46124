// src/opening.rs
//
// Opening corpus: named move sequences grouped into a white pool (lines
// the computer leads when it plays White) and a black pool (defenses it
// plays against the human's White). A built-in corpus ships with the
// binary; an external JSON file with the same shape can replace it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::board::Color;

/// One opening line: an ordered sequence of half-moves in algebraic
/// notation, starting from the initial position.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OpeningLine {
    pub name: String,
    pub eco: String,
    pub moves: Vec<String>,
    pub description: String,
}

/// The two pools. `white` holds lines introduced by White's repertoire,
/// `black` holds defenses; which pool the trainer draws from depends on the
/// side the human chose.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OpeningBook {
    pub white: Vec<OpeningLine>,
    pub black: Vec<OpeningLine>,
}

#[derive(Debug)]
pub enum BookError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::Io(e) => write!(f, "Failed to read openings file: {}", e),
            BookError::Parse(e) => write!(f, "Failed to parse openings file: {}", e),
        }
    }
}

impl Error for BookError {}

fn line(name: &str, eco: &str, moves: &[&str], description: &str) -> OpeningLine {
    OpeningLine {
        name: name.to_string(),
        eco: eco.to_string(),
        moves: moves.iter().map(|m| m.to_string()).collect(),
        description: description.to_string(),
    }
}

impl OpeningBook {
    /// Loads a book from a JSON file shaped like the built-in corpus.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<OpeningBook, BookError> {
        let text = fs::read_to_string(path).map_err(BookError::Io)?;
        serde_json::from_str(&text).map_err(BookError::Parse)
    }

    /// The pool of lines the computer draws on when playing `side`.
    pub fn pool(&self, side: Color) -> &[OpeningLine] {
        match side {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// The built-in corpus: 16 white lines and 20 black defenses.
    pub fn builtin() -> OpeningBook {
        OpeningBook {
            white: vec![
                line(
                    "Italian Game",
                    "C50",
                    &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6", "d4", "exd4",
                      "cxd4", "Bb4", "Nc3", "Nxe4", "O-O"],
                    "Classical opening controlling the center",
                ),
                line(
                    "Ruy López (Spanish Opening)",
                    "C60",
                    &["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O", "Be7",
                      "Re1", "b5", "Bb3", "d6", "c3", "O-O"],
                    "One of the oldest and most classical openings",
                ),
                line(
                    "Queen's Gambit",
                    "D06",
                    &["d4", "d5", "c4", "e6", "Nc3", "Nf6", "Bg5", "Be7", "e3", "O-O",
                      "Nf3", "Nbd7", "Rc1", "c6"],
                    "Strategic opening offering a pawn for central control",
                ),
                line(
                    "King's Gambit",
                    "C30",
                    &["e4", "e5", "f4", "exf4", "Nf3", "g5", "h4", "g4", "Ne5", "Nf6",
                      "Bc4", "d5", "exd5"],
                    "Aggressive romantic-era gambit",
                ),
                line(
                    "Scotch Game",
                    "C45",
                    &["e4", "e5", "Nf3", "Nc6", "d4", "exd4", "Nxd4", "Nf6", "Nxc6",
                      "bxc6", "e5", "Qe7", "Qe2", "Nd5"],
                    "Direct central opening",
                ),
                line(
                    "English Opening",
                    "A10",
                    &["c4", "e5", "Nc3", "Nf6", "Nf3", "Nc6", "g3", "d5", "cxd5",
                      "Nxd5", "Bg2", "Nb6"],
                    "Hypermodern flank opening",
                ),
                line(
                    "Scholar's Mate Trap",
                    "C20",
                    &["e4", "e5", "Bc4", "Nc6", "Qh5", "Nf6", "Qxf7"],
                    "Beginner trap aiming for quick mate",
                ),
                line(
                    "Vienna Game",
                    "C25",
                    &["e4", "e5", "Nc3", "Nf6", "f4", "d5", "fxe5", "Nxe4", "Nf3",
                      "Bg4", "Qe2", "Nxc3"],
                    "Flexible opening preparing f4",
                ),
                line(
                    "London System",
                    "D02",
                    &["d4", "Nf6", "Nf3", "d5", "Bf4", "e6", "e3", "Bd6", "Bg3", "O-O",
                      "Nbd2", "c5", "c3"],
                    "Solid and systematic opening",
                ),
                line(
                    "Catalan Opening",
                    "E00",
                    &["d4", "Nf6", "c4", "e6", "g3", "d5", "Bg2", "Be7", "Nf3", "O-O",
                      "O-O", "Nbd7"],
                    "Combines Queen's Gambit with fianchetto",
                ),
                line(
                    "Four Knights Game",
                    "C47",
                    &["e4", "e5", "Nf3", "Nc6", "Nc3", "Nf6", "Bb5", "Bb4", "O-O",
                      "O-O", "d3", "d6"],
                    "Symmetrical and solid opening",
                ),
                line(
                    "Giuoco Piano",
                    "C53",
                    &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "c3", "Nf6", "d4",
                      "exd4", "cxd4", "Bb4", "Bd2"],
                    "Quiet Italian Game variation",
                ),
                line(
                    "Evans Gambit",
                    "C51",
                    &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "b4", "Bxb4", "c3",
                      "Ba5", "d4", "exd4"],
                    "Aggressive pawn sacrifice for rapid development",
                ),
                line(
                    "Danish Gambit",
                    "C21",
                    &["e4", "e5", "d4", "exd4", "c3", "dxc3", "Bc4", "cxb2", "Bxb2",
                      "Nf6", "Nc3", "Bb4"],
                    "Double pawn gambit for attacking chances",
                ),
                line(
                    "Blackmar-Diemer Gambit",
                    "D00",
                    &["d4", "d5", "e4", "dxe4", "Nc3", "Nf6", "f3", "exf3", "Nxf3",
                      "Bg4", "h3", "Bxf3"],
                    "Tactical gambit against d5",
                ),
                line(
                    "Traxler Counter-Gambit Response",
                    "C57",
                    &["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "Ng5", "Bc5", "Nxf7",
                      "Bxf2", "Kxf2", "Nxe4"],
                    "Sharp tactical complications",
                ),
            ],
            black: vec![
                line(
                    "Sicilian Defense",
                    "B20",
                    &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3",
                      "a6", "Be3", "e5", "Nb3", "Be6"],
                    "Sharp, fighting defense",
                ),
                line(
                    "Sicilian Dragon",
                    "B70",
                    &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3",
                      "g6", "Be3", "Bg7", "f3", "O-O"],
                    "Aggressive fianchetto variation",
                ),
                line(
                    "Sicilian Najdorf",
                    "B90",
                    &["e4", "c5", "Nf3", "d6", "d4", "cxd4", "Nxd4", "Nf6", "Nc3",
                      "a6", "Be3", "e5", "Nb3"],
                    "Most popular Sicilian variation",
                ),
                line(
                    "French Defense",
                    "C00",
                    &["e4", "e6", "d4", "d5", "Nc3", "Nf6", "Bg5", "Be7", "e5",
                      "Nfd7", "Bxe7", "Qxe7", "f4", "O-O"],
                    "Solid defensive system",
                ),
                line(
                    "Caro-Kann Defense",
                    "B10",
                    &["e4", "c6", "d4", "d5", "Nc3", "dxe4", "Nxe4", "Bf5", "Ng3",
                      "Bg6", "h4", "h6", "Nf3", "Nd7"],
                    "Solid and reliable defense",
                ),
                line(
                    "Scandinavian Defense",
                    "B01",
                    &["e4", "d5", "exd5", "Qxd5", "Nc3", "Qa5", "d4", "Nf6", "Nf3",
                      "Bf5", "Bc4", "e6", "Bd2"],
                    "Immediate central challenge",
                ),
                line(
                    "Pirc Defense",
                    "B07",
                    &["e4", "d6", "d4", "Nf6", "Nc3", "g6", "f4", "Bg7", "Nf3",
                      "O-O", "Bd3", "Na6", "O-O"],
                    "Hypermodern defense",
                ),
                line(
                    "King's Indian Defense",
                    "E60",
                    &["d4", "Nf6", "c4", "g6", "Nc3", "Bg7", "e4", "d6", "Nf3",
                      "O-O", "Be2", "e5", "O-O", "Nc6"],
                    "Aggressive counterattacking setup",
                ),
                line(
                    "Queen's Gambit Declined",
                    "D30",
                    &["d4", "d5", "c4", "e6", "Nc3", "Nf6", "Bg5", "Be7", "e3",
                      "O-O", "Nf3", "Nbd7", "Rc1", "c6"],
                    "Classical and solid defense",
                ),
                line(
                    "Alekhine's Defense",
                    "B02",
                    &["e4", "Nf6", "e5", "Nd5", "d4", "d6", "Nf3", "Bg4", "Be2",
                      "e6", "O-O", "Be7"],
                    "Hypermodern provocation",
                ),
                line(
                    "Nimzo-Indian Defense",
                    "E20",
                    &["d4", "Nf6", "c4", "e6", "Nc3", "Bb4", "Qc2", "O-O", "a3",
                      "Bxc3", "Qxc3", "b6"],
                    "Strategic pin on knight",
                ),
                line(
                    "Grünfeld Defense",
                    "D80",
                    &["d4", "Nf6", "c4", "g6", "Nc3", "d5", "cxd5", "Nxd5", "e4",
                      "Nxc3", "bxc3", "Bg7"],
                    "Dynamic counterplay against d4",
                ),
                line(
                    "Slav Defense",
                    "D10",
                    &["d4", "d5", "c4", "c6", "Nf3", "Nf6", "Nc3", "dxc4", "a4",
                      "Bf5", "e3", "e6"],
                    "Solid defense maintaining central pawn",
                ),
                line(
                    "Dutch Defense",
                    "A80",
                    &["d4", "f5", "g3", "Nf6", "Bg2", "e6", "Nf3", "Be7", "O-O",
                      "O-O", "c4", "d6"],
                    "Aggressive kingside expansion",
                ),
                line(
                    "Benoni Defense",
                    "A43",
                    &["d4", "c5", "d5", "e6", "Nc3", "exd5", "cxd5", "d6", "e4",
                      "g6", "Nf3", "Bg7"],
                    "Counterattacking pawn structure",
                ),
                line(
                    "Budapest Gambit",
                    "A51",
                    &["d4", "Nf6", "c4", "e5", "dxe5", "Ng4", "Bf4", "Nc6", "Nf3",
                      "Bb4", "Nbd2", "Qe7"],
                    "Gambit for quick development and attack",
                ),
                line(
                    "Benko Gambit",
                    "A57",
                    &["d4", "Nf6", "c4", "c5", "d5", "b5", "cxb5", "a6", "bxa6",
                      "Bxa6", "Nc3", "d6"],
                    "Pawn sacrifice for queenside pressure",
                ),
                line(
                    "Old Benoni Defense",
                    "A43",
                    &["d4", "c5", "d5", "e5", "Nc3", "d6", "e4", "Be7", "Nf3",
                      "Bg4", "Be2", "Nf6"],
                    "Solid closed structure",
                ),
                line(
                    "Elephant Trap (QGD)",
                    "D51",
                    &["d4", "d5", "c4", "e6", "Nc3", "Nf6", "Bg5", "Nbd7", "cxd5",
                      "exd5", "Nxd5", "Nxd5", "Bxd8"],
                    "Trap in Queen's Gambit Declined",
                ),
                line(
                    "Fishing Pole Trap (Ruy López)",
                    "C65",
                    &["e4", "e5", "Nf3", "Nc6", "Bb5", "Nf6", "O-O", "Ng4", "h3",
                      "h5", "hxg4", "hxg4"],
                    "Tactical trap in Ruy López",
                ),
            ],
        }
    }
}
