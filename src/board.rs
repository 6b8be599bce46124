// src/board.rs
//
// Board engine: position state, legal move generation with a self-check
// filter, check detection, move application and algebraic notation.
// Positions are plain values; every mutating operation clones and returns
// a new one, so speculative moves never alias committed state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

// --- Enums and Basic Structs ---

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Uppercase letter used in algebraic notation ('P' is never printed
    /// for pawn moves, but the letter still exists for FEN).
    fn letter(&self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = self.kind.letter();
        let symbol = match self.color {
            Color::White => symbol,
            Color::Black => symbol.to_ascii_lowercase(),
        };
        write!(f, "{}", symbol)
    }
}

/// A file/rank coordinate pair. File 0 is the a-file, rank 0 is rank 1.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Square {
        debug_assert!(file < 8 && rank < 8);
        Square { file, rank }
    }

    /// Builds a square from signed coordinates, rejecting off-board values.
    pub fn from_coords(file: i8, rank: i8) -> Option<Square> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Parses algebraic notation (e.g. "e4").
    pub fn parse(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let file_char = chars.next()?;
        let rank_char = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let file = match file_char {
            'a'..='h' => file_char as u8 - b'a',
            _ => return None,
        };
        let rank = match rank_char {
            '1'..='8' => rank_char as u8 - b'1',
            _ => return None,
        };
        Some(Square::new(file, rank))
    }

    pub fn file(&self) -> u8 {
        self.file
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    /// The square offset by (d_file, d_rank), if still on the board.
    fn offset(&self, d_file: i8, d_rank: i8) -> Option<Square> {
        Square::from_coords(self.file as i8 + d_file, self.rank as i8 + d_rank)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank + 1)
    }
}

// --- Move Representation ---

/// An ephemeral candidate move. Carries no legality guarantee until it has
/// passed through the self-check filter in `Position::legal_moves`.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub is_capture: bool,
}

// --- Movement Geometry ---

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const ROYAL_DIRS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

// --- Errors ---

#[derive(Debug)]
pub enum FenError {
    MissingPlacement,
    RankCount(usize),
    RankWidth(String),
    BadPiece(char),
    BadTurn(String),
    BadEnPassant(String),
    BadCounter(String),
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::MissingPlacement => write!(f, "Position text is empty."),
            FenError::RankCount(n) => write!(f, "Expected 8 ranks, found {}.", n),
            FenError::RankWidth(rank) => write!(f, "Rank '{}' does not describe 8 squares.", rank),
            FenError::BadPiece(c) => write!(f, "Unknown piece letter '{}'.", c),
            FenError::BadTurn(s) => write!(f, "Invalid side to move: '{}'.", s),
            FenError::BadEnPassant(s) => write!(f, "Invalid en passant target: '{}'.", s),
            FenError::BadCounter(s) => write!(f, "Invalid move counter: '{}'.", s),
        }
    }
}

impl Error for FenError {}

#[derive(Debug, PartialEq, Eq)]
pub enum MoveError {
    NoPiece(Square),
    NotYourTurn(Square),
    LeavesKingInCheck(Square, Square),
    IllegalMove(Square, Square),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NoPiece(sq) => write!(f, "No piece found at {}.", sq),
            MoveError::NotYourTurn(sq) => write!(f, "The piece at {} is not yours to move.", sq),
            MoveError::LeavesKingInCheck(from, to) => {
                write!(f, "Illegal move {}{}: leaves your king in check.", from, to)
            }
            MoveError::IllegalMove(from, to) => {
                write!(f, "Illegal move {}{}: not a legal destination for that piece.", from, to)
            }
        }
    }
}

impl Error for MoveError {}

// --- Position ---

/// Full board-and-metadata snapshot at one point in a game. The castling
/// and en passant fields are carried verbatim through parse/serialize but
/// never consulted by move generation (castling and en passant legality are
/// deliberately out of scope).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: [[Option<Piece>; 8]; 8], // indexed [rank][file], rank 0 = rank 1
    turn: Color,
    castling: String,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// The standard initial position.
    pub fn initial() -> Position {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = [[None; 8]; 8];
        for file in 0..8 {
            board[0][file] = Some(Piece::new(BACK_RANK[file], Color::White));
            board[1][file] = Some(Piece::new(PieceKind::Pawn, Color::White));
            board[6][file] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board[7][file] = Some(Piece::new(BACK_RANK[file], Color::Black));
        }
        Position {
            board,
            turn: Color::White,
            castling: "KQkq".to_string(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parses a six-field FEN-like string. The piece placement field is
    /// mandatory and validated; the trailing fields default to the initial
    /// values when absent but must be well-formed when present.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingPlacement)?;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut board = [[None; 8]; 8];
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i; // FEN lists rank 8 first
            let mut file = 0usize;
            for c in rank_text.chars() {
                if let Some(run) = c.to_digit(10) {
                    file += run as usize;
                } else {
                    let kind = PieceKind::from_letter(c).ok_or(FenError::BadPiece(c))?;
                    let color = if c.is_uppercase() { Color::White } else { Color::Black };
                    if file >= 8 {
                        return Err(FenError::RankWidth(rank_text.to_string()));
                    }
                    board[rank][file] = Some(Piece::new(kind, color));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::RankWidth(rank_text.to_string()));
                }
            }
            if file != 8 {
                return Err(FenError::RankWidth(rank_text.to_string()));
            }
        }

        let turn = match fields.next() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => return Err(FenError::BadTurn(other.to_string())),
        };
        let castling = fields.next().unwrap_or("KQkq").to_string();
        let en_passant = match fields.next() {
            None | Some("-") => None,
            Some(s) => Some(Square::parse(s).ok_or_else(|| FenError::BadEnPassant(s.to_string()))?),
        };
        let halfmove_clock = match fields.next() {
            None => 0,
            Some(s) => s.parse().map_err(|_| FenError::BadCounter(s.to_string()))?,
        };
        let fullmove_number = match fields.next() {
            None => 1,
            Some(s) => s.parse().map_err(|_| FenError::BadCounter(s.to_string()))?,
        };

        Ok(Position {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
        })
    }

    /// Serializes back to the six-field text form. Round-trips with
    /// `from_fen` for any reachable position.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank][file] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push_str(&piece.to_string());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        let turn = match self.turn {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };
        format!(
            "{} {} {} {} {} {}",
            fen, turn, self.castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq.rank as usize][sq.file as usize]
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.board[sq.rank as usize][sq.file as usize] = piece;
    }

    // --- Move Generation ---

    /// Pushes a candidate move when the destination is on the board and not
    /// occupied by a friendly piece. Returns whether a slider may continue
    /// past the destination (i.e. the destination was empty).
    fn push_if_open(
        &self,
        moves: &mut Vec<Move>,
        piece: Piece,
        from: Square,
        file: i8,
        rank: i8,
    ) -> bool {
        let to = match Square::from_coords(file, rank) {
            Some(sq) => sq,
            None => return false,
        };
        match self.piece_at(to) {
            Some(target) => {
                if target.color != piece.color {
                    moves.push(Move {
                        from,
                        to,
                        piece: piece.kind,
                        is_capture: true,
                    });
                }
                false
            }
            None => {
                moves.push(Move {
                    from,
                    to,
                    piece: piece.kind,
                    is_capture: false,
                });
                true
            }
        }
    }

    /// Geometric reach only: board bounds, blockers and "not onto a friendly
    /// piece", without the self-check filter. Empty if the square is empty
    /// or holds a piece of the side not to move.
    fn pseudo_moves(&self, from: Square) -> Vec<Move> {
        let piece = match self.piece_at(from) {
            Some(p) if p.color == self.turn => p,
            _ => return Vec::new(),
        };
        let mut moves = Vec::new();

        match piece.kind {
            PieceKind::Pawn => {
                let dir: i8 = if piece.color == Color::White { 1 } else { -1 };
                let home_rank = if piece.color == Color::White { 1 } else { 6 };

                // Forward pushes: single always from an empty square ahead,
                // double only from the home rank across two empty squares.
                if let Some(one) = from.offset(0, dir) {
                    if self.piece_at(one).is_none() {
                        self.push_if_open(&mut moves, piece, from, one.file as i8, one.rank as i8);
                        if from.rank == home_rank {
                            if let Some(two) = from.offset(0, 2 * dir) {
                                if self.piece_at(two).is_none() {
                                    self.push_if_open(
                                        &mut moves,
                                        piece,
                                        from,
                                        two.file as i8,
                                        two.rank as i8,
                                    );
                                }
                            }
                        }
                    }
                }

                // Diagonal captures onto occupied opposing squares only.
                for d_file in [-1i8, 1] {
                    if let Some(cap) = from.offset(d_file, dir) {
                        if matches!(self.piece_at(cap), Some(t) if t.color != piece.color) {
                            self.push_if_open(
                                &mut moves,
                                piece,
                                from,
                                cap.file as i8,
                                cap.rank as i8,
                            );
                        }
                    }
                }
            }
            PieceKind::Knight => {
                for (df, dr) in KNIGHT_OFFSETS {
                    self.push_if_open(
                        &mut moves,
                        piece,
                        from,
                        from.file as i8 + df,
                        from.rank as i8 + dr,
                    );
                }
            }
            PieceKind::King => {
                for (df, dr) in ROYAL_DIRS {
                    self.push_if_open(
                        &mut moves,
                        piece,
                        from,
                        from.file as i8 + df,
                        from.rank as i8 + dr,
                    );
                }
            }
            PieceKind::Bishop => self.slide(&mut moves, piece, from, &BISHOP_DIRS),
            PieceKind::Rook => self.slide(&mut moves, piece, from, &ROOK_DIRS),
            PieceKind::Queen => self.slide(&mut moves, piece, from, &ROYAL_DIRS),
        }

        moves
    }

    fn slide(&self, moves: &mut Vec<Move>, piece: Piece, from: Square, dirs: &[(i8, i8)]) {
        for &(df, dr) in dirs {
            for step in 1..8 {
                let open = self.push_if_open(
                    moves,
                    piece,
                    from,
                    from.file as i8 + df * step,
                    from.rank as i8 + dr * step,
                );
                if !open {
                    break;
                }
            }
        }
    }

    /// All legal moves for the piece on `from`. Every candidate is applied
    /// to a scratch copy and discarded if the mover's own king would be
    /// attacked afterwards; that filter is the sole legality gate beyond
    /// movement geometry.
    pub fn legal_moves(&self, from: Square) -> Vec<Move> {
        let color = match self.piece_at(from) {
            Some(p) => p.color,
            None => return Vec::new(),
        };
        self.pseudo_moves(from)
            .into_iter()
            .filter(|mv| match self.apply_move(mv) {
                Some((next, _)) => !next.is_in_check(color),
                None => false,
            })
            .collect()
    }

    // --- Attack Detection ---

    /// True when every square strictly between `from` and `to` is empty.
    /// `from` and `to` must share a rank, file or diagonal.
    fn path_clear(&self, from: Square, to: Square) -> bool {
        let d_file = (to.file as i8 - from.file as i8).signum();
        let d_rank = (to.rank as i8 - from.rank as i8).signum();
        let mut file = from.file as i8 + d_file;
        let mut rank = from.rank as i8 + d_rank;
        while file != to.file as i8 || rank != to.rank as i8 {
            if self.board[rank as usize][file as usize].is_some() {
                return false;
            }
            file += d_file;
            rank += d_rank;
        }
        true
    }

    /// Scans every piece of `by` for a raw attack on `target`, ignoring
    /// pins and legality.
    pub fn is_square_attacked(&self, target: Square, by: Color) -> bool {
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let from = Square::new(file, rank);
                let piece = match self.piece_at(from) {
                    Some(p) if p.color == by => p,
                    _ => continue,
                };
                let d_file = (target.file as i8 - file as i8).abs();
                let d_rank = target.rank as i8 - rank as i8;
                let attacks = match piece.kind {
                    PieceKind::Pawn => {
                        let dir: i8 = if by == Color::White { 1 } else { -1 };
                        d_rank == dir && d_file == 1
                    }
                    PieceKind::Knight => {
                        let d_rank = d_rank.abs();
                        (d_file == 2 && d_rank == 1) || (d_file == 1 && d_rank == 2)
                    }
                    PieceKind::Bishop => d_file == d_rank.abs() && self.path_clear(from, target),
                    PieceKind::Rook => {
                        (d_file == 0 || d_rank == 0) && self.path_clear(from, target)
                    }
                    PieceKind::Queen => {
                        (d_file == d_rank.abs() || d_file == 0 || d_rank == 0)
                            && self.path_clear(from, target)
                    }
                    PieceKind::King => d_file <= 1 && d_rank.abs() <= 1,
                };
                if attacks {
                    return true;
                }
            }
        }
        false
    }

    /// Locates the first king of `color` in scan order. Absence is a
    /// degenerate-but-valid state.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        for rank in 0..8u8 {
            for file in 0..8u8 {
                let sq = Square::new(file, rank);
                if self.piece_at(sq) == Some(Piece::new(PieceKind::King, color)) {
                    return Some(sq);
                }
            }
        }
        None
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king_sq) => self.is_square_attacked(king_sq, color.opponent()),
            None => false,
        }
    }

    // --- Move Application ---

    /// Applies a move to a copy of this position, returning the new position
    /// and the generated notation. Pawns reaching the back rank are promoted
    /// to a queen unconditionally. Fails only when the origin square is
    /// empty; legality is the caller's gate (`GameSession::play`).
    pub fn apply_move(&self, mv: &Move) -> Option<(Position, String)> {
        let piece = self.piece_at(mv.from)?;
        let captured = self.piece_at(mv.to);

        let mut next = self.clone();
        let landed = if piece.kind == PieceKind::Pawn && (mv.to.rank == 0 || mv.to.rank == 7) {
            Piece::new(PieceKind::Queen, piece.color)
        } else {
            piece
        };
        next.set(mv.to, Some(landed));
        next.set(mv.from, None);

        next.turn = self.turn.opponent();
        if next.turn == Color::White {
            next.fullmove_number += 1;
        }

        Some((next, notation(mv, piece, captured)))
    }

    // --- Notation ---

    /// Regenerates the notation this position would produce for `mv`.
    pub fn notation_for(&self, mv: &Move) -> Option<String> {
        let piece = self.piece_at(mv.from)?;
        Some(notation(mv, piece, self.piece_at(mv.to)))
    }

    /// Intentionally approximate text-to-move resolution: strips trailing
    /// decorations, then returns the first legal move whose generated
    /// notation contains the input, or whose destination equals a
    /// two-character input. Ambiguous input may resolve to the wrong piece;
    /// callers needing exactness should supply from/to squares directly.
    pub fn parse_notation(&self, text: &str) -> Option<Move> {
        let cleaned: String = text
            .chars()
            .filter(|c| !matches!(c, '+' | '#' | '!' | '?'))
            .collect();
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let from = Square::new(file, rank);
                for mv in self.legal_moves(from) {
                    let rendered = match self.notation_for(&mv) {
                        Some(n) => n,
                        None => continue,
                    };
                    if rendered.contains(&cleaned)
                        || (cleaned.len() == 2 && mv.to.to_string() == cleaned)
                    {
                        return Some(mv);
                    }
                }
            }
        }
        None
    }
}

/// Standard algebraic notation without disambiguation: pawn moves render as
/// the destination square, prefixed with "<file>x" on capture; other pieces
/// as the uppercase kind letter, an optional "x", then the destination.
fn notation(mv: &Move, piece: Piece, captured: Option<Piece>) -> String {
    if piece.kind == PieceKind::Pawn {
        if captured.is_some() {
            format!("{}x{}", mv.from.file_char(), mv.to)
        } else {
            mv.to.to_string()
        }
    } else if captured.is_some() {
        format!("{}x{}", piece.kind.letter(), mv.to)
    } else {
        format!("{}{}", piece.kind.letter(), mv.to)
    }
}

// Board display adapted for terminal play.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  +-----------------+")?;
        for rank in (0..8).rev() {
            write!(f, "{} | ", rank + 1)?;
            for file in 0..8 {
                match self.board[rank][file] {
                    Some(piece) => write!(f, "{} ", piece)?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "  +-----------------+")?;
        writeln!(f, "    a b c d e f g h")?;
        write!(f, "Turn: {}", self.turn)
    }
}

// --- Game Session ---

/// A position plus its append-only notation history. `Clone` yields a fully
/// independent session, which is how speculative moves are tried without
/// touching committed state.
#[derive(Debug, Clone)]
pub struct GameSession {
    position: Position,
    history: Vec<String>,
}

impl GameSession {
    pub fn new() -> GameSession {
        GameSession {
            position: Position::initial(),
            history: Vec::new(),
        }
    }

    pub fn from_position(position: Position) -> GameSession {
        GameSession {
            position,
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn turn(&self) -> Color {
        self.position.turn
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.position.is_in_check(color)
    }

    pub fn legal_moves(&self, from: Square) -> Vec<Move> {
        self.position.legal_moves(from)
    }

    /// Validates and plays a move given as origin and destination squares,
    /// returning the applied notation. All rejections are local errors for
    /// the caller to retry on; nothing here is fatal.
    pub fn play(&mut self, from: Square, to: Square) -> Result<String, MoveError> {
        let piece = self.position.piece_at(from).ok_or(MoveError::NoPiece(from))?;
        if piece.color != self.position.turn {
            return Err(MoveError::NotYourTurn(from));
        }
        let legal = self.position.legal_moves(from);
        if let Some(mv) = legal.iter().find(|m| m.to == to) {
            return self
                .commit(mv)
                .ok_or(MoveError::IllegalMove(from, to));
        }
        // Distinguish a reachable-but-suicidal move from a plain bad pattern.
        if self.position.pseudo_moves(from).iter().any(|m| m.to == to) {
            Err(MoveError::LeavesKingInCheck(from, to))
        } else {
            Err(MoveError::IllegalMove(from, to))
        }
    }

    /// Plays a move given in algebraic notation text. Returns the applied
    /// notation, or `None` when no legal move matches the text.
    pub fn play_notation(&mut self, text: &str) -> Option<String> {
        let mv = self.position.parse_notation(text)?;
        self.commit(&mv)
    }

    fn commit(&mut self, mv: &Move) -> Option<String> {
        let (next, notation) = self.position.apply_move(mv)?;
        self.position = next;
        self.history.push(notation.clone());
        Some(notation)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        GameSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn dests(moves: &[Move]) -> Vec<String> {
        moves.iter().map(|m| m.to.to_string()).collect()
    }

    #[test]
    fn initial_position_serializes_to_standard_fen() {
        assert_eq!(
            Position::initial().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn fen_round_trips() {
        let start = Position::initial();
        assert_eq!(Position::from_fen(&start.to_fen()).unwrap(), start);

        let mut session = GameSession::new();
        session.play(sq("e2"), sq("e4")).unwrap();
        session.play(sq("c7"), sq("c5")).unwrap();
        let pos = session.position().clone();
        assert_eq!(Position::from_fen(&pos.to_fen()).unwrap(), pos);
    }

    #[test]
    fn fen_rejects_malformed_input() {
        assert!(Position::from_fen("").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - zero 1").is_err());
    }

    #[test]
    fn fen_defaults_missing_trailing_fields() {
        let pos = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR").unwrap();
        assert_eq!(pos, Position::initial());
    }

    #[test]
    fn pawn_double_step_from_home_rank() {
        let pos = Position::initial();
        let moves = pos.legal_moves(sq("e2"));
        let d = dests(&moves);
        assert!(d.contains(&"e3".to_string()));
        assert!(d.contains(&"e4".to_string()));
        assert_eq!(moves.len(), 2);
    }

    #[test]
    fn pawn_double_step_blocked_by_intervening_piece() {
        // Knight parked on e3 blocks both the single and double push.
        let pos = Position::from_fen("4k3/8/8/8/8/4N3/4P3/4K3 w - - 0 1").unwrap();
        assert!(pos.legal_moves(sq("e2")).is_empty());
    }

    #[test]
    fn knight_moves_from_initial_position() {
        let pos = Position::initial();
        let d = dests(&pos.legal_moves(sq("g1")));
        assert_eq!(d.len(), 2);
        assert!(d.contains(&"f3".to_string()));
        assert!(d.contains(&"h3".to_string()));
    }

    #[test]
    fn empty_or_opponent_squares_yield_no_moves() {
        let pos = Position::initial();
        assert!(pos.legal_moves(sq("e4")).is_empty());
        assert!(pos.legal_moves(sq("e7")).is_empty());
    }

    #[test]
    fn pinned_rook_cannot_leave_the_file() {
        // Black rook on e8 pins the white rook on e2 against the king on e1.
        let pos = Position::from_fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let moves = pos.legal_moves(sq("e2"));
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.to.file() == sq("e2").file()));
        // Capturing the pinner stays on the file and is allowed.
        assert!(dests(&moves).contains(&"e8".to_string()));
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let pos = Position::from_fen("4r2k/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let d = dests(&pos.legal_moves(sq("e1")));
        assert!(!d.contains(&"e2".to_string()));
        assert!(d.contains(&"d1".to_string()));
        assert!(d.contains(&"f1".to_string()));
    }

    #[test]
    fn check_detection_matches_attack_on_king_square() {
        let pos = Position::from_fen("4r2k/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        for color in [Color::White, Color::Black] {
            let king = pos.king_square(color).unwrap();
            assert_eq!(
                pos.is_in_check(color),
                pos.is_square_attacked(king, color.opponent())
            );
        }
        assert!(pos.is_in_check(Color::White));
        assert!(!pos.is_in_check(Color::Black));
    }

    #[test]
    fn missing_king_is_never_in_check() {
        let pos = Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(!pos.is_in_check(Color::Black));
    }

    #[test]
    fn apply_move_fails_on_empty_origin() {
        let pos = Position::initial();
        let mv = Move {
            from: sq("e4"),
            to: sq("e5"),
            piece: PieceKind::Pawn,
            is_capture: false,
        };
        assert!(pos.apply_move(&mv).is_none());
    }

    #[test]
    fn pawn_promotes_to_queen_on_back_rank() {
        let pos = Position::from_fen("8/P7/8/8/8/8/8/K6k w - - 0 1").unwrap();
        let mut session = GameSession::from_position(pos);
        let notation = session.play(sq("a7"), sq("a8")).unwrap();
        assert_eq!(notation, "a8");
        assert_eq!(
            session.position().piece_at(sq("a8")),
            Some(Piece::new(PieceKind::Queen, Color::White))
        );
    }

    #[test]
    fn capture_notation_carries_file_prefix_for_pawns() {
        let mut session = GameSession::new();
        session.play_notation("e4").unwrap();
        session.play_notation("d5").unwrap();
        let notation = session.play(sq("e4"), sq("d5")).unwrap();
        assert_eq!(notation, "exd5");
        assert_eq!(session.history(), &["e4", "d5", "exd5"]);
    }

    #[test]
    fn piece_capture_notation_uses_kind_letter() {
        let mut session = GameSession::new();
        for text in ["e4", "d5", "Nc3", "e6", "Nxd5"] {
            session.play_notation(text).unwrap();
        }
        assert_eq!(session.history().last().map(String::as_str), Some("Nxd5"));
    }

    #[test]
    fn notation_parser_resolves_common_moves() {
        let pos = Position::initial();
        let mv = pos.parse_notation("Nf3").unwrap();
        assert_eq!((mv.from, mv.to), (sq("g1"), sq("f3")));
        let mv = pos.parse_notation("e4").unwrap();
        assert_eq!((mv.from, mv.to), (sq("e2"), sq("e4")));
    }

    #[test]
    fn notation_parser_strips_decorations() {
        let pos = Position::initial();
        let mv = pos.parse_notation("e4+!?").unwrap();
        assert_eq!(mv.to, sq("e4"));
        assert!(pos.parse_notation("O-O").is_none());
    }

    #[test]
    fn fullmove_counter_increments_after_black() {
        let mut session = GameSession::new();
        session.play_notation("e4").unwrap();
        assert_eq!(session.position().fullmove_number(), 1);
        session.play_notation("e5").unwrap();
        assert_eq!(session.position().fullmove_number(), 2);
    }

    #[test]
    fn play_rejections_are_specific() {
        let mut session = GameSession::new();
        assert_eq!(
            session.play(sq("e4"), sq("e5")),
            Err(MoveError::NoPiece(sq("e4")))
        );
        assert_eq!(
            session.play(sq("e7"), sq("e5")),
            Err(MoveError::NotYourTurn(sq("e7")))
        );
        assert_eq!(
            session.play(sq("e2"), sq("e5")),
            Err(MoveError::IllegalMove(sq("e2"), sq("e5")))
        );

        let pinned = Position::from_fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let mut session = GameSession::from_position(pinned);
        assert_eq!(
            session.play(sq("e2"), sq("d2")),
            Err(MoveError::LeavesKingInCheck(sq("e2"), sq("d2")))
        );
    }

    #[test]
    fn cloned_session_is_independent() {
        let mut original = GameSession::new();
        original.play_notation("e4").unwrap();
        let mut speculative = original.clone();
        speculative.play_notation("e5").unwrap();
        assert_eq!(original.history().len(), 1);
        assert_eq!(speculative.history().len(), 2);
        assert_ne!(original.position().to_fen(), speculative.position().to_fen());
    }
}
