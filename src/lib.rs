pub mod board;
pub mod opening;
pub mod trainer;

pub use board::{
    Color, FenError, GameSession, Move, MoveError, Piece, PieceKind, Position, Square,
};
pub use opening::{BookError, OpeningBook, OpeningLine};
pub use trainer::{moves_match, Outcome, Trainer, TurnReport, MOVE_BUDGET};
