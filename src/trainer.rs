// src/trainer.rs
//
// Opening tracker: drives one training session against a corpus line. The
// computer follows the active line, validates the human's moves against it
// by destination square, rescans the pool for a transposition when the
// human deviates, and falls back to random legal moves once play leaves
// the book.

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::board::{Color, GameSession, MoveError, Square};
use crate::opening::{OpeningBook, OpeningLine};

/// Sessions end successfully once this many full moves have been played.
pub const MOVE_BUDGET: u32 = 10;

lazy_static! {
    static ref DEST_RE: Regex = Regex::new(r"([a-h][1-8])$").unwrap();
}

/// Strips check/mate/annotation marks, then extracts the destination
/// square. Castling notation has no destination square and is returned
/// whole so it only ever equals itself.
fn destination_of(notation: &str) -> Option<String> {
    let cleaned: String = notation
        .chars()
        .filter(|c| !matches!(c, '+' | '#' | '!' | '?'))
        .collect();
    if cleaned == "O-O" || cleaned == "O-O-O" {
        return Some(cleaned);
    }
    DEST_RE
        .captures(&cleaned)
        .map(|caps| caps[1].to_string())
}

/// Two notations name "the same move" when both yield a destination and
/// the destinations agree (castling literals only ever equal themselves).
/// Deliberately looser than string equality: "Ngf3" and "Nf3" match, as do
/// "Qxf7" and "Qxf7+". Strings without a destination never match anything.
pub fn moves_match(a: &str, b: &str) -> bool {
    match (destination_of(a), destination_of(b)) {
        (Some(da), Some(db)) => da == db,
        _ => false,
    }
}

/// How a training session ended.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The human stayed in book until the budget ran out or the line was
    /// exhausted.
    Success,
    /// The human left book with no matching line in the pool.
    Failure { played: String, expected: String },
    /// The human abandoned the session.
    Skip,
}

/// What happened after one human move: the computer's reply, if it made
/// one, and the terminal outcome, if the session just ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub reply: Option<String>,
    pub outcome: Option<Outcome>,
}

/// One training session. The randomness source is injected so tests can
/// substitute a deterministic generator. Progress through the active line
/// is implicit: move index `k` in the line is move index `k` in the
/// session history.
pub struct Trainer<R: Rng> {
    book: OpeningBook,
    player_color: Color,
    session: GameSession,
    active: Option<OpeningLine>,
    rng: R,
}

impl<R: Rng> Trainer<R> {
    pub fn new(book: OpeningBook, player_color: Color, rng: R) -> Trainer<R> {
        Trainer {
            book,
            player_color,
            session: GameSession::new(),
            active: None,
            rng,
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn player_color(&self) -> Color {
        self.player_color
    }

    pub fn active_line(&self) -> Option<&OpeningLine> {
        self.active.as_ref()
    }

    /// Full moves played so far, counting a half-finished move pair as one.
    pub fn full_moves(&self) -> u32 {
        ((self.session.history().len() + 1) / 2) as u32
    }

    /// Opens the game when the computer has the white pieces: picks a line
    /// from the white pool at random and plays its first move. Returns the
    /// notation played, or `None` when the human moves first.
    pub fn start(&mut self) -> Option<String> {
        if self.player_color == Color::White {
            return None;
        }
        let pool = self.book.pool(Color::White);
        if pool.is_empty() {
            return None;
        }
        let line = pool[self.rng.random_range(0..pool.len())].clone();
        let reply = match line.moves.first() {
            Some(text) => self
                .session
                .play_notation(text)
                .or_else(|| self.random_reply()),
            None => self.random_reply(),
        };
        self.active = Some(line);
        reply
    }

    /// Plays one human move and advances the session. Move legality errors
    /// are returned for the caller to retry; an accepted move yields the
    /// computer's reply and possibly a terminal outcome.
    pub fn play(&mut self, from: Square, to: Square) -> Result<TurnReport, MoveError> {
        let played = self.session.play(from, to)?;
        let k = self.session.history().len() - 1;

        let line = match &self.active {
            Some(line) => line.clone(),
            None => {
                // Only reachable before a line is selected: the human has
                // White and this is the first move of the game.
                if self.player_color == Color::White && k == 0 {
                    if let Some(line) = self.select_reply_line(&played) {
                        self.active = Some(line);
                        return Ok(self.reply_from_book(1));
                    }
                }
                return Ok(self.beyond_book());
            }
        };

        if k >= line.moves.len() {
            return Ok(self.beyond_book());
        }

        // Canonical notation for the book move at this index, with the raw
        // entry as a fallback when the line cannot be replayed that far.
        let expected = self
            .expected_notation(&line, k)
            .unwrap_or_else(|| line.moves[k].clone());

        if moves_match(&played, &expected) {
            if self.full_moves() >= MOVE_BUDGET {
                return Ok(TurnReport {
                    reply: None,
                    outcome: Some(Outcome::Success),
                });
            }
            return Ok(self.reply_from_book(k + 1));
        }

        // Deviation: the whole history so far may still be a prefix of
        // another line in the pool. First match in corpus order wins.
        if let Some(alternate) = self.find_alternate(k) {
            self.active = Some(alternate);
            return Ok(self.reply_from_book(k + 1));
        }

        Ok(TurnReport {
            reply: None,
            outcome: Some(Outcome::Failure { played, expected }),
        })
    }

    /// Picks the reply line after the human's first move as White: lines
    /// whose own first move matches it by destination, with a uniform draw
    /// over the whole pool when nothing matches.
    fn select_reply_line(&mut self, played: &str) -> Option<OpeningLine> {
        let pool = self.book.pool(self.player_color.opponent());
        if pool.is_empty() {
            return None;
        }
        let matching: Vec<&OpeningLine> = pool
            .iter()
            .filter(|line| {
                line.moves
                    .first()
                    .map(|m| moves_match(m, played))
                    .unwrap_or(false)
            })
            .collect();
        let chosen = if matching.is_empty() {
            &pool[self.rng.random_range(0..pool.len())]
        } else {
            matching[self.rng.random_range(0..matching.len())]
        };
        Some(chosen.clone())
    }

    /// First line in the computer's pool, in corpus order, that is long
    /// enough and whose replay from the initial position matches the full
    /// played history through index `k`. A candidate whose own entries
    /// cannot be replayed is rejected even when the raw text happens to
    /// share destinations with the history.
    fn find_alternate(&self, k: usize) -> Option<OpeningLine> {
        let history = self.session.history();
        self.book
            .pool(self.player_color.opponent())
            .iter()
            .find(|line| {
                if line.moves.len() <= k {
                    return false;
                }
                let mut replay = GameSession::new();
                (0..=k).all(|i| match replay.play_notation(&line.moves[i]) {
                    Some(notation) => moves_match(&notation, &history[i]),
                    None => false,
                })
            })
            .cloned()
    }

    /// The canonical notation for the book move at index `k`, computed by
    /// replaying the line from the initial position. `None` when the line
    /// cannot be replayed that far (an unplayable book entry earlier on).
    fn expected_notation(&self, line: &OpeningLine, k: usize) -> Option<String> {
        let mut replay = GameSession::new();
        for text in line.moves.iter().take(k) {
            replay.play_notation(text)?;
        }
        replay.play_notation(&line.moves[k])
    }

    /// Plays the book move at `index`, falling back to a random legal move
    /// when the entry cannot be expressed (castling is outside the move
    /// generator's scope). An index past the end of the line means the
    /// human matched the entire line.
    fn reply_from_book(&mut self, index: usize) -> TurnReport {
        let line = match &self.active {
            Some(line) => line.clone(),
            None => return self.beyond_book(),
        };
        if index >= line.moves.len() {
            return TurnReport {
                reply: None,
                outcome: Some(Outcome::Success),
            };
        }
        let reply = self
            .session
            .play_notation(&line.moves[index])
            .or_else(|| self.random_reply());
        match reply {
            Some(_) => TurnReport {
                reply,
                outcome: self.budget_outcome(),
            },
            // The computer has no legal move at all; the human stayed in
            // book the whole way, so the session ends well.
            None => TurnReport {
                reply: None,
                outcome: Some(Outcome::Success),
            },
        }
    }

    /// Past the end of the active line: keep the game going with random
    /// legal replies until the budget ends the session.
    fn beyond_book(&mut self) -> TurnReport {
        if self.full_moves() >= MOVE_BUDGET {
            return TurnReport {
                reply: None,
                outcome: Some(Outcome::Success),
            };
        }
        match self.random_reply() {
            Some(reply) => TurnReport {
                reply: Some(reply),
                outcome: self.budget_outcome(),
            },
            None => TurnReport {
                reply: None,
                outcome: Some(Outcome::Success),
            },
        }
    }

    fn budget_outcome(&self) -> Option<Outcome> {
        if self.full_moves() >= MOVE_BUDGET {
            Some(Outcome::Success)
        } else {
            None
        }
    }

    /// A uniformly random legal move for the side to move.
    fn random_reply(&mut self) -> Option<String> {
        let mut candidates = Vec::new();
        for rank in 0..8u8 {
            for file in 0..8u8 {
                candidates.extend(self.session.legal_moves(Square::new(file, rank)));
            }
        }
        if candidates.is_empty() {
            return None;
        }
        let mv = candidates[self.rng.random_range(0..candidates.len())];
        self.session.play(mv.from, mv.to).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};

    /// Always produces zero, so every random_range pick is index 0.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn test_line(name: &str, moves: &[&str]) -> OpeningLine {
        OpeningLine {
            name: name.to_string(),
            eco: "A00".to_string(),
            moves: moves.iter().map(|m| m.to_string()).collect(),
            description: String::new(),
        }
    }

    fn book(white: Vec<OpeningLine>, black: Vec<OpeningLine>) -> OpeningBook {
        OpeningBook { white, black }
    }

    #[test]
    fn comparator_ignores_decorations_and_disambiguation() {
        assert!(moves_match("Qxf7", "Qxf7+"));
        assert!(moves_match("Ngf3", "Nf3"));
        assert!(moves_match("e4", "e4!?"));
        assert!(moves_match("O-O", "O-O"));
        assert!(!moves_match("e4", "e5"));
        assert!(!moves_match("O-O", "O-O-O"));
        assert!(!moves_match("O-O", "g1"));
        // No destination, no match, even for identical strings.
        assert!(!moves_match("junk", "junk"));
        assert!(!moves_match("", ""));
    }

    #[test]
    fn computer_opens_when_human_plays_black() {
        let b = book(vec![test_line("Kingside Start", &["e4", "e5", "Nf3"])], vec![]);
        let mut trainer = Trainer::new(b, Color::Black, ZeroRng);
        assert_eq!(trainer.start(), Some("e4".to_string()));
        assert_eq!(trainer.session().history(), &["e4"]);
        assert_eq!(
            trainer.active_line().map(|l| l.name.as_str()),
            Some("Kingside Start")
        );
    }

    #[test]
    fn human_moves_first_when_playing_white() {
        let mut trainer = Trainer::new(OpeningBook::builtin(), Color::White, ZeroRng);
        assert_eq!(trainer.start(), None);
        assert!(trainer.session().history().is_empty());
    }

    #[test]
    fn defense_chosen_by_first_move_destination() {
        let b = book(
            vec![],
            vec![
                test_line("Open Reply", &["e4", "c5", "Nf3"]),
                test_line("Closed Reply", &["d4", "Nf6", "c4"]),
            ],
        );
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);
        let report = trainer.play(sq("d2"), sq("d4")).unwrap();
        assert_eq!(report.reply, Some("Nf6".to_string()));
        assert_eq!(report.outcome, None);
        assert_eq!(
            trainer.active_line().map(|l| l.name.as_str()),
            Some("Closed Reply")
        );
    }

    #[test]
    fn unmatched_first_move_falls_back_to_whole_pool() {
        let b = book(
            vec![],
            vec![
                test_line("Open Reply", &["e4", "c5", "Nf3"]),
                test_line("Closed Reply", &["d4", "Nf6", "c4"]),
            ],
        );
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);
        // Nf3 matches no first move; ZeroRng draws the first pool entry.
        let report = trainer.play(sq("g1"), sq("f3")).unwrap();
        assert_eq!(report.reply, Some("c5".to_string()));
        assert_eq!(
            trainer.active_line().map(|l| l.name.as_str()),
            Some("Open Reply")
        );
    }

    #[test]
    fn deviation_rescans_pool_for_a_transposition() {
        let b = book(
            vec![
                test_line("Main", &["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4"]),
                test_line("Sideline", &["e4", "e5", "Nf3", "Nc6", "Bb5", "Nf6", "a3"]),
            ],
            vec![],
        );
        let mut trainer = Trainer::new(b, Color::Black, ZeroRng);
        assert_eq!(trainer.start(), Some("e4".to_string()));

        let report = trainer.play(sq("e7"), sq("e5")).unwrap();
        assert_eq!(report.reply, Some("Nf3".to_string()));
        let report = trainer.play(sq("b8"), sq("c6")).unwrap();
        assert_eq!(report.reply, Some("Bb5".to_string()));

        // The main line expects a6 here; Nf6 transposes to the sideline.
        let report = trainer.play(sq("g8"), sq("f6")).unwrap();
        assert_eq!(report.reply, Some("a3".to_string()));
        assert_eq!(report.outcome, None);
        assert_eq!(
            trainer.active_line().map(|l| l.name.as_str()),
            Some("Sideline")
        );
    }

    #[test]
    fn deviation_without_alternate_reports_failure() {
        let b = book(vec![], vec![test_line("Only", &["e4", "e5", "Nf3", "Nc6"])]);
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);
        let report = trainer.play(sq("e2"), sq("e4")).unwrap();
        assert_eq!(report.reply, Some("e5".to_string()));

        let report = trainer.play(sq("a2"), sq("a3")).unwrap();
        assert_eq!(report.reply, None);
        assert_eq!(
            report.outcome,
            Some(Outcome::Failure {
                played: "a3".to_string(),
                expected: "Nf3".to_string(),
            })
        );
    }

    #[test]
    fn rescan_rejects_lines_that_do_not_replay() {
        // Phantom's last entry shares a destination with the human's pawn
        // push, but Nd4 is not playable in Phantom's own replay after
        // 1.e4 c5; the rescan must reject it and end in failure rather
        // than adopting it and declaring success.
        let b = book(
            vec![],
            vec![
                test_line("Main", &["e4", "c5", "Nf3", "d6"]),
                test_line("Phantom", &["e4", "c5", "Nd4"]),
            ],
        );
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);
        let report = trainer.play(sq("e2"), sq("e4")).unwrap();
        assert_eq!(report.reply, Some("c5".to_string()));

        let report = trainer.play(sq("d2"), sq("d4")).unwrap();
        assert_eq!(report.reply, None);
        assert_eq!(
            report.outcome,
            Some(Outcome::Failure {
                played: "d4".to_string(),
                expected: "Nf3".to_string(),
            })
        );
        assert_eq!(
            trainer.active_line().map(|l| l.name.as_str()),
            Some("Main")
        );
    }

    #[test]
    fn exhausting_the_line_is_a_success() {
        let b = book(vec![], vec![test_line("Short", &["e4", "e5", "Nf3"])]);
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);
        let report = trainer.play(sq("e2"), sq("e4")).unwrap();
        assert_eq!(report.reply, Some("e5".to_string()));

        let report = trainer.play(sq("g1"), sq("f3")).unwrap();
        assert_eq!(report.reply, None);
        assert_eq!(report.outcome, Some(Outcome::Success));
    }

    #[test]
    fn play_continues_randomly_beyond_the_book() {
        let b = book(vec![], vec![test_line("Short", &["e4", "e5", "Nf3", "Nc6"])]);
        let mut trainer = Trainer::new(b, Color::White, StdRng::seed_from_u64(7));
        trainer.play(sq("e2"), sq("e4")).unwrap();
        let report = trainer.play(sq("g1"), sq("f3")).unwrap();
        assert_eq!(report.reply, Some("Nc6".to_string()));

        let report = trainer.play(sq("d2"), sq("d4")).unwrap();
        assert!(report.reply.is_some());
        assert_eq!(report.outcome, None);
        assert_eq!(trainer.session().history().len(), 6);
    }

    #[test]
    fn budget_ends_the_session_in_success() {
        // Knights shuttle for ten full moves without ever deviating.
        let shuffle: Vec<&str> = ["Nf3", "Nf6", "Ng1", "Ng8"]
            .iter()
            .cycle()
            .take(20)
            .copied()
            .collect();
        let b = book(vec![], vec![test_line("Shuttle", &shuffle)]);
        let mut trainer = Trainer::new(b, Color::White, ZeroRng);

        let plan = [
            ("g1", "f3"),
            ("f3", "g1"),
            ("g1", "f3"),
            ("f3", "g1"),
            ("g1", "f3"),
            ("f3", "g1"),
            ("g1", "f3"),
            ("f3", "g1"),
            ("g1", "f3"),
        ];
        for (from, to) in plan {
            let report = trainer.play(sq(from), sq(to)).unwrap();
            assert_eq!(report.outcome, None, "ended early at {}{}", from, to);
            assert!(report.reply.is_some());
        }

        // The tenth full move starts; the budget is met before any reply.
        let report = trainer.play(sq("f3"), sq("g1")).unwrap();
        assert_eq!(trainer.full_moves(), MOVE_BUDGET);
        assert_eq!(report.reply, None);
        assert_eq!(report.outcome, Some(Outcome::Success));
    }

    #[test]
    fn illegal_moves_are_rejected_without_advancing() {
        let mut trainer = Trainer::new(OpeningBook::builtin(), Color::White, ZeroRng);
        assert!(trainer.play(sq("e2"), sq("e5")).is_err());
        assert!(trainer.session().history().is_empty());
        assert!(trainer.active_line().is_none());
    }

    #[test]
    fn unplayable_book_reply_falls_back_to_a_legal_move() {
        // The reply entry is castling, which the move generator cannot
        // express; the computer substitutes some legal move instead.
        let b = book(vec![], vec![test_line("Castler", &["e4", "O-O", "Nf3"])]);
        let mut trainer = Trainer::new(b, Color::White, StdRng::seed_from_u64(3));
        let report = trainer.play(sq("e2"), sq("e4")).unwrap();
        assert!(report.reply.is_some());
        assert_eq!(trainer.session().history().len(), 2);
    }

    #[test]
    fn builtin_book_full_session_as_black() {
        // Seeded run against the shipped corpus: whatever line is drawn,
        // echoing the computer's expectation via the tracker never errors.
        let mut trainer =
            Trainer::new(OpeningBook::builtin(), Color::Black, StdRng::seed_from_u64(42));
        assert!(trainer.start().is_some());
        assert!(trainer.active_line().is_some());
        assert_eq!(trainer.full_moves(), 1);
    }
}
