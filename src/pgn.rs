// PGN (Portable Game Notation) is the de-facto standard plain format for recording chess games.
// Doc: http://www.saremba.de/chessgml/standards/pgn/pgn-complete.htm

use crate::clock::TimeControl;
use crate::force::Force;
use crate::game::{ChessGame, GameResult, VictoryReason};


const LINE_WIDTH: usize = 80;

struct TextDocument {
    text: String,
    last_line_len: usize,
}

impl TextDocument {
    fn new() -> Self { TextDocument { text: String::new(), last_line_len: 0 } }

    fn push_word(&mut self, word: &str) {
        if self.last_line_len == 0 {
            // no separators: first record
        } else if self.last_line_len + word.len() < LINE_WIDTH {
            self.text.push(' ');
            self.last_line_len += 1;
        } else {
            self.text.push('\n');
            self.last_line_len = 0;
        }
        self.text.push_str(word);
        self.last_line_len += word.len();
    }

    fn render(&self) -> String {
        let trailing_newline = if self.last_line_len > 0 { "\n" } else { "" };
        format!("{}{}", self.text, trailing_newline)
    }
}

// "300+2": base time and increment in seconds.
fn time_control_to_string(control: &TimeControl) -> String {
    format!("{}+{}", control.starting_time.as_secs(), control.increment.as_secs())
}

fn termination_to_string(result: GameResult) -> &'static str {
    match result {
        GameResult::Ongoing => "unterminated",
        GameResult::Victory(_, VictoryReason::Timeout) => "time forfeit",
        GameResult::Victory(..) | GameResult::Draw(_) => "normal",
    }
}

// Full move number of the first recorded move.
fn first_move_number(game: &ChessGame) -> u32 {
    game.starting_fen()
        .and_then(|fen| fen.split_whitespace().nth(5)?.parse().ok())
        .unwrap_or(1)
}

fn make_header(game: &ChessGame) -> String {
    let created_at = game.created_at();
    let result = game.result();
    let mut header = format!(
        r#"[Event "{}"]
[Site "?"]
[Date "{}"]
[Round "-"]
[White "{}"]
[Black "{}"]
[Result "{}"]
[UTCDate "{}"]
[UTCTime "{}"]
[TimeControl "{}"]
[Termination "{}"]
"#,
        if game.rules().rated { "Rated Game" } else { "Casual Game" },
        created_at.pgn_date(),
        game.player(Force::White).id,
        game.player(Force::Black).id,
        result.pgn_token(),
        created_at.pgn_date(),
        created_at.pgn_time(),
        time_control_to_string(&game.rules().time_control),
        termination_to_string(result),
    );
    if let Some(fen) = game.starting_fen() {
        header.push_str(&format!("[SetUp \"1\"]\n[FEN \"{}\"]\n", fen));
    }
    header
}

pub fn export_to_pgn(game: &ChessGame) -> String {
    let header = make_header(game);
    let mut doc = TextDocument::new();
    let mut move_number = first_move_number(game);
    for (idx, record) in game.history().iter().enumerate() {
        let mv = &record.mv;
        let word = match mv.force {
            Force::White => format!("{}. {}", move_number, mv.notation),
            Force::Black if idx == 0 => format!("{}... {}", move_number, mv.notation),
            Force::Black => mv.notation.clone(),
        };
        doc.push_word(&word);
        if mv.force == Force::Black {
            move_number += 1;
        }
    }
    doc.push_word(game.result().pgn_token());
    format!("{}\n{}", header, doc.render())
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::GameInstant;
    use crate::rules::ChessRules;

    fn movetext(pgn: &str) -> &str { pgn.split("\n\n").nth(1).unwrap() }

    #[test]
    fn text_document_wraps_lines() {
        let mut doc = TextDocument::new();
        for _ in 0..30 {
            doc.push_word("abcd");
        }
        let text = doc.render();
        assert!(text.lines().all(|line| line.len() <= LINE_WIDTH));
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn fools_mate() {
        let mut game = ChessGame::new("alice", "bob", ChessRules::blitz());
        let now = GameInstant::game_start();
        for (player, notation) in [("alice", "f3"), ("bob", "e5"), ("alice", "g4"), ("bob", "Qh4")] {
            game.try_turn_algebraic(player, notation, now).unwrap();
        }
        let pgn = game.to_pgn();
        assert!(pgn.contains("[White \"alice\"]\n"));
        assert!(pgn.contains("[Result \"0-1\"]\n"));
        assert!(pgn.contains("[TimeControl \"300+0\"]\n"));
        assert!(!pgn.contains("[FEN "));
        assert_eq!(movetext(&pgn), "1. f3 e5 2. g4 Qh4# 0-1\n");
    }

    #[test]
    fn custom_start_with_black_to_move() {
        let mut game = ChessGame::from_fen(
            "alice",
            "bob",
            ChessRules::blitz(),
            "4k3/8/8/8/8/8/4P3/4K3 b - - 0 12",
        )
        .unwrap();
        let now = GameInstant::game_start();
        game.start(now).unwrap();
        game.try_turn_algebraic("bob", "Kd7", now).unwrap();
        game.try_turn_algebraic("alice", "e4", now).unwrap();
        let pgn = game.to_pgn();
        assert!(pgn.contains("[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 12\"]\n"));
        assert_eq!(movetext(&pgn), "12... Kd7 13. e4 *\n");
    }
}
