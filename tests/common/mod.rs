// Rust-upgrade (https://github.com/rust-lang/rust/issues/46379):
//   remove `#[allow(dead_code)]` before public functions.

use chess_arbiter::board::Board;
use chess_arbiter::clock::GameInstant;
use chess_arbiter::error::TurnError;
use chess_arbiter::fen::fen_to_board;
use chess_arbiter::force::Force;
use chess_arbiter::game::ChessGame;
use chess_arbiter::once_cell_regex;
use chess_arbiter::rules::ChessRules;
use chess_arbiter::util::as_single_char;
use itertools::Itertools;


pub const WHITE: &str = "alice";
pub const BLACK: &str = "bob";
pub const T0: GameInstant = GameInstant::game_start();

#[allow(dead_code)]
pub fn player_id(force: Force) -> &'static str {
    match force {
        Force::White => WHITE,
        Force::Black => BLACK,
    }
}

#[allow(dead_code)]
pub fn classic_game() -> ChessGame { ChessGame::new(WHITE, BLACK, ChessRules::blitz()) }

// Game starting from `board` with the clock running since `T0`.
#[allow(dead_code)]
pub fn game_from_board(board: Board) -> ChessGame {
    let mut game = ChessGame::from_board(WHITE, BLACK, ChessRules::blitz(), board).unwrap();
    game.start(T0).unwrap();
    game
}

#[allow(dead_code)]
pub fn game_from_fen(fen: &str) -> ChessGame { game_from_board(fen_to_board(fen).unwrap()) }

// Plays moves like "1.e4 e5 2.Nf3" on behalf of whoever is to move. Move numbers are optional.
#[allow(dead_code)]
pub fn replay_log(game: &mut ChessGame, log: &str) -> Result<(), TurnError> {
    let turn_number_re = once_cell_regex!(r"^(?:[0-9]+\.+)?(.*)$");
    for word in log.split_whitespace() {
        let notation = turn_number_re.captures(word).unwrap().get(1).unwrap().as_str();
        if notation.is_empty() {
            continue;
        }
        let player = player_id(game.current_turn());
        game.try_turn_algebraic(player, notation, T0)?;
    }
    Ok(())
}

#[allow(dead_code)]
pub fn replay_log_from_start(log: &str) -> Result<ChessGame, TurnError> {
    let mut game = classic_game();
    replay_log(&mut game, log)?;
    Ok(game)
}

// Parses a diagram with rank 8 on top, e.g.
//   . . . . k . . .
//   ...
//   R . . . K . . R
// Castling rights are granted wherever king and rook stand on their home squares.
#[allow(dead_code)]
pub fn parse_board(board_str: &str, active_force: Force) -> Result<Board, String> {
    let rows = board_str
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.split_ascii_whitespace().collect_vec())
        .collect_vec();
    if rows.len() != 8 || rows.iter().any(|row| row.len() != 8) {
        return Err(format!("Expected an 8x8 diagram, got:\n{}", board_str));
    }
    let mut placement = Vec::new();
    for row in &rows {
        let mut fen_row = String::new();
        let mut empty = 0;
        for piece_str in row {
            let ch = as_single_char(piece_str).ok_or_else(|| format!("Invalid piece: {}", piece_str))?;
            if ch == '.' {
                empty += 1;
            } else {
                if empty > 0 {
                    fen_row.push_str(&empty.to_string());
                    empty = 0;
                }
                fen_row.push(ch);
            }
        }
        if empty > 0 {
            fen_row.push_str(&empty.to_string());
        }
        placement.push(fen_row);
    }
    let castling = [
        (rows[7][4] == "K" && rows[7][7] == "R", 'K'),
        (rows[7][4] == "K" && rows[7][0] == "R", 'Q'),
        (rows[0][4] == "k" && rows[0][7] == "r", 'k'),
        (rows[0][4] == "k" && rows[0][0] == "r", 'q'),
    ]
    .into_iter()
    .filter(|(allowed, _)| *allowed)
    .map(|(_, ch)| ch)
    .collect::<String>();
    let fen = format!(
        "{} {} {} - 0 1",
        placement.join("/"),
        match active_force {
            Force::White => 'w',
            Force::Black => 'b',
        },
        if castling.is_empty() { "-".to_owned() } else { castling },
    );
    fen_to_board(&fen)
}


#[cfg(test)]
mod tests {
    use chess_arbiter::board::Board;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_board_opening() {
        let board_str = "
            r n b q k b n r
            p p p . p p p p
            . . . . . . . .
            . . . p . . . .
            . . . . P . . .
            . . . . . . . .
            P P P P . P P P
            R N B Q K B N R
        ";
        let board = parse_board(board_str, Force::White).unwrap();
        let game = replay_log_from_start("1.e4 d5").unwrap();
        assert_eq!(board.grid(), game.board().grid());
        assert_eq!(board.castling_rights(), game.board().castling_rights());
        assert_ne!(board.grid(), Board::new().grid());
    }
}
