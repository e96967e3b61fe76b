// Text rendering of boards and clocks for terminals and logs.

use itertools::Itertools;

use crate::clock::{Clock, GameInstant};
use crate::coord::{Coord, File, NUM_FILES, NUM_RANKS, Rank};
use crate::force::Force;
use crate::game::ChessGame;
use crate::grid::Grid;
use crate::piece::piece_to_pictogram;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoardOrientation {
    Normal,  // White at bottom
    Rotated, // Black at bottom
}

// These coords describe board squares, like `Coord`. But here row 0 corresponds to the top-most
// rank, which could be rank '1' or rank '8' on the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DisplayCoord {
    pub x: u8,
    pub y: u8,
}

impl BoardOrientation {
    pub fn for_force(force: Force) -> Self {
        match force {
            Force::White => BoardOrientation::Normal,
            Force::Black => BoardOrientation::Rotated,
        }
    }
}

pub fn to_display_coord(coord: Coord, orientation: BoardOrientation) -> DisplayCoord {
    let rank = coord.rank.to_zero_based();
    let file = coord.file.to_zero_based();
    match orientation {
        BoardOrientation::Normal => DisplayCoord { x: file, y: NUM_RANKS - rank - 1 },
        BoardOrientation::Rotated => DisplayCoord { x: NUM_FILES - file - 1, y: rank },
    }
}

pub fn from_display_coord(q: DisplayCoord, orientation: BoardOrientation) -> Option<Coord> {
    if q.x >= NUM_FILES || q.y >= NUM_RANKS {
        return None;
    }
    let (rank, file) = match orientation {
        BoardOrientation::Normal => (NUM_RANKS - q.y - 1, q.x),
        BoardOrientation::Rotated => (q.y, NUM_FILES - q.x - 1),
    };
    Some(Coord::new(Rank::from_zero_based(rank), File::from_zero_based(file)))
}

fn format_square(ch: char) -> String { format!(" {} ", ch) }

// Board with rank and file labels on all four sides. Dark squares without a piece are drawn as
// dots, since plain text has no background colors.
pub fn render_grid(grid: &Grid, orientation: BoardOrientation) -> String {
    let square_at = |x: u8, y: u8| -> Option<Coord> {
        from_display_coord(DisplayCoord { x, y }, orientation)
    };
    let file_names = (0..NUM_FILES)
        .filter_map(|x| square_at(x, 0))
        .map(|coord| format_square(coord.file.to_algebraic()))
        .join("");
    let edge = format!("{}{}{}\n", format_square(' '), file_names, format_square(' '));

    let mut ret = edge.clone();
    for y in 0..NUM_RANKS {
        let squares = (0..NUM_FILES).filter_map(|x| square_at(x, y)).collect_vec();
        let Some(first) = squares.first() else { continue };
        let rank_name = format_square(first.rank.to_algebraic());
        ret.push_str(&rank_name);
        for coord in squares {
            let ch = match grid[coord] {
                Some(piece) => piece_to_pictogram(piece.kind, piece.force),
                None if coord.is_light_square() => ' ',
                None => '·',
            };
            ret.push_str(&format_square(ch));
        }
        ret.push_str(&rank_name);
        ret.push('\n');
    }
    ret.push_str(&edge);
    ret
}

pub fn render_clock(clock: &Clock, force: Force, now: GameInstant) -> String {
    let showing = clock.showing_for(force, now);
    let marker = if showing.out_of_time {
        "  (flag)"
    } else if showing.is_active {
        "  <"
    } else {
        ""
    };
    format!("{:?} {}{}", force, showing.ui_string(), marker)
}

// The board as seen by `viewer`, with the viewer's clock at the bottom.
pub fn render_game(game: &ChessGame, viewer: Force, now: GameInstant) -> String {
    let orientation = BoardOrientation::for_force(viewer);
    format!(
        "{}\n{}{}\n",
        render_clock(game.clock(), viewer.opponent(), now),
        render_grid(game.board().grid(), orientation),
        render_clock(game.clock(), viewer, now),
    )
}
