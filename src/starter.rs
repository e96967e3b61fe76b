use enum_map::enum_map;

use crate::board::CastlingRights;
use crate::coord::{Coord, File, NUM_RANKS, Rank};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{Piece, PieceKind};


// Everything needed to build a `Board` apart from its history.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BoardSetup {
    pub grid: Grid,
    pub active_force: Force,
    pub castling_rights: CastlingRights,
    pub en_passant_target: Option<Coord>,
    pub half_move_clock: u32,
    pub full_move_number: u32,
}

const CLASSIC_PIECE_ROW: [PieceKind; 8] = {
    use PieceKind::*;
    [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook]
};

fn setup_white_pawns_on_2nd_rank(grid: &mut Grid) {
    for file in File::all() {
        let coord = Coord::new(Rank::_2, file);
        grid[coord] = Some(Piece::new(PieceKind::Pawn, Force::White, coord));
    }
}

fn setup_black_pieces_mirrorlike(grid: &mut Grid) {
    for coord in Coord::all() {
        if let Some(piece) = grid[coord] {
            if piece.force == Force::White {
                let mirror_rank = Rank::from_zero_based(NUM_RANKS - coord.rank.to_zero_based() - 1);
                let mirror_coord = Coord::new(mirror_rank, coord.file);
                assert!(grid[mirror_coord].is_none(), "{:?}", grid);
                grid[mirror_coord] = Some(Piece::new(piece.kind, Force::Black, mirror_coord));
            }
        }
    }
}

pub fn generate_starting_grid() -> Grid {
    let mut grid = Grid::new();
    for (file, piece_kind) in File::all().zip(CLASSIC_PIECE_ROW) {
        let coord = Coord::new(Rank::_1, file);
        grid[coord] = Some(Piece::new(piece_kind, Force::White, coord));
    }
    setup_white_pawns_on_2nd_rank(&mut grid);
    setup_black_pieces_mirrorlike(&mut grid);
    grid
}

pub fn starting_setup() -> BoardSetup {
    BoardSetup {
        grid: generate_starting_grid(),
        active_force: Force::White,
        castling_rights: enum_map! { _ => enum_map! { _ => true } },
        en_passant_target: None,
        half_move_clock: 0,
        full_move_number: 1,
    }
}
