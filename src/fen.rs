use enum_map::enum_map;
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::board::{Board, CastlingRights};
use crate::coord::{Coord, File, Rank};
use crate::force::Force;
use crate::grid::Grid;
use crate::piece::{
    CastleSide, Piece, PieceKind, king_home, pawn_start_rank, piece_from_ascii, piece_to_ascii,
    rook_home,
};
use crate::starter::BoardSetup;
use crate::util::as_single_char;


fn castle_side_to_fen(force: Force, side: CastleSide) -> char {
    let ch = match side {
        CastleSide::KingSide => 'k',
        CastleSide::QueenSide => 'q',
    };
    match force {
        Force::White => ch.to_ascii_uppercase(),
        Force::Black => ch,
    }
}
fn castle_side_from_fen(ch: char) -> Result<(Force, CastleSide), String> {
    let force = if ch.is_ascii_uppercase() { Force::White } else { Force::Black };
    let side = match ch.to_ascii_lowercase() {
        'k' => CastleSide::KingSide,
        'q' => CastleSide::QueenSide,
        _ => return Err(format!("invalid castling right: {}", ch)),
    };
    Ok((force, side))
}

fn castling_rights_to_fen(castling_rights: &CastlingRights) -> String {
    let mut s = String::new();
    for force in Force::iter() {
        // FEN lists king side first.
        for side in [CastleSide::KingSide, CastleSide::QueenSide] {
            if castling_rights[force][side] {
                s.push(castle_side_to_fen(force, side));
            }
        }
    }
    if s.is_empty() { "-".to_owned() } else { s }
}
fn castling_rights_from_fen(grid: &Grid, s: &str) -> Result<CastlingRights, String> {
    let mut castling_rights = enum_map! { _ => enum_map! { _ => false } };
    if s == "-" {
        return Ok(castling_rights);
    }
    for ch in s.chars() {
        let (force, side) = castle_side_from_fen(ch)?;
        if castling_rights[force][side] {
            return Err(format!("duplicate castling right: {}", ch));
        }
        let is_at = |coord: Coord, kind: PieceKind| {
            matches!(grid[coord], Some(p) if p.kind == kind && p.force == force)
        };
        if !is_at(king_home(force), PieceKind::King) {
            return Err(format!("castling right {} requires the king on its home square", ch));
        }
        if !is_at(rook_home(force, side), PieceKind::Rook) {
            return Err(format!("castling right {} requires the rook in its corner", ch));
        }
        castling_rights[force][side] = true;
    }
    Ok(castling_rights)
}

fn en_passant_target_to_fen(en_passant_target: Option<Coord>) -> String {
    match en_passant_target {
        None => "-".to_owned(),
        Some(pos) => pos.to_algebraic(),
    }
}
fn en_passant_target_from_fen(s: &str, active_force: Force) -> Result<Option<Coord>, String> {
    if s == "-" {
        return Ok(None);
    }
    let pos = Coord::from_algebraic(s).ok_or_else(|| format!("invalid en passant target: {}", s))?;
    // The target lies behind a pawn of the side that just moved.
    let expected_rank = match active_force {
        Force::White => Rank::_6,
        Force::Black => Rank::_3,
    };
    if pos.rank != expected_rank {
        return Err(format!("en passant target {} is impossible with {} to move", s, active_force));
    }
    Ok(Some(pos))
}

fn grid_to_fen(grid: &Grid) -> String {
    Rank::all()
        .rev()
        .map(|rank| {
            let mut rank_notation = String::new();
            let mut empty_file_count: u8 = 0;
            for file in File::all() {
                if let Some(piece) = grid[Coord::new(rank, file)] {
                    if empty_file_count > 0 {
                        rank_notation.push_str(&empty_file_count.to_string());
                        empty_file_count = 0;
                    }
                    rank_notation.push(piece_to_ascii(piece.kind, piece.force));
                } else {
                    empty_file_count += 1;
                }
            }
            if empty_file_count > 0 {
                rank_notation.push_str(&empty_file_count.to_string());
            }
            rank_notation
        })
        .join("/")
}

fn grid_from_fen(grid_notation: &str) -> Result<Grid, String> {
    let mut grid = Grid::new();
    let ranks = grid_notation.split('/').collect_vec();
    if ranks.len() != 8 {
        return Err(format!("invalid FEN: has {} ranks, expected 8", ranks.len()));
    }
    for (rank, rank_notation) in Rank::all().zip(ranks.iter().rev()) {
        let mut file: u32 = 0;
        for ch in rank_notation.chars() {
            if let Some(n) = ch.to_digit(10) {
                if n == 0 {
                    return Err(format!("invalid FEN: zero skip on rank {}", rank.to_algebraic()));
                }
                file += n;
            } else if let Some((kind, force)) = piece_from_ascii(ch) {
                let coord = File::try_from_zero_based(file as i32)
                    .map(|file| Coord::new(rank, file))
                    .ok_or_else(|| format!("invalid FEN: rank {} is too long", rank.to_algebraic()))?;
                grid[coord] = Some(Piece::new(kind, force, coord));
                file += 1;
            } else {
                return Err(format!("invalid FEN: unknown piece: {}", ch));
            }
        }
        if file != 8 {
            return Err(format!(
                "invalid FEN: rank {} has {} files, expected 8",
                rank.to_algebraic(),
                file
            ));
        }
    }
    Ok(grid)
}

// FEN does not record which pieces have moved. Infer it from rights and placement: anything
// that could still take part in castling or a double step is treated as unmoved.
fn infer_has_moved(grid: &mut Grid, castling_rights: &CastlingRights) {
    for coord in Coord::all() {
        let Some(mut piece) = grid[coord] else {
            continue;
        };
        let force = piece.force;
        piece.has_moved = match piece.kind {
            PieceKind::Pawn => coord.rank != pawn_start_rank(force),
            PieceKind::King => {
                coord != king_home(force) || !castling_rights[force].values().any(|&r| r)
            }
            PieceKind::Rook => {
                !CastleSide::iter().any(|side| {
                    castling_rights[force][side] && coord == rook_home(force, side)
                })
            }
            _ => piece.has_moved,
        };
        grid[coord] = Some(piece);
    }
}

pub fn board_to_fen(board: &Board) -> String {
    format!(
        "{} {} {} {} {} {}",
        grid_to_fen(board.grid()),
        board.active_force().to_fen(),
        castling_rights_to_fen(board.castling_rights()),
        en_passant_target_to_fen(board.en_passant_target()),
        board.half_move_clock(),
        board.full_move_number()
    )
}

// Identity of a position for repetition purposes: placement, side to move, castling rights and
// en passant square. The en passant square only counts if the side to move has a pawn that
// could actually capture there, otherwise two identical positions would compare as different.
pub fn position_key(board: &Board) -> String {
    let en_passant_target = board.en_passant_target().filter(|&target| {
        let force = board.active_force();
        [-1, 1].into_iter().any(|d_file| {
            target.offset((-force.forward(), d_file)).is_some_and(|from| {
                matches!(
                    board.get_piece(from),
                    Some(p) if p.kind == PieceKind::Pawn && p.force == force
                )
            })
        })
    });
    format!(
        "{} {} {} {}",
        grid_to_fen(board.grid()),
        board.active_force().to_fen(),
        castling_rights_to_fen(board.castling_rights()),
        en_passant_target_to_fen(en_passant_target)
    )
}

pub fn fen_to_setup(fen: &str) -> Result<BoardSetup, String> {
    let (
        grid_notation,
        active_force_notation,
        castling_notation,
        en_passant_target_notation,
        half_move_clock,
        full_move_number,
    ) = fen
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| format!("invalid FEN: {fen}"))?;

    let mut grid = grid_from_fen(grid_notation)?;
    let active_force = as_single_char(active_force_notation)
        .and_then(Force::from_fen)
        .ok_or_else(|| format!("invalid active color: {}", active_force_notation))?;
    let castling_rights = castling_rights_from_fen(&grid, castling_notation)?;
    let en_passant_target = en_passant_target_from_fen(en_passant_target_notation, active_force)?;
    let half_move_clock = half_move_clock
        .parse::<u32>()
        .map_err(|_| format!("invalid half-move clock: {}", half_move_clock))?;
    let full_move_number = full_move_number
        .parse::<u32>()
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| format!("invalid full move number: {}", full_move_number))?;
    infer_has_moved(&mut grid, &castling_rights);

    Ok(BoardSetup {
        grid,
        active_force,
        castling_rights,
        en_passant_target,
        half_move_clock,
        full_move_number,
    })
}

// Parses and checks that the position is playable: one king per side and the side not to move
// is not in check.
pub fn fen_to_board(fen: &str) -> Result<Board, String> {
    let board = Board::from_setup(fen_to_setup(fen)?);
    board.verify_integrity()?;
    Ok(board)
}
