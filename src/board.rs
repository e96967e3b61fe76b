use std::collections::HashMap;
use std::ops;

use enum_map::{EnumMap, enum_map};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::chess_move::ResolvedMove;
use crate::coord::Coord;
use crate::error::TurnError;
use crate::fen;
use crate::force::Force;
use crate::grid::Grid;
use crate::janitor::Janitor;
use crate::piece::{CastleSide, Piece, PieceKind, rook_home};
use crate::starter::{BoardSetup, starting_setup};


pub type CastlingRights = EnumMap<Force, EnumMap<CastleSide, bool>>;

// Spatial state of one match. Knows geometry and bookkeeping, but nothing about legality:
// that is `MoveValidator`'s job.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Board {
    grid: Grid,
    active_force: Force,
    // Tells which castling moves can be made based on what pieces have moved (not taking
    // into account checks or the path being occupied).
    castling_rights: CastlingRights,
    // Set for exactly one ply after a pawn double step.
    en_passant_target: Option<Coord>,
    // Plies since the last capture or pawn move.
    half_move_clock: u32,
    full_move_number: u32,
    // Occurrence count for each position key; see `fen::position_key`.
    position_history: HashMap<String, u32>,
}

// Everything `Board::undo_move` needs to restore the position exactly.
#[derive(Clone, Debug)]
pub struct UndoRecord {
    from: Coord,
    to: Coord,
    moved: Piece,
    captured: Option<Piece>,
    rook_move: Option<(Piece, Coord)>,
    active_force: Force,
    castling_rights: CastlingRights,
    en_passant_target: Option<Coord>,
    half_move_clock: u32,
    full_move_number: u32,
}

impl UndoRecord {
    pub fn captured(&self) -> Option<Piece> { self.captured }
}

impl Board {
    // Standard starting position.
    pub fn new() -> Self { Self::from_setup(starting_setup()) }

    pub fn empty() -> Self {
        Self::from_setup(BoardSetup {
            grid: Grid::new(),
            active_force: Force::White,
            castling_rights: enum_map! { _ => enum_map! { _ => false } },
            en_passant_target: None,
            half_move_clock: 0,
            full_move_number: 1,
        })
    }

    pub fn from_setup(setup: BoardSetup) -> Self {
        let mut board = Board {
            grid: setup.grid,
            active_force: setup.active_force,
            castling_rights: setup.castling_rights,
            en_passant_target: setup.en_passant_target,
            half_move_clock: setup.half_move_clock,
            full_move_number: setup.full_move_number,
            position_history: HashMap::new(),
        };
        board.record_position();
        board
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn active_force(&self) -> Force { self.active_force }
    pub fn castling_rights(&self) -> &CastlingRights { &self.castling_rights }
    pub fn castling_right(&self, force: Force, side: CastleSide) -> bool {
        self.castling_rights[force][side]
    }
    pub fn en_passant_target(&self) -> Option<Coord> { self.en_passant_target }
    pub fn half_move_clock(&self) -> u32 { self.half_move_clock }
    pub fn full_move_number(&self) -> u32 { self.full_move_number }
    pub fn position_history(&self) -> &HashMap<String, u32> { &self.position_history }

    pub fn get_piece(&self, coord: Coord) -> Option<Piece> { self.grid[coord] }

    // Places the piece and updates its stored coord. Returns the piece previously there.
    pub fn set_piece(&mut self, coord: Coord, piece: Piece) -> Option<Piece> {
        self.grid[coord].replace(Piece { coord, ..piece })
    }

    pub fn remove_piece(&mut self, coord: Coord) -> Option<Piece> { self.grid[coord].take() }

    pub fn get_piece_at(&self, square: &str) -> Result<Option<Piece>, TurnError> {
        Ok(self.get_piece(parse_square(square)?))
    }
    pub fn set_piece_at(&mut self, square: &str, piece: Piece) -> Result<Option<Piece>, TurnError> {
        Ok(self.set_piece(parse_square(square)?, piece))
    }
    pub fn remove_piece_at(&mut self, square: &str) -> Result<Option<Piece>, TurnError> {
        Ok(self.remove_piece(parse_square(square)?))
    }

    pub fn is_empty(&self, coord: Coord) -> bool { self.grid[coord].is_none() }

    pub fn is_occupied_by(&self, coord: Coord, force: Force) -> bool {
        matches!(self.grid[coord], Some(piece) if piece.force == force)
    }

    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ { self.grid.pieces() }

    pub fn pieces_of(&self, force: Force) -> impl Iterator<Item = Piece> + '_ {
        self.pieces().filter(move |piece| piece.force == force)
    }

    pub fn find_king(&self, force: Force) -> Option<Coord> {
        self.pieces_of(force).find(|piece| piece.kind == PieceKind::King).map(|piece| piece.coord)
    }

    // A board reachable through legal play always has both kings, so their absence means the
    // board was assembled incorrectly.
    #[track_caller]
    pub fn king_pos(&self, force: Force) -> Coord {
        match self.find_king(force) {
            Some(coord) => coord,
            None => panic!("Cannot find {:?} king", force),
        }
    }

    pub fn is_square_attacked(&self, coord: Coord, attacker: Force) -> bool {
        self.pieces_of(attacker).any(|piece| piece.attacks(coord, self))
    }

    pub fn is_king_in_check(&self, force: Force) -> bool {
        self.is_square_attacked(self.king_pos(force), force.opponent())
    }

    // Checks invariants that legal play maintains but a hand-assembled board may violate.
    pub fn verify_integrity(&self) -> Result<(), String> {
        for force in Force::iter() {
            let kings = self.pieces_of(force).filter(|piece| piece.kind == PieceKind::King).count();
            if kings != 1 {
                return Err(format!("expected one {force} king, found {kings}"));
            }
        }
        for coord in Coord::all() {
            if let Some(piece) = self.grid[coord] {
                if piece.coord != coord {
                    return Err(format!("piece on {coord} believes it is on {}", piece.coord));
                }
            }
        }
        if self.is_king_in_check(self.active_force.opponent()) {
            return Err("side not to move is in check".to_owned());
        }
        Ok(())
    }

    // Applies an already validated move. Panics if there is no piece on the source square.
    pub fn apply_move(&mut self, mv: &ResolvedMove) -> UndoRecord {
        let Some(moved) = self.grid[mv.from] else {
            panic!("No piece to move from {}", mv.from);
        };
        let force = moved.force;
        let mut undo = UndoRecord {
            from: mv.from,
            to: mv.to,
            moved,
            captured: None,
            rook_move: None,
            active_force: self.active_force,
            castling_rights: self.castling_rights,
            en_passant_target: self.en_passant_target,
            half_move_clock: self.half_move_clock,
            full_move_number: self.full_move_number,
        };

        let capture_square =
            if mv.flags.en_passant { Coord::new(mv.from.rank, mv.to.file) } else { mv.to };
        undo.captured = self.remove_piece(capture_square);
        self.grid[mv.from] = None;
        let mut piece = Piece { has_moved: true, ..moved };
        if let Some(promote_to) = mv.flags.promotion {
            piece.kind = promote_to;
        }
        self.set_piece(mv.to, piece);

        if let Some(side) = mv.flags.castling {
            let rook_from = rook_home(force, side);
            let rook_to = Coord::new(rook_from.rank, side.rook_target_file());
            if let Some(rook) = self.remove_piece(rook_from) {
                self.set_piece(rook_to, Piece { has_moved: true, ..rook });
                undo.rook_move = Some((rook, rook_to));
            }
        }

        if moved.kind == PieceKind::King {
            self.castling_rights[force] = enum_map! { _ => false };
        }
        // Moving from a rook home square means the rook has moved; moving to it means the rook
        // (if it was still there) has been captured.
        for (rights_force, side) in Force::iter().flat_map(|f| CastleSide::iter().map(move |s| (f, s))) {
            let home = rook_home(rights_force, side);
            if mv.from == home || capture_square == home {
                self.castling_rights[rights_force][side] = false;
            }
        }

        let (d_rank, _) = mv.to.delta_from(mv.from);
        self.en_passant_target = if moved.kind == PieceKind::Pawn && d_rank.abs() == 2 {
            mv.from.offset((d_rank / 2, 0))
        } else {
            None
        };

        if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
            self.half_move_clock = 0;
        } else {
            self.half_move_clock += 1;
        }
        if force == Force::Black {
            self.full_move_number += 1;
        }
        self.active_force = force.opponent();
        undo
    }

    pub fn undo_move(&mut self, undo: UndoRecord) {
        self.grid[undo.to] = None;
        self.set_piece(undo.from, undo.moved);
        if let Some((rook, rook_to)) = undo.rook_move {
            self.grid[rook_to] = None;
            self.set_piece(rook.coord, rook);
        }
        if let Some(captured) = undo.captured {
            self.set_piece(captured.coord, captured);
        }
        self.active_force = undo.active_force;
        self.castling_rights = undo.castling_rights;
        self.en_passant_target = undo.en_passant_target;
        self.half_move_clock = undo.half_move_clock;
        self.full_move_number = undo.full_move_number;
    }

    // Applies the move for the lifetime of the returned guard and reverts it afterwards.
    pub fn scoped_move<'a>(
        &'a mut self, mv: &ResolvedMove,
    ) -> impl ops::DerefMut<Target = Board> + use<'a> {
        let undo = self.apply_move(mv);
        Janitor::new(self, move |board: &mut Board| board.undo_move(undo))
    }

    // Counts the current position towards repetition. Speculative moves never call this, so
    // apply+undo leaves the history intact.
    pub fn record_position(&mut self) -> u32 {
        let count = self.position_history.entry(self.position_key()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn position_occurrences(&self) -> u32 {
        self.position_history.get(&self.position_key()).copied().unwrap_or(0)
    }

    pub fn position_key(&self) -> String { fen::position_key(self) }
    pub fn to_fen(&self) -> String { fen::board_to_fen(self) }

    // Material that can never deliver mate: K v K, K+minor v K, and K+B v K+B with both
    // bishops on squares of the same color.
    pub fn has_insufficient_material(&self) -> bool {
        let non_kings: Vec<Piece> =
            self.pieces().filter(|piece| piece.kind != PieceKind::King).collect();
        match non_kings.as_slice() {
            [] => true,
            [piece] => piece.kind.is_minor(),
            [a, b] => {
                a.kind == PieceKind::Bishop
                    && b.kind == PieceKind::Bishop
                    && a.force != b.force
                    && a.coord.is_light_square() == b.coord.is_light_square()
            }
            _ => false,
        }
    }
}

fn parse_square(square: &str) -> Result<Coord, TurnError> {
    Coord::from_algebraic(square).ok_or(TurnError::InvalidPosition)
}
