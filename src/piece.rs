use derive_new::new;
use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::board::Board;
use crate::chess_move::MoveRequest;
use crate::coord::{Coord, File, Rank, SubjectiveRank};
use crate::force::Force;
use crate::util::{as_single_char, sort_two};


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Enum, EnumIter, Serialize, Deserialize)]
pub enum CastleSide {
    QueenSide,
    KingSide,
}

// The `coord` always matches the grid cell that owns the piece: `Board::set_piece` keeps them
// in sync.
#[derive(Clone, Copy, PartialEq, Eq, Debug, new, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub force: Force,
    pub coord: Coord,
    #[new(value = "false")]
    pub has_moved: bool,
}

pub const PROMOTION_TARGETS: [PieceKind; 4] =
    [PieceKind::Queen, PieceKind::Rook, PieceKind::Bishop, PieceKind::Knight];

const KNIGHT_OFFSETS: [(i8, i8); 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_OFFSETS: [(i8, i8); 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];
const QUEEN_DIRECTIONS: [(i8, i8); 8] = KING_OFFSETS;

const KING_HOME_FILE: File = File::E;

impl PieceKind {
    // Should not be used to construct moves in algebraic notation, because it returns a
    // non-empty name for a pawn (use `to_algebraic_for_move` instead).
    pub fn to_full_algebraic(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    pub fn to_algebraic_for_move(self) -> &'static str {
        match self {
            PieceKind::Pawn => "",
            PieceKind::Knight => "N",
            PieceKind::Bishop => "B",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
        }
    }

    pub fn from_algebraic_char(notation: char) -> Option<Self> {
        match notation.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }

    // Accepts both a single letter ("q", "N") and a full name ("queen").
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(ch) = as_single_char(name) {
            return Self::from_algebraic_char(ch);
        }
        match name.to_ascii_lowercase().as_str() {
            "pawn" => Some(PieceKind::Pawn),
            "knight" => Some(PieceKind::Knight),
            "bishop" => Some(PieceKind::Bishop),
            "rook" => Some(PieceKind::Rook),
            "queen" => Some(PieceKind::Queen),
            "king" => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is_promotion_target(self) -> bool { PROMOTION_TARGETS.contains(&self) }

    pub fn is_minor(self) -> bool { matches!(self, PieceKind::Knight | PieceKind::Bishop) }
}

impl CastleSide {
    pub fn rook_home_file(self) -> File {
        match self {
            CastleSide::QueenSide => File::A,
            CastleSide::KingSide => File::H,
        }
    }
    pub fn king_target_file(self) -> File {
        match self {
            CastleSide::QueenSide => File::C,
            CastleSide::KingSide => File::G,
        }
    }
    pub fn rook_target_file(self) -> File {
        match self {
            CastleSide::QueenSide => File::D,
            CastleSide::KingSide => File::F,
        }
    }
    pub fn notation(self) -> &'static str {
        match self {
            CastleSide::QueenSide => "O-O-O",
            CastleSide::KingSide => "O-O",
        }
    }
}

pub fn home_rank(force: Force) -> Rank { SubjectiveRank::from_one_based(1).to_rank(force) }
pub fn pawn_start_rank(force: Force) -> Rank { SubjectiveRank::from_one_based(2).to_rank(force) }
pub fn promotion_rank(force: Force) -> Rank { SubjectiveRank::from_one_based(8).to_rank(force) }
pub fn king_home(force: Force) -> Coord { Coord::new(home_rank(force), KING_HOME_FILE) }
pub fn rook_home(force: Force, side: CastleSide) -> Coord {
    Coord::new(home_rank(force), side.rook_home_file())
}

pub fn piece_to_ascii(kind: PieceKind, force: Force) -> char {
    let ch = kind.to_full_algebraic();
    match force {
        Force::White => ch.to_ascii_uppercase(),
        Force::Black => ch.to_ascii_lowercase(),
    }
}

pub fn piece_from_ascii(ch: char) -> Option<(PieceKind, Force)> {
    let kind = PieceKind::from_algebraic_char(ch)?;
    let force = if ch.is_ascii_uppercase() { Force::White } else { Force::Black };
    Some((kind, force))
}

pub fn piece_to_pictogram(piece_kind: PieceKind, force: Force) -> char {
    use self::Force::*;
    use self::PieceKind::*;
    match (force, piece_kind) {
        (White, Pawn) => '♙',
        (White, Knight) => '♘',
        (White, Bishop) => '♗',
        (White, Rook) => '♖',
        (White, Queen) => '♕',
        (White, King) => '♔',
        (Black, Pawn) => '♟',
        (Black, Knight) => '♞',
        (Black, Bishop) => '♝',
        (Black, Rook) => '♜',
        (Black, Queen) => '♛',
        (Black, King) => '♚',
    }
}


// Tests that squares between `from` (exclusive) and `to` (exclusive) are free.
// The move must be straight or diagonal.
fn has_linear_passage(board: &Board, from: Coord, to: Coord) -> bool {
    let (d_rank, d_file) = to.delta_from(from);
    assert!(d_rank == 0 || d_file == 0 || d_rank.abs() == d_file.abs());
    let direction = (d_rank.signum(), d_file.signum());
    let mut pos = from;
    loop {
        pos = match pos.offset(direction) {
            Some(pos) => pos,
            None => return false,
        };
        if pos == to {
            return true;
        }
        if !board.is_empty(pos) {
            return false;
        }
    }
}

// Walks each ray until the edge of the board or the first occupied square. The occupied square
// is included: it's either a capture or a defended piece, and callers filter by color.
fn ray_cast(board: &Board, from: Coord, directions: &[(i8, i8)], out: &mut Vec<Coord>) {
    for &direction in directions {
        let mut pos = from;
        while let Some(next) = pos.offset(direction) {
            out.push(next);
            if !board.is_empty(next) {
                break;
            }
            pos = next;
        }
    }
}

fn offsets_in_bounds(from: Coord, offsets: &[(i8, i8)]) -> impl Iterator<Item = Coord> + '_ {
    offsets.iter().filter_map(move |&d| from.offset(d))
}

impl Piece {
    pub fn can_move_to(&self, to: Coord, board: &Board) -> bool {
        !board.is_occupied_by(to, self.force) && self.is_valid_move(to, board)
    }

    // Variant-specific geometry. Does not test whether the destination holds a friendly piece
    // (see `can_move_to`) and never looks at king safety.
    pub fn is_valid_move(&self, to: Coord, board: &Board) -> bool {
        let from = self.coord;
        if to == from {
            return false;
        }
        let (d_rank, d_file) = to.delta_from(from);
        let is_straight_move = d_rank == 0 || d_file == 0;
        let is_diagonal_move = d_rank.abs() == d_file.abs();
        match self.kind {
            PieceKind::Pawn => self.is_valid_pawn_move(to, board),
            PieceKind::Knight => sort_two((d_rank.abs(), d_file.abs())) == (1, 2),
            PieceKind::Bishop => is_diagonal_move && has_linear_passage(board, from, to),
            PieceKind::Rook => is_straight_move && has_linear_passage(board, from, to),
            PieceKind::Queen => {
                (is_straight_move || is_diagonal_move) && has_linear_passage(board, from, to)
            }
            PieceKind::King => {
                if d_rank.abs() <= 1 && d_file.abs() <= 1 {
                    true
                } else if let Some(side) = self.castling_side_for(to) {
                    self.can_castle(side, board)
                } else {
                    false
                }
            }
        }
    }

    fn is_valid_pawn_move(&self, to: Coord, board: &Board) -> bool {
        let from = self.coord;
        let forward = self.force.forward();
        let (d_rank, d_file) = to.delta_from(from);
        if d_file == 0 {
            if d_rank == forward {
                board.is_empty(to)
            } else if d_rank == forward * 2 {
                !self.has_moved
                    && from.rank == pawn_start_rank(self.force)
                    && has_linear_passage(board, from, to)
                    && board.is_empty(to)
            } else {
                false
            }
        } else if d_file.abs() == 1 && d_rank == forward {
            board.is_occupied_by(to, self.force.opponent()) || self.is_en_passant_capture(to, board)
        } else {
            false
        }
    }

    // Diagonal pawn move onto the en passant target with the double-stepped enemy pawn next to
    // the mover. Geometry of the diagonal step itself is checked by the caller.
    pub fn is_en_passant_capture(&self, to: Coord, board: &Board) -> bool {
        if self.kind != PieceKind::Pawn || board.en_passant_target() != Some(to) || !board.is_empty(to)
        {
            return false;
        }
        let jumped = Coord::new(self.coord.rank, to.file);
        matches!(
            board.get_piece(jumped),
            Some(p) if p.kind == PieceKind::Pawn && p.force != self.force
        )
    }

    // Returns the side if moving to `to` would be a castling attempt (king two files sideways
    // from its home square). Says nothing about whether castling is allowed.
    pub fn castling_side_for(&self, to: Coord) -> Option<CastleSide> {
        if self.kind != PieceKind::King || self.coord != king_home(self.force) || to.rank != self.coord.rank
        {
            return None;
        }
        match to.delta_from(self.coord).1 {
            2 => Some(CastleSide::KingSide),
            -2 => Some(CastleSide::QueenSide),
            _ => None,
        }
    }

    pub fn can_castle(&self, side: CastleSide, board: &Board) -> bool {
        if self.kind != PieceKind::King || self.has_moved || self.coord != king_home(self.force) {
            return false;
        }
        if !board.castling_right(self.force, side) {
            return false;
        }
        let rook_pos = rook_home(self.force, side);
        match board.get_piece(rook_pos) {
            Some(rook)
                if rook.kind == PieceKind::Rook && rook.force == self.force && !rook.has_moved => {}
            _ => return false,
        }
        if !has_linear_passage(board, self.coord, rook_pos) {
            return false;
        }
        let opponent = self.force.opponent();
        if board.is_square_attacked(self.coord, opponent) {
            return false;
        }
        let king_to = Coord::new(self.coord.rank, side.king_target_file());
        let direction = (0, king_to.delta_from(self.coord).1.signum());
        let mut pos = self.coord;
        while pos != king_to {
            pos = match pos.offset(direction) {
                Some(pos) => pos,
                None => return false,
            };
            if board.is_square_attacked(pos, opponent) {
                return false;
            }
        }
        true
    }

    // Pseudo-legal destinations given the current occupancy.
    pub fn possible_moves(&self, board: &Board) -> Vec<Coord> {
        let from = self.coord;
        let mut moves = Vec::new();
        match self.kind {
            PieceKind::Pawn => {
                let forward = self.force.forward();
                for d in [(forward, 0), (forward * 2, 0), (forward, -1), (forward, 1)] {
                    if let Some(to) = from.offset(d) {
                        if self.is_valid_pawn_move(to, board) {
                            moves.push(to);
                        }
                    }
                }
            }
            PieceKind::Knight => moves.extend(offsets_in_bounds(from, &KNIGHT_OFFSETS)),
            PieceKind::Bishop => ray_cast(board, from, &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Rook => ray_cast(board, from, &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Queen => ray_cast(board, from, &QUEEN_DIRECTIONS, &mut moves),
            PieceKind::King => {
                moves.extend(offsets_in_bounds(from, &KING_OFFSETS));
                for side in [CastleSide::KingSide, CastleSide::QueenSide] {
                    if self.can_castle(side, board) {
                        moves.push(Coord::new(from.rank, side.king_target_file()));
                    }
                }
            }
        }
        moves.retain(|&to| !board.is_occupied_by(to, self.force));
        moves
    }

    // Squares this piece attacks. Pure geometry: no king safety and no castling, otherwise check
    // detection would recurse into itself.
    pub fn attacked_squares(&self, board: &Board) -> Vec<Coord> {
        let from = self.coord;
        let mut squares = Vec::new();
        match self.kind {
            PieceKind::Pawn => {
                let forward = self.force.forward();
                squares.extend(offsets_in_bounds(from, &[(forward, -1), (forward, 1)]));
            }
            PieceKind::Knight => squares.extend(offsets_in_bounds(from, &KNIGHT_OFFSETS)),
            PieceKind::Bishop => ray_cast(board, from, &BISHOP_DIRECTIONS, &mut squares),
            PieceKind::Rook => ray_cast(board, from, &ROOK_DIRECTIONS, &mut squares),
            PieceKind::Queen => ray_cast(board, from, &QUEEN_DIRECTIONS, &mut squares),
            PieceKind::King => squares.extend(offsets_in_bounds(from, &KING_OFFSETS)),
        }
        squares
    }

    pub fn attacks(&self, target: Coord, board: &Board) -> bool {
        self.attacked_squares(board).contains(&target)
    }

    // Pseudo-legal move requests. A pawn reaching the last rank yields one request per
    // promotion target.
    pub fn candidate_moves(&self, board: &Board) -> Vec<MoveRequest> {
        let mut requests = Vec::new();
        for to in self.possible_moves(board) {
            if self.kind == PieceKind::Pawn && to.rank == promotion_rank(self.force) {
                for kind in PROMOTION_TARGETS {
                    requests.push(MoveRequest::new(self.coord, to, Some(kind), self.force));
                }
            } else {
                requests.push(MoveRequest::new(self.coord, to, None, self.force));
            }
        }
        requests
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::fen::fen_to_board;

    fn board(fen: &str) -> Board { fen_to_board(fen).unwrap() }

    fn sorted(mut v: Vec<Coord>) -> Vec<Coord> {
        v.sort();
        v
    }

    #[test]
    fn knight_ignores_blockers() {
        let board = Board::new();
        let knight = board.get_piece(Coord::G1).unwrap();
        assert_eq!(sorted(knight.possible_moves(&board)), sorted(vec![Coord::F3, Coord::H3]));
        assert!(knight.can_move_to(Coord::F3, &board));
        assert!(!knight.can_move_to(Coord::E2, &board));
    }

    #[test]
    fn sliders_stop_at_first_obstruction() {
        let board = board("4k3/8/8/3p4/8/8/3R4/4K3 w - - 0 1");
        let rook = board.get_piece(Coord::D2).unwrap();
        let moves = rook.possible_moves(&board);
        assert!(moves.contains(&Coord::D5)); // capture
        assert!(!moves.contains(&Coord::D6)); // behind the capture
        assert!(moves.contains(&Coord::D1));
        assert!(moves.contains(&Coord::A2));
        assert!(moves.contains(&Coord::H2));
        assert!(!rook.can_move_to(Coord::D6, &board));
        assert!(!rook.can_move_to(Coord::E3, &board));
    }

    #[test]
    fn pawn_pushes_and_captures() {
        let board = board("4k3/8/8/8/8/2p5/3PP3/4K3 w - - 0 1");
        let pawn = board.get_piece(Coord::D2).unwrap();
        assert_eq!(
            sorted(pawn.possible_moves(&board)),
            sorted(vec![Coord::D3, Coord::D4, Coord::C3])
        );
        // Double step is blocked by a piece on the intermediate square.
        let board = self::board("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        let pawn = board.get_piece(Coord::E2).unwrap();
        assert!(pawn.possible_moves(&board).is_empty());
        assert!(!pawn.can_move_to(Coord::E4, &board));
    }

    #[test]
    fn pawn_attacks_do_not_depend_on_occupancy() {
        let board = Board::new();
        let pawn = board.get_piece(Coord::E2).unwrap();
        assert_eq!(sorted(pawn.attacked_squares(&board)), sorted(vec![Coord::D3, Coord::F3]));
        let edge_pawn = board.get_piece(Coord::A7).unwrap();
        assert_eq!(edge_pawn.attacked_squares(&board), vec![Coord::B6]);
    }

    #[test]
    fn en_passant_destination() {
        let board = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 3");
        let pawn = board.get_piece(Coord::E5).unwrap();
        assert!(pawn.possible_moves(&board).contains(&Coord::D6));
        assert!(pawn.is_en_passant_capture(Coord::D6, &board));
        let board = self::board("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 3");
        let pawn = board.get_piece(Coord::E5).unwrap();
        assert!(!pawn.possible_moves(&board).contains(&Coord::D6));
    }

    #[test]
    fn promotion_candidates() {
        let board = board("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1");
        let pawn = board.get_piece(Coord::B7).unwrap();
        let candidates = pawn.candidate_moves(&board);
        assert_eq!(candidates.len(), 4);
        assert!(candidates.iter().all(|mv| mv.to == Coord::B8 && mv.promotion.is_some()));
    }

    #[test]
    fn castling_destinations() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let king = board.get_piece(Coord::E1).unwrap();
        let moves = king.possible_moves(&board);
        assert!(moves.contains(&Coord::G1));
        assert!(moves.contains(&Coord::C1));
        assert!(king.can_move_to(Coord::G1, &board));
        assert!(!king.attacked_squares(&board).contains(&Coord::G1));

        let board = self::board("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1");
        let king = board.get_piece(Coord::E1).unwrap();
        assert!(!king.can_castle(CastleSide::KingSide, &board));
        assert!(king.can_castle(CastleSide::QueenSide, &board));
    }

    #[test]
    fn castling_requires_safe_transit() {
        // Black rook covers f1.
        let board = board("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let king = board.get_piece(Coord::E1).unwrap();
        assert!(!king.can_castle(CastleSide::KingSide, &board));
        assert!(king.can_castle(CastleSide::QueenSide, &board));
        // b1 is not on the king's path, so an attack on it doesn't matter.
        let board = self::board("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let king = board.get_piece(Coord::E1).unwrap();
        assert!(king.can_castle(CastleSide::QueenSide, &board));
    }

    #[test]
    fn geometry_agrees_with_generation() {
        for fen in [
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
        ] {
            let board = board(fen);
            for piece in board.pieces() {
                let generated = piece.possible_moves(&board);
                for to in Coord::all() {
                    assert_eq!(
                        piece.can_move_to(to, &board),
                        generated.contains(&to),
                        "{fen}: {:?} {:?} -> {:?}",
                        piece.kind,
                        piece.coord,
                        to
                    );
                }
            }
        }
    }

    #[test]
    fn piece_names() {
        assert_eq!(PieceKind::from_name("queen"), Some(PieceKind::Queen));
        assert_eq!(PieceKind::from_name("n"), Some(PieceKind::Knight));
        assert_eq!(PieceKind::from_name("dragon"), None);
        assert_eq!(piece_from_ascii('k'), Some((PieceKind::King, Force::Black)));
        assert_eq!(piece_to_ascii(PieceKind::Knight, Force::White), 'N');
        assert!(!PieceKind::King.is_promotion_target());
        assert!(!PieceKind::Pawn.is_promotion_target());
    }
}
