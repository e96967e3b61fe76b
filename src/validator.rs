use log::warn;

use crate::algebraic::{AlgebraicCharset, AlgebraicMove, AlgebraicTurn, CheckMark};
use crate::board::Board;
use crate::chess_move::{MoveFlags, MoveRequest, ResolvedMove};
use crate::coord::Coord;
use crate::error::TurnError;
use crate::internal_error_message;
use crate::force::Force;
use crate::piece::{Piece, PieceKind, king_home, promotion_rank};


// Sole authority on move legality. Never mutates the board it was given: every speculative move
// is played on a private clone and undone right away.
#[derive(Clone, Copy, Debug)]
pub struct MoveValidator<'a> {
    board: &'a Board,
}

impl<'a> MoveValidator<'a> {
    pub fn new(board: &'a Board) -> Self { MoveValidator { board } }

    pub fn board(&self) -> &'a Board { self.board }

    // Checks the move and, if it is legal, describes it fully: flags (including check, mate and
    // stalemate for the opponent) and algebraic notation.
    pub fn validate(&self, request: &MoveRequest) -> Result<ResolvedMove, TurnError> {
        let mut scratch = self.board.clone();
        let mut mv = resolve_legal(&mut scratch, request)?;
        let algebraic = algebraic_turn(&mut scratch, &mv);
        {
            let mut after = scratch.scoped_move(&mv);
            let opponent = mv.force.opponent();
            let check = king_attacked(&after, opponent)?;
            let can_move = has_legal_move_on(&mut after, opponent);
            mv.flags.check = check;
            mv.flags.checkmate = check && !can_move;
            mv.flags.stalemate = !check && !can_move;
        }
        let mark = CheckMark::new(mv.flags.check, mv.flags.checkmate);
        mv.notation = algebraic.format(AlgebraicCharset::Ascii, mark);
        Ok(mv)
    }

    pub fn is_move_legal(&self, request: &MoveRequest) -> bool {
        resolve_legal(&mut self.board.clone(), request).is_ok()
    }

    pub fn legal_moves(&self, force: Force) -> Vec<MoveRequest> {
        legal_moves_on(&mut self.board.clone(), force)
    }

    pub fn has_legal_move(&self, force: Force) -> bool {
        has_legal_move_on(&mut self.board.clone(), force)
    }

    pub fn is_checkmate(&self, force: Force) -> bool {
        self.board.find_king(force).is_some()
            && self.board.is_king_in_check(force)
            && !self.has_legal_move(force)
    }

    pub fn is_stalemate(&self, force: Force) -> bool {
        self.board.find_king(force).is_some()
            && !self.board.is_king_in_check(force)
            && !self.has_legal_move(force)
    }

    // Finds the legal move that standard algebraic notation refers to.
    pub fn resolve_algebraic(&self, notation: &str, force: Force) -> Result<MoveRequest, TurnError> {
        let (turn, _) = AlgebraicTurn::parse(notation).ok_or(TurnError::InvalidMoveData)?;
        let mv = match turn {
            AlgebraicTurn::Castle(side) => {
                let from = king_home(force);
                let to = Coord::new(from.rank, side.king_target_file());
                return Ok(MoveRequest::new(from, to, None, force));
            }
            AlgebraicTurn::Move(mv) => mv,
        };
        let matches: Vec<MoveRequest> = self
            .legal_moves(force)
            .into_iter()
            .filter(|request| {
                let Some(piece) = self.board.get_piece(request.from) else {
                    return false;
                };
                piece.kind == mv.piece_kind
                    && request.to == mv.to
                    && mv.from_file.is_none_or(|file| request.from.file == file)
                    && mv.from_rank.is_none_or(|rank| request.from.rank == rank)
                    && match request.promotion {
                        None => true,
                        Some(kind) => kind == mv.promote_to.unwrap_or(PieceKind::Queen),
                    }
            })
            .collect();
        match matches.as_slice() {
            [request] => Ok(*request),
            [] => Err(TurnError::InvalidPieceMove),
            _ => Err(TurnError::InvalidMoveData),
        }
    }
}

fn king_attacked(board: &Board, force: Force) -> Result<bool, TurnError> {
    match board.find_king(force) {
        Some(pos) => Ok(board.is_square_attacked(pos, force.opponent())),
        None => {
            warn!("{}\n{}", internal_error_message!("no {} king on board", force), board.to_fen());
            Err(TurnError::Internal)
        }
    }
}

// Everything except king safety: basic checks, special-move preconditions, geometry and the
// promotion choice. Returns a move without check flags and notation.
fn resolve_pseudo_legal(board: &Board, request: &MoveRequest) -> Result<ResolvedMove, TurnError> {
    let MoveRequest { from, to, force, .. } = *request;
    let piece = board.get_piece(from).ok_or(TurnError::NoPieceAtSource)?;
    if piece.force != force {
        return Err(TurnError::WrongColor);
    }
    if from == to {
        return Err(TurnError::SameSquare);
    }
    if board.is_occupied_by(to, force) {
        return Err(TurnError::FriendlyFire);
    }

    let mut flags = MoveFlags::default();
    let mut captured = board.get_piece(to);
    if let Some(side) = piece.castling_side_for(to) {
        if !piece.can_castle(side, board) {
            return Err(TurnError::InvalidCastling);
        }
        flags.castling = Some(side);
    } else if is_en_passant_attempt(&piece, to, board) {
        if !piece.is_en_passant_capture(to, board) {
            return Err(TurnError::InvalidEnPassant);
        }
        flags.en_passant = true;
        captured = board.get_piece(Coord::new(from.rank, to.file));
    } else if !piece.can_move_to(to, board) {
        return Err(TurnError::InvalidPieceMove);
    }
    flags.capture = captured.is_some();

    let reaches_last_rank = piece.kind == PieceKind::Pawn && to.rank == promotion_rank(force);
    flags.promotion = match request.promotion {
        Some(kind) if !kind.is_promotion_target() => return Err(TurnError::InvalidPromotionPiece),
        Some(_) if !reaches_last_rank => return Err(TurnError::InvalidPromotion),
        Some(kind) => Some(kind),
        None if reaches_last_rank => Some(PieceKind::Queen),
        None => None,
    };

    Ok(ResolvedMove {
        from,
        to,
        force,
        piece_kind: piece.kind,
        captured,
        flags,
        notation: String::new(),
    })
}

// One step diagonally forward onto an empty square.
fn is_en_passant_attempt(piece: &Piece, to: Coord, board: &Board) -> bool {
    let (d_rank, d_file) = to.delta_from(piece.coord);
    piece.kind == PieceKind::Pawn
        && d_rank == piece.force.forward()
        && d_file.abs() == 1
        && board.is_empty(to)
}

fn resolve_legal(scratch: &mut Board, request: &MoveRequest) -> Result<ResolvedMove, TurnError> {
    let mv = resolve_pseudo_legal(scratch, request)?;
    let after = scratch.scoped_move(&mv);
    if king_attacked(&after, mv.force)? {
        return Err(TurnError::KingInCheck);
    }
    drop(after);
    Ok(mv)
}

fn legal_moves_on(scratch: &mut Board, force: Force) -> Vec<MoveRequest> {
    let candidates: Vec<MoveRequest> = {
        let board: &Board = scratch;
        board.pieces_of(force).flat_map(|piece| piece.candidate_moves(board)).collect()
    };
    candidates
        .into_iter()
        .filter(|request| resolve_legal(scratch, request).is_ok())
        .collect()
}

fn has_legal_move_on(scratch: &mut Board, force: Force) -> bool {
    let pieces: Vec<Piece> = scratch.pieces_of(force).collect();
    for piece in pieces {
        for request in piece.candidate_moves(scratch) {
            if resolve_legal(scratch, &request).is_ok() {
                return true;
            }
        }
    }
    false
}

// Builds the notation for a legal move on the position before it is played. The mover is
// disambiguated among same-kind pieces that could legally reach the same square: by file if that
// suffices, else by rank, else by the full square.
fn algebraic_turn(scratch: &mut Board, mv: &ResolvedMove) -> AlgebraicTurn {
    if let Some(side) = mv.flags.castling {
        return AlgebraicTurn::Castle(side);
    }
    let mut from_file = None;
    let mut from_rank = None;
    if mv.piece_kind == PieceKind::Pawn {
        if mv.flags.capture {
            from_file = Some(mv.from.file);
        }
    } else {
        let others: Vec<Coord> = scratch
            .pieces_of(mv.force)
            .filter(|piece| piece.kind == mv.piece_kind && piece.coord != mv.from)
            .map(|piece| piece.coord)
            .collect();
        let rivals: Vec<Coord> = others
            .into_iter()
            .filter(|&from| {
                let request = MoveRequest::new(from, mv.to, mv.flags.promotion, mv.force);
                resolve_legal(scratch, &request).is_ok()
            })
            .collect();
        if !rivals.is_empty() {
            if rivals.iter().all(|rival| rival.file != mv.from.file) {
                from_file = Some(mv.from.file);
            } else if rivals.iter().all(|rival| rival.rank != mv.from.rank) {
                from_rank = Some(mv.from.rank);
            } else {
                from_file = Some(mv.from.file);
                from_rank = Some(mv.from.rank);
            }
        }
    }
    AlgebraicTurn::Move(AlgebraicMove {
        piece_kind: mv.piece_kind,
        from_file,
        from_rank,
        capturing: mv.flags.capture,
        to: mv.to,
        promote_to: mv.flags.promotion,
    })
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fen::fen_to_board;
    use crate::piece::CastleSide;

    fn board(fen: &str) -> Board { fen_to_board(fen).unwrap() }

    fn request(board: &Board, from: Coord, to: Coord) -> MoveRequest {
        MoveRequest::new(from, to, None, board.active_force())
    }

    fn validate(board: &Board, from: Coord, to: Coord) -> Result<ResolvedMove, TurnError> {
        MoveValidator::new(board).validate(&request(board, from, to))
    }

    #[test]
    fn basic_rejections() {
        let board = Board::new();
        assert_eq!(validate(&board, Coord::E3, Coord::E4), Err(TurnError::NoPieceAtSource));
        assert_eq!(
            MoveValidator::new(&board)
                .validate(&MoveRequest::new(Coord::E7, Coord::E5, None, Force::White)),
            Err(TurnError::WrongColor)
        );
        assert_eq!(validate(&board, Coord::E2, Coord::E2), Err(TurnError::SameSquare));
        assert_eq!(validate(&board, Coord::A1, Coord::A2), Err(TurnError::FriendlyFire));
        assert_eq!(validate(&board, Coord::E2, Coord::E5), Err(TurnError::InvalidPieceMove));
        assert_eq!(validate(&board, Coord::F1, Coord::C4), Err(TurnError::InvalidPieceMove));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let board = board("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
        assert_eq!(validate(&board, Coord::E2, Coord::D3), Err(TurnError::KingInCheck));
        // Moving along the pin line is fine.
        assert!(validate(&board, Coord::E1, Coord::D1).is_ok());
    }

    #[test]
    fn must_escape_check() {
        let board = board("4k3/8/8/8/8/8/3P4/r3K3 w - - 0 1");
        assert_eq!(validate(&board, Coord::D2, Coord::D3), Err(TurnError::KingInCheck));
        assert_eq!(validate(&board, Coord::E1, Coord::D1), Err(TurnError::KingInCheck));
        assert!(validate(&board, Coord::E1, Coord::E2).is_ok());
    }

    #[test]
    fn validation_leaves_board_untouched() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let fen = board.to_fen();
        let validator = MoveValidator::new(&board);
        validator.validate(&request(&board, Coord::E1, Coord::G1)).unwrap();
        validator.legal_moves(Force::White);
        assert_eq!(board.to_fen(), fen);
    }

    #[test]
    fn castling() {
        let board = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let mv = validate(&board, Coord::E1, Coord::G1).unwrap();
        assert_eq!(mv.flags.castling, Some(CastleSide::KingSide));
        assert_eq!(mv.notation, "O-O");
        let mv = validate(&board, Coord::E1, Coord::C1).unwrap();
        assert_eq!(mv.flags.castling, Some(CastleSide::QueenSide));
        assert_eq!(mv.notation, "O-O-O");
    }

    #[test]
    fn castling_through_attack() {
        let board = board("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(validate(&board, Coord::E1, Coord::G1), Err(TurnError::InvalidCastling));
        assert!(validate(&board, Coord::E1, Coord::C1).is_ok());
    }

    #[test]
    fn en_passant() {
        let board = board("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 3");
        let mv = validate(&board, Coord::E5, Coord::D6).unwrap();
        assert!(mv.flags.en_passant);
        assert!(mv.flags.capture);
        assert_eq!(mv.captured.unwrap().coord, Coord::D5);
        assert_eq!(mv.notation, "exd6");
        assert_eq!(validate(&board, Coord::E5, Coord::F6), Err(TurnError::InvalidEnPassant));
    }

    #[test]
    fn promotion() {
        let board = board("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let mv = validate(&board, Coord::A7, Coord::A8).unwrap();
        assert_eq!(mv.flags.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.notation, "a8=Q+");
        let validator = MoveValidator::new(&board);
        let to_knight = MoveRequest::new(Coord::A7, Coord::A8, Some(PieceKind::Knight), Force::White);
        assert_eq!(validator.validate(&to_knight).unwrap().notation, "a8=N");
        let to_king = MoveRequest::new(Coord::A7, Coord::A8, Some(PieceKind::King), Force::White);
        assert_eq!(validator.validate(&to_king), Err(TurnError::InvalidPromotionPiece));
        let not_last_rank = MoveRequest::new(Coord::E1, Coord::E2, Some(PieceKind::Queen), Force::White);
        assert_eq!(validator.validate(&not_last_rank), Err(TurnError::InvalidPromotion));
    }

    #[test]
    fn disambiguation() {
        let board = self::board("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        assert_eq!(validate(&board, Coord::B1, Coord::D2).unwrap().notation, "Nbd2");
        let board = self::board("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(validate(&board, Coord::A1, Coord::A3).unwrap().notation, "R1a3");
        let board = self::board("8/8/1k6/8/4Q2Q/8/8/K6Q w - - 0 1");
        assert_eq!(validate(&board, Coord::H4, Coord::E1).unwrap().notation, "Qh4e1");
        // A rival that is pinned cannot reach the square, so no disambiguation is needed.
        let board = self::board("4k3/8/8/8/3N4/8/8/r1N1K3 w - - 0 1");
        assert_eq!(validate(&board, Coord::D4, Coord::B3).unwrap().notation, "Nb3");
    }

    #[test]
    fn checkmate_and_stalemate_flags() {
        let board = board("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2");
        let mv = validate(&board, Coord::D8, Coord::H4).unwrap();
        assert!(mv.flags.check);
        assert!(mv.flags.checkmate);
        assert_eq!(mv.notation, "Qh4#");

        let board = self::board("k7/8/8/8/8/8/8/1Q5K w - - 0 1");
        let mv = validate(&board, Coord::B1, Coord::B6).unwrap();
        assert!(!mv.flags.check);
        assert!(mv.flags.stalemate);
        assert_eq!(mv.notation, "Qb6");
    }

    #[test]
    fn legal_move_enumeration() {
        let board = Board::new();
        let validator = MoveValidator::new(&board);
        assert_eq!(validator.legal_moves(Force::White).len(), 20);
        assert!(validator.has_legal_move(Force::White));
        assert!(!validator.is_checkmate(Force::White));
        assert!(!validator.is_stalemate(Force::White));

        let mated = self::board("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let validator = MoveValidator::new(&mated);
        assert!(validator.legal_moves(Force::White).is_empty());
        assert!(validator.is_checkmate(Force::White));
        assert!(!validator.is_stalemate(Force::White));

        let stalemated = self::board("k7/8/1Q6/8/8/8/8/7K b - - 1 1");
        let validator = MoveValidator::new(&stalemated);
        assert!(validator.legal_moves(Force::Black).is_empty());
        assert!(validator.is_stalemate(Force::Black));
        assert!(!validator.is_checkmate(Force::Black));
    }

    #[test]
    fn promotions_are_enumerated_separately() {
        let board = board("4k3/P7/8/8/8/8/8/K7 w - - 0 1");
        let moves = MoveValidator::new(&board).legal_moves(Force::White);
        let promotions = moves.iter().filter(|request| request.from == Coord::A7).count();
        assert_eq!(promotions, 4);
    }

    #[test]
    fn algebraic_resolution() {
        let board = Board::new();
        let validator = MoveValidator::new(&board);
        assert_eq!(
            validator.resolve_algebraic("Nf3", Force::White),
            Ok(MoveRequest::new(Coord::G1, Coord::F3, None, Force::White))
        );
        assert_eq!(
            validator.resolve_algebraic("e4", Force::White),
            Ok(MoveRequest::new(Coord::E2, Coord::E4, None, Force::White))
        );
        assert_eq!(validator.resolve_algebraic("Nd2", Force::White), Err(TurnError::InvalidPieceMove));
        assert_eq!(validator.resolve_algebraic("hello", Force::White), Err(TurnError::InvalidMoveData));

        let board = self::board("4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1");
        let validator = MoveValidator::new(&board);
        assert_eq!(validator.resolve_algebraic("Nd2", Force::White), Err(TurnError::InvalidMoveData));
        assert_eq!(
            validator.resolve_algebraic("Nfd2", Force::White),
            Ok(MoveRequest::new(Coord::F1, Coord::D2, None, Force::White))
        );
    }
}
