use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::error::TurnError;
use crate::force::Force;
use crate::once_cell_regex;
use crate::piece::{CastleSide, Piece, PieceKind};


// Move as it arrives from the outside world: raw integers that still need to be validated.
// Field names follow the JSON wire format: `{"fromRank": 1, "fromFile": 4, ...}`.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveInput {
    pub from_rank: i32,
    pub from_file: i32,
    pub to_rank: i32,
    pub to_file: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

// A structurally valid move with an asserted mover. Says nothing about legality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, new, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Coord,
    pub to: Coord,
    pub promotion: Option<PieceKind>,
    pub force: Force,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct MoveFlags {
    pub capture: bool,
    pub check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub castling: Option<CastleSide>,
    pub en_passant: bool,
    pub promotion: Option<PieceKind>,
}

// A move accepted by `MoveValidator`, enriched with everything needed to apply, undo and
// describe it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ResolvedMove {
    pub from: Coord,
    pub to: Coord,
    pub force: Force,
    pub piece_kind: PieceKind,
    pub captured: Option<Piece>,
    pub flags: MoveFlags,
    pub notation: String,
}

impl MoveInput {
    pub fn new(from: Coord, to: Coord, promotion: Option<PieceKind>) -> Self {
        MoveInput {
            from_rank: from.rank.to_zero_based().into(),
            from_file: from.file.to_zero_based().into(),
            to_rank: to.rank.to_zero_based().into(),
            to_file: to.file.to_zero_based().into(),
            promotion: promotion.map(|kind| kind.to_full_algebraic().to_ascii_lowercase().to_string()),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, TurnError> {
        serde_json::from_str(s).map_err(|_| TurnError::InvalidMoveData)
    }

    // Coordinate notation used by engines and the console: "e2e4", "e7e8q".
    pub fn from_long_algebraic(s: &str) -> Result<Self, TurnError> {
        let re = once_cell_regex!(r"^([a-h][1-8])-?([a-h][1-8])=?([nbrqNBRQ])?$");
        let cap = re.captures(s.trim()).ok_or(TurnError::InvalidMoveData)?;
        let from = Coord::from_algebraic(&cap[1]).ok_or(TurnError::InvalidPosition)?;
        let to = Coord::from_algebraic(&cap[2]).ok_or(TurnError::InvalidPosition)?;
        let promotion = match cap.get(3) {
            Some(m) => Some(PieceKind::from_name(m.as_str()).ok_or(TurnError::InvalidPromotionPiece)?),
            None => None,
        };
        Ok(MoveInput::new(from, to, promotion))
    }

    pub fn to_request(&self, force: Force) -> Result<MoveRequest, TurnError> {
        let from = Coord::try_new(self.from_rank, self.from_file).ok_or(TurnError::InvalidPosition)?;
        let to = Coord::try_new(self.to_rank, self.to_file).ok_or(TurnError::InvalidPosition)?;
        let promotion = match &self.promotion {
            Some(name) => Some(PieceKind::from_name(name).ok_or(TurnError::InvalidPromotionPiece)?),
            None => None,
        };
        Ok(MoveRequest { from, to, promotion, force })
    }
}

impl ResolvedMove {
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from,
            to: self.to,
            promotion: self.flags.promotion,
            force: self.force,
        }
    }

    // Square the captured piece was removed from. Differs from `to` only for en passant.
    pub fn capture_square(&self) -> Option<Coord> { self.captured.map(|piece| piece.coord) }

    pub fn is_pawn_move(&self) -> bool { self.piece_kind == PieceKind::Pawn }
}
