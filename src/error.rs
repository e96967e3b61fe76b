use std::fmt;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;


#[macro_export]
macro_rules! internal_error_message {
    () => {
        format!("Internal error at {}:{}.", file!(), line!())
    };
    ($($arg:tt)+) => {
        format!("Internal error at {}:{}: {}.", file!(), line!(), format!($($arg)*))
    };
}


// Every variant is recoverable: a rejected turn leaves the game exactly as it was.
// `code` is a stable identifier meant for clients; the `Display` text is for humans.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TurnError {
    // Structural
    InvalidMoveData,
    InvalidPosition,
    // Authorization and turn order
    GameNotActive,
    NotYourTurn,
    WrongColor,
    UnknownPlayer,
    // Legality
    NoPieceAtSource,
    SameSquare,
    FriendlyFire,
    InvalidPieceMove,
    KingInCheck,
    InvalidCastling,
    InvalidEnPassant,
    InvalidPromotion,
    InvalidPromotionPiece,
    // The board violates an invariant that legal play cannot break (e.g. a missing king).
    Internal,
}

impl TurnError {
    pub fn code(self) -> &'static str { self.into() }

    pub fn message(self) -> &'static str {
        use TurnError::*;
        match self {
            InvalidMoveData => "Move data is incomplete or malformed",
            InvalidPosition => "Square is outside of the board",
            GameNotActive => "Game is not active",
            NotYourTurn => "It is not your turn",
            WrongColor => "Cannot move opponent's piece",
            UnknownPlayer => "Player does not participate in this game",
            NoPieceAtSource => "There is no piece on the source square",
            SameSquare => "Source and destination squares are the same",
            FriendlyFire => "Cannot capture own piece",
            InvalidPieceMove => "Piece cannot move like that",
            KingInCheck => "Move would leave the king in check",
            InvalidCastling => "Castling is not allowed",
            InvalidEnPassant => "En passant capture is not allowed",
            InvalidPromotion => "Promotion is only possible when a pawn reaches the last rank",
            InvalidPromotionPiece => "Pawn can only promote to a queen, rook, bishop or knight",
            Internal => "Internal error",
        }
    }
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.message()) }
}

impl std::error::Error for TurnError {}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_codes() {
        assert_eq!(TurnError::KingInCheck.code(), "king_in_check");
        assert_eq!(TurnError::WrongColor.code(), "wrong_color");
        assert_eq!(TurnError::InvalidEnPassant.code(), "invalid_en_passant");
        assert_eq!(serde_json::to_string(&TurnError::NotYourTurn).unwrap(), "\"not_your_turn\"");
    }
}
