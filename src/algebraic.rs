use crate::coord::{Coord, File, Rank};
use crate::once_cell_regex;
use crate::piece::{CastleSide, PieceKind};
use crate::util::as_single_char;


#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AlgebraicCharset {
    Ascii,
    AuxiliaryUnicode,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CheckMark {
    #[default]
    None,
    Check,
    Checkmate,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AlgebraicMove {
    pub piece_kind: PieceKind,
    pub from_file: Option<File>,
    pub from_rank: Option<Rank>,
    pub capturing: bool,
    pub to: Coord,
    pub promote_to: Option<PieceKind>,
}

// Standard algebraic notation. Conversion between `AlgebraicTurn` and string can be done without
// a board. Conversion between `AlgebraicTurn` and a move requires a board, see `MoveValidator`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AlgebraicTurn {
    Move(AlgebraicMove),
    Castle(CastleSide),
}


impl CheckMark {
    pub fn new(check: bool, checkmate: bool) -> Self {
        if checkmate {
            CheckMark::Checkmate
        } else if check {
            CheckMark::Check
        } else {
            CheckMark::None
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            CheckMark::None => "",
            CheckMark::Check => "+",
            CheckMark::Checkmate => "#",
        }
    }
}

impl AlgebraicTurn {
    // Parses a turn, ignoring the check mark if any. Returns the turn and the mark separately
    // since the mark is a consequence of the move rather than a part of it.
    pub fn parse(notation: &str) -> Option<(Self, CheckMark)> {
        let notation = notation.trim();
        let move_re = once_cell_regex!(
            r"^([NBRQK])?([a-h])?([1-8])?([x×:])?([a-h][1-8])(?:=?([NBRQnbrq]))?([+#]?)$"
        );
        let castling_re = once_cell_regex!(r"^(0-0-0|O-O-O|0-0|O-O)([+#]?)$");
        let parse_mark = |s: &str| match s {
            "+" => CheckMark::Check,
            "#" => CheckMark::Checkmate,
            _ => CheckMark::None,
        };
        if let Some(cap) = move_re.captures(notation) {
            let piece_kind = match cap.get(1) {
                None => PieceKind::Pawn,
                Some(m) => PieceKind::from_algebraic_char(as_single_char(m.as_str())?)?,
            };
            let from_file = match cap.get(2) {
                None => None,
                Some(m) => Some(File::from_algebraic(as_single_char(m.as_str())?)?),
            };
            let from_rank = match cap.get(3) {
                None => None,
                Some(m) => Some(Rank::from_algebraic(as_single_char(m.as_str())?)?),
            };
            let capturing = cap.get(4).is_some();
            let to = Coord::from_algebraic(cap.get(5)?.as_str())?;
            let promote_to = match cap.get(6) {
                None => None,
                Some(m) => Some(PieceKind::from_algebraic_char(as_single_char(m.as_str())?)?),
            };
            let mark = parse_mark(cap.get(7).map_or("", |m| m.as_str()));
            let mv = AlgebraicMove {
                piece_kind,
                from_file,
                from_rank,
                capturing,
                to,
                promote_to,
            };
            Some((AlgebraicTurn::Move(mv), mark))
        } else if let Some(cap) = castling_re.captures(notation) {
            let side = if cap.get(1)?.as_str().len() == 5 {
                CastleSide::QueenSide
            } else {
                CastleSide::KingSide
            };
            let mark = parse_mark(cap.get(2).map_or("", |m| m.as_str()));
            Some((AlgebraicTurn::Castle(side), mark))
        } else {
            None
        }
    }

    pub fn format(&self, charset: AlgebraicCharset, mark: CheckMark) -> String {
        let body = match self {
            AlgebraicTurn::Move(mv) => {
                let capture_notation = match charset {
                    AlgebraicCharset::Ascii => "x",
                    AlgebraicCharset::AuxiliaryUnicode => "×",
                };
                let mut from = String::new();
                if let Some(file) = mv.from_file {
                    from.push(file.to_algebraic())
                };
                if let Some(rank) = mv.from_rank {
                    from.push(rank.to_algebraic())
                };
                let promotion = match mv.promote_to {
                    Some(piece_kind) => format!("={}", piece_kind.to_full_algebraic()),
                    None => String::new(),
                };
                format!(
                    "{}{}{}{}{}",
                    mv.piece_kind.to_algebraic_for_move(),
                    from,
                    if mv.capturing { capture_notation } else { "" },
                    mv.to.to_algebraic(),
                    promotion,
                )
            }
            AlgebraicTurn::Castle(side) => side.notation().to_owned(),
        };
        format!("{}{}", body, mark.suffix())
    }
}
