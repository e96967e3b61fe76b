#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod algebraic;
pub mod board;
pub mod chess_move;
pub mod clock;
pub mod coord;
pub mod display;
pub mod error;
pub mod fen;
pub mod force;
pub mod game;
pub mod grid;
pub mod janitor;
pub mod pgn;
pub mod piece;
pub mod rules;
pub mod starter;
pub mod utc_time;
pub mod util;
pub mod validator;

pub use board::Board;
pub use chess_move::{MoveFlags, MoveInput, MoveRequest, ResolvedMove};
pub use clock::{Clock, GameInstant, MillisDuration, TimeControl};
pub use coord::{Coord, File, Rank};
pub use error::TurnError;
pub use force::Force;
pub use game::{ChessGame, DrawReason, GameResult, GameState, GameStatus, VictoryReason};
pub use piece::{CastleSide, Piece, PieceKind};
pub use rules::{ChessRules, DrawRules, GameOptions};
pub use validator::MoveValidator;
