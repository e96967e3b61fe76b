use std::fmt;

use enum_map::Enum;
use serde::{Deserialize, Serialize};
use strum::EnumIter;


#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Enum, EnumIter, Serialize, Deserialize,
)]
pub enum Force {
    White,
    Black,
}

impl Force {
    pub fn opponent(self) -> Force {
        match self {
            Force::White => Force::Black,
            Force::Black => Force::White,
        }
    }

    // Rank direction in which pawns of this force advance.
    pub fn forward(self) -> i8 {
        match self {
            Force::White => 1,
            Force::Black => -1,
        }
    }

    pub fn to_fen(self) -> char {
        match self {
            Force::White => 'w',
            Force::Black => 'b',
        }
    }

    pub fn from_fen(ch: char) -> Option<Self> {
        match ch {
            'w' => Some(Force::White),
            'b' => Some(Force::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Force {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Force::White => write!(f, "white"),
            Force::Black => write!(f, "black"),
        }
    }
}
