use std::{fmt, ops};

use ndarray::{Array, Array2};
use serde::{Deserialize, Serialize};

use crate::coord::{Coord, NUM_FILES, NUM_RANKS};
use crate::piece::{Piece, piece_to_ascii};


// Square storage. Each cell exclusively owns at most one piece. Keeping `Piece::coord` in sync
// with the cell is the job of `Board`, which is the only writer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    data: Array2<Option<Piece>>,
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            data: Array::from_elem((NUM_RANKS as usize, NUM_FILES as usize), None),
        }
    }

    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ { self.data.iter().flatten().copied() }
}

impl ops::Index<Coord> for Grid {
    type Output = Option<Piece>;
    fn index(&self, pos: Coord) -> &Self::Output { &self.data[coord_to_index(pos)] }
}

impl ops::IndexMut<Coord> for Grid {
    fn index_mut(&mut self, pos: Coord) -> &mut Self::Output { &mut self.data[coord_to_index(pos)] }
}

// `Coord` is always in bounds, so indexing never fails.
fn coord_to_index(pos: Coord) -> [usize; 2] {
    [pos.rank.to_zero_based() as usize, pos.file.to_zero_based() as usize]
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Grid ")?;
        f.debug_map()
            .entries(Coord::all().filter_map(|coord| {
                self[coord].map(|piece| {
                    let moved = if piece.has_moved { "*" } else { "" };
                    (coord.to_algebraic(), format!("{}{}", piece_to_ascii(piece.kind, piece.force), moved))
                })
            }))
            .finish()
    }
}
