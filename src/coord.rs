use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::force::Force;


pub const NUM_RANKS: u8 = 8;
pub const NUM_FILES: u8 = 8;


const fn const_char_sub(a: char, b: char) -> u8 {
    let a_idx = a as u32;
    let b_idx = b as u32;
    assert!(a_idx >= b_idx);
    let diff = a_idx - b_idx;
    assert!(diff <= u8::MAX as u32);
    diff as u8
}


// Rank from a force's point of view: the first rank is the force's home rank.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct SubjectiveRank {
    idx: u8, // 0-based
}

impl SubjectiveRank {
    pub const fn from_one_based(idx: u8) -> Self {
        assert!(idx >= 1 && idx <= NUM_RANKS);
        Self { idx: idx - 1 }
    }
    pub fn to_rank(self, force: Force) -> Rank {
        match force {
            Force::White => Rank::from_zero_based(self.idx),
            Force::Black => Rank::from_zero_based(NUM_RANKS - self.idx - 1),
        }
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Rank {
    idx: u8, // 0-based
}

impl Rank {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_RANKS);
        Self { idx }
    }
    pub fn try_from_zero_based(idx: i32) -> Option<Self> {
        (0..NUM_RANKS as i32).contains(&idx).then(|| Self { idx: idx as u8 })
    }
    pub const fn from_algebraic_const(ch: char) -> Self {
        Self::from_zero_based(const_char_sub(ch, '1'))
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        ('1'..='8').contains(&ch).then(|| Self::from_algebraic_const(ch))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'1') as char }
    pub fn offset(self, delta: i8) -> Option<Self> {
        Self::try_from_zero_based(self.idx as i32 + delta as i32)
    }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_RANKS).map(Self::from_zero_based)
    }
}


#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct File {
    idx: u8, // 0-based
}

impl File {
    pub const fn from_zero_based(idx: u8) -> Self {
        assert!(idx < NUM_FILES);
        Self { idx }
    }
    pub fn try_from_zero_based(idx: i32) -> Option<Self> {
        (0..NUM_FILES as i32).contains(&idx).then(|| Self { idx: idx as u8 })
    }
    pub const fn from_algebraic_const(ch: char) -> Self {
        Self::from_zero_based(const_char_sub(ch, 'a'))
    }
    pub fn from_algebraic(ch: char) -> Option<Self> {
        ('a'..='h').contains(&ch).then(|| Self::from_algebraic_const(ch))
    }
    pub const fn to_zero_based(self) -> u8 { self.idx }
    pub const fn to_algebraic(self) -> char { (self.idx + b'a') as char }
    pub fn offset(self, delta: i8) -> Option<Self> {
        Self::try_from_zero_based(self.idx as i32 + delta as i32)
    }
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + Clone {
        (0..NUM_FILES).map(Self::from_zero_based)
    }
}


// Always in bounds: out-of-range input is rejected by the fallible constructors rather than
// wrapped or clamped.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Coord {
    pub rank: Rank,
    pub file: File,
}

impl Coord {
    pub const fn new(rank: Rank, file: File) -> Self { Self { rank, file } }

    pub fn try_new(rank: i32, file: i32) -> Option<Self> {
        Some(Self {
            rank: Rank::try_from_zero_based(rank)?,
            file: File::try_from_zero_based(file)?,
        })
    }

    pub fn from_algebraic(s: &str) -> Option<Self> {
        let (file, rank) = s.chars().collect_tuple()?;
        Some(Coord {
            rank: Rank::from_algebraic(rank)?,
            file: File::from_algebraic(file)?,
        })
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", self.file.to_algebraic(), self.rank.to_algebraic())
    }

    pub fn offset(self, (d_rank, d_file): (i8, i8)) -> Option<Self> {
        Some(Self {
            rank: self.rank.offset(d_rank)?,
            file: self.file.offset(d_file)?,
        })
    }

    // (rank delta, file delta) from `other` to `self`.
    pub fn delta_from(self, other: Self) -> (i8, i8) {
        (
            self.rank.to_zero_based() as i8 - other.rank.to_zero_based() as i8,
            self.file.to_zero_based() as i8 - other.file.to_zero_based() as i8,
        )
    }

    pub fn is_light_square(self) -> bool {
        (self.rank.to_zero_based() + self.file.to_zero_based()) % 2 == 1
    }

    pub fn all() -> impl Iterator<Item = Coord> + Clone {
        Rank::all().cartesian_product(File::all()).map(|(rank, file)| Coord { rank, file })
    }
}

pub fn is_valid_position(rank: i32, file: i32) -> bool { Coord::try_new(rank, file).is_some() }

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({})", self.to_algebraic())
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

impl From<Coord> for String {
    fn from(coord: Coord) -> Self { coord.to_algebraic() }
}

impl TryFrom<String> for Coord {
    type Error = String;
    fn try_from(s: String) -> Result<Self, String> {
        Coord::from_algebraic(&s).ok_or_else(|| format!("invalid square: {s}"))
    }
}


impl Rank {
    #![allow(dead_code)]
    pub const _1: Rank = Rank::from_algebraic_const('1');
    pub const _2: Rank = Rank::from_algebraic_const('2');
    pub const _3: Rank = Rank::from_algebraic_const('3');
    pub const _4: Rank = Rank::from_algebraic_const('4');
    pub const _5: Rank = Rank::from_algebraic_const('5');
    pub const _6: Rank = Rank::from_algebraic_const('6');
    pub const _7: Rank = Rank::from_algebraic_const('7');
    pub const _8: Rank = Rank::from_algebraic_const('8');
}

impl File {
    #![allow(dead_code)]
    pub const A: File = File::from_algebraic_const('a');
    pub const B: File = File::from_algebraic_const('b');
    pub const C: File = File::from_algebraic_const('c');
    pub const D: File = File::from_algebraic_const('d');
    pub const E: File = File::from_algebraic_const('e');
    pub const F: File = File::from_algebraic_const('f');
    pub const G: File = File::from_algebraic_const('g');
    pub const H: File = File::from_algebraic_const('h');
}

impl Coord {
    #![allow(dead_code)]
    pub const A1: Coord = Coord::new(Rank::_1, File::A);
    pub const A2: Coord = Coord::new(Rank::_2, File::A);
    pub const A3: Coord = Coord::new(Rank::_3, File::A);
    pub const A4: Coord = Coord::new(Rank::_4, File::A);
    pub const A5: Coord = Coord::new(Rank::_5, File::A);
    pub const A6: Coord = Coord::new(Rank::_6, File::A);
    pub const A7: Coord = Coord::new(Rank::_7, File::A);
    pub const A8: Coord = Coord::new(Rank::_8, File::A);
    pub const B1: Coord = Coord::new(Rank::_1, File::B);
    pub const B2: Coord = Coord::new(Rank::_2, File::B);
    pub const B3: Coord = Coord::new(Rank::_3, File::B);
    pub const B4: Coord = Coord::new(Rank::_4, File::B);
    pub const B5: Coord = Coord::new(Rank::_5, File::B);
    pub const B6: Coord = Coord::new(Rank::_6, File::B);
    pub const B7: Coord = Coord::new(Rank::_7, File::B);
    pub const B8: Coord = Coord::new(Rank::_8, File::B);
    pub const C1: Coord = Coord::new(Rank::_1, File::C);
    pub const C2: Coord = Coord::new(Rank::_2, File::C);
    pub const C3: Coord = Coord::new(Rank::_3, File::C);
    pub const C4: Coord = Coord::new(Rank::_4, File::C);
    pub const C5: Coord = Coord::new(Rank::_5, File::C);
    pub const C6: Coord = Coord::new(Rank::_6, File::C);
    pub const C7: Coord = Coord::new(Rank::_7, File::C);
    pub const C8: Coord = Coord::new(Rank::_8, File::C);
    pub const D1: Coord = Coord::new(Rank::_1, File::D);
    pub const D2: Coord = Coord::new(Rank::_2, File::D);
    pub const D3: Coord = Coord::new(Rank::_3, File::D);
    pub const D4: Coord = Coord::new(Rank::_4, File::D);
    pub const D5: Coord = Coord::new(Rank::_5, File::D);
    pub const D6: Coord = Coord::new(Rank::_6, File::D);
    pub const D7: Coord = Coord::new(Rank::_7, File::D);
    pub const D8: Coord = Coord::new(Rank::_8, File::D);
    pub const E1: Coord = Coord::new(Rank::_1, File::E);
    pub const E2: Coord = Coord::new(Rank::_2, File::E);
    pub const E3: Coord = Coord::new(Rank::_3, File::E);
    pub const E4: Coord = Coord::new(Rank::_4, File::E);
    pub const E5: Coord = Coord::new(Rank::_5, File::E);
    pub const E6: Coord = Coord::new(Rank::_6, File::E);
    pub const E7: Coord = Coord::new(Rank::_7, File::E);
    pub const E8: Coord = Coord::new(Rank::_8, File::E);
    pub const F1: Coord = Coord::new(Rank::_1, File::F);
    pub const F2: Coord = Coord::new(Rank::_2, File::F);
    pub const F3: Coord = Coord::new(Rank::_3, File::F);
    pub const F4: Coord = Coord::new(Rank::_4, File::F);
    pub const F5: Coord = Coord::new(Rank::_5, File::F);
    pub const F6: Coord = Coord::new(Rank::_6, File::F);
    pub const F7: Coord = Coord::new(Rank::_7, File::F);
    pub const F8: Coord = Coord::new(Rank::_8, File::F);
    pub const G1: Coord = Coord::new(Rank::_1, File::G);
    pub const G2: Coord = Coord::new(Rank::_2, File::G);
    pub const G3: Coord = Coord::new(Rank::_3, File::G);
    pub const G4: Coord = Coord::new(Rank::_4, File::G);
    pub const G5: Coord = Coord::new(Rank::_5, File::G);
    pub const G6: Coord = Coord::new(Rank::_6, File::G);
    pub const G7: Coord = Coord::new(Rank::_7, File::G);
    pub const G8: Coord = Coord::new(Rank::_8, File::G);
    pub const H1: Coord = Coord::new(Rank::_1, File::H);
    pub const H2: Coord = Coord::new(Rank::_2, File::H);
    pub const H3: Coord = Coord::new(Rank::_3, File::H);
    pub const H4: Coord = Coord::new(Rank::_4, File::H);
    pub const H5: Coord = Coord::new(Rank::_5, File::H);
    pub const H6: Coord = Coord::new(Rank::_6, File::H);
    pub const H7: Coord = Coord::new(Rank::_7, File::H);
    pub const H8: Coord = Coord::new(Rank::_8, File::H);
}
