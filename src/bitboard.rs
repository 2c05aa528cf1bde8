//! A fixed-size cell mask using const generics.
//!
//! Boards are represented as an `N×N` grid packed into an unsigned integer
//! `T`, indexed row-major (`y * N + x`). Masks are plain values: every board
//! view in the crate (targeted cells, ship footprints, no-touch halos) is
//! derived by combining them with the bitwise operators below.

use core::fmt;
use core::ops::{BitAnd, BitOr, Not};
use num_traits::{PrimInt, Unsigned, Zero};
use thiserror::Error;

use crate::common::Coord;

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BitBoardError {
    /// Coordinate lies outside `[0, N)` on either axis.
    #[error("coordinate ({x}, {y}) is out of bounds")]
    OutOfBounds { x: u8, y: u8 },
}

/// A fixed-size N×N bitboard stored in the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    const CELLS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::CELLS == T::zero().count_zeros() as usize {
            !T::zero()
        } else {
            (T::one() << Self::CELLS) - T::one()
        }
    }

    #[inline]
    fn index(coord: Coord) -> Result<usize, BitBoardError> {
        if (coord.x as usize) < N && (coord.y as usize) < N {
            Ok(coord.y as usize * N + coord.x as usize)
        } else {
            Err(BitBoardError::OutOfBounds {
                x: coord.x,
                y: coord.y,
            })
        }
    }

    /// Empty board.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Board with every cell set.
    #[inline]
    pub fn full() -> Self {
        BitBoard { bits: Self::mask() }
    }

    /// Number of set cells.
    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// Whether `coord` is set. Out-of-bounds coordinates are never set.
    pub fn contains(&self, coord: Coord) -> bool {
        match Self::index(coord) {
            Ok(idx) => ((self.bits >> idx) & T::one()) != T::zero(),
            Err(_) => false,
        }
    }

    /// Sets the cell at `coord`.
    pub fn set(&mut self, coord: Coord) -> Result<(), BitBoardError> {
        let idx = Self::index(coord)?;
        self.bits = self.bits | (T::one() << idx);
        Ok(())
    }

    /// Clears the cell at `coord`.
    pub fn clear(&mut self, coord: Coord) -> Result<(), BitBoardError> {
        let idx = Self::index(coord)?;
        self.bits = self.bits & !(T::one() << idx);
        Ok(())
    }

    /// Builds a board from an iterator of coordinates.
    pub fn from_coords<I>(coords: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = Coord>,
    {
        let mut board = Self::new();
        for coord in coords {
            board.set(coord)?;
        }
        Ok(board)
    }

    /// True when the two masks share no cell.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        (*self & *other).is_empty()
    }

    /// The mask grown by one cell in all eight directions, clipped to the
    /// board. Used to express the no-touch rule as a single intersection.
    pub fn halo(&self) -> Self {
        let mut grown = *self;
        for coord in self.iter() {
            for n in coord.neighbors8() {
                // neighbors8 only yields in-bounds cells
                let _ = grown.set(n);
            }
        }
        grown
    }

    /// Iterator over set cells in row-major order.
    pub fn iter(&self) -> Cells<'_, T, N> {
        Cells { board: self, idx: 0 }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BitBoard<{}>:", N)?;
        for y in 0..N {
            for x in 0..N {
                let set = self.contains(Coord::new(x as u8, y as u8));
                write!(f, "{} ", if set { '■' } else { '□' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Iterator over the set cells of a bitboard.
pub struct Cells<'a, T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    board: &'a BitBoard<T, N>,
    idx: usize,
}

impl<T, const N: usize> Iterator for Cells<'_, T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = Coord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if ((self.board.bits >> idx) & T::one()) != T::zero() {
                return Some(Coord::new((idx % N) as u8, (idx / N) as u8));
            }
        }
        None
    }
}

impl<T, const N: usize> BitAnd for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits & rhs.bits,
        }
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Complement within board bounds.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn not(self) -> Self {
        BitBoard {
            bits: !self.bits & Self::mask(),
        }
    }
}
