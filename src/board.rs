use std::fmt;
use std::num::NonZeroU8;

use itertools::iproduct;
use thiserror::Error;

/// The largest supported board size. Values are stored as [NonZeroU8],
/// so N can't exceed 255; 16 (k=4) is the largest size that is practical
/// to solve anyway.
pub const MAX_SIZE: usize = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board size {size} is not a perfect square")]
    InvalidSize { size: usize },

    #[error("Board size {size} exceeds the supported maximum {max}")]
    SizeTooLarge { size: usize, max: usize },

    #[error("Expected {expected} cells, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },

    #[error("Value {value} at ({col}, {row}) is outside 1..={max}")]
    ValueOutOfRange {
        col: usize,
        row: usize,
        value: u8,
        max: usize,
    },

    #[error("Cell ({col}, {row}) is a given and cannot be overwritten")]
    ImmutableCell { col: usize, row: usize },

    #[error("Invalid cell character {0:?} in board literal")]
    InvalidCellChar(char),
}

/// A single cell of the board. Givens are operator-supplied and immutable
/// during solving; derived values are assigned and retracted by the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Given(NonZeroU8),
    Derived(NonZeroU8),
}

impl Cell {
    #[inline]
    pub fn value(self) -> Option<NonZeroU8> {
        match self {
            Cell::Empty => None,
            Cell::Given(v) | Cell::Derived(v) => Some(v),
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }

    #[inline]
    pub fn is_given(self) -> bool {
        matches!(self, Cell::Given(_))
    }
}

/// A [Board] is an N×N sudoku board where N = k² for the box size k.
/// Each cell holds a value in 1..=N or is empty, and is tagged with its
/// origin (given vs. derived). A board is built fresh for every solve
/// attempt and discarded afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    box_size: usize,
    // Column-major: cells[col * size + row]. This matches the order in
    // which the solver visits cells.
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a board from a dense column-major snapshot of the visible
    /// grid. Every `Some` input becomes a given, every `None` an empty
    /// derived cell.
    pub fn from_givens(size: usize, givens: &[Option<NonZeroU8>]) -> Result<Self, BoardError> {
        let box_size = box_size_for(size)?;
        if givens.len() != size * size {
            return Err(BoardError::CellCountMismatch {
                expected: size * size,
                actual: givens.len(),
            });
        }

        let mut cells = Vec::with_capacity(size * size);
        for (i, given) in givens.iter().enumerate() {
            match given {
                None => cells.push(Cell::Empty),
                Some(value) => {
                    if usize::from(value.get()) > size {
                        return Err(BoardError::ValueOutOfRange {
                            col: i / size,
                            row: i % size,
                            value: value.get(),
                            max: size,
                        });
                    }
                    cells.push(Cell::Given(*value));
                }
            }
        }

        Ok(Self {
            size,
            box_size,
            cells,
        })
    }

    pub fn new_empty(size: usize) -> Result<Self, BoardError> {
        let box_size = box_size_for(size)?;
        Ok(Self {
            size,
            box_size,
            cells: vec![Cell::Empty; size * size],
        })
    }

    /// Parses a board literal. Whitespace is ignored, `_` and `.` are empty
    /// cells, `1`..`9` and `a`..`g` are values 1..16. The board size is
    /// inferred from the number of cells.
    pub fn from_str(s: &str) -> Result<Self, BoardError> {
        let mut givens = Vec::new();
        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }
            givens.push(parse_cell_char(c)?);
        }
        let size = isqrt(givens.len());
        if size * size != givens.len() {
            return Err(BoardError::CellCountMismatch {
                expected: size * size,
                actual: givens.len(),
            });
        }
        // Literals are written row by row; storage is column-major.
        let mut transposed = vec![None; givens.len()];
        for (col, row) in iproduct!(0..size, 0..size) {
            transposed[col * size + row] = givens[row * size + col];
        }
        Self::from_givens(size, &transposed)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn box_size(&self) -> usize {
        self.box_size
    }

    #[inline]
    fn index(&self, col: usize, row: usize) -> usize {
        assert!(col < self.size && row < self.size);
        col * self.size + row
    }

    #[inline]
    pub fn cell(&self, col: usize, row: usize) -> Cell {
        self.cells[self.index(col, row)]
    }

    #[inline]
    pub fn value(&self, col: usize, row: usize) -> Option<NonZeroU8> {
        self.cell(col, row).value()
    }

    /// Sets or clears a derived cell. Fails on a given cell: the solver
    /// never writes to givens, so hitting this from the search would be a
    /// bug, but external callers get a proper error.
    pub fn set(
        &mut self,
        col: usize,
        row: usize,
        value: Option<NonZeroU8>,
    ) -> Result<(), BoardError> {
        if self.cell(col, row).is_given() {
            return Err(BoardError::ImmutableCell { col, row });
        }
        if let Some(value) = value {
            if usize::from(value.get()) > self.size {
                return Err(BoardError::ValueOutOfRange {
                    col,
                    row,
                    value: value.get(),
                    max: self.size,
                });
            }
        }
        let index = self.index(col, row);
        self.cells[index] = match value {
            None => Cell::Empty,
            Some(value) => Cell::Derived(value),
        };
        Ok(())
    }

    /// Internal mutator for the search loop, which only ever touches
    /// non-given cells it has visited itself.
    #[inline]
    pub(crate) fn set_derived(&mut self, col: usize, row: usize, value: Option<NonZeroU8>) {
        let index = self.index(col, row);
        assert!(
            !self.cells[index].is_given(),
            "attempted to overwrite a given cell"
        );
        self.cells[index] = match value {
            None => Cell::Empty,
            Some(value) => Cell::Derived(value),
        };
    }

    /// All coordinates in visiting order: rows advance before columns.
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> {
        let size = self.size;
        iproduct!(0..size, 0..size)
    }

    pub fn is_filled(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn num_empty(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            if row > 0 && row % self.box_size == 0 {
                writeln!(f)?;
            }
            for col in 0..self.size {
                if col > 0 {
                    write!(f, "{}", if col % self.box_size == 0 { "  " } else { " " })?;
                }
                match self.value(col, row) {
                    None => write!(f, "_")?,
                    Some(value) => write!(f, "{}", cell_char(value))?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

fn box_size_for(size: usize) -> Result<usize, BoardError> {
    let k = isqrt(size);
    if size == 0 || k * k != size {
        return Err(BoardError::InvalidSize { size });
    }
    if size > MAX_SIZE {
        return Err(BoardError::SizeTooLarge {
            size,
            max: MAX_SIZE,
        });
    }
    Ok(k)
}

fn isqrt(n: usize) -> usize {
    let mut k = 0;
    while (k + 1) * (k + 1) <= n {
        k += 1;
    }
    k
}

fn parse_cell_char(c: char) -> Result<Option<NonZeroU8>, BoardError> {
    let value = match c {
        '_' | '.' => return Ok(None),
        '1'..='9' => c as u8 - b'0',
        'a'..='g' => c as u8 - b'a' + 10,
        _ => return Err(BoardError::InvalidCellChar(c)),
    };
    Ok(Some(NonZeroU8::new(value).unwrap()))
}

fn cell_char(value: NonZeroU8) -> char {
    match value.get() {
        v @ 1..=9 => (b'0' + v) as char,
        v @ 10..=16 => (b'a' + v - 10) as char,
        v => unreachable!("cell value {v} out of range"),
    }
}
