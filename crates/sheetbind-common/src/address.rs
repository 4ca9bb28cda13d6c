//! Grid addresses and rectangular regions.
//!
//! `CellAddress` is a 0-based (row, column) pair with the same limits as Excel:
//! 1,048,576 rows × 16,384 columns. Addresses parse from and display as A1-style
//! text (`"C4"`), regions as `"A1:B2"`. Ordering is row-major so iteration over
//! address collections is deterministic.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ROW_BITS: u32 = 20;
const COL_BITS: u32 = 14;
/// Highest valid 0-based row index.
pub const ROW_MAX: u32 = (1 << ROW_BITS) - 1;
/// Highest valid 0-based column index.
pub const COL_MAX: u32 = (1 << COL_BITS) - 1;

/// Errors returned when constructing addresses from unchecked inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressError {
    RowOverflow(i64),
    ColOverflow(i64),
    NegativeRow(i64),
    NegativeCol(i64),
    MalformedA1(String),
    UnorderedRegion(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::RowOverflow(row) => write!(f, "row {row} exceeds {ROW_MAX}"),
            AddressError::ColOverflow(col) => write!(f, "col {col} exceeds {COL_MAX}"),
            AddressError::NegativeRow(row) => write!(f, "row {row} is negative"),
            AddressError::NegativeCol(col) => write!(f, "col {col} is negative"),
            AddressError::MalformedA1(text) => write!(f, "malformed A1 address `{text}`"),
            AddressError::UnorderedRegion(text) => {
                write!(f, "region `{text}` must be ordered: start <= end")
            }
        }
    }
}

impl std::error::Error for AddressError {}

/// Absolute 0-based grid coordinate (row, column).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellAddress {
    pub row: u32,
    pub col: u32,
}

impl CellAddress {
    /// Construct an address, panicking if values exceed the supported limits.
    pub fn new(row: u32, col: u32) -> Self {
        assert!(row <= ROW_MAX, "row {row} exceeds {ROW_MAX}");
        assert!(col <= COL_MAX, "col {col} exceeds {COL_MAX}");
        Self { row, col }
    }

    /// Fallible constructor that reports overflow rather than panicking.
    pub fn try_new(row: u32, col: u32) -> Result<Self, AddressError> {
        if row > ROW_MAX {
            return Err(AddressError::RowOverflow(row as i64));
        }
        if col > COL_MAX {
            return Err(AddressError::ColOverflow(col as i64));
        }
        Ok(Self { row, col })
    }

    /// Construct from possibly-negative literals, the shape override documents use.
    pub fn from_literals(row: i64, col: i64) -> Result<Self, AddressError> {
        if row < 0 {
            return Err(AddressError::NegativeRow(row));
        }
        if col < 0 {
            return Err(AddressError::NegativeCol(col));
        }
        if row > ROW_MAX as i64 {
            return Err(AddressError::RowOverflow(row));
        }
        if col > COL_MAX as i64 {
            return Err(AddressError::ColOverflow(col));
        }
        Ok(Self {
            row: row as u32,
            col: col as u32,
        })
    }

    /// Parse an A1-style address such as `C4` or `aa10`.
    pub fn parse_a1(text: &str) -> Result<Self, AddressError> {
        let trimmed = text.trim();
        let split = trimmed
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| AddressError::MalformedA1(text.to_string()))?;
        let (letters, digits) = trimmed.split_at(split);
        let col = letters_to_column_index(letters)
            .ok_or_else(|| AddressError::MalformedA1(text.to_string()))?;
        let row1: u64 = digits
            .parse()
            .map_err(|_| AddressError::MalformedA1(text.to_string()))?;
        if row1 == 0 {
            return Err(AddressError::MalformedA1(text.to_string()));
        }
        let row = row1 - 1;
        if row > ROW_MAX as u64 {
            return Err(AddressError::RowOverflow(row as i64));
        }
        if col > COL_MAX {
            return Err(AddressError::ColOverflow(col as i64));
        }
        Ok(Self {
            row: row as u32,
            col,
        })
    }

    /// Shift by signed deltas, reporting out-of-bounds results.
    pub fn offset(self, drow: i64, dcol: i64) -> Result<Self, AddressError> {
        Self::from_literals(self.row as i64 + drow, self.col as i64 + dcol)
    }

    /// Shift along `direction` by `steps`.
    pub fn step(self, direction: Direction, steps: i64) -> Result<Self, AddressError> {
        let (drow, dcol) = direction.delta();
        self.offset(drow * steps, dcol * steps)
    }

    pub fn col_letters(&self) -> String {
        column_to_letters(self.col)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

impl std::str::FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s)
    }
}

impl From<CellAddress> for (u32, u32) {
    fn from(addr: CellAddress) -> Self {
        (addr.row, addr.col)
    }
}

/// Search/offset direction relative to an anchor cell.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (row, col) delta for one step along this direction.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Layout axis for directional array/table regions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// Advance one row per item (vertical layout).
    Down,
    /// Advance one column per item (horizontal layout).
    Right,
}

impl Axis {
    pub fn direction(self) -> Direction {
        match self {
            Axis::Down => Direction::Down,
            Axis::Right => Direction::Right,
        }
    }
}

/// Inclusive rectangular region of cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl Region {
    pub fn new(start: CellAddress, end: CellAddress) -> Result<Self, AddressError> {
        if start.row > end.row || start.col > end.col {
            return Err(AddressError::UnorderedRegion(format!("{start}:{end}")));
        }
        Ok(Self { start, end })
    }

    /// Parse an `A1:B2` region; a single address denotes a 1×1 region.
    pub fn parse_a1(text: &str) -> Result<Self, AddressError> {
        match text.split_once(':') {
            Some((lhs, rhs)) => {
                let start = CellAddress::parse_a1(lhs)?;
                let end = CellAddress::parse_a1(rhs)?;
                Self::new(start, end)
            }
            None => {
                let addr = CellAddress::parse_a1(text)?;
                Ok(Self {
                    start: addr,
                    end: addr,
                })
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Top-left cell, the anchor merged regions resolve to.
    pub fn anchor(&self) -> CellAddress {
        self.start
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    /// Shift the whole region by signed deltas.
    pub fn offset(&self, drow: i64, dcol: i64) -> Result<Self, AddressError> {
        Ok(Self {
            start: self.start.offset(drow, dcol)?,
            end: self.end.offset(drow, dcol)?,
        })
    }

    /// Row-major iteration over all contained addresses.
    pub fn iter(&self) -> impl Iterator<Item = CellAddress> + '_ {
        let (start, end) = (self.start, self.end);
        (start.row..=end.row)
            .flat_map(move |row| (start.col..=end.col).map(move |col| CellAddress { row, col }))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl std::str::FromStr for Region {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s)
    }
}

fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    String::from_utf8(buf).expect("only ASCII A-Z")
}

fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let val = (ch.to_ascii_uppercase() - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}
