//! Numpad key mapping for grid navigation
//!
//! Maps the digits 1-9 onto the cells of a 3x3 grid the way they sit on
//! a numeric keypad:
//!
//! ```text
//! 7 8 9
//! 4 5 6
//! 1 2 3
//! ```
//!
//! Pure and testable without Win32.

use crate::domain::grid::GridError;

/// Grid coordinates representing (row, col) position
///
/// Zero-based from the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCoords {
    pub row: u32,
    pub col: u32,
}

impl GridCoords {
    /// Creates new grid coordinates
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// A validated numpad digit in `1..=9`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumpadKey(u8);

impl NumpadKey {
    /// Keys in display order, matching the cell order of `Region::subdivide`
    pub const LAYOUT: [NumpadKey; 9] = [
        NumpadKey(7),
        NumpadKey(8),
        NumpadKey(9),
        NumpadKey(4),
        NumpadKey(5),
        NumpadKey(6),
        NumpadKey(1),
        NumpadKey(2),
        NumpadKey(3),
    ];

    /// Validates a digit
    ///
    /// # Example
    /// ```rust
    /// use numgrid::domain::keyboard::NumpadKey;
    ///
    /// assert_eq!(NumpadKey::new(5).unwrap().cell_index(), 4);
    /// assert!(NumpadKey::new(0).is_err());
    /// ```
    pub fn new(digit: u8) -> Result<Self, GridError> {
        if (1..=9).contains(&digit) {
            Ok(Self(digit))
        } else {
            Err(GridError::InvalidKey(digit))
        }
    }

    /// Parses a '1'..'9' character
    pub fn from_char(ch: char) -> Option<Self> {
        ch.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .and_then(|d| Self::new(d).ok())
    }

    pub fn digit(self) -> u8 {
        self.0
    }

    /// Grid coordinates of the cell this key selects
    pub fn coords(self) -> GridCoords {
        let zero_based = u32::from(self.0 - 1);
        GridCoords::new(2 - zero_based / 3, zero_based % 3)
    }

    /// Row-major index into the nine cells of a subdivision
    pub fn cell_index(self) -> usize {
        let coords = self.coords();
        (coords.row * 3 + coords.col) as usize
    }

    /// Key for a row-major cell index
    pub fn from_cell_index(index: usize) -> Option<Self> {
        Self::LAYOUT.get(index).copied()
    }

    /// Character drawn on the overlay for this key
    pub fn label(self) -> char {
        char::from(b'0' + self.0)
    }

    /// Labels for all nine cells in display order
    pub fn labels() -> [char; 9] {
        Self::LAYOUT.map(NumpadKey::label)
    }
}
