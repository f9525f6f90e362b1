//! Cell addressing.
//!
//! An `Addr` identifies a cell by 0-based (row, col) coordinates, bounded by
//! `MAX_ROWS`/`MAX_COLS`. The reserved sentinel `Addr::NONE` means "no
//! address" and fails every validity check.
//!
//! The human-readable wire format is A1-style: a bijective base-26 column
//! letter group (A=1 .. Z=26, AA=27, ...) followed by a 1-based row number.

use serde::{Deserialize, Serialize};

/// Maximum number of rows a sheet can address.
pub const MAX_ROWS: i32 = 16384;
/// Maximum number of columns a sheet can address.
pub const MAX_COLS: i32 = 16384;

const LETTERS: i64 = 26;

/// A cell address: 0-based row and column.
///
/// Ordered by (row, col) so iteration over address collections is
/// deterministic; the ordering carries no other meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Addr {
    /// Row index (0-based)
    pub row: i32,
    /// Column index (0-based)
    pub col: i32,
}

impl Addr {
    /// The "no address" sentinel. Never a valid key.
    pub const NONE: Addr = Addr { row: -1, col: -1 };

    #[inline]
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// True if this address lies inside the sheet bounds.
    ///
    /// The sentinel and any negative or out-of-bounds coordinate are invalid.
    pub fn is_valid(&self) -> bool {
        self.row >= 0 && self.col >= 0 && self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Render as an A1-style reference, e.g. `(0,0)` → `"A1"`.
    ///
    /// Invalid addresses render as the empty string.
    pub fn to_a1(&self) -> String {
        if !self.is_valid() {
            return String::new();
        }
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }

    /// Parse an A1-style reference.
    ///
    /// Input that does not match the grammar (uppercase letters followed by a
    /// row number without a leading zero) or that addresses a cell outside
    /// the sheet bounds decodes to `Addr::NONE`.
    pub fn from_a1(s: &str) -> Addr {
        let letters_len = s.bytes().take_while(|b| b.is_ascii_uppercase()).count();
        let (letters, digits) = s.split_at(letters_len);

        // XFD (16384 columns) is the widest valid letter group.
        if letters.is_empty() || letters.len() > 3 || digits.is_empty() {
            return Addr::NONE;
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.starts_with('0') {
            return Addr::NONE;
        }

        let mut col: i64 = 0;
        for b in letters.bytes() {
            col = col * LETTERS + i64::from(b - b'A' + 1);
        }
        let row: i64 = match digits.parse() {
            Ok(n) => n,
            Err(_) => return Addr::NONE,
        };
        // Reject before narrowing; a huge row number must not wrap into range.
        if row > i64::from(MAX_ROWS) {
            return Addr::NONE;
        }

        let addr = Addr::new((row - 1) as i32, (col - 1) as i32);
        if addr.is_valid() {
            addr
        } else {
            Addr::NONE
        }
    }
}

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

/// Convert a 0-based column index to its bijective base-26 letter group.
fn col_to_letters(col: i32) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Printable extents of a sheet, expressed as exclusive row/column counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }
}
