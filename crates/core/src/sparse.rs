/// One nonzero position in a sparse matrix.
///
/// Indices follow the problem's [`IndexStyle`](crate::IndexStyle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entry {
    pub row: usize,
    pub col: usize,
}

impl Entry {
    /// Creates an entry at `(row, col)`.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the mirrored entry `(col, row)`.
    #[must_use]
    pub const fn transposed(self) -> Self {
        Self {
            row: self.col,
            col: self.row,
        }
    }

    /// Returns true if the entry is on the diagonal.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        self.row == self.col
    }
}
