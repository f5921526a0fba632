/// Indexing convention for sparse structure entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexStyle {
    /// Indices start at 0 (C style).
    #[default]
    Zero,

    /// Indices start at 1 (Fortran style).
    One,
}

impl IndexStyle {
    /// Returns the smallest valid index under this convention.
    #[must_use]
    pub fn offset(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Converts an index in this convention to a zero-based index.
    ///
    /// Returns `None` for `0` under [`IndexStyle::One`].
    #[must_use]
    pub fn to_zero_based(self, index: usize) -> Option<usize> {
        index.checked_sub(self.offset())
    }
}

/// Problem dimensions reported by [`NlpProblem::info`].
///
/// [`NlpProblem::info`]: crate::NlpProblem::info
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NlpInfo {
    /// Number of variables (`n`).
    pub num_variables: usize,

    /// Number of constraints (`m`).
    pub num_constraints: usize,

    /// Number of nonzeros in the constraint Jacobian.
    pub jacobian_nonzeros: usize,

    /// Number of nonzeros in one triangle of the Lagrangian Hessian.
    pub hessian_nonzeros: usize,

    /// Indexing convention used by the structure queries.
    pub index_style: IndexStyle,
}

impl NlpInfo {
    /// Creates dimensions for a problem without constraints.
    #[must_use]
    pub fn unconstrained(num_variables: usize, hessian_nonzeros: usize) -> Self {
        Self {
            num_variables,
            num_constraints: 0,
            jacobian_nonzeros: 0,
            hessian_nonzeros,
            index_style: IndexStyle::Zero,
        }
    }
}
