/// Which parts of a starting point the solver is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartRequest {
    /// The solver wants an initial iterate.
    pub init_x: bool,

    /// The solver wants initial bound multipliers.
    pub init_z: bool,

    /// The solver wants initial constraint multipliers.
    pub init_lambda: bool,
}

impl StartRequest {
    /// Requests only the primal iterate.
    #[must_use]
    pub fn primal() -> Self {
        Self {
            init_x: true,
            init_z: false,
            init_lambda: false,
        }
    }
}

/// An initial iterate and optional multiplier estimates.
///
/// Any part left as `None` is filled in by the solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartingPoint {
    /// Initial iterate, length `n`.
    pub x: Option<Vec<f64>>,

    /// Initial lower and upper bound multipliers, each of length `n`.
    pub z: Option<(Vec<f64>, Vec<f64>)>,

    /// Initial constraint multipliers, length `m`.
    pub lambda: Option<Vec<f64>>,
}

impl StartingPoint {
    /// Creates a starting point with only an initial iterate.
    #[must_use]
    pub fn from_x(x: Vec<f64>) -> Self {
        Self {
            x: Some(x),
            ..Self::default()
        }
    }

    /// Adds bound multiplier estimates.
    #[must_use]
    pub fn with_bound_multipliers(mut self, z_lower: Vec<f64>, z_upper: Vec<f64>) -> Self {
        self.z = Some((z_lower, z_upper));
        self
    }

    /// Adds constraint multiplier estimates.
    #[must_use]
    pub fn with_constraint_multipliers(mut self, lambda: Vec<f64>) -> Self {
        self.lambda = Some(lambda);
        self
    }
}
