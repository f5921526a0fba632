/// Magnitude at or beyond which a bound is treated as absent.
///
/// Solvers may override this threshold, but problems should use it (or
/// `f64::INFINITY`) to express "no bound".
pub const BOUND_INFINITY: f64 = 1e19;

/// Lower and upper bounds on variables and constraints.
///
/// Variable arrays have length `n`, constraint arrays length `m`.
/// Equal lower and upper bounds fix a variable or make a constraint an
/// equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub x_lower: Vec<f64>,
    pub x_upper: Vec<f64>,
    pub g_lower: Vec<f64>,
    pub g_upper: Vec<f64>,
}

impl Bounds {
    /// Creates variable bounds for a problem without constraints.
    #[must_use]
    pub fn new(x_lower: Vec<f64>, x_upper: Vec<f64>) -> Self {
        Self {
            x_lower,
            x_upper,
            g_lower: Vec::new(),
            g_upper: Vec::new(),
        }
    }

    /// Creates `n` variables with no effective bounds.
    #[must_use]
    pub fn free(n: usize) -> Self {
        Self::new(vec![-BOUND_INFINITY; n], vec![BOUND_INFINITY; n])
    }

    /// Adds constraint bounds.
    #[must_use]
    pub fn with_constraints(mut self, g_lower: Vec<f64>, g_upper: Vec<f64>) -> Self {
        self.g_lower = g_lower;
        self.g_upper = g_upper;
        self
    }
}
