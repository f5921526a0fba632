use std::ops::Bound;

use crate::{
    contract::BoundInfinity,
    derivative_check::{CheckConfig, DerivativeTest},
    options::{ConfigError, OptionSpec, Options, validate},
};

const PRINT_LEVEL: OptionSpec = OptionSpec::int("print_level", 0, 12, 5);
const TOL: OptionSpec = OptionSpec::positive("tol", 1e-8);
const ACCEPTABLE_TOL: OptionSpec = OptionSpec::positive("acceptable_tol", 1e-6);
const ACCEPTABLE_ITER: OptionSpec = OptionSpec::int("acceptable_iter", 0, i32::MAX, 15);
const MAX_ITER: OptionSpec = OptionSpec::int("max_iter", 0, i32::MAX, 3000);
const MAX_WALL_TIME: OptionSpec = OptionSpec::positive("max_wall_time", 1e20);
const LOWER_BOUND_INF: OptionSpec =
    OptionSpec::num("nlp_lower_bound_inf", Bound::Unbounded, Bound::Unbounded, -1e19);
const UPPER_BOUND_INF: OptionSpec =
    OptionSpec::num("nlp_upper_bound_inf", Bound::Unbounded, Bound::Unbounded, 1e19);
const DIVERGING_ITERATES_TOL: OptionSpec = OptionSpec::positive("diverging_iterates_tol", 1e20);
const ALPHA_RED_FACTOR: OptionSpec = OptionSpec::num(
    "alpha_red_factor",
    Bound::Excluded(0.0),
    Bound::Excluded(1.0),
    0.5,
);
const DERIVATIVE_TEST: OptionSpec =
    OptionSpec::choice("derivative_test", DerivativeTest::CHOICES, "none");
const DERIVATIVE_TEST_PERTURBATION: OptionSpec =
    OptionSpec::positive("derivative_test_perturbation", 1e-8);
const DERIVATIVE_TEST_TOL: OptionSpec = OptionSpec::positive("derivative_test_tol", 1e-4);

/// Options recognized by the projected Newton backend.
pub const OPTIONS: &[OptionSpec] = &[
    PRINT_LEVEL,
    TOL,
    ACCEPTABLE_TOL,
    ACCEPTABLE_ITER,
    MAX_ITER,
    MAX_WALL_TIME,
    LOWER_BOUND_INF,
    UPPER_BOUND_INF,
    DIVERGING_ITERATES_TOL,
    ALPHA_RED_FACTOR,
    DERIVATIVE_TEST,
    DERIVATIVE_TEST_PERTURBATION,
    DERIVATIVE_TEST_TOL,
];

/// Configuration for the projected Newton backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    print_level: u8,
    tol: f64,
    acceptable_tol: f64,
    acceptable_iter: usize,
    max_iter: usize,
    max_wall_time: f64,
    bound_infinity: BoundInfinity,
    diverging_iterates_tol: f64,
    alpha_red_factor: f64,
    derivative_check: CheckConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::read(&Options::new())
    }
}

impl Config {
    /// Builds a config from `options`, using defaults for unset names.
    ///
    /// # Errors
    ///
    /// Returns an error if an option is unknown, has the wrong type or is
    /// out of range, or if `nlp_lower_bound_inf` is not below
    /// `nlp_upper_bound_inf`.
    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        validate(options, OPTIONS)?;

        let config = Self::read(options);
        if config.bound_infinity.lower >= config.bound_infinity.upper {
            return Err(ConfigError::Inconsistent {
                reason: "nlp_lower_bound_inf must be less than nlp_upper_bound_inf",
            });
        }
        Ok(config)
    }

    /// Reads every option, assuming the mapping has been validated.
    fn read(options: &Options) -> Self {
        let count = |spec: &OptionSpec| usize::try_from(options.int(spec)).unwrap_or_default();

        Self {
            print_level: u8::try_from(options.int(&PRINT_LEVEL)).unwrap_or_default(),
            tol: options.num(&TOL),
            acceptable_tol: options.num(&ACCEPTABLE_TOL),
            acceptable_iter: count(&ACCEPTABLE_ITER),
            max_iter: count(&MAX_ITER),
            max_wall_time: options.num(&MAX_WALL_TIME),
            bound_infinity: BoundInfinity {
                lower: options.num(&LOWER_BOUND_INF),
                upper: options.num(&UPPER_BOUND_INF),
            },
            diverging_iterates_tol: options.num(&DIVERGING_ITERATES_TOL),
            alpha_red_factor: options.num(&ALPHA_RED_FACTOR),
            derivative_check: CheckConfig::new(
                DerivativeTest::from_name(options.choice(&DERIVATIVE_TEST)).unwrap_or_default(),
                options.num(&DERIVATIVE_TEST_PERTURBATION),
                options.num(&DERIVATIVE_TEST_TOL),
            ),
        }
    }

    /// Returns the output verbosity, 0 (silent) to 12.
    #[must_use]
    pub fn print_level(&self) -> u8 {
        self.print_level
    }

    /// Returns the optimality tolerance.
    #[must_use]
    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Returns the acceptable optimality tolerance.
    #[must_use]
    pub fn acceptable_tol(&self) -> f64 {
        self.acceptable_tol
    }

    /// Returns how many consecutive acceptable iterations end the solve.
    ///
    /// Zero disables the acceptable termination test.
    #[must_use]
    pub fn acceptable_iter(&self) -> usize {
        self.acceptable_iter
    }

    /// Returns the maximum number of iterations.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Returns the wall-clock limit in seconds.
    #[must_use]
    pub fn max_wall_time(&self) -> f64 {
        self.max_wall_time
    }

    /// Returns the thresholds beyond which bounds count as absent.
    #[must_use]
    pub fn bound_infinity(&self) -> BoundInfinity {
        self.bound_infinity
    }

    /// Returns the magnitude above which iterates count as diverging.
    #[must_use]
    pub fn diverging_iterates_tol(&self) -> f64 {
        self.diverging_iterates_tol
    }

    /// Returns the backtracking factor of the line search.
    #[must_use]
    pub fn alpha_red_factor(&self) -> f64 {
        self.alpha_red_factor
    }

    /// Returns the derivative check to run at the starting point.
    #[must_use]
    pub fn derivative_check(&self) -> &CheckConfig {
        &self.derivative_check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::options::OptionValue;

    #[test]
    fn defaults_match_unset_options() {
        let config = Config::from_options(&Options::new()).expect("defaults are valid");

        assert_eq!(config, Config::default());
        assert_eq!(config.print_level(), 5);
        assert_relative_eq!(config.tol(), 1e-8);
        assert_eq!(config.acceptable_iter(), 15);
        assert_eq!(config.max_iter(), 3000);
        assert_relative_eq!(config.alpha_red_factor(), 0.5);
        assert_eq!(config.bound_infinity(), BoundInfinity::default());
        assert_eq!(config.derivative_check().test, DerivativeTest::None);
    }

    #[test]
    fn reads_set_options() {
        let mut options = Options::new();
        options
            .set("print_level", 0)
            .set("tol", 1e-10)
            .set("max_iter", 20)
            .set("max_wall_time", 3)
            .set("derivative_test", "second-order");

        let config = Config::from_options(&options).expect("valid options");

        assert_eq!(config.print_level(), 0);
        assert_relative_eq!(config.tol(), 1e-10);
        assert_eq!(config.max_iter(), 20);
        assert_relative_eq!(config.max_wall_time(), 3.0);
        assert_eq!(config.derivative_check().test, DerivativeTest::SecondOrder);
    }

    #[test]
    fn rejects_out_of_range_factor() {
        let mut options = Options::new();
        options.set("alpha_red_factor", 1.0);

        assert_eq!(
            Config::from_options(&options),
            Err(ConfigError::OutOfRange {
                name: "alpha_red_factor".into(),
                value: OptionValue::Num(1.0),
            })
        );
    }

    #[test]
    fn rejects_options_of_other_backends() {
        let mut options = Options::new();
        options.set("linear_solver", "mumps");

        assert!(matches!(
            Config::from_options(&options),
            Err(ConfigError::UnknownOption { name }) if name == "linear_solver"
        ));
    }

    #[test]
    fn rejects_crossed_infinity_thresholds() {
        let mut options = Options::new();
        options
            .set("nlp_lower_bound_inf", 5.0)
            .set("nlp_upper_bound_inf", -5.0);

        assert!(matches!(
            Config::from_options(&options),
            Err(ConfigError::Inconsistent { .. })
        ));
    }
}
