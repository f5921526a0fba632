//! Named solver options and their validation.
//!
//! [`Options`] is a plain name → value mapping filled in by the caller.
//! Backends declare the options they recognize as [`OptionSpec`]s and check
//! a mapping against them with [`validate`] before any solve starts.

use std::{
    collections::BTreeMap,
    fmt,
    ops::{Bound, RangeBounds},
};

use thiserror::Error;

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i32),
    Num(f64),
    Str(String),
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Num(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "\"{value}\""),
        }
    }
}

/// Option name → value mapping passed through to a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    values: BTreeMap<String, OptionValue>,
}

impl Options {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, replacing any previous value.
    pub fn set(&mut self, name: &str, value: impl Into<OptionValue>) -> &mut Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Returns the value set for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    /// Iterates over the set options in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of set options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the integer value of `spec`, or its default when unset.
    ///
    /// Assumes the mapping was checked with [`validate`].
    #[must_use]
    pub fn int(&self, spec: &OptionSpec) -> i32 {
        match (self.get(spec.name), spec.kind) {
            (Some(OptionValue::Int(value)), _) => *value,
            (_, OptionKind::Int { default, .. }) => default,
            _ => 0,
        }
    }

    /// Returns the numeric value of `spec`, or its default when unset.
    ///
    /// Integer values are widened. Assumes the mapping was checked with
    /// [`validate`].
    #[must_use]
    pub fn num(&self, spec: &OptionSpec) -> f64 {
        match (self.get(spec.name), spec.kind) {
            (Some(OptionValue::Num(value)), _) => *value,
            (Some(OptionValue::Int(value)), _) => f64::from(*value),
            (_, OptionKind::Num { default, .. }) => default,
            _ => f64::NAN,
        }
    }

    /// Returns the string value of `spec`, or its default when unset.
    ///
    /// Assumes the mapping was checked with [`validate`].
    #[must_use]
    pub fn choice<'a>(&'a self, spec: &OptionSpec) -> &'a str {
        match (self.get(spec.name), spec.kind) {
            (Some(OptionValue::Str(value)), _) => value.as_str(),
            (_, OptionKind::Str { default, .. }) => default,
            _ => "",
        }
    }
}

/// The type, valid range and default of a recognized option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionKind {
    Int {
        min: i32,
        max: i32,
        default: i32,
    },
    Num {
        min: Bound<f64>,
        max: Bound<f64>,
        default: f64,
    },
    Str {
        choices: &'static [&'static str],
        default: &'static str,
    },
}

impl OptionKind {
    fn expected(&self) -> &'static str {
        match self {
            Self::Int { .. } => "an integer",
            Self::Num { .. } => "a number",
            Self::Str { .. } => "a string",
        }
    }
}

/// An option a backend recognizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
}

impl OptionSpec {
    /// Declares an integer option with an inclusive range.
    #[must_use]
    pub const fn int(name: &'static str, min: i32, max: i32, default: i32) -> Self {
        Self {
            name,
            kind: OptionKind::Int { min, max, default },
        }
    }

    /// Declares a numeric option.
    #[must_use]
    pub const fn num(name: &'static str, min: Bound<f64>, max: Bound<f64>, default: f64) -> Self {
        Self {
            name,
            kind: OptionKind::Num { min, max, default },
        }
    }

    /// Declares a numeric option that must be strictly positive.
    #[must_use]
    pub const fn positive(name: &'static str, default: f64) -> Self {
        Self::num(name, Bound::Excluded(0.0), Bound::Unbounded, default)
    }

    /// Declares a string option restricted to a set of choices.
    #[must_use]
    pub const fn choice(
        name: &'static str,
        choices: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            kind: OptionKind::Str { choices, default },
        }
    }

    /// Checks a single value against this spec.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` has the wrong type, is out of range or is
    /// not one of the allowed choices.
    pub fn check(&self, value: &OptionValue) -> Result<(), ConfigError> {
        let out_of_range = || ConfigError::OutOfRange {
            name: self.name.to_owned(),
            value: value.clone(),
        };

        match (self.kind, value) {
            (OptionKind::Int { min, max, .. }, OptionValue::Int(v)) => {
                if (min..=max).contains(v) {
                    Ok(())
                } else {
                    Err(out_of_range())
                }
            }
            (OptionKind::Num { min, max, .. }, OptionValue::Num(_) | OptionValue::Int(_)) => {
                let v = match value {
                    OptionValue::Int(v) => f64::from(*v),
                    OptionValue::Num(v) => *v,
                    OptionValue::Str(_) => f64::NAN,
                };
                if !v.is_nan() && (min, max).contains(&v) {
                    Ok(())
                } else {
                    Err(out_of_range())
                }
            }
            (OptionKind::Str { choices, .. }, OptionValue::Str(v)) => {
                if choices.iter().any(|choice| choice == v) {
                    Ok(())
                } else {
                    Err(ConfigError::UnknownChoice {
                        name: self.name.to_owned(),
                        value: v.clone(),
                        choices,
                    })
                }
            }
            (kind, _) => Err(ConfigError::WrongType {
                name: self.name.to_owned(),
                expected: kind.expected(),
                value: value.clone(),
            }),
        }
    }
}

/// Errors that can occur when validating solver options.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown option `{name}`")]
    UnknownOption { name: String },

    #[error("option `{name}` expects {expected}, got {value}")]
    WrongType {
        name: String,
        expected: &'static str,
        value: OptionValue,
    },

    #[error("option `{name}` value {value} is out of range")]
    OutOfRange { name: String, value: OptionValue },

    #[error("option `{name}` does not accept \"{value}\", expected one of {choices:?}")]
    UnknownChoice {
        name: String,
        value: String,
        choices: &'static [&'static str],
    },

    #[error("option `{name}` was rejected by the backend")]
    Rejected { name: String },

    #[error("inconsistent options: {reason}")]
    Inconsistent { reason: &'static str },
}

/// Checks every set option against the recognized `specs`.
///
/// # Errors
///
/// Returns the first unknown name, type mismatch, out-of-range value or
/// unknown choice, in option name order.
pub fn validate(options: &Options, specs: &[OptionSpec]) -> Result<(), ConfigError> {
    for (name, value) in options.iter() {
        let spec = specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ConfigError::UnknownOption {
                name: name.to_owned(),
            })?;
        spec.check(value)?;
    }
    Ok(())
}
