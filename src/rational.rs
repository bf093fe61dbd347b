//! Exact `N/D` ratios.
//!
//! ffprobe reports frame rates and time bases as ratio strings such as
//! `"30000/1001"` or `"1/90000"`. [`Rational`] parses them with a plain
//! split-and-parse (no expression evaluation) and converts tick counts to
//! microseconds with integer arithmetic, so that e.g. `400000 × 1/10000000`
//! lands on exactly 40 ms.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use thiserror::Error;

/// Why a ratio string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRationalError {
    /// The string is not of the form `N/D` (or a bare integer).
    #[error("expected `N/D`, got {0:?}")]
    Malformed(String),
    /// The denominator is zero.
    #[error("zero denominator in {0:?}")]
    ZeroDenominator(String),
}

/// A ratio of two integers with a strictly positive denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    numerator: i64,
    denominator: i64,
}

impl Rational {
    /// Build a ratio, normalising the sign onto the numerator.
    ///
    /// Returns `None` when `denominator` is zero.
    pub fn new(numerator: i64, denominator: i64) -> Option<Self> {
        match denominator {
            0 => None,
            d if d < 0 => Some(Self {
                numerator: -numerator,
                denominator: -d,
            }),
            d => Some(Self {
                numerator,
                denominator: d,
            }),
        }
    }

    /// A whole number, e.g. a frame rate of 50.
    pub fn from_integer(value: i64) -> Self {
        Self {
            numerator: value,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> i64 {
        self.numerator
    }

    pub fn denominator(&self) -> i64 {
        self.denominator
    }

    /// `true` when the ratio equals zero (ffprobe's `"0/0"` aside, a `0/1`
    /// frame rate means "unknown").
    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// The ratio as a float.
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Interpret `self` as seconds per tick and convert `ticks` to
    /// microseconds, rounded to the nearest microsecond.
    pub fn ticks_to_micros(&self, ticks: i64) -> i128 {
        div_round(
            ticks as i128 * self.numerator as i128 * 1_000_000,
            self.denominator as i128,
        )
    }

    /// Interpret `self` as a rate (per second) and return the length of one
    /// period in microseconds. Returns `None` for a zero rate.
    pub fn period_micros(&self) -> Option<i128> {
        if self.numerator == 0 {
            return None;
        }
        Some(div_round(
            self.denominator as i128 * 1_000_000,
            self.numerator as i128,
        ))
    }
}

impl FromStr for Rational {
    type Err = ParseRationalError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let malformed = || ParseRationalError::Malformed(text.to_string());

        let (numerator, denominator) = match trimmed.split_once('/') {
            Some((n, d)) => (
                n.trim().parse::<i64>().map_err(|_| malformed())?,
                d.trim().parse::<i64>().map_err(|_| malformed())?,
            ),
            None => (trimmed.parse::<i64>().map_err(|_| malformed())?, 1),
        };

        Rational::new(numerator, denominator)
            .ok_or_else(|| ParseRationalError::ZeroDenominator(text.to_string()))
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Integer division rounding half away from zero. `d` must be positive.
fn div_round(n: i128, d: i128) -> i128 {
    if n >= 0 {
        (n + d / 2) / d
    } else {
        -((-n + d / 2) / d)
    }
}
