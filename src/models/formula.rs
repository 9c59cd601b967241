//! Regression formulas for the `kobs` line.
//!
//! Formulas use the familiar `response ~ terms` notation with a single
//! response `y` and a single predictor `x`. Two shapes are supported:
//!
//! - through the origin: `y ~ x-1`, `y ~ x - 1`, `y ~ x + 0`, `y ~ 0 + x`
//! - with an intercept:  `y ~ x`, `y ~ 1 + x`, `y ~ x + 1`
//!
//! The fitter relies on two primitive operations, implemented here per shape:
//! - build a design row for a given `x`
//! - predict `y` given the fitted coefficients

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VtnError;

/// Response/predictor names the formula grammar accepts.
pub const RESPONSE: &str = "y";
pub const PREDICTOR: &str = "x";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Formula {
    /// `y = kobs·x`
    #[default]
    ThroughOrigin,
    /// `y = b + kobs·x`
    WithIntercept,
}

impl Formula {
    /// Number of fitted coefficients.
    pub fn beta_len(self) -> usize {
        match self {
            Formula::ThroughOrigin => 1,
            Formula::WithIntercept => 2,
        }
    }

    /// Index of the `x` coefficient within the coefficient vector.
    pub fn slope_index(self) -> usize {
        match self {
            Formula::ThroughOrigin => 0,
            Formula::WithIntercept => 1,
        }
    }

    pub fn has_intercept(self) -> bool {
        self == Formula::WithIntercept
    }

    /// Fill a design row for predictor value `x`.
    ///
    /// The intercept column, when present, comes first.
    ///
    /// # Panics
    /// Panics if `out` is shorter than `self.beta_len()`.
    pub fn fill_design_row(self, x: f64, out: &mut [f64]) {
        match self {
            Formula::ThroughOrigin => {
                out[0] = x;
            }
            Formula::WithIntercept => {
                out[0] = 1.0;
                out[1] = x;
            }
        }
    }

    pub fn predict(self, betas: &[f64], x: f64) -> f64 {
        match self {
            Formula::ThroughOrigin => betas[0] * x,
            Formula::WithIntercept => betas[0] + betas[1] * x,
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::ThroughOrigin => write!(f, "{RESPONSE} ~ {PREDICTOR}-1"),
            Formula::WithIntercept => write!(f, "{RESPONSE} ~ {PREDICTOR}"),
        }
    }
}

impl FromStr for Formula {
    type Err = VtnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let unsupported = || VtnError::configuration(format!("unsupported regression formula '{s}'"));

        let Some((lhs, rhs)) = compact.split_once('~') else {
            return Err(unsupported());
        };
        if lhs != RESPONSE || rhs.is_empty() || rhs.contains('~') {
            return Err(unsupported());
        }

        // Patsy semantics: an intercept is implied unless removed by `-1` or `+0`.
        let mut intercept = true;
        let mut has_predictor = false;
        for (sign, term) in signed_terms(rhs).ok_or_else(unsupported)? {
            match (sign, term) {
                ('+', PREDICTOR) if !has_predictor => has_predictor = true,
                ('+', "1") => intercept = true,
                ('-', "1") | ('+', "0") => intercept = false,
                _ => return Err(unsupported()),
            }
        }
        if !has_predictor {
            return Err(unsupported());
        }

        Ok(if intercept {
            Formula::WithIntercept
        } else {
            Formula::ThroughOrigin
        })
    }
}

/// Split `x-1+0` into `[('+', "x"), ('-', "1"), ('+', "0")]`.
fn signed_terms(rhs: &str) -> Option<Vec<(char, &str)>> {
    let mut out = Vec::new();
    let mut sign = '+';
    let mut start = 0;
    for (i, c) in rhs.char_indices() {
        if c == '+' || c == '-' {
            if i > start {
                out.push((sign, &rhs[start..i]));
            } else if i > 0 {
                // Two operators in a row.
                return None;
            }
            sign = c;
            start = i + 1;
        }
    }
    if start >= rhs.len() {
        return None;
    }
    out.push((sign, &rhs[start..]));
    Some(out)
}

impl TryFrom<String> for Formula {
    type Error = VtnError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Formula> for String {
    fn from(formula: Formula) -> Self {
        formula.to_string()
    }
}
