//! Missing-aware column arithmetic.
//!
//! Two rules govern missing cells (`None`) throughout the crate:
//!
//! - element-wise operations are strict: any missing operand gives a missing
//!   result (`strict_row_product` included)
//! - `cumulative_sum` skips missing inputs: the output at a missing row is
//!   missing, and the running total carries over to the next defined row
//!
//! A `NaN` produced by arithmetic (e.g. a negative base raised to a fractional
//! power) is also reported as missing.

use crate::domain::{Column, cell};

/// Shift a column down by `periods` rows; the first `periods` cells are missing.
pub fn lag(values: &[Option<f64>], periods: usize) -> Column {
    let n = values.len();
    let periods = periods.min(n);
    let mut out = vec![None; periods];
    out.extend_from_slice(&values[..n - periods]);
    out
}

/// Apply `f` to every defined cell.
pub fn map(values: &[Option<f64>], f: impl Fn(f64) -> f64) -> Column {
    values.iter().map(|v| v.and_then(|x| cell(f(x)))).collect()
}

/// Combine two columns cell by cell; missing if either side is missing.
pub fn zip_with(a: &[Option<f64>], b: &[Option<f64>], f: impl Fn(f64, f64) -> f64) -> Column {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => cell(f(*x, *y)),
            _ => None,
        })
        .collect()
}

pub fn sub(a: &[Option<f64>], b: &[Option<f64>]) -> Column {
    zip_with(a, b, |x, y| x - y)
}

pub fn mul(a: &[Option<f64>], b: &[Option<f64>]) -> Column {
    zip_with(a, b, |x, y| x * y)
}

/// Row-wise product over `factors`; one missing factor makes the row missing.
///
/// With no factors every row is the empty product, `1.0`.
pub fn strict_row_product(factors: &[&[Option<f64>]], rows: usize) -> Column {
    (0..rows)
        .map(|i| {
            factors
                .iter()
                .try_fold(1.0, |acc, col| col.get(i).copied().flatten().map(|v| acc * v))
                .and_then(cell)
        })
        .collect()
}

/// Running sum that skips missing cells without resetting the total.
pub fn cumulative_sum(values: &[Option<f64>]) -> Column {
    let mut total = 0.0;
    values
        .iter()
        .map(|v| {
            v.map(|x| {
                total += x;
                total
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lag_shifts_and_leaves_first_row_missing() {
        let v = vec![Some(1.0), Some(2.0), None, Some(4.0)];
        assert_eq!(lag(&v, 1), vec![None, Some(1.0), Some(2.0), None]);
        assert_eq!(lag(&v, 10), vec![None; 4]);
        assert!(lag(&[], 1).is_empty());
    }

    #[test]
    fn cumulative_sum_carries_over_gaps() {
        let v = vec![None, Some(1.0), None, Some(2.0), Some(0.5)];
        assert_eq!(cumulative_sum(&v), vec![None, Some(1.0), None, Some(3.0), Some(3.5)]);
    }

    #[test]
    fn strict_product_propagates_missing() {
        let a = vec![Some(2.0), Some(3.0), None];
        let b = vec![Some(4.0), None, Some(5.0)];
        let out = strict_row_product(&[a.as_slice(), b.as_slice()], 3);
        assert_eq!(out, vec![Some(8.0), None, None]);
    }

    #[test]
    fn nan_results_become_missing() {
        let v = vec![Some(-1.0), Some(4.0)];
        assert_eq!(map(&v, |x| x.powf(0.5)), vec![None, Some(2.0)]);
    }
}
