//! Fill/sentinel handling for missing source data.

use ndarray::{ArrayD, Zip};

use crate::error::{RegridError, Result};

/// Sentinel used by the source reanalysis files for missing data (2^100).
///
/// Stored on disk as `f32`; `2^100` is exactly representable in both widths.
pub const SOURCE_FILL_VALUE: f64 = 1.2676506002282294e30;

/// `_FillValue` written to output containers.
pub const OUTPUT_FILL_VALUE: f64 = 1.0e20;

/// Matcher for the reserved missing-data value of a source field.
///
/// Non-finite values are always treated as missing. The sentinel itself is
/// matched with a relative tolerance so values that went through an `f32`
/// round-trip still compare equal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FillValue {
    sentinel: f64,
    rel_tol: f64,
}

impl Default for FillValue {
    fn default() -> Self {
        Self::new(SOURCE_FILL_VALUE)
    }
}

impl FillValue {
    /// Create a matcher for the given sentinel.
    pub fn new(sentinel: f64) -> Self {
        Self {
            sentinel,
            rel_tol: 1.0e-6,
        }
    }

    /// Set the relative matching tolerance.
    pub fn with_tolerance(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol.abs();
        self
    }

    /// The sentinel value.
    #[inline]
    pub fn sentinel(&self) -> f64 {
        self.sentinel
    }

    /// Check if a value marks missing data.
    #[inline]
    pub fn is_fill(&self, v: f64) -> bool {
        !v.is_finite() || (v - self.sentinel).abs() <= self.rel_tol * self.sentinel.abs()
    }

    /// Replace every missing value in place with zero, returning how many were replaced.
    pub fn scrub(&self, values: &mut [f64]) -> usize {
        let mut replaced = 0;
        for v in values.iter_mut() {
            if self.is_fill(*v) {
                *v = 0.0;
                replaced += 1;
            }
        }
        replaced
    }

    /// Zero both vector components wherever either one is missing.
    ///
    /// Must run before a rotation: a rotated sentinel mixes into the other
    /// component and no longer matches the fill value.
    pub fn scrub_pair(&self, u: &mut ArrayD<f64>, v: &mut ArrayD<f64>) -> Result<usize> {
        if u.shape() != v.shape() {
            return Err(RegridError::mismatch("u/v component shapes", u.shape(), v.shape()));
        }
        let mut replaced = 0;
        Zip::from(u).and(v).for_each(|a, b| {
            if self.is_fill(*a) || self.is_fill(*b) {
                *a = 0.0;
                *b = 0.0;
                replaced += 1;
            }
        });
        Ok(replaced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_value_check() {
        let fill = FillValue::default();
        assert!(fill.is_fill(SOURCE_FILL_VALUE));
        assert!(fill.is_fill(SOURCE_FILL_VALUE as f32 as f64));
        assert!(fill.is_fill(f64::NAN));
        assert!(fill.is_fill(f64::INFINITY));
        assert!(!fill.is_fill(0.0));
        assert!(!fill.is_fill(-1.8));
        assert!(!fill.is_fill(1.0e20));
    }

    #[test]
    fn test_scrub() {
        let fill = FillValue::new(-999.0);
        let mut v = vec![1.0, -999.0, 2.0, f64::NAN];
        assert_eq!(fill.scrub(&mut v), 2);
        assert_eq!(v, vec![1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scrub_pair_zeroes_both_components() {
        let fill = FillValue::default();
        let mut u = ndarray::array![0.5, SOURCE_FILL_VALUE, 1.0].into_dyn();
        let mut v = ndarray::array![0.1, 0.2, f64::NAN].into_dyn();
        assert_eq!(fill.scrub_pair(&mut u, &mut v).unwrap(), 2);
        assert_eq!(u.as_slice().unwrap(), &[0.5, 0.0, 0.0]);
        assert_eq!(v.as_slice().unwrap(), &[0.1, 0.0, 0.0]);
    }

    #[test]
    fn test_scrub_pair_shape_checked() {
        let mut u = ndarray::ArrayD::zeros(ndarray::IxDyn(&[2]));
        let mut v = ndarray::ArrayD::zeros(ndarray::IxDyn(&[3]));
        assert!(FillValue::default().scrub_pair(&mut u, &mut v).is_err());
    }
}
