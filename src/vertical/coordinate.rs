//! Strictly increasing vertical coordinate.

use std::fmt;

use crate::error::{RegridError, Result};
use crate::types::LevelIndex;

/// Level depths of a column, positive downward and strictly increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct VerticalCoordinate {
    name: String,
    depths: Vec<f64>,
}

impl VerticalCoordinate {
    /// Build from explicit level depths.
    ///
    /// Fails with [`RegridError::NonMonotonicCoordinate`] if the depths are
    /// empty, non-finite, or not strictly increasing.
    pub fn from_depths(name: impl Into<String>, depths: Vec<f64>) -> Result<Self> {
        let name = name.into();
        let increasing = depths.windows(2).all(|w| w[1] > w[0]);
        if depths.is_empty() || !increasing || depths.iter().any(|d| !d.is_finite()) {
            return Err(RegridError::NonMonotonicCoordinate { name });
        }
        Ok(Self { name, depths })
    }

    /// Build layer-center depths from layer thicknesses.
    ///
    /// ```text
    /// z[k] = Σ_{j<k} dz[j] + dz[k] / 2
    /// ```
    pub fn from_thicknesses(name: impl Into<String>, thicknesses: &[f64]) -> Result<Self> {
        let mut top = 0.0;
        let centers = thicknesses
            .iter()
            .map(|&dz| {
                let center = top + 0.5 * dz;
                top += dz;
                center
            })
            .collect();
        Self::from_depths(name, centers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.depths.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    #[inline]
    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    /// Depth of one level.
    #[inline]
    pub fn depth(&self, level: LevelIndex) -> f64 {
        self.depths[level]
    }

    pub fn shallowest(&self) -> f64 {
        self.depths[0]
    }

    pub fn deepest(&self) -> f64 {
        self.depths[self.depths.len() - 1]
    }

    /// Iterate `(level, depth)` pairs.
    pub fn levels(&self) -> impl Iterator<Item = (LevelIndex, f64)> + '_ {
        LevelIndex::iter(self.len()).zip(self.depths.iter().copied())
    }
}

impl fmt::Display for VerticalCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} levels, {:.2} to {:.2} m)",
            self.name,
            self.len(),
            self.shallowest(),
            self.deepest()
        )
    }
}
