//! Ocean/land mask on the destination grid.
//!
//! # Example
//!
//! ```
//! use ic_regrid::thermo::OceanMask;
//! use ndarray::array;
//!
//! let mask = OceanMask::from_values(array![[1.0, 0.0], [1.0, 1.0]].view());
//! assert!(mask.is_wet(0, 0));
//! assert!(mask.is_dry(0, 1));
//! assert_eq!(mask.wet_count(), 3);
//! ```

use std::fmt;

use ndarray::{Array2, ArrayView2};

use crate::error::Result;
use crate::field::GridField;

/// Wet (ocean) / dry (land) classification of destination cells.
#[derive(Clone, Debug, PartialEq)]
pub struct OceanMask {
    wet: Array2<bool>,
}

impl OceanMask {
    /// A mask where every cell is ocean.
    pub fn all_wet(ny: usize, nx: usize) -> Self {
        Self {
            wet: Array2::from_elem((ny, nx), true),
        }
    }

    /// A mask where every cell is land.
    pub fn all_dry(ny: usize, nx: usize) -> Self {
        Self {
            wet: Array2::from_elem((ny, nx), false),
        }
    }

    /// Build from 0/1 flags. Only cells flagged exactly 1 are ocean; any
    /// other value, including fill, is land.
    pub fn from_values(values: ArrayView2<'_, f64>) -> Self {
        Self {
            wet: values.mapv(|v| v == 1.0),
        }
    }

    /// Build from a 2D mask field.
    pub fn from_field(field: &GridField) -> Result<Self> {
        Ok(Self::from_values(field.as_array2()?))
    }

    pub fn from_bools(wet: Array2<bool>) -> Self {
        Self { wet }
    }

    /// `(ny, nx)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        self.wet.dim()
    }

    #[inline]
    pub fn is_wet(&self, j: usize, i: usize) -> bool {
        self.wet[[j, i]]
    }

    #[inline]
    pub fn is_dry(&self, j: usize, i: usize) -> bool {
        !self.wet[[j, i]]
    }

    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.wet.view()
    }

    pub fn wet_count(&self) -> usize {
        self.wet.iter().filter(|&&w| w).count()
    }

    pub fn dry_count(&self) -> usize {
        self.wet.len() - self.wet_count()
    }

    pub fn statistics(&self) -> OceanMaskStatistics {
        let wet_cells = self.wet_count();
        OceanMaskStatistics {
            total_cells: self.wet.len(),
            wet_cells,
            dry_cells: self.wet.len() - wet_cells,
        }
    }
}

/// Cell counts of an ocean mask.
#[derive(Debug, Clone)]
pub struct OceanMaskStatistics {
    pub total_cells: usize,
    pub wet_cells: usize,
    pub dry_cells: usize,
}

impl fmt::Display for OceanMaskStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pct = |n: usize| {
            if self.total_cells == 0 {
                0.0
            } else {
                100.0 * n as f64 / self.total_cells as f64
            }
        };
        writeln!(f, "Ocean Mask Statistics:")?;
        writeln!(f, "  Total cells: {}", self.total_cells)?;
        writeln!(f, "  Ocean cells: {} ({:.1}%)", self.wet_cells, pct(self.wet_cells))?;
        write!(f, "  Land cells: {} ({:.1}%)", self.dry_cells, pct(self.dry_cells))
    }
}
