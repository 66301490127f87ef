//! Grid fields and field sets.
//!
//! A [`GridField`] is a labeled array whose trailing two axes are the
//! horizontal `[Y, X]` grid, optionally preceded by a category or vertical
//! level axis. A [`FieldSet`] is the explicit name → field mapping that
//! every pipeline stage consumes and produces.
//!
//! # Example
//!
//! ```
//! use ic_regrid::field::{AxisRole, FieldSet, GridField};
//! use ndarray::{Array2, Array3};
//!
//! let fields = FieldSet::from_source("cice_restart.nc")
//!     .with(GridField::surface("iceumask", Array2::zeros((4, 6))))
//!     .with(GridField::stacked("aicen", AxisRole::Category, Array3::zeros((5, 4, 6))));
//!
//! assert_eq!(fields.horizontal_shape().unwrap(), Some((4, 6)));
//! assert!(fields.get("vicen").is_err());
//! ```

mod field_set;
mod fill;
mod grid_field;

pub use field_set::FieldSet;
pub use fill::{FillValue, OUTPUT_FILL_VALUE, SOURCE_FILL_VALUE};
pub use grid_field::{AxisRole, GridField};
