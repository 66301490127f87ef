//! Horizontal regridding of field sets.
//!
//! # Example
//!
//! ```
//! use ic_regrid::field::{FieldSet, GridField, SOURCE_FILL_VALUE};
//! use ic_regrid::regrid::HorizontalRegridder;
//! use ic_regrid::weights::{WeightStore, WeightTriplets};
//! use ndarray::array;
//!
//! let weights = WeightStore::from_triplets("identity", WeightTriplets {
//!     n_a: 4, n_b: 4,
//!     row: vec![1, 2, 3, 4], col: vec![1, 2, 3, 4], s: vec![1.0; 4],
//!     dst_grid_dims: vec![2, 2],
//! }).unwrap();
//!
//! let fields = FieldSet::new()
//!     .with(GridField::surface("ssh", array![[5.0, 5.0], [SOURCE_FILL_VALUE, 5.0]]));
//! let out = HorizontalRegridder::new(&weights).remap(&fields).unwrap();
//! assert_eq!(out.get("ssh").unwrap().data()[[1, 0]], 0.0);
//! ```

mod horizontal;

pub use horizontal::HorizontalRegridder;
