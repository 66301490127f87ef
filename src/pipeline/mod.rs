//! End-to-end regridding runs.
//!
//! Each pipeline has a pure `process` step over in-memory fields and, with
//! the `netcdf` feature, a `run` step that reads its inputs from the files
//! named in a [`config`](crate::config) and commits the result through an
//! [`OutputWriter`](crate::io::OutputWriter).
//!
//! ```text
//! ice:    drop → rotate to geographic → remap → rotate to grid → enforce
//! ocean:  rotate to geographic → remap (u, v weights) → rotate to grid → vertical remap
//! ```
//!
//! Two bathymetry steps run around the ocean pipeline: interface heights
//! added to a finished ocean file, and a remapped bathymetry merged into
//! the model's own.

mod ice;
mod ocean;
mod topography;

pub use ice::IceRemapPipeline;
pub use ocean::{OceanRemapPipeline, OceanVariable};
pub use topography::{interface_height_field, patched_depth_field};
#[cfg(feature = "netcdf")]
pub use topography::{add_interface_heights, patch_topography};
