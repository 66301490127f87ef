//! # ic-regrid
//!
//! Builds ocean and sea-ice initial conditions on a target model grid from
//! a source state on another grid, using precomputed ESMF interpolation
//! weights.
//!
//! This crate provides:
//! - Sparse horizontal remapping of 2D and category/level-stacked fields
//! - Rotation of vector fields between grid-local and geographic frames
//! - Piecewise-linear vertical remapping between depth coordinates
//! - Post-regrid repair of coupled sea-ice and snow thermodynamic state
//! - NetCDF readers and an output writer (feature `netcdf`)
//! - TOML-configured ice and ocean pipelines
//!
//! ## Data flow
//!
//! ```text
//! WeightStore → rotate → HorizontalRegridder → rotate back → VerticalRemapper → ConsistencyEnforcer → OutputWriter
//! ```
//!
//! ## Features
//!
//! - `netcdf`: file I/O and the pipelines' `run` steps
//! - `cli`: the `ic-regrid` binary (implies `netcdf`)
//! - `parallel`: rayon over horizontal slices and vertical columns

pub mod config;
pub mod error;
pub mod field;
#[cfg(feature = "netcdf")]
pub mod io;
pub mod pipeline;
pub mod regrid;
pub mod rotation;
pub mod thermo;
pub mod types;
pub mod vertical;
pub mod weights;

pub use error::{RegridError, Result};

// Re-export main types for convenience
pub use field::{AxisRole, FieldSet, FillValue, GridField};
pub use pipeline::{IceRemapPipeline, OceanRemapPipeline, OceanVariable};
pub use regrid::HorizontalRegridder;
pub use rotation::{RotationAngle, RotationDirection};
pub use thermo::{ConsistencyEnforcer, IceFieldNames, OceanMask, PhysicalParams};
pub use vertical::{BelowBottomPolicy, VerticalCoordinate, VerticalRemapper};
pub use weights::{WeightStore, WeightTriplets};
