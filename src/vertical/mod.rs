//! Vertical coordinates and column remapping for ocean fields.
//!
//! Source reanalyses and target models rarely share a vertical grid: the
//! source may sit on fixed z-levels while the target uses layer thicknesses
//! from its own vertical grid file. Remapping is piecewise linear in depth,
//! one horizontal column at a time.
//!
//! - Above the shallowest source level the shallowest value is held.
//! - Below the deepest source level the [`BelowBottomPolicy`] decides:
//!   [`BelowBottomPolicy::Zero`] (default) treats it as void below
//!   topography, [`BelowBottomPolicy::HoldDeepest`] clamps.
//!
//! Depths are positive downward.
//!
//! # Example
//!
//! ```
//! use ic_regrid::vertical::{BelowBottomPolicy, VerticalCoordinate, VerticalRemapper};
//!
//! let src = VerticalCoordinate::from_depths("depth", vec![0.0, 10.0, 20.0]).unwrap();
//! let dst = VerticalCoordinate::from_thicknesses("zl", &[5.0, 10.0, 20.0]).unwrap();
//! assert_eq!(dst.depths(), &[2.5, 10.0, 25.0]);
//!
//! let remapper = VerticalRemapper::new(BelowBottomPolicy::Zero);
//! let mut out = vec![0.0; dst.len()];
//! remapper.remap_column(&[4.0, 2.0, 1.0], src.depths(), dst.depths(), &mut out).unwrap();
//! assert_eq!(out, vec![3.5, 2.0, 0.0]);
//! ```
//!
//! # Interface heights and bathymetry
//!
//! [`interface_heights`] turns a layer-thickness field into interface
//! heights measured from the sea surface, and [`patch_depth`] merges a
//! remapped bathymetry into an original one only where both are wet.

mod bathymetry;
mod coordinate;
mod remap;

pub use bathymetry::{interface_heights, patch_depth};
pub use coordinate::VerticalCoordinate;
pub use remap::{BelowBottomPolicy, VerticalRemapper};
