//! NetCDF input and output (requires the `netcdf` feature).
//!
//! - **Readers**: ESMF weight files, source fields and whole field sets,
//!   grid rotation angles (cell-center or supergrid), ocean masks and 1D
//!   coordinates including CF time axes, and a variable's dimension names
//! - **Writer**: [`OutputWriter`] commits a finished field set to a NetCDF
//!   container with named horizontal axes, an optional vertical coordinate
//!   and an optional unlimited time axis
//!
//! Missing dimensions or variables surface as
//! [`RegridError::MissingVariable`](crate::RegridError::MissingVariable)
//! naming the file; length disagreements with an existing output file as
//! [`RegridError::DimensionMismatch`](crate::RegridError::DimensionMismatch).
//! Output values use `1.0e20` as `_FillValue`.
//!
//! # Example
//!
//! ```no_run
//! use ic_regrid::field::AxisRole;
//! use ic_regrid::io::{read_angle, read_field};
//!
//! # fn main() -> ic_regrid::Result<()> {
//! let temp = read_field("rtofs.nc", "temperature", AxisRole::Level)?;
//! let angle = read_angle("ocean_hgrid.nc", "angle_dx", true)?;
//! println!("{} on {:?}, angle grid {:?}", temp.name(), temp.horizontal_shape(), angle.shape());
//! # Ok(())
//! # }
//! ```

mod netcdf_io;
mod output;

pub use netcdf_io::{
    read_angle, read_coordinate, read_dimension_names, read_field, read_field_set, read_mask,
    read_time_axis, read_weight_triplets,
};
pub use output::{AxisNames, OutputConfig, OutputWriter, TimeAxis};
