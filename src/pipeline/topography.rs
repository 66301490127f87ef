//! Bathymetry workflow steps around an ocean run: interface heights for a
//! finished initial-condition file and merging a remapped bathymetry into
//! the model's own.

use crate::error::Result;
use crate::field::{AxisRole, GridField};
use crate::vertical::{interface_heights, patch_depth};

/// Interface heights `[nz + 1, ny, nx]` of a level-stacked thickness field.
///
/// The result is named `name`, stacked on `Level` and keeps the thickness
/// units.
pub fn interface_height_field(thickness: &GridField, name: &str, surface: f64) -> Result<GridField> {
    let eta = interface_heights(thickness.as_array3()?, surface);
    let mut field = GridField::stacked(name, AxisRole::Level, eta).with_long_name("Interface height");
    if let Some(units) = thickness.units() {
        field = field.with_units(units);
    }
    Ok(field)
}

/// The remapped depth merged into the original one, named after the
/// remapped field.
pub fn patched_depth_field(original: &GridField, remapped: &GridField, min_depth: f64) -> Result<GridField> {
    let patched = patch_depth(original.as_array2()?, remapped.as_array2()?, min_depth)?;
    let mut field = GridField::surface(remapped.name(), patched);
    if let Some(units) = remapped.units().or_else(|| original.units()) {
        field = field.with_units(units);
    }
    if let Some(long_name) = remapped.long_name() {
        field = field.with_long_name(long_name);
    }
    Ok(field)
}

/// Last two dimension names of a variable.
#[cfg(feature = "netcdf")]
fn horizontal_dimensions(dims: &[String], name: &str) -> Result<(String, String)> {
    match dims {
        [.., y, x] => Ok((y.clone(), x.clone())),
        _ => Err(crate::error::RegridError::UnsupportedFieldRank {
            name: name.to_string(),
            rank: dims.len(),
        }),
    }
}

/// Write interface heights into an existing ocean file.
///
/// The thickness variable must hold a single time record. The heights go
/// on the thickness variable's horizontal dimensions and on the interface
/// dimension, which is added if the file lacks it. When the thickness
/// variable leads with the configured time dimension, so does the output.
#[cfg(feature = "netcdf")]
pub fn add_interface_heights(config: &crate::config::InterfaceHeightConfig) -> Result<std::path::PathBuf> {
    use crate::field::FieldSet;
    use crate::io::{read_dimension_names, read_field, AxisNames, OutputConfig, OutputWriter, TimeAxis};

    tracing::info!(file = %config.file.display(), thickness = %config.thickness, "adding interface heights");
    let dims = read_dimension_names(&config.file, &config.thickness)?;
    let (y, x) = horizontal_dimensions(&dims, &config.thickness)?;
    let thickness = read_field(&config.file, &config.thickness, AxisRole::Level)?;
    let eta = interface_height_field(&thickness, &config.output_name, config.surface)?;

    let axes = AxisNames::ocean(config.dimension.as_str()).with_horizontal(y, x);
    let mut writer = OutputWriter::new(OutputConfig::new(&config.file, axes));
    if dims.first() == Some(&config.time_dim) {
        // An existing file only needs the time axis name
        writer.initialize(None, Some(&TimeAxis::new(config.time_dim.as_str(), Vec::new())))?;
    } else {
        writer.initialize(None, None)?;
    }
    writer.write(&FieldSet::new().with(eta), 0)?;
    let path = writer.finish()?;
    tracing::info!(output = %path.display(), name = %config.output_name, "interface heights written");
    Ok(path)
}

/// Merge a remapped bathymetry into the original and write it to a new file.
#[cfg(feature = "netcdf")]
pub fn patch_topography(config: &crate::config::TopographyPatchConfig) -> Result<std::path::PathBuf> {
    use crate::field::FieldSet;
    use crate::io::{read_dimension_names, read_field, AxisNames, OutputConfig, OutputWriter};

    tracing::info!(
        original = %config.original.display(),
        remapped = %config.remapped.display(),
        min_depth = config.min_depth,
        "patching topography"
    );
    let original = read_field(&config.original, &config.variable, AxisRole::Time)?;
    let remapped = read_field(&config.remapped, &config.variable, AxisRole::Time)?;
    let patched = patched_depth_field(&original, &remapped, config.min_depth)?;

    let dims = read_dimension_names(&config.remapped, &config.variable)?;
    let (y, x) = horizontal_dimensions(&dims, &config.variable)?;
    let output = OutputConfig::new(&config.output, AxisNames::ocean("zl").with_horizontal(y, x))
        .with_replace(true)
        .with_title("Patched ocean topography");
    let mut writer = OutputWriter::new(output);
    writer.initialize(None, None)?;
    writer.write(&FieldSet::new().with(patched), 0)?;
    let path = writer.finish()?;
    tracing::info!(output = %path.display(), "topography patched");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegridError;
    use approx::assert_relative_eq;
    use ndarray::{array, Array3};

    #[test]
    fn test_interface_height_field() {
        let h = Array3::from_shape_vec((2, 1, 2), vec![10.0, 5.0, 20.0, 0.0]).unwrap();
        let thickness = GridField::stacked("h", AxisRole::Level, h).with_units("m");
        let eta = interface_height_field(&thickness, "eta", 0.0).unwrap();

        assert_eq!(eta.name(), "eta");
        assert_eq!(eta.axes(), [AxisRole::Level, AxisRole::Y, AxisRole::X]);
        assert_eq!(eta.units(), Some("m"));
        let e = eta.as_array3().unwrap();
        assert_eq!(e.dim(), (3, 1, 2));
        assert_relative_eq!(e[[1, 0, 0]], -10.0);
        assert_relative_eq!(e[[2, 0, 0]], -30.0);
        assert_relative_eq!(e[[2, 0, 1]], -5.0);
    }

    #[test]
    fn test_interface_height_needs_stacked_thickness() {
        let flat = GridField::surface("h", array![[1.0, 2.0]]);
        let err = interface_height_field(&flat, "eta", 0.0).unwrap_err();
        assert!(matches!(err, RegridError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_patched_depth_field() {
        let old = GridField::surface("depth", array![[0.0, 50.0], [100.0, 0.5]]).with_units("m");
        let new = GridField::surface("depth", array![[30.0, 0.9], [120.0, 50.0]]);
        let patched = patched_depth_field(&old, &new, 1.0).unwrap();
        assert_eq!(patched.name(), "depth");
        assert_eq!(patched.units(), Some("m"));
        assert_eq!(patched.as_array2().unwrap(), array![[0.0, 50.0], [120.0, 0.5]]);
    }
}
