//! NetCDF readers for weights, fields, angles, masks and coordinates.

use std::path::Path;

use ndarray::{ArrayD, Axis, IxDyn};

use crate::error::{RegridError, Result};
use crate::field::{AxisRole, FieldSet, GridField};
use crate::rotation::RotationAngle;
use crate::thermo::OceanMask;
use crate::weights::WeightTriplets;

use super::TimeAxis;

/// Names treated as a squeezable leading time dimension.
const TIME_DIM_NAMES: &[&str] = &["time", "Time", "t"];

fn container(path: &Path) -> String {
    path.display().to_string()
}

fn variable<'f>(file: &'f netcdf::File, path: &Path, name: &str) -> Result<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| RegridError::missing(container(path), name))
}

fn dimension_len(file: &netcdf::File, path: &Path, name: &str) -> Result<usize> {
    file.dimension(name)
        .map(|d| d.len())
        .ok_or_else(|| RegridError::missing(container(path), name))
}

/// Read a string attribute of a variable, if present.
fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Read a variable into an array with the variable's own shape.
fn read_array(var: &netcdf::Variable) -> Result<ArrayD<f64>> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let values: Vec<f64> = var.get_values(..)?;
    ArrayD::from_shape_vec(IxDyn(&shape), values)
        .map_err(|e| RegridError::mismatch(format!("values of '{}'", var.name()), &shape, e))
}

/// Read the raw contents of an ESMF weight file.
pub fn read_weight_triplets(path: impl AsRef<Path>) -> Result<WeightTriplets> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;

    let triplets = WeightTriplets {
        n_a: dimension_len(&file, path, "n_a")?,
        n_b: dimension_len(&file, path, "n_b")?,
        row: variable(&file, path, "row")?.get_values::<i64, _>(..)?,
        col: variable(&file, path, "col")?.get_values::<i64, _>(..)?,
        s: variable(&file, path, "S")?.get_values::<f64, _>(..)?,
        dst_grid_dims: variable(&file, path, "dst_grid_dims")?.get_values::<i64, _>(..)?,
    };
    tracing::debug!(
        path = %path.display(),
        n_a = triplets.n_a,
        n_b = triplets.n_b,
        n_s = triplets.s.len(),
        "read weight file"
    );
    Ok(triplets)
}

/// Read one variable as a grid field.
///
/// A leading time axis of length 1 is dropped. The third-from-last axis,
/// if any, gets the `stack` role.
pub fn read_field(path: impl AsRef<Path>, name: &str, stack: AxisRole) -> Result<GridField> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let var = variable(&file, path, name)?;
    field_from_variable(&var, stack)
}

fn field_from_variable(var: &netcdf::Variable, stack: AxisRole) -> Result<GridField> {
    let mut data = read_array(var)?;
    let dims = var.dimensions();
    let leading_time = dims.first().map_or(false, |d| {
        d.len() == 1 && (d.is_unlimited() || TIME_DIM_NAMES.contains(&d.name().as_str()))
    });
    if leading_time && data.ndim() > 2 {
        data = data.index_axis_move(Axis(0), 0);
    }

    let mut field = GridField::infer(var.name(), data, stack);
    if let Some(units) = string_attribute(var, "units") {
        field = field.with_units(units);
    }
    if let Some(long_name) = string_attribute(var, "long_name") {
        field = field.with_long_name(long_name);
    }
    Ok(field)
}

/// Read every gridded (rank ≥ 2) variable of a file, skipping `exclude`.
pub fn read_field_set(path: impl AsRef<Path>, stack: AxisRole, exclude: &[String]) -> Result<FieldSet> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let mut fields = FieldSet::from_source(container(path));
    for var in file.variables() {
        let name = var.name();
        if var.dimensions().len() < 2 || exclude.iter().any(|e| *e == name) {
            continue;
        }
        fields.insert(field_from_variable(&var, stack)?);
    }
    tracing::info!(path = %path.display(), n_fields = fields.len(), "read field set");
    Ok(fields)
}

/// Read a per-cell rotation angle, optionally from a supergrid.
pub fn read_angle(path: impl AsRef<Path>, name: &str, supergrid: bool) -> Result<RotationAngle> {
    let field = read_field(path, name, AxisRole::Time)?;
    let values = field.as_array2()?;
    Ok(if supergrid {
        RotationAngle::from_supergrid(values)
    } else {
        RotationAngle::new(values.to_owned())
    })
}

/// Read a 0/1 ocean mask.
pub fn read_mask(path: impl AsRef<Path>, name: &str) -> Result<OceanMask> {
    let field = read_field(path, name, AxisRole::Time)?;
    let mask = OceanMask::from_field(&field)?;
    tracing::debug!(%name, stats = %mask.statistics(), "read ocean mask");
    Ok(mask)
}

/// Read a 1D coordinate variable (depths, thicknesses, times).
pub fn read_coordinate(path: impl AsRef<Path>, name: &str) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let var = variable(&file, path, name)?;
    Ok(var.get_values::<f64, _>(..)?)
}

/// Dimension names of a variable, outermost first.
pub fn read_dimension_names(path: impl AsRef<Path>, name: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let var = variable(&file, path, name)?;
    Ok(var.dimensions().iter().map(|d| d.name()).collect())
}

/// Read a time coordinate with its CF attributes.
///
/// Missing attributes fall back to the [`TimeAxis`] defaults; bare `"days"`
/// units are replaced by the default epoch.
pub fn read_time_axis(path: impl AsRef<Path>, name: &str) -> Result<TimeAxis> {
    let path = path.as_ref();
    let file = netcdf::open(path)?;
    let var = variable(&file, path, name)?;
    let mut axis = TimeAxis::new(name, var.get_values::<f64, _>(..)?);
    if let Some(long_name) = string_attribute(&var, "long_name") {
        axis.long_name = long_name;
    }
    if let Some(units) = string_attribute(&var, "units").filter(|u| u != "days") {
        axis.units = units;
    }
    if let Some(calendar) = string_attribute(&var, "calendar") {
        axis.calendar = calendar;
    }
    Ok(axis)
}
