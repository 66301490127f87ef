//! NetCDF output container for regridded field sets.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;

use crate::error::{RegridError, Result};
use crate::field::{AxisRole, FieldSet, GridField, OUTPUT_FILL_VALUE};

/// Dimension names used for each axis role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisNames {
    pub category: String,
    pub level: String,
    pub y: String,
    pub x: String,
}

impl AxisNames {
    /// CICE restart naming: `ncat`, `nj`, `ni`.
    pub fn ice() -> Self {
        Self {
            category: "ncat".into(),
            level: "nkice".into(),
            y: "nj".into(),
            x: "ni".into(),
        }
    }

    /// MOM6 tracer-point naming: `yh`, `xh` and the given vertical name.
    pub fn ocean(level: impl Into<String>) -> Self {
        Self {
            category: "ncat".into(),
            level: level.into(),
            y: "yh".into(),
            x: "xh".into(),
        }
    }

    /// Replace the horizontal dimension names.
    ///
    /// Staggered C-grid velocities use this for their own point grids:
    /// `u` on `(yh, xq)`, `v` on `(yq, xh)`.
    pub fn with_horizontal(mut self, y: impl Into<String>, x: impl Into<String>) -> Self {
        self.y = y.into();
        self.x = x.into();
        self
    }

    fn for_role(&self, role: AxisRole) -> Option<&str> {
        match role {
            AxisRole::Category => Some(&self.category),
            AxisRole::Level => Some(&self.level),
            AxisRole::Y => Some(&self.y),
            AxisRole::X => Some(&self.x),
            AxisRole::Time => None,
        }
    }
}

/// Unlimited time coordinate with CF attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    pub name: String,
    pub values: Vec<f64>,
    pub long_name: String,
    pub units: String,
    pub calendar: String,
}

impl TimeAxis {
    /// Time axis with the default attributes.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            long_name: "Time".into(),
            units: "days since 0001-01-01 00:00:00".into(),
            calendar: "julian".into(),
        }
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Output file location and naming.
#[derive(Clone, Debug)]
pub struct OutputConfig {
    /// Output file path
    pub path: PathBuf,
    /// Dimension names
    pub axes: AxisNames,
    /// Replace an existing file instead of writing into it
    pub replace: bool,
    /// Add dimensions missing from an existing file instead of failing
    pub append: bool,
    /// `title` global attribute
    pub title: Option<String>,
    /// Per-field dimension names overriding `axes`
    pub field_axes: IndexMap<String, AxisNames>,
}

impl OutputConfig {
    pub fn new(path: impl Into<PathBuf>, axes: AxisNames) -> Self {
        Self {
            path: path.into(),
            axes,
            replace: false,
            append: false,
            title: None,
            field_axes: IndexMap::new(),
        }
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Use different dimension names for one field.
    pub fn with_field_axes(mut self, field: impl Into<String>, axes: AxisNames) -> Self {
        self.field_axes.insert(field.into(), axes);
        self
    }

    /// Dimension names of one field.
    pub fn axes_for(&self, field: &str) -> &AxisNames {
        self.field_axes.get(field).unwrap_or(&self.axes)
    }
}

/// Dimensions resolved for a field set before anything is written.
#[derive(Debug, Default)]
struct WritePlan {
    /// Dimensions missing from the file, with their lengths
    new_dimensions: IndexMap<String, usize>,
    /// Dimension names of each field, in field order
    dimensions: Vec<Vec<String>>,
}

/// Writes field sets into a NetCDF container.
///
/// A file that does not exist yet (or is being replaced) is built in a
/// temporary sibling and only moved into place by [`OutputWriter::finish`].
/// Dropping an unfinished writer removes the temporary file, so a failed
/// run commits nothing.
///
/// # Example
///
/// ```no_run
/// use ic_regrid::io::{AxisNames, OutputConfig, OutputWriter, TimeAxis};
/// use ic_regrid::field::FieldSet;
///
/// # fn main() -> ic_regrid::Result<()> {
/// let mut writer = OutputWriter::new(OutputConfig::new("ocean_ic.nc", AxisNames::ocean("Layer")));
/// let dz = vec![5.0, 10.0, 20.0];
/// writer.initialize(Some(("Layer", dz.as_slice())), Some(&TimeAxis::new("time", vec![0.0])))?;
/// writer.write(&FieldSet::new(), 0)?;
/// writer.finish()?;
/// # Ok(())
/// # }
/// ```
pub struct OutputWriter {
    config: OutputConfig,
    working: PathBuf,
    created: bool,
    initialized: bool,
    finished: bool,
    time_name: Option<String>,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        let working = config.path.clone();
        Self {
            config,
            working,
            created: false,
            initialized: false,
            finished: false,
            time_name: None,
        }
    }

    /// Final output path.
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Prepare the container.
    ///
    /// If the file already exists (and is not being replaced), every expected
    /// dimension present must have the expected length. Otherwise a new file
    /// is created with the vertical dimension, an unlimited time dimension and
    /// their coordinate variables.
    pub fn initialize(&mut self, vertical: Option<(&str, &[f64])>, time: Option<&TimeAxis>) -> Result<()> {
        self.time_name = time.map(|t| t.name.clone());

        if self.config.path.exists() && !self.config.replace {
            self.check_existing(vertical, time)?;
            tracing::info!(path = %self.config.path.display(), "writing into existing output file");
        } else {
            self.working = temporary_sibling(&self.config.path);
            self.create(vertical, time)?;
            self.created = true;
            tracing::info!(path = %self.config.path.display(), "created output file");
        }
        self.initialized = true;
        Ok(())
    }

    fn check_existing(&self, vertical: Option<(&str, &[f64])>, time: Option<&TimeAxis>) -> Result<()> {
        let path = &self.config.path;
        let mut file = netcdf::append(path)?;

        if let Some((name, values)) = vertical {
            match file.dimension(name).map(|d| d.len()) {
                Some(len) if len != values.len() => {
                    return Err(RegridError::mismatch(
                        format!("dimension '{}' in {}", name, path.display()),
                        values.len(),
                        len,
                    ));
                }
                Some(_) => {}
                None if self.config.append => add_coordinate(&mut file, name, values)?,
                None => return Err(RegridError::missing(path.display().to_string(), name)),
            }
        }

        if let Some(axis) = time {
            if file.dimension(&axis.name).is_none() {
                if self.config.append {
                    add_time_axis(&mut file, axis)?;
                } else {
                    return Err(RegridError::missing(path.display().to_string(), &axis.name));
                }
            }
        }
        Ok(())
    }

    fn create(&self, vertical: Option<(&str, &[f64])>, time: Option<&TimeAxis>) -> Result<()> {
        let mut file = netcdf::create(&self.working)?;

        if let Some((name, values)) = vertical {
            add_coordinate(&mut file, name, values)?;
        }
        if let Some(axis) = time {
            add_time_axis(&mut file, axis)?;
        }

        file.add_attribute("Conventions", "CF-1.8")?;
        if let Some(ref title) = self.config.title {
            file.add_attribute("title", title.as_str())?;
        }
        let now = Utc::now();
        file.add_attribute(
            "history",
            format!("{}: Created by ic-regrid", now.format("%Y-%m-%d %H:%M:%S UTC")).as_str(),
        )?;
        Ok(())
    }

    /// Write every field, at `forecast_index` along time when a time axis is set.
    ///
    /// All fields are checked against the container first; a dimension
    /// disagreement in any of them leaves the file untouched.
    pub fn write(&mut self, fields: &FieldSet, forecast_index: usize) -> Result<()> {
        if !self.initialized {
            self.initialize(None, None)?;
        }
        let mut file = netcdf::append(&self.working)?;

        let plan = self.plan(&file, fields)?;
        for (name, &len) in &plan.new_dimensions {
            file.add_dimension(name, len)?;
        }
        for (field, dims) in fields.iter().zip(&plan.dimensions) {
            self.write_field(&mut file, field, dims, forecast_index)?;
        }
        tracing::info!(
            path = %self.config.path.display(),
            n_fields = fields.len(),
            forecast_index,
            "wrote fields"
        );
        Ok(())
    }

    fn plan(&self, file: &netcdf::File, fields: &FieldSet) -> Result<WritePlan> {
        let container = self.config.path.display().to_string();
        let mut plan = WritePlan::default();

        for field in fields.iter() {
            let axes = self.config.axes_for(field.name());
            let mut dims: Vec<String> = Vec::with_capacity(field.rank() + 1);
            if let Some(ref t) = self.time_name {
                dims.push(t.clone());
            }
            for (&role, &len) in field.axes().iter().zip(field.data().shape()) {
                let Some(name) = axes.for_role(role) else {
                    continue;
                };
                let existing = file
                    .dimension(name)
                    .map(|d| d.len())
                    .or_else(|| plan.new_dimensions.get(name).copied());
                match existing {
                    Some(expected) if expected != len => {
                        return Err(RegridError::mismatch(
                            format!("dimension '{}' of '{}' in {}", name, field.name(), container),
                            expected,
                            len,
                        ));
                    }
                    Some(_) => {}
                    None => {
                        plan.new_dimensions.insert(name.to_string(), len);
                    }
                }
                dims.push(name.to_string());
            }

            if let Some(var) = file.variable(field.name()) {
                let current: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
                if current != dims {
                    return Err(RegridError::mismatch(
                        format!("dimensions of variable '{}' in {}", field.name(), container),
                        &current,
                        &dims,
                    ));
                }
            }
            plan.dimensions.push(dims);
        }
        Ok(plan)
    }

    fn write_field(
        &self,
        file: &mut netcdf::FileMut,
        field: &GridField,
        dims: &[String],
        forecast_index: usize,
    ) -> Result<()> {
        let container = self.config.path.display().to_string();

        if file.variable(field.name()).is_none() {
            let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f64>(field.name(), &dim_refs)?;
            var.put_attribute("_FillValue", OUTPUT_FILL_VALUE)?;
            if let Some(units) = field.units() {
                var.put_attribute("units", units)?;
            }
            if let Some(long_name) = field.long_name() {
                var.put_attribute("long_name", long_name)?;
            }
        }

        let values: Vec<f64> = field
            .data()
            .iter()
            .map(|&v| if v.is_finite() { v } else { OUTPUT_FILL_VALUE })
            .collect();

        let mut var = file
            .variable_mut(field.name())
            .ok_or_else(|| RegridError::missing(&container, field.name()))?;
        if self.time_name.is_some() {
            let mut extents: Vec<netcdf::Extent> = vec![forecast_index.into()];
            extents.extend(field.data().shape().iter().map(|_| netcdf::Extent::from(..)));
            var.put_values(&values, extents)?;
        } else {
            var.put_values(&values, ..)?;
        }
        tracing::debug!(field = field.name(), ?dims, "wrote variable");
        Ok(())
    }

    /// Move a newly created file into place.
    pub fn finish(mut self) -> Result<PathBuf> {
        if self.created {
            fs::rename(&self.working, &self.config.path)?;
        }
        self.finished = true;
        Ok(self.config.path.clone())
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        if self.created && !self.finished && self.working.exists() {
            if let Err(e) = fs::remove_file(&self.working) {
                tracing::warn!(path = %self.working.display(), error = %e, "could not remove partial output");
            }
        }
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn add_coordinate(file: &mut netcdf::FileMut, name: &str, values: &[f64]) -> Result<()> {
    file.add_dimension(name, values.len())?;
    let mut var = file.add_variable::<f64>(name, &[name])?;
    var.put_attribute("_FillValue", OUTPUT_FILL_VALUE)?;
    var.put_values(values, ..)?;
    Ok(())
}

fn add_time_axis(file: &mut netcdf::FileMut, axis: &TimeAxis) -> Result<()> {
    file.add_unlimited_dimension(&axis.name)?;
    let mut var = file.add_variable::<f64>(&axis.name, &[axis.name.as_str()])?;
    var.put_attribute("long_name", axis.long_name.as_str())?;
    var.put_attribute("units", axis.units.as_str())?;
    var.put_attribute("calendar", axis.calendar.as_str())?;
    if !axis.values.is_empty() {
        var.put_values(&axis.values, vec![netcdf::Extent::from(0..axis.values.len())])?;
    }
    Ok(())
}
