//! Run configuration for the ice and ocean pipelines and the bathymetry
//! workflow steps.
//!
//! Both pipelines are driven by a TOML file naming every input, output and
//! variable. Sections not given fall back to their defaults.
//!
//! ```toml
//! weights = "wgt_tripole_to_latlon.nc"
//! source = "cice.restart.nc"
//! output = "cice_ic.nc"
//!
//! [source_angle]
//! file = "tripole_hgrid.nc"
//! variable = "angle_dx"
//! supergrid = true
//!
//! [destination_angle]
//! file = "latlon_hgrid.nc"
//! supergrid = true
//!
//! [mask]
//! file = "kmt.nc"
//!
//! [physics]
//! min_ice_fraction = 0.15
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{RegridError, Result};
use crate::thermo::{IceFieldNames, PhysicalParams};
use crate::vertical::BelowBottomPolicy;

/// Read and parse a TOML configuration file.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let config = toml::from_str(&text)?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

/// Location of a grid rotation angle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AngleSource {
    /// File holding the angle
    pub file: PathBuf,

    /// Variable name
    /// default: "angle_dx"
    #[serde(default = "default_angle_variable")]
    pub variable: String,

    /// The angle is on a supergrid and must be sampled at cell centers
    /// default: false
    #[serde(default)]
    pub supergrid: bool,
}

fn default_angle_variable() -> String {
    "angle_dx".into()
}

/// Location of the destination ocean mask.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaskSource {
    pub file: PathBuf,

    /// default: "mask"
    #[serde(default = "default_mask_variable")]
    pub variable: String,
}

fn default_mask_variable() -> String {
    "mask".into()
}

/// Sea-ice restart regridding run.
#[derive(Debug, Clone, Deserialize)]
pub struct IceRemapConfig {
    /// ESMF weight file, source → destination tracer points
    pub weights: PathBuf,
    /// Source restart file
    pub source: PathBuf,
    /// Output file; replaced if it exists
    pub output: PathBuf,
    pub source_angle: AngleSource,
    pub destination_angle: AngleSource,
    pub mask: MaskSource,

    /// Source fields not carried to the output
    #[serde(default = "default_ice_drop")]
    pub drop: Vec<String>,

    /// Velocity component names
    #[serde(default = "default_u_name")]
    pub u_name: String,
    #[serde(default = "default_v_name")]
    pub v_name: String,

    #[serde(default)]
    pub physics: PhysicalParams,
    #[serde(default)]
    pub fields: IceFieldNames,
}

fn default_ice_drop() -> Vec<String> {
    ["fsnow", "iage", "alvl", "vlvl", "apnd", "hpnd", "ipnd", "dhs", "ffrac"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_u_name() -> String {
    "uvel".into()
}

fn default_v_name() -> String {
    "vvel".into()
}

impl IceRemapConfig {
    /// Check settings that cannot be expressed in the types.
    pub fn validate(&self) -> Result<()> {
        if self.u_name == self.v_name {
            return Err(RegridError::Config(format!(
                "velocity components must differ, both are '{}'",
                self.u_name
            )));
        }
        if self.physics.n_ice_layers == 0 {
            return Err(RegridError::Config("n_ice_layers must be at least 1".into()));
        }
        Ok(())
    }
}

/// Vertical axis of the ocean output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerticalSource {
    /// File holding the destination layer thicknesses
    pub file: PathBuf,
    /// Thickness variable name
    pub thickness: String,
    /// Output name of the vertical axis; defaults to `thickness`
    #[serde(default)]
    pub output_name: Option<String>,
}

impl VerticalSource {
    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(&self.thickness)
    }
}

/// Time axis of the ocean output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSource {
    /// File holding the time coordinate; defaults to the first source file
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Time variable name
    pub name: String,
    /// Output name of the time axis; defaults to `name`
    #[serde(default)]
    pub output_name: Option<String>,
}

impl TimeSource {
    pub fn output_name(&self) -> &str {
        self.output_name.as_deref().unwrap_or(&self.name)
    }
}

/// Interpolation from the source depth levels onto the destination layers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VerticalRemapSource {
    /// File holding the source depth coordinate; defaults to the first source file
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Source depth variable name
    pub depth: String,
    /// Treatment of destination depths below the deepest source level
    #[serde(default)]
    pub below_bottom: BelowBottomPolicy,
}

/// Horizontal dimension names of one output variable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HorizontalAxes {
    pub y: String,
    pub x: String,
}

impl HorizontalAxes {
    pub fn new(y: impl Into<String>, x: impl Into<String>) -> Self {
        Self {
            y: y.into(),
            x: x.into(),
        }
    }
}

/// Ocean state regridding run: one scalar or one u/v vector pair.
#[derive(Debug, Clone, Deserialize)]
pub struct OceanRemapConfig {
    /// One name for a scalar, two (u, v) for a vector
    pub variables: Vec<String>,
    /// One source file per variable
    pub sources: Vec<PathBuf>,
    /// One weight file, or one per vector component (u points, v points)
    pub weights: Vec<PathBuf>,
    /// Output file; written into if it exists
    pub output: PathBuf,
    /// Output variable names; default to `variables`
    #[serde(default)]
    pub output_names: Option<Vec<String>>,
    pub vertical: VerticalSource,
    pub time: TimeSource,
    /// Index along the output time axis
    /// default: 0
    #[serde(default)]
    pub forecast_iter: usize,
    #[serde(default)]
    pub source_angle: Option<AngleSource>,
    #[serde(default)]
    pub destination_angle: Option<AngleSource>,
    #[serde(default)]
    pub vertical_remap: Option<VerticalRemapSource>,
    /// Horizontal dimension names, one entry per variable
    #[serde(default)]
    pub horizontal_axes: Option<Vec<HorizontalAxes>>,
}

impl OceanRemapConfig {
    /// True when the run regrids a u/v pair.
    pub fn is_vector(&self) -> bool {
        self.variables.len() == 2
    }

    /// Output variable names, falling back to the input names.
    pub fn output_names(&self) -> &[String] {
        self.output_names.as_deref().unwrap_or(&self.variables)
    }

    /// Horizontal dimension names of each output variable.
    ///
    /// Without an explicit list, a vector remapped with separate u and v
    /// weights lands on the C-grid velocity points (`yh`/`xq` for u,
    /// `yq`/`xh` for v); everything else lands on tracer points (`yh`/`xh`).
    pub fn horizontal_axes(&self) -> Vec<HorizontalAxes> {
        if let Some(ref axes) = self.horizontal_axes {
            return axes.clone();
        }
        if self.is_vector() && self.weights.len() == 2 {
            vec![HorizontalAxes::new("yh", "xq"), HorizontalAxes::new("yq", "xh")]
        } else {
            vec![HorizontalAxes::new("yh", "xh"); self.variables.len()]
        }
    }

    /// File holding the time coordinate.
    pub fn time_file(&self) -> Option<&Path> {
        self.time
            .file
            .as_deref()
            .or_else(|| self.sources.first().map(PathBuf::as_path))
    }

    /// Check list lengths and pairings.
    pub fn validate(&self) -> Result<()> {
        let n = self.variables.len();
        if n != 1 && n != 2 {
            return Err(RegridError::Config(format!(
                "expected one scalar or two vector variables, got {}",
                n
            )));
        }
        if self.sources.len() != n {
            return Err(RegridError::Config(format!(
                "{} variables need {} source files, got {}",
                n,
                n,
                self.sources.len()
            )));
        }
        if self.weights.is_empty() || self.weights.len() > n {
            return Err(RegridError::Config(format!(
                "expected 1 to {} weight files, got {}",
                n,
                self.weights.len()
            )));
        }
        if let Some(ref axes) = self.horizontal_axes {
            if axes.len() != n {
                return Err(RegridError::Config(format!(
                    "{} variables need {} horizontal axis pairs, got {}",
                    n,
                    n,
                    axes.len()
                )));
            }
        }
        if let Some(ref names) = self.output_names {
            if names.len() != n {
                return Err(RegridError::Config(format!(
                    "{} variables need {} output names, got {}",
                    n,
                    n,
                    names.len()
                )));
            }
        }
        Ok(())
    }
}

/// Interface heights added to a finished ocean initial-condition file.
///
/// ```toml
/// file = "ocean_ic.nc"
/// thickness = "h"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InterfaceHeightConfig {
    /// Ocean file read from and written into
    pub file: PathBuf,
    /// Layer thickness variable
    pub thickness: String,

    /// Time dimension; used only when the thickness variable leads with it
    /// default: "time"
    #[serde(default = "default_time_dim")]
    pub time_dim: String,

    /// default: "eta"
    #[serde(default = "default_eta_name")]
    pub output_name: String,

    /// Interface dimension, one longer than the layer dimension
    /// default: "zp"
    #[serde(default = "default_interface_dim")]
    pub dimension: String,

    /// Height of the top interface
    /// default: 0.0
    #[serde(default)]
    pub surface: f64,
}

fn default_time_dim() -> String {
    "time".into()
}

fn default_eta_name() -> String {
    "eta".into()
}

fn default_interface_dim() -> String {
    "zp".into()
}

/// Merge of a remapped bathymetry into the model's own.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopographyPatchConfig {
    /// Model bathymetry
    pub original: PathBuf,
    /// Bathymetry remapped from the source grid
    pub remapped: PathBuf,
    /// Patched bathymetry; replaced if it exists
    pub output: PathBuf,

    /// default: "depth"
    #[serde(default = "default_depth_variable")]
    pub variable: String,

    /// Depth both grids must exceed for the remapped value to be kept
    /// default: 1.0
    #[serde(default = "default_min_depth")]
    pub min_depth: f64,
}

fn default_depth_variable() -> String {
    "depth".into()
}

fn default_min_depth() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ICE: &str = r#"
        weights = "wgt.nc"
        source = "cice.nc"
        output = "out.nc"

        [source_angle]
        file = "tripole.nc"
        supergrid = true

        [destination_angle]
        file = "latlon.nc"
        variable = "angle"

        [mask]
        file = "kmt.nc"

        [physics]
        min_ice_fraction = 0.15
    "#;

    const OCEAN: &str = r#"
        variables = ["u", "v"]
        sources = ["u.nc", "v.nc"]
        weights = ["wgt_u.nc", "wgt_v.nc"]
        output = "ocean_ic.nc"
        forecast_iter = 2

        [vertical]
        file = "vgrid.nc"
        thickness = "dz"
        output_name = "Layer"

        [time]
        name = "MT"
        output_name = "time"

        [vertical_remap]
        depth = "Depth"
        below_bottom = "hold_deepest"
    "#;

    #[test]
    fn test_ice_config_defaults() {
        let config: IceRemapConfig = toml::from_str(ICE).unwrap();
        assert_eq!(config.source_angle.variable, "angle_dx");
        assert!(config.source_angle.supergrid);
        assert!(!config.destination_angle.supergrid);
        assert_eq!(config.destination_angle.variable, "angle");
        assert_eq!(config.mask.variable, "mask");
        assert_eq!(config.drop.len(), 9);
        assert!(config.drop.iter().any(|d| d == "ffrac"));
        assert_eq!(config.u_name, "uvel");
        assert_eq!(config.physics.min_ice_fraction, 0.15);
        assert_eq!(config.physics.min_ice_volume, 1.0e-5);
        assert_eq!(config.fields.ice_fraction, "aicen");
        config.validate().unwrap();
    }

    #[test]
    fn test_ice_config_same_velocity_names() {
        let mut config: IceRemapConfig = toml::from_str(ICE).unwrap();
        config.v_name = "uvel".into();
        assert!(matches!(config.validate(), Err(RegridError::Config(_))));
    }

    #[test]
    fn test_ocean_config_vector() {
        let config: OceanRemapConfig = toml::from_str(OCEAN).unwrap();
        config.validate().unwrap();
        assert!(config.is_vector());
        assert_eq!(config.forecast_iter, 2);
        assert_eq!(config.output_names(), ["u", "v"]);
        assert_eq!(config.vertical.output_name(), "Layer");
        assert_eq!(config.time.output_name(), "time");
        assert_eq!(config.time_file(), Some(Path::new("u.nc")));
        let remap = config.vertical_remap.as_ref().unwrap();
        assert_eq!(remap.below_bottom, BelowBottomPolicy::HoldDeepest);
        assert!(config.source_angle.is_none());
    }

    #[test]
    fn test_horizontal_axes_defaults() {
        let config: OceanRemapConfig = toml::from_str(OCEAN).unwrap();
        assert_eq!(
            config.horizontal_axes(),
            vec![HorizontalAxes::new("yh", "xq"), HorizontalAxes::new("yq", "xh")]
        );

        let mut shared = config.clone();
        shared.weights.pop();
        assert_eq!(shared.horizontal_axes(), vec![HorizontalAxes::new("yh", "xh"); 2]);

        let text = format!("{}\n[[horizontal_axes]]\ny = \"lat\"\nx = \"lon\"\n", OCEAN);
        let mut explicit: OceanRemapConfig = toml::from_str(&text).unwrap();
        assert!(matches!(explicit.validate(), Err(RegridError::Config(_))));
        explicit.horizontal_axes = Some(vec![HorizontalAxes::new("lat", "lon"); 2]);
        explicit.validate().unwrap();
        assert_eq!(explicit.horizontal_axes()[1].x, "lon");
    }

    #[test]
    fn test_ocean_config_length_checks() {
        let mut config: OceanRemapConfig = toml::from_str(OCEAN).unwrap();
        config.sources.pop();
        assert!(matches!(config.validate(), Err(RegridError::Config(_))));

        let mut config: OceanRemapConfig = toml::from_str(OCEAN).unwrap();
        config.variables = vec!["a".into(), "b".into(), "c".into()];
        assert!(matches!(config.validate(), Err(RegridError::Config(_))));

        let mut config: OceanRemapConfig = toml::from_str(OCEAN).unwrap();
        config.output_names = Some(vec!["only_one".into()]);
        assert!(matches!(config.validate(), Err(RegridError::Config(_))));
    }

    #[test]
    fn test_workflow_config_defaults() {
        let eta: InterfaceHeightConfig = toml::from_str("file = \"ic.nc\"\nthickness = \"h\"").unwrap();
        assert_eq!(eta.time_dim, "time");
        assert_eq!(eta.output_name, "eta");
        assert_eq!(eta.dimension, "zp");
        assert_eq!(eta.surface, 0.0);

        let topo: TopographyPatchConfig = toml::from_str(
            "original = \"ocean_topog.nc\"\nremapped = \"remap.ocean_topog.nc\"\noutput = \"patch.nc\"\nmin_depth = 2.5",
        )
        .unwrap();
        assert_eq!(topo.variable, "depth");
        assert_eq!(topo.min_depth, 2.5);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(OCEAN.as_bytes()).unwrap();
        let config: OceanRemapConfig = load_config(file.path()).unwrap();
        assert_eq!(config.variables, ["u", "v"]);
    }

    #[test]
    fn test_load_config_errors() {
        let missing = load_config::<OceanRemapConfig>("/nonexistent/run.toml");
        assert!(matches!(missing, Err(RegridError::Io(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"variables = 3").unwrap();
        let bad = load_config::<OceanRemapConfig>(file.path());
        assert!(matches!(bad, Err(RegridError::Toml(_))));
    }
}
