//! Ocean state regridding: one scalar or one velocity pair per run.

use crate::error::Result;
use crate::field::{AxisRole, FieldSet, FillValue, GridField};
use crate::regrid::HorizontalRegridder;
use crate::rotation::{rotate_fields, RotationAngle, RotationDirection};
use crate::vertical::{BelowBottomPolicy, VerticalCoordinate, VerticalRemapper};
use crate::weights::WeightStore;

/// Input of one ocean regridding run.
#[derive(Clone, Debug)]
pub enum OceanVariable {
    /// A scalar such as temperature, salinity or sea surface height
    Scalar(GridField),
    /// Velocity components in the source grid's local frame
    Vector { u: GridField, v: GridField },
}

impl OceanVariable {
    /// Build from one field (scalar) or two (vector); other counts are `None`.
    pub fn from_fields(fields: Vec<GridField>) -> Option<Self> {
        let mut fields = fields.into_iter();
        match (fields.next(), fields.next(), fields.next()) {
            (Some(s), None, None) => Some(Self::Scalar(s)),
            (Some(u), Some(v), None) => Some(Self::Vector { u, v }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
struct VerticalStep {
    source: VerticalCoordinate,
    destination: VerticalCoordinate,
    remapper: VerticalRemapper,
}

/// Regrids ocean fields horizontally and, optionally, vertically.
///
/// Vector components are remapped with their own weight store when one is
/// given for `v` (u and v points of a staggered grid), otherwise both use
/// the same store. Rotation back to the destination frame needs both
/// components on the same horizontal grid.
///
/// # Example
///
/// ```
/// use ic_regrid::field::GridField;
/// use ic_regrid::pipeline::{OceanRemapPipeline, OceanVariable};
/// use ic_regrid::weights::{WeightStore, WeightTriplets};
/// use ndarray::array;
///
/// let weights = WeightStore::from_triplets("mean", WeightTriplets {
///     n_a: 2, n_b: 1, row: vec![1, 1], col: vec![1, 2], s: vec![0.5, 0.5], dst_grid_dims: vec![1, 1],
/// }).unwrap();
/// let ssh = GridField::surface("ssh", array![[0.2, 0.4]]);
///
/// let out = OceanRemapPipeline::new(&weights)
///     .process(OceanVariable::Scalar(ssh))
///     .unwrap();
/// assert!((out.get("ssh").unwrap().data()[[0, 0]] - 0.3).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct OceanRemapPipeline<'a> {
    weights: &'a WeightStore,
    v_weights: Option<&'a WeightStore>,
    src_angle: Option<&'a RotationAngle>,
    dst_angle: Option<&'a RotationAngle>,
    vertical: Option<VerticalStep>,
}

impl<'a> OceanRemapPipeline<'a> {
    /// Pipeline using one weight store for everything.
    pub fn new(weights: &'a WeightStore) -> Self {
        Self {
            weights,
            v_weights: None,
            src_angle: None,
            dst_angle: None,
            vertical: None,
        }
    }

    /// Separate weights for the v component.
    pub fn with_v_weights(mut self, weights: &'a WeightStore) -> Self {
        self.v_weights = Some(weights);
        self
    }

    /// Source and destination grid angles. A missing angle means that grid
    /// is already aligned with east/north.
    pub fn with_angles(mut self, src: Option<&'a RotationAngle>, dst: Option<&'a RotationAngle>) -> Self {
        self.src_angle = src;
        self.dst_angle = dst;
        self
    }

    /// Interpolate level-stacked fields from `source` onto `destination` depths.
    pub fn with_vertical(
        mut self,
        source: VerticalCoordinate,
        destination: VerticalCoordinate,
        policy: BelowBottomPolicy,
    ) -> Self {
        self.vertical = Some(VerticalStep {
            source,
            destination,
            remapper: VerticalRemapper::new(policy),
        });
        self
    }

    /// Regrid one variable. The result keeps the input field names.
    pub fn process(&self, input: OceanVariable) -> Result<FieldSet> {
        let remapped = match input {
            OceanVariable::Scalar(field) => {
                vec![HorizontalRegridder::new(self.weights).remap_field(&field)?]
            }
            OceanVariable::Vector { u, v } => {
                let (u, v) = self.remap_vector(u, v)?;
                vec![u, v]
            }
        };

        let mut out = FieldSet::from_source(self.weights.origin());
        for field in remapped {
            out.insert(self.remap_vertical(field)?);
        }
        tracing::info!(n_fields = out.len(), "ocean remap complete");
        Ok(out)
    }

    fn remap_vector(&self, u: GridField, v: GridField) -> Result<(GridField, GridField)> {
        let (u, v) = match self.src_angle {
            Some(angle) => {
                let (mut u, mut v) = (u, v);
                let scrubbed = FillValue::default().scrub_pair(u.data_mut(), v.data_mut())?;
                tracing::debug!(scrubbed, "zeroed missing vector cells before rotation");
                rotate_fields(&u, &v, angle, RotationDirection::ToGeographic)?
            }
            None => (u, v),
        };

        let u = HorizontalRegridder::new(self.weights).remap_field(&u)?;
        let v = HorizontalRegridder::new(self.v_weights.unwrap_or(self.weights)).remap_field(&v)?;

        match self.dst_angle {
            Some(angle) => rotate_fields(&u, &v, angle, RotationDirection::ToGridLocal),
            None => Ok((u, v)),
        }
    }

    fn remap_vertical(&self, field: GridField) -> Result<GridField> {
        match self.vertical {
            Some(ref step) if field.stack_axis() == Some(AxisRole::Level) => {
                tracing::debug!(
                    field = field.name(),
                    from = %step.source,
                    to = %step.destination,
                    "vertical remap"
                );
                step.remapper
                    .remap_field(&field, &step.source, &step.destination)
            }
            _ => Ok(field),
        }
    }

    /// Read, regrid and write one ocean variable as configured.
    ///
    /// The output file is created with the vertical and time axes if absent,
    /// otherwise its axes are checked and the fields written into it at
    /// `forecast_iter`.
    #[cfg(feature = "netcdf")]
    pub fn run(config: &crate::config::OceanRemapConfig) -> Result<std::path::PathBuf> {
        use crate::error::RegridError;
        use crate::io::{
            read_angle, read_coordinate, read_field, read_time_axis, AxisNames, OutputConfig, OutputWriter,
        };

        config.validate()?;
        tracing::info!(variables = ?config.variables, "starting ocean remap");

        let dz = read_coordinate(&config.vertical.file, &config.vertical.thickness)?;
        let time_file = config
            .time_file()
            .ok_or_else(|| RegridError::Config("no file to read the time axis from".into()))?;
        let time = read_time_axis(time_file, &config.time.name)?.renamed(config.time.output_name());

        let vertical_name = config.vertical.output_name();
        let mut output = OutputConfig::new(&config.output, AxisNames::ocean(vertical_name))
            .with_title("Ocean initial conditions");
        for (name, axes) in config.output_names().iter().zip(config.horizontal_axes()) {
            output = output.with_field_axes(
                name.as_str(),
                AxisNames::ocean(vertical_name).with_horizontal(axes.y, axes.x),
            );
        }
        let mut writer = OutputWriter::new(output);
        writer.initialize(Some((vertical_name, dz.as_slice())), Some(&time))?;

        let fields = config
            .sources
            .iter()
            .zip(&config.variables)
            .map(|(path, name)| read_field(path, name, AxisRole::Level))
            .collect::<Result<Vec<_>>>()?;
        let input = OceanVariable::from_fields(fields)
            .ok_or_else(|| RegridError::Config("expected one scalar or two vector variables".into()))?;

        let weights = config
            .weights
            .iter()
            .map(WeightStore::load)
            .collect::<Result<Vec<_>>>()?;
        let load_angle = |source: &crate::config::AngleSource| {
            read_angle(&source.file, &source.variable, source.supergrid)
        };
        let src_angle = config.source_angle.as_ref().map(load_angle).transpose()?;
        let dst_angle = config.destination_angle.as_ref().map(load_angle).transpose()?;

        let mut pipeline = OceanRemapPipeline::new(&weights[0]).with_angles(src_angle.as_ref(), dst_angle.as_ref());
        if let Some(v_weights) = weights.get(1) {
            pipeline = pipeline.with_v_weights(v_weights);
        }
        if let Some(ref remap) = config.vertical_remap {
            let file = remap
                .file
                .as_deref()
                .or_else(|| config.sources.first().map(|p| p.as_path()))
                .ok_or_else(|| RegridError::Config("no file to read source depths from".into()))?;
            let source = VerticalCoordinate::from_depths(&remap.depth, read_coordinate(file, &remap.depth)?)?;
            let destination = VerticalCoordinate::from_thicknesses(vertical_name, &dz)?;
            pipeline = pipeline.with_vertical(source, destination, remap.below_bottom);
        }

        let remapped = pipeline.process(input)?;
        let mut renamed = FieldSet::from_source(remapped.source());
        for (field, name) in remapped.iter().zip(config.output_names()) {
            renamed.insert(field.clone().renamed(name.as_str()));
        }

        writer.write(&renamed, config.forecast_iter)?;
        let path = writer.finish()?;
        tracing::info!(output = %path.display(), forecast_iter = config.forecast_iter, "ocean remap complete");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegridError;
    use crate::weights::WeightTriplets;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3};
    use std::f64::consts::FRAC_PI_2;

    fn identity(ny: usize, nx: usize) -> WeightStore {
        let n = ny * nx;
        WeightStore::from_triplets(
            "identity",
            WeightTriplets {
                n_a: n,
                n_b: n,
                row: (1..=n as i64).collect(),
                col: (1..=n as i64).collect(),
                s: vec![1.0; n],
                dst_grid_dims: vec![nx as i64, ny as i64],
            },
        )
        .unwrap()
    }

    fn mean_of_two() -> WeightStore {
        WeightStore::from_triplets(
            "mean",
            WeightTriplets {
                n_a: 2,
                n_b: 1,
                row: vec![1, 1],
                col: vec![1, 2],
                s: vec![0.5, 0.5],
                dst_grid_dims: vec![1, 1],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_from_fields() {
        let f = || GridField::surface("f", Array2::zeros((1, 1)));
        assert!(matches!(OceanVariable::from_fields(vec![f()]), Some(OceanVariable::Scalar(_))));
        assert!(matches!(
            OceanVariable::from_fields(vec![f(), f()]),
            Some(OceanVariable::Vector { .. })
        ));
        assert!(OceanVariable::from_fields(vec![]).is_none());
        assert!(OceanVariable::from_fields(vec![f(), f(), f()]).is_none());
    }

    #[test]
    fn test_scalar_ignores_angles() {
        let weights = identity(1, 2);
        let angle = RotationAngle::new(Array2::from_elem((1, 2), FRAC_PI_2));
        let out = OceanRemapPipeline::new(&weights)
            .with_angles(Some(&angle), Some(&angle))
            .process(OceanVariable::Scalar(GridField::surface("ssh", array![[1.0, 2.0]])))
            .unwrap();
        assert_eq!(out.get("ssh").unwrap().data().as_slice().unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_vector_rotated_both_ways() {
        let weights = identity(1, 1);
        let src = RotationAngle::new(Array2::from_elem((1, 1), FRAC_PI_2));
        let dst = RotationAngle::new(Array2::from_elem((1, 1), FRAC_PI_2));
        let out = OceanRemapPipeline::new(&weights)
            .with_angles(Some(&src), Some(&dst))
            .process(OceanVariable::Vector {
                u: GridField::surface("u", array![[1.0]]),
                v: GridField::surface("v", array![[2.0]]),
            })
            .unwrap();
        // same angle on both grids: the rotations cancel
        assert_relative_eq!(out.get("u").unwrap().data()[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(out.get("v").unwrap().data()[[0, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vector_separate_weights() {
        let u_weights = identity(1, 2);
        let v_weights = mean_of_two();
        let out = OceanRemapPipeline::new(&u_weights)
            .with_v_weights(&v_weights)
            .process(OceanVariable::Vector {
                u: GridField::surface("u", array![[1.0, 3.0]]),
                v: GridField::surface("v", array![[1.0, 3.0]]),
            })
            .unwrap();
        assert_eq!(out.get("u").unwrap().data().shape(), &[1, 2]);
        assert_eq!(out.get("v").unwrap().data().shape(), &[1, 1]);
        assert_relative_eq!(out.get("v").unwrap().data()[[0, 0]], 2.0);
    }

    #[test]
    fn test_destination_rotation_needs_common_grid() {
        let u_weights = identity(1, 2);
        let v_weights = mean_of_two();
        let dst = RotationAngle::new(Array2::zeros((1, 2)));
        let err = OceanRemapPipeline::new(&u_weights)
            .with_v_weights(&v_weights)
            .with_angles(None, Some(&dst))
            .process(OceanVariable::Vector {
                u: GridField::surface("u", array![[1.0, 3.0]]),
                v: GridField::surface("v", array![[1.0, 3.0]]),
            })
            .unwrap_err();
        assert!(matches!(err, RegridError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_fill_cell_not_rotated_into_output() {
        use crate::field::SOURCE_FILL_VALUE;

        let weights = mean_of_two();
        let src = RotationAngle::new(Array2::from_elem((1, 2), 0.3));
        let out = OceanRemapPipeline::new(&weights)
            .with_angles(Some(&src), None)
            .process(OceanVariable::Vector {
                u: GridField::surface("u", array![[0.5, SOURCE_FILL_VALUE]]),
                v: GridField::surface("v", array![[0.1, SOURCE_FILL_VALUE]]),
            })
            .unwrap();

        // only the valid cell contributes, with half weight
        let (c, s) = (0.3f64.cos(), 0.3f64.sin());
        let u = out.get("u").unwrap().data()[[0, 0]];
        let v = out.get("v").unwrap().data()[[0, 0]];
        assert_relative_eq!(u, 0.5 * (0.5 * c + 0.1 * s), epsilon = 1e-12);
        assert_relative_eq!(v, 0.5 * (0.1 * c - 0.5 * s), epsilon = 1e-12);
    }

    #[test]
    fn test_fill_in_one_component_zeroes_both() {
        use crate::field::SOURCE_FILL_VALUE;

        let weights = identity(1, 2);
        let src = RotationAngle::new(Array2::from_elem((1, 2), 1.0));
        let out = OceanRemapPipeline::new(&weights)
            .with_angles(Some(&src), None)
            .process(OceanVariable::Vector {
                u: GridField::surface("u", array![[0.0, 2.0]]),
                v: GridField::surface("v", array![[0.0, SOURCE_FILL_VALUE]]),
            })
            .unwrap();
        assert_eq!(out.get("u").unwrap().data()[[0, 1]], 0.0);
        assert_eq!(out.get("v").unwrap().data()[[0, 1]], 0.0);
    }

    #[test]
    fn test_vertical_remap_after_horizontal() {
        let weights = identity(1, 1);
        let src = VerticalCoordinate::from_depths("Depth", vec![0.0, 10.0, 20.0]).unwrap();
        let dst = VerticalCoordinate::from_thicknesses("Layer", &[5.0, 10.0, 20.0]).unwrap();
        let temp = Array3::from_shape_vec((3, 1, 1), vec![4.0, 2.0, 1.0]).unwrap();
        let out = OceanRemapPipeline::new(&weights)
            .with_vertical(src, dst, BelowBottomPolicy::Zero)
            .process(OceanVariable::Scalar(GridField::stacked("temp", AxisRole::Level, temp)))
            .unwrap();

        let column: Vec<f64> = out.get("temp").unwrap().data().iter().copied().collect();
        assert_relative_eq!(column[0], 3.5);
        assert_relative_eq!(column[1], 2.0);
        assert_eq!(column[2], 0.0);
    }

    #[test]
    fn test_surface_field_skips_vertical() {
        let weights = identity(1, 1);
        let src = VerticalCoordinate::from_depths("Depth", vec![0.0, 10.0]).unwrap();
        let dst = VerticalCoordinate::from_depths("Layer", vec![5.0]).unwrap();
        let out = OceanRemapPipeline::new(&weights)
            .with_vertical(src, dst, BelowBottomPolicy::HoldDeepest)
            .process(OceanVariable::Scalar(GridField::surface("ssh", array![[0.7]])))
            .unwrap();
        assert_eq!(out.get("ssh").unwrap().data()[[0, 0]], 0.7);
    }
}
