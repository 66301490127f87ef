//! Sea-ice restart regridding.

use crate::error::Result;
use crate::field::{FieldSet, FillValue};
use crate::regrid::HorizontalRegridder;
use crate::rotation::{rotate_fields, RotationAngle, RotationDirection};
use crate::thermo::ConsistencyEnforcer;
use crate::weights::WeightStore;

/// Source fields never carried into an ice initial condition.
const DEFAULT_DROP: &[&str] = &["fsnow", "iage", "alvl", "vlvl", "apnd", "hpnd", "ipnd", "dhs", "ffrac"];

/// Regrids a sea-ice restart onto a new grid and repairs its thermodynamic state.
///
/// # Example
///
/// ```
/// use ic_regrid::field::{AxisRole, FieldSet, GridField};
/// use ic_regrid::pipeline::IceRemapPipeline;
/// use ic_regrid::rotation::RotationAngle;
/// use ic_regrid::thermo::{ConsistencyEnforcer, IceFieldNames, OceanMask, PhysicalParams};
/// use ic_regrid::types::LayerIndex;
/// use ic_regrid::weights::{WeightStore, WeightTriplets};
/// use ndarray::{Array2, Array3};
///
/// let weights = WeightStore::from_triplets("identity", WeightTriplets {
///     n_a: 1, n_b: 1, row: vec![1], col: vec![1], s: vec![1.0], dst_grid_dims: vec![1, 1],
/// }).unwrap();
/// let params = PhysicalParams::default().with_n_ice_layers(2);
/// let names = IceFieldNames::default();
///
/// let cat = |v: f64| Array3::from_elem((1, 1, 1), v);
/// let mut source = FieldSet::new()
///     .with(GridField::stacked("aicen", AxisRole::Category, cat(0.05)))
///     .with(GridField::stacked("vicen", AxisRole::Category, cat(0.1)))
///     .with(GridField::stacked("vsnon", AxisRole::Category, cat(0.0)))
///     .with(GridField::stacked("Tsfcn", AxisRole::Category, cat(-5.0)))
///     .with(GridField::stacked("qsno001", AxisRole::Category, cat(0.0)))
///     .with(GridField::surface("iceumask", Array2::ones((1, 1))))
///     .with(GridField::surface("uvel", Array2::zeros((1, 1))))
///     .with(GridField::surface("vvel", Array2::zeros((1, 1))))
///     .with(GridField::surface("iage", Array2::ones((1, 1))));
/// for layer in LayerIndex::iter(2) {
///     source.insert(GridField::stacked(names.ice_enthalpy(layer), AxisRole::Category, cat(-3.0e8)));
/// }
///
/// let angle = RotationAngle::new(Array2::zeros((1, 1)));
/// let enforcer = ConsistencyEnforcer::new(params, names, OceanMask::all_wet(1, 1));
/// let out = IceRemapPipeline::new()
///     .process(source, &weights, &angle, &angle, &enforcer)
///     .unwrap();
///
/// assert!(!out.contains("iage"));
/// assert_eq!(out.get("aicen").unwrap().data()[[0, 0, 0]], 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct IceRemapPipeline {
    drop: Vec<String>,
    u_name: String,
    v_name: String,
}

impl Default for IceRemapPipeline {
    fn default() -> Self {
        Self {
            drop: DEFAULT_DROP.iter().map(|s| s.to_string()).collect(),
            u_name: "uvel".into(),
            v_name: "vvel".into(),
        }
    }
}

impl IceRemapPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list of source fields removed before regridding.
    pub fn with_drop(mut self, drop: Vec<String>) -> Self {
        self.drop = drop;
        self
    }

    /// Names of the velocity components rotated around the remap.
    pub fn with_velocity(mut self, u_name: impl Into<String>, v_name: impl Into<String>) -> Self {
        self.u_name = u_name.into();
        self.v_name = v_name.into();
        self
    }

    pub fn dropped(&self) -> &[String] {
        &self.drop
    }

    /// Regrid `source` and enforce consistency on the result.
    ///
    /// The velocity pair is rotated to geographic with `src_angle` before the
    /// remap and back to grid-local with `dst_angle` after it.
    pub fn process(
        &self,
        mut source: FieldSet,
        weights: &WeightStore,
        src_angle: &RotationAngle,
        dst_angle: &RotationAngle,
        enforcer: &ConsistencyEnforcer,
    ) -> Result<FieldSet> {
        let dropped = self
            .drop
            .iter()
            .filter(|name| source.remove(name).is_some())
            .count();
        tracing::debug!(dropped, remaining = source.len(), "dropped unused source fields");

        self.rotate_velocity(&mut source, src_angle, RotationDirection::ToGeographic)?;
        let mut remapped = HorizontalRegridder::new(weights).remap(&source)?;
        self.rotate_velocity(&mut remapped, dst_angle, RotationDirection::ToGridLocal)?;

        let (fields, summary) = enforcer.enforce_with_summary(remapped)?;
        tracing::info!("{}", summary);
        Ok(fields)
    }

    fn rotate_velocity(
        &self,
        fields: &mut FieldSet,
        angle: &RotationAngle,
        direction: RotationDirection,
    ) -> Result<()> {
        let mut u = fields.get(&self.u_name)?.clone();
        let mut v = fields.get(&self.v_name)?.clone();
        if direction == RotationDirection::ToGeographic {
            let scrubbed = FillValue::default().scrub_pair(u.data_mut(), v.data_mut())?;
            tracing::debug!(scrubbed, "zeroed missing velocity cells before rotation");
        }
        let (u, v) = rotate_fields(&u, &v, angle, direction)?;
        fields.insert(u);
        fields.insert(v);
        Ok(())
    }

    /// Read, regrid, repair and write one ice restart as configured.
    ///
    /// The output file is replaced if it exists.
    #[cfg(feature = "netcdf")]
    pub fn run(config: &crate::config::IceRemapConfig) -> Result<std::path::PathBuf> {
        use crate::field::AxisRole;
        use crate::io::{read_angle, read_field_set, read_mask, AxisNames, OutputConfig, OutputWriter};

        config.validate()?;
        tracing::info!(source = %config.source.display(), "starting ice remap");

        let weights = WeightStore::load(&config.weights)?;
        let source = read_field_set(&config.source, AxisRole::Category, &config.drop)?;
        let src_angle = read_angle(
            &config.source_angle.file,
            &config.source_angle.variable,
            config.source_angle.supergrid,
        )?;
        let dst_angle = read_angle(
            &config.destination_angle.file,
            &config.destination_angle.variable,
            config.destination_angle.supergrid,
        )?;
        let mask = read_mask(&config.mask.file, &config.mask.variable)?;
        let enforcer = ConsistencyEnforcer::new(config.physics.clone(), config.fields.clone(), mask);

        let pipeline = Self::new()
            .with_drop(config.drop.clone())
            .with_velocity(&config.u_name, &config.v_name);
        let fields = pipeline.process(source, &weights, &src_angle, &dst_angle, &enforcer)?;

        let output = OutputConfig::new(&config.output, AxisNames::ice())
            .with_replace(true)
            .with_title("Sea-ice initial conditions");
        let mut writer = OutputWriter::new(output);
        writer.initialize(None, None)?;
        writer.write(&fields, 0)?;
        let path = writer.finish()?;
        tracing::info!(output = %path.display(), "ice remap complete");
        Ok(path)
    }
}
