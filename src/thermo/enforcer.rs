//! Post-regrid repair of coupled sea-ice and snow state.
//!
//! Interpolation mixes ice-covered and open-water cells, so enthalpies end
//! up warmer than their melting point, trace ice fractions appear along ice
//! edges, and volumes survive in cells whose fraction was masked out. The
//! [`ConsistencyEnforcer`] applies a fixed, ordered rule sequence that
//! restores a physically valid state:
//!
//! 1. zero diagnostics that are not meaningfully interpolated
//! 2. recompute snow enthalpy from the surface temperature
//! 3. clip every ice layer's temperature at its melting point
//! 4. remove ice on land and below the minimum fraction, then zero the
//!    volumes and layer enthalpies of every ice-free category cell
//! 5. bound the snow enthalpy by the maximum snow temperature
//! 6. remove ice below the minimum volume and cap the fraction at 1
//! 7. rebuild the velocity-point ice mask from the total fraction
//!
//! After step 6 the dependent fields are zeroed again so that every
//! category cell with `aicen == 0` has zero volumes and layer enthalpies.

use std::fmt;

use ndarray::{Array2, Array3, Axis, Zip};
use serde::Deserialize;

use crate::error::{RegridError, Result};
use crate::field::FieldSet;
use crate::types::{CategoryIndex, LayerIndex};

use super::{MeltingProfile, OceanMask, PhysicalParams};

/// Names of the sea-ice restart variables the rules read and write.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct IceFieldNames {
    /// Per-category ice fraction
    pub ice_fraction: String,
    /// Per-category ice volume
    pub ice_volume: String,
    /// Per-category snow volume
    pub snow_volume: String,
    /// Per-category surface temperature
    pub surface_temperature: String,
    /// Per-category snow enthalpy
    pub snow_enthalpy: String,
    /// Prefix of the per-layer ice enthalpy fields (`qice001`, ...)
    pub ice_enthalpy_prefix: String,
    /// Velocity-point ice mask
    pub velocity_mask: String,
    /// Fields reset to zero when present
    pub zeroed: Vec<String>,
}

impl Default for IceFieldNames {
    fn default() -> Self {
        Self {
            ice_fraction: "aicen".into(),
            ice_volume: "vicen".into(),
            snow_volume: "vsnon".into(),
            surface_temperature: "Tsfcn".into(),
            snow_enthalpy: "qsno001".into(),
            ice_enthalpy_prefix: "qice".into(),
            velocity_mask: "iceumask".into(),
            zeroed: ["coszen", "scale_factor", "strocnxT", "strocnyT"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl IceFieldNames {
    /// Name of one layer's ice enthalpy field.
    pub fn ice_enthalpy(&self, layer: LayerIndex) -> String {
        format!("{}{}", self.ice_enthalpy_prefix, layer.field_suffix())
    }

    /// Every field the rules need, in the order they are checked.
    pub fn required(&self, n_ice_layers: usize) -> Vec<String> {
        let mut names = vec![
            self.ice_fraction.clone(),
            self.ice_volume.clone(),
            self.snow_volume.clone(),
            self.surface_temperature.clone(),
            self.snow_enthalpy.clone(),
        ];
        names.extend(LayerIndex::iter(n_ice_layers).map(|l| self.ice_enthalpy(l)));
        names.push(self.velocity_mask.clone());
        names
    }
}

/// Counts of what each rule changed, for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnforcementSummary {
    /// Ice-layer values clipped at the melting temperature
    pub clipped_layers: usize,
    /// Category cells with ice removed on land
    pub land_masked: usize,
    /// Category cells with ice removed below the minimum fraction
    pub below_min_fraction: usize,
    /// Snow enthalpy values replaced by the temperature bound
    pub snow_bounded: usize,
    /// Category cells with ice removed below the minimum volume
    pub below_min_volume: usize,
    /// Category cells capped at the maximum fraction
    pub capped: usize,
    /// Cells flagged in the rebuilt velocity mask
    pub ice_cells: usize,
    /// Cells keeping ice in each category, indexed by [`CategoryIndex`]
    pub ice_cells_by_category: Vec<usize>,
}

impl fmt::Display for EnforcementSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Consistency Summary:")?;
        writeln!(f, "  Layer enthalpies clipped: {}", self.clipped_layers)?;
        writeln!(f, "  Ice removed on land: {}", self.land_masked)?;
        writeln!(f, "  Ice removed below min fraction: {}", self.below_min_fraction)?;
        writeln!(f, "  Snow enthalpies bounded: {}", self.snow_bounded)?;
        writeln!(f, "  Ice removed below min volume: {}", self.below_min_volume)?;
        writeln!(f, "  Fractions capped: {}", self.capped)?;
        write!(f, "  Ice-covered cells: {}", self.ice_cells)?;
        let counts = &self.ice_cells_by_category;
        for (cat, n) in CategoryIndex::iter(counts.len()).zip(counts) {
            write!(f, "\n    {}: {}", cat, n)?;
        }
        Ok(())
    }
}

/// Per-category state extracted from a field set, `[ncat, ny, nx]` each.
struct IceState {
    aicen: Array3<f64>,
    vicen: Array3<f64>,
    vsnon: Array3<f64>,
    tsfcn: Array3<f64>,
    qsno: Array3<f64>,
    qice: Vec<Array3<f64>>,
}

impl IceState {
    fn extract(fields: &FieldSet, names: &IceFieldNames, n_layers: usize) -> Result<Self> {
        let aicen = fields.get(&names.ice_fraction)?.as_array3()?.to_owned();
        let dim = aicen.dim();
        let fetch = |name: &str| -> Result<Array3<f64>> {
            let data = fields.get(name)?.as_array3()?;
            if data.dim() != dim {
                return Err(RegridError::mismatch(
                    format!("shape of '{}' vs '{}'", name, names.ice_fraction),
                    dim,
                    data.dim(),
                ));
            }
            Ok(data.to_owned())
        };

        Ok(Self {
            vicen: fetch(&names.ice_volume)?,
            vsnon: fetch(&names.snow_volume)?,
            tsfcn: fetch(&names.surface_temperature)?,
            qsno: fetch(&names.snow_enthalpy)?,
            qice: LayerIndex::iter(n_layers)
                .map(|l| fetch(&names.ice_enthalpy(l)))
                .collect::<Result<_>>()?,
            aicen,
        })
    }

    fn n_categories(&self) -> usize {
        self.aicen.len_of(Axis(0))
    }

    /// Cells with a positive fraction in one category.
    fn ice_cells(&self, cat: CategoryIndex) -> usize {
        self.aicen
            .index_axis(Axis(0), cat.get())
            .iter()
            .filter(|&&a| a > 0.0)
            .count()
    }

    fn horizontal_shape(&self) -> (usize, usize) {
        let (_, ny, nx) = self.aicen.dim();
        (ny, nx)
    }

    /// Zero volumes and layer enthalpies wherever the fraction is not positive.
    fn zero_dependents(&mut self) {
        let Self {
            aicen,
            vicen,
            vsnon,
            qice,
            ..
        } = self;
        Zip::indexed(&*aicen).for_each(|idx, &a| {
            if !(a > 0.0) {
                vicen[idx] = 0.0;
                vsnon[idx] = 0.0;
                for q in qice.iter_mut() {
                    q[idx] = 0.0;
                }
            }
        });
    }

    fn store(self, fields: &mut FieldSet, names: &IceFieldNames) -> Result<()> {
        let mut put = |name: &str, data: Array3<f64>| -> Result<()> {
            let field = fields.get(name)?;
            let updated = field.with_data(data.into_dyn(), field.axes().to_vec())?;
            fields.insert(updated);
            Ok(())
        };
        put(&names.ice_fraction, self.aicen)?;
        put(&names.ice_volume, self.vicen)?;
        put(&names.snow_volume, self.vsnon)?;
        put(&names.surface_temperature, self.tsfcn)?;
        put(&names.snow_enthalpy, self.qsno)?;
        for (layer, q) in LayerIndex::iter(self.qice.len()).zip(self.qice) {
            put(&names.ice_enthalpy(layer), q)?;
        }
        Ok(())
    }
}

/// Applies the ordered sea-ice consistency rules to a regridded field set.
///
/// # Example
///
/// ```
/// use ic_regrid::field::{AxisRole, FieldSet, GridField};
/// use ic_regrid::thermo::{ConsistencyEnforcer, IceFieldNames, OceanMask, PhysicalParams};
/// use ndarray::{Array2, Array3};
///
/// let params = PhysicalParams::default().with_n_ice_layers(1);
/// let cat = |name: &str, v: f64| GridField::stacked(name, AxisRole::Category, Array3::from_elem((2, 1, 1), v));
/// let fields = FieldSet::new()
///     .with(cat("aicen", 0.05))
///     .with(cat("vicen", 0.1))
///     .with(cat("vsnon", 0.0))
///     .with(cat("Tsfcn", -5.0))
///     .with(cat("qsno001", 0.0))
///     .with(cat("qice001", -3.3e8))
///     .with(GridField::surface("iceumask", Array2::ones((1, 1))));
///
/// let enforcer = ConsistencyEnforcer::new(params, IceFieldNames::default(), OceanMask::all_wet(1, 1));
/// let out = enforcer.enforce(fields).unwrap();
/// assert!(out.get("vicen").unwrap().data().iter().all(|&v| v == 0.0));
/// assert_eq!(out.get("iceumask").unwrap().data()[[0, 0]], 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct ConsistencyEnforcer {
    params: PhysicalParams,
    names: IceFieldNames,
    mask: OceanMask,
    melting: MeltingProfile,
}

impl ConsistencyEnforcer {
    /// Create an enforcer; the melting profile is computed once here.
    pub fn new(params: PhysicalParams, names: IceFieldNames, mask: OceanMask) -> Self {
        let melting = MeltingProfile::new(&params);
        tracing::debug!(%melting, "melting temperature profile");
        Self {
            params,
            names,
            mask,
            melting,
        }
    }

    pub fn params(&self) -> &PhysicalParams {
        &self.params
    }

    pub fn names(&self) -> &IceFieldNames {
        &self.names
    }

    pub fn mask(&self) -> &OceanMask {
        &self.mask
    }

    pub fn melting_profile(&self) -> &MeltingProfile {
        &self.melting
    }

    /// Run all rules. Every required field is checked before any value changes.
    pub fn enforce(&self, fields: FieldSet) -> Result<FieldSet> {
        self.enforce_with_summary(fields).map(|(fields, _)| fields)
    }

    /// Run all rules and also return what they changed.
    pub fn enforce_with_summary(&self, mut fields: FieldSet) -> Result<(FieldSet, EnforcementSummary)> {
        let required = self.names.required(self.params.n_ice_layers);
        fields.require(required.iter().map(String::as_str))?;

        let mut state = IceState::extract(&fields, &self.names, self.params.n_ice_layers)?;
        let shape = state.horizontal_shape();
        if self.mask.shape() != shape {
            return Err(RegridError::mismatch("ocean mask vs ice fields", shape, self.mask.shape()));
        }
        let umask_field = fields.get(&self.names.velocity_mask)?;
        let umask_shape = umask_field.as_array2()?.dim();
        if umask_shape != shape {
            return Err(RegridError::mismatch(
                format!("shape of '{}'", self.names.velocity_mask),
                shape,
                umask_shape,
            ));
        }

        let mut summary = EnforcementSummary::default();

        self.zero_diagnostics(&mut fields);
        self.reset_snow_enthalpy(&mut state);
        summary.clipped_layers = self.clip_ice_enthalpy(&mut state);
        self.suppress_trace_ice(&mut state, &mut summary);
        summary.snow_bounded = self.bound_snow_enthalpy(&mut state);
        self.limit_by_volume(&mut state, &mut summary);
        let umask = self.ice_presence(&state);
        summary.ice_cells = umask.iter().filter(|&&m| m > 0.0).count();
        summary.ice_cells_by_category = CategoryIndex::iter(state.n_categories())
            .map(|cat| state.ice_cells(cat))
            .collect();

        let umask_field = fields.get(&self.names.velocity_mask)?;
        let umask_field = umask_field.with_data(umask.into_dyn(), umask_field.axes().to_vec())?;
        fields.insert(umask_field);
        state.store(&mut fields, &self.names)?;

        tracing::info!(
            clipped = summary.clipped_layers,
            land = summary.land_masked,
            trace = summary.below_min_fraction,
            snow = summary.snow_bounded,
            thin = summary.below_min_volume,
            ice_cells = summary.ice_cells,
            "sea-ice consistency enforced"
        );
        Ok((fields, summary))
    }

    /// Rule 1.
    fn zero_diagnostics(&self, fields: &mut FieldSet) {
        for name in &self.names.zeroed {
            if let Ok(field) = fields.get_mut(name) {
                field.data_mut().fill(0.0);
            }
        }
    }

    /// Rule 2.
    fn reset_snow_enthalpy(&self, s: &mut IceState) {
        Zip::from(&mut s.qsno)
            .and(&s.tsfcn)
            .for_each(|q, &t| *q = self.params.snow_enthalpy(t));
    }

    /// Rule 3. Returns the number of clipped values.
    fn clip_ice_enthalpy(&self, s: &mut IceState) -> usize {
        let p = &self.params;
        let mut clipped = 0;
        for (layer, q) in LayerIndex::iter(s.qice.len()).zip(s.qice.iter_mut()) {
            let t_melt = self.melting.at(layer);
            q.mapv_inplace(|q| {
                let t = p.ice_temperature(q);
                if t > t_melt {
                    clipped += 1;
                    p.ice_enthalpy(t_melt)
                } else {
                    p.ice_enthalpy(t)
                }
            });
        }
        clipped
    }

    /// Rule 4.
    fn suppress_trace_ice(&self, s: &mut IceState, summary: &mut EnforcementSummary) {
        let min_fraction = self.params.min_ice_fraction;
        for cat in CategoryIndex::iter(s.n_categories()) {
            let mut category = s.aicen.index_axis_mut(Axis(0), cat.get());
            Zip::from(&mut category)
                .and(self.mask.view())
                .for_each(|a, &wet| {
                    if !wet {
                        if *a != 0.0 {
                            summary.land_masked += 1;
                        }
                        *a = 0.0;
                    } else if *a <= min_fraction {
                        if *a != 0.0 {
                            summary.below_min_fraction += 1;
                        }
                        *a = 0.0;
                    }
                });
        }
        s.zero_dependents();
    }

    /// Rule 5. Returns the number of bounded values.
    fn bound_snow_enthalpy(&self, s: &mut IceState) -> usize {
        let p = &self.params;
        let rho_c = p.rho_snow * p.cp_ice;
        let melt_offset = p.snow_latent_heat() / p.cp_ice;
        let mut bounded = 0;
        Zip::from(&mut s.qsno).and(&s.vsnon).for_each(|q, &vs| {
            if vs == 0.0 {
                return;
            }
            let t_snow = *q / rho_c + melt_offset;
            let t_max = -*q * p.snow_puny * p.n_snow_layers / (rho_c * vs + p.snow_puny);
            if !(t_snow <= t_max) {
                *q = rho_c * (t_max - melt_offset);
                bounded += 1;
            }
        });
        bounded
    }

    /// Rule 6.
    fn limit_by_volume(&self, s: &mut IceState, summary: &mut EnforcementSummary) {
        let min_volume = self.params.min_ice_volume;
        let max_fraction = self.params.max_ice_fraction;
        Zip::from(&mut s.aicen).and(&s.vicen).for_each(|a, &v| {
            if !(v > min_volume) {
                if *a != 0.0 {
                    summary.below_min_volume += 1;
                }
                *a = 0.0;
            } else if *a > max_fraction {
                *a = max_fraction;
                summary.capped += 1;
            }
        });
        s.zero_dependents();
    }

    /// Rule 7: 1 where the total fraction exceeds the minimum, else 0.
    fn ice_presence(&self, s: &IceState) -> Array2<f64> {
        let min_fraction = self.params.min_ice_fraction;
        s.aicen
            .sum_axis(Axis(0))
            .mapv(|total| if total > min_fraction { 1.0 } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{AxisRole, GridField};
    use approx::assert_relative_eq;

    fn stacked(name: &str, values: &[f64]) -> GridField {
        let data = Array3::from_shape_vec((values.len(), 1, 1), values.to_vec()).unwrap();
        GridField::stacked(name, AxisRole::Category, data)
    }

    fn column(aicen: &[f64], vicen: &[f64]) -> FieldSet {
        let n = aicen.len();
        let mut set = FieldSet::new()
            .with(stacked("aicen", aicen))
            .with(stacked("vicen", vicen))
            .with(stacked("vsnon", &vec![0.2; n]))
            .with(stacked("Tsfcn", &vec![-10.0; n]))
            .with(stacked("qsno001", &vec![0.0; n]))
            .with(GridField::surface("iceumask", Array2::zeros((1, 1))))
            .with(GridField::surface("coszen", Array2::from_elem((1, 1), 0.7)));
        for l in LayerIndex::iter(7) {
            set.insert(stacked(&format!("qice{}", l.field_suffix()), &vec![-3.3e8; n]));
        }
        set
    }

    fn enforcer() -> ConsistencyEnforcer {
        ConsistencyEnforcer::new(
            PhysicalParams::default(),
            IceFieldNames::default(),
            OceanMask::all_wet(1, 1),
        )
    }

    #[test]
    fn test_required_names() {
        let names = IceFieldNames::default().required(7);
        assert_eq!(names.len(), 13);
        assert_eq!(names[5], "qice001");
        assert_eq!(names[11], "qice007");
        assert_eq!(names[12], "iceumask");
    }

    #[test]
    fn test_missing_layer_rejected() {
        let mut set = column(&[0.5], &[1.0]);
        set.remove("qice004");
        let err = enforcer().enforce(set).unwrap_err();
        assert!(matches!(err, RegridError::MissingVariable { ref name, .. } if name == "qice004"));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let mut set = column(&[0.5, 0.5], &[1.0, 1.0]);
        set.insert(stacked("vsnon", &[0.1]));
        assert!(matches!(
            enforcer().enforce(set),
            Err(RegridError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_mask_shape_checked() {
        let e = ConsistencyEnforcer::new(
            PhysicalParams::default(),
            IceFieldNames::default(),
            OceanMask::all_wet(2, 2),
        );
        assert!(matches!(
            e.enforce(column(&[0.5], &[1.0])),
            Err(RegridError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_diagnostics_zeroed() {
        let out = enforcer().enforce(column(&[0.5], &[1.0])).unwrap();
        assert_eq!(out.get("coszen").unwrap().data()[[0, 0]], 0.0);
    }

    #[test]
    fn test_snow_enthalpy_from_surface_temperature() {
        let mut set = column(&[0.5], &[1.0]);
        set.insert(stacked("vsnon", &[0.0]));
        let out = enforcer().enforce(set).unwrap();
        let expected = -330.0 * (3.34e5 - 2106.0 * -10.0);
        assert_relative_eq!(out.get("qsno001").unwrap().data()[[0, 0, 0]], expected);
    }

    #[test]
    fn test_warm_layers_clipped() {
        let mut set = column(&[0.5], &[1.0]);
        // Enthalpy of +5 °C ice: far above any melting temperature.
        let p = PhysicalParams::default();
        set.insert(stacked("qice003", &[p.ice_enthalpy(5.0)]));
        let e = enforcer();
        let (out, summary) = e.enforce_with_summary(set).unwrap();
        assert_eq!(summary.clipped_layers, 1);
        let q = out.get("qice003").unwrap().data()[[0, 0, 0]];
        let tm = e.melting_profile().at(LayerIndex::new(2));
        assert_relative_eq!(p.ice_temperature(q), tm, epsilon = 1e-9);
    }

    #[test]
    fn test_threshold_zeroes_dependents() {
        let out = enforcer().enforce(column(&[0.05, 0.2, 0.15], &[0.1, 0.4, 0.3])).unwrap();
        let aicen = out.get("aicen").unwrap().data();
        assert_eq!(aicen[[0, 0, 0]], 0.0);
        assert_relative_eq!(aicen[[1, 0, 0]], 0.2);
        assert_relative_eq!(aicen[[2, 0, 0]], 0.15);
        for name in ["vicen", "vsnon", "qice001", "qice007"] {
            let d = out.get(name).unwrap().data();
            assert_eq!(d[[0, 0, 0]], 0.0, "{} category 0", name);
            assert!(d[[1, 0, 0]] != 0.0, "{} category 1", name);
            assert!(d[[2, 0, 0]] != 0.0, "{} category 2", name);
        }
    }

    #[test]
    fn test_ice_cells_counted_per_category() {
        let (_, summary) = enforcer()
            .enforce_with_summary(column(&[0.05, 0.2, 0.15], &[0.1, 0.4, 0.3]))
            .unwrap();
        assert_eq!(summary.ice_cells_by_category.len(), 3);
        assert_eq!(summary.ice_cells_by_category[CategoryIndex::new(0)], 0);
        assert_eq!(summary.ice_cells_by_category[CategoryIndex::new(1)], 1);
        assert_eq!(summary.ice_cells_by_category[CategoryIndex::new(2)], 1);
        assert!(summary.to_string().contains("C1: 1"));
    }

    #[test]
    fn test_land_cells_have_no_ice() {
        let e = ConsistencyEnforcer::new(
            PhysicalParams::default(),
            IceFieldNames::default(),
            OceanMask::all_dry(1, 1),
        );
        let (out, summary) = e.enforce_with_summary(column(&[0.9], &[2.0])).unwrap();
        assert_eq!(out.get("aicen").unwrap().data()[[0, 0, 0]], 0.0);
        assert_eq!(out.get("vicen").unwrap().data()[[0, 0, 0]], 0.0);
        assert_eq!(summary.land_masked, 1);
    }

    #[test]
    fn test_thin_ice_removed_and_fraction_capped() {
        let (out, summary) = enforcer()
            .enforce_with_summary(column(&[0.5, 1.3], &[1.0e-6, 2.0]))
            .unwrap();
        let aicen = out.get("aicen").unwrap().data();
        assert_eq!(aicen[[0, 0, 0]], 0.0);
        assert_eq!(aicen[[1, 0, 0]], 1.0);
        assert_eq!(out.get("vicen").unwrap().data()[[0, 0, 0]], 0.0);
        assert_eq!(out.get("qice001").unwrap().data()[[0, 0, 0]], 0.0);
        assert_eq!(summary.below_min_volume, 1);
        assert_eq!(summary.capped, 1);
    }

    #[test]
    fn test_velocity_mask_from_total_fraction() {
        // Categories individually above the threshold but suppressed by volume.
        let out = enforcer().enforce(column(&[0.3, 0.3], &[0.0, 0.0])).unwrap();
        assert_eq!(out.get("iceumask").unwrap().data()[[0, 0]], 0.0);

        let out = enforcer().enforce(column(&[0.3, 0.3], &[1.0, 1.0])).unwrap();
        assert_eq!(out.get("iceumask").unwrap().data()[[0, 0]], 1.0);
    }

    #[test]
    fn test_snow_bound_applied() {
        let mut set = column(&[0.5], &[1.0]);
        // Warm surface produces a snow enthalpy above the bound.
        set.insert(stacked("Tsfcn", &[5.0]));
        let (out, summary) = enforcer().enforce_with_summary(set).unwrap();
        assert_eq!(summary.snow_bounded, 1);

        let p = PhysicalParams::default();
        let q = out.get("qsno001").unwrap().data()[[0, 0, 0]];
        let t_snow = q / (p.rho_snow * p.cp_ice) + p.snow_latent_heat() / p.cp_ice;
        assert!(t_snow <= 1.0e-9);
    }

    #[test]
    fn test_field_order_preserved() {
        let set = column(&[0.5], &[1.0]);
        let before: Vec<String> = set.names().map(String::from).collect();
        let out = enforcer().enforce(set).unwrap();
        let after: Vec<String> = out.names().map(String::from).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_summary_display() {
        let text = EnforcementSummary::default().to_string();
        assert!(text.starts_with("Consistency Summary:"));
    }
}
