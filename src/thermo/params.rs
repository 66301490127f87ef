//! Physical constants and thresholds for the sea-ice consistency rules.

use serde::Deserialize;

/// Immutable physical parameter set passed to the consistency enforcer.
///
/// Defaults are the CICE/Icepack values for a 7-layer ice, 1-layer snow
/// configuration. Every field can be overridden from TOML; missing keys keep
/// their default.
///
/// # Example
///
/// ```
/// use ic_regrid::thermo::PhysicalParams;
///
/// let params = PhysicalParams::default().with_min_ice_fraction(0.15);
/// assert_eq!(params.n_ice_layers, 7);
/// assert_eq!(params.min_ice_fraction, 0.15);
/// assert!((params.snow_latent_heat() - 3.34e5).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicalParams {
    /// Ice density (kg/m³)
    pub rho_ice: f64,
    /// Snow density (kg/m³)
    pub rho_snow: f64,
    /// Specific heat of fresh ice (J/kg/K)
    pub cp_ice: f64,
    /// Latent heat of melting of fresh ice (J/kg)
    pub latent_heat_fresh: f64,
    /// Latent heat of sublimation (J/kg)
    pub latent_heat_sub: f64,
    /// Latent heat of vaporization (J/kg)
    pub latent_heat_vap: f64,

    /// Maximum ice salinity (ppt)
    pub salinity_max: f64,
    /// Salinity profile exponent numerator
    pub salinity_n: f64,
    /// Salinity profile exponent offset
    pub salinity_m: f64,
    /// Freezing relation `Tm = S / (a + b S)`: constant term
    pub freeze_a: f64,
    /// Freezing relation: salinity coefficient
    pub freeze_b: f64,
    /// Number of vertical ice layers (`qice001..qiceNNN`)
    pub n_ice_layers: usize,

    /// Regularization in the snow temperature bound
    pub snow_puny: f64,
    /// Number of snow layers in the snow temperature bound
    pub n_snow_layers: f64,

    /// Ice fraction at or below which ice is suppressed
    pub min_ice_fraction: f64,
    /// Ice volume at or below which ice fraction is suppressed
    pub min_ice_volume: f64,
    /// Cap on per-category ice fraction
    pub max_ice_fraction: f64,
}

impl Default for PhysicalParams {
    fn default() -> Self {
        Self {
            rho_ice: 917.0,
            rho_snow: 330.0,
            cp_ice: 2106.0,
            latent_heat_fresh: 3.34e5,
            latent_heat_sub: 2.835e6,
            latent_heat_vap: 2.501e6,
            salinity_max: 3.2,
            salinity_n: 0.407,
            salinity_m: 0.573,
            freeze_a: -18.48,
            freeze_b: 0.01848,
            n_ice_layers: 7,
            snow_puny: 1.0e-12,
            n_snow_layers: 1.0,
            min_ice_fraction: 0.1,
            min_ice_volume: 1.0e-5,
            max_ice_fraction: 1.0,
        }
    }
}

impl PhysicalParams {
    pub fn with_min_ice_fraction(mut self, value: f64) -> Self {
        self.min_ice_fraction = value;
        self
    }

    pub fn with_min_ice_volume(mut self, value: f64) -> Self {
        self.min_ice_volume = value;
        self
    }

    pub fn with_n_ice_layers(mut self, n: usize) -> Self {
        self.n_ice_layers = n;
        self
    }

    /// Latent heat used by the snow temperature bound, `L_sub − L_vap`.
    #[inline]
    pub fn snow_latent_heat(&self) -> f64 {
        self.latent_heat_sub - self.latent_heat_vap
    }

    /// Snow enthalpy implied by a surface temperature (°C).
    ///
    /// ```text
    /// q = −ρs (L − c_i T)
    /// ```
    #[inline]
    pub fn snow_enthalpy(&self, surface_temperature: f64) -> f64 {
        -self.rho_snow * (self.latent_heat_fresh - self.cp_ice * surface_temperature)
    }

    /// Ice temperature implied by an enthalpy, `T = (q + ρi L) / (ρi c_i)`.
    #[inline]
    pub fn ice_temperature(&self, enthalpy: f64) -> f64 {
        (enthalpy + self.rho_ice * self.latent_heat_fresh) / (self.rho_ice * self.cp_ice)
    }

    /// Ice enthalpy of a temperature, `q = ρi c_i T − ρi L`.
    #[inline]
    pub fn ice_enthalpy(&self, temperature: f64) -> f64 {
        self.rho_ice * self.cp_ice * temperature - self.rho_ice * self.latent_heat_fresh
    }
}
