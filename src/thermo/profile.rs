//! Vertical salinity and melting-temperature profiles of sea ice.

use std::f64::consts::PI;
use std::fmt;

use crate::types::LayerIndex;

use super::PhysicalParams;

/// Fixed vertical salinity profile (ppt), one value per ice layer.
///
/// ```text
/// z(l) = (l + 0.5) / N
/// S(l) = (S_max / 2) (1 − cos(π z^(n / (m + z))))
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SalinityProfile {
    values: Vec<f64>,
}

impl SalinityProfile {
    pub fn new(params: &PhysicalParams) -> Self {
        let n = params.n_ice_layers as f64;
        let values = LayerIndex::iter(params.n_ice_layers)
            .map(|l| {
                let z = (l.get() as f64 + 0.5) / n;
                let exponent = params.salinity_n / (params.salinity_m + z);
                0.5 * params.salinity_max * (1.0 - (PI * z.powf(exponent)).cos())
            })
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn at(&self, layer: LayerIndex) -> f64 {
        self.values[layer]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Per-layer melting temperature (°C), derived once from the salinity profile.
///
/// ```text
/// Tm(l) = S(l) / (a + b S(l))
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct MeltingProfile {
    values: Vec<f64>,
}

impl MeltingProfile {
    pub fn new(params: &PhysicalParams) -> Self {
        Self::from_salinity(&SalinityProfile::new(params), params)
    }

    pub fn from_salinity(salinity: &SalinityProfile, params: &PhysicalParams) -> Self {
        let values = salinity
            .values()
            .iter()
            .map(|&s| s / (params.freeze_a + params.freeze_b * s))
            .collect();
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Melting temperature of one layer.
    #[inline]
    pub fn at(&self, layer: LayerIndex) -> f64 {
        self.values[layer]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl fmt::Display for MeltingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tm[")?;
        for (i, t) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", t)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_salinity_profile_shape() {
        let s = SalinityProfile::new(&PhysicalParams::default());
        assert_eq!(s.len(), 7);
        // Fresher at the top, saltier towards the base, bounded by S_max.
        assert!(s.values().windows(2).all(|w| w[1] > w[0]));
        assert!(s.values().iter().all(|&v| v > 0.0 && v < 3.2));
    }

    #[test]
    fn test_first_layer_salinity() {
        let p = PhysicalParams::default();
        let z: f64 = 0.5 / 7.0;
        let expected = 1.6 * (1.0 - (PI * z.powf(0.407 / (0.573 + z))).cos());
        assert_relative_eq!(SalinityProfile::new(&p).at(LayerIndex::ZERO), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_melting_temperature_negative() {
        let p = PhysicalParams::default();
        let s = SalinityProfile::new(&p);
        let tm = MeltingProfile::from_salinity(&s, &p);
        for l in LayerIndex::iter(7) {
            assert!(tm.at(l) < 0.0);
            assert_relative_eq!(tm.at(l), s.at(l) / (-18.48 + 0.01848 * s.at(l)), epsilon = 1e-14);
        }
        // Saltier ice melts at a lower temperature.
        assert!(tm.at(LayerIndex::new(6)) < tm.at(LayerIndex::ZERO));
    }

    #[test]
    fn test_layer_count_follows_params() {
        let p = PhysicalParams::default().with_n_ice_layers(4);
        assert_eq!(MeltingProfile::new(&p).len(), 4);
    }
}
