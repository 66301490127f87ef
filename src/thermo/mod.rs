//! Sea-ice thermodynamic consistency after regridding.
//!
//! - [`PhysicalParams`]: densities, heat capacities, latent heats, the
//!   salinity profile and the suppression thresholds
//! - [`SalinityProfile`] / [`MeltingProfile`]: per-layer salinity and
//!   melting temperature, computed once
//! - [`OceanMask`]: destination ocean/land flags
//! - [`ConsistencyEnforcer`]: the ordered repair rules
//!
//! Ice enthalpy `q` (J/m³) and temperature `T` (°C) are related by
//!
//! ```text
//! q = ρi c_i T − ρi L      T = (q + ρi L) / (ρi c_i)
//! ```

mod enforcer;
mod mask;
mod params;
mod profile;

pub use enforcer::{ConsistencyEnforcer, EnforcementSummary, IceFieldNames};
pub use mask::{OceanMask, OceanMaskStatistics};
pub use params::PhysicalParams;
pub use profile::{MeltingProfile, SalinityProfile};
