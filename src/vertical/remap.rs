//! Piecewise-linear column remapping between vertical coordinates.

use ndarray::Array3;
use serde::Deserialize;

use crate::error::{RegridError, Result};
use crate::field::{AxisRole, GridField};

use super::VerticalCoordinate;

/// What a destination level deeper than every source level receives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelowBottomPolicy {
    /// Zero, i.e. no water below the source topography
    #[default]
    Zero,
    /// The deepest source value
    HoldDeepest,
}

/// Interpolates level-stacked fields from one vertical coordinate to another.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerticalRemapper {
    policy: BelowBottomPolicy,
}

impl VerticalRemapper {
    pub fn new(policy: BelowBottomPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BelowBottomPolicy {
        self.policy
    }

    /// Interpolate one column into a pre-allocated buffer.
    ///
    /// `values` must have the length of `z_src` and `out` the length of
    /// `z_dst`. `z_src` must be strictly increasing.
    pub fn remap_column(&self, values: &[f64], z_src: &[f64], z_dst: &[f64], out: &mut [f64]) -> Result<()> {
        if values.len() != z_src.len() {
            return Err(RegridError::mismatch("column values vs source levels", z_src.len(), values.len()));
        }
        if out.len() != z_dst.len() {
            return Err(RegridError::mismatch("output column vs destination levels", z_dst.len(), out.len()));
        }
        self.interpolate(values, z_src, z_dst, out);
        Ok(())
    }

    /// Column interpolation with lengths already checked.
    fn interpolate(&self, values: &[f64], z_src: &[f64], z_dst: &[f64], out: &mut [f64]) {
        let n = z_src.len();
        if n == 0 {
            out.fill(0.0);
            return;
        }
        let deepest = z_src[n - 1];

        for (o, &z) in out.iter_mut().zip(z_dst) {
            *o = if z <= z_src[0] {
                values[0]
            } else if z > deepest {
                match self.policy {
                    BelowBottomPolicy::Zero => 0.0,
                    BelowBottomPolicy::HoldDeepest => values[n - 1],
                }
            } else {
                // First source level strictly deeper than z; z == deepest lands on n.
                let upper = z_src.partition_point(|&s| s <= z);
                if upper == n {
                    values[n - 1]
                } else {
                    let lower = upper - 1;
                    let frac = (z - z_src[lower]) / (z_src[upper] - z_src[lower]);
                    values[lower] + frac * (values[upper] - values[lower])
                }
            };
        }
    }

    /// Remap a `[Level, Y, X]` field from `src` to `dst` levels.
    pub fn remap_field(
        &self,
        field: &GridField,
        src: &VerticalCoordinate,
        dst: &VerticalCoordinate,
    ) -> Result<GridField> {
        if field.stack_axis() != Some(AxisRole::Level) {
            return Err(RegridError::mismatch(
                format!("axes of '{}' for vertical remap", field.name()),
                [AxisRole::Level, AxisRole::Y, AxisRole::X],
                field.axes(),
            ));
        }
        let data = field.as_array3()?;
        let (nk, ny, nx) = data.dim();
        if nk != src.len() {
            return Err(RegridError::mismatch(
                format!("levels of '{}' vs coordinate '{}'", field.name(), src.name()),
                src.len(),
                nk,
            ));
        }

        // Column-major copy so each column is contiguous: [cell][level].
        let columns: Vec<f64> = data
            .view()
            .permuted_axes([1, 2, 0])
            .iter()
            .copied()
            .collect();
        let remapped = self.remap_columns(&columns, nk, src.depths(), dst.depths());

        let nk_dst = dst.len();
        let out = Array3::from_shape_fn((nk_dst, ny, nx), |(k, j, i)| {
            remapped[(j * nx + i) * nk_dst + k]
        });

        tracing::debug!(
            field = field.name(),
            from = %src,
            to = %dst,
            policy = ?self.policy,
            "vertical remap"
        );
        field.with_data(out.into_dyn(), field.axes().to_vec())
    }

    #[cfg(not(feature = "parallel"))]
    fn remap_columns(&self, columns: &[f64], nk: usize, z_src: &[f64], z_dst: &[f64]) -> Vec<f64> {
        let nk_dst = z_dst.len();
        let n_cells = if nk == 0 { 0 } else { columns.len() / nk };
        let mut out = vec![0.0; n_cells * nk_dst];
        if nk_dst == 0 {
            return out;
        }
        for (col, dst) in columns.chunks(nk).zip(out.chunks_mut(nk_dst)) {
            self.interpolate(col, z_src, z_dst, dst);
        }
        out
    }

    #[cfg(feature = "parallel")]
    fn remap_columns(&self, columns: &[f64], nk: usize, z_src: &[f64], z_dst: &[f64]) -> Vec<f64> {
        use rayon::prelude::*;

        let nk_dst = z_dst.len();
        let n_cells = if nk == 0 { 0 } else { columns.len() / nk };
        let mut out = vec![0.0; n_cells * nk_dst];
        if nk_dst == 0 {
            return out;
        }
        columns
            .par_chunks(nk)
            .zip(out.par_chunks_mut(nk_dst))
            .for_each(|(col, dst)| self.interpolate(col, z_src, z_dst, dst));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Axis;

    fn remap(policy: BelowBottomPolicy, z_dst: &[f64]) -> Vec<f64> {
        let mut out = vec![f64::NAN; z_dst.len()];
        VerticalRemapper::new(policy)
            .remap_column(&[10.0, 6.0, 2.0], &[0.0, 100.0, 200.0], z_dst, &mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_linear_between_levels() {
        let out = remap(BelowBottomPolicy::Zero, &[50.0, 150.0]);
        assert_relative_eq!(out[0], 8.0);
        assert_relative_eq!(out[1], 4.0);
    }

    #[test]
    fn test_above_shallowest_holds_value() {
        let out = remap(BelowBottomPolicy::Zero, &[-5.0, 0.0]);
        assert_eq!(out, vec![10.0, 10.0]);
    }

    #[test]
    fn test_below_deepest_zero() {
        let out = remap(BelowBottomPolicy::Zero, &[200.0, 200.5, 1000.0]);
        assert_eq!(out, vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_below_deepest_hold() {
        let out = remap(BelowBottomPolicy::HoldDeepest, &[250.0]);
        assert_eq!(out, vec![2.0]);
    }

    #[test]
    fn test_exact_levels_reproduced() {
        let out = remap(BelowBottomPolicy::Zero, &[0.0, 100.0, 200.0]);
        assert_eq!(out, vec![10.0, 6.0, 2.0]);
    }

    #[test]
    fn test_column_lengths_checked() {
        let remapper = VerticalRemapper::default();
        let mut out = vec![0.0; 2];
        let err = remapper
            .remap_column(&[1.0, 2.0], &[0.0, 10.0, 20.0], &[5.0, 15.0], &mut out)
            .unwrap_err();
        assert!(matches!(err, RegridError::DimensionMismatch { .. }));

        let mut short = vec![0.0; 1];
        assert!(remapper
            .remap_column(&[1.0, 2.0], &[0.0, 10.0], &[5.0, 15.0], &mut short)
            .is_err());
    }

    #[test]
    fn test_remap_field() {
        let src = VerticalCoordinate::from_depths("depth", vec![0.0, 10.0]).unwrap();
        let dst = VerticalCoordinate::from_depths("zl", vec![5.0, 10.0, 15.0]).unwrap();
        let mut data = Array3::zeros((2, 2, 3));
        data.index_axis_mut(Axis(0), 0).fill(1.0);
        data.index_axis_mut(Axis(0), 1).fill(3.0);
        data[[1, 1, 2]] = 5.0;
        let field = GridField::stacked("temp", AxisRole::Level, data);

        let out = VerticalRemapper::default().remap_field(&field, &src, &dst).unwrap();
        let out = out.as_array3().unwrap();
        assert_eq!(out.dim(), (3, 2, 3));
        assert_relative_eq!(out[[0, 0, 0]], 2.0);
        assert_relative_eq!(out[[0, 1, 2]], 3.0);
        assert_relative_eq!(out[[1, 1, 2]], 5.0);
        assert_eq!(out[[2, 0, 1]], 0.0);
    }

    #[test]
    fn test_remap_field_requires_level_axis() {
        let z = VerticalCoordinate::from_depths("depth", vec![0.0, 1.0]).unwrap();
        let field = GridField::stacked("aicen", AxisRole::Category, Array3::zeros((2, 1, 1)));
        assert!(matches!(
            VerticalRemapper::default().remap_field(&field, &z, &z),
            Err(RegridError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_remap_field_level_count_checked() {
        let z = VerticalCoordinate::from_depths("depth", vec![0.0, 1.0, 2.0]).unwrap();
        let field = GridField::stacked("temp", AxisRole::Level, Array3::zeros((2, 1, 1)));
        assert!(VerticalRemapper::default().remap_field(&field, &z, &z).is_err());
    }

    #[test]
    fn test_policy_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: BelowBottomPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"hold_deepest\"").unwrap();
        assert_eq!(w.policy, BelowBottomPolicy::HoldDeepest);
    }
}
