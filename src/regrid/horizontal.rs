//! Horizontal regridding with a precomputed sparse operator.

use ndarray::{Array, ArrayView2, Axis, IxDyn};

use crate::error::{RegridError, Result};
use crate::field::{FieldSet, FillValue, GridField};
use crate::weights::WeightStore;

/// Applies a [`WeightStore`] operator to 2D and category/level-stacked fields.
///
/// Fill values are replaced by zero before the product, so missing source
/// data and unmapped destination cells both come out as 0 (the
/// zero-as-missing convention used downstream).
pub struct HorizontalRegridder<'a> {
    weights: &'a WeightStore,
    fill: FillValue,
}

impl<'a> HorizontalRegridder<'a> {
    /// Create a regridder with the default source fill value.
    pub fn new(weights: &'a WeightStore) -> Self {
        Self {
            weights,
            fill: FillValue::default(),
        }
    }

    /// Use a different fill/sentinel matcher.
    pub fn with_fill(mut self, fill: FillValue) -> Self {
        self.fill = fill;
        self
    }

    /// Remap every field in the set. Names and order are preserved.
    pub fn remap(&self, fields: &FieldSet) -> Result<FieldSet> {
        let mut out = FieldSet::from_source(format!("{} (remapped)", fields.source()));
        for field in fields.iter() {
            out.insert(self.remap_field(field)?);
        }
        tracing::info!(
            n_fields = out.len(),
            weights = self.weights.origin(),
            "horizontal remap complete"
        );
        Ok(out)
    }

    /// Remap one 2D or 3D field.
    pub fn remap_field(&self, field: &GridField) -> Result<GridField> {
        let rank = field.rank();
        if rank != 2 && rank != 3 {
            return Err(RegridError::UnsupportedFieldRank {
                name: field.name().to_string(),
                rank,
            });
        }

        let (ny, nx) = self.weights.dst_shape().as_tuple();
        let (src_ny, src_nx) = field.horizontal_shape().unwrap_or((0, 0));
        if src_ny * src_nx != self.weights.src_cell_count() {
            return Err(RegridError::mismatch(
                format!(
                    "source cells of '{}' vs weights '{}'",
                    field.name(),
                    self.weights.origin()
                ),
                self.weights.src_cell_count(),
                (src_ny, src_nx),
            ));
        }

        let (data, shape) = if rank == 2 {
            let slice = self.remap_slice(field.name(), field.as_array2()?)?;
            (slice, vec![ny, nx])
        } else {
            let stacked = field.as_array3()?;
            let n_stack = stacked.len_of(Axis(0));
            let slices = self.remap_stack(field.name(), stacked.axis_iter(Axis(0)).collect())?;
            let mut data = Vec::with_capacity(n_stack * ny * nx);
            for slice in slices {
                data.extend(slice);
            }
            (data, vec![n_stack, ny, nx])
        };

        let array = Array::from_shape_vec(IxDyn(&shape), data)
            .map_err(|e| RegridError::mismatch(format!("remapped '{}'", field.name()), &shape, e))?;

        tracing::debug!(field = field.name(), ?shape, "remapped field");
        field.with_data(array, field.axes().to_vec())
    }

    #[cfg(not(feature = "parallel"))]
    fn remap_stack(&self, name: &str, slices: Vec<ArrayView2<'_, f64>>) -> Result<Vec<Vec<f64>>> {
        slices
            .into_iter()
            .map(|s| self.remap_slice(name, s))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn remap_stack(&self, name: &str, slices: Vec<ArrayView2<'_, f64>>) -> Result<Vec<Vec<f64>>> {
        use rayon::prelude::*;

        slices
            .into_par_iter()
            .map(|s| self.remap_slice(name, s))
            .collect()
    }

    /// Flatten row-major, scrub fill values, apply the operator.
    fn remap_slice(&self, name: &str, slice: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let mut flat: Vec<f64> = slice.iter().copied().collect();
        let scrubbed = self.fill.scrub(&mut flat);
        if scrubbed > 0 {
            tracing::trace!(field = name, scrubbed, "replaced fill values with zero");
        }
        self.weights.operator().apply(&flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{AxisRole, SOURCE_FILL_VALUE};
    use crate::weights::WeightTriplets;
    use ndarray::{Array2, Array3, Array4};

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

    /// 2x2 source averaged onto a single destination cell.
    fn average_to_one() -> WeightStore {
        WeightStore::from_triplets(
            "mean",
            WeightTriplets {
                n_a: 4,
                n_b: 1,
                row: vec![1, 1, 1, 1],
                col: vec![1, 2, 3, 4],
                s: vec![0.25; 4],
                dst_grid_dims: vec![1, 1],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_all_fill_regrids_to_zero() {
        let weights = average_to_one();
        let field = GridField::surface("sst", Array2::from_elem((2, 2), SOURCE_FILL_VALUE));
        let out = HorizontalRegridder::new(&weights).remap_field(&field).unwrap();
        assert_eq!(out.data().shape(), &[1, 1]);
        assert_eq!(out.data()[[0, 0]], 0.0);
    }

    #[test]
    fn test_stack_length_preserved() {
        let weights = average_to_one();
        let mut data = Array3::zeros((3, 2, 2));
        for k in 0..3 {
            data.index_axis_mut(Axis(0), k).fill(k as f64 + 1.0);
        }
        let field = GridField::stacked("aicen", AxisRole::Category, data);
        let out = HorizontalRegridder::new(&weights).remap_field(&field).unwrap();
        assert_eq!(out.data().shape(), &[3, 1, 1]);
        assert_eq!(out.axes(), field.axes());
        for k in 0..3 {
            assert!((out.data()[[k, 0, 0]] - (k as f64 + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rank_four_rejected() {
        let weights = identity(2, 2);
        let field = GridField::infer(
            "temp",
            Array4::<f64>::zeros((1, 2, 2, 2)).into_dyn(),
            AxisRole::Level,
        );
        let err = HorizontalRegridder::new(&weights).remap_field(&field).unwrap_err();
        assert!(matches!(err, RegridError::UnsupportedFieldRank { rank: 4, .. }));
    }

    #[test]
    fn test_source_size_checked() {
        let weights = identity(2, 2);
        let field = GridField::surface("ssh", Array2::zeros((3, 2)));
        assert!(matches!(
            HorizontalRegridder::new(&weights).remap_field(&field),
            Err(RegridError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_names_preserved() {
        let weights = identity(2, 2);
        let set = FieldSet::new()
            .with(GridField::surface("b", Array2::ones((2, 2))))
            .with(GridField::stacked("a", AxisRole::Category, Array3::ones((5, 2, 2))));
        let out = HorizontalRegridder::new(&weights).remap(&set).unwrap();
        assert_eq!(out.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
