//! Interface heights and bathymetry merging.

use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

use crate::error::{RegridError, Result};

/// Interface heights from layer thicknesses.
///
/// `thickness` is `[nz, ny, nx]`; the result is `[nz + 1, ny, nx]` with the
/// top interface at `surface` and each interface below it lowered by the
/// thickness of the layer above:
///
/// ```text
/// e[0] = surface,  e[k+1] = e[k] − h[k]
/// ```
pub fn interface_heights(thickness: ArrayView3<'_, f64>, surface: f64) -> Array3<f64> {
    let (nz, ny, nx) = thickness.dim();
    let mut eta = Array3::zeros((nz + 1, ny, nx));
    eta.index_axis_mut(Axis(0), 0).fill(surface);
    for k in 0..nz {
        let (above, mut below) = eta.multi_slice_mut((s![k, .., ..], s![k + 1, .., ..]));
        Zip::from(&mut below)
            .and(&above)
            .and(thickness.index_axis(Axis(0), k))
            .for_each(|e, &top, &h| *e = top - h);
    }
    eta
}

/// Merge a remapped bathymetry into the original one.
///
/// The remapped depth is kept only where both depths exceed `min_depth`;
/// everywhere else (land in either grid, or very shallow cells) the original
/// depth is kept so the land/sea mask is unchanged.
pub fn patch_depth(
    original: ArrayView2<'_, f64>,
    remapped: ArrayView2<'_, f64>,
    min_depth: f64,
) -> Result<Array2<f64>> {
    if original.dim() != remapped.dim() {
        return Err(RegridError::mismatch(
            "remapped vs original depth",
            original.dim(),
            remapped.dim(),
        ));
    }
    let mut patched = original.to_owned();
    let mut n_patched = 0usize;
    Zip::from(&mut patched)
        .and(&remapped)
        .for_each(|d, &new| {
            if *d > min_depth && new > min_depth {
                *d = new;
                n_patched += 1;
            }
        });
    tracing::debug!(n_patched, min_depth, "patched bathymetry");
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_interface_heights() {
        let mut h = Array3::zeros((3, 1, 2));
        h.index_axis_mut(Axis(0), 0).fill(10.0);
        h.index_axis_mut(Axis(0), 1).fill(20.0);
        h.index_axis_mut(Axis(0), 2).fill(30.0);
        h[[2, 0, 1]] = 0.0;

        let e = interface_heights(h.view(), 0.5);
        assert_eq!(e.dim(), (4, 1, 2));
        assert_relative_eq!(e[[0, 0, 0]], 0.5);
        assert_relative_eq!(e[[1, 0, 0]], -9.5);
        assert_relative_eq!(e[[3, 0, 0]], -59.5);
        assert_relative_eq!(e[[3, 0, 1]], -29.5);
    }

    #[test]
    fn test_interface_heights_sum_to_column_depth() {
        let h = Array3::from_elem((5, 2, 2), 4.0);
        let e = interface_heights(h.view(), 0.0);
        for &bottom in e.index_axis(Axis(0), 5).iter() {
            assert_relative_eq!(bottom, -20.0);
        }
    }

    #[test]
    fn test_patch_depth() {
        let old = array![[0.0, 5.0], [100.0, 0.5]];
        let new = array![[30.0, 0.0], [120.0, 50.0]];
        let patched = patch_depth(old.view(), new.view(), 1.0).unwrap();
        assert_eq!(patched, array![[0.0, 5.0], [120.0, 0.5]]);
    }

    #[test]
    fn test_patch_depth_shape_checked() {
        let old = Array2::<f64>::zeros((2, 2));
        let new = Array2::<f64>::zeros((2, 3));
        assert!(patch_depth(old.view(), new.view(), 1.0).is_err());
    }
}
