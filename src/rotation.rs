//! Rotation of vector components between grid-local and geographic frames.
//!
//! The sparse operator interpolates each component as a scalar, which is only
//! correct when both grids express (u, v) in the same frame. Vectors are
//! therefore rotated to geographic east/north on the source grid before the
//! remap and back to the destination grid's local axes after it.
//!
//! # Angle convention
//!
//! θ is the angle of the grid's local x-axis relative to geographic east,
//! per cell. If any finite |θ| exceeds π the whole array is assumed to be in
//! degrees and converted.
//!
//! ```text
//! to geographic:  u' = u cosθ + v sinθ     v' = v cosθ − u sinθ
//! to grid-local:  u' = u cosθ − v sinθ     v' = v cosθ + u sinθ
//! ```
//!
//! # Example
//!
//! ```
//! use ic_regrid::rotation::{rotate, RotationAngle, RotationDirection};
//! use ndarray::{array, Array2};
//!
//! let angle = RotationAngle::new(Array2::from_elem((1, 1), 90.0)); // degrees
//! let u = array![[1.0]].into_dyn();
//! let v = array![[0.0]].into_dyn();
//! let (ue, vn) = rotate(&u, &v, &angle, RotationDirection::ToGeographic).unwrap();
//! assert!(ue[[0, 0]].abs() < 1e-12);
//! assert!((vn[[0, 0]] + 1.0).abs() < 1e-12);
//! ```

use std::f64::consts::PI;

use ndarray::{s, Array2, ArrayD, ArrayView2, Zip};

use crate::error::{RegridError, Result};
use crate::field::GridField;

/// Direction of a vector rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationDirection {
    /// Grid-local (i, j) axes → geographic east/north
    ToGeographic,
    /// Geographic east/north → grid-local (i, j) axes
    ToGridLocal,
}

/// Per-cell rotation angle of a grid, in radians.
#[derive(Clone, Debug)]
pub struct RotationAngle {
    radians: Array2<f64>,
    from_degrees: bool,
}

impl RotationAngle {
    /// Angles at cell centers, radians or degrees (auto-detected).
    pub fn new(values: Array2<f64>) -> Self {
        let from_degrees = values.iter().any(|a| a.is_finite() && a.abs() > PI);
        let radians = if from_degrees {
            tracing::warn!("rotation angle exceeds pi in magnitude; treating as degrees");
            values.mapv(f64::to_radians)
        } else {
            values
        };
        Self {
            radians,
            from_degrees,
        }
    }

    /// Angles on a supergrid (twice the cell-center resolution).
    ///
    /// Cell centers are the odd-indexed points in both directions.
    pub fn from_supergrid(values: ArrayView2<'_, f64>) -> Self {
        Self::new(center_sample(values))
    }

    /// `(ny, nx)` of the angle array.
    pub fn shape(&self) -> (usize, usize) {
        self.radians.dim()
    }

    pub fn radians(&self) -> ArrayView2<'_, f64> {
        self.radians.view()
    }

    /// True if the input was detected as degrees.
    pub fn was_degrees(&self) -> bool {
        self.from_degrees
    }
}

/// Extract cell-center values from a supergrid array (`[1::2, 1::2]`).
pub fn center_sample(values: ArrayView2<'_, f64>) -> Array2<f64> {
    values.slice(s![1..;2, 1..;2]).to_owned()
}

/// Rotate a (u, v) pair. The angle is broadcast over any leading axes.
pub fn rotate(
    u: &ArrayD<f64>,
    v: &ArrayD<f64>,
    angle: &RotationAngle,
    direction: RotationDirection,
) -> Result<(ArrayD<f64>, ArrayD<f64>)> {
    if u.shape() != v.shape() {
        return Err(RegridError::mismatch("u/v component shapes", u.shape(), v.shape()));
    }
    let rank = u.ndim();
    let horizontal = if rank >= 2 {
        (u.shape()[rank - 2], u.shape()[rank - 1])
    } else {
        (0, 0)
    };
    if horizontal != angle.shape() {
        return Err(RegridError::mismatch(
            "rotation angle vs vector horizontal shape",
            angle.shape(),
            horizontal,
        ));
    }

    let cos = angle.radians.mapv(f64::cos);
    let sin = angle.radians.mapv(f64::sin);
    let cos = cos
        .broadcast(u.raw_dim())
        .ok_or_else(|| RegridError::mismatch("angle broadcast", u.shape(), cos.shape()))?;
    let sin = sin
        .broadcast(u.raw_dim())
        .ok_or_else(|| RegridError::mismatch("angle broadcast", u.shape(), sin.shape()))?;

    // Sign of the sinθ terms: +1 to geographic, −1 back to the grid.
    let sign = match direction {
        RotationDirection::ToGeographic => 1.0,
        RotationDirection::ToGridLocal => -1.0,
    };

    let mut u_out = ArrayD::zeros(u.raw_dim());
    let mut v_out = ArrayD::zeros(v.raw_dim());
    Zip::from(&mut u_out)
        .and(&mut v_out)
        .and(u)
        .and(v)
        .and(&cos)
        .and(&sin)
        .for_each(|uo, vo, &ui, &vi, &c, &s| {
            *uo = ui * c + sign * vi * s;
            *vo = vi * c - sign * ui * s;
        });

    Ok((u_out, v_out))
}

/// Rotate a pair of vector-component fields, keeping names and metadata.
pub fn rotate_fields(
    u: &GridField,
    v: &GridField,
    angle: &RotationAngle,
    direction: RotationDirection,
) -> Result<(GridField, GridField)> {
    let (u_rot, v_rot) = rotate(u.data(), v.data(), angle, direction).map_err(|e| match e {
        RegridError::DimensionMismatch {
            context,
            expected,
            actual,
        } => RegridError::DimensionMismatch {
            context: format!("{} ('{}', '{}')", context, u.name(), v.name()),
            expected,
            actual,
        },
        other => other,
    })?;
    tracing::debug!(u = u.name(), v = v.name(), ?direction, "rotated vector pair");
    Ok((
        u.with_data(u_rot, u.axes().to_vec())?,
        v.with_data(v_rot, v.axes().to_vec())?,
    ))
}
