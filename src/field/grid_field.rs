//! Labeled multi-dimensional grid fields.

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, Ix2, Ix3};

use crate::error::{RegridError, Result};

/// Role of one array axis.
///
/// Horizontal axes are always the trailing pair `[.., Y, X]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisRole {
    /// Forecast/time axis (only on fields read straight from a container)
    Time,
    /// Ice thickness category
    Category,
    /// Ocean vertical level
    Level,
    /// North-south index
    Y,
    /// East-west index
    X,
}

impl AxisRole {
    /// True for the two horizontal roles.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, AxisRole::Y | AxisRole::X)
    }
}

/// A named array with per-axis roles and optional CF metadata.
#[derive(Clone, Debug)]
pub struct GridField {
    name: String,
    data: ArrayD<f64>,
    axes: Vec<AxisRole>,
    units: Option<String>,
    long_name: Option<String>,
}

impl GridField {
    /// Create a field with explicit axis roles.
    ///
    /// The number of roles must equal the array rank.
    pub fn new(name: impl Into<String>, data: ArrayD<f64>, axes: Vec<AxisRole>) -> Result<Self> {
        let name = name.into();
        if axes.len() != data.ndim() {
            return Err(RegridError::mismatch(
                format!("axis roles of field '{}'", name),
                data.ndim(),
                axes.len(),
            ));
        }
        Ok(Self {
            name,
            data,
            axes,
            units: None,
            long_name: None,
        })
    }

    /// Create a 2D `[Y, X]` field.
    pub fn surface(name: impl Into<String>, data: Array2<f64>) -> Self {
        Self {
            name: name.into(),
            data: data.into_dyn(),
            axes: vec![AxisRole::Y, AxisRole::X],
            units: None,
            long_name: None,
        }
    }

    /// Create a 3D `[stack, Y, X]` field with the given leading role.
    pub fn stacked(name: impl Into<String>, stack: AxisRole, data: Array3<f64>) -> Self {
        Self {
            name: name.into(),
            data: data.into_dyn(),
            axes: vec![stack, AxisRole::Y, AxisRole::X],
            units: None,
            long_name: None,
        }
    }

    /// Create a field of any rank, inferring roles from the trailing axes.
    ///
    /// The last two axes are `[Y, X]`, a third-from-last axis takes
    /// `stack`, and anything before that is labeled `Time`.
    pub fn infer(name: impl Into<String>, data: ArrayD<f64>, stack: AxisRole) -> Self {
        let rank = data.ndim();
        let axes = (0..rank)
            .map(|i| match rank - i {
                1 => AxisRole::X,
                2 => AxisRole::Y,
                3 => stack,
                _ => AxisRole::Time,
            })
            .collect();
        Self {
            name: name.into(),
            data,
            axes,
            units: None,
            long_name: None,
        }
    }

    /// Set the units attribute.
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Set the long_name attribute.
    pub fn with_long_name(mut self, long_name: impl Into<String>) -> Self {
        self.long_name = Some(long_name.into());
        self
    }

    /// Rename the field.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build a new field state with the same name and metadata.
    pub fn with_data(&self, data: ArrayD<f64>, axes: Vec<AxisRole>) -> Result<Self> {
        let mut field = Self::new(self.name.clone(), data, axes)?;
        field.units = self.units.clone();
        field.long_name = self.long_name.clone();
        Ok(field)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut ArrayD<f64> {
        &mut self.data
    }

    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    #[inline]
    pub fn axes(&self) -> &[AxisRole] {
        &self.axes
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.data.ndim()
    }

    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    /// `(ny, nx)` of the trailing horizontal axes, if the field has them.
    pub fn horizontal_shape(&self) -> Option<(usize, usize)> {
        let shape = self.data.shape();
        let rank = shape.len();
        if rank < 2 {
            return None;
        }
        Some((shape[rank - 2], shape[rank - 1]))
    }

    /// Role of the leading axis of a 3D field.
    pub fn stack_axis(&self) -> Option<AxisRole> {
        (self.rank() == 3).then(|| self.axes[0])
    }

    /// Number of horizontal slices (1 for a surface field).
    pub fn stack_len(&self) -> usize {
        match self.rank() {
            3 => self.data.shape()[0],
            _ => 1,
        }
    }

    /// View as `[Y, X]`.
    pub fn as_array2(&self) -> Result<ArrayView2<'_, f64>> {
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| self.rank_mismatch(2))
    }

    /// Mutable view as `[Y, X]`.
    pub fn as_array2_mut(&mut self) -> Result<ArrayViewMut2<'_, f64>> {
        let err = self.rank_mismatch(2);
        self.data.view_mut().into_dimensionality::<Ix2>().map_err(|_| err)
    }

    /// View as `[stack, Y, X]`.
    pub fn as_array3(&self) -> Result<ArrayView3<'_, f64>> {
        self.data
            .view()
            .into_dimensionality::<Ix3>()
            .map_err(|_| self.rank_mismatch(3))
    }

    /// Mutable view as `[stack, Y, X]`.
    pub fn as_array3_mut(&mut self) -> Result<ArrayViewMut3<'_, f64>> {
        let err = self.rank_mismatch(3);
        self.data.view_mut().into_dimensionality::<Ix3>().map_err(|_| err)
    }

    fn rank_mismatch(&self, expected: usize) -> RegridError {
        RegridError::mismatch(
            format!("rank of field '{}'", self.name),
            expected,
            self.rank(),
        )
    }
}
