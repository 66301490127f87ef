//! Precomputed sparse interpolation weights.
//!
//! Weight files produced by ESMF-style weight generators store the operator
//! as parallel 1-based `row` (destination cell), `col` (source cell) and `S`
//! (weight) arrays, the source and destination cell counts `n_a` / `n_b`, and
//! the destination grid dimensions as `dst_grid_dims = [nx, ny]`.
//!
//! # Example
//!
//! ```
//! use ic_regrid::weights::{WeightStore, WeightTriplets};
//!
//! // 2x2 identity operator
//! let triplets = WeightTriplets {
//!     n_a: 4,
//!     n_b: 4,
//!     row: vec![1, 2, 3, 4],
//!     col: vec![1, 2, 3, 4],
//!     s: vec![1.0; 4],
//!     dst_grid_dims: vec![2, 2],
//! };
//! let store = WeightStore::from_triplets("identity", triplets).unwrap();
//! assert_eq!(store.dst_cell_count(), 4);
//! ```

use rsparse::data::{Sprs, Trpl};

use crate::error::{RegridError, Result};

/// Origin of the index values in a triplet list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBase {
    /// Indices start at 0
    Zero,
    /// Indices start at 1 (Fortran / ESMF convention)
    One,
}

impl IndexBase {
    #[inline]
    fn offset(self) -> i64 {
        match self {
            IndexBase::Zero => 0,
            IndexBase::One => 1,
        }
    }
}

/// Destination horizontal grid shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    /// North-south length
    pub ny: usize,
    /// East-west length
    pub nx: usize,
}

impl GridShape {
    pub fn new(ny: usize, nx: usize) -> Self {
        Self { ny, nx }
    }

    /// Build from a weight file's `dst_grid_dims` vector (`[nx, ny]`).
    ///
    /// A single entry describes an unstructured destination (`ny = 1`).
    pub fn from_grid_dims(dims: &[i64]) -> Option<Self> {
        match dims {
            [nx] if *nx > 0 => Some(Self::new(1, *nx as usize)),
            [nx, ny] if *nx > 0 && *ny > 0 => Some(Self::new(*ny as usize, *nx as usize)),
            _ => None,
        }
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.ny * self.nx
    }

    #[inline]
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }
}

/// Raw weight-file contents before validation.
#[derive(Clone, Debug, Default)]
pub struct WeightTriplets {
    /// Source cell count
    pub n_a: usize,
    /// Destination cell count
    pub n_b: usize,
    /// 1-based destination indices
    pub row: Vec<i64>,
    /// 1-based source indices
    pub col: Vec<i64>,
    /// Weights
    pub s: Vec<f64>,
    /// Destination grid dimensions, `[nx, ny]`
    pub dst_grid_dims: Vec<i64>,
}

/// Sparse `n_dst × n_src` interpolation matrix.
///
/// Immutable once built. Duplicate `(row, col)` entries accumulate.
pub struct SparseOperator {
    matrix: Sprs<f64>,
    n_src: usize,
    n_dst: usize,
    nnz: usize,
}

impl std::fmt::Debug for SparseOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseOperator")
            .field("n_src", &self.n_src)
            .field("n_dst", &self.n_dst)
            .field("nnz", &self.nnz)
            .finish()
    }
}

impl SparseOperator {
    /// Build an operator from parallel row/column/weight arrays.
    pub fn from_triplets(
        n_src: usize,
        n_dst: usize,
        rows: &[i64],
        cols: &[i64],
        weights: &[f64],
        base: IndexBase,
    ) -> Result<Self> {
        Self::build("<triplets>", n_src, n_dst, rows, cols, weights, base)
    }

    fn build(
        origin: &str,
        n_src: usize,
        n_dst: usize,
        rows: &[i64],
        cols: &[i64],
        weights: &[f64],
        base: IndexBase,
    ) -> Result<Self> {
        if rows.len() != cols.len() || rows.len() != weights.len() {
            return Err(RegridError::malformed(
                origin,
                format!(
                    "row/col/S lengths differ: {} / {} / {}",
                    rows.len(),
                    cols.len(),
                    weights.len()
                ),
            ));
        }

        let offset = base.offset();
        let mut dst_idx = Vec::with_capacity(rows.len());
        let mut src_idx = Vec::with_capacity(cols.len());

        for (n, (&r, &c)) in rows.iter().zip(cols.iter()).enumerate() {
            let r0 = r - offset;
            let c0 = c - offset;
            if r0 < 0 || r0 as usize >= n_dst {
                return Err(RegridError::malformed(
                    origin,
                    format!("row index {} at entry {} outside destination size {}", r, n, n_dst),
                ));
            }
            if c0 < 0 || c0 as usize >= n_src {
                return Err(RegridError::malformed(
                    origin,
                    format!("col index {} at entry {} outside source size {}", c, n, n_src),
                ));
            }
            dst_idx.push(r0 as usize);
            src_idx.push(c0 as isize);
        }

        // Triplet form: `p` holds column indices, `i` row indices.
        let trpl = Trpl {
            m: n_dst,
            n: n_src,
            p: src_idx,
            i: dst_idx,
            x: weights.to_vec(),
        };
        let mut matrix = Sprs::new();
        matrix.from_trpl(&trpl);

        Ok(Self {
            matrix,
            n_src,
            n_dst,
            nnz: weights.len(),
        })
    }

    /// Sparse matrix-vector product `dst = S · src`.
    pub fn apply(&self, src: &[f64]) -> Result<Vec<f64>> {
        if src.len() != self.n_src {
            return Err(RegridError::mismatch(
                "sparse operator input length",
                self.n_src,
                src.len(),
            ));
        }
        if self.nnz == 0 {
            return Ok(vec![0.0; self.n_dst]);
        }
        Ok(rsparse::gaxpy(&self.matrix, src, &vec![0.0; self.n_dst]))
    }

    #[inline]
    pub fn n_src(&self) -> usize {
        self.n_src
    }

    #[inline]
    pub fn n_dst(&self) -> usize {
        self.n_dst
    }

    /// Number of stored triples (duplicates counted separately).
    #[inline]
    pub fn nnz(&self) -> usize {
        self.nnz
    }
}

/// A loaded weight file: operator plus destination grid shape.
#[derive(Debug)]
pub struct WeightStore {
    origin: String,
    operator: SparseOperator,
    dst_shape: GridShape,
}

impl WeightStore {
    /// Validate raw weight-file contents and build the operator.
    pub fn from_triplets(origin: impl Into<String>, t: WeightTriplets) -> Result<Self> {
        let origin = origin.into();
        let dst_shape = GridShape::from_grid_dims(&t.dst_grid_dims).ok_or_else(|| {
            RegridError::malformed(
                &origin,
                format!("invalid dst_grid_dims {:?}", t.dst_grid_dims),
            )
        })?;
        if dst_shape.n_cells() != t.n_b {
            return Err(RegridError::malformed(
                &origin,
                format!(
                    "dst_grid_dims {:?} describe {} cells but n_b = {}",
                    t.dst_grid_dims,
                    dst_shape.n_cells(),
                    t.n_b
                ),
            ));
        }

        let operator =
            SparseOperator::build(&origin, t.n_a, t.n_b, &t.row, &t.col, &t.s, IndexBase::One)?;

        tracing::debug!(
            origin = %origin,
            n_src = t.n_a,
            n_dst = t.n_b,
            nnz = operator.nnz(),
            "built sparse operator"
        );

        Ok(Self {
            origin,
            operator,
            dst_shape,
        })
    }

    /// Load a weight file from disk.
    #[cfg(feature = "netcdf")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let triplets = crate::io::read_weight_triplets(path)?;
        Self::from_triplets(path.display().to_string(), triplets)
    }

    /// Where the weights came from (file path or label).
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn operator(&self) -> &SparseOperator {
        &self.operator
    }

    pub fn dst_shape(&self) -> GridShape {
        self.dst_shape
    }

    pub fn dst_cell_count(&self) -> usize {
        self.operator.n_dst()
    }

    pub fn src_cell_count(&self) -> usize {
        self.operator.n_src()
    }
}
