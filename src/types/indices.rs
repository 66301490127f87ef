//! Strongly-typed index newtypes.
//!
//! These keep ice thickness categories, ice layers and ocean vertical levels
//! from being mixed up when the thermodynamic rules walk nested loops.

use std::fmt;

/// Generates an index newtype with conversions, `Display` and slice indexing.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// First index (0).
            pub const ZERO: Self = Self(0);

            /// Iterate over [0, n).
            pub fn iter(n: usize) -> impl Iterator<Item = $name> + ExactSizeIterator {
                (0..n).map($name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }

        impl<T> std::ops::Index<$name> for [T] {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }

        impl<T> std::ops::Index<$name> for Vec<T> {
            type Output = T;
            #[inline]
            fn index(&self, idx: $name) -> &T {
                &self[idx.0]
            }
        }
    };
}

define_index!(
    /// Ice thickness category index (leading axis of `aicen`, `vicen`, ...).
    ///
    /// # Example
    ///
    /// ```
    /// use ic_regrid::types::CategoryIndex;
    ///
    /// let cat = CategoryIndex::new(2);
    /// assert_eq!(cat.get(), 2);
    /// ```
    CategoryIndex,
    "C"
);

define_index!(
    /// Vertical ice layer index within a category.
    ///
    /// # Example
    ///
    /// ```
    /// use ic_regrid::types::LayerIndex;
    ///
    /// let layer = LayerIndex::new(0);
    /// assert_eq!(layer.field_suffix(), "001");
    /// ```
    LayerIndex,
    "I"
);

define_index!(
    /// Ocean vertical level index.
    LevelIndex,
    "L"
);

impl LayerIndex {
    /// One-based, zero-padded suffix used in layer field names (`qice001`).
    pub fn field_suffix(self) -> String {
        format!("{:03}", self.0 + 1)
    }
}
