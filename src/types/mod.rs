//! Strongly-typed domain types for safer APIs.
//!
//! # Example
//!
//! ```
//! use ic_regrid::types::{CategoryIndex, LayerIndex};
//!
//! for cat in CategoryIndex::iter(5) {
//!     for layer in LayerIndex::iter(7) {
//!         let _name = format!("qice{}", layer.field_suffix());
//!         let _ = cat;
//!     }
//! }
//! ```

mod indices;

pub use indices::{CategoryIndex, LayerIndex, LevelIndex};
