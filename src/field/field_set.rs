//! Named collection of grid fields flowing between pipeline stages.

use indexmap::IndexMap;

use super::GridField;
use crate::error::{RegridError, Result};

/// Insertion-ordered mapping from field name to [`GridField`].
///
/// Lookups of absent names fail with [`RegridError::MissingVariable`]
/// labeled with the set's source, so a missing input is reported before
/// any arithmetic runs.
#[derive(Clone, Debug, Default)]
pub struct FieldSet {
    source: String,
    fields: IndexMap<String, GridField>,
}

impl FieldSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::from_source("field set")
    }

    /// Create an empty set labeled with where its fields came from.
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            fields: IndexMap::new(),
        }
    }

    /// Label used in error messages.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Insert a field, returning the previous field with the same name.
    pub fn insert(&mut self, field: GridField) -> Option<GridField> {
        self.fields.insert(field.name().to_string(), field)
    }

    /// Builder-style insert.
    pub fn with(mut self, field: GridField) -> Self {
        self.insert(field);
        self
    }

    pub fn get(&self, name: &str) -> Result<&GridField> {
        self.fields
            .get(name)
            .ok_or_else(|| RegridError::missing(&self.source, name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut GridField> {
        let source = &self.source;
        self.fields
            .get_mut(name)
            .ok_or_else(|| RegridError::missing(source, name))
    }

    /// Remove and return a field, keeping the order of the rest.
    pub fn take(&mut self, name: &str) -> Result<GridField> {
        self.fields
            .shift_remove(name)
            .ok_or_else(|| RegridError::missing(&self.source, name))
    }

    /// Drop a field if present.
    pub fn remove(&mut self, name: &str) -> Option<GridField> {
        self.fields.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Fail on the first name that is not present.
    pub fn require<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.contains(name) {
                return Err(RegridError::missing(&self.source, name));
            }
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Common `(ny, nx)` of all fields, or `None` for an empty set.
    ///
    /// Every field sharing a grid must have identical horizontal lengths.
    pub fn horizontal_shape(&self) -> Result<Option<(usize, usize)>> {
        let mut shape: Option<(usize, usize)> = None;
        for field in self.fields.values() {
            let Some(hs) = field.horizontal_shape() else {
                return Err(RegridError::UnsupportedFieldRank {
                    name: field.name().to_string(),
                    rank: field.rank(),
                });
            };
            match shape {
                None => shape = Some(hs),
                Some(expected) if expected != hs => {
                    return Err(RegridError::mismatch(
                        format!("horizontal shape of '{}' in {}", field.name(), self.source),
                        expected,
                        hs,
                    ));
                }
                _ => {}
            }
        }
        Ok(shape)
    }
}

impl IntoIterator for FieldSet {
    type Item = GridField;
    type IntoIter = indexmap::map::IntoValues<String, GridField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_values()
    }
}

impl FromIterator<GridField> for FieldSet {
    fn from_iter<I: IntoIterator<Item = GridField>>(iter: I) -> Self {
        let mut set = FieldSet::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::AxisRole;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_missing_lookup_names_source() {
        let set = FieldSet::from_source("cice.nc");
        let err = set.get("aicen").unwrap_err();
        assert!(err.to_string().contains("cice.nc"));
        assert!(err.to_string().contains("aicen"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let set = FieldSet::new()
            .with(GridField::surface("b", Array2::zeros((2, 2))))
            .with(GridField::surface("a", Array2::zeros((2, 2))))
            .with(GridField::surface("c", Array2::zeros((2, 2))));
        let names: Vec<_> = set.names().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_horizontal_shape_mismatch() {
        let set = FieldSet::new()
            .with(GridField::surface("a", Array2::zeros((2, 2))))
            .with(GridField::stacked("b", AxisRole::Category, Array3::zeros((5, 2, 3))));
        assert!(set.horizontal_shape().is_err());
    }

    #[test]
    fn test_require() {
        let set = FieldSet::new().with(GridField::surface("a", Array2::zeros((1, 1))));
        assert!(set.require(["a"]).is_ok());
        assert!(set.require(["a", "b"]).is_err());
    }
}
