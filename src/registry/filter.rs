//! Filter registry for named palette substitutions.

use std::collections::HashMap;

use crate::decode::Substitution;
use crate::error::{CodecError, Result};

use super::traits::Registry;

/// Registry of palette filters.
///
/// A filter maps default-palette indices to other default-palette indices.
/// Entries reference filters by id, and a chain of ids composes left to right.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Substitution>,
}

impl FilterRegistry {
    /// Create a new empty filter registry.
    pub fn new() -> Self {
        Self { filters: HashMap::new() }
    }

    /// Register a filter, replacing any filter with the same id.
    pub fn register(&mut self, id: impl Into<String>, map: HashMap<u32, u32>) {
        let id = id.into();
        self.filters.insert(id.clone(), Substitution::new(id, map));
    }

    /// Get a filter by id.
    pub fn get(&self, id: &str) -> Option<&Substitution> {
        self.filters.get(id)
    }

    /// Check if a filter with the given id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.filters.contains_key(id)
    }

    /// Get the number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Fail with [`CodecError::UnknownFilter`] unless `id` is registered.
    pub fn require(&self, id: &str) -> Result<&Substitution> {
        self.filters.get(id).ok_or_else(|| CodecError::UnknownFilter(id.to_string()))
    }

    /// Compose a chain of filters, applied in order.
    ///
    /// An empty chain is the identity.
    pub fn chain<I, S>(&self, ids: I) -> Result<Substitution>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter()
            .try_fold(Substitution::identity(), |acc, id| Ok(acc.then(self.require(id.as_ref())?)))
    }
}

impl Registry<Substitution> for FilterRegistry {
    fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<&Substitution> {
        self.filters.get(name)
    }

    fn len(&self) -> usize {
        self.filters.len()
    }

    fn clear(&mut self) {
        self.filters.clear();
    }

    fn names(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        Box::new(self.filters.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::new();
        registry.register("red", HashMap::from([(1, 3)]));
        registry.register("dark", HashMap::from([(3, 4), (2, 4)]));
        registry
    }

    #[test]
    fn test_chain_composes_in_order() {
        let registry = registry();
        let both = registry.chain(["red", "dark"]).unwrap();
        assert_eq!(both.tag(), "red+dark");
        assert_eq!(both.ids().to_vec(), vec!["red".to_string(), "dark".to_string()]);
        assert_eq!(both.apply(1), 4);
        assert_eq!(both.apply(2), 4);
        assert_eq!(both.apply(0), 0);

        let reversed = registry.chain(["dark", "red"]).unwrap();
        assert_eq!(reversed.apply(1), 3);
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert!(registry().chain(Vec::<String>::new()).unwrap().is_identity());
    }

    #[test]
    fn test_unknown_filter() {
        let err = registry().chain(["red", "blue"]).unwrap_err();
        assert_eq!(err, CodecError::UnknownFilter("blue".to_string()));
    }

    #[test]
    fn test_registry_trait() {
        let mut registry = registry();
        let as_trait: &dyn Registry<Substitution> = &registry;
        assert!(as_trait.contains("dark"));
        let mut names: Vec<_> = as_trait.names().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["dark", "red"]);

        Registry::clear(&mut registry);
        assert!(Registry::is_empty(&registry));
    }
}
