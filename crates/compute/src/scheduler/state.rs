use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Indices of units whose baseline pass over all three categories has run.
#[derive(Debug, Default)]
pub struct CompiledUnits {
    indices: RwLock<HashSet<usize>>,
}

impl CompiledUnits {
    pub fn contains(&self, unit: usize) -> bool {
        self.indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&unit)
    }

    /// Returns whether the unit was newly added.
    pub fn insert(&self, unit: usize) -> bool {
        self.indices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(unit)
    }

    /// Returns whether the unit was present.
    pub fn remove(&self, unit: usize) -> bool {
        self.indices
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&unit)
    }

    pub fn len(&self) -> usize {
        self.indices.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy of the tracked indices.
    pub fn snapshot(&self) -> Vec<usize> {
        let mut units: Vec<usize> = self
            .indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect();
        units.sort_unstable();
        units
    }
}
