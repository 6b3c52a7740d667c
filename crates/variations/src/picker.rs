use std::collections::BTreeSet;

use storefront_core::{DomainError, DomainResult};

use crate::combination::{Combination, CombinationSet};

/// Operator's pruning of a generated set: which combinations become drafts.
///
/// A new picker starts with every combination selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinationPicker {
    set: CombinationSet,
    active: BTreeSet<usize>,
}

impl CombinationPicker {
    pub fn new(set: CombinationSet) -> Self {
        let active = (0..set.len()).collect();
        Self { set, active }
    }

    pub fn set(&self) -> &CombinationSet {
        &self.set
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.active.contains(&index)
    }

    pub fn selected_count(&self) -> usize {
        self.active.len()
    }

    /// Flip one combination; returns its new selection state.
    pub fn toggle(&mut self, index: usize) -> DomainResult<bool> {
        if index >= self.set.len() {
            return Err(DomainError::not_found(format!("combination #{}", index + 1)));
        }
        if self.active.remove(&index) {
            Ok(false)
        } else {
            self.active.insert(index);
            Ok(true)
        }
    }

    pub fn select_all(&mut self) {
        self.active = (0..self.set.len()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.active.clear();
    }

    /// Selected combinations in generation order.
    pub fn selected(&self) -> Vec<Combination> {
        self.active
            .iter()
            .filter_map(|&i| self.set.get(i).cloned())
            .collect()
    }

    /// Selected combinations, refusing an empty selection.
    pub fn require_selection(&self) -> DomainResult<Vec<Combination>> {
        if self.active.is_empty() {
            return Err(DomainError::validation("select at least one combination"));
        }
        Ok(self.selected())
    }
}
