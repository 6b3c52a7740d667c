use serde::{Deserialize, Serialize};

use storefront_core::{AxisId, DomainError, DomainResult, ValueId};

/// A named dimension of variation owned by the vendor (e.g. "Color").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationAxis {
    pub id: AxisId,
    pub name: String,
    /// Number of products currently linked to this axis (server-computed).
    pub usage_count: u32,
}

impl VariationAxis {
    /// Only unused axes may be deleted.
    pub fn is_deletable(&self) -> bool {
        self.usage_count == 0
    }
}

/// A permitted choice within one axis (e.g. "Red").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationValue {
    pub id: ValueId,
    pub axis_id: AxisId,
    pub name: String,
}

/// Trim an operator-entered axis or value name, rejecting blanks.
pub fn normalize_name(raw: &str, what: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{what} name is required")));
    }
    Ok(trimmed.to_string())
}

/// An axis picked for generation, together with its loaded values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedAxis {
    pub axis: VariationAxis,
    pub values: Vec<VariationValue>,
}

/// Ordered set of axes the operator picked.
///
/// Selection order is the axis order of every generated combination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSelection {
    axes: Vec<SelectedAxis>,
}

impl AxisSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axes(&self) -> &[SelectedAxis] {
        &self.axes
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn contains(&self, axis_id: AxisId) -> bool {
        self.axes.iter().any(|s| s.axis.id == axis_id)
    }

    pub fn get(&self, axis_id: AxisId) -> Option<&SelectedAxis> {
        self.axes.iter().find(|s| s.axis.id == axis_id)
    }

    /// Append an axis with its values. Returns `false` if it was already selected.
    pub fn select(&mut self, axis: VariationAxis, values: Vec<VariationValue>) -> bool {
        if self.contains(axis.id) {
            return false;
        }
        self.axes.push(SelectedAxis { axis, values });
        true
    }

    /// Drop an axis from the selection (deselect or purge after deletion).
    pub fn remove(&mut self, axis_id: AxisId) -> Option<SelectedAxis> {
        let pos = self.axes.iter().position(|s| s.axis.id == axis_id)?;
        Some(self.axes.remove(pos))
    }

    /// Attach a freshly created value to its selected axis.
    pub fn add_value(&mut self, value: VariationValue) -> DomainResult<()> {
        let selected = self
            .axes
            .iter_mut()
            .find(|s| s.axis.id == value.axis_id)
            .ok_or_else(|| DomainError::not_found(format!("axis {} is not selected", value.axis_id)))?;

        if !selected.values.iter().any(|v| v.id == value.id) {
            selected.values.push(value);
        }
        Ok(())
    }

    /// Remove a value from whichever selected axis holds it.
    pub fn remove_value(&mut self, value_id: ValueId) -> bool {
        for selected in &mut self.axes {
            if let Some(pos) = selected.values.iter().position(|v| v.id == value_id) {
                selected.values.remove(pos);
                return true;
            }
        }
        false
    }

    /// Generation needs at least one axis and no axis without values.
    pub fn can_generate(&self) -> bool {
        !self.axes.is_empty() && self.axes.iter().all(|s| !s.values.is_empty())
    }
}
