//! Stage machine for one variation session on a variable product.
//!
//! The workflow only tracks state; every remote call happens in the pipeline
//! crate, which reports results back through the `*_succeeded` / `*_failed`
//! methods.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_core::{AxisId, DomainError, ProductId};

use crate::axis::{AxisSelection, SelectedAxis};
use crate::combination::{Combination, generate};
use crate::draft::{FinalizedVariant, VariantDraft};
use crate::editor::BulkFieldEditor;
use crate::picker::CombinationPicker;
use crate::product::ProductSnapshot;
use crate::validation::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    TypeSelection,
    CombinationReview,
    DraftCreation,
    BulkEdit,
    Activation,
    Completed,
}

pub fn allowed_transitions(from: WorkflowStage) -> Vec<WorkflowStage> {
    use WorkflowStage::*;
    match from {
        TypeSelection => vec![CombinationReview],
        CombinationReview => vec![TypeSelection, DraftCreation],
        DraftCreation => vec![BulkEdit, CombinationReview],
        BulkEdit => vec![Activation, CombinationReview],
        Activation => vec![Completed, BulkEdit],
        Completed => vec![],
    }
}

pub fn validate_transition(from: WorkflowStage, to: WorkflowStage) -> Result<(), WorkflowError> {
    if allowed_transitions(from).into_iter().any(|s| s == to) {
        Ok(())
    } else {
        Err(WorkflowError::IllegalTransition { from, to })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("illegal workflow transition: {from:?} -> {to:?}")]
    IllegalTransition { from: WorkflowStage, to: WorkflowStage },

    #[error("operation not available in stage {0:?}")]
    WrongStage(WorkflowStage),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Validation(ValidationReport),
}

#[derive(Debug, Clone)]
pub struct VariationWorkflow {
    parent: ProductSnapshot,
    stage: WorkflowStage,
    selection: AxisSelection,
    picker: Option<CombinationPicker>,
    editor: Option<BulkFieldEditor>,
    /// Drafts left behind by a failed creation run, kept for inspection.
    partial: Vec<VariantDraft>,
    /// Persisted drafts the operator navigated away from.
    orphaned: Vec<ProductId>,
}

impl VariationWorkflow {
    pub fn new(parent: ProductSnapshot) -> Self {
        Self {
            parent,
            stage: WorkflowStage::TypeSelection,
            selection: AxisSelection::new(),
            picker: None,
            editor: None,
            partial: Vec::new(),
            orphaned: Vec::new(),
        }
    }

    pub fn parent(&self) -> &ProductSnapshot {
        &self.parent
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn selection(&self) -> &AxisSelection {
        &self.selection
    }

    pub fn picker(&self) -> Option<&CombinationPicker> {
        self.picker.as_ref()
    }

    pub fn editor(&self) -> Option<&BulkFieldEditor> {
        self.editor.as_ref()
    }

    pub fn partial_drafts(&self) -> &[VariantDraft] {
        &self.partial
    }

    pub fn orphaned_drafts(&self) -> &[ProductId] {
        &self.orphaned
    }

    fn require(&self, stage: WorkflowStage) -> Result<(), WorkflowError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(WorkflowError::WrongStage(self.stage))
        }
    }

    fn transition(&mut self, to: WorkflowStage) -> Result<(), WorkflowError> {
        validate_transition(self.stage, to)?;
        self.stage = to;
        Ok(())
    }

    pub fn selection_mut(&mut self) -> Result<&mut AxisSelection, WorkflowError> {
        self.require(WorkflowStage::TypeSelection)?;
        Ok(&mut self.selection)
    }

    pub fn picker_mut(&mut self) -> Result<&mut CombinationPicker, WorkflowError> {
        self.require(WorkflowStage::CombinationReview)?;
        self.picker
            .as_mut()
            .ok_or(WorkflowError::WrongStage(self.stage))
    }

    pub fn editor_mut(&mut self) -> Result<&mut BulkFieldEditor, WorkflowError> {
        self.require(WorkflowStage::BulkEdit)?;
        self.editor
            .as_mut()
            .ok_or(WorkflowError::WrongStage(self.stage))
    }

    /// Axes can only be deleted before combinations exist.
    pub fn check_axis_removal(&self, axis_id: AxisId) -> Result<(), WorkflowError> {
        if self.stage != WorkflowStage::TypeSelection {
            return Err(DomainError::invariant(format!(
                "axis {axis_id} cannot be removed while in {:?}",
                self.stage
            ))
            .into());
        }
        Ok(())
    }

    /// Purge a deleted axis from the selection.
    pub fn remove_axis(&mut self, axis_id: AxisId) -> Result<Option<SelectedAxis>, WorkflowError> {
        self.check_axis_removal(axis_id)?;
        Ok(self.selection.remove(axis_id))
    }

    /// Expand the current selection into combinations and move to review.
    pub fn generate(&mut self) -> Result<&CombinationPicker, WorkflowError> {
        self.require(WorkflowStage::TypeSelection)?;
        if !self.selection.can_generate() {
            return Err(DomainError::validation(
                "select at least one axis and give every selected axis a value",
            )
            .into());
        }
        let set = generate(self.selection.axes());
        self.transition(WorkflowStage::CombinationReview)?;
        Ok(self.picker.insert(CombinationPicker::new(set)))
    }

    /// Step back one stage. Returns draft ids that became orphaned by the move.
    pub fn back(&mut self) -> Result<Vec<ProductId>, WorkflowError> {
        match self.stage {
            WorkflowStage::CombinationReview => {
                self.transition(WorkflowStage::TypeSelection)?;
                self.picker = None;
                self.partial.clear();
                Ok(Vec::new())
            }
            WorkflowStage::BulkEdit => {
                self.transition(WorkflowStage::CombinationReview)?;
                let dropped: Vec<ProductId> = self
                    .editor
                    .take()
                    .map(|e| e.drafts().iter().map(|d| d.id).collect())
                    .unwrap_or_default();
                self.orphaned.extend(dropped.iter().copied());
                Ok(dropped)
            }
            other => Err(WorkflowError::WrongStage(other)),
        }
    }

    /// Lock in the reviewed combinations and start creating drafts.
    pub fn begin_draft_creation(&mut self) -> Result<Vec<Combination>, WorkflowError> {
        self.require(WorkflowStage::CombinationReview)?;
        let combinations = self
            .picker
            .as_ref()
            .ok_or(WorkflowError::WrongStage(self.stage))?
            .require_selection()?;
        self.transition(WorkflowStage::DraftCreation)?;
        self.partial.clear();
        Ok(combinations)
    }

    pub fn drafts_created(&mut self, drafts: Vec<VariantDraft>) -> Result<(), WorkflowError> {
        self.transition(WorkflowStage::BulkEdit)?;
        self.editor = Some(BulkFieldEditor::new(drafts));
        Ok(())
    }

    /// Return to review, keeping whatever was created before the failure.
    pub fn draft_creation_failed(&mut self, partial: Vec<VariantDraft>) -> Result<(), WorkflowError> {
        self.transition(WorkflowStage::CombinationReview)?;
        self.partial = partial;
        Ok(())
    }

    /// Validate every draft and, if clean, move to activation.
    pub fn begin_activation(&mut self) -> Result<Vec<FinalizedVariant>, WorkflowError> {
        self.require(WorkflowStage::BulkEdit)?;
        let finalized = self
            .editor
            .as_ref()
            .ok_or(WorkflowError::WrongStage(self.stage))?
            .finalize()
            .map_err(WorkflowError::Validation)?;
        self.transition(WorkflowStage::Activation)?;
        Ok(finalized)
    }

    pub fn activation_failed(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStage::BulkEdit)
    }

    pub fn activation_succeeded(&mut self) -> Result<(), WorkflowError> {
        self.transition(WorkflowStage::Completed)
    }
}
