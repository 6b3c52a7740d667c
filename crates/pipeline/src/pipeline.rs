//! One operator session on a variable product: axis selection through
//! activation, driven by the workflow stage machine.

use storefront_catalog::CatalogApi;
use storefront_core::{AxisId, ProductId, ValueId};
use storefront_variations::{
    BulkFieldEditor, CombinationPicker, FinalizedVariant, ProductSnapshot, VariationAxis,
    VariationValue, VariationWorkflow, WorkflowStage,
};

use crate::axis_store::AxisStore;
use crate::cancel::CancelToken;
use crate::committer::{ActivationCommitter, ActivationError, ActivationReport};
use crate::compensation::{CompensationLog, CompensationReport};
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::orchestrator::DraftOrchestrator;
use crate::retry::with_retry;

pub struct VariationPipeline<C> {
    api: C,
    workflow: VariationWorkflow,
    axes: AxisStore<C>,
    orchestrator: DraftOrchestrator<C>,
    committer: ActivationCommitter<C>,
    /// Every write made by this session, oldest first.
    log: CompensationLog,
    last_activation: Option<ActivationError>,
    /// What the failed attempt in `last_activation` was given.
    last_sent: Vec<FinalizedVariant>,
}

impl<C: CatalogApi + Clone> VariationPipeline<C> {
    /// Load the parent product and the vendor's axes.
    pub async fn open(api: C, config: PipelineConfig, parent_id: ProductId) -> PipelineResult<Self> {
        let source = &api;
        let parent = with_retry(&config.retry, "load parent product", move || {
            source.get_product(parent_id)
        })
        .await?;
        tracing::info!("Opened variation session for {} ({})", parent.name, parent.id);

        let mut pipeline = Self::new(api, config, parent);
        pipeline.axes.refresh().await;
        Ok(pipeline)
    }

    pub fn new(api: C, config: PipelineConfig, parent: ProductSnapshot) -> Self {
        let axes = AxisStore::new(api.clone(), config.retry.clone()).for_product(parent.id);
        Self {
            workflow: VariationWorkflow::new(parent),
            axes,
            orchestrator: DraftOrchestrator::new(api.clone(), config.clone()),
            committer: ActivationCommitter::new(api.clone(), config),
            api,
            log: CompensationLog::new(),
            last_activation: None,
            last_sent: Vec::new(),
        }
    }

    pub fn workflow(&self) -> &VariationWorkflow {
        &self.workflow
    }

    pub fn stage(&self) -> WorkflowStage {
        self.workflow.stage()
    }

    pub fn parent(&self) -> &ProductSnapshot {
        self.workflow.parent()
    }

    pub fn axes(&self) -> &[VariationAxis] {
        self.axes.axes()
    }

    pub fn compensation_log(&self) -> &CompensationLog {
        &self.log
    }

    /// Outcome of the last failed activation, if the next attempt will resume it.
    pub fn pending_activation(&self) -> Option<&ActivationError> {
        self.last_activation.as_ref()
    }

    pub async fn refresh_axes(&mut self) -> &[VariationAxis] {
        self.axes.refresh().await
    }

    pub async fn create_axis(&mut self, name: &str) -> PipelineResult<VariationAxis> {
        Ok(self.axes.create_axis(name).await?)
    }

    /// Delete an unused axis and purge it from the selection.
    pub async fn delete_axis(&mut self, id: AxisId) -> PipelineResult<()> {
        self.workflow.check_axis_removal(id)?;
        self.axes.delete_axis(id).await?;
        self.workflow.remove_axis(id)?;
        Ok(())
    }

    pub async fn select_axis(&mut self, id: AxisId) -> PipelineResult<bool> {
        let selection = self.workflow.selection_mut()?;
        Ok(self.axes.select_axis(id, selection).await?)
    }

    pub fn deselect_axis(&mut self, id: AxisId) -> PipelineResult<bool> {
        let selection = self.workflow.selection_mut()?;
        Ok(self.axes.deselect_axis(id, selection))
    }

    pub async fn create_value(&mut self, axis: AxisId, name: &str) -> PipelineResult<VariationValue> {
        let selection = self.workflow.selection_mut()?;
        Ok(self.axes.create_value(axis, name, selection).await?)
    }

    pub async fn delete_value(&mut self, id: ValueId) -> PipelineResult<()> {
        let selection = self.workflow.selection_mut()?;
        Ok(self.axes.delete_value(id, selection).await?)
    }

    pub fn generate(&mut self) -> PipelineResult<&CombinationPicker> {
        let picker = self.workflow.generate()?;
        let set = picker.set();
        if set.is_truncated() {
            tracing::warn!(
                "{} combinations possible, only the first {} were generated",
                set.total_possible(),
                set.len()
            );
        }
        Ok(picker)
    }

    pub fn picker_mut(&mut self) -> PipelineResult<&mut CombinationPicker> {
        Ok(self.workflow.picker_mut()?)
    }

    pub fn editor_mut(&mut self) -> PipelineResult<&mut BulkFieldEditor> {
        Ok(self.workflow.editor_mut()?)
    }

    /// Step back one stage; drafts left behind are reported, not deleted.
    pub fn back(&mut self) -> PipelineResult<Vec<ProductId>> {
        let orphaned = self.workflow.back()?;
        self.forget_activation();
        if !orphaned.is_empty() {
            tracing::warn!("{} persisted drafts left without an editor", orphaned.len());
        }
        Ok(orphaned)
    }

    /// Persist one draft per selected combination. Returns the number created.
    pub async fn create_drafts(&mut self, cancel: &CancelToken) -> PipelineResult<usize> {
        let combinations = self.workflow.begin_draft_creation()?;
        self.forget_activation();
        let result = self
            .orchestrator
            .create_drafts(self.workflow.parent(), &combinations, cancel)
            .await;

        match result {
            Ok(batch) => {
                let count = batch.drafts.len();
                self.log.extend(batch.log);
                self.workflow.drafts_created(batch.drafts)?;
                Ok(count)
            }
            Err(e) => {
                self.log.extend(e.log.clone());
                self.workflow.draft_creation_failed(e.created.clone())?;
                Err(e.into())
            }
        }
    }

    /// Validate the edited drafts and activate them, then the parent. After a
    /// failed attempt only the records it left pending, plus any edited since,
    /// are written again.
    pub async fn activate(&mut self, cancel: &CancelToken) -> PipelineResult<ActivationReport> {
        let variants = self.workflow.begin_activation()?;
        let parent = self.workflow.parent();

        let result = match &self.last_activation {
            Some(previous) => {
                let (resend, already_active) = plan_resume(previous, &self.last_sent, &variants);
                tracing::info!(
                    "Resuming activation: {} to write, {} already active",
                    resend.len(),
                    already_active.len()
                );
                self.committer
                    .resume(parent, &resend, already_active, cancel)
                    .await
            }
            None => self.committer.activate(parent, &variants, cancel).await,
        };

        match result {
            Ok(report) => {
                self.log.extend(report.log.clone());
                self.forget_activation();
                self.workflow.activation_succeeded()?;
                Ok(report)
            }
            Err(e) => {
                self.log.extend(e.log().clone());
                self.workflow.activation_failed()?;

                let editor = self.workflow.editor_mut()?;
                for &(id, version) in e.observed_versions() {
                    editor.record_version(id, version);
                }
                for failure in e.failures() {
                    if let Some(version) = failure.current_version {
                        editor.record_version(failure.product, version);
                    }
                }

                self.last_sent = variants;
                self.last_activation = Some(e.clone());
                Err(e.into())
            }
        }
    }

    fn forget_activation(&mut self) {
        self.last_activation = None;
        self.last_sent.clear();
    }

    /// Undo this session's writes, newest first. A fully successful replay
    /// clears the log.
    pub async fn compensate(&mut self) -> CompensationReport {
        let report = self.log.compensate(&self.api).await;
        if report.is_complete() {
            self.log.clear();
        }
        report
    }
}

/// Split a resumed activation into the variants to write (left pending, or
/// edited since they were last sent) and those that stay active untouched.
fn plan_resume(
    previous: &ActivationError,
    last_sent: &[FinalizedVariant],
    variants: &[FinalizedVariant],
) -> (Vec<FinalizedVariant>, Vec<ProductId>) {
    let pending = previous.pending();
    let resend: Vec<FinalizedVariant> = variants
        .iter()
        .filter(|v| {
            pending.contains(&v.id)
                || !last_sent.iter().any(|sent| sent.id == v.id && sent.same_fields(v))
        })
        .cloned()
        .collect();
    let already_active = previous
        .activated()
        .iter()
        .copied()
        .filter(|id| !resend.iter().any(|v| v.id == *id))
        .collect();
    (resend, already_active)
}
