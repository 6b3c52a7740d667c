//! Flips finalized drafts to active, then the parent.
//!
//! The parent is only touched once every draft is active. A parent failure
//! after that leaves active children under a draft parent; the error says so
//! and nothing reconciles it automatically.

use futures::StreamExt;
use futures::stream;
use thiserror::Error;
use tracing::Instrument;

use storefront_catalog::{CatalogApi, CatalogError, EmailRequest, ProductUpdate};
use storefront_core::{ExpectedVersion, ProductId, RunId};
use storefront_variations::{FinalizedVariant, ProductSnapshot, ProductStatus};

use crate::cancel::CancelToken;
use crate::compensation::{CompensationEntry, CompensationLog};
use crate::config::PipelineConfig;
use crate::retry::with_retry;

#[derive(Debug)]
pub struct ActivationReport {
    pub run_id: RunId,
    /// Every variant now active, including ones activated by earlier attempts.
    pub activated: Vec<ProductId>,
    pub parent: ProductSnapshot,
    /// Set when the "new product" notification could not be queued.
    pub notification_warning: Option<String>,
    pub log: CompensationLog,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to activate \"{name}\": {source}")]
pub struct DraftActivationFailure {
    pub product: ProductId,
    pub name: String,
    pub source: CatalogError,
    /// Version re-read from the backend after a conflict.
    pub current_version: Option<u64>,
}

#[derive(Debug, Clone, Error)]
pub enum ActivationError {
    #[error(
        "{} of {attempted} variations failed to activate; parent left in draft:\n{}",
        .failures.len(),
        list_failures(.failures)
    )]
    DraftsFailed {
        run_id: RunId,
        activated: Vec<ProductId>,
        observed: Vec<(ProductId, u64)>,
        failures: Vec<DraftActivationFailure>,
        attempted: usize,
        log: CompensationLog,
    },

    #[error("Variations are active but the parent product could not be activated: {source}")]
    ParentFailed {
        run_id: RunId,
        activated: Vec<ProductId>,
        observed: Vec<(ProductId, u64)>,
        source: CatalogError,
        log: CompensationLog,
    },

    #[error("Activation cancelled with {} records pending", .remaining.len())]
    Cancelled {
        run_id: RunId,
        activated: Vec<ProductId>,
        observed: Vec<(ProductId, u64)>,
        failures: Vec<DraftActivationFailure>,
        remaining: Vec<ProductId>,
        log: CompensationLog,
    },
}

fn list_failures(failures: &[DraftActivationFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ActivationError {
    pub fn activated(&self) -> &[ProductId] {
        match self {
            ActivationError::DraftsFailed { activated, .. }
            | ActivationError::ParentFailed { activated, .. }
            | ActivationError::Cancelled { activated, .. } => activated,
        }
    }

    /// Versions the backend reported for variants written in this attempt.
    pub fn observed_versions(&self) -> &[(ProductId, u64)] {
        match self {
            ActivationError::DraftsFailed { observed, .. }
            | ActivationError::ParentFailed { observed, .. }
            | ActivationError::Cancelled { observed, .. } => observed,
        }
    }

    pub fn failures(&self) -> &[DraftActivationFailure] {
        match self {
            ActivationError::DraftsFailed { failures, .. }
            | ActivationError::Cancelled { failures, .. } => failures,
            ActivationError::ParentFailed { .. } => &[],
        }
    }

    pub fn log(&self) -> &CompensationLog {
        match self {
            ActivationError::DraftsFailed { log, .. }
            | ActivationError::ParentFailed { log, .. }
            | ActivationError::Cancelled { log, .. } => log,
        }
    }

    /// Variants still in draft: failed plus never attempted.
    pub fn pending(&self) -> Vec<ProductId> {
        match self {
            ActivationError::DraftsFailed { failures, .. } => {
                failures.iter().map(|f| f.product).collect()
            }
            ActivationError::ParentFailed { .. } => Vec::new(),
            ActivationError::Cancelled {
                failures, remaining, ..
            } => failures
                .iter()
                .map(|f| f.product)
                .chain(remaining.iter().copied())
                .collect(),
        }
    }

    /// The split state: children active, parent still draft.
    pub fn is_split(&self) -> bool {
        matches!(self, ActivationError::ParentFailed { .. })
    }
}

pub struct ActivationCommitter<C> {
    api: C,
    config: PipelineConfig,
}

impl<C: CatalogApi> ActivationCommitter<C> {
    pub fn new(api: C, config: PipelineConfig) -> Self {
        Self { api, config }
    }

    pub async fn activate(
        &self,
        parent: &ProductSnapshot,
        variants: &[FinalizedVariant],
        cancel: &CancelToken,
    ) -> Result<ActivationReport, ActivationError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("activate", run_id = %run_id, parent = %parent.id);
        self.run(run_id, parent, variants, Vec::new(), variants.len(), cancel)
            .instrument(span)
            .await
    }

    /// Resume after `previous`: only variants it left pending are attempted,
    /// then the parent. After a parent failure this goes straight to the parent.
    pub async fn retry_failed(
        &self,
        parent: &ProductSnapshot,
        variants: &[FinalizedVariant],
        previous: &ActivationError,
        cancel: &CancelToken,
    ) -> Result<ActivationReport, ActivationError> {
        let pending = previous.pending();
        let retry: Vec<FinalizedVariant> = variants
            .iter()
            .filter(|v| pending.contains(&v.id))
            .cloned()
            .collect();
        self.resume(parent, &retry, previous.activated().to_vec(), cancel)
            .await
    }

    /// Write `variants`, then the parent. `already_active` are variants an
    /// earlier attempt activated that are not written again; they count
    /// towards the report and the notification.
    pub async fn resume(
        &self,
        parent: &ProductSnapshot,
        variants: &[FinalizedVariant],
        already_active: Vec<ProductId>,
        cancel: &CancelToken,
    ) -> Result<ActivationReport, ActivationError> {
        let total = already_active.len() + variants.len();
        let run_id = RunId::new();
        let span = tracing::info_span!(
            "resume_activation",
            run_id = %run_id,
            parent = %parent.id,
            resent = variants.len()
        );
        self.run(run_id, parent, variants, already_active, total, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: RunId,
        parent: &ProductSnapshot,
        variants: &[FinalizedVariant],
        mut activated: Vec<ProductId>,
        variation_count: usize,
        cancel: &CancelToken,
    ) -> Result<ActivationReport, ActivationError> {
        let api = &self.api;
        let retry = &self.config.retry;
        let concurrency = self.config.activation_concurrency.max(1);
        let mut log = CompensationLog::new();

        tracing::info!(
            "Activating {} variations (concurrency {})",
            variants.len(),
            concurrency
        );

        let outcomes: Vec<(&FinalizedVariant, Option<Result<ProductSnapshot, CatalogError>>)> =
            stream::iter(variants)
                .map(|variant| async move {
                    if cancel.is_cancelled() {
                        return (variant, None);
                    }
                    let update = ProductUpdate::activate_variant(variant);
                    let update = &update;
                    let expected = ExpectedVersion::from_observed(variant.version);
                    let result = with_retry(retry, "activate variant", move || {
                        api.update_product(variant.id, update, expected)
                    })
                    .await;
                    (variant, Some(result))
                })
                .buffered(concurrency)
                .collect()
                .await;

        let mut failures = Vec::new();
        let mut remaining = Vec::new();
        let mut observed = Vec::new();
        for (variant, outcome) in outcomes {
            match outcome {
                Some(Ok(updated)) => {
                    tracing::debug!("Activated {} ({})", variant.name, variant.id);
                    if let Some(version) = updated.version {
                        observed.push((variant.id, version));
                    }
                    log.record(CompensationEntry::DraftActivated {
                        product: variant.id,
                    });
                    activated.push(variant.id);
                }
                Some(Err(source)) => {
                    let current_version = match source {
                        CatalogError::Conflict(_) => self.current_version(variant.id).await,
                        _ => None,
                    };
                    let failure = DraftActivationFailure {
                        product: variant.id,
                        name: variant.name.clone(),
                        source,
                        current_version,
                    };
                    tracing::error!("{}", failure);
                    failures.push(failure);
                }
                None => remaining.push(variant.id),
            }
        }

        if !remaining.is_empty() || cancel.is_cancelled() {
            if failures.is_empty() && remaining.is_empty() {
                remaining.push(parent.id);
            }
            tracing::warn!("Activation cancelled, {} records pending", remaining.len());
            return Err(ActivationError::Cancelled {
                run_id,
                activated,
                observed,
                failures,
                remaining,
                log,
            });
        }

        if !failures.is_empty() {
            return Err(ActivationError::DraftsFailed {
                run_id,
                activated,
                observed,
                attempted: variants.len(),
                failures,
                log,
            });
        }

        let update = ProductUpdate::status_only(ProductStatus::Active);
        let update = &update;
        let expected = ExpectedVersion::from_observed(parent.version);
        let parent_id = parent.id;
        let updated = match with_retry(retry, "activate parent", move || {
            api.update_product(parent_id, update, expected)
        })
        .await
        {
            Ok(updated) => updated,
            Err(source) => {
                tracing::error!(
                    "Parent {} could not be activated after {} variations went live: {}",
                    parent_id,
                    activated.len(),
                    source
                );
                return Err(ActivationError::ParentFailed {
                    run_id,
                    activated,
                    observed,
                    source,
                    log,
                });
            }
        };
        log.record(CompensationEntry::ParentActivated { product: parent_id });
        tracing::info!("Activated parent {} with {} variations", parent_id, activated.len());

        let notification_warning = if self.config.notify_on_activation {
            self.notify(&updated, variation_count).await
        } else {
            None
        };

        Ok(ActivationReport {
            run_id,
            activated,
            parent: updated,
            notification_warning,
            log,
        })
    }

    async fn current_version(&self, id: ProductId) -> Option<u64> {
        let api = &self.api;
        match with_retry(&self.config.retry, "reload variant", move || api.get_product(id)).await {
            Ok(record) => record.version,
            Err(e) => {
                tracing::warn!("Could not reload {} after a version conflict: {}", id, e);
                None
            }
        }
    }

    /// Best effort: a failure becomes a warning on the report.
    async fn notify(&self, parent: &ProductSnapshot, variation_count: usize) -> Option<String> {
        let email = EmailRequest::new_product(parent, variation_count);
        let email = &email;
        let api = &self.api;
        match with_retry(&self.config.retry, "queue notification", move || {
            api.queue_email(email)
        })
        .await
        {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("New product notification was not queued: {}", e);
                Some(format!("Notification was not sent: {e}"))
            }
        }
    }
}
