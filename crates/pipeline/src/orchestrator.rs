//! Sequential creation of draft variants and their variation links.
//!
//! One draft per combination, in input order. Each draft's links are written
//! right after the draft and before the next draft. The first failure stops
//! the run; everything already written stays and is listed in the returned
//! compensation log.

use thiserror::Error;
use tracing::Instrument;

use storefront_catalog::{CatalogApi, CatalogError, NewProduct, NewVariationLink};
use storefront_core::{ProductId, RunId};
use storefront_variations::{Combination, DraftSeed, ProductSnapshot, VariantDraft};

use crate::cancel::{CancelToken, pace};
use crate::compensation::{CompensationEntry, CompensationLog};
use crate::config::PipelineConfig;
use crate::retry::with_retry;

#[derive(Debug)]
pub struct DraftBatch {
    pub run_id: RunId,
    /// Created drafts, in combination order.
    pub drafts: Vec<VariantDraft>,
    pub log: CompensationLog,
}

#[derive(Debug, Error)]
pub enum DraftFailure {
    #[error("Failed to create draft for \"{combination}\": {source}")]
    Product {
        combination: String,
        source: CatalogError,
    },

    #[error("Failed to store variation data for \"{combination}\" ({axis}): {source}")]
    Link {
        combination: String,
        axis: String,
        product: ProductId,
        source: CatalogError,
    },

    #[error("Draft creation cancelled at \"{combination}\"")]
    Cancelled { combination: String },
}

impl DraftFailure {
    /// Display name of the combination being written when the run stopped.
    pub fn combination(&self) -> &str {
        match self {
            DraftFailure::Product { combination, .. }
            | DraftFailure::Link { combination, .. }
            | DraftFailure::Cancelled { combination } => combination,
        }
    }
}

/// An aborted run. `created` holds every draft persisted before the stop,
/// including one whose links were only partly written.
#[derive(Debug, Error)]
#[error("{failure} ({} of {requested} drafts created)", .created.len())]
pub struct DraftCreationError {
    pub run_id: RunId,
    pub failure: DraftFailure,
    pub created: Vec<VariantDraft>,
    pub requested: usize,
    pub log: CompensationLog,
}

impl DraftCreationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self.failure, DraftFailure::Cancelled { .. })
    }
}

pub struct DraftOrchestrator<C> {
    api: C,
    config: PipelineConfig,
}

impl<C: CatalogApi> DraftOrchestrator<C> {
    pub fn new(api: C, config: PipelineConfig) -> Self {
        Self { api, config }
    }

    pub async fn create_drafts(
        &self,
        parent: &ProductSnapshot,
        combinations: &[Combination],
        cancel: &CancelToken,
    ) -> Result<DraftBatch, DraftCreationError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("create_drafts", run_id = %run_id, parent = %parent.id);
        self.run(run_id, parent, combinations, cancel)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        run_id: RunId,
        parent: &ProductSnapshot,
        combinations: &[Combination],
        cancel: &CancelToken,
    ) -> Result<DraftBatch, DraftCreationError> {
        let api = &self.api;
        let retry = &self.config.retry;
        let mut created: Vec<VariantDraft> = Vec::with_capacity(combinations.len());
        let mut log = CompensationLog::new();

        tracing::info!("Creating {} draft variations", combinations.len());

        let abort = |failure: DraftFailure, created: Vec<VariantDraft>, log: CompensationLog| {
            tracing::error!("{}", failure);
            DraftCreationError {
                run_id,
                failure,
                created,
                requested: combinations.len(),
                log,
            }
        };

        for (index, combination) in combinations.iter().enumerate() {
            let seed = DraftSeed::for_combination(parent, combination, index);
            let name = seed.combination_name.clone();

            if !proceed(index, self.config.draft_pacing, cancel).await {
                return Err(abort(DraftFailure::Cancelled { combination: name }, created, log));
            }

            let payload = NewProduct::variant(parent, &seed);
            let payload = &payload;
            let record = match with_retry(retry, "create draft", move || api.create_product(payload)).await {
                Ok(record) => record,
                Err(source) => {
                    let failure = DraftFailure::Product {
                        combination: name,
                        source,
                    };
                    return Err(abort(failure, created, log));
                }
            };

            let product = record.id;
            log.record(CompensationEntry::DraftCreated {
                product,
                combination: name.clone(),
            });
            tracing::info!("Created draft {} ({})", record.name, product);
            created.push(VariantDraft::from_created(seed, record));

            for (n, part) in combination.parts().iter().enumerate() {
                if !proceed(n, self.config.link_pacing, cancel).await {
                    return Err(abort(DraftFailure::Cancelled { combination: name }, created, log));
                }

                let link = NewVariationLink {
                    product_id: product,
                    variation_type_id: part.axis_id,
                    variation_value_id: part.value_id,
                };
                let link = &link;
                match with_retry(retry, "create variation link", move || {
                    api.create_variation_link(link)
                })
                .await
                {
                    Ok(link_id) => {
                        tracing::debug!("Linked {} to {}={}", product, part.axis_name, part.value_name);
                        log.record(CompensationEntry::LinkCreated {
                            link: link_id,
                            product,
                        });
                    }
                    Err(source) => {
                        let failure = DraftFailure::Link {
                            combination: name,
                            axis: part.axis_name.clone(),
                            product,
                            source,
                        };
                        return Err(abort(failure, created, log));
                    }
                }
            }
        }

        tracing::info!("Created {} draft variations", created.len());
        Ok(DraftBatch {
            run_id,
            drafts: created,
            log,
        })
    }
}

/// The first step of a loop runs immediately; later steps wait out the pacing.
async fn proceed(step: usize, delay: std::time::Duration, cancel: &CancelToken) -> bool {
    if step == 0 {
        !cancel.is_cancelled()
    } else {
        pace(delay, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use storefront_catalog::{CatalogOp, InMemoryCatalog};
    use storefront_variations::{ProductStatus, SelectedAxis, VariationValue, generate};

    use crate::config::RetryPolicy;

    fn fixture() -> (Arc<InMemoryCatalog>, ProductSnapshot, Vec<Combination>) {
        let catalog = Arc::new(InMemoryCatalog::new());
        let parent = catalog
            .seed_product(ProductSnapshot::new(ProductId::new(100), "Tee").with_sku("TEE"))
            .unwrap();

        let color = catalog.seed_axis("Color").unwrap();
        let size = catalog.seed_axis("Size").unwrap();
        let values = |axis: &storefront_variations::VariationAxis, names: &[&str]| -> Vec<VariationValue> {
            names
                .iter()
                .map(|n| catalog.seed_value(axis.id, n).unwrap())
                .collect()
        };
        let axes = vec![
            SelectedAxis {
                values: values(&color, &["Black"]),
                axis: color,
            },
            SelectedAxis {
                values: values(&size, &["S", "L"]),
                axis: size,
            },
        ];
        let combinations = generate(&axes).into_vec();
        (catalog, parent, combinations)
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default().with_pacing(Duration::ZERO, Duration::ZERO)
    }

    #[tokio::test]
    async fn writes_each_draft_before_its_links() {
        let (catalog, parent, combinations) = fixture();
        let orchestrator = DraftOrchestrator::new(catalog.clone(), config());

        let batch = orchestrator
            .create_drafts(&parent, &combinations, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(batch.drafts.len(), 2);
        assert_eq!(batch.drafts[1].name, "Tee - Black × L");
        assert_eq!(batch.drafts[1].sku, "TEE-BLL");
        assert!(batch.drafts.iter().all(|d| d.status == ProductStatus::Draft));
        assert_eq!(batch.log.len(), 6);

        let ops: Vec<CatalogOp> = catalog
            .calls()
            .into_iter()
            .map(|c| c.op)
            .filter(|op| matches!(op, CatalogOp::CreateProduct | CatalogOp::CreateLink))
            .collect();
        assert_eq!(
            ops,
            vec![
                CatalogOp::CreateProduct,
                CatalogOp::CreateLink,
                CatalogOp::CreateLink,
                CatalogOp::CreateProduct,
                CatalogOp::CreateLink,
                CatalogOp::CreateLink,
            ]
        );
    }

    #[tokio::test]
    async fn link_failure_keeps_the_half_linked_draft() {
        let (catalog, parent, combinations) = fixture();
        catalog.fail_nth(
            CatalogOp::CreateLink,
            2,
            CatalogError::Api {
                status: 400,
                message: "bad value".into(),
            },
        );
        let orchestrator = DraftOrchestrator::new(catalog.clone(), config());

        let err = orchestrator
            .create_drafts(&parent, &combinations, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.failure, DraftFailure::Link { ref axis, .. } if axis == "Size"));
        assert_eq!(err.failure.combination(), "Black × S");
        assert_eq!(err.created.len(), 1);
        assert_eq!(err.requested, 2);
        assert_eq!(catalog.children_of(parent.id).len(), 1);
        assert_eq!(catalog.link_count(), 1);
        assert_eq!(catalog.call_count(CatalogOp::CreateProduct), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_when_configured() {
        let (catalog, parent, combinations) = fixture();
        catalog.fail_first(CatalogOp::CreateProduct, 2, CatalogError::Network("reset".into()));
        let config = config().with_retry(
            RetryPolicy::default()
                .with_max_retries(2)
                .with_initial_backoff(Duration::from_millis(1)),
        );

        let batch = DraftOrchestrator::new(catalog.clone(), config)
            .create_drafts(&parent, &combinations, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(batch.drafts.len(), 2);
        assert_eq!(catalog.call_count(CatalogOp::CreateProduct), 4);
    }

    #[tokio::test]
    async fn without_retries_a_transient_error_aborts() {
        let (catalog, parent, combinations) = fixture();
        catalog.fail_first(CatalogOp::CreateProduct, 1, CatalogError::Network("reset".into()));

        let err = DraftOrchestrator::new(catalog.clone(), config())
            .create_drafts(&parent, &combinations, &CancelToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.failure, DraftFailure::Product { .. }));
        assert!(err.created.is_empty());
        assert!(err.log.is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_pacing() {
        let (catalog, parent, combinations) = fixture();
        let config = PipelineConfig::default().with_pacing(Duration::from_secs(30), Duration::ZERO);
        let orchestrator = DraftOrchestrator::new(catalog.clone(), config);
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            orchestrator.create_drafts(&parent, &combinations, &cancel),
        )
        .await
        .expect("cancellation should interrupt the pacing wait")
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.failure.combination(), "Black × L");
        assert_eq!(err.created.len(), 1);
        assert_eq!(catalog.children_of(parent.id).len(), 1);
    }
}
