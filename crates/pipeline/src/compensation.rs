//! Record of successful remote writes, replayable in reverse to undo a run.
//!
//! Nothing is compensated automatically; callers decide when to call
//! [`CompensationLog::compensate`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_catalog::{CatalogApi, CatalogError, ProductUpdate};
use storefront_core::{ExpectedVersion, LinkId, ProductId};
use storefront_variations::ProductStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CompensationEntry {
    DraftCreated { product: ProductId, combination: String },
    LinkCreated { link: LinkId, product: ProductId },
    DraftActivated { product: ProductId },
    ParentActivated { product: ProductId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedWrite {
    pub at: DateTime<Utc>,
    pub entry: CompensationEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompensationLog {
    writes: Vec<LoggedWrite>,
}

/// Outcome of replaying a log in reverse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub undone: Vec<CompensationEntry>,
    /// Links removed together with their product.
    pub skipped: Vec<CompensationEntry>,
    pub failures: Vec<(CompensationEntry, CatalogError)>,
}

impl CompensationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl CompensationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: CompensationEntry) {
        self.writes.push(LoggedWrite {
            at: Utc::now(),
            entry,
        });
    }

    pub fn writes(&self) -> &[LoggedWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Append another run's writes after this log's.
    pub fn extend(&mut self, other: CompensationLog) {
        self.writes.extend(other.writes);
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    pub fn created_drafts(&self) -> Vec<ProductId> {
        self.writes
            .iter()
            .filter_map(|w| match w.entry {
                CompensationEntry::DraftCreated { product, .. } => Some(product),
                _ => None,
            })
            .collect()
    }

    pub fn activated_products(&self) -> Vec<ProductId> {
        self.writes
            .iter()
            .filter_map(|w| match w.entry {
                CompensationEntry::DraftActivated { product }
                | CompensationEntry::ParentActivated { product } => Some(product),
                _ => None,
            })
            .collect()
    }

    /// Undo every write, newest first: activations revert to draft, created
    /// drafts are deleted. Failures are reported and the replay continues.
    pub async fn compensate<C: CatalogApi + ?Sized>(&self, api: &C) -> CompensationReport {
        let mut report = CompensationReport::default();
        tracing::info!("Compensating {} logged writes", self.writes.len());

        for write in self.writes.iter().rev() {
            let entry = write.entry.clone();
            let result = match &entry {
                CompensationEntry::DraftActivated { product }
                | CompensationEntry::ParentActivated { product } => api
                    .update_product(
                        *product,
                        &ProductUpdate::status_only(ProductStatus::Draft),
                        ExpectedVersion::Any,
                    )
                    .await
                    .map(|_| ()),
                CompensationEntry::DraftCreated { product, .. } => api.delete_product(*product).await,
                CompensationEntry::LinkCreated { .. } => {
                    report.skipped.push(entry.clone());
                    continue;
                }
            };

            match result {
                Ok(()) => report.undone.push(entry),
                Err(e) => {
                    tracing::warn!("Compensation of {:?} failed: {}", entry, e);
                    report.failures.push((entry, e));
                }
            }
        }

        report
    }
}
