use thiserror::Error;

use storefront_catalog::CatalogError;
use storefront_core::DomainError;
use storefront_variations::{ValidationReport, WorkflowError};

use crate::committer::ActivationError;
use crate::orchestrator::DraftCreationError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Workflow(WorkflowError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("{0}")]
    Validation(ValidationReport),

    #[error(transparent)]
    DraftCreation(Box<DraftCreationError>),

    #[error(transparent)]
    Activation(Box<ActivationError>),

    #[error("run cancelled after {completed} completed writes")]
    Cancelled { completed: usize },
}

impl From<WorkflowError> for PipelineError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Domain(d) => PipelineError::Domain(d),
            WorkflowError::Validation(report) => PipelineError::Validation(report),
            other => PipelineError::Workflow(other),
        }
    }
}

impl From<DraftCreationError> for PipelineError {
    fn from(e: DraftCreationError) -> Self {
        if e.is_cancelled() {
            PipelineError::Cancelled {
                completed: e.created.len(),
            }
        } else {
            PipelineError::DraftCreation(Box::new(e))
        }
    }
}

impl From<ActivationError> for PipelineError {
    fn from(e: ActivationError) -> Self {
        match e {
            ActivationError::Cancelled { activated, .. } => PipelineError::Cancelled {
                completed: activated.len(),
            },
            other => PipelineError::Activation(Box::new(other)),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
