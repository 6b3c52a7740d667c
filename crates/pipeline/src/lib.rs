//! `storefront-pipeline`: the remote side of a variation session.
//!
//! - [`AxisStore`]: axis/value CRUD kept in step with the selection
//! - [`DraftOrchestrator`]: sequential, paced draft + link creation
//! - [`ActivationCommitter`]: draft activation, then the parent
//! - [`CompensationLog`]: every write, replayable in reverse
//! - [`VariationPipeline`]: the facade a dashboard drives

pub mod axis_store;
pub mod cancel;
pub mod committer;
pub mod compensation;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod retry;

pub use axis_store::AxisStore;
pub use cancel::CancelToken;
pub use committer::{ActivationCommitter, ActivationError, ActivationReport, DraftActivationFailure};
pub use compensation::{CompensationEntry, CompensationLog, CompensationReport, LoggedWrite};
pub use config::{PipelineConfig, RetryPolicy};
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{DraftBatch, DraftCreationError, DraftFailure, DraftOrchestrator};
pub use pipeline::VariationPipeline;
pub use retry::with_retry;
