//! `storefront-core`: shared building blocks for the variation pipeline.
//!
//! This crate contains **pure** primitives (no IO): identifiers, the domain
//! error model, and optimistic concurrency expectations.

pub mod concurrency;
pub mod error;
pub mod id;

pub use concurrency::ExpectedVersion;
pub use error::{DomainError, DomainResult};
pub use id::{AxisId, LinkId, ProductId, RunId, ValueId};
