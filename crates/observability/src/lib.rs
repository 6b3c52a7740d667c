//! Tracing/logging setup shared by every process embedding the pipeline.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::ObservabilityConfig;

/// Initialize process-wide tracing with the given configuration.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &ObservabilityConfig) {
    crate::tracing::init(config);
}

/// Initialize tracing with defaults (`info`, human-readable output).
pub fn init_default() {
    crate::tracing::init(&ObservabilityConfig::default());
}
