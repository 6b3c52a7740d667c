//! Optimistic concurrency expectations for remote record updates.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Version expectation attached to an update.
///
/// The catalog API stamps product records with a version. An update may pin
/// the version the client last observed so a competing session's write is
/// detected instead of silently clobbered.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Skip version checking.
    #[default]
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Pin to `observed` when the record reported a version, otherwise `Any`.
    pub fn from_observed(observed: Option<u64>) -> Self {
        observed.map_or(Self::Any, Self::Exact)
    }

    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}
