//! Attempt-local outcomes for one pass through the scan pipeline.
//!
//! Conflicts stay distinct from final errors so the retry loop can decide
//! whether to reload the package or stop.

use crate::domain::Error;

pub(super) enum AttemptError {
    /// The package version moved between load and write.
    Conflict { expected: u32, actual: u32 },
    /// The scan failed for good; no retry helps.
    Failed(Error),
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        Self::Failed(value)
    }
}
