//! File unit persistence
//!
//! A validated [`FileUnit`] is handed to a [`UnitStore`] as one atomic group;
//! nothing is persisted for a date whose unit failed. The trait seam lets the
//! pipeline run against an in-memory store in tests.

use crate::FileUnit;

pub mod store;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// Filesystem write failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives one validated file unit per successful date.
pub trait UnitStore: Send + Sync {
    /// Persist the complete unit under its date.
    ///
    /// Implementations must not leave a partially written unit behind on
    /// failure.
    fn persist(&self, unit: &FileUnit) -> OutputResult<()>;
}

impl<'a, T: UnitStore + ?Sized> UnitStore for &'a T {
    fn persist(&self, unit: &FileUnit) -> OutputResult<()> {
        (**self).persist(unit)
    }
}
