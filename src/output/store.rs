//! Filesystem unit store
//!
//! Writes each unit under a date-keyed directory:
//! `{root}/{date}/{date}_{file_name}`, e.g.
//! `downloads/2025-01-09/2025-01-09_TC.txt`.
//!
//! Files are staged in a sibling directory and renamed into place once the
//! whole unit is on disk, so a failure mid-write leaves any previously
//! persisted unit for the same date untouched.

use crate::output::{OutputError, OutputResult, UnitStore};
use crate::FileUnit;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Date-keyed filesystem store for validated file units.
pub struct FsUnitStore {
    root: PathBuf,
}

impl FsUnitStore {
    /// Create a store rooted at `root` (created on first persist).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory a unit for `date` is served from.
    fn unit_dir(&self, unit: &FileUnit) -> PathBuf {
        self.root.join(unit.date.to_string())
    }

    /// Staging directory a unit for `date` is written into first.
    fn staging_dir(&self, unit: &FileUnit) -> PathBuf {
        self.root.join(format!(".{}.partial", unit.date))
    }
}

impl UnitStore for FsUnitStore {
    fn persist(&self, unit: &FileUnit) -> OutputResult<()> {
        let staging = self.staging_dir(unit);
        if staging.exists() {
            // Leftover from an interrupted earlier run
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let result: Result<(), std::io::Error> = unit.files.iter().try_for_each(|file| {
            let path = staging.join(format!("{}_{}", unit.date, file.name));
            fs::write(&path, &file.contents)?;
            debug!("wrote {}", path.display());
            Ok(())
        });

        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(
                    "failed to clean up staged unit at {}: {cleanup}",
                    staging.display()
                );
            }
            return Err(OutputError::Io(e));
        }

        // The unit is complete on disk; swap it in for any earlier version
        let dir = self.unit_dir(unit);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::rename(&staging, &dir)?;
        Ok(())
    }
}
