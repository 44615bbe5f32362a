//! Archive file-naming convention
//!
//! The archive's URL layout and per-date file names are versioned by the
//! provider, not by this crate, so they are injected as configuration rather
//! than hardcoded into the fetch logic. A convention change only touches this
//! module's defaults (or the `--base-url` flag), never the resolution, retry,
//! or breaker code.

use crate::ArchiveIndex;

const SGX_BASE_URL: &str = "https://links.sgx.com/1.0.0/derivatives-historical";

/// The four file names published per trading date.
const SGX_FILE_NAMES: [&str; 4] = [
    "WEBPXTICK_DT.zip",
    "TickData_structure.dat",
    "TC.txt",
    "TC_structure.dat",
];

/// URL layout and file names for one version of the archive convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConvention {
    /// Base URL up to (excluding) the index path segment
    pub base_url: String,
    /// File names published under each index
    pub file_names: Vec<String>,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            base_url: SGX_BASE_URL.to_string(),
            file_names: SGX_FILE_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NamingConvention {
    /// Replace the base URL, keeping the default file names.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the download URL for one file under an archive index.
    /// URL pattern: `{base_url}/{index}/{file_name}`
    pub fn url(&self, index: ArchiveIndex, file_name: &str) -> String {
        format!("{}/{}/{}", self.base_url, index, file_name)
    }

    /// Whether a file's name carries a date marker to validate against.
    ///
    /// The structure descriptor files are named without a date, so only the
    /// tick-data and contract files participate in date-mismatch detection.
    pub fn has_date_marker(&self, file_name: &str) -> bool {
        !file_name.contains("structure")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_convention_has_four_files() {
        let convention = NamingConvention::default();
        assert_eq!(convention.file_names.len(), 4);
    }

    #[test]
    fn test_url_pattern() {
        let convention = NamingConvention::default();
        assert_eq!(
            convention.url(ArchiveIndex(5849), "TC.txt"),
            "https://links.sgx.com/1.0.0/derivatives-historical/5849/TC.txt"
        );
    }

    #[test]
    fn test_base_url_override() {
        let convention = NamingConvention::default().with_base_url("http://localhost:8080/archive");
        assert_eq!(
            convention.url(ArchiveIndex(7), "TC.txt"),
            "http://localhost:8080/archive/7/TC.txt"
        );
    }

    #[test]
    fn test_structure_files_have_no_date_marker() {
        let convention = NamingConvention::default();
        assert!(convention.has_date_marker("WEBPXTICK_DT.zip"));
        assert!(convention.has_date_marker("TC.txt"));
        assert!(!convention.has_date_marker("TickData_structure.dat"));
        assert!(!convention.has_date_marker("TC_structure.dat"));
    }
}
