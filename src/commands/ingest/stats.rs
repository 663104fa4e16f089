use std::path::Path;

use anyhow::Result;
use tracing::{error, warn};

use crate::error::IngestError;
use crate::model::{FailedFile, IngestCounts, SourceEntry};
use crate::util::sha256_file;

#[derive(Debug, Default)]
pub(crate) struct IngestStats {
    pub(crate) counts: IngestCounts,
    pub(crate) sources: Vec<SourceEntry>,
    pub(crate) failed_files: Vec<FailedFile>,
    pub(crate) warnings: Vec<String>,
}

impl IngestStats {
    /// Non-fatal content issue, logged and kept for the run manifest.
    pub(crate) fn warn(&mut self, origin: &str, issue: &IngestError) {
        warn!(origin = %origin, issue = %issue, "ingest warning");
        self.warnings.push(format!("{origin}: {issue}"));
    }

    pub(crate) fn skip_record(&mut self, origin: &str, issue: &IngestError) {
        error!(origin = %origin, issue = %issue, "skipping malformed record");
        self.warnings.push(format!("{origin}: {issue}"));
    }

    pub(crate) fn fail_file(&mut self, path: &Path, err: &anyhow::Error) {
        error!(path = %path.display(), error = %format!("{err:#}"), "file rolled back");
        self.failed_files.push(FailedFile {
            path: path.display().to_string(),
            reason: format!("{err:#}"),
        });
    }

    pub(crate) fn record_source(&mut self, path: &Path, role: &str) -> Result<()> {
        let sha256 = sha256_file(path)?;
        self.sources.push(SourceEntry {
            path: path.display().to_string(),
            role: role.to_string(),
            sha256,
        });
        Ok(())
    }
}
