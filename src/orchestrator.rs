use crate::merge::MergeEngine;
use crate::persist;
use crate::types::Result;
use std::path::Path;
use tracing::{debug, info, warn};

/// Filename of the processed-artifact manifest inside the artifact directory.
pub const PROCESSED_MANIFEST: &str = "processed_files.txt";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Artifacts merged and recorded in the manifest during this run.
    pub merged: usize,
    /// Awards appended to the master dataset during this run.
    pub appended: usize,
    /// Artifacts whose merge failed; retried wholesale on the next run.
    pub failed: usize,
    /// Artifacts the manifest had already recorded.
    pub skipped: usize,
}

/// Walks the artifact directory and merges everything the manifest has not
/// recorded yet. One bad artifact never aborts the batch.
pub struct BatchOrchestrator<'a> {
    engine: &'a MergeEngine,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(engine: &'a MergeEngine) -> Self {
        Self { engine }
    }

    pub async fn run(&self, artifact_dir: &Path, master_path: &Path) -> Result<BatchSummary> {
        let manifest_path = artifact_dir.join(PROCESSED_MANIFEST);
        let processed = persist::load_manifest(&manifest_path)?;

        let master_name = master_path.file_name().map(|name| name.to_os_string());

        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(artifact_dir)? {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if master_name.as_deref() == path.file_name() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                filenames.push(name.to_string());
            }
        }
        filenames.sort();

        let mut summary = BatchSummary::default();
        for filename in filenames {
            if processed.contains(&filename) {
                debug!("{} already merged, skipping", filename);
                summary.skipped += 1;
                continue;
            }

            let artifact_path = artifact_dir.join(&filename);
            let outcome = match self.engine.merge_artifact(&artifact_path, master_path).await {
                // Record the success before touching the next artifact so a
                // later failure cannot lose it.
                Ok(report) => persist::append_manifest(&manifest_path, &filename).map(|_| report),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(report) => {
                    summary.merged += 1;
                    summary.appended += report.appended;
                }
                Err(e) => {
                    warn!("Failed to merge {}: {}", filename, e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Batch complete: {} merged ({} award(s) appended), {} failed, {} already processed",
            summary.merged, summary.appended, summary.failed, summary.skipped
        );
        Ok(summary)
    }
}
