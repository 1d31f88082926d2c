use crate::extraction::AwardExtractor;
use crate::persist;
use crate::types::{Result, StructuredAward};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Boilerplate phrases that never reach the extraction service. Compared
/// case-insensitively against the whole paragraph, ignoring a leading `*`.
const NOISE_PHRASES: &[&str] = &["small business"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub appended: usize,
}

/// Merges one extraction artifact at a time into the master dataset,
/// appending only awards whose dedup key is not already present.
pub struct MergeEngine {
    extractor: Arc<dyn AwardExtractor>,
}

impl MergeEngine {
    pub fn new(extractor: Arc<dyn AwardExtractor>) -> Self {
        Self { extractor }
    }

    /// Merge one artifact. An extraction failure on any paragraph aborts the
    /// whole artifact, leaving the master untouched so the artifact can be
    /// retried wholesale on the next run.
    pub async fn merge_artifact(
        &self,
        artifact_path: &Path,
        master_path: &Path,
    ) -> Result<MergeReport> {
        let paragraphs = persist::load_artifact(artifact_path)?;
        let mut master = persist::load_master(master_path);

        let mut seen: HashSet<(String, String)> =
            master.iter().map(StructuredAward::dedup_key).collect();
        let mut pending = Vec::new();

        for paragraph in &paragraphs {
            let text = paragraph.text.trim();
            if text.is_empty() || is_noise(text) {
                debug!("Skipping noise paragraph: {:?}", text);
                continue;
            }

            let details = self.extractor.extract_award(text).await?;
            let award = StructuredAward::new(
                details,
                paragraph.contract_date.clone(),
                paragraph.text.clone(),
            );

            let key = award.dedup_key();
            if seen.contains(&key) {
                debug!("Award already present for key {:?}, discarding", key);
                continue;
            }
            seen.insert(key);
            pending.push(award);
        }

        let appended = pending.len();
        if appended > 0 {
            master.extend(pending);
            persist::save_master(master_path, &master)?;
        }

        info!(
            "Merged {}: {} new award(s)",
            artifact_path.display(),
            appended
        );
        Ok(MergeReport { appended })
    }
}

/// Exact match against a known boilerplate phrase, case-insensitive, with an
/// optional leading `*`.
fn is_noise(text: &str) -> bool {
    let stripped = text.strip_prefix('*').unwrap_or(text).trim();
    NOISE_PHRASES
        .iter()
        .any(|phrase| stripped.eq_ignore_ascii_case(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_matching_is_exact_and_case_insensitive() {
        assert!(is_noise("small business"));
        assert!(is_noise("SMALL BUSINESS"));
        assert!(is_noise("*Small Business"));
        assert!(is_noise("* small business"));

        assert!(!is_noise("small business set-aside awarded to Acme"));
        assert!(!is_noise("smallbusiness"));
    }
}
