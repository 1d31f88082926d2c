use crate::types::{ExtractedParagraph, Result, StructuredAward};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use tracing::warn;

/// Serialize `value` to a sibling temp file and rename it into place, so a
/// crash mid-write never leaves a truncated document behind.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Load one extraction artifact. Unreadable artifacts are hard errors here;
/// the orchestrator is the isolation boundary.
pub fn load_artifact(path: &Path) -> Result<Vec<ExtractedParagraph>> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Load the master dataset. A missing file is an empty dataset; so is an
/// unparsable one, with a warning. Every rewrite keeps a `.bak` of the
/// previous document, so a degraded load is recoverable by hand.
pub fn load_master(path: &Path) -> Vec<StructuredAward> {
    if !path.exists() {
        return Vec::new();
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Master dataset {} is unreadable ({}), continuing from empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        },
        Err(e) => {
            warn!(
                "Master dataset {} could not be read ({}), continuing from empty",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

/// Rewrite the master dataset, keeping a backup of the previous version.
pub fn save_master(path: &Path, records: &[StructuredAward]) -> Result<()> {
    if path.exists() {
        fs::copy(path, path.with_extension("bak"))?;
    }
    write_json_atomic(path, &records)
}

/// Load the manifest of artifact filenames already merged. A missing file is
/// an empty set.
pub fn load_manifest(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }

    let file = File::open(path)?;
    let mut entries = HashSet::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            entries.insert(trimmed.to_string());
        }
    }
    Ok(entries)
}

/// Record one successful merge. Append-only, one line per artifact; the
/// manifest is never rewritten or pruned.
pub fn append_manifest(path: &Path, filename: &str) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", filename)?;
    Ok(())
}
