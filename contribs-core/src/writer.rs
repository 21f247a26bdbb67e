//! JSON emission
//!
//! One file per accepted contribution in the output directory, named after
//! the record's display name with characters unsafe for filenames removed.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::record::FormattedRecord;

/// Characters never allowed in output filenames.
const FILENAME_BLACKLIST: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '\0'];

/// Derive a filename stem from a record's display name: blacklisted and
/// non-printable characters are stripped, spaces become underscores.
pub fn sanitize_filename(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !FILENAME_BLACKLIST.contains(c))
        .filter(|c| *c as u32 > 31)
        .map(|c| if c == ' ' { '_' } else { c })
        .collect()
}

/// Writes formatted records into the output directory.
pub struct RecordWriter {
    out_dir: PathBuf,
}

impl RecordWriter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    /// Delete and recreate the output directory. Not atomic: a crash between
    /// the two steps leaves an empty or partial directory.
    pub fn reset_output_dir(&self) -> Result<()> {
        if self.out_dir.is_dir() {
            std::fs::remove_dir_all(&self.out_dir).with_context(|| {
                format!("Failed to remove output dir: {}", self.out_dir.display())
            })?;
        }
        std::fs::create_dir_all(&self.out_dir).with_context(|| {
            format!("Failed to create output dir: {}", self.out_dir.display())
        })?;
        Ok(())
    }

    /// Serialize one record as 2-space-indented JSON, overwriting any
    /// existing file of the same name. Returns the path written.
    pub fn write(&self, record: &FormattedRecord) -> Result<PathBuf> {
        let name = record.name().context("record has no name")?;
        let path = self.out_dir.join(format!("{}.json", sanitize_filename(name)));

        info!("export {} to {}", record.props().unwrap_or(""), path.display());

        let json = serde_json::to_string_pretty(record)
            .with_context(|| format!("Failed to serialize record '{name}'"))?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}
