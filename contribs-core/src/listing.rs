//! Flat listing emission
//!
//! The predecessor output format: a single text file with one block per
//! accepted record — the `type` value on its own line, every field as
//! `key=value`, then a blank line. Written to a `.tmp` sibling and renamed
//! into place so a crash never leaves a truncated listing behind.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::builder::CatalogSet;

/// Write the flat listing of all accumulated records to `path`.
pub fn write_listing(set: &CatalogSet, path: &Path) -> Result<()> {
    let mut out = String::new();

    for (_, record) in set.iter() {
        out.push_str(record.get("type").unwrap_or(""));
        out.push('\n');
        for (key, value) in record.iter() {
            match value {
                Value::String(s) => out.push_str(&format!("{key}={s}\n")),
                other => out.push_str(&format!("{key}={other}\n")),
            }
        }
        out.push('\n');
    }

    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, out)
        .with_context(|| format!("Failed to write listing: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move listing into place: {}", path.display()))?;

    info!("export listing to {}", path.display());
    Ok(())
}
