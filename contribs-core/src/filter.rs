//! Compatibility filtering
//!
//! Records declare an inclusive `[minRevision, maxRevision]` platform
//! revision range, `0` meaning unbounded on that side. The run-wide window
//! works the same way. Broken/skipped id lists come from required files read
//! wholesale at startup.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::record::ContributionRecord;

/// Revision every id in the broken list is pinned to, regardless of what its
/// descriptor claims.
pub const BROKEN_MAX_REVISION: &str = "228";

/// Keys every record must carry before acceptance, in check order.
pub const REQUIRED_KEYS: &[&str] = &["name", "authors", "url", "categories", "sentence", "version"];

static DOWNLOAD_KEY: Lazy<Regex> = Lazy::new(|| Regex::new("^download").unwrap());

/// Run-wide revision window; `0` is unbounded on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionRange {
    pub min: i32,
    pub max: i32,
}

impl RevisionRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Whether a record's inclusive `[record_min, record_max]` range overlaps
    /// this window. `0` never excludes on its side.
    pub fn admits(&self, record_min: i32, record_max: i32) -> bool {
        (self.min == 0 || record_max == 0 || self.min <= record_max)
            && (self.max == 0 || record_min == 0 || self.max >= record_min)
    }
}

/// Broken and skipped contribution id lists. Both files are required
/// collaborators; a missing file fails the run loudly.
#[derive(Debug, Clone, Default)]
pub struct IdLists {
    broken: Vec<String>,
    skipped: Vec<String>,
}

impl IdLists {
    pub fn new(broken: Vec<String>, skipped: Vec<String>) -> Self {
        Self { broken, skipped }
    }

    /// Read both id files, one id per line.
    pub fn load(broken_path: &Path, skipped_path: &Path) -> Result<Self> {
        Ok(Self {
            broken: read_id_file(broken_path)?,
            skipped: read_id_file(skipped_path)?,
        })
    }

    /// Ids pinned to `maxRevision = "228"`.
    pub fn is_broken(&self, id: &str) -> bool {
        self.broken.iter().any(|b| b == id)
    }

    /// Ids excluded before any fetch is attempted.
    pub fn is_skipped(&self, id: &str) -> bool {
        self.skipped.iter().any(|s| s == id)
    }
}

fn read_id_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read id list: {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

/// The first required key the record is missing, if any.
pub fn missing_key(record: &ContributionRecord) -> Option<&'static str> {
    REQUIRED_KEYS
        .iter()
        .copied()
        .find(|key| record.get(key).is_none())
}

/// True if any record key matches `download*`.
pub fn has_download_key(record: &ContributionRecord) -> bool {
    record.keys().any(|key| DOWNLOAD_KEY.is_match(key))
}

/// Default download URL: the descriptor URL truncated at its last `.`, with
/// `.zip` appended. A dot-free URL is used whole.
pub fn derive_download_url(descriptor_url: &str) -> String {
    match descriptor_url.rfind('.') {
        Some(dot) => format!("{}.zip", &descriptor_url[..dot]),
        None => format!("{descriptor_url}.zip"),
    }
}

/// Fill default revision bounds. `minRevision` missing or empty becomes
/// `"0"`. Broken ids get `maxRevision = "228"` unconditionally; otherwise a
/// missing or empty `maxRevision` becomes `"0"`.
pub fn apply_revision_defaults(record: &mut ContributionRecord, broken: bool) {
    if !record.has_value("minRevision") {
        record.set("minRevision", "0");
    }

    if broken {
        record.set("maxRevision", BROKEN_MAX_REVISION);
    } else if !record.has_value("maxRevision") {
        record.set("maxRevision", "0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Descriptor;
    use pretty_assertions::assert_eq;

    fn record_with(text: &str) -> ContributionRecord {
        ContributionRecord::from_descriptor(
            Descriptor::parse(text),
            "001",
            "library",
            "http://x/lib.txt",
            "Sound",
        )
    }

    #[test]
    fn test_admits_inclusive_overlap() {
        let range = RevisionRange::new(228, 240);
        assert!(range.admits(228, 240));
        assert!(range.admits(100, 228)); // touches the lower bound
        assert!(range.admits(240, 300)); // touches the upper bound
        assert!(!range.admits(241, 300));
        assert!(!range.admits(100, 227));
    }

    #[test]
    fn test_zero_is_unbounded_on_both_sides() {
        assert!(RevisionRange::new(0, 0).admits(1, 2));
        assert!(RevisionRange::new(228, 0).admits(0, 0));
        assert!(RevisionRange::new(228, 0).admits(500, 0));
        // A record maxRevision of 0 never excludes against minrev.
        assert!(RevisionRange::new(228, 0).admits(1, 0));
        // A record minRevision of 0 never excludes against maxrev.
        assert!(RevisionRange::new(0, 228).admits(0, 100));
    }

    #[test]
    fn test_missing_key_reports_first_in_order() {
        let record = record_with("name=Foo\nurl=http://x\n");
        // authors comes before url/categories in the required order.
        assert_eq!(missing_key(&record), Some("authors"));

        let complete = record_with(
            "name=Foo\nauthors=J\nurl=http://x\nsentence=s\nversion=1\n",
        );
        assert_eq!(missing_key(&complete), None);
    }

    #[test]
    fn test_has_download_key_is_prefix_match() {
        let mut record = record_with("name=Foo\n");
        assert!(!has_download_key(&record));

        record.set("downloadUrl", "http://x/y.zip");
        assert!(has_download_key(&record));

        let mut other = record_with("name=Foo\n");
        other.set("nodownload", "1");
        assert!(!has_download_key(&other));
    }

    #[test]
    fn test_derive_download_url() {
        assert_eq!(
            derive_download_url("http://x/libs/soundlib1.txt"),
            "http://x/libs/soundlib1.zip"
        );
        assert_eq!(derive_download_url("http://x/nodot"), "http://x/nodot.zip");
    }

    #[test]
    fn test_defaults_fill_missing_bounds() {
        let mut record = record_with("name=Foo\n");
        apply_revision_defaults(&mut record, false);
        assert_eq!(record.get("minRevision"), Some("0"));
        assert_eq!(record.get("maxRevision"), Some("0"));
    }

    #[test]
    fn test_empty_bounds_are_treated_as_missing() {
        let mut record = record_with("name=Foo\nminRevision=\nmaxRevision=\n");
        apply_revision_defaults(&mut record, false);
        assert_eq!(record.get("minRevision"), Some("0"));
        assert_eq!(record.get("maxRevision"), Some("0"));
    }

    #[test]
    fn test_broken_pin_overrides_descriptor_value() {
        let mut record = record_with("name=Foo\nmaxRevision=500\n");
        apply_revision_defaults(&mut record, true);
        assert_eq!(record.get("maxRevision"), Some(BROKEN_MAX_REVISION));
    }

    #[test]
    fn test_id_lists_load() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.conf");
        let skipped = dir.path().join("skipped.conf");
        std::fs::write(&broken, "042\n077\n").unwrap();
        std::fs::write(&skipped, "099\n").unwrap();

        let lists = IdLists::load(&broken, &skipped).unwrap();
        assert!(lists.is_broken("042"));
        assert!(!lists.is_broken("099"));
        assert!(lists.is_skipped("099"));
        assert!(!lists.is_skipped("042"));
    }

    #[test]
    fn test_missing_id_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.conf");
        std::fs::write(&broken, "").unwrap();

        let result = IdLists::load(&broken, &dir.path().join("absent.conf"));
        assert!(result.is_err());
    }
}
