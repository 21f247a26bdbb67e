//! Batch driver
//!
//! Walks the parsed config in order, fetches each descriptor sequentially,
//! and accumulates accepted records keyed by contribution id. A failing
//! contribution is logged and skipped; the batch always runs to completion
//! and writes out everything that did succeed.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use crate::config::{ConfigEntry, SourcesConfig};
use crate::descriptor::{self, DescriptorError};
use crate::fetch::Transport;
use crate::filter::{self, IdLists, RevisionRange};
use crate::record::ContributionRecord;
use crate::writer::RecordWriter;

/// Insertion-ordered id-keyed accumulation table. Exactly one record per
/// distinct contribution id across a run; when an id appears under several
/// categories, the first accepted record survives and only its categories
/// string grows.
#[derive(Debug, Default)]
pub struct CatalogSet {
    records: Vec<(String, ContributionRecord)>,
}

impl CatalogSet {
    pub fn get(&self, id: &str) -> Option<&ContributionRecord> {
        self.records
            .iter()
            .find(|(rid, _)| rid == id)
            .map(|(_, record)| record)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ContributionRecord> {
        self.records
            .iter_mut()
            .find(|(rid, _)| rid == id)
            .map(|(_, record)| record)
    }

    pub fn insert(&mut self, id: String, record: ContributionRecord) {
        self.records.push((id, record));
    }

    /// Records in acceptance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContributionRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Coordinates the fetch → vet → filter → accumulate pipeline and the final
/// write-out.
pub struct CatalogBuilder<T> {
    transport: T,
    range: RevisionRange,
    ids: IdLists,
}

impl<T: Transport> CatalogBuilder<T> {
    pub fn new(transport: T, range: RevisionRange, ids: IdLists) -> Self {
        Self {
            transport,
            range,
            ids,
        }
    }

    /// The transport this builder fetches with.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every configured contribution, strictly in config order, and
    /// accumulate the accepted ones. Never fails: every per-contribution
    /// problem is logged and skipped.
    pub async fn collect(&self, config: &SourcesConfig) -> CatalogSet {
        let mut set = CatalogSet::default();

        for category in config.categories() {
            for entry in &category.entries {
                if self.ids.is_skipped(&entry.id) {
                    info!("Skipping {}", entry.id);
                    continue;
                }

                let Some(record) = self.fetch_one(entry, &category.category).await else {
                    continue;
                };

                match set.get_mut(&entry.id) {
                    // Seen under a prior category: keep the existing record,
                    // only its categories string grows.
                    Some(existing) => existing.append_category(&category.category),
                    None => set.insert(entry.id.clone(), record),
                }
            }
        }

        set
    }

    /// Fetch, parse, and vet one contribution. Returns `None` when the
    /// contribution is rejected for any reason.
    async fn fetch_one(&self, entry: &ConfigEntry, category: &str) -> Option<ContributionRecord> {
        info!("Opening {}", entry.url);

        let descriptor = match descriptor::fetch_descriptor(&self.transport, &entry.url).await {
            Ok(descriptor) => descriptor,
            Err(DescriptorError::Transport(e)) => {
                warn!("Error reading {}", entry.url);
                warn!("{e:#}");
                return None;
            }
            Err(e @ DescriptorError::Decode(_)) => {
                warn!("Error decoding {}", entry.url);
                warn!("{e}");
                return None;
            }
        };

        let mut record = ContributionRecord::from_descriptor(
            descriptor,
            &entry.id,
            &entry.software_type,
            &entry.url,
            category,
        );

        filter::apply_revision_defaults(&mut record, self.ids.is_broken(&entry.id));

        if let Some(key) = filter::missing_key(&record) {
            warn!("Error reading {}", entry.url);
            warn!("  No value for '{key}'. Maybe it's a 404 page");
            return None;
        }

        if !filter::has_download_key(&record) {
            record.set("download", &filter::derive_download_url(&entry.url));
        }

        let (record_min, record_max) = match record.revision_bounds() {
            Ok(bounds) => bounds,
            Err(e) => {
                warn!("Error reading {}", entry.url);
                warn!("  {e:#}");
                return None;
            }
        };

        // Out-of-range records are dropped without a log line.
        self.range.admits(record_min, record_max).then_some(record)
    }

    /// Recreate the output directory and write every accumulated record as an
    /// indented JSON file.
    pub fn write_all(&self, set: &CatalogSet, out_dir: &Path) -> Result<()> {
        let writer = RecordWriter::new(out_dir.to_path_buf());
        writer.reset_output_dir()?;

        for (_, record) in set.iter() {
            writer.write(&record.clone().into_formatted())?;
        }

        Ok(())
    }
}
