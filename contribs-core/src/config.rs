//! Sources config parsing
//!
//! The sources config lists descriptor URLs grouped by category:
//!
//! ```text
//! # A comment. Everything after the hash is ignored
//! [Library : Sound] # Type of software : category name
//! 043 \ http://example.com/libs/soundlib1.txt
//! 074 \ http://example.org/libs/soundlib2.txt
//!
//! [Library : Vision]
//! 012 \ http://example.net/libs/visionlib.txt
//! ```
//!
//! Malformed lines are logged and skipped; parsing never aborts the run.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// One contribution reference from the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Software type from the section header, lower-cased with internal
    /// whitespace removed (e.g. `library`, `mode`).
    pub software_type: String,

    /// Stable contribution id.
    pub id: String,

    /// URL of the descriptor text file.
    pub url: String,
}

/// A category and its contribution references, in file order.
#[derive(Debug, Clone)]
pub struct CategoryEntries {
    /// Category name exactly as written in the header (trimmed).
    pub category: String,

    /// References listed under this category, possibly across several
    /// `[type : category]` sections.
    pub entries: Vec<ConfigEntry>,
}

/// Parsed sources config: categories in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SourcesConfig {
    categories: Vec<CategoryEntries>,
}

impl SourcesConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parse config text line by line.
    pub fn parse(content: &str) -> Self {
        let mut config = SourcesConfig::default();
        // Context opened by the most recent valid [type : category] header.
        let mut context: Option<(String, String)> = None;

        for line in content.lines() {
            let line = match line.find('#') {
                Some(hash) => &line[..hash],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                // A malformed header resets the context; entry lines that
                // follow are ignored until the next valid header.
                context = parse_header(&line[1..line.len() - 1]);
                continue;
            }

            let Some((software_type, category)) = &context else {
                warn!("Ignoring contribution without type or category");
                continue;
            };

            let parts: Vec<&str> = line.split('\\').collect();
            if parts.len() != 2 {
                warn!(
                    "Lines for contributions must be of the form \
                     \"[Contribution ID] \\ [Contribution URL]\": {parts:?}"
                );
                continue;
            }

            config.push(
                category,
                ConfigEntry {
                    software_type: software_type.clone(),
                    id: parts[0].trim().to_string(),
                    url: parts[1].trim().to_string(),
                },
            );
        }

        config
    }

    fn push(&mut self, category: &str, entry: ConfigEntry) {
        match self.categories.iter_mut().find(|c| c.category == category) {
            Some(existing) => existing.entries.push(entry),
            None => self.categories.push(CategoryEntries {
                category: category.to_string(),
                entries: vec![entry],
            }),
        }
    }

    /// Categories in first-seen order.
    pub fn categories(&self) -> &[CategoryEntries] {
        &self.categories
    }

    /// Total number of contribution references across all categories.
    pub fn entry_count(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Parse the interior of a `[type : category]` header. Exactly one `:` split
/// point is required; anything else yields no context.
fn parse_header(interior: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = interior.split(':').collect();
    if parts.len() != 2 {
        return None;
    }

    let software_type = parts[0].split_whitespace().collect::<String>().to_lowercase();
    let category = parts[1].trim().to_string();
    Some((software_type, category))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_basic_config() {
        let config = SourcesConfig::parse(
            "[Library : Sound]\n\
             043 \\ http://example.com/libs/soundlib1.txt\n\
             074 \\ http://example.org/libs/soundlib2.txt\n\
             \n\
             [Library : Vision]\n\
             012 \\ http://example.net/libs/visionlib.txt\n",
        );

        assert_eq!(config.categories().len(), 2);
        assert_eq!(config.entry_count(), 3);

        let sound = &config.categories()[0];
        assert_eq!(sound.category, "Sound");
        assert_eq!(
            sound.entries[0],
            ConfigEntry {
                software_type: "library".to_string(),
                id: "043".to_string(),
                url: "http://example.com/libs/soundlib1.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_comments_are_never_content() {
        let config = SourcesConfig::parse(
            "# [Library : Ghost]\n\
             [Library : Sound] # trailing note\n\
             043 \\ http://example.com/a.txt # inline comment\n\
             # 999 \\ http://example.com/ignored.txt\n",
        );

        assert_eq!(config.categories().len(), 1);
        let sound = &config.categories()[0];
        assert_eq!(sound.category, "Sound");
        assert_eq!(sound.entries.len(), 1);
        assert_eq!(sound.entries[0].url, "http://example.com/a.txt");
    }

    #[test]
    fn test_software_type_is_normalized() {
        let config = SourcesConfig::parse(
            "[ Pde  Mode : Modes]\n\
             001 \\ http://example.com/m.txt\n",
        );
        assert_eq!(config.categories()[0].entries[0].software_type, "pdemode");
    }

    #[test]
    fn test_entry_before_header_is_ignored() {
        let config = SourcesConfig::parse(
            "043 \\ http://example.com/a.txt\n\
             [Library : Sound]\n\
             044 \\ http://example.com/b.txt\n",
        );
        assert_eq!(config.entry_count(), 1);
        assert_eq!(config.categories()[0].entries[0].id, "044");
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let config = SourcesConfig::parse(
            "[Library : Sound]\n\
             no separator here\n\
             too \\ many \\ parts\n\
             045 \\ http://example.com/ok.txt\n",
        );
        assert_eq!(config.entry_count(), 1);
        assert_eq!(config.categories()[0].entries[0].id, "045");
    }

    #[test]
    fn test_malformed_header_resets_context() {
        let config = SourcesConfig::parse(
            "[Library : Sound]\n\
             043 \\ http://example.com/a.txt\n\
             [Library : Too : Many]\n\
             044 \\ http://example.com/b.txt\n",
        );
        // 044 falls after a bad header, so it has no category.
        assert_eq!(config.entry_count(), 1);
        assert_eq!(config.categories()[0].entries[0].id, "043");
    }

    #[test]
    fn test_repeated_category_appends() {
        let config = SourcesConfig::parse(
            "[Library : Sound]\n\
             043 \\ http://example.com/a.txt\n\
             [Library : Vision]\n\
             012 \\ http://example.net/v.txt\n\
             [Library : Sound]\n\
             074 \\ http://example.org/b.txt\n",
        );

        assert_eq!(config.categories().len(), 2);
        let sound = &config.categories()[0];
        assert_eq!(sound.entries.len(), 2);
        assert_eq!(sound.entries[1].id, "074");
    }

    #[test]
    fn test_empty_config() {
        let config = SourcesConfig::parse("# nothing but comments\n\n");
        assert!(config.is_empty());
        assert_eq!(config.entry_count(), 0);
    }
}
