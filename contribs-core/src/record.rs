//! Contribution records
//!
//! Records are insertion-ordered string→value maps rather than fixed structs:
//! descriptor attributes are free-form, and any key the pipeline does not
//! recognize must pass through to the emitted JSON unchanged, in a stable
//! order.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::descriptor::Descriptor;

/// Mode tag of the single package object emitted per record.
pub const MODE_JAVA: &str = "java";

/// Keys that move from the top level into the per-platform package object,
/// in that order.
const PACKAGE_KEYS: &[&str] = &["minRevision", "maxRevision", "props", "download"];

/// Keys superseded by the package structure, dropped on formatting.
const REMOVED_KEYS: &[&str] = &["version", "prettyVersion"];

/// The id-keyed accumulator for one contribution; mutable until written.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ContributionRecord {
    fields: Map<String, Value>,
}

impl ContributionRecord {
    /// Build a record from a parsed descriptor plus its contextual fields.
    /// The config-file category overwrites whatever the descriptor claimed.
    pub fn from_descriptor(
        descriptor: Descriptor,
        id: &str,
        software_type: &str,
        props_url: &str,
        category: &str,
    ) -> Self {
        let mut fields = descriptor.into_attrs();
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.insert("type".to_string(), Value::String(software_type.to_string()));
        fields.insert("props".to_string(), Value::String(props_url.to_string()));
        fields.insert("categories".to_string(), Value::String(category.to_string()));
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.fields
            .insert(key.to_string(), Value::String(value.to_string()));
    }

    /// True if `key` is present with a non-empty string value.
    pub fn has_value(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Append a category to the raw comma-joined categories string. The split
    /// into a list happens at formatting time.
    pub fn append_category(&mut self, category: &str) {
        let joined = match self.get("categories") {
            Some(existing) => format!("{existing},{category}"),
            None => category.to_string(),
        };
        self.set("categories", &joined);
    }

    /// Parsed `(minRevision, maxRevision)` bounds. Absent bounds read as `0`;
    /// a present but non-numeric bound is an error.
    pub fn revision_bounds(&self) -> Result<(i32, i32)> {
        Ok((
            self.revision_bound("minRevision")?,
            self.revision_bound("maxRevision")?,
        ))
    }

    fn revision_bound(&self, key: &str) -> Result<i32> {
        let value = self.get(key).unwrap_or("0");
        value
            .parse()
            .with_context(|| format!("invalid {key} '{value}'"))
    }

    /// Restructure into the emitted shape: `authors` becomes a one-element
    /// list, `categories` a list of trimmed names (or null when empty),
    /// platform and version fields move into a single `mode: "java"` package
    /// object, and the superseded top-level `version`/`prettyVersion` are
    /// dropped. Everything else passes through unchanged.
    pub fn into_formatted(self) -> FormattedRecord {
        let mut fields = self.fields;

        if let Some(author) = fields.get("authors").cloned() {
            fields.insert("authors".to_string(), Value::Array(vec![author]));
        }

        let categories = match fields.get("categories").and_then(Value::as_str) {
            Some(raw) if !raw.is_empty() => Value::Array(
                raw.split(',')
                    .map(|c| Value::String(c.trim().to_string()))
                    .collect(),
            ),
            _ => Value::Null,
        };
        fields.insert("categories".to_string(), categories);

        let mut package = Map::new();
        package.insert("mode".to_string(), Value::String(MODE_JAVA.to_string()));
        for key in PACKAGE_KEYS {
            // shift_remove keeps the remaining top-level keys in order.
            if let Some(value) = fields.shift_remove(*key) {
                package.insert((*key).to_string(), value);
            }
        }
        fields.insert(
            "packages".to_string(),
            Value::Array(vec![Value::Object(package)]),
        );

        for key in REMOVED_KEYS {
            fields.shift_remove(*key);
        }

        FormattedRecord { fields }
    }
}

/// The final on-disk shape; created once just before writing, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormattedRecord {
    fields: Map<String, Value>,
}

impl FormattedRecord {
    /// Display name; the required-key check ran before formatting, so this is
    /// absent only for hand-built records.
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// The `props` URL of the single package, when present.
    pub fn props(&self) -> Option<&str> {
        self.fields
            .get("packages")?
            .as_array()?
            .first()?
            .get("props")?
            .as_str()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
