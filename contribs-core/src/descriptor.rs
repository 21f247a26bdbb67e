//! Descriptor parsing
//!
//! A descriptor is the small `attr=value` text file describing one
//! contribution's metadata. Legacy attribute names are renamed by literal
//! substring replacement over the whole decoded text before parsing —
//! existing descriptor files depend on that exact behavior, so the rename is
//! deliberately not word-boundary aware.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::fetch::Transport;

/// Legacy name → canonical name, applied to the whole decoded text.
const RENAMES: &[(&str, &str)] = &[
    ("authorList", "authors"),
    ("category", "categories"),
    ("compatibleModesList", "modes"),
];

/// Why a fetched descriptor could not be turned into an attribute map.
/// Transport and decode failures produce distinct log lines, so callers need
/// to tell them apart.
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Network/transport failure, including non-success HTTP statuses.
    #[error(transparent)]
    Transport(anyhow::Error),

    /// The fetched bytes are not valid UTF-8.
    #[error("invalid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Flat attribute map parsed from one descriptor, in line order.
/// Repeated attributes keep the last value.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    attrs: Map<String, Value>,
}

impl Descriptor {
    /// Decode raw descriptor bytes as strict UTF-8 and parse them.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DescriptorError> {
        let text = String::from_utf8(bytes)?;
        Ok(Self::parse(&text))
    }

    /// Parse descriptor text: legacy renames, line-ending normalization,
    /// then line-by-line `attr=value` with `#` comments.
    pub fn parse(text: &str) -> Self {
        let mut text = text.to_string();
        for (from, to) in RENAMES {
            text = text.replace(from, to);
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");

        let mut attrs = Map::new();
        for line in text.split('\n') {
            let line = match line.find('#') {
                Some(hash) => &line[..hash],
                None => line,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(equals) = line.find('=') else {
                continue;
            };

            let attr = line[..equals].trim().to_string();
            let value = line[equals + 1..].trim().to_string();
            attrs.insert(attr, Value::String(value));
        }

        Self { attrs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Consume into the raw attribute map.
    pub fn into_attrs(self) -> Map<String, Value> {
        self.attrs
    }
}

/// Fetch a descriptor URL and parse its contents, classifying the failure
/// mode for the caller's log line.
pub async fn fetch_descriptor<T: Transport>(
    transport: &T,
    url: &str,
) -> Result<Descriptor, DescriptorError> {
    let bytes = transport
        .fetch(url)
        .await
        .map_err(DescriptorError::Transport)?;
    Descriptor::from_bytes(bytes)
}
