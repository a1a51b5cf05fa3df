/// Catalog entry, the value stored in each LWW register.
///
/// An `Entry` is immutable once built: an update replaces the whole record,
/// never a single field. Optional fields are empty strings, never absent.
use serde::{Deserialize, Serialize};

/// Delimiter used by [`Entry::summary`].
pub const SUMMARY_DELIMITER: char = '|';

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry {
    /// Logical key, unique within a map.
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    /// Opaque resource locator.
    pub magnet: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "addedBy")]
    pub added_by: String,
    #[serde(default)]
    pub preview: String,
    /// Logical write time. The LWW version marker.
    pub timestamp: i64,
}

impl Entry {
    /// Build an entry with the required fields; optional fields start empty.
    pub fn new(source_url: impl Into<String>, magnet: impl Into<String>, timestamp: i64) -> Self {
        Entry {
            source_url: source_url.into(),
            magnet: magnet.into(),
            title: String::new(),
            added_by: String::new(),
            preview: String::new(),
            timestamp,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_added_by(mut self, added_by: impl Into<String>) -> Self {
        self.added_by = added_by.into();
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    /// The map key.
    pub fn key(&self) -> &str {
        &self.source_url
    }

    /// `sourceURL|magnet|title|addedBy|timestamp`. The preview is left out.
    pub fn summary(&self) -> String {
        let d = SUMMARY_DELIMITER;
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}",
            self.source_url, self.magnet, self.title, self.added_by, self.timestamp
        )
    }

    /// Copy without the preview, for gossiping metadata while the preview
    /// travels on a side channel.
    pub fn metadata_only(&self) -> Entry {
        Entry {
            preview: String::new(),
            ..self.clone()
        }
    }

    /// Does this entry win over `current` under LWW? Ties keep `current`.
    pub fn supersedes(&self, current: &Entry) -> bool {
        self.timestamp > current.timestamp
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
