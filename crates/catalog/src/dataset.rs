use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The bucket for datasets whose key has no (or an empty) top-level
/// path segment.
pub const UNSECTIONED: &str = "(unsectioned)";

/// A single cataloged dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    /// The key of the metadata object without its suffix. Unique
    /// within a load.
    pub id: String,

    pub title: String,
    pub description: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub creator: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_created: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub keywords: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub license: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,

    #[serde(default)]
    pub distribution: Vec<Distribution>,

    /// The first path segment of the metadata object's key.
    #[serde(default)]
    pub section: Option<String>,

    /// Whether the metadata could be parsed. Invalid datasets carry a
    /// placeholder title and the parse error as description.
    pub is_valid: bool,

    /// The last-modified time of the backing object, if known.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deduplication_info: Option<DeduplicationInfo>,
}

/// A download descriptor of a dataset (schema.org `DataDownload`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encoding_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// The outcome of a deduplication pass for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicationInfo {
    pub is_duplicate: bool,

    /// The size of the title group the dataset belonged to.
    pub duplicate_count: usize,

    /// The id of the surviving dataset, if this one is a duplicate.
    pub kept_instead_id: Option<String>,
}

impl DeduplicationInfo {
    /// The annotation of a dataset without any title collision.
    #[inline]
    pub fn unique() -> Self {
        Self {
            is_duplicate: false,
            duplicate_count: 1,
            kept_instead_id: None,
        }
    }
}

impl Dataset {
    /// Returns the section bucket the dataset is indexed into.
    #[inline]
    pub fn section_key(&self) -> &str {
        match self.section.as_deref() {
            Some(section) if !section.is_empty() => section,
            _ => UNSECTIONED,
        }
    }

    /// Returns `true` if a deduplication pass marked the dataset as a
    /// duplicate of another one.
    #[inline]
    pub fn is_duplicate(&self) -> bool {
        self.deduplication_info
            .as_ref()
            .map(|info| info.is_duplicate)
            .unwrap_or(false)
    }

    /// Returns the text used for substring search, lower-cased.
    pub(crate) fn search_text(&self) -> String {
        format!("{} {}", self.title, self.description).to_lowercase()
    }
}

/// Returns the section of an object key, which is its first path
/// segment. Keys without a `/` have no section.
pub fn section_of(key: &str) -> Option<String> {
    key.split_once('/')
        .map(|(head, _)| head)
        .filter(|head| !head.is_empty())
        .map(str::to_string)
}
