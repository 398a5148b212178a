//! Title-based deduplication of datasets.
//!
//! Datasets are grouped by their normalized title and exactly one
//! survivor is picked per group. The pass is pure: the input is never
//! touched, every dataset of the output is an annotated copy of the
//! corresponding input dataset.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DeduplicationInfo};
use crate::error::{CatalogError, CatalogResult};

/// The rule used to decide which datasets are duplicates of each
/// other.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    TitleBased,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TitleBased => write!(f, "title-based"),
        }
    }
}

impl FromStr for Strategy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title-based" => Ok(Self::TitleBased),
            _ => Err(CatalogError::config(format!(
                "unknown deduplication strategy '{s}' \
                (expected 'title-based')"
            ))),
        }
    }
}

/// Deduplication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DeduplicationConfig {
    /// Whether deduplication is active. If not, a pass does no
    /// grouping at all.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub strategy: Strategy,

    /// Keep the most recently modified dataset of a group. Otherwise
    /// the first dataset (in input order) is kept.
    #[serde(default = "default_keep_latest")]
    pub keep_latest: bool,

    /// Compare titles case-sensitively.
    #[serde(default)]
    pub case_sensitive: bool,
}

#[inline]
fn default_keep_latest() -> bool {
    true
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: Strategy::TitleBased,
            keep_latest: true,
            case_sensitive: false,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> CatalogResult<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(CatalogError::config(format!(
            "`{key}` expects a boolean (true or false), got '{value}'"
        ))),
    }
}

impl DeduplicationConfig {
    /// The names of all options accepted by [with_option].
    ///
    /// [with_option]: DeduplicationConfig::with_option
    pub const OPTIONS: &'static [&'static str] =
        &["enabled", "strategy", "keep-latest", "case-sensitive"];

    /// Returns a copy of the config with the option `key` set to the
    /// textual `value`.
    ///
    /// The config itself is never modified, so a rejected value
    /// leaves the caller with the last valid config.
    pub fn with_option(
        &self,
        key: &str,
        value: &str,
    ) -> CatalogResult<Self> {
        let mut config = self.clone();
        let value = value.trim();

        match key {
            "enabled" => config.enabled = parse_flag(key, value)?,
            "strategy" => config.strategy = value.parse()?,
            "keep-latest" => {
                config.keep_latest = parse_flag(key, value)?
            }
            "case-sensitive" => {
                config.case_sensitive = parse_flag(key, value)?
            }
            _ => {
                return Err(CatalogError::config(format!(
                    "unknown deduplication option `{key}`"
                )));
            }
        }

        Ok(config)
    }

    /// Returns the textual value of the option `key`.
    pub fn option(&self, key: &str) -> CatalogResult<String> {
        Ok(match key {
            "enabled" => self.enabled.to_string(),
            "strategy" => self.strategy.to_string(),
            "keep-latest" => self.keep_latest.to_string(),
            "case-sensitive" => self.case_sensitive.to_string(),
            _ => {
                return Err(CatalogError::config(format!(
                    "unknown deduplication option `{key}`"
                )));
            }
        })
    }
}

/// A dataset that was dropped from the active view in favour of
/// another one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedDuplicate {
    pub id: String,
    pub title: String,
    pub section: String,
    pub kept_instead_id: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// The result of a deduplication pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deduplication {
    /// All input datasets (same order and length), annotated.
    pub datasets: Vec<Dataset>,

    /// The number of title groups with more than one member.
    pub duplicates_found: usize,

    /// The number of datasets marked as duplicates.
    pub duplicates_removed: usize,

    /// The datasets marked as duplicates, in input order.
    pub removed: Vec<RemovedDuplicate>,
}

impl Deduplication {
    /// Returns the datasets which are not duplicates.
    pub fn survivors(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter().filter(|dataset| !dataset.is_duplicate())
    }
}

/// Normalizes a title for grouping: leading and trailing whitespace
/// is removed and, unless `case_sensitive` is set, the title is
/// lower-cased.
pub fn normalize_title(title: &str, case_sensitive: bool) -> String {
    let title = title.trim();
    if case_sensitive {
        title.to_string()
    } else {
        title.to_lowercase()
    }
}

/// A more aggressive normalization which drops punctuation and
/// collapses whitespace. It is not used for grouping.
pub fn normalize_for_comparison(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum GroupKey {
    Title(String),
    /// Datasets without a usable title never collide; they are keyed
    /// by their position in the input.
    Singleton(usize),
}

fn group_key(
    pos: usize,
    dataset: &Dataset,
    config: &DeduplicationConfig,
) -> GroupKey {
    if !dataset.is_valid {
        return GroupKey::Singleton(pos);
    }

    let title = normalize_title(&dataset.title, config.case_sensitive);
    if title.is_empty() {
        GroupKey::Singleton(pos)
    } else {
        GroupKey::Title(title)
    }
}

/// Newer datasets order first; equal (or both unknown) timestamps are
/// ordered by id, smallest first.
fn freshness(a: &Dataset, b: &Dataset) -> Ordering {
    b.last_modified
        .cmp(&a.last_modified)
        .then_with(|| a.id.cmp(&b.id))
}

fn select_survivor(
    datasets: &[Dataset],
    members: &[usize],
    keep_latest: bool,
) -> usize {
    if !keep_latest {
        return members[0];
    }

    members
        .iter()
        .copied()
        .min_by(|&a, &b| freshness(&datasets[a], &datasets[b]))
        .unwrap_or(members[0])
}

/// Runs a deduplication pass over `datasets`.
///
/// If deduplication is disabled, every dataset is annotated as unique
/// and no grouping is done.
pub fn deduplicate(
    datasets: &[Dataset],
    config: &DeduplicationConfig,
) -> Deduplication {
    if !config.enabled {
        let datasets = datasets
            .iter()
            .cloned()
            .map(|mut dataset| {
                dataset.deduplication_info =
                    Some(DeduplicationInfo::unique());
                dataset
            })
            .collect();

        return Deduplication {
            datasets,
            ..Default::default()
        };
    }

    let mut groups: HashMap<GroupKey, usize> = HashMap::new();
    let mut members: Vec<Vec<usize>> = vec![];

    for (pos, dataset) in datasets.iter().enumerate() {
        match groups.entry(group_key(pos, dataset, config)) {
            Entry::Occupied(entry) => members[*entry.get()].push(pos),
            Entry::Vacant(entry) => {
                entry.insert(members.len());
                members.push(vec![pos]);
            }
        }
    }

    let mut infos = vec![DeduplicationInfo::unique(); datasets.len()];
    let mut duplicates_found = 0;
    let mut duplicates_removed = 0;

    for group in members.iter().filter(|group| group.len() > 1) {
        let count = group.len();
        let survivor =
            select_survivor(datasets, group, config.keep_latest);
        let survivor_id = &datasets[survivor].id;

        duplicates_found += 1;
        duplicates_removed += count - 1;

        for &pos in group {
            infos[pos] = DeduplicationInfo {
                is_duplicate: pos != survivor,
                duplicate_count: count,
                kept_instead_id: if pos != survivor {
                    Some(survivor_id.clone())
                } else {
                    None
                },
            };
        }
    }

    let mut removed = Vec::with_capacity(duplicates_removed);
    let datasets = datasets
        .iter()
        .zip(infos)
        .map(|(dataset, info)| {
            if let Some(ref kept) = info.kept_instead_id {
                removed.push(RemovedDuplicate {
                    id: dataset.id.clone(),
                    title: dataset.title.clone(),
                    section: dataset.section_key().to_string(),
                    kept_instead_id: kept.clone(),
                    last_modified: dataset.last_modified,
                });
            }

            let mut dataset = dataset.clone();
            dataset.deduplication_info = Some(info);
            dataset
        })
        .collect();

    Deduplication {
        datasets,
        duplicates_found,
        duplicates_removed,
        removed,
    }
}
