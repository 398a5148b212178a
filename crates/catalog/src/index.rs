use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::dedup::{deduplicate, DeduplicationConfig, RemovedDuplicate};

/// Datasets partitioned by section.
pub type Sections = BTreeMap<String, Vec<Dataset>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    /// Nothing has been loaded yet.
    #[default]
    Empty,

    /// The active view holds all loaded datasets.
    Loaded,

    /// The active view holds the survivors of a deduplication pass.
    Deduplicated,
}

/// A snapshot of the last deduplication pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeduplicationMetadata {
    pub enabled: bool,
    pub duplicates_found: usize,
    pub duplicates_removed: usize,
    pub last_deduplication_time: Option<DateTime<Utc>>,
    pub removed_duplicates: Vec<RemovedDuplicate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub sections: Sections,
    pub total_results: usize,
}

/// The catalog of one load.
///
/// The index keeps the loaded datasets untouched and derives the
/// active view from them, so that switching deduplication on and off
/// never requires another load.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    originals: Vec<Dataset>,
    positions: HashMap<String, usize>,
    search_text: HashMap<String, String>,
    sections: Sections,
    metadata: DeduplicationMetadata,
    duplicates: HashMap<String, usize>,
    config: DeduplicationConfig,
    applied: Option<DeduplicationConfig>,
    state: IndexState,
}

fn partition<I>(datasets: I) -> Sections
where
    I: IntoIterator<Item = Dataset>,
{
    let mut sections = Sections::new();
    for dataset in datasets {
        sections
            .entry(dataset.section_key().to_string())
            .or_default()
            .push(dataset);
    }

    sections
}

impl CatalogIndex {
    pub fn new(config: DeduplicationConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Replaces the whole catalog with `datasets`.
    ///
    /// The active view afterwards holds every dataset, regardless of
    /// the current config; call [apply] to bring the view in line
    /// with it. If two datasets share an id, the later one replaces
    /// the earlier one (at the earlier position).
    ///
    /// [apply]: CatalogIndex::apply
    pub fn load<I>(&mut self, datasets: I)
    where
        I: IntoIterator<Item = Dataset>,
    {
        let mut originals: Vec<Dataset> = vec![];
        let mut positions: HashMap<String, usize> = HashMap::new();

        for mut dataset in datasets {
            dataset.deduplication_info = None;

            if let Some(&pos) = positions.get(&dataset.id) {
                log::warn!(
                    "duplicate dataset id '{}', keeping the last one",
                    dataset.id
                );
                originals[pos] = dataset;
            } else {
                positions.insert(dataset.id.clone(), originals.len());
                originals.push(dataset);
            }
        }

        let search_text: HashMap<String, String> = originals
            .iter()
            .map(|dataset| (dataset.id.clone(), dataset.search_text()))
            .collect();

        let raw =
            deduplicate(&originals, &DeduplicationConfig::default());

        self.sections = partition(raw.datasets);
        self.originals = originals;
        self.positions = positions;
        self.search_text = search_text;
        self.metadata = DeduplicationMetadata::default();
        self.duplicates = HashMap::new();
        self.applied = None;
        self.state = IndexState::Loaded;
    }

    /// Sets the deduplication config. Nothing is recomputed until the
    /// next call to [apply].
    ///
    /// [apply]: CatalogIndex::apply
    #[inline]
    pub fn set_config(&mut self, config: DeduplicationConfig) {
        self.config = config;
    }

    /// Recomputes the active view and the deduplication metadata from
    /// the loaded datasets and the current config.
    ///
    /// Calling `apply` again without a new load or config change is a
    /// no-op.
    pub fn apply(&mut self) {
        if self.applied.as_ref() == Some(&self.config) {
            return;
        }

        let result = deduplicate(&self.originals, &self.config);
        let duplicates: HashMap<String, usize> = result
            .removed
            .iter()
            .enumerate()
            .map(|(idx, removed)| (removed.id.clone(), idx))
            .collect();

        let metadata = DeduplicationMetadata {
            enabled: self.config.enabled,
            duplicates_found: result.duplicates_found,
            duplicates_removed: result.duplicates_removed,
            last_deduplication_time: Some(Utc::now()),
            removed_duplicates: result.removed,
        };

        let sections = partition(
            result
                .datasets
                .into_iter()
                .filter(|dataset| !dataset.is_duplicate()),
        );

        log::debug!(
            "deduplication pass (enabled = {}): {} groups, {} removed",
            metadata.enabled,
            metadata.duplicates_found,
            metadata.duplicates_removed
        );

        self.sections = sections;
        self.metadata = metadata;
        self.duplicates = duplicates;
        self.applied = Some(self.config.clone());

        if self.state != IndexState::Empty {
            self.state = if self.config.enabled {
                IndexState::Deduplicated
            } else {
                IndexState::Loaded
            };
        }
    }

    /// Searches the active view for datasets whose title or
    /// description contains `query` (case-insensitive).
    ///
    /// An empty (or blank) query matches nothing. Otherwise the query
    /// is matched as given, including surrounding whitespace.
    pub fn search(&self, query: &str) -> SearchResult {
        if query.trim().is_empty() {
            return SearchResult::default();
        }

        let needle = query.to_lowercase();

        let mut result = SearchResult::default();
        for (section, datasets) in self.sections.iter() {
            let matches: Vec<Dataset> = datasets
                .iter()
                .filter(|dataset| {
                    self.search_text
                        .get(&dataset.id)
                        .is_some_and(|text| text.contains(&needle))
                })
                .cloned()
                .collect();

            if !matches.is_empty() {
                result.total_results += matches.len();
                result.sections.insert(section.clone(), matches);
            }
        }

        result
    }

    #[inline]
    pub fn state(&self) -> IndexState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &DeduplicationConfig {
        &self.config
    }

    /// Returns the active view.
    #[inline]
    pub fn sections(&self) -> &Sections {
        &self.sections
    }

    /// Returns all datasets of the active view.
    pub fn datasets(&self) -> impl Iterator<Item = &Dataset> {
        self.sections.values().flatten()
    }

    /// Returns the number of datasets in the active view.
    pub fn len(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every loaded dataset (without annotations), in load
    /// order.
    #[inline]
    pub fn original_datasets(&self) -> &[Dataset] {
        &self.originals
    }

    /// Returns the loaded dataset with the given id.
    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.positions.get(id).map(|&pos| &self.originals[pos])
    }

    #[inline]
    pub fn deduplication_metadata(&self) -> &DeduplicationMetadata {
        &self.metadata
    }

    #[inline]
    pub fn removed_duplicates(&self) -> &[RemovedDuplicate] {
        &self.metadata.removed_duplicates
    }

    /// Returns `true` if the last pass dropped the dataset `id`.
    #[inline]
    pub fn is_duplicate(&self, id: &str) -> bool {
        self.duplicates.contains_key(id)
    }

    /// Returns the id of the dataset kept instead of `id`, if `id` was
    /// dropped by the last pass.
    pub fn survivor_of(&self, id: &str) -> Option<&str> {
        let removed = &self.metadata.removed_duplicates;
        self.duplicates
            .get(id)
            .map(|&idx| removed[idx].kept_instead_id.as_str())
    }

    /// Returns the datasets the survivor `id` was kept instead of.
    pub fn kept_instead_of(&self, id: &str) -> Vec<&RemovedDuplicate> {
        self.metadata
            .removed_duplicates
            .iter()
            .filter(|removed| removed.kept_instead_id == id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::dataset::{DeduplicationInfo, UNSECTIONED};

    fn dataset(
        id: &str,
        section: &str,
        title: &str,
        day: u32,
    ) -> Dataset {
        Dataset {
            id: id.into(),
            title: title.into(),
            description: format!("about {title}"),
            section: Some(section.into()),
            is_valid: true,
            last_modified: Some(
                Utc.with_ymd_and_hms(2023, 10, day, 0, 0, 0).unwrap(),
            ),
            ..Default::default()
        }
    }

    /// Ten datasets, two title groups of size two.
    fn fixture() -> Vec<Dataset> {
        vec![
            dataset("climate/a", "climate", "Temperature", 1),
            dataset("climate/b", "climate", "temperature", 2),
            dataset("climate/c", "climate", "Rainfall", 3),
            dataset("ocean/a", "ocean", "Salinity", 4),
            dataset("ocean/b", "ocean", "Sea Level", 5),
            dataset("ocean/c", "ocean", "SALINITY ", 6),
            dataset("ocean/d", "ocean", "Currents", 7),
            dataset("land/a", "land", "Soil", 8),
            dataset("land/b", "land", "Forests", 9),
            dataset("land/c", "land", "Glaciers", 10),
        ]
    }

    fn enabled() -> DeduplicationConfig {
        DeduplicationConfig {
            enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn state_transitions() {
        let mut index = CatalogIndex::default();
        assert_eq!(index.state(), IndexState::Empty);

        index.apply();
        assert_eq!(index.state(), IndexState::Empty);
        assert!(index.is_empty());

        index.load(fixture());
        assert_eq!(index.state(), IndexState::Loaded);
        assert_eq!(index.len(), 10);

        index.set_config(enabled());
        assert_eq!(index.state(), IndexState::Loaded);
        assert_eq!(index.len(), 10);

        index.apply();
        assert_eq!(index.state(), IndexState::Deduplicated);

        index.load(fixture());
        assert_eq!(index.state(), IndexState::Loaded);
        assert_eq!(
            index.deduplication_metadata(),
            &DeduplicationMetadata::default()
        );
    }

    #[test]
    fn toggle_round_trip() {
        let mut index = CatalogIndex::default();
        index.load(fixture());
        let raw = index.sections().clone();

        index.set_config(enabled());
        index.apply();
        assert_eq!(index.len(), 8);
        let metadata = index.deduplication_metadata();
        assert_eq!(metadata.duplicates_found, 2);
        assert_eq!(metadata.duplicates_removed, 2);
        assert_eq!(index.original_datasets().len(), 10);

        index.set_config(DeduplicationConfig::default());
        index.apply();
        assert_eq!(index.len(), 10);
        assert_eq!(index.sections(), &raw);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut index = CatalogIndex::new(enabled());
        index.load(fixture());

        index.apply();
        let sections = index.sections().clone();
        let metadata = index.deduplication_metadata().clone();

        index.apply();
        assert_eq!(index.sections(), &sections);
        assert_eq!(index.deduplication_metadata(), &metadata);
    }

    #[test]
    fn disabled_view_equals_originals() {
        let mut index = CatalogIndex::default();
        index.load(fixture());
        index.apply();

        let mut count = 0;
        for dataset in index.original_datasets() {
            let section = &index.sections()[dataset.section_key()];
            let indexed =
                section.iter().find(|d| d.id == dataset.id).unwrap();

            assert_eq!(
                indexed.deduplication_info,
                Some(DeduplicationInfo::unique())
            );
            assert_eq!(indexed.title, dataset.title);
            count += 1;
        }

        assert_eq!(count, index.len());
        assert!(!index.deduplication_metadata().enabled);
        assert!(index.removed_duplicates().is_empty());
    }

    #[test]
    fn originals_stay_unannotated() {
        let mut index = CatalogIndex::new(enabled());
        index.load(fixture());
        index.apply();

        assert!(index
            .original_datasets()
            .iter()
            .all(|d| d.deduplication_info.is_none()));
    }

    #[test]
    fn duplicate_accessors() {
        let mut index = CatalogIndex::new(enabled());
        index.load(fixture());
        index.apply();

        assert!(index.is_duplicate("climate/a"));
        assert!(!index.is_duplicate("climate/b"));
        assert_eq!(index.survivor_of("climate/a"), Some("climate/b"));
        assert_eq!(index.survivor_of("climate/b"), None);
        assert!(index.is_duplicate("ocean/a"));
        assert_eq!(index.survivor_of("ocean/a"), Some("ocean/c"));

        let replaced = index.kept_instead_of("ocean/c");
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].id, "ocean/a");
        assert!(index.kept_instead_of("land/a").is_empty());

        for removed in index.removed_duplicates() {
            let survivor = index
                .datasets()
                .find(|d| d.id == removed.kept_instead_id)
                .unwrap();
            assert!(!survivor.is_duplicate());
        }
    }

    #[test]
    fn search_respects_active_view() {
        let mut index = CatalogIndex::default();
        index.load(fixture());

        let raw = index.search("temperature");
        assert_eq!(raw.total_results, 2);

        index.set_config(enabled());
        index.apply();
        let deduplicated = index.search("temperature");
        assert_eq!(deduplicated.total_results, 1);
        assert_eq!(deduplicated.sections["climate"][0].id, "climate/b");

        let unaffected = index.search("soil");
        assert_eq!(unaffected.total_results, 1);
    }

    #[test]
    fn search_matches_description_and_omits_empty_sections() {
        let mut index = CatalogIndex::default();
        index.load(fixture());

        let result = index.search("ABOUT sea");
        assert_eq!(result.total_results, 1);
        assert_eq!(result.sections.len(), 1);
        assert!(result.sections.contains_key("ocean"));

        let result = index.search("nothing like this");
        assert_eq!(result.total_results, 0);
        assert!(result.sections.is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let mut index = CatalogIndex::default();
        index.load(fixture());

        assert_eq!(index.search(""), SearchResult::default());
        assert_eq!(index.search("   ").total_results, 0);
    }

    #[test]
    fn query_whitespace_is_significant() {
        let mut index = CatalogIndex::default();
        index.load([Dataset {
            id: "climate/a".into(),
            title: "Climatology".into(),
            section: Some("climate".into()),
            is_valid: true,
            ..Default::default()
        }]);

        assert_eq!(index.search("clima").total_results, 1);
        assert_eq!(index.search("clima ").total_results, 0);
        assert_eq!(index.search(" clima").total_results, 0);
    }

    #[test]
    fn missing_section_goes_to_unsectioned() {
        let mut orphan = dataset("orphan", "", "Orphan", 1);
        orphan.section = None;

        let mut index = CatalogIndex::default();
        index.load(vec![orphan, dataset("x/a", "x", "A", 2)]);

        assert_eq!(index.sections()[UNSECTIONED].len(), 1);
        let result = index.search("orphan");
        assert_eq!(result.sections[UNSECTIONED].len(), 1);
    }

    #[test]
    fn duplicate_ids_keep_the_last_record() {
        let first = dataset("a", "s", "First", 1);
        let second = dataset("a", "s", "Second", 2);

        let mut index = CatalogIndex::default();
        index.load(vec![first, dataset("b", "s", "Other", 3), second]);

        assert_eq!(index.original_datasets().len(), 2);
        assert_eq!(index.original_datasets()[0].title, "Second");
        assert_eq!(
            index.get("a").map(|d| d.title.as_str()),
            Some("Second")
        );
        assert_eq!(index.search("first").total_results, 0);
    }
}
