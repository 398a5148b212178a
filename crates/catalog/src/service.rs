use std::time::Instant;

use futures::stream::{self, StreamExt};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{Config, DisplayConfig, SourceConfig};
use crate::dataset::Dataset;
use crate::dedup::DeduplicationConfig;
use crate::display::DateDisplay;
use crate::error::CatalogResult;
use crate::index::{CatalogIndex, DeduplicationMetadata, Sections};
use crate::parser;
use crate::store::{ObjectInfo, ObjectStore};

/// Counters of a finished load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    /// The number of listed objects.
    pub objects: usize,
    pub datasets: usize,
    pub invalid: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The number of datasets in the active view.
    pub total_datasets: usize,
    pub valid_datasets: usize,
    pub invalid_datasets: usize,
    pub sections: usize,
    /// The number of loaded datasets.
    pub original_total: usize,
    pub deduplication: DeduplicationMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Browse {
    pub sections: Sections,
    pub metadata: Summary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Switch deduplication on or off before searching.
    pub deduplicate: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub sections: Sections,
    pub total_results: usize,
    pub metadata: Summary,
}

/// Drives listing, parsing and indexing of one object store.
#[derive(Debug)]
pub struct CatalogService<S> {
    store: S,
    source: SourceConfig,
    display: DisplayConfig,
    index: CatalogIndex,
}

/// Returns the object key a distribution's `content_url` refers to,
/// trying the url as given and relative to the metadata object.
fn candidate_keys<'a>(
    url: &'a str,
    metadata_key: &'a str,
) -> impl Iterator<Item = String> + 'a {
    let absolute = url.trim_start_matches('/').to_string();
    let relative = metadata_key
        .rsplit_once('/')
        .map(|(dir, _)| format!("{dir}/{absolute}"));

    std::iter::once(absolute).chain(relative)
}

fn fill_sizes(
    dataset: &mut Dataset,
    metadata_key: &str,
    sizes: &HashMap<&str, u64>,
) {
    for distribution in dataset.distribution.iter_mut() {
        if distribution.content_size.is_some() {
            continue;
        }

        if let Some(ref url) = distribution.content_url {
            distribution.content_size =
                candidate_keys(url, metadata_key)
                    .find_map(|key| sizes.get(key.as_str()).copied());
        }
    }
}

impl<S: ObjectStore> CatalogService<S> {
    pub fn new(
        store: S,
        source: SourceConfig,
        deduplication: DeduplicationConfig,
        display: DisplayConfig,
    ) -> Self {
        Self {
            store,
            source,
            display,
            index: CatalogIndex::new(deduplication),
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(
            store,
            config.source.clone(),
            config.deduplication.clone(),
            config.display.clone(),
        )
    }

    fn is_metadata(&self, info: &ObjectInfo) -> bool {
        let prefix = self.source.prefix.as_deref().unwrap_or_default();
        info.key.ends_with(&self.source.metadata_suffix)
            && info.key.starts_with(prefix)
    }

    /// Lists the store, reads and parses every metadata object and
    /// replaces the catalog with the result.
    ///
    /// If listing fails, the error is returned and the current
    /// catalog stays as it is. Metadata objects which can't be read
    /// end up as invalid datasets.
    pub async fn load(&mut self) -> CatalogResult<LoadSummary> {
        let start = Instant::now();
        let objects = self.store.list_objects().await?;

        let mut metadata: Vec<&ObjectInfo> = objects
            .iter()
            .filter(|info| self.is_metadata(info))
            .collect();
        metadata.sort_by(|a, b| a.key.cmp(&b.key));

        log::info!(
            "found {} metadata objects ({} objects listed)",
            metadata.len(),
            objects.len()
        );

        let store = &self.store;
        let bodies: Vec<CatalogResult<String>> = stream::iter(
            metadata
                .iter()
                .map(|info| store.get_object_text(&info.key)),
        )
        .buffered(self.source.concurrency.max(1))
        .collect()
        .await;

        let suffix = self.source.metadata_suffix.as_str();
        let sizes: HashMap<&str, u64> = objects
            .iter()
            .map(|info| (info.key.as_str(), info.size))
            .collect();

        let datasets: Vec<Dataset> = metadata
            .par_iter()
            .zip(bodies.into_par_iter())
            .map(|(&info, body)| {
                let key = info.key.as_str();
                let mut dataset = match body {
                    Ok(raw) => {
                        parser::parse(&raw, key, Some(info), suffix)
                    }
                    Err(e) => {
                        log::warn!("unable to read {key}: {e}");
                        parser::unreadable(key, Some(info), suffix, e)
                    }
                };

                fill_sizes(&mut dataset, key, &sizes);
                dataset
            })
            .collect();

        let summary = LoadSummary {
            objects: objects.len(),
            datasets: datasets.len(),
            invalid: datasets.iter().filter(|d| !d.is_valid).count(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };

        self.index.load(datasets);
        self.index.apply();

        log::info!(
            "loaded {} datasets ({} invalid) in {} ms",
            summary.datasets,
            summary.invalid,
            summary.elapsed_ms
        );

        Ok(summary)
    }

    /// Returns a summary of the active view.
    pub fn summary(&self) -> Summary {
        let total_datasets = self.index.len();
        let valid_datasets =
            self.index.datasets().filter(|d| d.is_valid).count();

        Summary {
            total_datasets,
            valid_datasets,
            invalid_datasets: total_datasets - valid_datasets,
            sections: self.index.sections().len(),
            original_total: self.index.original_datasets().len(),
            deduplication: self.index.deduplication_metadata().clone(),
        }
    }

    /// Returns the active view together with its summary.
    pub fn browse(&self) -> Browse {
        Browse {
            sections: self.index.sections().clone(),
            metadata: self.summary(),
        }
    }

    /// Searches the active view. If `options.deduplicate` is set,
    /// deduplication is switched accordingly first.
    pub fn search(
        &mut self,
        query: &str,
        options: SearchOptions,
    ) -> SearchResponse {
        if let Some(enabled) = options.deduplicate {
            if enabled != self.index.config().enabled {
                let config = DeduplicationConfig {
                    enabled,
                    ..self.index.config().clone()
                };
                self.set_deduplication(config);
            }
        }

        let result = self.index.search(query);
        SearchResponse {
            sections: result.sections,
            total_results: result.total_results,
            metadata: self.summary(),
        }
    }

    /// Replaces the deduplication config and updates the active view.
    pub fn set_deduplication(&mut self, config: DeduplicationConfig) {
        self.index.set_config(config);
        self.index.apply();
    }

    /// Sets a single deduplication option from its textual value and
    /// updates the active view. A rejected value leaves everything as
    /// it was.
    pub fn set_deduplication_option(
        &mut self,
        key: &str,
        value: &str,
    ) -> CatalogResult<()> {
        let config = self.index.config().with_option(key, value)?;
        self.set_deduplication(config);
        Ok(())
    }

    #[inline]
    pub fn deduplication(&self) -> &DeduplicationConfig {
        self.index.config()
    }

    #[inline]
    pub fn set_date_display(&mut self, dates: DateDisplay) {
        self.display.dates = dates;
    }

    #[inline]
    pub fn date_display(&self) -> DateDisplay {
        self.display.dates
    }

    #[inline]
    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }
}
