//! # Catalog
//!
//! This crate builds a searchable catalog of the datasets stored in an
//! S3-compatible bucket. Every dataset is described by a schema.org
//! `Dataset` metadata file (JSON); the first path segment of its key
//! is the dataset's _section_.
//!
//! A load lists the bucket, parses every metadata object and hands the
//! resulting [Dataset]s to a [CatalogIndex]. The index keeps the
//! loaded datasets as they are and derives an _active view_ from them:
//! either all datasets, or, if deduplication is enabled, one survivor
//! per group of datasets sharing a normalized title. Searching always
//! reads the active view, and switching deduplication on or off never
//! requires another load.
//!
//! ```no_run
//! use catalog::prelude::*;
//!
//! # async fn example() -> CatalogResult<()> {
//! let store = DirStore::new("mirror", None);
//! let mut service = CatalogService::new(
//!     store,
//!     SourceConfig::default(),
//!     DeduplicationConfig::default(),
//!     DisplayConfig::default(),
//! );
//!
//! service.load().await?;
//! service.set_deduplication_option("enabled", "true")?;
//!
//! let response = service.search("climate", SearchOptions::default());
//! println!("{} results", response.total_results);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dataset;
pub mod dedup;
pub mod display;
pub mod error;
pub mod export;
pub mod index;
pub mod parser;
pub mod service;
pub mod store;

pub use dataset::Dataset;
pub use index::CatalogIndex;

pub mod prelude {
    pub use crate::config::{
        Config, DisplayConfig, Runtime, SourceConfig,
    };
    pub use crate::dataset::{Dataset, DeduplicationInfo, UNSECTIONED};
    pub use crate::dedup::{
        deduplicate, DeduplicationConfig, RemovedDuplicate, Strategy,
    };
    pub use crate::display::{format_date, format_size, DateDisplay};
    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::export::{export, ExportFormat};
    pub use crate::index::{
        CatalogIndex, DeduplicationMetadata, IndexState, SearchResult,
        Sections,
    };
    pub use crate::service::{
        Browse, CatalogService, LoadSummary, SearchOptions,
        SearchResponse, Summary,
    };
    pub use crate::store::{
        DirStore, MemoryStore, ObjectInfo, ObjectStore, S3Store,
    };
}
