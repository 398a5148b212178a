use std::path::PathBuf;

use catalog::prelude::*;

use crate::error::DatacatResult;
use crate::progress::ProgressBarBuilder;

const PBAR_LOAD: &str = "{spinner} Loading datasets from {msg} | \
        elapsed: {elapsed_precise}";

/// The object store a command reads from.
#[derive(Debug)]
pub(crate) enum Store {
    Dir(DirStore),
    S3(S3Store),
}

impl Store {
    fn describe(&self) -> String {
        match self {
            Self::Dir(_) => "directory".into(),
            Self::S3(store) => format!("bucket '{}'", store.bucket()),
        }
    }
}

impl ObjectStore for Store {
    async fn list_objects(&self) -> CatalogResult<Vec<ObjectInfo>> {
        match self {
            Self::Dir(store) => store.list_objects().await,
            Self::S3(store) => store.list_objects().await,
        }
    }

    async fn get_object_text(
        &self,
        key: &str,
    ) -> CatalogResult<String> {
        match self {
            Self::Dir(store) => store.get_object_text(key).await,
            Self::S3(store) => store.get_object_text(key).await,
        }
    }
}

pub(crate) type Service = CatalogService<Store>;

/// Options selecting where the datasets are read from.
#[derive(Debug, Default, Clone, clap::Args)]
pub(crate) struct SourceArgs {
    /// Read the datasets from a local directory (e.g. a mirror of the
    /// bucket) instead of the configured bucket. This option takes
    /// precedence over `--bucket` and `--endpoint`.
    #[arg(long, value_name = "path")]
    dir: Option<PathBuf>,

    /// The name of the bucket. Overrides the `source.bucket` option
    /// of the config.
    #[arg(long, env = "DATACAT_BUCKET", hide_env_values = true)]
    bucket: Option<String>,

    /// The endpoint of an S3-compatible store. Overrides the
    /// `source.endpoint` option of the config.
    #[arg(long, env = "DATACAT_ENDPOINT", hide_env_values = true)]
    endpoint: Option<String>,
}

impl SourceArgs {
    #[cfg(test)]
    pub(crate) fn for_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Merges the command line overrides into `source`.
    pub(crate) fn apply(&self, source: &mut SourceConfig) {
        if let Some(ref bucket) = self.bucket {
            source.bucket = Some(bucket.clone());
        }

        if let Some(ref endpoint) = self.endpoint {
            source.endpoint = Some(endpoint.clone());
        }
    }

    pub(crate) async fn store(
        &self,
        source: &SourceConfig,
    ) -> DatacatResult<Store> {
        Ok(match self.dir {
            Some(ref dir) => {
                let prefix = source.prefix.clone();
                Store::Dir(DirStore::new(dir, prefix))
            }
            None => Store::S3(S3Store::connect(source).await?),
        })
    }

    /// Creates the catalog service described by `config` and the
    /// command line overrides, and loads all datasets.
    pub(crate) async fn load(
        &self,
        mut config: Config,
        quiet: bool,
    ) -> DatacatResult<Service> {
        self.apply(&mut config.source);

        let store = self.store(&config.source).await?;
        let pbar = ProgressBarBuilder::new(PBAR_LOAD, quiet).build();
        pbar.set_message(store.describe());

        let mut service = CatalogService::from_config(store, &config);
        let result = service.load().await;
        pbar.finish_and_clear();

        let summary = result?;
        if summary.invalid > 0 {
            log::warn!(
                "{} of {} metadata files are invalid",
                summary.invalid,
                summary.datasets
            );
        }

        Ok(service)
    }
}

/// Options overriding the configured deduplication.
#[derive(Debug, Default, Clone, Copy, clap::Args)]
pub(crate) struct DedupArgs {
    /// Remove datasets sharing a title with a more recent dataset,
    /// regardless of the `deduplication.enabled` option.
    #[arg(long, overrides_with = "no_dedup")]
    dedup: bool,

    /// Show all datasets, regardless of the `deduplication.enabled`
    /// option.
    #[arg(long, overrides_with = "dedup")]
    no_dedup: bool,
}

impl DedupArgs {
    pub(crate) fn deduplicate(&self) -> Option<bool> {
        match (self.dedup, self.no_dedup) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Switches the deduplication of `config` according to the flags.
    pub(crate) fn apply(&self, config: &mut Config) {
        if let Some(enabled) = self.deduplicate() {
            config.deduplication.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn source_overrides() {
        let args = SourceArgs {
            bucket: Some("open-data".into()),
            ..Default::default()
        };

        let mut source = SourceConfig {
            bucket: Some("other".into()),
            endpoint: Some("http://localhost:9000".into()),
            ..Default::default()
        };

        args.apply(&mut source);
        assert_eq!(source.bucket.as_deref(), Some("open-data"));
        assert_eq!(
            source.endpoint.as_deref(),
            Some("http://localhost:9000")
        );
    }

    #[test]
    fn dedup_flags() {
        let mut config = Config::default();
        assert_eq!(DedupArgs::default().deduplicate(), None);

        let args = DedupArgs {
            dedup: true,
            no_dedup: false,
        };
        args.apply(&mut config);
        assert!(config.deduplication.enabled);

        let args = DedupArgs {
            dedup: false,
            no_dedup: true,
        };
        args.apply(&mut config);
        assert!(!config.deduplication.enabled);
    }

    #[tokio::test]
    async fn load_from_directory() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("climate"))?;
        fs::write(
            dir.path().join("climate/temp.json"),
            r#"{"@type": "Dataset", "name": "Temperature"}"#,
        )?;
        fs::write(dir.path().join("climate/temp.csv"), "t\n1\n")?;

        let args = SourceArgs {
            dir: Some(dir.path().into()),
            ..Default::default()
        };

        let service = args.load(Config::default(), true).await?;
        assert_eq!(service.index().len(), 1);
        let climate = &service.index().sections()["climate"];
        assert_eq!(climate[0].title, "Temperature");

        Ok(())
    }
}
