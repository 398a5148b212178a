use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dedup::DeduplicationConfig;
use crate::display::DateDisplay;
use crate::error::{CatalogError, CatalogResult};

/// Catalog config.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Where the datasets live.
    #[serde(default)]
    pub source: SourceConfig,

    /// Deduplication settings.
    #[serde(default)]
    pub deduplication: DeduplicationConfig,

    /// Presentation settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Runtime options.
    pub runtime: Option<Runtime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceConfig {
    /// The name of the bucket.
    pub bucket: Option<String>,

    /// Only objects whose key starts with `prefix` are considered.
    pub prefix: Option<String>,

    /// A custom endpoint of an S3-compatible store.
    pub endpoint: Option<String>,

    pub region: Option<String>,

    /// Send unsigned requests (public buckets).
    #[serde(default = "default_true")]
    pub anonymous: bool,

    #[serde(default)]
    pub force_path_style: bool,

    /// Objects whose key ends with this suffix are metadata files.
    #[serde(default = "default_metadata_suffix")]
    pub metadata_suffix: String,

    /// The maximum number of metadata objects fetched at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[inline]
fn default_true() -> bool {
    true
}

#[inline]
fn default_metadata_suffix() -> String {
    ".json".into()
}

#[inline]
fn default_concurrency() -> usize {
    8
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            endpoint: None,
            region: None,
            anonymous: true,
            force_path_style: false,
            metadata_suffix: default_metadata_suffix(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DisplayConfig {
    /// How timestamps are rendered.
    #[serde(default)]
    pub dates: DateDisplay,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Runtime {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    pub num_jobs: Option<usize>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn unknown_option(name: &str) -> CatalogError {
    CatalogError::config(format!("unknown config option `{name}`"))
}

impl Config {
    /// The names of all options accessible through [get] and [set].
    ///
    /// [get]: Config::get
    /// [set]: Config::set
    pub const OPTIONS: &'static [&'static str] = &[
        "source.bucket",
        "source.prefix",
        "source.endpoint",
        "source.region",
        "source.anonymous",
        "source.metadata-suffix",
        "source.concurrency",
        "deduplication.enabled",
        "deduplication.strategy",
        "deduplication.keep-latest",
        "deduplication.case-sensitive",
        "display.dates",
        "runtime.num-jobs",
    ];

    /// Creates a new default config and sets the file location.
    pub fn create<P>(path: P) -> CatalogResult<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self {
            path: path.as_ref().into(),
            ..Default::default()
        })
    }

    /// Loads an existing config from a path.
    pub fn from_path<P>(path: P) -> CatalogResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().into();
        let content = fs::read_to_string(&path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Saves the config.
    pub fn save(&self) -> CatalogResult<()> {
        let content = toml::to_string(self)?;
        let mut out = File::create(&self.path)?;
        out.write_all(content.as_bytes())?;
        Ok(())
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value of the option `name`, if set.
    pub fn get(&self, name: &str) -> CatalogResult<Option<String>> {
        let source = &self.source;

        Ok(match name {
            "source.bucket" => source.bucket.clone(),
            "source.prefix" => source.prefix.clone(),
            "source.endpoint" => source.endpoint.clone(),
            "source.region" => source.region.clone(),
            "source.anonymous" => Some(source.anonymous.to_string()),
            "source.metadata-suffix" => {
                Some(source.metadata_suffix.clone())
            }
            "source.concurrency" => {
                Some(source.concurrency.to_string())
            }
            "display.dates" => Some(self.display.dates.to_string()),
            "runtime.num-jobs" => self
                .runtime
                .as_ref()
                .and_then(|rt| rt.num_jobs)
                .map(|n| n.to_string()),
            name => match name.strip_prefix("deduplication.") {
                Some(key) => Some(self.deduplication.option(key)?),
                None => return Err(unknown_option(name)),
            },
        })
    }

    /// Sets the option `name` to `value`. If the value is rejected,
    /// the config stays unchanged.
    pub fn set(
        &mut self,
        name: &str,
        value: &str,
    ) -> CatalogResult<()> {
        let invalid = || {
            CatalogError::config(format!(
                "invalid value `{value}` for `{name}`"
            ))
        };

        match name {
            "source.bucket" => self.source.bucket = non_empty(value),
            "source.prefix" => self.source.prefix = non_empty(value),
            "source.endpoint" => {
                self.source.endpoint = non_empty(value)
            }
            "source.region" => self.source.region = non_empty(value),
            "source.anonymous" => {
                self.source.anonymous =
                    value.trim().parse().map_err(|_| invalid())?
            }
            "source.metadata-suffix" => {
                self.source.metadata_suffix =
                    non_empty(value).ok_or_else(invalid)?
            }
            "source.concurrency" => {
                self.source.concurrency = match value.trim().parse() {
                    Ok(n) if n > 0 => n,
                    _ => return Err(invalid()),
                }
            }
            "display.dates" => self.display.dates = value.parse()?,
            "runtime.num-jobs" => {
                let num_jobs =
                    value.trim().parse().map_err(|_| invalid())?;
                self.runtime = Some(Runtime {
                    num_jobs: Some(num_jobs),
                });
            }
            name => match name.strip_prefix("deduplication.") {
                Some(key) => {
                    self.deduplication =
                        self.deduplication.with_option(key, value)?
                }
                None => return Err(unknown_option(name)),
            },
        }

        Ok(())
    }

    /// Resets the option `name` to its default value.
    pub fn unset(&mut self, name: &str) -> CatalogResult<()> {
        let source = SourceConfig::default();
        let deduplication = DeduplicationConfig::default();

        match name {
            "source.bucket" => self.source.bucket = None,
            "source.prefix" => self.source.prefix = None,
            "source.endpoint" => self.source.endpoint = None,
            "source.region" => self.source.region = None,
            "source.anonymous" => {
                self.source.anonymous = source.anonymous
            }
            "source.metadata-suffix" => {
                self.source.metadata_suffix = source.metadata_suffix
            }
            "source.concurrency" => {
                self.source.concurrency = source.concurrency
            }
            "deduplication.enabled" => {
                self.deduplication.enabled = deduplication.enabled
            }
            "deduplication.strategy" => {
                self.deduplication.strategy = deduplication.strategy
            }
            "deduplication.keep-latest" => {
                self.deduplication.keep_latest =
                    deduplication.keep_latest
            }
            "deduplication.case-sensitive" => {
                self.deduplication.case_sensitive =
                    deduplication.case_sensitive
            }
            "display.dates" => self.display = DisplayConfig::default(),
            "runtime.num-jobs" => self.runtime = None,
            name => return Err(unknown_option(name)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.source.anonymous);
        assert_eq!(config.source.metadata_suffix, ".json");
        assert_eq!(config.source.concurrency, 8);
        assert!(!config.deduplication.enabled);
        assert!(config.deduplication.keep_latest);
        assert_eq!(config.display.dates, DateDisplay::Relative);
    }

    #[test]
    fn save_and_load() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("datacat.toml");

        let mut config = Config::create(&path)?;
        config.set("source.bucket", "open-data")?;
        config.set("deduplication.enabled", "true")?;
        config.set("runtime.num-jobs", "4")?;
        config.save()?;

        let config = Config::from_path(&path)?;
        assert_eq!(config.path(), path.as_path());
        assert_eq!(config.source.bucket.as_deref(), Some("open-data"));
        assert!(config.deduplication.enabled);
        assert_eq!(
            config.get("runtime.num-jobs")?.as_deref(),
            Some("4")
        );

        Ok(())
    }

    #[test]
    fn parse_minimal_toml() -> TestResult {
        let config: Config = toml::from_str(
            "[source]\nbucket = \"b\"\n\n\
             [deduplication]\nenabled = true\n",
        )?;

        assert_eq!(config.source.bucket.as_deref(), Some("b"));
        assert_eq!(config.source.concurrency, 8);
        assert!(config.deduplication.enabled);
        assert!(config.runtime.is_none());

        Ok(())
    }

    #[test]
    fn rejected_values_leave_config_untouched() -> TestResult {
        let mut config = Config::default();
        config.set("deduplication.case-sensitive", "true")?;

        assert!(config.set("deduplication.strategy", "fuzzy").is_err());
        assert!(config.set("deduplication.enabled", "maybe").is_err());
        assert!(config.set("source.concurrency", "0").is_err());
        assert!(config.set("display.dates", "someday").is_err());
        assert!(config.set("no.such.option", "1").is_err());
        assert!(config.get("deduplication.bogus").is_err());

        assert!(config.deduplication.case_sensitive);
        assert!(!config.deduplication.enabled);
        assert_eq!(config.source.concurrency, 8);

        Ok(())
    }

    #[test]
    fn unset_restores_defaults() -> TestResult {
        let mut config = Config::default();
        config.set("source.prefix", "datasets/")?;
        config.set("deduplication.keep-latest", "false")?;

        config.unset("source.prefix")?;
        config.unset("deduplication.keep-latest")?;

        assert_eq!(config.get("source.prefix")?, None);
        assert!(config.deduplication.keep_latest);
        assert!(config.unset("bogus").is_err());

        Ok(())
    }

    #[test]
    fn every_option_is_readable() -> TestResult {
        let config = Config::default();
        for name in Config::OPTIONS {
            config.get(name)?;
        }

        Ok(())
    }
}
