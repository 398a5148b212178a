//! Access to the objects backing the catalog.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use glob::{glob_with, MatchOptions, Pattern};

use crate::config::SourceConfig;
use crate::error::{CatalogError, CatalogResult};

/// An object of the store, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// A source of objects.
pub trait ObjectStore {
    /// Lists all objects of the store. Implementations handle
    /// pagination themselves; the order of the result is unspecified.
    fn list_objects(
        &self,
    ) -> impl Future<Output = CatalogResult<Vec<ObjectInfo>>> + Send;

    /// Reads the object `key` as text.
    fn get_object_text(
        &self,
        key: &str,
    ) -> impl Future<Output = CatalogResult<String>> + Send;
}

/// An S3(-compatible) bucket.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Store {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    /// Creates a client for the bucket described by `config`.
    ///
    /// Unless `config.anonymous` is unset, requests are not signed,
    /// which is what public buckets expect.
    pub async fn connect(config: &SourceConfig) -> CatalogResult<Self> {
        let Some(bucket) = config.bucket.clone() else {
            return Err(CatalogError::config("no bucket configured"));
        };

        let region = config.region.clone().map(Region::new);
        let region = RegionProviderChain::first_try(region)
            .or_default_provider()
            .or_else(Region::new(Self::DEFAULT_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(region);

        if let Some(ref endpoint) = config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        if config.anonymous {
            loader = loader.no_credentials();
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(
                config.force_path_style || config.endpoint.is_some(),
            )
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket,
            prefix: config.prefix.clone(),
        })
    }

    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for S3Store {
    async fn list_objects(&self) -> CatalogResult<Vec<ObjectInfo>> {
        let mut objects = vec![];
        let mut token: Option<String> = None;

        loop {
            let mut req =
                self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(ref prefix) = self.prefix {
                req = req.prefix(prefix);
            }

            if let Some(ref token) = token {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|e| {
                CatalogError::store(format!(
                    "unable to list bucket '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

            for object in resp.contents() {
                let key = object.key().unwrap_or_default();

                // directory markers
                if key.is_empty() || key.ends_with('/') {
                    continue;
                }

                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().and_then(|t| {
                        DateTime::from_timestamp(
                            t.secs(),
                            t.subsec_nanos(),
                        )
                    }),
                });
            }

            let next = resp.next_continuation_token();
            match (resp.is_truncated(), next) {
                (Some(true), Some(next)) => {
                    token = Some(next.to_string())
                }
                _ => break,
            }
        }

        log::debug!(
            "listed {} objects in bucket '{}'",
            objects.len(),
            self.bucket
        );

        Ok(objects)
    }

    async fn get_object_text(
        &self,
        key: &str,
    ) -> CatalogResult<String> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                CatalogError::store(format!(
                    "unable to get '{key}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let body = resp.body.collect().await.map_err(|e| {
            CatalogError::store(format!("unable to read '{key}': {e}"))
        })?;

        Ok(String::from_utf8_lossy(&body.into_bytes()).into_owned())
    }
}

/// A local directory, e.g. a mirror of a bucket. Keys are the
/// `/`-separated paths relative to the root directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root_dir: PathBuf,
    prefix: Option<String>,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(
        root_dir: P,
        prefix: Option<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.as_ref().to_path_buf(),
            prefix,
        }
    }

    fn key_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root_dir).ok()?;
        let parts: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;

        Some(parts.join("/"))
    }

    fn scan(&self) -> CatalogResult<Vec<ObjectInfo>> {
        if !self.root_dir.is_dir() {
            return Err(CatalogError::store(format!(
                "not a directory: {}",
                self.root_dir.display()
            )));
        }

        let pattern = format!(
            "{}/**/*",
            Pattern::escape(&self.root_dir.to_string_lossy())
        );
        let options = MatchOptions::default();

        let mut objects = vec![];
        for entry in glob_with(&pattern, options)
            .map_err(|e| CatalogError::store(e.to_string()))?
        {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    log::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            // dangling symlinks, races with concurrent deletes
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("skipping {}: {e}", path.display());
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let Some(key) = self.key_of(&path) else {
                log::warn!(
                    "skipping non UTF-8 path {}",
                    path.display()
                );
                continue;
            };

            if let Some(ref prefix) = self.prefix {
                if !key.starts_with(prefix.as_str()) {
                    continue;
                }
            }

            objects.push(ObjectInfo {
                key,
                size: metadata.len(),
                last_modified: metadata
                    .modified()
                    .ok()
                    .map(DateTime::from),
            });
        }

        Ok(objects)
    }
}

impl ObjectStore for DirStore {
    async fn list_objects(&self) -> CatalogResult<Vec<ObjectInfo>> {
        self.scan()
    }

    async fn get_object_text(
        &self,
        key: &str,
    ) -> CatalogResult<String> {
        let bytes = fs::read(self.root_dir.join(key))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// An in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Vec<(ObjectInfo, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object (or replaces the object with the same key).
    pub fn insert<K, B>(
        &mut self,
        key: K,
        body: B,
        last_modified: Option<DateTime<Utc>>,
    ) where
        K: Into<String>,
        B: Into<String>,
    {
        let key = key.into();
        let body = body.into();
        let info = ObjectInfo {
            size: body.len() as u64,
            key,
            last_modified,
        };

        self.objects.retain(|(other, _)| other.key != info.key);
        self.objects.push((info, body));
    }

    /// Builder-style variant of [insert].
    ///
    /// [insert]: MemoryStore::insert
    pub fn with_object<K, B>(
        mut self,
        key: K,
        body: B,
        last_modified: Option<DateTime<Utc>>,
    ) -> Self
    where
        K: Into<String>,
        B: Into<String>,
    {
        self.insert(key, body, last_modified);
        self
    }
}

impl ObjectStore for MemoryStore {
    async fn list_objects(&self) -> CatalogResult<Vec<ObjectInfo>> {
        Ok(self.objects.iter().map(|(info, _)| info.clone()).collect())
    }

    async fn get_object_text(
        &self,
        key: &str,
    ) -> CatalogResult<String> {
        self.objects
            .iter()
            .find(|(info, _)| info.key == key)
            .map(|(_, body)| body.clone())
            .ok_or_else(|| {
                CatalogError::store(format!("no such key '{key}'"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[tokio::test]
    async fn memory_store_roundtrip() -> TestResult {
        let store = MemoryStore::new()
            .with_object("a/x.json", "{}", None)
            .with_object("a/x.json", "{\"name\": \"x\"}", None)
            .with_object("b/y.json", "[]", None);

        let objects = store.list_objects().await?;
        assert_eq!(objects.len(), 2);
        assert_eq!(
            store.get_object_text("a/x.json").await?,
            "{\"name\": \"x\"}"
        );
        assert!(store.get_object_text("missing").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn dir_store_lists_files() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("climate/nested"))?;
        fs::write(dir.path().join("climate/temp.json"), "{}")?;
        fs::write(dir.path().join("climate/nested/deep.json"), "[1]")?;
        fs::write(dir.path().join("top.json"), "{}")?;

        let store = DirStore::new(dir.path(), None);
        let mut keys: Vec<_> = store
            .list_objects()
            .await?
            .into_iter()
            .map(|info| info.key)
            .collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                "climate/nested/deep.json",
                "climate/temp.json",
                "top.json",
            ]
        );
        assert_eq!(
            store.get_object_text("climate/nested/deep.json").await?,
            "[1]"
        );

        let store = DirStore::new(dir.path(), Some("climate/".into()));
        assert_eq!(store.list_objects().await?.len(), 2);

        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dir_store_skips_dangling_links() -> TestResult {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("climate"))?;
        fs::write(dir.path().join("climate/temp.json"), "{}")?;
        std::os::unix::fs::symlink(
            "/nonexistent/target",
            dir.path().join("climate/broken.json"),
        )?;

        let store = DirStore::new(dir.path(), None);
        let objects = store.list_objects().await?;

        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "climate/temp.json");
        Ok(())
    }

    #[tokio::test]
    async fn dir_store_requires_directory() {
        let store = DirStore::new("/does/not/exist", None);
        assert!(store.list_objects().await.is_err());
    }
}
