use std::path::{Path, PathBuf};
use std::{env, fs};

use catalog::config::Config;
use clap::Parser;

use crate::prelude::*;

/// Initialize a new or re-initialize an existing catalog.
#[derive(Debug, Default, Parser)]
pub(crate) struct Init {
    /// The name of the bucket holding the datasets.
    #[arg(long)]
    bucket: Option<String>,

    /// The endpoint of an S3-compatible store (e.g. a MinIO server).
    #[arg(long)]
    endpoint: Option<String>,

    /// The region of the bucket.
    #[arg(long)]
    region: Option<String>,

    /// Only catalog objects whose key starts with `prefix`.
    #[arg(long)]
    prefix: Option<String>,

    /// Whether to overwrite config with default values or not.
    #[arg(short, long)]
    force: bool,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The location of the catalog.
    #[arg(default_value = ".")]
    path: PathBuf,
}

impl Init {
    fn write_config(self, root_dir: &Path) -> DatacatResult<()> {
        let path = root_dir.join(Datacat::CONFIG);

        if path.exists() && !self.force {
            if !self.quiet {
                eprintln!(
                    "{} already exists (use --force to overwrite it).",
                    path.display()
                );
            }

            return Ok(());
        }

        let mut config = Config::create(&path)?;
        config.source.bucket = self.bucket;
        config.source.endpoint = self.endpoint;
        config.source.region = self.region;
        config.source.prefix = self.prefix;
        config.save()?;

        log::info!("wrote {}", path.display());
        Ok(())
    }

    pub(crate) fn execute(self) -> DatacatResult<()> {
        let root_dir = env::current_dir()?.join(&self.path);

        if root_dir.exists() && !root_dir.is_dir() {
            bail!("{} is not a directory", root_dir.display());
        }

        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;

            if self.verbose {
                eprintln!(
                    "Initialize new catalog in {}",
                    root_dir.display()
                );
            }
        } else if self.verbose {
            eprintln!(
                "Re-Initialize existing catalog in {}",
                root_dir.display()
            );
        }

        self.write_config(&root_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn init_writes_config() -> TestResult {
        let dir = tempfile::tempdir()?;

        let init = Init {
            bucket: Some("open-data".into()),
            quiet: true,
            ..Default::default()
        };
        init.write_config(dir.path())?;

        let path = dir.path().join(Datacat::CONFIG);
        let config = Config::from_path(&path)?;
        assert_eq!(config.source.bucket.as_deref(), Some("open-data"));
        assert!(config.source.anonymous);

        Ok(())
    }

    #[test]
    fn init_keeps_existing_config() -> TestResult {
        let dir = tempfile::tempdir()?;

        let init = Init {
            bucket: Some("first".into()),
            quiet: true,
            ..Default::default()
        };
        init.write_config(dir.path())?;

        let init = Init {
            bucket: Some("second".into()),
            quiet: true,
            ..Default::default()
        };
        init.write_config(dir.path())?;

        let path = dir.path().join(Datacat::CONFIG);
        let config = Config::from_path(&path)?;
        assert_eq!(config.source.bucket.as_deref(), Some("first"));

        let init = Init {
            bucket: Some("third".into()),
            quiet: true,
            force: true,
            ..Default::default()
        };
        init.write_config(dir.path())?;

        let path = dir.path().join(Datacat::CONFIG);
        let config = Config::from_path(&path)?;
        assert_eq!(config.source.bucket.as_deref(), Some("third"));

        Ok(())
    }
}
