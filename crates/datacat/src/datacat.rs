use std::path::PathBuf;
use std::{env, fs};

use catalog::config::Config;

use crate::prelude::{DatacatError, DatacatResult};

pub(crate) struct Datacat {
    /// The directory containing the catalog config.
    root_dir: PathBuf,
}

impl Datacat {
    pub(crate) const CONFIG: &'static str = "datacat.toml";

    /// Discovers the root of the catalog.
    ///
    /// This function fails, if neither the current directory nor any
    /// parent directory contains a catalog [Config].
    pub(crate) fn discover() -> DatacatResult<Self> {
        let mut root_dir = env::current_dir()?;

        loop {
            let path = root_dir.join(Self::CONFIG);
            if let Ok(metadata) = fs::metadata(path) {
                if metadata.is_file() {
                    break;
                }
            }

            if !root_dir.pop() {
                return Err(DatacatError::other(
                    "not a catalog (or any parent directory)",
                ));
            }
        }

        Ok(Self { root_dir })
    }

    /// Returns the config associated with the catalog.
    #[inline]
    pub(crate) fn config(&self) -> DatacatResult<Config> {
        Ok(Config::from_path(self.root_dir.join(Self::CONFIG))?)
    }

    /// Returns the config of the surrounding catalog or, outside of a
    /// catalog, the default config.
    pub(crate) fn config_or_default() -> DatacatResult<Config> {
        match Self::discover() {
            Ok(datacat) => datacat.config(),
            Err(DatacatError::Other(_)) => Ok(Config::default()),
            Err(e) => Err(e),
        }
    }
}
